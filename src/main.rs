use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use podlocate::app::{AppContext, ResolveError};
use podlocate::cli::prompt::PromptChooser;
use podlocate::cli::{commands, CacheAction, Cli, Commands};
use podlocate::config::Config;
use podlocate::resolver::ResolveOptions;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries results only
    let default_filter = if cli.verbose {
        "podlocate=debug"
    } else {
        "podlocate=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::report_error(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), ResolveError> {
    let config = Config::load(cli.config.as_deref())?;
    let ctx = AppContext::new(config)?.with_chooser(Arc::new(PromptChooser::stdin()));

    match cli.command {
        Commands::Resolve(args) => commands::resolve(&ctx, &args).await,
        Commands::Discover { url } => commands::discover(&ctx, &url).await,
        Commands::Stories { url, limit, json } => {
            commands::list_stories(&ctx, &url, limit, json).await
        }
        Commands::Shows { url, limit, json } => commands::list_shows(&ctx, &url, limit, json).await,
        Commands::Cache { action } => match action {
            CacheAction::Clear => commands::clear_cache(&ctx),
            CacheAction::Forget {
                url,
                show,
                provider,
                title,
            } => {
                let options = ResolveOptions {
                    show,
                    provider,
                    title,
                    ..Default::default()
                };
                commands::forget(&ctx, &url, &options)
            }
        },
    }
}
