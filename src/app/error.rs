use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::RankedCandidate;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid URL: {0}")]
    Classification(String),

    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Parse error: {message} (near {context:?})")]
    Parse { message: String, context: String },

    #[error("No feed found for {url} (tried: {})", attempted.join(", "))]
    NoFeedFound { url: String, attempted: Vec<String> },

    #[error("Ambiguous selection: {reason}")]
    AmbiguousSelection {
        reason: String,
        ranked: Vec<RankedCandidate>,
    },

    #[error("Selection cancelled")]
    Cancelled,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResolveError {
    /// Builds a parse error, keeping the head of the offending document as context.
    pub fn parse(message: impl Into<String>, document: &str) -> Self {
        let context: String = document.trim_start().chars().take(120).collect();
        ResolveError::Parse {
            message: message.into(),
            context,
        }
    }

    /// Process exit code the CLI reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ResolveError::Cancelled => 1,
            ResolveError::Classification(_) => 2,
            ResolveError::Fetch { .. } => 3,
            ResolveError::Parse { .. } => 4,
            ResolveError::NoFeedFound { .. } => 5,
            ResolveError::AmbiguousSelection { .. } => 6,
            ResolveError::Database(_) | ResolveError::Io(_) | ResolveError::Config(_) => 7,
        }
    }
}

impl From<ConfigError> for ResolveError {
    fn from(e: ConfigError) -> Self {
        ResolveError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
