use serde::Serialize;
use serde_json::json;

use crate::app::{AppContext, ResolveError, Result};
use crate::cli::ResolveArgs;
use crate::domain::{RankedCandidate, Resolution};
use crate::resolver::ResolveOptions;

pub async fn resolve(ctx: &AppContext, args: &ResolveArgs) -> Result<()> {
    let resolution = ctx.resolver.resolve(&args.url, &args.options()).await?;

    match resolution {
        Resolution::Resolved { result, from_cache } => {
            if args.json {
                print_json(&json!({
                    "enclosure_url": result.enclosure_url,
                    "matched_title": result.matched_title,
                    "published_at": result.published_at,
                    "feed_url": result.feed_url,
                    "feed_title": result.feed_title,
                    "description": result.description,
                    "image_url": result.image_url,
                    "resolved_at": result.resolved_at,
                    "candidates_considered": result.candidates_considered,
                    "from_cache": from_cache,
                }))?;
            } else {
                tracing::debug!(
                    "Matched {:?} out of {} candidates (cached: {})",
                    result.matched_title,
                    result.candidates_considered,
                    from_cache
                );
                println!("{}", result.enclosure_url);
            }
        }
        Resolution::Ranked(ranked) => {
            if args.json {
                print_json(&ranked)?;
            } else if ranked.is_empty() {
                println!("No candidates");
            } else {
                for entry in &ranked {
                    println!("{}", format_ranked(entry));
                }
            }
        }
    }

    Ok(())
}

pub async fn discover(ctx: &AppContext, url: &str) -> Result<()> {
    match ctx.resolver.discover_feed(url).await? {
        Some(feed) => {
            println!("{}", feed);
            Ok(())
        }
        None => Err(ResolveError::NoFeedFound {
            url: url.to_string(),
            attempted: Vec::new(),
        }),
    }
}

pub async fn list_stories(ctx: &AppContext, url: &str, limit: usize, json: bool) -> Result<()> {
    let stories = ctx.resolver.list_stories(url, limit).await?;

    if json {
        return print_json(&stories);
    }
    if stories.is_empty() {
        println!("No story links found");
        return Ok(());
    }
    for (i, story) in stories.iter().enumerate() {
        println!("{:>3}. {}", i + 1, story.title);
        println!("     {}", story.url);
    }
    Ok(())
}

pub async fn list_shows(ctx: &AppContext, url: &str, limit: usize, json: bool) -> Result<()> {
    let shows = ctx.resolver.list_shows(url, limit).await?;

    if json {
        return print_json(&shows);
    }
    if shows.is_empty() {
        println!("No shows found");
        return Ok(());
    }
    for (i, show) in shows.iter().enumerate() {
        println!("{:>3}. {} ({})", i + 1, show.title, show.slug);
    }
    Ok(())
}

pub fn clear_cache(ctx: &AppContext) -> Result<()> {
    let removed = ctx.resolver.clear_cache()?;
    println!("Removed {} cached resolutions", removed);
    Ok(())
}

pub fn forget(ctx: &AppContext, url: &str, options: &ResolveOptions) -> Result<()> {
    if ctx.resolver.forget(url, options)? {
        println!("Forgot {}", url);
    } else {
        println!("Nothing cached for {}", url);
    }
    Ok(())
}

/// Prints an error to stderr, along with any ranked list it carries.
pub fn report_error(error: &ResolveError) {
    eprintln!("Error: {}", error);
    if let ResolveError::AmbiguousSelection { ranked, .. } = error {
        if !ranked.is_empty() {
            eprintln!("Candidates:");
            for entry in ranked {
                eprintln!("{}", format_ranked(entry));
            }
            eprintln!("Use --pick N, --interactive or --title to choose.");
        }
    }
}

/// Rank, score, date and title, then where the candidate points and why it
/// scored what it did.
pub fn format_ranked(entry: &RankedCandidate) -> String {
    let candidate = &entry.candidate;
    let date = candidate
        .published_at
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "          ".to_string());
    let target = candidate
        .enclosure_url
        .as_deref()
        .or(candidate.link.as_deref())
        .unwrap_or("-");

    let mut line = format!(
        "{:>3}. {:>6.2}  {}  {}\n       {}",
        entry.rank,
        entry.score,
        date,
        candidate.display_title(),
        target
    );
    if !entry.reasons.is_empty() {
        line.push_str("\n       ");
        line.push_str(&entry.reasons.join("; "));
    }
    line
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{}", out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EpisodeCandidate;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_ranked() {
        let entry = RankedCandidate {
            rank: 2,
            score: 13.5,
            reasons: vec![],
            candidate: EpisodeCandidate::new("Injustice For All, Part 1", 4)
                .with_enclosure("https://example.com/pt1.mp3")
                .with_published_at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        };
        let line = format_ranked(&entry);
        assert!(line.starts_with("  2.  13.50  2024-01-01  Injustice For All, Part 1"));
        assert!(line.ends_with("https://example.com/pt1.mp3"));
    }

    #[test]
    fn test_format_ranked_shows_reasons() {
        let entry = RankedCandidate {
            rank: 1,
            score: 15.0,
            reasons: vec!["title overlap 2/2 (+10.00)".into(), "part 1 matches (+5.00)".into()],
            candidate: EpisodeCandidate::new("Injustice For All, Part 1", 0)
                .with_enclosure("https://example.com/pt1.mp3"),
        };
        let line = format_ranked(&entry);
        let lines: Vec<&str> = line.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].trim(), "https://example.com/pt1.mp3");
        assert_eq!(lines[2].trim(), "title overlap 2/2 (+10.00); part 1 matches (+5.00)");
    }

    #[test]
    fn test_format_ranked_falls_back_to_link() {
        let entry = RankedCandidate {
            rank: 1,
            score: 0.0,
            reasons: vec![],
            candidate: EpisodeCandidate::new("", 0).with_link("https://www.cbc.ca/radio/ideas/x-1.2"),
        };
        let line = format_ranked(&entry);
        assert!(line.contains("(Untitled)"));
        assert!(line.ends_with("https://www.cbc.ca/radio/ideas/x-1.2"));
    }
}
