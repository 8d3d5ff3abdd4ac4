//! Audio metadata embedded in story pages as `window.__INITIAL_STATE__` JSON.

use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde_json::Value;

use crate::app::{ResolveError, Result};

static INITIAL_STATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.*?\});\s*</script>").unwrap()
});

const BLOCK_TIME_KEYS: &[&str] = &["publishedAt", "updatedAt", "airDate"];
const MEDIA_TIME_KEYS: &[&str] = &["airDate", "publishedAt", "updatedAt"];
const CONTENT_TIME_KEYS: &[&str] = &["publishedAt", "updatedAt"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedAudio {
    pub title: Option<String>,
    pub description: Option<String>,
    pub show_slug: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

/// Extracts the embedded audio block of a story page.
///
/// Returns `Ok(None)` when the page carries no state at all, and a parse
/// error when the state is present but unusable.
pub fn extract_audio(html: &str) -> Result<Option<EmbeddedAudio>> {
    let Some(caps) = INITIAL_STATE.captures(html) else {
        return Ok(None);
    };
    let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let state: Value = serde_json::from_str(&raw.replace(":undefined", ":null"))
        .map_err(|e| ResolveError::parse(format!("invalid embedded page state: {e}"), raw))?;

    let content = &state["detail"]["content"];
    let Some(audio) = find_audio_block(&content["body"]) else {
        return Ok(None);
    };

    let published_at = first_timestamp(audio, BLOCK_TIME_KEYS)
        .or_else(|| first_timestamp(&audio["media"], MEDIA_TIME_KEYS))
        .or_else(|| first_timestamp(content, CONTENT_TIME_KEYS));

    Ok(Some(EmbeddedAudio {
        title: text_field(audio, "title"),
        description: text_field(audio, "description"),
        show_slug: text_field(audio, "showSlug"),
        published_at,
        image_url: image_url(audio),
    }))
}

fn find_audio_block(node: &Value) -> Option<&Value> {
    match node {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("polopoly_media") {
                if let Some(media) = map.get("content") {
                    if media.get("type").and_then(Value::as_str) == Some("audio") {
                        return Some(media);
                    }
                }
            }
            map.values().find_map(find_audio_block)
        }
        Value::Array(items) => items.iter().find_map(find_audio_block),
        _ => None,
    }
}

fn text_field(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_timestamp(node: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter()
        .filter_map(|key| node.get(*key).and_then(Value::as_i64))
        .find_map(|ms| Utc.timestamp_millis_opt(ms).single())
}

fn image_url(audio: &Value) -> Option<String> {
    if let Some(url) = text_field(&audio["image"], "url") {
        return Some(url);
    }
    ["square_620", "square_460", "square_380", "square_300"]
        .iter()
        .find_map(|key| text_field(&audio["images"], key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(state: &str) -> String {
        format!(
            "<html><head><script>window.__INITIAL_STATE__ = {state};</script></head><body></body></html>"
        )
    }

    #[test]
    fn test_extract_audio_block() {
        let html = page(
            r#"{"detail":{"content":{"publishedAt":1700000000000,"body":[
                {"type":"text","content":"intro"},
                {"type":"polopoly_media","content":{"type":"audio","title":"PT 1 | Injustice For All",
                 "description":"A look at justice","showSlug":"ideas","publishedAt":1704067200000,
                 "image":{"url":"https://example.com/cover.jpg"},"extra":undefined}}
            ]}}}"#,
        );
        let audio = extract_audio(&html).unwrap().unwrap();

        assert_eq!(audio.title.as_deref(), Some("PT 1 | Injustice For All"));
        assert_eq!(audio.show_slug.as_deref(), Some("ideas"));
        assert_eq!(audio.description.as_deref(), Some("A look at justice"));
        assert_eq!(
            audio.published_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(audio.image_url.as_deref(), Some("https://example.com/cover.jpg"));
    }

    #[test]
    fn test_timestamp_falls_back_to_media_then_content() {
        let html = page(
            r#"{"detail":{"content":{"publishedAt":1704067200000,"body":[
                {"type":"polopoly_media","content":{"type":"audio","title":"x","media":{"airDate":1704153600000}}}
            ]}}}"#,
        );
        let audio = extract_audio(&html).unwrap().unwrap();
        assert_eq!(
            audio.published_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );

        let html = page(
            r#"{"detail":{"content":{"publishedAt":1704067200000,"body":[
                {"type":"polopoly_media","content":{"type":"audio","title":"x"}}
            ]}}}"#,
        );
        let audio = extract_audio(&html).unwrap().unwrap();
        assert_eq!(
            audio.published_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_video_block_is_not_audio() {
        let html = page(
            r#"{"detail":{"content":{"body":[{"type":"polopoly_media","content":{"type":"video","title":"v"}}]}}}"#,
        );
        assert_eq!(extract_audio(&html).unwrap(), None);
    }

    #[test]
    fn test_missing_state() {
        assert_eq!(extract_audio("<html><body>plain</body></html>").unwrap(), None);
    }

    #[test]
    fn test_broken_state_is_parse_error() {
        let html = page(r#"{"detail": {"content": [1, 2,}"#);
        assert!(matches!(extract_audio(&html), Err(ResolveError::Parse { .. })));
    }
}
