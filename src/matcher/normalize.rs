//! Title normalisation shared by the scorer and the candidate constructors.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;

static PART_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:part|pt)\.?\s*(\d{1,3})\b").unwrap());

const STOP_WORDS: &[&str] = &[
    "the", "and", "a", "an", "of", "to", "in", "for", "on", "with", "is", "are", "was", "were",
    "be", "as", "at", "by", "it", "this", "that", "from", "or",
];

/// Part number announced in a title ("Part 2", "Pt. 2", "PT 2").
pub fn part_number(title: &str) -> Option<u32> {
    PART_PATTERN
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Distinct lowercase content words of a title, part markers excluded.
pub fn title_tokens(title: &str) -> BTreeSet<String> {
    let decoded = decode_html_entities(title);
    let without_parts = PART_PATTERN.replace_all(&decoded, " ");
    let lowered = without_parts.to_lowercase();

    lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|word| word.trim_matches('\''))
        .filter(|word| !word.is_empty() && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("PT 1 | Injustice For All", Some(1))]
    #[case("Injustice For All, Part 2", Some(2))]
    #[case("Pt. 3: The return", Some(3))]
    #[case("part4", Some(4))]
    #[case("Departure lounge 5", None)]
    #[case("Counterpart", None)]
    #[case("No parts here", None)]
    fn test_part_number(#[case] title: &str, #[case] expected: Option<u32>) {
        assert_eq!(part_number(title), expected);
    }

    #[test]
    fn test_tokens_drop_stop_words_and_parts() {
        let tokens = title_tokens("PT 1 | Injustice For All");
        assert_eq!(
            tokens.into_iter().collect::<Vec<_>>(),
            vec!["all".to_string(), "injustice".to_string()]
        );
    }

    #[test]
    fn test_tokens_decode_entities_and_punctuation() {
        let tokens = title_tokens("Rock &amp; Roll: Canada's story");
        assert!(tokens.contains("rock"));
        assert!(tokens.contains("roll"));
        assert!(tokens.contains("canada's"));
        assert!(tokens.contains("story"));
        assert!(!tokens.contains("amp"));
    }

    #[test]
    fn test_tokens_empty_title() {
        assert!(title_tokens("").is_empty());
        assert!(title_tokens("The and of").is_empty());
    }
}
