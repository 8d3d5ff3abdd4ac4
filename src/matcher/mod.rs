//! Candidate scoring.
//!
//! A candidate's score is the sum of three independent terms:
//!
//! - title token overlap: `|target ∩ candidate| / |target|`, times `overlap_weight`
//! - part agreement: `+part_bonus` on equal part numbers, `-part_penalty` on
//!   different ones, nothing when either side has none
//! - date proximity: `date_weight`, decaying linearly to zero at
//!   `date_window_days` apart
//!
//! Totals are clamped at zero. Rankings are ordered by score, then by the
//! candidate's position in its source listing.

mod normalize;

pub use normalize::{part_number, title_tokens};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::MatchConfig;
use crate::domain::{EpisodeCandidate, RankedCandidate};

/// What the user is looking for.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Target {
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl Target {
    pub fn new(title: impl Into<String>, published_at: Option<DateTime<Utc>>) -> Self {
        Self {
            title: title.into(),
            published_at,
        }
    }
}

/// A scored candidate, borrowed from the enumeration it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchScore<'a> {
    pub candidate: &'a EpisodeCandidate,
    pub score: f64,
    pub reasons: Vec<String>,
}

impl MatchScore<'_> {
    pub fn to_ranked(&self, rank: usize) -> RankedCandidate {
        RankedCandidate {
            rank,
            score: self.score,
            reasons: self.reasons.clone(),
            candidate: self.candidate.clone(),
        }
    }
}

/// Owned copies of (up to `limit`) ranked scores, ranks starting at 1.
pub fn to_ranked(scores: &[MatchScore<'_>], limit: usize) -> Vec<RankedCandidate> {
    scores
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, s)| s.to_ranked(i + 1))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Scores every candidate against `target`, best first.
    pub fn score<'a>(&self, target: &Target, candidates: &'a [EpisodeCandidate]) -> Vec<MatchScore<'a>> {
        let target_tokens = title_tokens(&target.title);
        let target_part = part_number(&target.title);

        let mut scores: Vec<MatchScore<'a>> = candidates
            .iter()
            .map(|candidate| self.score_one(target, &target_tokens, target_part, candidate))
            .collect();

        scores.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.candidate.source_ordinal.cmp(&b.candidate.source_ordinal))
        });

        scores
    }

    fn score_one<'a>(
        &self,
        target: &Target,
        target_tokens: &std::collections::BTreeSet<String>,
        target_part: Option<u32>,
        candidate: &'a EpisodeCandidate,
    ) -> MatchScore<'a> {
        let mut score = 0.0;
        let mut reasons = Vec::new();

        if !target_tokens.is_empty() {
            let tokens = title_tokens(&candidate.title);
            let shared = target_tokens.intersection(&tokens).count();
            if shared > 0 {
                let term = self.config.overlap_weight * shared as f64 / target_tokens.len() as f64;
                score += term;
                reasons.push(format!(
                    "title overlap {}/{} (+{:.2})",
                    shared,
                    target_tokens.len(),
                    term
                ));
            }
        }

        if let (Some(wanted), Some(found)) = (target_part, candidate.part_number) {
            if wanted == found {
                score += self.config.part_bonus;
                reasons.push(format!("part {} matches (+{:.2})", found, self.config.part_bonus));
            } else {
                score -= self.config.part_penalty;
                reasons.push(format!(
                    "part {} differs from {} (-{:.2})",
                    found, wanted, self.config.part_penalty
                ));
            }
        }

        if let (Some(wanted), Some(found)) = (target.published_at, candidate.published_at) {
            let days = (wanted - found).num_seconds().abs() as f64 / 86_400.0;
            let window = self.config.date_window_days;
            if window > 0.0 && days < window {
                let term = self.config.date_weight * (1.0 - days / window);
                score += term;
                reasons.push(format!("published {:.1} days apart (+{:.2})", days, term));
            }
        }

        if score < 0.0 {
            reasons.push("clamped to 0".to_string());
            score = 0.0;
        }

        MatchScore {
            candidate,
            score,
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    fn candidate(title: &str, ordinal: usize) -> EpisodeCandidate {
        EpisodeCandidate::new(title, ordinal).with_enclosure(format!("https://example.com/{ordinal}.mp3"))
    }

    #[test]
    fn test_part_agreement_breaks_overlap_tie() {
        let candidates = vec![
            candidate("Injustice For All, Part 2", 0).with_published_at(day(11)),
            candidate("Injustice For All, Part 1", 1).with_published_at(day(10)),
        ];
        let target = Target::new("PT 1 | Injustice For All", Some(day(10) + chrono::Duration::hours(20)));

        let ranked = Matcher::default().score(&target, &candidates);
        assert_eq!(ranked[0].candidate.title, "Injustice For All, Part 1");
        assert!(ranked[0].score > ranked[1].score);
        assert!(ranked[0].reasons.iter().any(|r| r.contains("part 1 matches")));
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let candidates: Vec<_> = [
            "Massey Lectures: episode one",
            "The history of radio",
            "Radio history, Part 2",
            "Lectures on history",
            "Radio history, Part 1",
        ]
        .iter()
        .enumerate()
        .map(|(i, t)| candidate(t, i).with_published_at(day(i as u32 + 1)))
        .collect();
        let target = Target::new("Radio history pt 1", Some(day(3)));
        let matcher = Matcher::default();

        let first: Vec<_> = matcher
            .score(&target, &candidates)
            .iter()
            .map(|s| (s.candidate.source_ordinal, s.score))
            .collect();
        for _ in 0..10 {
            let again: Vec<_> = matcher
                .score(&target, &candidates)
                .iter()
                .map(|s| (s.candidate.source_ordinal, s.score))
                .collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_ties_rank_by_source_ordinal() {
        let candidates = vec![
            candidate("Same title", 2),
            candidate("Same title", 0),
            candidate("Same title", 1),
        ];
        let ranked = Matcher::default().score(&Target::new("same title", None), &candidates);
        let ordinals: Vec<_> = ranked.iter().map(|s| s.candidate.source_ordinal).collect();
        assert_eq!(ordinals, [0, 1, 2]);
    }

    #[test]
    fn test_empty_candidates() {
        let ranked = Matcher::default().score(&Target::new("anything", None), &[]);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_empty_title_ranks_by_date() {
        let candidates = vec![
            candidate("Far away", 0).with_published_at(day(1)),
            candidate("Close by", 1).with_published_at(day(20)),
        ];
        let ranked = Matcher::default().score(&Target::new("", Some(day(21))), &candidates);

        assert_eq!(ranked[0].candidate.title, "Close by");
        assert!(ranked
            .iter()
            .all(|s| s.reasons.iter().all(|r| !r.starts_with("title overlap"))));
    }

    #[test]
    fn test_date_outside_window_contributes_nothing() {
        let candidates = vec![candidate("Unrelated", 0).with_published_at(day(1))];
        let target = Target::new("", Some(day(1) + chrono::Duration::days(45)));
        let ranked = Matcher::default().score(&target, &candidates);
        assert_eq!(ranked[0].score, 0.0);
        assert!(ranked[0].reasons.is_empty());
    }

    #[test]
    fn test_missing_dates_are_neutral() {
        let candidates = vec![candidate("Radio days", 0), candidate("Radio days", 1).with_published_at(day(2))];
        let ranked = Matcher::default().score(&Target::new("radio days", None), &candidates);
        assert_eq!(ranked[0].score, ranked[1].score);
        assert_eq!(ranked[0].candidate.source_ordinal, 0);
    }

    #[test]
    fn test_score_never_negative() {
        let candidates = vec![candidate("Something else, Part 3", 0)];
        let ranked = Matcher::default().score(&Target::new("Nothing alike pt 1", None), &candidates);
        assert_eq!(ranked[0].score, 0.0);
        assert!(ranked[0].reasons.iter().any(|r| r == "clamped to 0"));
    }

    #[test]
    fn test_to_ranked_limits_and_numbers() {
        let candidates = vec![candidate("a b", 0), candidate("a", 1), candidate("c", 2)];
        let ranked = Matcher::default().score(&Target::new("a b", None), &candidates);
        let owned = to_ranked(&ranked, 2);
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].rank, 1);
        assert_eq!(owned[1].rank, 2);
        assert_eq!(owned[0].candidate.title, "a b");
    }
}
