//! Selection policy: turns a ranking into a single pick, a list, or an error.

use crate::app::{ResolveError, Result};
use crate::config::MatchConfig;
use crate::domain::RankedCandidate;
use crate::matcher::{to_ranked, MatchScore};
use crate::resolver::Chooser;

/// Number of ranked entries shown in prompts and attached to errors.
pub const SHORTLIST: usize = 10;

/// How a ranked list becomes a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Take the top candidate when it is confident and unambiguous.
    #[default]
    Automatic,
    /// Return the top `n` candidates without resolving.
    List(usize),
    /// Ask the configured [`Chooser`].
    Interactive,
    /// Take the candidate at this 1-based rank.
    NonInteractive(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Index into the score list.
    Chosen(usize),
    Listed(Vec<RankedCandidate>),
}

pub fn select(
    scores: &[MatchScore<'_>],
    mode: SelectionMode,
    config: &MatchConfig,
    chooser: &dyn Chooser,
) -> Result<Selection> {
    match mode {
        SelectionMode::List(n) => Ok(Selection::Listed(to_ranked(scores, n))),
        SelectionMode::Automatic => automatic(scores, config),
        SelectionMode::Interactive => {
            if scores.is_empty() {
                return Err(ambiguous("no candidates to choose from", scores));
            }
            let shortlist = to_ranked(scores, SHORTLIST);
            match chooser.choose(&shortlist) {
                None => Err(ResolveError::Cancelled),
                Some(index) if index < shortlist.len() => Ok(Selection::Chosen(index)),
                Some(index) => Err(ambiguous(
                    &format!("choice {} is out of range 1..={}", index + 1, shortlist.len()),
                    scores,
                )),
            }
        }
        SelectionMode::NonInteractive(rank) => {
            if rank == 0 || rank > scores.len() {
                return Err(ambiguous(
                    &format!("rank {} is out of range ({} candidates)", rank, scores.len()),
                    scores,
                ));
            }
            Ok(Selection::Chosen(rank - 1))
        }
    }
}

fn automatic(scores: &[MatchScore<'_>], config: &MatchConfig) -> Result<Selection> {
    let Some(best) = scores.first() else {
        return Err(ambiguous("no candidates", scores));
    };
    if best.score <= config.min_confidence {
        return Err(ambiguous(
            &format!(
                "best score {:.2} does not exceed the minimum of {:.2}",
                best.score, config.min_confidence
            ),
            scores,
        ));
    }
    if let Some(runner_up) = scores.get(1) {
        if best.score - runner_up.score <= config.ambiguity_epsilon {
            return Err(ambiguous(
                &format!(
                    "top scores {:.2} and {:.2} are within {:.2}",
                    best.score, runner_up.score, config.ambiguity_epsilon
                ),
                scores,
            ));
        }
    }
    Ok(Selection::Chosen(0))
}

fn ambiguous(reason: &str, scores: &[MatchScore<'_>]) -> ResolveError {
    ResolveError::AmbiguousSelection {
        reason: reason.to_string(),
        ranked: to_ranked(scores, SHORTLIST),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EpisodeCandidate;
    use crate::resolver::DeclineChooser;

    struct Fixed(Option<usize>);

    impl Chooser for Fixed {
        fn choose(&self, _ranked: &[RankedCandidate]) -> Option<usize> {
            self.0
        }
    }

    fn scores<'a>(candidates: &'a [EpisodeCandidate], values: &[f64]) -> Vec<MatchScore<'a>> {
        candidates
            .iter()
            .zip(values)
            .map(|(candidate, score)| MatchScore {
                candidate,
                score: *score,
                reasons: vec![],
            })
            .collect()
    }

    fn candidates(n: usize) -> Vec<EpisodeCandidate> {
        (0..n)
            .map(|i| EpisodeCandidate::new(format!("Episode {i}"), i))
            .collect()
    }

    #[test]
    fn test_close_scores_are_ambiguous() {
        let c = candidates(2);
        let s = scores(&c, &[10.0, 9.95]);
        let err = select(&s, SelectionMode::Automatic, &MatchConfig::default(), &DeclineChooser)
            .unwrap_err();
        match err {
            ResolveError::AmbiguousSelection { ranked, .. } => {
                assert_eq!(ranked.len(), 2);
                assert_eq!(ranked[0].rank, 1);
                assert_eq!(ranked[0].score, 10.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_clear_winner_is_chosen() {
        let c = candidates(3);
        let s = scores(&c, &[15.0, 10.0, 0.0]);
        let picked = select(&s, SelectionMode::Automatic, &MatchConfig::default(), &DeclineChooser);
        assert_eq!(picked.unwrap(), Selection::Chosen(0));
    }

    #[test]
    fn test_low_confidence_is_ambiguous() {
        let c = candidates(1);
        let s = scores(&c, &[0.5]);
        let err = select(&s, SelectionMode::Automatic, &MatchConfig::default(), &DeclineChooser);
        assert!(matches!(err, Err(ResolveError::AmbiguousSelection { .. })));
    }

    #[test]
    fn test_score_at_minimum_is_not_confident() {
        let c = candidates(1);
        let config = MatchConfig::default();

        let at = scores(&c, &[config.min_confidence]);
        assert!(matches!(
            select(&at, SelectionMode::Automatic, &config, &DeclineChooser),
            Err(ResolveError::AmbiguousSelection { .. })
        ));

        let above = scores(&c, &[config.min_confidence + 0.01]);
        assert_eq!(
            select(&above, SelectionMode::Automatic, &config, &DeclineChooser).unwrap(),
            Selection::Chosen(0)
        );
    }

    #[test]
    fn test_empty_ranking_is_ambiguous_with_empty_list() {
        let err = select(&[], SelectionMode::Automatic, &MatchConfig::default(), &DeclineChooser)
            .unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousSelection { ref ranked, .. } if ranked.is_empty()));
    }

    #[test]
    fn test_list_is_capped_by_available() {
        let c = candidates(3);
        let s = scores(&c, &[3.0, 2.0, 1.0]);
        let listed = select(&s, SelectionMode::List(5), &MatchConfig::default(), &DeclineChooser);
        match listed.unwrap() {
            Selection::Listed(ranked) => assert_eq!(ranked.len(), 3),
            other => panic!("unexpected selection: {other:?}"),
        }
    }

    #[test]
    fn test_interactive() {
        let c = candidates(3);
        let s = scores(&c, &[3.0, 2.0, 1.0]);
        let config = MatchConfig::default();

        assert_eq!(
            select(&s, SelectionMode::Interactive, &config, &Fixed(Some(1))).unwrap(),
            Selection::Chosen(1)
        );
        assert!(matches!(
            select(&s, SelectionMode::Interactive, &config, &Fixed(None)),
            Err(ResolveError::Cancelled)
        ));
        assert!(matches!(
            select(&s, SelectionMode::Interactive, &config, &Fixed(Some(7))),
            Err(ResolveError::AmbiguousSelection { .. })
        ));
    }

    #[test]
    fn test_non_interactive_rank() {
        let c = candidates(2);
        let s = scores(&c, &[3.0, 2.0]);
        let config = MatchConfig::default();

        assert_eq!(
            select(&s, SelectionMode::NonInteractive(2), &config, &DeclineChooser).unwrap(),
            Selection::Chosen(1)
        );
        for rank in [0, 3] {
            assert!(matches!(
                select(&s, SelectionMode::NonInteractive(rank), &config, &DeclineChooser),
                Err(ResolveError::AmbiguousSelection { .. })
            ));
        }
    }
}
