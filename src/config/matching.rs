use serde::{Deserialize, Serialize};

/// Weights and thresholds of the candidate scoring heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Multiplier of the title token overlap ratio (0..=1).
    pub overlap_weight: f64,
    /// Added when target and candidate carry the same part number.
    pub part_bonus: f64,
    /// Subtracted when both carry a part number and they differ.
    pub part_penalty: f64,
    /// Bonus for a same-day publish date, decaying linearly to zero.
    pub date_weight: f64,
    pub date_window_days: f64,
    /// Automatic selection only picks a top score strictly above this.
    pub min_confidence: f64,
    /// Runner-ups within this distance of the top score make it ambiguous.
    pub ambiguity_epsilon: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            overlap_weight: 10.0,
            part_bonus: 5.0,
            part_penalty: 3.0,
            date_weight: 3.0,
            date_window_days: 30.0,
            min_confidence: 1.0,
            ambiguity_epsilon: 0.1,
        }
    }
}
