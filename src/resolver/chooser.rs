use crate::domain::RankedCandidate;

/// Picks one entry of a ranked list on behalf of the user.
pub trait Chooser {
    /// Index into `ranked`, or `None` when the user declines.
    fn choose(&self, ranked: &[RankedCandidate]) -> Option<usize>;
}

/// Declines every choice. Used when nobody is around to ask.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineChooser;

impl Chooser for DeclineChooser {
    fn choose(&self, _ranked: &[RankedCandidate]) -> Option<usize> {
        None
    }
}
