pub mod candidate;
pub mod links;
pub mod resolution;

pub use candidate::{EpisodeCandidate, RankedCandidate};
pub use links::{merge_shows, ShowLink, StoryLink};
pub use resolution::{Resolution, ResolutionKey, ResolvedResult};
