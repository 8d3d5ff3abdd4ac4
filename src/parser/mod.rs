//! Document parsing: podcast feeds and the HTML pages that point at them.

pub mod embedded;
pub mod feed;
pub mod page;

pub use feed::{FeedMeta, FeedParser, ParsedFeed};
pub use page::{PageParser, ShowIndex, StoryPage};
