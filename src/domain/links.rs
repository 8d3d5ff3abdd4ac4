use serde::{Deserialize, Serialize};

/// A story link found on a section page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryLink {
    pub title: String,
    pub url: String,
}

/// A show found on a section or podcast index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowLink {
    pub title: String,
    pub slug: String,
}

/// Appends `secondary` shows whose slug is not already in `primary`.
pub fn merge_shows(primary: Vec<ShowLink>, secondary: Vec<ShowLink>) -> Vec<ShowLink> {
    let mut merged = primary;
    for show in secondary {
        if merged.iter().all(|s| s.slug != show.slug) {
            merged.push(show);
        }
    }
    merged
}
