//! Domain models for Zhihu Daily responses
//!
//! Required fields fail decoding when missing. Optional fields decode to
//! `None` when they are absent or null.

use serde::{Deserialize, Serialize};

/// A single story, as listed in the latest feed or fetched by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Same id space as [`Operation::Content`](crate::api::Operation::Content)
    pub id: u64,
    pub title: String,
    /// Thumbnail URLs (list entries)
    #[serde(default)]
    pub images: Option<Vec<String>>,
    /// Header image URL (content entries)
    #[serde(default)]
    pub image: Option<String>,
}

/// Response of the latest stories endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestStories {
    /// Feed date in `YYYYMMDD` form
    pub date: String,
    #[serde(default)]
    pub stories: Option<Vec<Story>>,
    #[serde(default)]
    pub top_stories: Option<Vec<Story>>,
}

impl LatestStories {
    /// Number of regular stories in the feed
    pub fn story_count(&self) -> usize {
        self.stories.as_ref().map_or(0, Vec::len)
    }
}
