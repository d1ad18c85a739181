use serde::{Deserialize, Serialize};

/// A persisted bookmark row. The id is assigned by storage on creation and
/// never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    /// Non-empty display title
    pub title: String,
    /// Absolute HTTP/HTTPS link
    pub url: String,
    /// Integer rating between 1 and 5
    pub rating: i64,
    /// Free-form text, may contain markup
    pub description: Option<String>,
}

/// The subset of a request payload restricted to the recognized, present
/// bookmark fields. Used both for inserts (where title, url and rating are
/// guaranteed by validation) and for partial updates (any non-empty subset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmarkFields {
    pub title: Option<String>,
    pub url: Option<String>,
    pub rating: Option<i64>,
    pub description: Option<String>,
}

impl BookmarkFields {
    /// True when no recognized field was provided
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.url.is_none()
            && self.rating.is_none()
            && self.description.is_none()
    }
}
