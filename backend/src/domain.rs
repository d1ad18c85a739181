use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::db::DbConnection;
use shared::{Bookmark, BookmarkFields};

/// Errors surfaced by bookmark operations. The Display strings double as the
/// plain-text HTTP bodies; the REST layer maps variants to status codes.
#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("'{0}' is required")]
    MissingField(&'static str),
    #[error("Rating must be a number between 1 and 5")]
    InvalidRating,
    #[error("Url must be a valid HTTP/HTTPS link")]
    InvalidUrl,
    #[error("Must provide at least one of title, url, rating or description")]
    EmptyUpdate,
    #[error("Bookmark Not Found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// A text field counts as present only when it is a non-empty JSON string
fn text_field(payload: &Value, field: &str) -> Option<String> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Copy the recognized fields out of a raw payload, enforcing the bookmark
/// rules. With `require_all` set (create path) title, url and rating must all
/// be present; otherwise (update path) any non-empty subset is accepted.
/// Unrecognized fields are dropped silently.
pub fn validate_bookmark(
    payload: &Value,
    require_all: bool,
) -> Result<BookmarkFields, BookmarkError> {
    let title = text_field(payload, "title");
    let url = text_field(payload, "url");
    let rating = payload.get("rating").filter(|v| !v.is_null());
    let description = text_field(payload, "description");

    if require_all {
        if title.is_none() {
            return Err(BookmarkError::MissingField("title"));
        }
        if url.is_none() {
            return Err(BookmarkError::MissingField("url"));
        }
        if rating.is_none() {
            return Err(BookmarkError::MissingField("rating"));
        }
    }

    // Rating is validated only when present: it must be an integer in [1,5]
    let rating = match rating {
        Some(value) => match value.as_i64() {
            Some(n) if (1..=5).contains(&n) => Some(n),
            _ => return Err(BookmarkError::InvalidRating),
        },
        None => None,
    };

    if let Some(raw) = url.as_deref() {
        let is_web_url = Url::parse(raw)
            .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !is_web_url {
            return Err(BookmarkError::InvalidUrl);
        }
    }

    let fields = BookmarkFields {
        title,
        url,
        rating,
        description,
    };

    if !require_all && fields.is_empty() {
        return Err(BookmarkError::EmptyUpdate);
    }

    Ok(fields)
}

/// Strip markup capable of executing script from the client-facing text
/// fields. Storage keeps the raw input; this runs on the way out only.
/// Benign tags and attributes survive, script contexts and event-handler
/// attributes do not. Ids, ratings and urls pass through unchanged.
pub fn sanitize_bookmark(bookmark: Bookmark) -> Bookmark {
    Bookmark {
        title: ammonia::clean(&bookmark.title),
        description: bookmark.description.as_deref().map(ammonia::clean),
        ..bookmark
    }
}

/// Bookmark operations composed over the storage layer
#[derive(Clone)]
pub struct BookmarkService {
    db: DbConnection,
}

impl BookmarkService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// All bookmarks in storage order
    pub async fn list(&self) -> Result<Vec<Bookmark>, BookmarkError> {
        Ok(self.db.list_bookmarks().await?)
    }

    /// A single bookmark by id
    pub async fn get(&self, id: i64) -> Result<Bookmark, BookmarkError> {
        self.db
            .get_bookmark(id)
            .await?
            .ok_or(BookmarkError::NotFound)
    }

    /// Validate and insert a new bookmark, returning the stored row
    pub async fn create(&self, payload: &Value) -> Result<Bookmark, BookmarkError> {
        let fields = validate_bookmark(payload, true)?;
        Ok(self.db.create_bookmark(&fields).await?)
    }

    /// Validate and apply a partial update to an existing bookmark.
    /// Existence is checked before the body is validated, so a missing id
    /// wins over an invalid payload. The check and the update are separate
    /// statements; a row deleted in between leaves the update a no-op.
    pub async fn update(&self, id: i64, payload: &Value) -> Result<(), BookmarkError> {
        if self.db.get_bookmark(id).await?.is_none() {
            return Err(BookmarkError::NotFound);
        }

        let fields = validate_bookmark(payload, false)?;
        self.db.update_bookmark(id, &fields).await?;
        Ok(())
    }

    /// Delete an existing bookmark
    pub async fn delete(&self, id: i64) -> Result<(), BookmarkError> {
        if self.db.get_bookmark(id).await?.is_none() {
            return Err(BookmarkError::NotFound);
        }

        self.db.delete_bookmark(id).await?;
        Ok(())
    }
}
