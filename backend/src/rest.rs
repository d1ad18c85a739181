use axum::{
    extract::{OriginalUri, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::{error, info};

use crate::domain::{sanitize_bookmark, BookmarkError, BookmarkService};
use shared::Bookmark;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub bookmarks: BookmarkService,
}

impl AppState {
    /// Create new application state with the given BookmarkService
    pub fn new(bookmarks: BookmarkService) -> Self {
        Self { bookmarks }
    }
}

/// Build the bookmark route table with its injected state. The caller nests
/// this under whatever prefix the deployment uses.
pub fn bookmark_routes(state: AppState) -> Router {
    Router::new()
        .route("/bookmarks", get(list_bookmarks).post(create_bookmark))
        .route(
            "/bookmarks/:id",
            get(get_bookmark)
                .patch(update_bookmark)
                .delete(delete_bookmark),
        )
        .with_state(state)
}

/// Single error-to-response mapper for every handler. Client errors carry
/// their message as a plain-text body; storage failures are logged and
/// collapsed to a generic 500.
impl IntoResponse for BookmarkError {
    fn into_response(self) -> Response {
        match self {
            BookmarkError::Storage(err) => {
                error!("bookmark storage failure: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            err @ BookmarkError::NotFound => {
                (StatusCode::NOT_FOUND, err.to_string()).into_response()
            }
            err => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        }
    }
}

/// Axum handler for POST /bookmarks
pub async fn create_bookmark(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, BookmarkError> {
    info!("POST {}", uri.path());

    let bookmark = state.bookmarks.create(&payload).await?;
    let location = format!("{}/{}", uri.path().trim_end_matches('/'), bookmark.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(sanitize_bookmark(bookmark)),
    ))
}

/// Axum handler for GET /bookmarks
pub async fn list_bookmarks(
    State(state): State<AppState>,
) -> Result<Json<Vec<Bookmark>>, BookmarkError> {
    info!("GET /bookmarks");

    let bookmarks = state.bookmarks.list().await?;
    Ok(Json(
        bookmarks.into_iter().map(sanitize_bookmark).collect(),
    ))
}

/// Axum handler for GET /bookmarks/:id
pub async fn get_bookmark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Bookmark>, BookmarkError> {
    info!("GET /bookmarks/{}", id);

    let bookmark = state.bookmarks.get(id).await?;
    Ok(Json(sanitize_bookmark(bookmark)))
}

/// Axum handler for PATCH /bookmarks/:id
pub async fn update_bookmark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<StatusCode, BookmarkError> {
    info!("PATCH /bookmarks/{}", id);

    state.bookmarks.update(id, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Axum handler for DELETE /bookmarks/:id
pub async fn delete_bookmark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, BookmarkError> {
    info!("DELETE /bookmarks/{}", id);

    state.bookmarks.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
