//! Book resolution API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use bookfinder_core::{BookRecord, Comment, Query, ResolveError};

use super::ErrorResponse;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CommentsRequest {
    pub url: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<Comment>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/books/resolve
///
/// Resolve a title (plus optional author/publisher hints) into a book record.
/// Never fails for a valid title: unresolvable queries get a fallback record.
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(query): Json<Query>,
) -> Result<Json<BookRecord>, (StatusCode, Json<ErrorResponse>)> {
    debug!(title = %query.title, include_comments = query.include_comments, "Resolve request");

    match state.resolver().resolve(&query).await {
        Ok(record) => Ok(Json(record)),
        Err(ResolveError::InvalidInput(msg)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid input: {}", msg),
            }),
        )),
    }
}

/// POST /api/v1/books/comments
///
/// Fetch short comments for a book detail URL. Failures yield an empty list.
pub async fn comments(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CommentsRequest>,
) -> Result<Json<CommentsResponse>, (StatusCode, Json<ErrorResponse>)> {
    if body.url.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "url must not be empty".to_string(),
            }),
        ));
    }

    let limit = body
        .limit
        .unwrap_or(state.config().resolver.comment_limit);
    let comments = state.resolver().fetch_comments(body.url.trim(), limit).await;

    Ok(Json(CommentsResponse { comments }))
}
