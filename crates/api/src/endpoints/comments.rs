//! Comment endpoints.
//!
//! Comments are created through their story (`POST /stories/{id}/comments`);
//! this router covers operations addressed at an existing comment.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use fable_common::AppResult;
use fable_core::ToggleState;
use fable_db::entities::comment;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Comment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            content: c.content,
            parent_id: c.parent_id,
        }
    }
}

/// Like toggle response.
#[derive(Serialize)]
pub struct LikeResponse {
    pub liked: bool,
}

/// Replies to a comment, oldest first.
async fn list_replies(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let replies = state.comment_service.list_replies(&id).await?;

    Ok(ApiResponse::ok(
        replies.into_iter().map(CommentResponse::from).collect(),
    ))
}

/// Toggle a like on a comment.
async fn toggle_like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<LikeResponse>> {
    let state_change = state.engagement_service.toggle_like(&user.id, &id).await?;

    Ok(ApiResponse::ok(LikeResponse {
        liked: state_change == ToggleState::Added,
    }))
}

/// Create the comments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/replies", get(list_replies))
        .route("/{id}/like", post(toggle_like))
}
