//! Chapter endpoints.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use fable_common::AppResult;
use fable_core::ChapterInput;
use fable_db::entities::chapter;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response, response::ApiResponse};

/// Chapter creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChapterRequest {
    pub story_id: String,
    pub title: String,
    pub content: String,
}

/// Chapter update request.
#[derive(Debug, Deserialize)]
pub struct UpdateChapterRequest {
    pub title: String,
    pub content: String,
}

/// Chapter listing summary; content is elided.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    pub id: String,
    pub story_id: String,
    pub title: String,
    pub is_public: bool,
    pub created_at: String,
}

impl From<chapter::Model> for ChapterSummary {
    fn from(c: chapter::Model) -> Self {
        Self {
            id: c.id,
            story_id: c.story_id,
            title: c.title,
            is_public: c.is_public,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Full chapter response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterResponse {
    pub id: String,
    pub story_id: String,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub created_at: String,
}

impl From<chapter::Model> for ChapterResponse {
    fn from(c: chapter::Model) -> Self {
        Self {
            id: c.id,
            story_id: c.story_id,
            title: c.title,
            content: c.content,
            is_public: c.is_public,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Add a chapter to the caller's own story. Chapters start unpublished.
async fn add_chapter(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateChapterRequest>,
) -> AppResult<ApiResponse<ChapterResponse>> {
    let input = ChapterInput {
        title: req.title,
        content: req.content,
    };
    let chapter = state
        .chapter_service
        .add_chapter(&user.id, &req.story_id, input)
        .await?;

    Ok(ApiResponse::ok(chapter.into()))
}

/// Fetch a single chapter.
async fn get_chapter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ChapterResponse>> {
    let chapter = state.chapter_service.get(&id).await?;

    Ok(ApiResponse::ok(chapter.into()))
}

/// The next chapter in reading order, if any.
async fn next_chapter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Option<ChapterResponse>>> {
    let chapter = state.chapter_service.get(&id).await?;
    let next = state.chapter_service.next_chapter(&chapter).await?;

    Ok(ApiResponse::ok(next.map(ChapterResponse::from)))
}

/// Edit a chapter.
async fn edit_chapter(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateChapterRequest>,
) -> AppResult<ApiResponse<ChapterResponse>> {
    let input = ChapterInput {
        title: req.title,
        content: req.content,
    };
    let chapter = state.chapter_service.edit_chapter(&user.id, &id, input).await?;

    Ok(ApiResponse::ok(chapter.into()))
}

/// Delete a chapter.
async fn delete_chapter(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.chapter_service.delete_chapter(&user.id, &id).await?;

    Ok(response::ok())
}

/// Publish a chapter, notifying everyone who bookmarked the story.
async fn publish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ChapterResponse>> {
    let chapter = state.chapter_service.publish(&user.id, &id).await?;

    Ok(ApiResponse::ok(chapter.into()))
}

/// Retract a chapter without notifying anyone.
async fn unpublish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ChapterResponse>> {
    let chapter = state.chapter_service.unpublish(&user.id, &id).await?;

    Ok(ApiResponse::ok(chapter.into()))
}

/// Create the chapters router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_chapter))
        .route(
            "/{id}",
            get(get_chapter).patch(edit_chapter).delete(delete_chapter),
        )
        .route("/{id}/next", get(next_chapter))
        .route("/{id}/publish", post(publish))
        .route("/{id}/unpublish", post(unpublish))
}
