//! Story endpoints.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use fable_common::AppResult;
use fable_core::{CreateStoryInput, ToggleState, UpdateStoryInput};
use fable_db::entities::{label::LabelKind, story};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response,
    response::ApiResponse,
};

use super::chapters::ChapterSummary;
use super::comments::{CommentResponse, LikeResponse};

const MAX_PAGE_SIZE: u64 = 100;

/// A label as sent and returned by the API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LabelBody {
    pub kind: LabelKind,
    pub name: String,
}

/// Story creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryRequest {
    pub title: String,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub labels: Vec<LabelBody>,
}

/// Story update request. `None` leaves the field untouched; a present
/// `labels` array replaces the full label set.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoryRequest {
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub is_public: Option<bool>,
    pub labels: Option<Vec<LabelBody>>,
}

/// Story listing summary.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySummary {
    pub id: String,
    pub title: String,
    pub synopsis: String,
    pub is_public: bool,
}

impl From<story::Model> for StorySummary {
    fn from(s: story::Model) -> Self {
        Self {
            id: s.id,
            title: s.title,
            synopsis: s.synopsis,
            is_public: s.is_public,
        }
    }
}

/// Story with associations resolved.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDetailResponse {
    pub id: String,
    pub title: String,
    pub synopsis: String,
    pub is_public: bool,
    pub author_id: String,
    pub like_count: u64,
    /// Present only for authenticated callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmarked: Option<bool>,
    pub labels: Vec<LabelBody>,
    pub chapters: Vec<ChapterSummary>,
}

/// Pagination query.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Bookmark toggle response.
#[derive(Serialize)]
pub struct BookmarkResponse {
    pub bookmarked: bool,
}

/// Comment creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    pub parent_id: Option<String>,
}

/// Label vocabulary query.
#[derive(Debug, Deserialize)]
pub struct LabelQuery {
    pub kind: LabelKind,
}

/// Create a story.
async fn create_story(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateStoryRequest>,
) -> AppResult<ApiResponse<StorySummary>> {
    let input = CreateStoryInput {
        title: req.title,
        synopsis: req.synopsis,
        is_public: req.is_public,
        labels: req.labels.into_iter().map(|l| (l.kind, l.name)).collect(),
    };
    let story = state.story_service.create_story(&user.id, input).await?;

    Ok(ApiResponse::ok(story.into()))
}

/// Public stories, newest first.
async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<StorySummary>>> {
    let limit = query.limit.min(MAX_PAGE_SIZE);
    let stories = state.story_service.list_public(limit, query.offset).await?;

    Ok(ApiResponse::ok(
        stories.into_iter().map(StorySummary::from).collect(),
    ))
}

/// Stories the caller has bookmarked.
async fn list_bookmarked(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<StorySummary>>> {
    let profile = state.profile_service.get_own(&user.id).await?;
    let stories = state.story_service.list_bookmarked(&profile.id).await?;

    Ok(ApiResponse::ok(
        stories.into_iter().map(StorySummary::from).collect(),
    ))
}

/// A story with its labels, chapters, and engagement state.
async fn story_detail(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<StoryDetailResponse>> {
    let detail = state.story_service.story_detail(&id).await?;
    let like_count = state.engagement_service.like_count(&id).await?;

    let (liked, bookmarked) = match user {
        Some(user) => {
            let profile = state.profile_service.get_own(&user.id).await?;
            let liked = state.engagement_service.is_liked(&profile.id, &id).await?;
            let bookmarked = state
                .engagement_service
                .is_bookmarked(&profile.id, &id)
                .await?;
            (Some(liked), Some(bookmarked))
        }
        None => (None, None),
    };

    Ok(ApiResponse::ok(StoryDetailResponse {
        id: detail.story.id,
        title: detail.story.title,
        synopsis: detail.story.synopsis,
        is_public: detail.story.is_public,
        author_id: detail.author_id,
        like_count,
        liked,
        bookmarked,
        labels: detail
            .labels
            .into_iter()
            .map(|l| LabelBody {
                kind: l.kind,
                name: l.name,
            })
            .collect(),
        chapters: detail
            .chapters
            .into_iter()
            .map(ChapterSummary::from)
            .collect(),
    }))
}

/// Edit a story.
async fn edit_story(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStoryRequest>,
) -> AppResult<ApiResponse<StorySummary>> {
    let input = UpdateStoryInput {
        title: req.title,
        synopsis: req.synopsis,
        is_public: req.is_public,
        labels: req
            .labels
            .map(|ls| ls.into_iter().map(|l| (l.kind, l.name)).collect()),
    };
    let story = state.story_service.edit_story(&user.id, &id, input).await?;

    Ok(ApiResponse::ok(story.into()))
}

/// Delete a story and everything hanging off it.
async fn delete_story(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.story_service.delete_story(&user.id, &id).await?;

    Ok(response::ok())
}

/// Toggle a like on a story.
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

/// Toggle a bookmark on a story.
async fn toggle_bookmark(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<BookmarkResponse>> {
    let state_change = state
        .engagement_service
        .toggle_bookmark(&user.id, &id)
        .await?;

    Ok(ApiResponse::ok(BookmarkResponse {
        bookmarked: state_change == ToggleState::Added,
    }))
}

/// Comment on a story, or reply when `parentId` is given.
async fn post_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state
        .comment_service
        .post_comment(&user.id, &id, &req.content, req.parent_id)
        .await?;

    Ok(ApiResponse::ok(comment.into()))
}

/// Top-level comments on a story, oldest first.
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state.comment_service.list_for_post(&id).await?;

    Ok(ApiResponse::ok(
        comments.into_iter().map(CommentResponse::from).collect(),
    ))
}

/// Chapters of a story in reading order.
async fn list_chapters(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<ChapterSummary>>> {
    let chapters = state.chapter_service.list_for_story(&id).await?;

    Ok(ApiResponse::ok(
        chapters.into_iter().map(ChapterSummary::from).collect(),
    ))
}

/// All labels of a kind, alphabetically.
async fn list_labels(
    State(state): State<AppState>,
    Query(query): Query<LabelQuery>,
) -> AppResult<ApiResponse<Vec<LabelBody>>> {
    let labels = state.story_service.list_labels(query.kind).await?;

    Ok(ApiResponse::ok(
        labels
            .into_iter()
            .map(|l| LabelBody {
                kind: l.kind,
                name: l.name,
            })
            .collect(),
    ))
}

/// Create the stories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_story).get(list_public))
        .route("/bookmarked", get(list_bookmarked))
        .route("/labels", get(list_labels))
        .route(
            "/{id}",
            get(story_detail).patch(edit_story).delete(delete_story),
        )
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/bookmark", post(toggle_bookmark))
        .route("/{id}/comments", post(post_comment).get(list_comments))
        .route("/{id}/chapters", get(list_chapters))
}
