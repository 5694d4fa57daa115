//! User and profile endpoints.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use fable_common::AppResult;
use fable_core::{ToggleState, UpdateProfileInput};
use fable_db::entities::profile;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

use super::stories::StorySummary;

/// Registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 32))]
    pub username: String,
}

/// Registration response; the token is shown once.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: String,
    pub username: String,
    pub token: String,
    pub profile: ProfileResponse,
}

/// Profile response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub bio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<profile::Model> for ProfileResponse {
    fn from(p: profile::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            bio: p.bio,
            avatar_url: p.avatar_url,
        }
    }
}

/// Profile update request. An explicit `"avatarUrl": null` clears the
/// avatar; an absent key leaves it untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,
}

fn double_option<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Follow toggle response.
#[derive(Serialize)]
pub struct FollowResponse {
    pub following: bool,
}

/// Profile with follow graph counts.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetailResponse {
    #[serde(flatten)]
    pub profile: ProfileResponse,
    pub followers_count: u64,
    pub following_count: u64,
    /// Whether the caller follows this profile; absent for anonymous callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub following: Option<bool>,
}

/// Register a new user.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<ApiResponse<RegisterResponse>> {
    req.validate()?;

    let (user, profile) = state.user_service.create_user(&req.username).await?;

    Ok(ApiResponse::ok(RegisterResponse {
        id: user.id,
        username: user.username,
        token: user.token,
        profile: profile.into(),
    }))
}

/// The caller's own profile.
async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let profile = state.profile_service.get_own(&user.id).await?;

    Ok(ApiResponse::ok(profile.into()))
}

/// Edit the caller's own profile.
async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let input = UpdateProfileInput {
        name: req.name,
        bio: req.bio,
        avatar_url: req.avatar_url,
    };
    let profile = state.profile_service.update_profile(&user.id, input).await?;

    Ok(ApiResponse::ok(profile.into()))
}

/// A profile by username, with follow graph counts.
async fn get_profile(
    MaybeAuthUser(caller): MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ProfileDetailResponse>> {
    let profile = state.profile_service.get_by_username(&username).await?;
    let followers_count = state.follow_service.count_followers(&profile.id).await?;
    let following_count = state.follow_service.count_following(&profile.id).await?;

    let following = match caller {
        Some(caller) => {
            let own = state.profile_service.get_own(&caller.id).await?;
            Some(state.follow_service.is_following(&own.id, &profile.id).await?)
        }
        None => None,
    };

    Ok(ApiResponse::ok(ProfileDetailResponse {
        profile: profile.into(),
        followers_count,
        following_count,
        following,
    }))
}

/// Profiles following a user.
async fn followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<Vec<ProfileResponse>>> {
    let profile = state.profile_service.get_by_username(&username).await?;
    let followers = state.profile_service.followers(&profile.id).await?;

    Ok(ApiResponse::ok(
        followers.into_iter().map(ProfileResponse::from).collect(),
    ))
}

/// Profiles a user follows.
async fn following(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<Vec<ProfileResponse>>> {
    let profile = state.profile_service.get_by_username(&username).await?;
    let following = state.profile_service.following(&profile.id).await?;

    Ok(ApiResponse::ok(
        following.into_iter().map(ProfileResponse::from).collect(),
    ))
}

/// Toggle following a user.
async fn toggle_follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<FollowResponse>> {
    let state_change = state.follow_service.toggle_follow(&user.id, &username).await?;

    Ok(ApiResponse::ok(FollowResponse {
        following: state_change == ToggleState::Added,
    }))
}

/// Stories authored by a user, newest first.
async fn author_stories(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<Vec<StorySummary>>> {
    let user = state.user_service.get_by_username(&username).await?;
    let stories = state.story_service.list_by_author(&user.id).await?;

    Ok(ApiResponse::ok(
        stories.into_iter().map(StorySummary::from).collect(),
    ))
}

/// Create the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route("/me", get(me).patch(update_me))
        .route("/{username}", get(get_profile))
        .route("/{username}/followers", get(followers))
        .route("/{username}/following", get(following))
        .route("/{username}/follow", post(toggle_follow))
        .route("/{username}/stories", get(author_stories))
}
