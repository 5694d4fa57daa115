//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use fable_core::{
    ChapterService, CommentService, EngagementService, FollowService, ModerationService,
    NotificationService, ProfileService, StoryService, UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub profile_service: ProfileService,
    pub story_service: StoryService,
    pub chapter_service: ChapterService,
    pub comment_service: CommentService,
    pub engagement_service: EngagementService,
    pub follow_service: FollowService,
    pub moderation_service: ModerationService,
    pub notification_service: NotificationService,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to its user and stashes the model in request
/// extensions. Unknown tokens and deactivated accounts leave the request
/// anonymous; protected handlers reject via the [`crate::extractors::AuthUser`]
/// extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                if let Ok(user) = state.user_service.authenticate(token).await {
                    req.extensions_mut().insert(user);
                }
            }
        }
    }

    next.run(req).await
}
