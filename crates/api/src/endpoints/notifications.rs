//! Notifications endpoints.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use fable_common::AppResult;
use fable_db::entities::notification::Model as NotificationModel;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response, response::ApiResponse};

/// Notification response.
#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub message: String,
    pub created_at: String,
    pub read: bool,
}

impl From<NotificationModel> for NotificationResponse {
    fn from(n: NotificationModel) -> Self {
        Self {
            id: n.id,
            message: n.message,
            created_at: n.created_at.to_rfc3339(),
            read: n.is_read,
        }
    }
}

/// Unread count response.
#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// Notifications for the authenticated user, newest first.
async fn list_notifications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let notifications = state.notification_service.list(&user.id).await?;

    Ok(ApiResponse::ok(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}

/// Mark one of the caller's own notifications as read.
///
/// Rows belonging to other users come back as 404, never 403.
async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<NotificationResponse>> {
    let notification = state.notification_service.mark_read(&user.id, &id).await?;

    Ok(ApiResponse::ok(notification.into()))
}

/// Mark all of the caller's notifications as read.
async fn mark_all_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.notification_service.mark_all_read(&user.id).await?;

    Ok(response::ok())
}

/// Count the caller's unread notifications.
async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    let count = state.notification_service.count_unread(&user.id).await?;

    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

/// Create the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/{id}/read", patch(mark_read))
        .route("/mark-all-read", post(mark_all_read))
        .route("/unread-count", get(unread_count))
}
