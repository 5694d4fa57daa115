//! API endpoints.

mod chapters;
mod comments;
mod notifications;
mod reports;
mod stories;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/stories", stories::router())
        .nest("/chapters", chapters::router())
        .nest("/comments", comments::router())
        .nest("/reports", reports::router())
        .nest("/notifications", notifications::router())
}
