//! HTTP API layer for fable.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: users, stories, chapters, comments, reports, notifications
//! - **Extractors**: bearer-token authentication
//! - **Middleware**: auth, shared application state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{auth_middleware, AppState};
