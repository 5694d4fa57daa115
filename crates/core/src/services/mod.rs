//! Business logic services.

#![allow(missing_docs)]

pub mod chapter;
pub mod comment;
pub mod engagement;
pub mod follow;
pub mod moderation;
pub mod notification;
pub mod profile;
pub mod story;
pub mod strike;
pub mod user;

pub use chapter::{ChapterInput, ChapterService};
pub use comment::CommentService;
pub use engagement::{EngagementService, ToggleState};
pub use follow::FollowService;
pub use moderation::{CreateReportInput, ModerationService, ReportStatus};
pub use notification::NotificationService;
pub use profile::{ProfileService, UpdateProfileInput};
pub use story::{CreateStoryInput, StoryDetail, StoryService, UpdateStoryInput};
pub use strike::StrikeService;
pub use user::UserService;

use fable_common::AppError;

/// Flatten a transaction error back into the application taxonomy.
pub(crate) fn txn_err(e: sea_orm::TransactionError<AppError>) -> AppError {
    match e {
        sea_orm::TransactionError::Connection(e) => AppError::Database(e.to_string()),
        sea_orm::TransactionError::Transaction(e) => e,
    }
}
