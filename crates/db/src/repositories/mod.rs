//! Repository layer.
//!
//! Repositories own a shared database connection and expose typed
//! query methods over the entities.

pub mod bookmark;
pub mod chapter;
pub mod comment;
pub mod follow;
pub mod label;
pub mod like;
pub mod moderation;
pub mod notification;
pub mod post;
pub mod profile;
pub mod story;
pub mod user;

pub use bookmark::BookmarkRepository;
pub use chapter::ChapterRepository;
pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use label::LabelRepository;
pub use like::LikeRepository;
pub use moderation::ModerationRepository;
pub use notification::NotificationRepository;
pub use post::PostRepository;
pub use profile::ProfileRepository;
pub use story::StoryRepository;
pub use user::UserRepository;
