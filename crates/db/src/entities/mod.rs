//! Database entities.

pub mod bookmark;
pub mod chapter;
pub mod comment;
pub mod follow;
pub mod label;
pub mod notification;
pub mod post;
pub mod post_like;
pub mod profile;
pub mod reason;
pub mod report;
pub mod report_reason;
pub mod story;
pub mod story_label;
pub mod user;

pub use bookmark::Entity as Bookmark;
pub use chapter::Entity as Chapter;
pub use comment::Entity as Comment;
pub use follow::Entity as Follow;
pub use label::Entity as Label;
pub use notification::Entity as Notification;
pub use post::Entity as Post;
pub use post_like::Entity as PostLike;
pub use profile::Entity as Profile;
pub use reason::Entity as Reason;
pub use report::Entity as Report;
pub use report_reason::Entity as ReportReason;
pub use story::Entity as Story;
pub use story_label::Entity as StoryLabel;
pub use user::Entity as User;
