//! Like and bookmark toggles.
//!
//! Both are idempotent membership toggles: the first call adds, the second
//! removes, and a double toggle restores the original state having produced
//! exactly one notification (from the add half).

use fable_common::{AppError, AppResult};
use fable_db::{
    entities::{bookmark, post, post_like, Bookmark, Comment, Post, PostLike, Profile, Story, User},
    repositories::{BookmarkRepository, LikeRepository},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::sync::Arc;

use crate::services::notification::notify_on;
use crate::services::txn_err;

/// Outcome of a membership toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Added,
    Removed,
}

/// Engagement service for likes and bookmarks.
#[derive(Clone)]
pub struct EngagementService {
    db: Arc<DatabaseConnection>,
    like_repo: LikeRepository,
    bookmark_repo: BookmarkRepository,
}

impl EngagementService {
    /// Create a new engagement service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        like_repo: LikeRepository,
        bookmark_repo: BookmarkRepository,
    ) -> Self {
        Self {
            db,
            like_repo,
            bookmark_repo,
        }
    }

    /// Toggle a like on a post (story or comment). On add, the post's
    /// author is notified; on remove, nothing happens beyond the removal.
    pub async fn toggle_like(&self, actor_user_id: &str, post_id: &str) -> AppResult<ToggleState> {
        let actor_user_id = actor_user_id.to_string();
        let post_id = post_id.to_string();

        self.db
            .transaction::<_, ToggleState, AppError>(move |txn| {
                Box::pin(async move { toggle_like_on(txn, &actor_user_id, &post_id).await })
            })
            .await
            .map_err(txn_err)
    }

    /// Toggle a bookmark on a story; the story's author is notified on add.
    pub async fn toggle_bookmark(
        &self,
        actor_user_id: &str,
        story_id: &str,
    ) -> AppResult<ToggleState> {
        let actor_user_id = actor_user_id.to_string();
        let story_id = story_id.to_string();

        self.db
            .transaction::<_, ToggleState, AppError>(move |txn| {
                Box::pin(async move { toggle_bookmark_on(txn, &actor_user_id, &story_id).await })
            })
            .await
            .map_err(txn_err)
    }

    /// Whether a profile has liked a post.
    pub async fn is_liked(&self, profile_id: &str, post_id: &str) -> AppResult<bool> {
        self.like_repo.is_liked(profile_id, post_id).await
    }

    /// Like count for a post.
    pub async fn like_count(&self, post_id: &str) -> AppResult<u64> {
        self.like_repo.count_for_post(post_id).await
    }

    /// Whether a profile has bookmarked a story.
    pub async fn is_bookmarked(&self, profile_id: &str, story_id: &str) -> AppResult<bool> {
        self.bookmark_repo.is_bookmarked(profile_id, story_id).await
    }
}

async fn actor_profile<C: ConnectionTrait>(
    txn: &C,
    actor_user_id: &str,
) -> AppResult<fable_db::entities::profile::Model> {
    Profile::find()
        .filter(fable_db::entities::profile::Column::UserId.eq(actor_user_id))
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {actor_user_id} not found")))
}

async fn actor_username<C: ConnectionTrait>(txn: &C, actor_user_id: &str) -> AppResult<String> {
    let user = User::find_by_id(actor_user_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("User {actor_user_id} not found")))?;
    Ok(user.username)
}

async fn toggle_like_on<C: ConnectionTrait>(
    txn: &C,
    actor_user_id: &str,
    post_id: &str,
) -> AppResult<ToggleState> {
    let profile = actor_profile(txn, actor_user_id).await?;

    let target = Post::find_by_id(post_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Post {post_id} not found")))?;

    let existing = PostLike::find()
        .filter(post_like::Column::ProfileId.eq(profile.id.as_str()))
        .filter(post_like::Column::PostId.eq(post_id))
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if let Some(like) = existing {
        PostLike::delete_by_id(&like.id)
            .exec(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        return Ok(ToggleState::Removed);
    }

    let model = post_like::ActiveModel {
        id: Set(crate::generate_id()),
        profile_id: Set(profile.id),
        post_id: Set(post_id.to_string()),
        created_at: Set(chrono::Utc::now().into()),
    };
    model
        .insert(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let message = match target.kind {
        post::PostKind::Story => {
            let story = Story::find_by_id(post_id)
                .one(txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .ok_or_else(|| AppError::NotFound(format!("Story {post_id} not found")))?;
            let username = actor_username(txn, actor_user_id).await?;
            format!("{username} just liked your story {}!", story.title)
        }
        post::PostKind::Comment => {
            let comment = Comment::find_by_id(post_id)
                .one(txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .ok_or_else(|| AppError::NotFound(format!("Comment {post_id} not found")))?;
            let username = actor_username(txn, actor_user_id).await?;
            format!("{username} just liked your comment {}!", comment.content)
        }
    };

    notify_on(txn, &target.author_id, Some(actor_user_id), &message).await?;

    Ok(ToggleState::Added)
}

async fn toggle_bookmark_on<C: ConnectionTrait>(
    txn: &C,
    actor_user_id: &str,
    story_id: &str,
) -> AppResult<ToggleState> {
    let profile = actor_profile(txn, actor_user_id).await?;

    let story = Story::find_by_id(story_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Story {story_id} not found")))?;

    // The story's post row carries the author.
    let story_post = Post::find_by_id(story_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Post {story_id} not found")))?;

    let existing = Bookmark::find()
        .filter(bookmark::Column::ProfileId.eq(profile.id.as_str()))
        .filter(bookmark::Column::StoryId.eq(story_id))
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if let Some(bookmark) = existing {
        Bookmark::delete_by_id(&bookmark.id)
            .exec(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        return Ok(ToggleState::Removed);
    }

    let model = bookmark::ActiveModel {
        id: Set(crate::generate_id()),
        profile_id: Set(profile.id),
        story_id: Set(story_id.to_string()),
        created_at: Set(chrono::Utc::now().into()),
    };
    model
        .insert(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let username = actor_username(txn, actor_user_id).await?;
    let message = format!("{username} just bookmarked your story {}!", story.title);
    notify_on(txn, &story_post.author_id, Some(actor_user_id), &message).await?;

    Ok(ToggleState::Added)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fable_db::entities::{comment, notification, profile, story, user};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_profile(id: &str, user_id: &str) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: String::new(),
            bio: String::new(),
            avatar_url: None,
            strike_count: 0,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn test_post(id: &str, kind: post::PostKind, author_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            kind,
            author_id: author_id.to_string(),
            created_at: chrono::Utc::now().into(),
        }
    }

    fn test_story(id: &str, title: &str) -> story::Model {
        story::Model {
            id: id.to_string(),
            title: title.to_string(),
            synopsis: String::new(),
            is_public: true,
        }
    }

    fn test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            token: "token".to_string(),
            is_active: true,
            created_at: chrono::Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_like(id: &str, profile_id: &str, post_id: &str) -> post_like::Model {
        post_like::Model {
            id: id.to_string(),
            profile_id: profile_id.to_string(),
            post_id: post_id.to_string(),
            created_at: chrono::Utc::now().into(),
        }
    }

    fn test_notification(recipient_id: &str, message: &str) -> notification::Model {
        notification::Model {
            id: "n1".to_string(),
            recipient_id: recipient_id.to_string(),
            message: message.to_string(),
            is_read: false,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> EngagementService {
        let db = Arc::new(db);
        EngagementService::new(
            db.clone(),
            LikeRepository::new(db.clone()),
            BookmarkRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_like_story_adds_and_notifies() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_profile("p1", "liker")]])
            .append_query_results([[test_post("post1", post::PostKind::Story, "author")]])
            .append_query_results([Vec::<post_like::Model>::new()])
            .append_query_results([[test_like("l1", "p1", "post1")]])
            .append_query_results([[test_story("post1", "The Long Road")]])
            .append_query_results([[test_user("liker", "bob")]])
            .append_query_results([[test_notification(
                "author",
                "bob just liked your story The Long Road!",
            )]])
            .into_connection();

        let state = service(db).toggle_like("liker", "post1").await.unwrap();

        assert_eq!(state, ToggleState::Added);
    }

    #[tokio::test]
    async fn test_like_again_removes_without_notifying() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_profile("p1", "liker")]])
            .append_query_results([[test_post("post1", post::PostKind::Story, "author")]])
            .append_query_results([[test_like("l1", "p1", "post1")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let state = service(db).toggle_like("liker", "post1").await.unwrap();

        assert_eq!(state, ToggleState::Removed);
    }

    #[tokio::test]
    async fn test_like_own_comment_suppresses_notification() {
        let own_comment = comment::Model {
            id: "post1".to_string(),
            post_id: "story1".to_string(),
            content: "nice".to_string(),
            parent_id: None,
        };

        // The like lands, but no notification result is consumed.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_profile("p1", "author")]])
            .append_query_results([[test_post("post1", post::PostKind::Comment, "author")]])
            .append_query_results([Vec::<post_like::Model>::new()])
            .append_query_results([[test_like("l1", "p1", "post1")]])
            .append_query_results([[own_comment]])
            .append_query_results([[test_user("author", "alice")]])
            .into_connection();

        let state = service(db).toggle_like("author", "post1").await.unwrap();

        assert_eq!(state, ToggleState::Added);
    }

    #[tokio::test]
    async fn test_bookmark_adds_and_notifies() {
        let marked = bookmark::Model {
            id: "b1".to_string(),
            profile_id: "p1".to_string(),
            story_id: "story1".to_string(),
            created_at: chrono::Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_profile("p1", "reader")]])
            .append_query_results([[test_story("story1", "The Long Road")]])
            .append_query_results([[test_post("story1", post::PostKind::Story, "author")]])
            .append_query_results([Vec::<bookmark::Model>::new()])
            .append_query_results([[marked]])
            .append_query_results([[test_user("reader", "bob")]])
            .append_query_results([[test_notification(
                "author",
                "bob just bookmarked your story The Long Road!",
            )]])
            .into_connection();

        let state = service(db).toggle_bookmark("reader", "story1").await.unwrap();

        assert_eq!(state, ToggleState::Added);
    }

    #[tokio::test]
    async fn test_like_missing_post() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_profile("p1", "liker")]])
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();

        let result = service(db).toggle_like("liker", "missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
