//! Comments and replies.
//!
//! A comment is a post row (kind = comment) plus a comment row sharing its
//! id, created in one transaction together with its notifications.

use fable_common::{AppError, AppResult};
use fable_db::{
    entities::{comment, post, Comment, Post, Story, User},
    repositories::CommentRepository,
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use std::sync::Arc;

use crate::services::notification::notify_on;
use crate::services::txn_err;

/// Comment service.
#[derive(Clone)]
pub struct CommentService {
    db: Arc<DatabaseConnection>,
    comment_repo: CommentRepository,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, comment_repo: CommentRepository) -> Self {
        Self { db, comment_repo }
    }

    /// Post a comment on a story, or a reply when `parent_id` is given.
    ///
    /// Top-level comments notify the story's author. Replies additionally
    /// notify the parent comment's author; the two recipients are
    /// deduplicated and self-notification is suppressed, so one comment
    /// yields at most two rows.
    pub async fn post_comment(
        &self,
        author_user_id: &str,
        post_id: &str,
        content: &str,
        parent_id: Option<String>,
    ) -> AppResult<comment::Model> {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::Validation("Comment content is required".to_string()));
        }

        let author_user_id = author_user_id.to_string();
        let post_id = post_id.to_string();

        self.db
            .transaction::<_, comment::Model, AppError>(move |txn| {
                Box::pin(async move {
                    post_comment_on(txn, &author_user_id, &post_id, &content, parent_id).await
                })
            })
            .await
            .map_err(txn_err)
    }

    /// Top-level comments on a post, oldest first.
    pub async fn list_for_post(&self, post_id: &str) -> AppResult<Vec<comment::Model>> {
        self.comment_repo.find_top_level(post_id).await
    }

    /// Replies to a comment, oldest first.
    pub async fn list_replies(&self, comment_id: &str) -> AppResult<Vec<comment::Model>> {
        self.comment_repo.find_replies(comment_id).await
    }
}

async fn post_comment_on<C: ConnectionTrait>(
    txn: &C,
    author_user_id: &str,
    post_id: &str,
    content: &str,
    parent_id: Option<String>,
) -> AppResult<comment::Model> {
    let target = Post::find_by_id(post_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Post {post_id} not found")))?;
    if target.kind != post::PostKind::Story {
        return Err(AppError::BadRequest(
            "Comments can only be attached to stories".to_string(),
        ));
    }

    let story = Story::find_by_id(post_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Story {post_id} not found")))?;

    // For replies, resolve the parent and its author before writing.
    let parent = match parent_id.as_deref() {
        Some(pid) => {
            let parent = Comment::find_by_id(pid)
                .one(txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .ok_or_else(|| AppError::NotFound(format!("Comment {pid} not found")))?;
            if parent.post_id != post_id {
                return Err(AppError::BadRequest(
                    "Parent comment belongs to a different story".to_string(),
                ));
            }
            let parent_post = Post::find_by_id(pid)
                .one(txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .ok_or_else(|| AppError::NotFound(format!("Post {pid} not found")))?;
            Some((parent, parent_post.author_id))
        }
        None => None,
    };

    let author = User::find_by_id(author_user_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("User {author_user_id} not found")))?;

    let comment_id = crate::generate_id();
    let base = post::ActiveModel {
        id: Set(comment_id.clone()),
        kind: Set(post::PostKind::Comment),
        author_id: Set(author_user_id.to_string()),
        created_at: Set(chrono::Utc::now().into()),
    };
    base.insert(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let model = comment::ActiveModel {
        id: Set(comment_id),
        post_id: Set(post_id.to_string()),
        content: Set(content.to_string()),
        parent_id: Set(parent_id),
    };
    let created = model
        .insert(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let message = format!(
        "{} just commented on your story {}!",
        author.username, story.title
    );
    notify_on(txn, &target.author_id, Some(author_user_id), &message).await?;

    if let Some((parent, parent_author_id)) = parent {
        if parent_author_id != target.author_id {
            let message = format!(
                "{} just replied to your comment '{}'!",
                author.username, parent.content
            );
            notify_on(txn, &parent_author_id, Some(author_user_id), &message).await?;
        }
    }

    Ok(created)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fable_db::entities::{notification, story, user};
    use sea_orm::{DatabaseBackend, MockDatabase};

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
            token: format!("token-{id}"),
            is_active: true,
            created_at: chrono::Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_comment(id: &str, post_id: &str, parent_id: Option<&str>) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            content: "great chapter".to_string(),
            parent_id: parent_id.map(ToString::to_string),
        }
    }

    fn test_notification(recipient_id: &str) -> notification::Model {
        notification::Model {
            id: "n1".to_string(),
            recipient_id: recipient_id.to_string(),
            message: String::new(),
            is_read: false,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> CommentService {
        let db = Arc::new(db);
        CommentService::new(db.clone(), CommentRepository::new(db))
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db).post_comment("u1", "story1", "   ", None).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_top_level_comment_notifies_story_author() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post("story1", post::PostKind::Story, "author")]])
            .append_query_results([[test_story("story1", "The Long Road")]])
            .append_query_results([[test_user("commenter", "bob")]])
            .append_query_results([[test_post("c1", post::PostKind::Comment, "commenter")]])
            .append_query_results([[test_comment("c1", "story1", None)]])
            .append_query_results([[test_notification("author")]])
            .into_connection();

        let comment = service(db)
            .post_comment("commenter", "story1", "great chapter", None)
            .await
            .unwrap();

        assert!(comment.parent_id.is_none());
    }

    #[tokio::test]
    async fn test_comment_on_own_story_suppresses_notification() {
        // No notification result appended: none must be consumed.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post("story1", post::PostKind::Story, "author")]])
            .append_query_results([[test_story("story1", "The Long Road")]])
            .append_query_results([[test_user("author", "alice")]])
            .append_query_results([[test_post("c1", post::PostKind::Comment, "author")]])
            .append_query_results([[test_comment("c1", "story1", None)]])
            .into_connection();

        let comment = service(db)
            .post_comment("author", "story1", "great chapter", None)
            .await
            .unwrap();

        assert_eq!(comment.post_id, "story1");
    }

    #[tokio::test]
    async fn test_reply_notifies_story_author_and_parent_author() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post("story1", post::PostKind::Story, "author")]])
            .append_query_results([[test_story("story1", "The Long Road")]])
            .append_query_results([[test_comment("c1", "story1", None)]])
            .append_query_results([[test_post("c1", post::PostKind::Comment, "parent-author")]])
            .append_query_results([[test_user("replier", "bob")]])
            .append_query_results([[test_post("c2", post::PostKind::Comment, "replier")]])
            .append_query_results([[test_comment("c2", "story1", Some("c1"))]])
            .append_query_results([vec![test_notification("author")], vec![test_notification("parent-author")]])
            .into_connection();

        let reply = service(db)
            .post_comment("replier", "story1", "agreed", Some("c1".to_string()))
            .await
            .unwrap();

        assert_eq!(reply.parent_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_reply_to_story_authors_own_comment_notifies_once() {
        // Parent author and story author are the same user: one row, not two.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post("story1", post::PostKind::Story, "author")]])
            .append_query_results([[test_story("story1", "The Long Road")]])
            .append_query_results([[test_comment("c1", "story1", None)]])
            .append_query_results([[test_post("c1", post::PostKind::Comment, "author")]])
            .append_query_results([[test_user("replier", "bob")]])
            .append_query_results([[test_post("c2", post::PostKind::Comment, "replier")]])
            .append_query_results([[test_comment("c2", "story1", Some("c1"))]])
            .append_query_results([[test_notification("author")]])
            .into_connection();

        let reply = service(db)
            .post_comment("replier", "story1", "agreed", Some("c1".to_string()))
            .await
            .unwrap();

        assert_eq!(reply.parent_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_comment_on_comment_post_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post("c1", post::PostKind::Comment, "someone")]])
            .into_connection();

        let result = service(db).post_comment("u1", "c1", "hello", None).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
