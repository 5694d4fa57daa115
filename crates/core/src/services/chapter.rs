//! Chapter management and the publish fan-out.

use fable_common::{AppError, AppResult};
use fable_db::{
    entities::{bookmark, chapter, post, story, Bookmark, Chapter, Post, Profile, Story, User},
    repositories::{ChapterRepository, PostRepository, StoryRepository},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;

use crate::services::notification::notify_on;
use crate::services::txn_err;

/// Input for creating or editing a chapter.
pub struct ChapterInput {
    pub title: String,
    pub content: String,
}

/// Chapter service.
#[derive(Clone)]
pub struct ChapterService {
    db: Arc<DatabaseConnection>,
    chapter_repo: ChapterRepository,
    story_repo: StoryRepository,
    post_repo: PostRepository,
}

impl ChapterService {
    /// Create a new chapter service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        chapter_repo: ChapterRepository,
        story_repo: StoryRepository,
        post_repo: PostRepository,
    ) -> Self {
        Self {
            db,
            chapter_repo,
            story_repo,
            post_repo,
        }
    }

    /// Add a chapter to the caller's own story. Chapters start unpublished.
    pub async fn add_chapter(
        &self,
        actor_user_id: &str,
        story_id: &str,
        input: ChapterInput,
    ) -> AppResult<chapter::Model> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Chapter title is required".to_string()));
        }
        if input.content.trim().is_empty() {
            return Err(AppError::Validation(
                "Chapter content is required".to_string(),
            ));
        }

        self.story_repo.get_by_id(story_id).await?;
        self.require_author(story_id, actor_user_id).await?;

        let model = chapter::ActiveModel {
            id: Set(crate::generate_id()),
            story_id: Set(story_id.to_string()),
            title: Set(title),
            content: Set(input.content),
            is_public: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.chapter_repo.create(model).await
    }

    /// Edit a chapter of the caller's own story.
    pub async fn edit_chapter(
        &self,
        actor_user_id: &str,
        chapter_id: &str,
        input: ChapterInput,
    ) -> AppResult<chapter::Model> {
        let chapter = self.chapter_repo.get_by_id(chapter_id).await?;
        self.require_author(&chapter.story_id, actor_user_id).await?;

        let mut active: chapter::ActiveModel = chapter.into();
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Chapter title is required".to_string()));
        }
        active.title = Set(title);
        active.content = Set(input.content);
        self.chapter_repo.update(active).await
    }

    /// Fetch a single chapter.
    pub async fn get(&self, chapter_id: &str) -> AppResult<chapter::Model> {
        self.chapter_repo.get_by_id(chapter_id).await
    }

    /// Delete a chapter of the caller's own story.
    pub async fn delete_chapter(&self, actor_user_id: &str, chapter_id: &str) -> AppResult<()> {
        let chapter = self.chapter_repo.get_by_id(chapter_id).await?;
        self.require_author(&chapter.story_id, actor_user_id).await?;
        self.chapter_repo.delete(chapter_id).await
    }

    /// Publish a chapter.
    ///
    /// Only allowed while the story itself is public. In one transaction
    /// the flag is flipped and every user with a bookmark on the story is
    /// notified that a new chapter is up (the author's own bookmark is
    /// skipped).
    pub async fn publish(&self, actor_user_id: &str, chapter_id: &str) -> AppResult<chapter::Model> {
        let actor_user_id = actor_user_id.to_string();
        let chapter_id = chapter_id.to_string();

        self.db
            .transaction::<_, chapter::Model, AppError>(move |txn| {
                Box::pin(async move { publish_on(txn, &actor_user_id, &chapter_id).await })
            })
            .await
            .map_err(txn_err)
    }

    /// Retract a chapter without notifying anyone.
    pub async fn unpublish(
        &self,
        actor_user_id: &str,
        chapter_id: &str,
    ) -> AppResult<chapter::Model> {
        let chapter = self.chapter_repo.get_by_id(chapter_id).await?;
        self.require_author(&chapter.story_id, actor_user_id).await?;

        let mut active: chapter::ActiveModel = chapter.into();
        active.is_public = Set(false);
        self.chapter_repo.update(active).await
    }

    /// Chapters of a story in reading order.
    pub async fn list_for_story(&self, story_id: &str) -> AppResult<Vec<chapter::Model>> {
        self.chapter_repo.find_by_story(story_id).await
    }

    /// The next chapter in reading order, if any.
    pub async fn next_chapter(
        &self,
        chapter: &chapter::Model,
    ) -> AppResult<Option<chapter::Model>> {
        self.chapter_repo.find_next(chapter).await
    }

    async fn require_author(&self, story_id: &str, actor_user_id: &str) -> AppResult<()> {
        let base = self.post_repo.get_by_id(story_id).await?;
        if base.author_id != actor_user_id {
            return Err(AppError::Forbidden(
                "Only the author can modify chapters".to_string(),
            ));
        }
        Ok(())
    }
}

async fn publish_on<C: ConnectionTrait>(
    txn: &C,
    actor_user_id: &str,
    chapter_id: &str,
) -> AppResult<chapter::Model> {
    let chapter = Chapter::find_by_id(chapter_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Chapter {chapter_id} not found")))?;

    let story_id = chapter.story_id.clone();
    let story = Story::find_by_id(&story_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Story {story_id} not found")))?;

    let base = Post::find_by_id(&story_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Post {story_id} not found")))?;
    if base.author_id != actor_user_id {
        return Err(AppError::Forbidden(
            "Only the author can publish chapters".to_string(),
        ));
    }

    if !story.is_public {
        return Err(AppError::BadRequest(
            "Chapters can only be published on a public story".to_string(),
        ));
    }

    let mut active: chapter::ActiveModel = chapter.into();
    active.is_public = Set(true);
    let published = active
        .update(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let author = User::find_by_id(&base.author_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", base.author_id)))?;
    let message = format!(
        "{} just posted a new chapter to {}!",
        author.username, story.title
    );

    let bookmarks = Bookmark::find()
        .filter(bookmark::Column::StoryId.eq(story_id.as_str()))
        .order_by_asc(bookmark::Column::Id)
        .all(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    for bookmark in bookmarks {
        let profile = Profile::find_by_id(&bookmark.profile_id)
            .one(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| {
                AppError::NotFound(format!("Profile {} not found", bookmark.profile_id))
            })?;
        notify_on(txn, &profile.user_id, Some(actor_user_id), &message).await?;
    }

    Ok(published)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fable_db::entities::{notification, profile, user};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_chapter(id: &str, story_id: &str, is_public: bool) -> chapter::Model {
        chapter::Model {
            id: id.to_string(),
            story_id: story_id.to_string(),
            title: "Chapter One".to_string(),
            content: "It begins.".to_string(),
            is_public,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn test_story(id: &str, is_public: bool) -> story::Model {
        story::Model {
            id: id.to_string(),
            title: "The Long Road".to_string(),
            synopsis: String::new(),
            is_public,
        }
    }

    fn test_post(id: &str, author_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            kind: post::PostKind::Story,
            author_id: author_id.to_string(),
            created_at: chrono::Utc::now().into(),
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

    fn test_bookmark(id: &str, profile_id: &str, story_id: &str) -> bookmark::Model {
        bookmark::Model {
            id: id.to_string(),
            profile_id: profile_id.to_string(),
            story_id: story_id.to_string(),
            created_at: chrono::Utc::now().into(),
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

    fn service(db: sea_orm::DatabaseConnection) -> ChapterService {
        let db = Arc::new(db);
        ChapterService::new(
            db.clone(),
            ChapterRepository::new(db.clone()),
            StoryRepository::new(db.clone()),
            PostRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_publish_requires_public_story() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_chapter("c1", "s1", false)]])
            .append_query_results([[test_story("s1", false)]])
            .append_query_results([[test_post("s1", "author")]])
            .into_connection();

        let result = service(db).publish("author", "c1").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_publish_notifies_each_bookmarker() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_chapter("c1", "s1", false)]])
            .append_query_results([[test_story("s1", true)]])
            .append_query_results([[test_post("s1", "author")]])
            .append_query_results([[test_chapter("c1", "s1", true)]])
            .append_query_results([[test_user("author", "alice")]])
            .append_query_results([vec![
                test_bookmark("b1", "p1", "s1"),
                test_bookmark("b2", "p2", "s1"),
            ]])
            .append_query_results([[test_profile("p1", "reader1")]])
            .append_query_results([[test_notification("reader1")]])
            .append_query_results([[test_profile("p2", "reader2")]])
            .append_query_results([[test_notification("reader2")]])
            .into_connection();

        let published = service(db).publish("author", "c1").await.unwrap();

        assert!(published.is_public);
    }

    #[tokio::test]
    async fn test_publish_skips_authors_own_bookmark() {
        // The author bookmarked their own story: membership stays, no row.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_chapter("c1", "s1", false)]])
            .append_query_results([[test_story("s1", true)]])
            .append_query_results([[test_post("s1", "author")]])
            .append_query_results([[test_chapter("c1", "s1", true)]])
            .append_query_results([[test_user("author", "alice")]])
            .append_query_results([[test_bookmark("b1", "p-author", "s1")]])
            .append_query_results([[test_profile("p-author", "author")]])
            .into_connection();

        let published = service(db).publish("author", "c1").await.unwrap();

        assert!(published.is_public);
    }

    #[tokio::test]
    async fn test_publish_by_non_author_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_chapter("c1", "s1", false)]])
            .append_query_results([[test_story("s1", true)]])
            .append_query_results([[test_post("s1", "author")]])
            .into_connection();

        let result = service(db).publish("intruder", "c1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
