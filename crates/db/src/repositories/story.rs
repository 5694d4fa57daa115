//! Story repository.

use std::sync::Arc;

use crate::entities::{bookmark, post, story, Story};
use fable_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};

/// Story repository for database operations.
#[derive(Clone)]
pub struct StoryRepository {
    db: Arc<DatabaseConnection>,
}

impl StoryRepository {
    /// Create a new story repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a story by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<story::Model>> {
        Story::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a story by ID, failing if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<story::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Story {id} not found")))
    }

    /// Update a story.
    pub async fn update(&self, model: story::ActiveModel) -> AppResult<story::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Public stories, newest first (paginated).
    pub async fn find_public(&self, limit: u64, offset: u64) -> AppResult<Vec<story::Model>> {
        Story::find()
            .filter(story::Column::IsPublic.eq(true))
            .order_by_desc(story::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Stories by an author, newest first.
    pub async fn find_by_author(&self, author_id: &str) -> AppResult<Vec<story::Model>> {
        Story::find()
            .join(JoinType::InnerJoin, story::Relation::Post.def())
            .filter(post::Column::AuthorId.eq(author_id))
            .order_by_desc(story::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Stories bookmarked by a profile, newest bookmark first.
    pub async fn find_bookmarked_by(&self, profile_id: &str) -> AppResult<Vec<story::Model>> {
        Story::find()
            .join(JoinType::InnerJoin, story::Relation::Bookmarks.def())
            .filter(bookmark::Column::ProfileId.eq(profile_id))
            .order_by_desc(bookmark::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_story(id: &str, title: &str, is_public: bool) -> story::Model {
        story::Model {
            id: id.to_string(),
            title: title.to_string(),
            synopsis: String::new(),
            is_public,
        }
    }

    #[tokio::test]
    async fn test_find_public() {
        let s1 = test_story("s1", "First", true);
        let s2 = test_story("s2", "Second", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[s2, s1]])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        let stories = repo.find_public(10, 0).await.unwrap();

        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0].id, "s2");
    }
}
