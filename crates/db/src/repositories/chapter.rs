//! Chapter repository.

use std::sync::Arc;

use crate::entities::{chapter, Chapter};
use fable_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};

/// Chapter repository for database operations.
#[derive(Clone)]
pub struct ChapterRepository {
    db: Arc<DatabaseConnection>,
}

impl ChapterRepository {
    /// Create a new chapter repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a chapter by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<chapter::Model>> {
        Chapter::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a chapter by ID, failing if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<chapter::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Chapter {id} not found")))
    }

    /// Create a new chapter.
    pub async fn create(&self, model: chapter::ActiveModel) -> AppResult<chapter::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a chapter.
    pub async fn update(&self, model: chapter::ActiveModel) -> AppResult<chapter::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a chapter.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let chapter = self.get_by_id(id).await?;
        chapter
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Chapters of a story in reading order (creation time, ULID tiebreak).
    pub async fn find_by_story(&self, story_id: &str) -> AppResult<Vec<chapter::Model>> {
        Chapter::find()
            .filter(chapter::Column::StoryId.eq(story_id))
            .order_by_asc(chapter::Column::CreatedAt)
            .order_by_asc(chapter::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The chapter after the given one in reading order, if any.
    pub async fn find_next(&self, chapter: &chapter::Model) -> AppResult<Option<chapter::Model>> {
        Chapter::find()
            .filter(chapter::Column::StoryId.eq(chapter.story_id.clone()))
            .filter(chapter::Column::Id.gt(chapter.id.clone()))
            .order_by_asc(chapter::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_chapter(id: &str, story_id: &str) -> chapter::Model {
        chapter::Model {
            id: id.to_string(),
            story_id: story_id.to_string(),
            title: "Chapter".to_string(),
            content: "Content".to_string(),
            is_public: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_story() {
        let c1 = test_chapter("c1", "s1");
        let c2 = test_chapter("c2", "s1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let repo = ChapterRepository::new(db);
        let chapters = repo.find_by_story("s1").await.unwrap();

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].id, "c1");
    }
}
