//! Bookmark repository.

use std::sync::Arc;

use crate::entities::{bookmark, Bookmark};
use fable_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Bookmark repository for database operations.
#[derive(Clone)]
pub struct BookmarkRepository {
    db: Arc<DatabaseConnection>,
}

impl BookmarkRepository {
    /// Create a new bookmark repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a bookmark by profile and story.
    pub async fn find_by_profile_and_story(
        &self,
        profile_id: &str,
        story_id: &str,
    ) -> AppResult<Option<bookmark::Model>> {
        Bookmark::find()
            .filter(bookmark::Column::ProfileId.eq(profile_id))
            .filter(bookmark::Column::StoryId.eq(story_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a profile has bookmarked a story.
    pub async fn is_bookmarked(&self, profile_id: &str, story_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_profile_and_story(profile_id, story_id)
            .await?
            .is_some())
    }

    /// All bookmarks on a story (for publish fan-out), oldest first.
    pub async fn find_by_story(&self, story_id: &str) -> AppResult<Vec<bookmark::Model>> {
        Bookmark::find()
            .filter(bookmark::Column::StoryId.eq(story_id))
            .order_by_asc(bookmark::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
