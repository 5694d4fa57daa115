//! Post repository (base rows shared by stories and comments).

use std::sync::Arc;

use crate::entities::{post, Post};
use fable_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, EntityTrait, ModelTrait};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a post by ID, failing if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {id} not found")))
    }

    /// Delete a post (cascades to its variant row, comments, likes, reports).
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let post = self.get_by_id(id).await?;
        post.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
