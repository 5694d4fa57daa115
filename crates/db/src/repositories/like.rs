//! Like repository.

use std::sync::Arc;

use crate::entities::{post_like, PostLike};
use fable_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a like by profile and post.
    pub async fn find_by_profile_and_post(
        &self,
        profile_id: &str,
        post_id: &str,
    ) -> AppResult<Option<post_like::Model>> {
        PostLike::find()
            .filter(post_like::Column::ProfileId.eq(profile_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a profile has liked a post.
    pub async fn is_liked(&self, profile_id: &str, post_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_profile_and_post(profile_id, post_id)
            .await?
            .is_some())
    }

    /// Count likes on a post.
    pub async fn count_for_post(&self, post_id: &str) -> AppResult<u64> {
        PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
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

    fn test_like(id: &str, profile_id: &str, post_id: &str) -> post_like::Model {
        post_like::Model {
            id: id.to_string(),
            profile_id: profile_id.to_string(),
            post_id: post_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_is_liked() {
        let like = test_like("l1", "p1", "post1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(repo.is_liked("p1", "post1").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_not_liked() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post_like::Model>::new()])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(!repo.is_liked("p1", "post1").await.unwrap());
    }
}
