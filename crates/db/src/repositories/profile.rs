//! Profile repository.

use std::sync::Arc;

use crate::entities::{follow, profile, Profile};
use fable_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};

/// Profile repository for database operations.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a profile by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<profile::Model>> {
        Profile::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a profile by ID, failing if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<profile::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {id} not found")))
    }

    /// Find the profile owned by a user.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<profile::Model>> {
        Profile::find()
            .filter(profile::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the profile owned by a user, failing if absent.
    pub async fn get_by_user_id(&self, user_id: &str) -> AppResult<profile::Model> {
        self.find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id} not found")))
    }

    /// Update a profile.
    pub async fn update(&self, model: profile::ActiveModel) -> AppResult<profile::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Profiles following the given profile (newest first).
    pub async fn find_followers(&self, profile_id: &str) -> AppResult<Vec<profile::Model>> {
        Profile::find()
            .join(JoinType::InnerJoin, follow::Relation::Follower.def().rev())
            .filter(follow::Column::FolloweeId.eq(profile_id))
            .order_by_desc(follow::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Profiles the given profile follows (newest first).
    pub async fn find_following(&self, profile_id: &str) -> AppResult<Vec<profile::Model>> {
        Profile::find()
            .join(JoinType::InnerJoin, follow::Relation::Followee.def().rev())
            .filter(follow::Column::FollowerId.eq(profile_id))
            .order_by_desc(follow::Column::CreatedAt)
            .all(self.db.as_ref())
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

    fn test_profile(id: &str, user_id: &str) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: String::new(),
            bio: String::new(),
            avatar_url: None,
            strike_count: 0,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_user_id() {
        let profile = test_profile("p1", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile.clone()]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let found = repo.get_by_user_id("u1").await.unwrap();

        assert_eq!(found.id, "p1");
    }

    #[tokio::test]
    async fn test_get_by_user_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<profile::Model>::new()])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let result = repo.get_by_user_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
