//! User accounts.
//!
//! A user and its profile are one unit: creation inserts both rows in one
//! transaction, so no profile-less user can ever be observed.

use fable_common::{AppError, AppResult, IdGenerator};
use fable_db::{
    entities::{profile, user},
    repositories::UserRepository,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use std::sync::Arc;

use crate::services::txn_err;

const MAX_USERNAME_LENGTH: usize = 32;

/// User service.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, user_repo: UserRepository) -> Self {
        Self {
            db,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a user, creating its profile atomically.
    pub async fn create_user(
        &self,
        username: &str,
    ) -> AppResult<(user::Model, profile::Model)> {
        let username = username.trim().to_string();
        validate_username(&username)?;

        if self.user_repo.username_exists(&username).await? {
            return Err(AppError::Conflict(format!(
                "Username {username} is already taken"
            )));
        }

        let user_id = self.id_gen.generate();
        let profile_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();

        self.db
            .transaction::<_, (user::Model, profile::Model), AppError>(move |txn| {
                Box::pin(async move {
                    let now = chrono::Utc::now();

                    let user_model = user::ActiveModel {
                        id: Set(user_id.clone()),
                        username: Set(username.clone()),
                        username_lower: Set(username.to_lowercase()),
                        token: Set(token),
                        is_active: Set(true),
                        created_at: Set(now.into()),
                        updated_at: Set(None),
                    };
                    let user = user_model
                        .insert(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;

                    let profile_model = profile::ActiveModel {
                        id: Set(profile_id),
                        user_id: Set(user_id),
                        name: Set(username),
                        bio: Set(String::new()),
                        avatar_url: Set(None),
                        strike_count: Set(0),
                        created_at: Set(now.into()),
                    };
                    let profile = profile_model
                        .insert(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;

                    Ok((user, profile))
                })
            })
            .await
            .map_err(txn_err)
    }

    /// Authenticate a bearer token.
    ///
    /// Unauthorized for unknown tokens, Forbidden for deactivated accounts.
    pub async fn authenticate(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        Ok(user)
    }

    /// Look up a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_username(username).await
    }
}

fn validate_username(username: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(AppError::Validation("Username is too long".to_string()));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username may only contain letters, digits, and underscores".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

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

    fn test_profile(id: &str, user_id: &str) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: "alice".to_string(),
            bio: String::new(),
            avatar_url: None,
            strike_count: 0,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> UserService {
        let db = Arc::new(db);
        UserService::new(db.clone(), UserRepository::new(db))
    }

    #[tokio::test]
    async fn test_create_user_creates_profile() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[test_user("u1", "alice")]])
            .append_query_results([[test_profile("p1", "u1")]])
            .into_connection();

        let (user, profile) = service(db).create_user("alice").await.unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(profile.user_id, user.id);
    }

    #[tokio::test]
    async fn test_create_user_rejects_bad_characters() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db).create_user("not a name").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_is_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[std::collections::BTreeMap::from([(
                "num_items",
                sea_orm::Value::BigInt(Some(1)),
            )])]])
            .into_connection();

        let result = service(db).create_user("alice").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let result = service(db).authenticate("nope").await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_authenticate_deactivated_account() {
        let mut deactivated = test_user("u1", "alice");
        deactivated.is_active = false;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[deactivated]])
            .into_connection();

        let result = service(db).authenticate("token").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
