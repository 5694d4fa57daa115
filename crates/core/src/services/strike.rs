//! Strike engine.
//!
//! Strikes accumulate on profiles; at three the owning user account is
//! deactivated and told why. The threshold check runs on every call, so a
//! fourth strike re-deactivates (a no-op on the flag) and inserts another
//! deactivation notice.

use fable_common::{AppError, AppResult};
use fable_db::entities::{profile, user, Profile, User};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use std::sync::Arc;

use crate::services::notification::notify_on;
use crate::services::txn_err;

/// Strike count at which the account is deactivated.
pub const DEACTIVATION_THRESHOLD: i32 = 3;

const DEACTIVATION_MESSAGE: &str = "Your account has been deactivated due to 3 strikes.";

/// Add a strike on any connection (plain or transactional).
pub(crate) async fn add_strike_on<C: ConnectionTrait>(
    conn: &C,
    profile_id: &str,
) -> AppResult<profile::Model> {
    let profile = Profile::find_by_id(profile_id)
        .one(conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Profile {profile_id} not found")))?;

    let new_count = profile.strike_count + 1;
    let user_id = profile.user_id.clone();

    let mut active: profile::ActiveModel = profile.into();
    active.strike_count = Set(new_count);
    let profile = active
        .update(conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if new_count >= DEACTIVATION_THRESHOLD {
        deactivate_user(conn, &user_id).await?;
    }

    Ok(profile)
}

async fn deactivate_user<C: ConnectionTrait>(conn: &C, user_id: &str) -> AppResult<()> {
    let user = User::find_by_id(user_id)
        .one(conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    let mut active: user::ActiveModel = user.into();
    active.is_active = Set(false);
    active.updated_at = Set(Some(chrono::Utc::now().into()));
    active
        .update(conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    notify_on(conn, user_id, None, DEACTIVATION_MESSAGE).await?;
    tracing::info!(user_id = user_id, "Account deactivated at strike threshold");
    Ok(())
}

/// Strike service for moderation consequences.
#[derive(Clone)]
pub struct StrikeService {
    db: Arc<DatabaseConnection>,
}

impl StrikeService {
    /// Create a new strike service.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Add one strike to a profile, deactivating the account at the
    /// threshold. Runs in its own transaction.
    pub async fn add_strike(&self, profile_id: &str) -> AppResult<profile::Model> {
        let profile_id = profile_id.to_string();
        self.db
            .transaction::<_, profile::Model, AppError>(move |txn| {
                Box::pin(async move { add_strike_on(txn, &profile_id).await })
            })
            .await
            .map_err(txn_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fable_db::entities::notification;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_profile(id: &str, user_id: &str, strike_count: i32) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: "Alice".to_string(),
            bio: String::new(),
            avatar_url: None,
            strike_count,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn test_user(id: &str, is_active: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "alice".to_string(),
            username_lower: "alice".to_string(),
            token: "token".to_string(),
            is_active,
            created_at: chrono::Utc::now().into(),
            updated_at: None,
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

    #[tokio::test]
    async fn test_add_strike_below_threshold() {
        let before = test_profile("p1", "u1", 0);
        let after = test_profile("p1", "u1", 1);

        // Lookup, then update. No user fetch, no notification.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![before], vec![after]])
            .into_connection();

        let service = StrikeService::new(Arc::new(db));
        let profile = service.add_strike("p1").await.unwrap();

        assert_eq!(profile.strike_count, 1);
    }

    #[tokio::test]
    async fn test_third_strike_deactivates_and_notifies() {
        let before = test_profile("p1", "u1", 2);
        let after = test_profile("p1", "u1", 3);
        let active = test_user("u1", true);
        let deactivated = test_user("u1", false);
        let notice = test_notification("u1", DEACTIVATION_MESSAGE);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![before], vec![after]])
            .append_query_results([vec![active], vec![deactivated]])
            .append_query_results([vec![notice]])
            .into_connection();

        let service = StrikeService::new(Arc::new(db));
        let profile = service.add_strike("p1").await.unwrap();

        assert_eq!(profile.strike_count, 3);
    }

    #[tokio::test]
    async fn test_fourth_strike_notifies_again() {
        let before = test_profile("p1", "u1", 3);
        let after = test_profile("p1", "u1", 4);
        let inactive = test_user("u1", false);
        let notice = test_notification("u1", DEACTIVATION_MESSAGE);

        // Past the threshold the deactivation path still runs.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![before], vec![after]])
            .append_query_results([vec![inactive.clone()], vec![inactive]])
            .append_query_results([vec![notice]])
            .into_connection();

        let service = StrikeService::new(Arc::new(db));
        let profile = service.add_strike("p1").await.unwrap();

        assert_eq!(profile.strike_count, 4);
    }

    #[tokio::test]
    async fn test_add_strike_missing_profile() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<profile::Model>::new()])
            .into_connection();

        let service = StrikeService::new(Arc::new(db));
        let result = service.add_strike("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
