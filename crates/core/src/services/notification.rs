//! Notification service.
//!
//! Single chokepoint for emitting notification rows. Self-notification is
//! always suppressed: when the acting user is the would-be recipient, the
//! triggering action still applies but no row is created.

use fable_common::{AppError, AppResult};
use fable_db::{entities::notification, repositories::NotificationRepository};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};

/// Create a notification row on any connection (plain or transactional).
///
/// Returns `None` when suppressed because the actor is the recipient.
pub(crate) async fn notify_on<C: ConnectionTrait>(
    conn: &C,
    recipient_id: &str,
    actor_id: Option<&str>,
    message: &str,
) -> AppResult<Option<notification::Model>> {
    if actor_id == Some(recipient_id) {
        return Ok(None);
    }

    let model = notification::ActiveModel {
        id: Set(crate::generate_id()),
        recipient_id: Set(recipient_id.to_string()),
        message: Set(message.to_string()),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now().into()),
    };

    let notification = model
        .insert(conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Some(notification))
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self { notification_repo }
    }

    /// Notify a recipient. Suppressed (returns `None`) when the actor is
    /// the recipient.
    pub async fn notify(
        &self,
        recipient_id: &str,
        actor_id: Option<&str>,
        message: &str,
    ) -> AppResult<Option<notification::Model>> {
        if actor_id == Some(recipient_id) {
            return Ok(None);
        }

        let model = notification::ActiveModel {
            id: Set(crate::generate_id()),
            recipient_id: Set(recipient_id.to_string()),
            message: Set(message.to_string()),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        let notification = self.notification_repo.create(model).await?;
        Ok(Some(notification))
    }

    /// All notifications for a user, newest first.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<notification::Model>> {
        self.notification_repo.find_by_recipient(user_id).await
    }

    /// Mark a notification as read.
    ///
    /// NotFound when the notification does not exist or belongs to another
    /// user; a foreign row is never revealed. Already-read rows succeed
    /// without a write.
    pub async fn mark_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> AppResult<notification::Model> {
        let notification = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .filter(|n| n.recipient_id == user_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Notification {notification_id} not found"))
            })?;

        if notification.is_read {
            return Ok(notification);
        }

        self.notification_repo.mark_as_read(notification).await
    }

    /// Mark all notifications as read for a user.
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_notification(id: &str, recipient_id: &str, is_read: bool) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            recipient_id: recipient_id.to_string(),
            message: "Hello".to_string(),
            is_read,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> NotificationService {
        NotificationService::new(NotificationRepository::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn test_notify_suppresses_self() {
        // No query results appended: a suppressed notify must not hit the db.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db).notify("u1", Some("u1"), "Hi").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_notify_creates_row() {
        let created = test_notification("n1", "u2", false);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[created]])
            .into_connection();

        let result = service(db).notify("u2", Some("u1"), "Hi").await.unwrap();

        assert_eq!(result.unwrap().recipient_id, "u2");
    }

    #[tokio::test]
    async fn test_mark_read_foreign_row_is_not_found() {
        let foreign = test_notification("n1", "someone-else", false);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[foreign]])
            .into_connection();

        let result = service(db).mark_read("u1", "n1").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_read_already_read_is_idempotent() {
        let read = test_notification("n1", "u1", true);
        // Only the lookup result: no update should be issued.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[read]])
            .into_connection();

        let result = service(db).mark_read("u1", "n1").await.unwrap();

        assert!(result.is_read);
    }

    #[tokio::test]
    async fn test_mark_read_flips_flag() {
        let unread = test_notification("n1", "u1", false);
        let mut read = unread.clone();
        read.is_read = true;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![unread], vec![read]])
            .into_connection();

        let result = service(db).mark_read("u1", "n1").await.unwrap();

        assert!(result.is_read);
    }
}
