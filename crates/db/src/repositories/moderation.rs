//! Moderation repository for reports and report reasons.

use std::sync::Arc;

use crate::entities::{
    reason,
    report::{self, ReportStatus},
    report_reason, Reason, Report,
};
use fable_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

/// Moderation repository for database operations.
#[derive(Clone)]
pub struct ModerationRepository {
    db: Arc<DatabaseConnection>,
}

impl ModerationRepository {
    /// Create a new moderation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ========== Reports ==========

    /// Find a report by ID.
    pub async fn find_report(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a report by ID, failing if absent.
    pub async fn get_report(&self, id: &str) -> AppResult<report::Model> {
        self.find_report(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))
    }

    /// Get reports with optional status filter, newest first.
    pub async fn get_reports(
        &self,
        status: Option<ReportStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<report::Model>> {
        let mut query = Report::find().order_by_desc(report::Column::CreatedAt);

        if let Some(s) = status {
            query = query.filter(report::Column::Status.eq(s));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count pending reports.
    pub async fn count_pending(&self) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::Status.eq(ReportStatus::Pending))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ========== Reasons ==========

    /// All reasons, by name.
    pub async fn list_reasons(&self) -> AppResult<Vec<reason::Model>> {
        Reason::find()
            .order_by_asc(reason::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a reason.
    pub async fn create_reason(&self, model: reason::ActiveModel) -> AppResult<reason::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reasons attached to a report.
    pub async fn reasons_for_report(&self, report_id: &str) -> AppResult<Vec<reason::Model>> {
        Reason::find()
            .join(JoinType::InnerJoin, reason::Relation::Reports.def())
            .filter(report_reason::Column::ReportId.eq(report_id))
            .order_by_asc(reason::Column::Name)
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

    fn test_report(id: &str, post_id: &str, reporter_id: &str) -> report::Model {
        report::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            reporter_id: reporter_id.to_string(),
            text: "Test report".to_string(),
            status: ReportStatus::Pending,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_reports() {
        let r1 = test_report("r1", "post1", "u1");
        let r2 = test_report("r2", "post2", "u2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1, r2]])
                .into_connection(),
        );

        let repo = ModerationRepository::new(db);
        let result = repo
            .get_reports(Some(ReportStatus::Pending), 10, 0)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_get_report_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<report::Model>::new()])
                .into_connection(),
        );

        let repo = ModerationRepository::new(db);
        let result = repo.get_report("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
