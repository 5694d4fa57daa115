//! Moderation service: report lifecycle and its consequences.

use fable_common::{AppError, AppResult};
use fable_db::{
    entities::{report, report_reason, Post, Profile, Reason, Report},
    repositories::ModerationRepository,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::sync::Arc;

use crate::services::notification::notify_on;
use crate::services::strike::add_strike_on;
use crate::services::txn_err;

pub use fable_db::entities::report::ReportStatus;

const STRIKE_MESSAGE: &str =
    "You received a strike due to a resolved report and your post has been deleted.";

/// Input for creating a report.
pub struct CreateReportInput {
    pub post_id: String,
    pub reason_ids: Vec<String>,
    pub text: String,
}

/// Moderation service for reports and their consequences.
#[derive(Clone)]
pub struct ModerationService {
    db: Arc<DatabaseConnection>,
    moderation_repo: ModerationRepository,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, moderation_repo: ModerationRepository) -> Self {
        Self {
            db,
            moderation_repo,
        }
    }

    /// File a report against a post.
    ///
    /// Requires at least one reason. The report and its reason joins are
    /// inserted in one transaction; filing has no side effects on the post.
    pub async fn create_report(
        &self,
        reporter_id: &str,
        input: CreateReportInput,
    ) -> AppResult<report::Model> {
        if input.reason_ids.is_empty() {
            return Err(AppError::Validation(
                "At least one reason is required".to_string(),
            ));
        }

        let reporter_id = reporter_id.to_string();
        let report_id = crate::generate_id();

        self.db
            .transaction::<_, report::Model, AppError>(move |txn| {
                Box::pin(async move {
                    Post::find_by_id(&input.post_id)
                        .one(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?
                        .ok_or_else(|| {
                            AppError::NotFound(format!("Post {} not found", input.post_id))
                        })?;

                    let reasons = Reason::find()
                        .filter(
                            fable_db::entities::reason::Column::Id
                                .is_in(input.reason_ids.iter().cloned()),
                        )
                        .all(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                    if reasons.len() != input.reason_ids.len() {
                        return Err(AppError::NotFound(
                            "One or more reasons not found".to_string(),
                        ));
                    }

                    let model = report::ActiveModel {
                        id: Set(report_id.clone()),
                        post_id: Set(input.post_id.clone()),
                        reporter_id: Set(reporter_id),
                        text: Set(input.text.trim().to_string()),
                        status: Set(ReportStatus::Pending),
                        created_at: Set(chrono::Utc::now().into()),
                    };
                    let created = model
                        .insert(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;

                    for reason in &reasons {
                        let join = report_reason::ActiveModel {
                            report_id: Set(report_id.clone()),
                            reason_id: Set(reason.id.clone()),
                        };
                        join.insert(txn)
                            .await
                            .map_err(|e| AppError::Database(e.to_string()))?;
                    }

                    Ok(created)
                })
            })
            .await
            .map_err(txn_err)
    }

    /// Change a report's status.
    ///
    /// Only the transition into resolved carries consequences: within the
    /// same transaction the status is persisted, the reported post is
    /// deleted (cascading to comments, likes, and sibling reports), the
    /// author's profile takes a strike, and the author is notified.
    /// Rejection and other overwrites persist with no side effects.
    pub async fn set_status(
        &self,
        report_id: &str,
        new_status: ReportStatus,
    ) -> AppResult<report::Model> {
        let report_id = report_id.to_string();

        self.db
            .transaction::<_, report::Model, AppError>(move |txn| {
                Box::pin(async move { set_status_on(txn, &report_id, new_status).await })
            })
            .await
            .map_err(txn_err)
    }

    /// Fetch a single report.
    pub async fn get_report(&self, id: &str) -> AppResult<report::Model> {
        self.moderation_repo.get_report(id).await
    }

    /// Reports filtered by status, newest first.
    pub async fn get_reports(
        &self,
        status: Option<ReportStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<report::Model>> {
        self.moderation_repo.get_reports(status, limit, offset).await
    }

    /// Count pending reports.
    pub async fn count_pending(&self) -> AppResult<u64> {
        self.moderation_repo.count_pending().await
    }

    /// All report reasons.
    pub async fn list_reasons(&self) -> AppResult<Vec<fable_db::entities::reason::Model>> {
        self.moderation_repo.list_reasons().await
    }

    /// Add a reason to the reporting vocabulary.
    pub async fn create_reason(&self, name: &str) -> AppResult<fable_db::entities::reason::Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Reason name is required".to_string()));
        }

        let model = fable_db::entities::reason::ActiveModel {
            id: Set(crate::generate_id()),
            name: Set(name.to_string()),
        };
        self.moderation_repo.create_reason(model).await
    }

    /// Reasons attached to a report.
    pub async fn reasons_for_report(
        &self,
        report_id: &str,
    ) -> AppResult<Vec<fable_db::entities::reason::Model>> {
        self.moderation_repo.reasons_for_report(report_id).await
    }
}

async fn set_status_on<C: ConnectionTrait>(
    txn: &C,
    report_id: &str,
    new_status: ReportStatus,
) -> AppResult<report::Model> {
    let current = Report::find_by_id(report_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Report {report_id} not found")))?;

    let old_status = current.status;
    let post_id = current.post_id.clone();

    let mut active: report::ActiveModel = current.into();
    active.status = Set(new_status);
    let updated = active
        .update(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if old_status != ReportStatus::Resolved && new_status == ReportStatus::Resolved {
        let post = Post::find_by_id(&post_id)
            .one(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Post {post_id} not found")))?;
        let author_id = post.author_id.clone();

        // Cascades to the variant row, comments, likes, and every report
        // against this post (this one included).
        Post::delete_by_id(&post_id)
            .exec(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let author_profile = Profile::find()
            .filter(fable_db::entities::profile::Column::UserId.eq(author_id.as_str()))
            .one(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if let Some(profile) = author_profile {
            add_strike_on(txn, &profile.id).await?;
        }

        notify_on(txn, &author_id, None, STRIKE_MESSAGE).await?;
        tracing::info!(
            report_id = report_id,
            post_id = %post_id,
            "Report resolved; post deleted and author struck"
        );
    }

    Ok(updated)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fable_db::entities::{notification, post, profile, reason};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_report(id: &str, post_id: &str, status: ReportStatus) -> report::Model {
        report::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            reporter_id: "reporter".to_string(),
            text: "spam".to_string(),
            status,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn test_post(id: &str, author_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            kind: post::PostKind::Story,
            author_id: author_id.to_string(),
            created_at: chrono::Utc::now().into(),
        }
    }

    fn test_profile(id: &str, user_id: &str, strike_count: i32) -> profile::Model {
        profile::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: String::new(),
            bio: String::new(),
            avatar_url: None,
            strike_count,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> ModerationService {
        let db = Arc::new(db);
        ModerationService::new(db.clone(), ModerationRepository::new(db))
    }

    #[tokio::test]
    async fn test_create_report_requires_reasons() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let input = CreateReportInput {
            post_id: "post1".to_string(),
            reason_ids: vec![],
            text: String::new(),
        };
        let result = service(db).create_report("u1", input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_report_inserts_joins() {
        let target = test_post("post1", "author");
        let spam = reason::Model {
            id: "reason1".to_string(),
            name: "Spam".to_string(),
        };
        let created = test_report("r1", "post1", ReportStatus::Pending);
        let join = report_reason::Model {
            report_id: "r1".to_string(),
            reason_id: "reason1".to_string(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[target]])
            .append_query_results([[spam]])
            .append_query_results([[created]])
            .append_query_results([[join]])
            .into_connection();

        let input = CreateReportInput {
            post_id: "post1".to_string(),
            reason_ids: vec!["reason1".to_string()],
            text: "spam".to_string(),
        };
        let report = service(db).create_report("u1", input).await.unwrap();

        assert_eq!(report.status, ReportStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_report_unknown_reason() {
        let target = test_post("post1", "author");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[target]])
            .append_query_results([Vec::<reason::Model>::new()])
            .into_connection();

        let input = CreateReportInput {
            post_id: "post1".to_string(),
            reason_ids: vec!["missing".to_string()],
            text: String::new(),
        };
        let result = service(db).create_report("u1", input).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reject_has_no_side_effects() {
        let pending = test_report("r1", "post1", ReportStatus::Pending);
        let rejected = test_report("r1", "post1", ReportStatus::Rejected);

        // Lookup + update only.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending], vec![rejected]])
            .into_connection();

        let report = service(db)
            .set_status("r1", ReportStatus::Rejected)
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Rejected);
    }

    #[tokio::test]
    async fn test_resolve_deletes_post_and_strikes_author() {
        let pending = test_report("r1", "post1", ReportStatus::Pending);
        let resolved = test_report("r1", "post1", ReportStatus::Resolved);
        let target = test_post("post1", "author");
        let author_profile = test_profile("p1", "author", 0);
        let struck = test_profile("p1", "author", 1);
        let notice = notification::Model {
            id: "n1".to_string(),
            recipient_id: "author".to_string(),
            message: STRIKE_MESSAGE.to_string(),
            is_read: false,
            created_at: chrono::Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending], vec![resolved]])
            .append_query_results([[target]])
            .append_query_results([vec![author_profile.clone()], vec![author_profile], vec![struck]])
            .append_query_results([[notice]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let report = service(db)
            .set_status("r1", ReportStatus::Resolved)
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Resolved);
    }

    #[tokio::test]
    async fn test_resolve_already_resolved_is_plain_overwrite() {
        let resolved = test_report("r1", "post1", ReportStatus::Resolved);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![resolved.clone()], vec![resolved]])
            .into_connection();

        let report = service(db)
            .set_status("r1", ReportStatus::Resolved)
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Resolved);
    }
}
