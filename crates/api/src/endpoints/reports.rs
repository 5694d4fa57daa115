//! Moderation report endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use fable_common::AppResult;
use fable_core::CreateReportInput;
use fable_db::entities::{
    reason,
    report::{self, ReportStatus},
};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

const MAX_PAGE_SIZE: u64 = 100;

/// Report creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub post_id: String,
    pub reason_ids: Vec<String>,
    #[serde(default)]
    pub text: String,
}

/// Report listing query.
#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub status: Option<ReportStatus>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Status transition request.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: ReportStatus,
}

/// Report response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub post_id: String,
    pub reporter_id: String,
    pub text: String,
    pub status: ReportStatus,
    pub created_at: String,
}

impl From<report::Model> for ReportResponse {
    fn from(r: report::Model) -> Self {
        Self {
            id: r.id,
            post_id: r.post_id,
            reporter_id: r.reporter_id,
            text: r.text,
            status: r.status,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Reason response.
#[derive(Serialize)]
pub struct ReasonResponse {
    pub id: String,
    pub name: String,
}

impl From<reason::Model> for ReasonResponse {
    fn from(r: reason::Model) -> Self {
        Self {
            id: r.id,
            name: r.name,
        }
    }
}

/// Report with its reasons attached.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetailResponse {
    #[serde(flatten)]
    pub report: ReportResponse,
    pub reasons: Vec<ReasonResponse>,
}

/// Pending count response.
#[derive(Serialize)]
pub struct PendingCountResponse {
    pub count: u64,
}

/// File a report against a post.
async fn create_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateReportRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let input = CreateReportInput {
        post_id: req.post_id,
        reason_ids: req.reason_ids,
        text: req.text,
    };
    let report = state.moderation_service.create_report(&user.id, input).await?;

    Ok(ApiResponse::ok(report.into()))
}

/// Reports filtered by status, newest first.
async fn list_reports(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> AppResult<ApiResponse<Vec<ReportResponse>>> {
    let limit = query.limit.min(MAX_PAGE_SIZE);
    let reports = state
        .moderation_service
        .get_reports(query.status, limit, query.offset)
        .await?;

    Ok(ApiResponse::ok(
        reports.into_iter().map(ReportResponse::from).collect(),
    ))
}

/// Count reports awaiting review.
async fn pending_count(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PendingCountResponse>> {
    let count = state.moderation_service.count_pending().await?;

    Ok(ApiResponse::ok(PendingCountResponse { count }))
}

/// Reason creation request.
#[derive(Debug, Deserialize)]
pub struct CreateReasonRequest {
    pub name: String,
}

/// Add a reason to the reporting vocabulary.
async fn create_reason(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateReasonRequest>,
) -> AppResult<ApiResponse<ReasonResponse>> {
    let reason = state.moderation_service.create_reason(&req.name).await?;

    Ok(ApiResponse::ok(reason.into()))
}

/// All report reasons.
async fn list_reasons(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ReasonResponse>>> {
    let reasons = state.moderation_service.list_reasons().await?;

    Ok(ApiResponse::ok(
        reasons.into_iter().map(ReasonResponse::from).collect(),
    ))
}

/// A single report with its reasons.
async fn get_report(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ReportDetailResponse>> {
    let report = state.moderation_service.get_report(&id).await?;
    let reasons = state.moderation_service.reasons_for_report(&id).await?;

    Ok(ApiResponse::ok(ReportDetailResponse {
        report: report.into(),
        reasons: reasons.into_iter().map(ReasonResponse::from).collect(),
    }))
}

/// Move a report to a new status.
///
/// The resolved transition deletes the reported post and strikes its
/// author; any other transition just persists.
async fn set_status(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state.moderation_service.set_status(&id, req.status).await?;

    Ok(ApiResponse::ok(report.into()))
}

/// Create the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_report).get(list_reports))
        .route("/pending-count", get(pending_count))
        .route("/reasons", get(list_reasons).post(create_reason))
        .route("/{id}", get(get_report))
        .route("/{id}/status", patch(set_status))
}
