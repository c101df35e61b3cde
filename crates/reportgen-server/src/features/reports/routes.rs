use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use super::{
    commands::{create::handle as handle_create, CreateReportCommand, CreateReportError},
    queries::{get::handle as handle_get, GetReportError, GetReportQuery},
    ReportsState,
};
use crate::api::{extract::OwnerId, response::ApiResponse};
use crate::error::AppError;
use crate::models::ReportView;

pub fn reports_routes() -> Router<ReportsState> {
    Router::new()
        .route("/", post(create_report))
        .route("/:report_id", get(get_report))
}

/// POST /reports
#[tracing::instrument(skip(state, body), fields(user_id = %owner.0))]
async fn create_report(
    State(state): State<ReportsState>,
    owner: OwnerId,
    body: Result<Json<CreateReportCommand>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(command) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let report = handle_create(&state, owner.0, command).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(ReportView::from(report)))).into_response())
}

/// GET /reports/:report_id
#[tracing::instrument(skip(state), fields(user_id = %owner.0))]
async fn get_report(
    State(state): State<ReportsState>,
    owner: OwnerId,
    Path(report_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let report = handle_get(&state, owner.0, GetReportQuery { report_id }).await?;

    Ok(ApiResponse::success(ReportView::from(report)).into_response())
}

impl From<CreateReportError> for AppError {
    fn from(err: CreateReportError) -> Self {
        match err {
            CreateReportError::ReportTypeRequired | CreateReportError::UnsupportedReportType(_) => {
                AppError::Validation(err.to_string())
            },
            CreateReportError::Database(e) => e.into(),
            CreateReportError::Encode(e) => AppError::Common(e),
            CreateReportError::Queue(e) => AppError::Internal(format!("{:#}", e)),
        }
    }
}

impl From<GetReportError> for AppError {
    fn from(err: GetReportError) -> Self {
        match err {
            GetReportError::NotFound => AppError::NotFound("Report not found".to_string()),
            GetReportError::Database(e) => e.into(),
            GetReportError::Link(e) => AppError::Internal(e.to_string()),
        }
    }
}
