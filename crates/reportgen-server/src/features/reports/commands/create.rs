//! Create report command
//!
//! Inserts a pending report and enqueues the job message that drives its
//! build.

use reportgen_common::{
    types::{is_supported_report_type, JobMessage, SUPPORTED_REPORT_TYPES},
    CommonError,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::super::ReportsState;
use crate::db::DbError;
use crate::models::Report;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReportCommand {
    pub report_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateReportError {
    #[error("Report type is required")]
    ReportTypeRequired,

    #[error("Unsupported report type '{0}', expected one of: {supported}", supported = SUPPORTED_REPORT_TYPES.join(", "))]
    UnsupportedReportType(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Failed to encode job message: {0}")]
    Encode(#[from] CommonError),

    #[error("Failed to enqueue report job: {0}")]
    Queue(#[source] anyhow::Error),
}

impl CreateReportCommand {
    pub fn validate(&self) -> Result<(), CreateReportError> {
        let report_type = self.report_type.trim();
        if report_type.is_empty() {
            return Err(CreateReportError::ReportTypeRequired);
        }
        if !is_supported_report_type(report_type) {
            return Err(CreateReportError::UnsupportedReportType(report_type.to_string()));
        }
        Ok(())
    }
}

#[tracing::instrument(skip(state))]
pub async fn handle(
    state: &ReportsState,
    user_id: Uuid,
    command: CreateReportCommand,
) -> Result<Report, CreateReportError> {
    command.validate()?;

    let report = state.reports.create(user_id, command.report_type.trim()).await?;

    let body = JobMessage::new(user_id, report.id).to_json()?;
    let queue_url = state.queue.resolve_url().await.map_err(CreateReportError::Queue)?;
    let message_id = state
        .queue
        .send(&queue_url, body)
        .await
        .map_err(CreateReportError::Queue)?;

    info!(report_id = %report.id, %message_id, "Report job enqueued");

    Ok(report)
}
