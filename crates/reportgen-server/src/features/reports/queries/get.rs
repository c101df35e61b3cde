//! Get report query
//!
//! Loads a report for its owner and refreshes the download URL when the
//! report is completed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::ReportsState;
use crate::db::DbError;
use crate::models::Report;
use crate::reports::LinkError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetReportQuery {
    pub report_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum GetReportError {
    #[error("Report not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(DbError),

    #[error("Failed to resolve download link: {0}")]
    Link(#[from] LinkError),
}

impl From<DbError> for GetReportError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(_) => GetReportError::NotFound,
            other => GetReportError::Database(other),
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn handle(
    state: &ReportsState,
    user_id: Uuid,
    query: GetReportQuery,
) -> Result<Report, GetReportError> {
    let report = state.reports.by_primary_key(query.report_id, user_id).await?;
    Ok(state.links.resolve(report).await?)
}
