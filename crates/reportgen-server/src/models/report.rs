//! Report row and its lifecycle transitions

use chrono::{DateTime, Utc};
use reportgen_common::types::ReportStatus;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row of the `reports` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_type: String,
    pub output_file_path: Option<String>,
    pub download_url: Option<String>,
    pub download_url_expires_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Report {
    /// A fresh, pending report. The id is assigned here rather than by the database.
    pub fn new(user_id: Uuid, report_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            report_type: report_type.into(),
            output_file_path: None,
            download_url: None,
            download_url_expires_at: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            failed_at: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> ReportStatus {
        ReportStatus::from_lifecycle(self.started_at, self.completed_at, self.failed_at)
    }

    pub fn is_completed(&self) -> bool {
        self.status() == ReportStatus::Completed
    }

    /// Reset every outcome field and stamp `started_at`.
    pub fn mark_started(&mut self, now: DateTime<Utc>) {
        self.output_file_path = None;
        self.download_url = None;
        self.download_url_expires_at = None;
        self.error_message = None;
        self.failed_at = None;
        self.completed_at = None;
        self.started_at = Some(now);
    }

    pub fn mark_completed(&mut self, output_file_path: impl Into<String>, now: DateTime<Utc>) {
        self.output_file_path = Some(output_file_path.into());
        self.completed_at = Some(now);
    }

    pub fn mark_failed(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.error_message = Some(message.into());
        self.failed_at = Some(now);
    }

    /// Whether the cached download link is missing or expired at `now`.
    pub fn download_url_stale(&self, now: DateTime<Utc>) -> bool {
        match (&self.download_url, self.download_url_expires_at) {
            (Some(_), Some(expires_at)) => expires_at < now,
            _ => true,
        }
    }
}

/// Read model returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportView {
    pub id: Uuid,
    pub report_type: String,
    pub output_file_path: Option<String>,
    pub download_url: Option<String>,
    pub download_url_expires_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: ReportStatus,
}

impl From<Report> for ReportView {
    fn from(report: Report) -> Self {
        let status = report.status();
        Self {
            id: report.id,
            report_type: report.report_type,
            output_file_path: report.output_file_path,
            download_url: report.download_url,
            download_url_expires_at: report.download_url_expires_at,
            error_message: report.error_message,
            created_at: report.created_at,
            started_at: report.started_at,
            failed_at: report.failed_at,
            completed_at: report.completed_at,
            status,
        }
    }
}
