//! Wire and domain types shared by the API and the worker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CommonError, Result};

/// The only report type the builder knows how to produce.
pub const MONSTERS_REPORT_TYPE: &str = "monsters";

/// Report types accepted at submission time.
pub const SUPPORTED_REPORT_TYPES: &[&str] = &[MONSTERS_REPORT_TYPE];

// ============================================================================
// Job Message
// ============================================================================

/// Queue body pointing at a report row.
///
/// The message carries identifiers only; the worker re-reads the full report
/// state by primary key before doing anything with it.
///
/// ```
/// use reportgen_common::types::JobMessage;
/// use uuid::Uuid;
///
/// let message = JobMessage::new(Uuid::new_v4(), Uuid::new_v4());
/// let body = message.to_json().unwrap();
/// assert_eq!(JobMessage::from_json(&body).unwrap(), message);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMessage {
    pub user_id: Uuid,
    pub report_id: Uuid,
}

impl JobMessage {
    pub fn new(user_id: Uuid, report_id: Uuid) -> Self {
        Self { user_id, report_id }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a queue body. Blank bodies are reported separately from
    /// undecodable ones so callers can log them differently.
    pub fn from_json(body: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Err(CommonError::EmptyMessage);
        }
        Ok(serde_json::from_str(body)?)
    }
}

// ============================================================================
// Report Status
// ============================================================================

/// Status derived from a report's lifecycle timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Started,
    Failed,
    Completed,
}

impl ReportStatus {
    /// Precedence: failed > completed > started > pending.
    pub fn from_lifecycle(
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
        failed_at: Option<DateTime<Utc>>,
    ) -> Self {
        if failed_at.is_some() {
            ReportStatus::Failed
        } else if completed_at.is_some() {
            ReportStatus::Completed
        } else if started_at.is_some() {
            ReportStatus::Started
        } else {
            ReportStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Started => "started",
            ReportStatus::Failed => "failed",
            ReportStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReportStatus::Pending),
            "started" => Ok(ReportStatus::Started),
            "failed" => Ok(ReportStatus::Failed),
            "completed" => Ok(ReportStatus::Completed),
            other => Err(CommonError::InvalidStatus(other.to_string())),
        }
    }
}

/// Whether a report type can be submitted.
pub fn is_supported_report_type(report_type: &str) -> bool {
    SUPPORTED_REPORT_TYPES.contains(&report_type)
}
