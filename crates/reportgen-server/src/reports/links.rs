//! Download link resolution for completed reports

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::{DbError, ReportStore};
use crate::models::Report;
use crate::storage::ObjectStore;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Completed report {0} has no output file")]
    MissingOutput(Uuid),

    #[error("Failed to presign download URL: {0}")]
    Presign(#[source] anyhow::Error),

    #[error("Failed to persist download URL: {0}")]
    Database(#[from] DbError),
}

/// Mints presigned URLs lazily and caches them on the report row.
#[derive(Clone)]
pub struct DownloadLinkResolver {
    reports: Arc<dyn ReportStore>,
    objects: Arc<dyn ObjectStore>,
    ttl: Duration,
}

impl DownloadLinkResolver {
    pub fn new(reports: Arc<dyn ReportStore>, objects: Arc<dyn ObjectStore>, ttl: Duration) -> Self {
        Self {
            reports,
            objects,
            ttl,
        }
    }

    /// Return `report` with a usable download URL when it is completed.
    ///
    /// A cached URL is reused until its expiry passes. Reports that are not
    /// completed come back unchanged.
    #[instrument(skip(self, report), fields(report_id = %report.id))]
    pub async fn resolve(&self, mut report: Report) -> Result<Report, LinkError> {
        if !report.is_completed() || !report.download_url_stale(Utc::now()) {
            return Ok(report);
        }

        let key = report
            .output_file_path
            .clone()
            .ok_or(LinkError::MissingOutput(report.id))?;

        let presigned = self
            .objects
            .presign_get(&key, self.ttl)
            .await
            .map_err(LinkError::Presign)?;

        debug!(expires_at = %presigned.expires_at, "Minted download URL");

        report.download_url = Some(presigned.url);
        report.download_url_expires_at = Some(presigned.expires_at);

        Ok(self.reports.update(&report).await?)
    }
}
