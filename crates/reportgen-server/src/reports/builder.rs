//! Report build state machine
//!
//! `Pending -> Started -> {Completed, Failed}`. A report that already has a
//! `started_at` is returned untouched, which makes redelivered job messages
//! harmless once the first attempt has begun.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::encoder::{encode_monsters, EncodeError};
use super::source::{DataSource, SourceError};
use crate::db::{DbError, ReportStore};
use crate::models::Report;
use crate::storage::{report_key, ObjectStore};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Report {report_id} for user {user_id} not found")]
    NotFound { report_id: Uuid, user_id: Uuid },

    #[error("No monsters data found")]
    EmptyDataset,

    #[error("Failed to get monsters data: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to encode report: {0}")]
    Encode(#[from] EncodeError),

    #[error("Failed to upload report to {key}: {source}")]
    Upload {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to update report: {0}")]
    Database(#[source] DbError),
}

#[derive(Clone)]
pub struct ReportBuilder {
    reports: Arc<dyn ReportStore>,
    source: Arc<dyn DataSource>,
    objects: Arc<dyn ObjectStore>,
}

impl ReportBuilder {
    pub fn new(
        reports: Arc<dyn ReportStore>,
        source: Arc<dyn DataSource>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            reports,
            source,
            objects,
        }
    }

    /// Run one build attempt for `(user_id, report_id)`.
    #[instrument(skip(self))]
    pub async fn build(&self, user_id: Uuid, report_id: Uuid) -> Result<Report, BuildError> {
        let mut report = self
            .reports
            .by_primary_key(report_id, user_id)
            .await
            .map_err(|e| match e {
                DbError::NotFound(_) => BuildError::NotFound { report_id, user_id },
                other => BuildError::Database(other),
            })?;

        if report.started_at.is_some() {
            info!(status = %report.status(), "Report already started, skipping build");
            return Ok(report);
        }

        report.mark_started(Utc::now());
        let started = self.reports.update(&report).await.map_err(BuildError::Database)?;

        match self.generate(&started).await {
            Ok(completed) => Ok(completed),
            Err(err) => {
                self.record_failure(started, &err).await;
                Err(err)
            },
        }
    }

    async fn generate(&self, started: &Report) -> Result<Report, BuildError> {
        let monsters = self.source.fetch_monsters().await?;
        if monsters.is_empty() {
            return Err(BuildError::EmptyDataset);
        }

        let encoded = encode_monsters(&monsters)?;
        let key = report_key(started.user_id, started.id);

        let upload = self
            .objects
            .put(&key, encoded.bytes)
            .await
            .map_err(|source| BuildError::Upload {
                key: key.clone(),
                source,
            })?;

        let mut report = started.clone();
        report.mark_completed(&key, Utc::now());
        let report = self.reports.update(&report).await.map_err(BuildError::Database)?;

        info!(
            report_id = %report.id,
            user_id = %report.user_id,
            path = %key,
            rows = encoded.rows,
            size = upload.size,
            checksum = %upload.checksum,
            "report generated successfully"
        );

        Ok(report)
    }

    /// Stamp the failure onto the started snapshot. Errors here are logged only.
    async fn record_failure(&self, mut report: Report, err: &BuildError) {
        report.mark_failed(err.to_string(), Utc::now());

        if let Err(update_err) = self.reports.update(&report).await {
            error!(
                report_id = %report.id,
                error = %err,
                update_error = %update_err,
                "Failed to record report failure"
            );
        }
    }
}
