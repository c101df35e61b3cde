//! Report repository
//!
//! Every read and write is scoped by `(report id, owner id)` so one owner can
//! never observe or mutate another owner's report.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DbError, DbResult};
use crate::models::Report;

/// Durable storage for report rows.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert a new pending report.
    async fn create(&self, user_id: Uuid, report_type: &str) -> DbResult<Report>;

    /// Overwrite every mutable column of an existing report.
    async fn update(&self, report: &Report) -> DbResult<Report>;

    /// Load a report by primary key. Missing rows are `DbError::NotFound`.
    async fn by_primary_key(&self, report_id: Uuid, user_id: Uuid) -> DbResult<Report>;

    /// Cheap connectivity probe for `/health`.
    async fn health_check(&self) -> DbResult<()>;
}

/// PostgreSQL-backed [`ReportStore`].
#[derive(Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    #[tracing::instrument(skip(self))]
    async fn create(&self, user_id: Uuid, report_type: &str) -> DbResult<Report> {
        let draft = Report::new(user_id, report_type);

        let report = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (id, user_id, report_type)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, report_type, output_file_path, download_url,
                      download_url_expires_at, error_message, created_at,
                      started_at, failed_at, completed_at
            "#,
        )
        .bind(draft.id)
        .bind(draft.user_id)
        .bind(&draft.report_type)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(report_id = %report.id, "Report created");

        Ok(report)
    }

    #[tracing::instrument(skip(self, report), fields(report_id = %report.id, user_id = %report.user_id))]
    async fn update(&self, report: &Report) -> DbResult<Report> {
        sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports
            SET output_file_path = $3,
                download_url = $4,
                download_url_expires_at = $5,
                error_message = $6,
                started_at = $7,
                failed_at = $8,
                completed_at = $9
            WHERE user_id = $1 AND id = $2
            RETURNING id, user_id, report_type, output_file_path, download_url,
                      download_url_expires_at, error_message, created_at,
                      started_at, failed_at, completed_at
            "#,
        )
        .bind(report.user_id)
        .bind(report.id)
        .bind(&report.output_file_path)
        .bind(&report.download_url)
        .bind(report.download_url_expires_at)
        .bind(&report.error_message)
        .bind(report.started_at)
        .bind(report.failed_at)
        .bind(report.completed_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Report", &report.id.to_string()))
    }

    #[tracing::instrument(skip(self))]
    async fn by_primary_key(&self, report_id: Uuid, user_id: Uuid) -> DbResult<Report> {
        sqlx::query_as::<_, Report>(
            r#"
            SELECT id, user_id, report_type, output_file_path, download_url,
                   download_url_expires_at, error_message, created_at,
                   started_at, failed_at, completed_at
            FROM reports
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(user_id)
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Report", &report_id.to_string()))
    }

    async fn health_check(&self) -> DbResult<()> {
        super::health_check(&self.pool).await
    }
}
