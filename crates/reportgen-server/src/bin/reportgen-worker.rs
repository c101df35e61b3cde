//! Report worker - consumes the job queue and builds reports

use anyhow::{Context, Result};
use reportgen_common::logging::{init_logging, LogConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use reportgen_server::{
    config::Config,
    db::{self, DbConfig, PgReportStore},
    queue::{config::QueueConfig, SqsQueue},
    reports::{CompendiumClient, ReportBuilder, ReportWorker, WorkerError, WorkerOptions},
    shutdown::cancel_on_signal,
    storage::{config::StorageConfig, Storage},
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("reportgen-worker")
        .filter_directives("reportgen_server=debug,sqlx=warn,aws_smithy_runtime=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    let config = Config::load()?;
    info!(
        concurrency = config.worker.concurrency,
        job_timeout_secs = config.worker.job_timeout_secs,
        "Starting report worker"
    );

    let pool = db::create_pool(&DbConfig::from(&config.database)).await?;
    let reports = Arc::new(PgReportStore::new(pool));
    let storage = Arc::new(Storage::new(StorageConfig::from_env()?)?);
    let queue = Arc::new(SqsQueue::new(QueueConfig::from_env()?));
    let source = Arc::new(
        CompendiumClient::new(
            config.reports.source_base_url.clone(),
            std::time::Duration::from_secs(config.reports.source_timeout_secs),
        )
        .context("Failed to create data source client")?,
    );

    let builder = ReportBuilder::new(reports, source, storage);
    let worker = ReportWorker::new(builder, queue, WorkerOptions::from(&config.worker));

    let shutdown = CancellationToken::new();
    let _signal = cancel_on_signal(shutdown.clone());

    match worker.start(shutdown).await {
        Err(WorkerError::Cancelled) => {
            info!("Report worker stopped");
            Ok(())
        },
        Err(e) => Err(e).context("Report worker failed"),
        Ok(()) => Ok(()),
    }
}
