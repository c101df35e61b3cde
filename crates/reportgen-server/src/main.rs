//! Report API server - main entry point

use anyhow::{Context, Result};
use reportgen_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

use reportgen_server::{
    api,
    config::Config,
    db::{self, DbConfig, PgReportStore},
    features::{FeatureState, ReportsState},
    queue::{config::QueueConfig, SqsQueue},
    reports::DownloadLinkResolver,
    shutdown::shutdown_signal,
    storage::{config::StorageConfig, Storage},
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("reportgen-server")
        .filter_directives("reportgen_server=debug,tower_http=debug,sqlx=info")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting report API server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let pool = db::create_pool(&DbConfig::from(&config.database)).await?;
    info!("Database connection pool established");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Database migrations completed");

    let storage = Arc::new(Storage::new(StorageConfig::from_env()?)?);
    let queue = Arc::new(SqsQueue::new(QueueConfig::from_env()?));
    let reports = Arc::new(PgReportStore::new(pool));

    let links = DownloadLinkResolver::new(
        reports.clone(),
        storage,
        config.reports.download_url_ttl(),
    );

    let state = FeatureState {
        reports: ReportsState {
            reports,
            queue,
            links,
        },
    };

    let app = api::create_router(state, &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}
