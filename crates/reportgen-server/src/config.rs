//! Configuration management

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/reportgen";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

// ============================================================================
// Worker / Report Constants
// ============================================================================

/// Default number of concurrent report builds per worker process.
pub const DEFAULT_WORKER_CONCURRENCY: usize = 2;

/// Default upper bound on a single report build.
pub const DEFAULT_WORKER_JOB_TIMEOUT_SECS: u64 = 10;

/// Default long-poll wait for a queue receive call (SQS maximum is 20).
pub const DEFAULT_WORKER_WAIT_TIME_SECS: i32 = 20;

/// Default lifetime of a presigned download link.
///
/// Ten seconds is what the deployed system uses; it reads like a test value
/// and is kept overridable rather than changed.
pub const DEFAULT_DOWNLOAD_URL_TTL_SECS: u64 = 10;

/// Default base URL of the compendium API the monsters dataset comes from.
pub const DEFAULT_SOURCE_BASE_URL: &str = "https://botw-compendium.herokuapp.com/api/v3/compendium";

/// Default HTTP timeout for the data source client.
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub worker: WorkerConfig,
    pub reports: ReportsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Queue consumer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of worker loops, also the capacity of the in-process buffer
    pub concurrency: usize,
    pub job_timeout_secs: u64,
    pub wait_time_secs: i32,
}

impl WorkerConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

/// Report generation and download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    pub download_url_ttl_secs: u64,
    pub source_base_url: String,
    pub source_timeout_secs: u64,
}

impl ReportsConfig {
    pub fn download_url_ttl(&self) -> Duration {
        Duration::from_secs(self.download_url_ttl_secs)
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("REPORTGEN_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("REPORTGEN_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "REPORTGEN_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or("DATABASE_IDLE_TIMEOUT", DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
            worker: WorkerConfig {
                concurrency: env_or("WORKER_CONCURRENCY", DEFAULT_WORKER_CONCURRENCY),
                job_timeout_secs: env_or("WORKER_JOB_TIMEOUT_SECS", DEFAULT_WORKER_JOB_TIMEOUT_SECS),
                wait_time_secs: env_or("WORKER_WAIT_TIME_SECS", DEFAULT_WORKER_WAIT_TIME_SECS),
            },
            reports: ReportsConfig {
                download_url_ttl_secs: env_or(
                    "REPORT_DOWNLOAD_URL_TTL_SECS",
                    DEFAULT_DOWNLOAD_URL_TTL_SECS,
                ),
                source_base_url: std::env::var("REPORT_SOURCE_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_SOURCE_BASE_URL.to_string()),
                source_timeout_secs: env_or(
                    "REPORT_SOURCE_TIMEOUT_SECS",
                    DEFAULT_SOURCE_TIMEOUT_SECS,
                ),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.worker.concurrency == 0 {
            anyhow::bail!("Worker concurrency must be greater than 0");
        }

        if self.worker.job_timeout_secs == 0 {
            anyhow::bail!("Worker job timeout must be greater than 0");
        }

        if !(0..=20).contains(&self.worker.wait_time_secs) {
            anyhow::bail!(
                "Worker wait time must be between 0 and 20 seconds, got {}",
                self.worker.wait_time_secs
            );
        }

        if self.reports.download_url_ttl_secs == 0 {
            anyhow::bail!("Download URL TTL must be greater than 0");
        }

        if self.reports.source_base_url.is_empty() {
            anyhow::bail!("Report source base URL cannot be empty");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            worker: WorkerConfig {
                concurrency: DEFAULT_WORKER_CONCURRENCY,
                job_timeout_secs: DEFAULT_WORKER_JOB_TIMEOUT_SECS,
                wait_time_secs: DEFAULT_WORKER_WAIT_TIME_SECS,
            },
            reports: ReportsConfig {
                download_url_ttl_secs: DEFAULT_DOWNLOAD_URL_TTL_SECS,
                source_base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
                source_timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
            },
        }
    }
}
