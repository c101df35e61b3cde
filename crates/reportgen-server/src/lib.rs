//! Report generation service
//!
//! Callers submit report requests over HTTP; a separate worker process
//! consumes the job queue and builds each report.
//!
//! # Overview
//!
//! - **API** (`api`, `features`): `POST /api/v1/reports` creates a pending
//!   report and enqueues a job; `GET /api/v1/reports/:report_id` returns it,
//!   minting a presigned download URL once the report is completed.
//! - **Worker** (`reports::worker`): long-polls SQS and runs a bounded
//!   number of builds at once.
//! - **Builder** (`reports::builder`): fetches the monsters dataset, writes a
//!   gzip CSV, uploads it to S3 and records the outcome on the report row.
//!
//! # Services
//!
//! Every external dependency sits behind a trait so tests can swap in
//! in-memory implementations:
//!
//! | Trait | Production |
//! |---|---|
//! | [`db::ReportStore`] | [`db::PgReportStore`] |
//! | [`storage::ObjectStore`] | [`storage::Storage`] |
//! | [`queue::MessageQueue`] | [`queue::SqsQueue`] |
//! | [`reports::DataSource`] | [`reports::CompendiumClient`] |
//!
//! # Example
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//! use reportgen_server::{
//!     db::{create_pool, DbConfig, PgReportStore},
//!     reports::{CompendiumClient, ReportBuilder},
//!     storage::{config::StorageConfig, Storage},
//! };
//!
//! # async fn run(config: DbConfig) -> anyhow::Result<()> {
//! let reports = Arc::new(PgReportStore::new(create_pool(&config).await?));
//! let objects = Arc::new(Storage::new(StorageConfig::from_env()?)?);
//! let source = Arc::new(CompendiumClient::new(
//!     "https://botw-compendium.herokuapp.com/api/v3/compendium",
//!     Duration::from_secs(10),
//! )?);
//!
//! let builder = ReportBuilder::new(reports, source, objects);
//! let report = builder.build(uuid::Uuid::new_v4(), uuid::Uuid::new_v4()).await?;
//! println!("{}", report.status());
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;
pub mod queue;
pub mod reports;
pub mod shutdown;
pub mod storage;

pub use error::{ApiResult, AppError};
