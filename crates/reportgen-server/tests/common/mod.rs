//! Shared fixtures for the reportgen integration tests
//!
//! Wires the in-memory services from [`fakes`] into a
//! builder, worker or router.

#![allow(dead_code)]

pub mod fakes;

use flate2::read::GzDecoder;
use reportgen_server::{
    db::ReportStore,
    features::{FeatureState, ReportsState},
    models::Report,
    reports::{DownloadLinkResolver, ReportBuilder, ReportWorker, WorkerOptions},
};
use fakes::{InMemoryObjectStore, InMemoryQueue, InMemoryReportStore, StaticDataSource};
use std::future::Future;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct Harness {
    pub reports: Arc<InMemoryReportStore>,
    pub objects: Arc<InMemoryObjectStore>,
    pub source: Arc<StaticDataSource>,
    pub queue: Arc<InMemoryQueue>,
}

impl Harness {
    pub fn new(source: StaticDataSource) -> Self {
        Self::with_queue(source, InMemoryQueue::new())
    }

    pub fn with_queue(source: StaticDataSource, queue: InMemoryQueue) -> Self {
        Self {
            reports: Arc::new(InMemoryReportStore::new()),
            objects: Arc::new(InMemoryObjectStore::new()),
            source: Arc::new(source),
            queue: Arc::new(queue),
        }
    }

    pub fn builder(&self) -> ReportBuilder {
        ReportBuilder::new(self.reports.clone(), self.source.clone(), self.objects.clone())
    }

    pub fn worker(&self, concurrency: usize, job_timeout: Duration) -> ReportWorker {
        ReportWorker::new(
            self.builder(),
            self.queue.clone(),
            WorkerOptions {
                concurrency,
                job_timeout,
                wait_time_secs: 1,
            },
        )
    }

    pub fn links(&self, ttl: Duration) -> DownloadLinkResolver {
        DownloadLinkResolver::new(self.reports.clone(), self.objects.clone(), ttl)
    }

    pub fn feature_state(&self, ttl: Duration) -> FeatureState {
        FeatureState {
            reports: ReportsState {
                reports: self.reports.clone(),
                queue: self.queue.clone(),
                links: self.links(ttl),
            },
        }
    }

    /// A pending monsters report for a fresh owner.
    pub async fn pending_report(&self) -> Report {
        self.reports
            .create(Uuid::new_v4(), "monsters")
            .await
            .expect("create report")
    }

    /// Enqueue a well-formed job message for `report`.
    pub async fn enqueue(&self, report: &Report) -> String {
        let body = reportgen_common::types::JobMessage::new(report.user_id, report.id)
            .to_json()
            .expect("encode job message");
        self.queue.push(Some(&body)).await
    }
}

/// Gunzip and parse an artifact into raw records, header included.
pub fn decode_artifact(bytes: &[u8]) -> Vec<Vec<String>> {
    let mut text = String::new();
    GzDecoder::new(bytes)
        .read_to_string(&mut text)
        .expect("valid gzip");

    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(text.as_bytes())
        .records()
        .map(|r| r.expect("valid csv").iter().map(str::to_string).collect())
        .collect()
}

/// Poll `check` every 10ms until it is true or `timeout` elapses.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
