//! In-memory implementations of the pipeline's external services

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use reportgen_server::{
    db::{DbError, DbResult, ReportStore},
    models::Report,
    queue::{MessageQueue, QueueMessage},
    reports::{DataSource, Monster, SourceError},
    storage::{calculate_sha256, ObjectStore, PresignedUrl, UploadResult},
};

// ============================================================================
// Reports
// ============================================================================

#[derive(Default)]
pub struct InMemoryReportStore {
    reports: Mutex<HashMap<Uuid, Report>>,
    update_calls: AtomicUsize,
    failing_updates: Mutex<HashSet<usize>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, report: Report) {
        self.reports.lock().await.insert(report.id, report);
    }

    pub async fn get(&self, report_id: Uuid) -> Option<Report> {
        self.reports.lock().await.get(&report_id).cloned()
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Make the `n`th call to `update` (1-based) fail.
    pub async fn fail_update_call(&self, n: usize) {
        self.failing_updates.lock().await.insert(n);
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn create(&self, user_id: Uuid, report_type: &str) -> DbResult<Report> {
        let report = Report::new(user_id, report_type);
        self.insert(report.clone()).await;
        Ok(report)
    }

    async fn update(&self, report: &Report) -> DbResult<Report> {
        let call = self.update_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_updates.lock().await.contains(&call) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }

        let mut reports = self.reports.lock().await;
        match reports.get_mut(&report.id) {
            Some(existing) if existing.user_id == report.user_id => {
                *existing = Report {
                    report_type: existing.report_type.clone(),
                    created_at: existing.created_at,
                    ..report.clone()
                };
                Ok(existing.clone())
            },
            _ => Err(DbError::not_found("Report", &report.id.to_string())),
        }
    }

    async fn by_primary_key(&self, report_id: Uuid, user_id: Uuid) -> DbResult<Report> {
        self.reports
            .lock()
            .await
            .get(&report_id)
            .filter(|r| r.user_id == user_id)
            .cloned()
            .ok_or_else(|| DbError::not_found("Report", &report_id.to_string()))
    }

    async fn health_check(&self) -> DbResult<()> {
        Ok(())
    }
}

// ============================================================================
// Objects
// ============================================================================

#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    presign_calls: AtomicUsize,
    fail_puts: AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }

    pub fn presign_calls(&self) -> usize {
        self.presign_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<UploadResult> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(anyhow!("object store unavailable"));
        }

        let result = UploadResult {
            key: key.to_string(),
            checksum: calculate_sha256(&data),
            size: data.len() as i64,
        };
        self.objects.lock().await.insert(key.to_string(), data);
        Ok(result)
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<PresignedUrl> {
        self.presign_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PresignedUrl {
            url: format!("memory://{}?signature={}", key, Uuid::new_v4()),
            expires_at: Utc::now() + chrono::Duration::from_std(expires_in)?,
        })
    }
}

// ============================================================================
// Queue
// ============================================================================

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueueMessage>,
    in_flight: HashMap<String, QueueMessage>,
    deleted: Vec<String>,
}

/// Single-queue broker with receipt handles and manual redelivery.
pub struct InMemoryQueue {
    url: String,
    state: Mutex<QueueState>,
    arrived: Notify,
    resolvable: bool,
    failing_receives: AtomicUsize,
    receive_calls: AtomicUsize,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            url: "memory://queue/reports".to_string(),
            state: Mutex::new(QueueState::default()),
            arrived: Notify::new(),
            resolvable: true,
            failing_receives: AtomicUsize::new(0),
            receive_calls: AtomicUsize::new(0),
        }
    }

    /// A queue whose address lookup always fails.
    pub fn unresolvable() -> Self {
        Self {
            resolvable: false,
            ..Self::new()
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Enqueue a raw body and return its message id.
    pub async fn push(&self, body: Option<&str>) -> String {
        let message_id = Uuid::new_v4().to_string();
        self.state.lock().await.pending.push_back(QueueMessage {
            message_id: Some(message_id.clone()),
            receipt_handle: None,
            body: body.map(str::to_string),
        });
        self.arrived.notify_one();
        message_id
    }

    /// Make the next `n` receive calls fail.
    pub fn fail_next_receives(&self, n: usize) {
        self.failing_receives.store(n, Ordering::SeqCst);
    }

    pub fn receive_calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    /// Return every received-but-undeleted message to the queue, as an
    /// expired visibility timeout would.
    pub async fn release_unacknowledged(&self) -> usize {
        let mut state = self.state.lock().await;
        let released: Vec<_> = state.in_flight.drain().map(|(_, m)| m).collect();
        let count = released.len();
        for mut message in released {
            message.receipt_handle = None;
            state.pending.push_back(message);
        }
        drop(state);
        if count > 0 {
            self.arrived.notify_one();
        }
        count
    }

    pub async fn deleted(&self) -> Vec<String> {
        self.state.lock().await.deleted.clone()
    }

    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn in_flight_len(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    /// Bodies of every message sent or pushed that is still waiting.
    pub async fn pending_bodies(&self) -> Vec<Option<String>> {
        self.state
            .lock()
            .await
            .pending
            .iter()
            .map(|m| m.body.clone())
            .collect()
    }

    async fn take(&self, max_messages: usize) -> Vec<QueueMessage> {
        let mut state = self.state.lock().await;
        let count = max_messages.min(state.pending.len());
        let drained: Vec<_> = state.pending.drain(..count).collect();
        let mut taken = Vec::with_capacity(count);
        for mut message in drained {
            let receipt = Uuid::new_v4().to_string();
            message.receipt_handle = Some(receipt.clone());
            state.in_flight.insert(receipt, message.clone());
            taken.push(message);
        }
        if !state.pending.is_empty() {
            self.arrived.notify_one();
        }
        taken
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn resolve_url(&self) -> Result<String> {
        if self.resolvable {
            Ok(self.url.clone())
        } else {
            Err(anyhow!("queue does not exist"))
        }
    }

    async fn receive(
        &self,
        _queue_url: &str,
        max_messages: i32,
        wait_time_secs: i32,
    ) -> Result<Vec<QueueMessage>> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self.failing_receives.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_receives.store(failing - 1, Ordering::SeqCst);
            return Err(anyhow!("receive failed"));
        }

        let max_messages = max_messages.max(1) as usize;
        let taken = self.take(max_messages).await;
        if !taken.is_empty() {
            return Ok(taken);
        }

        let wait = Duration::from_secs(wait_time_secs.max(0) as u64);
        if tokio::time::timeout(wait, self.arrived.notified()).await.is_err() {
            return Ok(Vec::new());
        }
        Ok(self.take(max_messages).await)
    }

    async fn delete(&self, _queue_url: &str, receipt_handle: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let message = state
            .in_flight
            .remove(receipt_handle)
            .ok_or_else(|| anyhow!("unknown receipt handle {}", receipt_handle))?;
        if let Some(id) = message.message_id {
            state.deleted.push(id);
        }
        Ok(())
    }

    async fn send(&self, _queue_url: &str, body: String) -> Result<String> {
        Ok(self.push(Some(&body)).await)
    }
}

// ============================================================================
// Data source
// ============================================================================

/// Returns a fixed dataset, optionally slowly, and records how it was called.
#[derive(Default)]
pub struct StaticDataSource {
    monsters: Vec<Monster>,
    delay: Option<Duration>,
    failing: bool,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

struct ActiveCall<'a>(&'a AtomicUsize);

impl Drop for ActiveCall<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StaticDataSource {
    pub fn new(monsters: Vec<Monster>) -> Self {
        Self {
            monsters,
            ..Self::default()
        }
    }

    /// A source whose every fetch fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at once.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for StaticDataSource {
    async fn fetch_monsters(&self) -> Result<Vec<Monster>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveCall(&self.active);
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing {
            return Err(SourceError::Decode("source unavailable".to_string()));
        }

        Ok(self.monsters.clone())
    }
}

/// `count` distinct monsters with varied list columns.
pub fn sample_monsters(count: usize) -> Vec<Monster> {
    (0..count)
        .map(|i| Monster {
            id: 100 + i as i64,
            name: format!("monster-{}", i),
            category: "monsters".to_string(),
            description: format!("Monster number {}", i),
            image: format!("https://example.com/monsters/{}.png", i),
            common_locations: (0..i % 3).map(|n| format!("Region {}", n)).collect(),
            drops: if i % 2 == 0 {
                vec!["horn".to_string(), "fang".to_string()]
            } else {
                Vec::new()
            },
            dlc: i % 2 == 1,
        })
        .collect()
}
