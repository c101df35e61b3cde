//! Queue consumer
//!
//! One poller task long-polls the queue and pushes messages into a bounded
//! channel whose capacity equals the number of worker loops. A full channel
//! blocks the poller, which is the only backpressure there is.

use reportgen_common::{types::JobMessage, CommonError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::builder::{BuildError, ReportBuilder};
use crate::config::WorkerConfig;
use crate::queue::{MessageQueue, QueueMessage, MAX_RECEIVE_BATCH};

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to resolve queue URL: {0}")]
    QueueUrl(#[source] anyhow::Error),

    #[error("Worker cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to build report: {0}")]
    Build(#[from] BuildError),

    #[error("Report build timed out after {0:?}")]
    Timeout(Duration),

    #[error("Message has no receipt handle")]
    MissingReceipt,

    #[error("Failed to delete message: {0}")]
    Delete(#[source] anyhow::Error),
}

/// What happened to a message that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Built (or already started) and deleted from the queue
    Acknowledged,
    /// No body; left on the queue
    SkippedEmpty,
    /// Body did not decode; left on the queue
    SkippedMalformed,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    pub concurrency: usize,
    pub job_timeout: Duration,
    pub wait_time_secs: i32,
}

impl From<&WorkerConfig> for WorkerOptions {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            job_timeout: config.job_timeout(),
            wait_time_secs: config.wait_time_secs,
        }
    }
}

impl WorkerOptions {
    /// Messages requested per receive call.
    pub fn receive_batch(&self) -> i32 {
        let wanted = self.concurrency.saturating_add(1);
        wanted.min(MAX_RECEIVE_BATCH as usize) as i32
    }
}

/// Handles a single received message.
#[derive(Clone)]
pub struct MessageProcessor {
    builder: ReportBuilder,
    queue: Arc<dyn MessageQueue>,
    job_timeout: Duration,
}

impl MessageProcessor {
    pub fn new(builder: ReportBuilder, queue: Arc<dyn MessageQueue>, job_timeout: Duration) -> Self {
        Self {
            builder,
            queue,
            job_timeout,
        }
    }

    /// Build the referenced report and delete the message on success.
    ///
    /// Any error leaves the message on the queue for redelivery.
    pub async fn process(
        &self,
        queue_url: &str,
        message: &QueueMessage,
    ) -> Result<ProcessOutcome, ProcessError> {
        let job = match JobMessage::from_json(message.body.as_deref().unwrap_or_default()) {
            Ok(job) => job,
            Err(CommonError::EmptyMessage) => {
                warn!(message_id = message.log_id(), "Received empty message");
                return Ok(ProcessOutcome::SkippedEmpty);
            },
            Err(e) => {
                warn!(message_id = message.log_id(), error = %e, "Received malformed message");
                return Ok(ProcessOutcome::SkippedMalformed);
            },
        };

        tokio::time::timeout(self.job_timeout, self.builder.build(job.user_id, job.report_id))
            .await
            .map_err(|_| ProcessError::Timeout(self.job_timeout))??;

        let receipt = message
            .receipt_handle
            .as_deref()
            .ok_or(ProcessError::MissingReceipt)?;

        self.queue
            .delete(queue_url, receipt)
            .await
            .map_err(ProcessError::Delete)?;

        Ok(ProcessOutcome::Acknowledged)
    }
}

pub struct ReportWorker {
    queue: Arc<dyn MessageQueue>,
    processor: MessageProcessor,
    options: WorkerOptions,
}

impl ReportWorker {
    pub fn new(builder: ReportBuilder, queue: Arc<dyn MessageQueue>, options: WorkerOptions) -> Self {
        let processor = MessageProcessor::new(builder, queue.clone(), options.job_timeout);
        Self {
            queue,
            processor,
            options,
        }
    }

    pub fn processor(&self) -> &MessageProcessor {
        &self.processor
    }

    /// Consume the queue until `shutdown` fires or the queue cannot be resolved.
    ///
    /// Always returns an error: [`WorkerError::Cancelled`] on shutdown. Jobs
    /// already running when shutdown fires keep running in the background.
    pub async fn start(&self, shutdown: CancellationToken) -> Result<(), WorkerError> {
        let queue_url = self.queue.resolve_url().await.map_err(WorkerError::QueueUrl)?;
        let concurrency = self.options.concurrency.max(1);

        info!(%queue_url, concurrency, "Starting report worker");

        let (tx, rx) = mpsc::channel::<QueueMessage>(concurrency);
        let rx = Arc::new(Mutex::new(rx));

        for index in 0..concurrency {
            tokio::spawn(worker_loop(
                index,
                rx.clone(),
                self.processor.clone(),
                queue_url.clone(),
                shutdown.clone(),
            ));
        }

        self.poll(&queue_url, tx, &shutdown).await
    }

    async fn poll(
        &self,
        queue_url: &str,
        tx: mpsc::Sender<QueueMessage>,
        shutdown: &CancellationToken,
    ) -> Result<(), WorkerError> {
        let batch = self.options.receive_batch();

        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => return Err(WorkerError::Cancelled),
                received = self.queue.receive(queue_url, batch, self.options.wait_time_secs) => received,
            };

            let messages = match received {
                Ok(messages) => messages,
                Err(e) => {
                    error!(error = %e, "Failed to receive messages");
                    if shutdown.is_cancelled() {
                        return Err(WorkerError::Cancelled);
                    }
                    // TODO: back off on repeated receive failures instead of spinning
                    tokio::task::yield_now().await;
                    continue;
                },
            };

            debug!(count = messages.len(), "Received messages");

            for message in messages {
                tokio::select! {
                    _ = shutdown.cancelled() => return Err(WorkerError::Cancelled),
                    sent = tx.send(message) => {
                        if sent.is_err() {
                            return Err(WorkerError::Cancelled);
                        }
                    },
                }
            }
        }
    }
}

async fn worker_loop(
    index: usize,
    rx: Arc<Mutex<mpsc::Receiver<QueueMessage>>>,
    processor: MessageProcessor,
    queue_url: String,
    shutdown: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = async { rx.lock().await.recv().await } => next,
        };

        let Some(message) = next else {
            break;
        };

        match processor.process(&queue_url, &message).await {
            Ok(outcome) => {
                debug!(worker = index, message_id = message.log_id(), ?outcome, "Message processed");
            },
            Err(e) => {
                error!(worker = index, message_id = message.log_id(), error = %e, "Failed to process message");
            },
        }
    }

    debug!(worker = index, "Worker loop stopped");
}
