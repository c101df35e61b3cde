//! Message queue gateway
//!
//! The worker and the API talk to the queue through [`MessageQueue`]. The
//! production implementation is [`SqsQueue`]; `crate::testing` has an
//! in-memory one.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_sqs::{
    config::{Credentials, Region},
    Client,
};
use tracing::{debug, info, instrument};

pub mod config;

/// Most messages a single SQS receive call may return.
pub const MAX_RECEIVE_BATCH: i32 = 10;

/// A received message. Fields the broker may omit are optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
}

impl QueueMessage {
    /// Identifier used in logs.
    pub fn log_id(&self) -> &str {
        self.message_id.as_deref().unwrap_or("<unknown>")
    }
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Resolve the address later calls use.
    async fn resolve_url(&self) -> Result<String>;

    /// Long-poll for up to `max_messages` messages.
    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_secs: i32,
    ) -> Result<Vec<QueueMessage>>;

    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<()>;

    /// Enqueue a body, returning the broker's message id.
    async fn send(&self, queue_url: &str, body: String) -> Result<String>;
}

#[derive(Clone)]
pub struct SqsQueue {
    client: Client,
    queue_name: String,
}

impl SqsQueue {
    pub fn new(config: config::QueueConfig) -> Self {
        debug!("Initializing queue with config: {:?}", config);

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "reportgen-queue",
        );

        let mut sqs_config_builder = aws_sdk_sqs::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            sqs_config_builder = sqs_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(sqs_config_builder.build());

        info!("Queue client initialized for queue: {}", config.queue_name);

        Self {
            client,
            queue_name: config.queue_name,
        }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    #[instrument(skip(self), fields(queue = %self.queue_name))]
    async fn resolve_url(&self) -> Result<String> {
        let output = self
            .client
            .get_queue_url()
            .queue_name(&self.queue_name)
            .send()
            .await
            .context(format!("Failed to resolve queue URL for {}", self.queue_name))?;

        let url = output
            .queue_url()
            .map(str::to_string)
            .context("Queue URL missing from response")?;

        debug!(%url, "Resolved queue URL");

        Ok(url)
    }

    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_secs: i32,
    ) -> Result<Vec<QueueMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_messages.clamp(1, MAX_RECEIVE_BATCH))
            .wait_time_seconds(wait_time_secs)
            .send()
            .await
            .context("Failed to receive messages")?;

        Ok(output
            .messages()
            .iter()
            .map(|m| QueueMessage {
                message_id: m.message_id().map(str::to_string),
                receipt_handle: m.receipt_handle().map(str::to_string),
                body: m.body().map(str::to_string),
            })
            .collect())
    }

    #[instrument(skip(self, receipt_handle))]
    async fn delete(&self, queue_url: &str, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .context("Failed to delete message")?;

        Ok(())
    }

    #[instrument(skip(self, body))]
    async fn send(&self, queue_url: &str, body: String) -> Result<String> {
        let output = self
            .client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
            .context("Failed to send message")?;

        Ok(output.message_id().unwrap_or_default().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_id_fallback() {
        let message = QueueMessage {
            message_id: None,
            receipt_handle: None,
            body: None,
        };
        assert_eq!(message.log_id(), "<unknown>");

        let message = QueueMessage {
            message_id: Some("m-1".into()),
            ..message
        };
        assert_eq!(message.log_id(), "m-1");
    }
}
