use serde::{Deserialize, Serialize};
use std::{env, fmt};

use crate::storage::config::REDACTED;

pub const DEFAULT_SQS_REGION: &str = "us-east-1";
pub const DEFAULT_SQS_QUEUE: &str = "reportgen-reports";

#[derive(Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub endpoint: Option<String>,
    pub region: String,
    /// Queue name, resolved to a URL at startup
    pub queue_name: String,
    pub access_key: String,
    #[serde(skip_serializing)]
    pub secret_key: String,
}

impl fmt::Debug for QueueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("queue_name", &self.queue_name)
            .field("access_key", &REDACTED)
            .field("secret_key", &REDACTED)
            .finish()
    }
}

impl QueueConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let queue_name = env::var("SQS_QUEUE").unwrap_or_else(|_| DEFAULT_SQS_QUEUE.to_string());
        if queue_name.trim().is_empty() {
            anyhow::bail!("SQS_QUEUE cannot be empty");
        }

        Ok(Self {
            endpoint: env::var("SQS_ENDPOINT").ok(),
            region: env::var("SQS_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or_else(|_| DEFAULT_SQS_REGION.to_string()),
            queue_name,
            access_key: env::var("AWS_ACCESS_KEY_ID").unwrap_or_else(|_| "test".to_string()),
            secret_key: env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_else(|_| "test".to_string()),
        })
    }

    pub fn for_localstack(endpoint: impl Into<String>, queue_name: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: DEFAULT_SQS_REGION.to_string(),
            queue_name: queue_name.into(),
            access_key: "test".to_string(),
            secret_key: "test".to_string(),
        }
    }
}
