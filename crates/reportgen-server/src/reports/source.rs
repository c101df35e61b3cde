//! Compendium API client
//!
//! Fetches the monsters dataset a report is built from.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Monsters request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to decode monsters response: {0}")]
    Decode(String),
}

/// One entry of the monsters category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub image: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub common_locations: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub drops: Vec<String>,
    pub dlc: bool,
}

#[derive(Debug, Deserialize)]
struct MonstersResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    data: Vec<Monster>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Where report rows come from.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_monsters(&self) -> Result<Vec<Monster>, SourceError>;
}

#[derive(Clone)]
pub struct CompendiumClient {
    client: Client,
    base_url: String,
}

impl CompendiumClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("reportgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SourceError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DataSource for CompendiumClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_monsters(&self) -> Result<Vec<Monster>, SourceError> {
        let url = format!("{}/category/monsters", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("game", "totk")])
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        let parsed: MonstersResponse =
            serde_json::from_slice(&body).map_err(|e| SourceError::Decode(e.to_string()))?;

        debug!(count = parsed.data.len(), "Fetched monsters");

        Ok(parsed.data)
    }
}
