//! Read-only CLOB client for order-book snapshots.
//!
//! One request per call with a bounded timeout; failures go back to the
//! caller, nothing is retried here.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::book::{NormalizedBook, RawOrderBook};
use crate::config::ExchangeConfig;
use crate::error::{EngineError, Result};

pub struct ClobClient {
    client: Client,
    clob_url: String,
}

impl ClobClient {
    pub fn new(clob_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            clob_url: clob_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ExchangeConfig) -> Result<Self> {
        Self::new(config.clob_url.clone(), config.request_timeout())
    }

    /// Fetch order book for a token
    pub async fn get_order_book(&self, token_id: &str) -> Result<RawOrderBook> {
        let url = format!("{}/book?token_id={}", self.clob_url, token_id);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!("Order book request failed: {} - {}", status, text);
            return Err(EngineError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch and normalize in one step
    pub async fn get_normalized_book(&self, token_id: &str) -> Result<NormalizedBook> {
        let raw = self.get_order_book(token_id).await?;
        Ok(NormalizedBook::from_raw(&raw))
    }
}
