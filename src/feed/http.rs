//! HTTP feed client
//!
//! Endpoint: GET {url}
//! Returns: JSON array of every swap record observed so far

use super::{decode_rows, FetchError, SwapFeed};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub struct HttpSwapFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpSwapFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SwapFeed for HttpSwapFeed {
    async fn fetch_all(&mut self) -> Result<Vec<Value>, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.bytes().await?;
        decode_rows(&body)
    }

    fn source_name(&self) -> String {
        format!("HTTP {}", self.url)
    }
}
