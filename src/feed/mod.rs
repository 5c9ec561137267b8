//! Upstream swap feed
//!
//! The feed returns its full history as a JSON array on every call. Rows are
//! handed over undecoded so that one malformed row only costs that row.

pub mod http;
pub mod simulated;

pub use http::HttpSwapFeed;
pub use simulated::SimulatedFeed;

use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug)]
pub enum FetchError {
    Transport(reqwest::Error),
    Status(reqwest::StatusCode),
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(e) => write!(f, "Transport error: {}", e),
            FetchError::Status(status) => write!(f, "Feed returned HTTP {}", status),
            FetchError::Decode(msg) => write!(f, "Feed body is not a JSON array: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Source of raw swap records
#[async_trait]
pub trait SwapFeed: Send {
    /// Fetch the full current list of raw records, oldest first
    async fn fetch_all(&mut self) -> Result<Vec<Value>, FetchError>;

    /// Feed description for logging
    fn source_name(&self) -> String;
}

/// Interpret a response body as the feed's JSON array
pub(crate) fn decode_rows(body: &[u8]) -> Result<Vec<Value>, FetchError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Array(rows) => Ok(rows),
        other => Err(FetchError::Decode(format!(
            "expected an array, got {}",
            match other {
                Value::Object(_) => "an object",
                Value::String(_) => "a string",
                Value::Number(_) => "a number",
                Value::Bool(_) => "a bool",
                _ => "null",
            }
        ))),
    }
}
