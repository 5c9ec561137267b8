//! Report sinks - where each cycle's results go
//!
//! The presentation layer is external; sinks only hand it numbers.

pub mod jsonl_writer;
pub mod log_sink;

pub use jsonl_writer::JsonlReportWriter;
pub use log_sink::LogReportSink;

use crate::analytics::{CycleReport, SwapRow};
use async_trait::async_trait;

#[derive(Debug)]
pub enum SinkError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Io(err)
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        SinkError::Serialization(err)
    }
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Io(e) => write!(f, "IO error: {}", e),
            SinkError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for SinkError {}

/// Receives the end-of-cycle report
#[async_trait]
pub trait ReportSink: Send {
    /// `rows` is the complete viable sequence; `report.new_rows` the part
    /// added this cycle
    async fn emit(&mut self, report: &CycleReport, rows: &[SwapRow]) -> Result<(), SinkError>;

    /// Sink type for logging
    fn sink_type(&self) -> &'static str;
}
