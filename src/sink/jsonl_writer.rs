//! JSONL writer - one line per completed cycle

use super::{ReportSink, SinkError};
use crate::analytics::{CycleReport, SwapRow};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct JsonlReportWriter {
    writer: BufWriter<std::fs::File>,
    path: PathBuf,
}

impl JsonlReportWriter {
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        log::info!("📝 Writing cycle reports to: {}", path.display());

        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_report(&mut self, report: &CycleReport) -> Result<(), SinkError> {
        let json = serde_json::to_string(report)?;
        writeln!(self.writer, "{}", json)?;
        // Cycles are seconds apart; flush each one so readers see it
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonlReportWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[async_trait]
impl ReportSink for JsonlReportWriter {
    async fn emit(&mut self, report: &CycleReport, _rows: &[SwapRow]) -> Result<(), SinkError> {
        self.write_report(report)
    }

    fn sink_type(&self) -> &'static str {
        "JSONL"
    }
}
