//! Log sink - numeric callouts in the application log

use super::{ReportSink, SinkError};
use crate::analytics::{CycleReport, SwapRow};
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct LogReportSink;

impl LogReportSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportSink for LogReportSink {
    async fn emit(&mut self, report: &CycleReport, rows: &[SwapRow]) -> Result<(), SinkError> {
        let s = &report.summary;
        log::info!(
            "📊 Cycle {}: {} swaps, {} valid, {} profitable (+{} new)",
            report.cycle,
            s.total_swaps,
            s.valid_swaps,
            s.viable_swaps,
            report.new_rows.len()
        );
        log::info!(
            "   ├─ Mean swap size: {:.3} | latency mean {:.2}s, median {:.2}s, latest {:.2}s",
            s.mean_swap_size,
            s.mean_latency,
            s.median_latency,
            s.latest_latency
        );
        if let Some(last) = rows.last() {
            log::info!(
                "   └─ Cumulative profit: {:.4} | cumulative cost: {:.4}",
                last.cumulative_profit,
                last.cumulative_cost
            );
        }
        for row in &report.new_rows {
            log::debug!(
                "   #{} {} {:.4} → profit {:.4} (latency {:.2}s)",
                row.swap_number,
                row.tx_hash,
                row.to_token_qty,
                row.profit,
                row.latency_secs
            );
        }
        Ok(())
    }

    fn sink_type(&self) -> &'static str {
        "log"
    }
}
