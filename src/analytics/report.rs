//! Outbound report types: per-swap rows and the cycle summary

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Scalar callouts for one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CycleSummary {
    /// Target-symbol swaps seen, before the invariant filter
    pub total_swaps: usize,
    /// Swaps passing the invariant filter
    pub valid_swaps: usize,
    /// Valid swaps with positive estimated profit
    pub viable_swaps: usize,
    pub mean_swap_size: f64,
    pub mean_latency: f64,
    pub median_latency: f64,
    pub latest_latency: f64,
}

/// Viable swap joined with its profit and latency figures, for charting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapRow {
    pub swap_number: usize,
    pub tx_hash: String,
    pub from_token_symbol: String,
    pub from_token_qty: f64,
    pub to_token_qty: f64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub cumulative_profit: f64,
    pub cumulative_cost: f64,
    pub latency_secs: f64,
    pub received_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}

/// Full recompute over one fetched snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotReport {
    /// Raw records in the snapshot
    pub records: usize,
    pub summary: CycleSummary,
    pub rows: Vec<SwapRow>,
}

/// Everything emitted at the end of a cycle
///
/// Carries only the rows appended this cycle; sinks receive the full
/// sequence alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub completed_at: DateTime<Utc>,
    /// Raw records consumed from the feed so far
    pub records_seen: usize,
    /// True when the feed shrank and state was rebuilt this cycle
    pub rebuilt: bool,
    pub summary: CycleSummary,
    /// Rows appended this cycle (all rows when `rebuilt`)
    pub new_rows: Vec<SwapRow>,
}
