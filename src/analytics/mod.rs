//! Analytics Core - JIT liquidity candidate pipeline
//!
//! Turns the raw swap feed into pool-consistent swaps, their estimated
//! profit/cost and their processing latency.
//!
//! # Architecture
//!
//! ```text
//! Raw feed rows (serde_json::Value)
//!     ↓
//! Normalizer (unit rescale, timestamp parse, target-symbol filter)
//!     ↓
//! InvariantFilter (constant-product deviation ≤ tolerance)
//!     ↓                              ↘
//! ProfitModel (revenue/cost tiers)    LatencyTracker (mean/median/latest)
//!     ↓
//! ProfitAccumulator (prefix sums, viable count, mean swap size)
//!     ↓
//! CycleSummary + SwapRow
//! ```
//!
//! Two entry points share the same stages:
//! - [`compute_report`] recomputes everything from a frozen snapshot
//! - [`IncrementalPipeline`] folds only newly observed rows each cycle

pub mod aggregator;
pub mod invariant;
pub mod latency;
pub mod normalizer;
pub mod pipeline;
pub mod profit;
pub mod report;

pub use aggregator::{aggregate, ProfitAccumulator, ProfitAggregate, ProfitRecord};
pub use invariant::{InvariantCheck, InvariantFilter, ViableSwap};
pub use latency::{latency_secs, latency_stats, LatencyStats, LatencyTracker};
pub use normalizer::{
    FieldScales, NormalizedBatch, NormalizedSwap, Normalizer, RawNumber, RawSwapRecord, RowError,
    WEI_SCALE,
};
pub use pipeline::{compute_report, AnalyticsConfig, FoldOutcome, IncrementalPipeline};
pub use profit::{FeeSchedule, ProfitEstimate, ProfitMode, ProfitModel};
pub use report::{CycleReport, CycleSummary, SnapshotReport, SwapRow};

/// Round to a fixed number of decimal places for display values
pub(crate) fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
