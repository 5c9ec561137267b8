//! Stage wiring: full recompute and incremental folding
//!
//! The upstream feed replays its whole history on every call, so a cycle
//! only needs to look at records past the ones already consumed.
//! [`IncrementalPipeline`] carries prefix sums and latency statistics
//! between cycles; [`compute_report`] is the from-scratch reference it must
//! agree with bit for bit.

use super::aggregator::{aggregate, ProfitAccumulator, ProfitRecord};
use super::invariant::{InvariantFilter, ViableSwap};
use super::latency::{latency_secs, latency_stats, LatencyTracker};
use super::normalizer::{FieldScales, NormalizedBatch, NormalizedSwap, Normalizer};
use super::profit::{FeeSchedule, ProfitEstimate, ProfitMode, ProfitModel};
use super::report::{CycleSummary, SwapRow};
use serde_json::Value;

/// Tunables for every analytics stage
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    pub target_symbol: String,
    pub scales: FieldScales,
    pub invariant_tolerance: f64,
    pub fees: FeeSchedule,
    pub profit_mode: ProfitMode,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            target_symbol: "WETH".to_string(),
            scales: FieldScales::default(),
            invariant_tolerance: 0.005,
            fees: FeeSchedule::default(),
            profit_mode: ProfitMode::TrueLoss,
        }
    }
}

impl AnalyticsConfig {
    fn stages(&self) -> (Normalizer, InvariantFilter, ProfitModel) {
        (
            Normalizer::new(self.target_symbol.clone(), self.scales),
            InvariantFilter::new(self.invariant_tolerance),
            ProfitModel::new(self.fees, self.profit_mode),
        )
    }
}

fn swap_row(viable: &ViableSwap, record: &ProfitRecord, latency: f64) -> SwapRow {
    let swap = &viable.swap;
    SwapRow {
        swap_number: viable.swap_number,
        tx_hash: swap.tx_hash.clone(),
        from_token_symbol: swap.from_token_symbol.clone(),
        from_token_qty: swap.from_token_qty,
        to_token_qty: swap.to_token_qty,
        revenue: record.revenue,
        cost: record.cost,
        profit: record.profit,
        cumulative_profit: record.cumulative_profit,
        cumulative_cost: record.cumulative_cost,
        latency_secs: latency,
        received_at: swap.received_at,
        processed_at: swap.processed_at,
    }
}

/// Recompute summary and rows from a frozen snapshot of the feed
pub fn compute_report(config: &AnalyticsConfig, records: &[Value]) -> (CycleSummary, Vec<SwapRow>) {
    let (normalizer, filter, model) = config.stages();

    let batch = normalizer.normalize_batch(records);
    let total_swaps = batch.swaps.len();
    let viable = filter.filter(batch.swaps);
    let profits = aggregate(&viable, &model);
    let latencies: Vec<f64> = viable.iter().map(|v| latency_secs(&v.swap)).collect();
    let stats = latency_stats(&latencies);

    let rows = viable
        .iter()
        .zip(profits.records.iter())
        .zip(latencies.iter())
        .map(|((v, record), latency)| swap_row(v, record, *latency))
        .collect();

    let summary = CycleSummary {
        total_swaps,
        valid_swaps: viable.len(),
        viable_swaps: profits.viable_swaps,
        mean_swap_size: profits.mean_swap_size,
        mean_latency: stats.mean,
        median_latency: stats.median,
        latest_latency: stats.latest,
    };

    (summary, rows)
}

/// Counters for one incremental fold
#[derive(Debug, Clone, Default)]
pub struct FoldOutcome {
    pub new_records: usize,
    pub normalized: usize,
    pub rejected: usize,
    pub off_target: usize,
    pub new_rows: Vec<SwapRow>,
}

/// Analytics state carried across poll cycles
pub struct IncrementalPipeline {
    normalizer: Normalizer,
    filter: InvariantFilter,
    model: ProfitModel,
    records_seen: usize,
    total_swaps: usize,
    profits: ProfitAccumulator,
    latencies: LatencyTracker,
    rows: Vec<SwapRow>,
}

impl IncrementalPipeline {
    pub fn new(config: &AnalyticsConfig) -> Self {
        let (normalizer, filter, model) = config.stages();
        Self {
            normalizer,
            filter,
            model,
            records_seen: 0,
            total_swaps: 0,
            profits: ProfitAccumulator::new(),
            latencies: LatencyTracker::new(),
            rows: Vec::new(),
        }
    }

    /// Raw feed records consumed so far
    pub fn records_seen(&self) -> usize {
        self.records_seen
    }

    /// Records not yet consumed, or `None` if the feed is shorter than
    /// what was already consumed (upstream history was reset)
    pub fn unseen<'a>(&self, records: &'a [Value]) -> Option<&'a [Value]> {
        records.get(self.records_seen..)
    }

    /// Drop all carried state
    pub fn reset(&mut self) {
        self.records_seen = 0;
        self.total_swaps = 0;
        self.profits = ProfitAccumulator::new();
        self.latencies = LatencyTracker::new();
        self.rows.clear();
    }

    pub fn normalize(&self, records: &[Value]) -> NormalizedBatch {
        self.normalizer.normalize_batch(records)
    }

    /// Invariant filter, continuing swap numbers after the rows already held
    pub fn filter(&self, swaps: Vec<NormalizedSwap>) -> Vec<ViableSwap> {
        self.filter.filter_from(swaps, self.rows.len() + 1)
    }

    pub fn score(&self, viable: Vec<ViableSwap>) -> Vec<(ViableSwap, ProfitEstimate)> {
        viable
            .into_iter()
            .map(|v| {
                let estimate = self.model.estimate(&v.swap);
                (v, estimate)
            })
            .collect()
    }

    /// Fold scored swaps into the running sums and latency statistics
    ///
    /// `records` and `normalized` are the raw and target-symbol counts of
    /// the batch the scored swaps came from.
    pub fn fold(
        &mut self,
        records: usize,
        normalized: usize,
        scored: Vec<(ViableSwap, ProfitEstimate)>,
    ) -> Vec<SwapRow> {
        self.records_seen += records;
        self.total_swaps += normalized;

        let mut new_rows = Vec::with_capacity(scored.len());
        for (viable, estimate) in scored {
            let record = self.profits.push(viable.swap.to_token_qty, estimate);
            let latency = latency_secs(&viable.swap);
            self.latencies.push(latency);
            new_rows.push(swap_row(&viable, &record, latency));
        }

        self.rows.extend(new_rows.iter().cloned());
        new_rows
    }

    /// Run every stage over a batch of not-yet-seen records
    pub fn ingest(&mut self, records: &[Value]) -> FoldOutcome {
        let batch = self.normalize(records);
        let normalized = batch.swaps.len();
        let scored = self.score(self.filter(batch.swaps));
        let new_rows = self.fold(records.len(), normalized, scored);

        FoldOutcome {
            new_records: records.len(),
            normalized,
            rejected: batch.rejected,
            off_target: batch.off_target,
            new_rows,
        }
    }

    pub fn summary(&self) -> CycleSummary {
        let stats = self.latencies.stats();
        CycleSummary {
            total_swaps: self.total_swaps,
            valid_swaps: self.profits.len(),
            viable_swaps: self.profits.viable_swaps(),
            mean_swap_size: self.profits.mean_swap_size(),
            mean_latency: stats.mean,
            median_latency: stats.median,
            latest_latency: stats.latest,
        }
    }

    /// Every viable swap row in swap-number order
    pub fn rows(&self) -> &[SwapRow] {
        &self.rows
    }
}
