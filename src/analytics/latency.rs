//! Processing latency per swap and summary statistics

use super::normalizer::NormalizedSwap;
use super::round_dp;
use serde::Serialize;

/// Seconds between receipt and processing, rounded to 2 decimals
///
/// Negative values mean the feed reported processing before receipt. They
/// are surfaced unchanged as a data-quality signal.
pub fn latency_secs(swap: &NormalizedSwap) -> f64 {
    let millis = (swap.processed_at - swap.received_at).num_milliseconds();
    round_dp(millis as f64 / 1000.0, 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LatencyStats {
    pub mean: f64,
    pub median: f64,
    /// Latency of the highest swap number, not the wall-clock latest
    pub latest: f64,
}

/// Full recompute over latencies in swap-number order
pub fn latency_stats(latencies: &[f64]) -> LatencyStats {
    let Some(&latest) = latencies.last() else {
        return LatencyStats::default();
    };

    let sum = latencies.iter().fold(0.0_f64, |acc, l| acc + l);
    let mut sorted = latencies.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    LatencyStats {
        mean: round_dp(sum / latencies.len() as f64, 2),
        median: round_dp(median_of_sorted(&sorted), 2),
        latest,
    }
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Running latency statistics carried across poll cycles
///
/// Keeps a sorted copy of every latency for the median; insertion is a
/// binary search plus a shift.
#[derive(Debug, Clone, Default)]
pub struct LatencyTracker {
    sum: f64,
    sorted: Vec<f64>,
    latest: Option<f64>,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, latency: f64) {
        self.sum += latency;
        let idx = self.sorted.partition_point(|x| x.total_cmp(&latency).is_le());
        self.sorted.insert(idx, latency);
        self.latest = Some(latency);
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn stats(&self) -> LatencyStats {
        let Some(latest) = self.latest else {
            return LatencyStats::default();
        };

        LatencyStats {
            mean: round_dp(self.sum / self.sorted.len() as f64, 2),
            median: round_dp(median_of_sorted(&self.sorted), 2),
            latest,
        }
    }
}
