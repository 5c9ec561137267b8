//! Cumulative profit/cost aggregation over the viable swap sequence

use super::invariant::ViableSwap;
use super::profit::{ProfitEstimate, ProfitModel};
use super::round_dp;
use serde::Serialize;

/// Profit figures for one viable swap, with running sums up to and including it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfitRecord {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub cumulative_profit: f64,
    pub cumulative_cost: f64,
}

/// Running aggregation state carried across poll cycles
///
/// Folding swaps one at a time in feed order yields exactly the values a
/// full recompute over the same sequence produces.
#[derive(Debug, Clone, Default)]
pub struct ProfitAccumulator {
    cumulative_profit: f64,
    cumulative_cost: f64,
    swap_size_sum: f64,
    count: usize,
    profitable: usize,
}

impl ProfitAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, to_token_qty: f64, estimate: ProfitEstimate) -> ProfitRecord {
        self.cumulative_profit += estimate.profit;
        self.cumulative_cost += estimate.cost;
        self.swap_size_sum += to_token_qty;
        self.count += 1;
        if estimate.profit > 0.0 {
            self.profitable += 1;
        }

        ProfitRecord {
            revenue: estimate.revenue,
            cost: estimate.cost,
            profit: estimate.profit,
            cumulative_profit: self.cumulative_profit,
            cumulative_cost: self.cumulative_cost,
        }
    }

    /// Number of swaps folded so far
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Swaps with strictly positive profit
    pub fn viable_swaps(&self) -> usize {
        self.profitable
    }

    pub fn cumulative_profit(&self) -> f64 {
        self.cumulative_profit
    }

    pub fn cumulative_cost(&self) -> f64 {
        self.cumulative_cost
    }

    /// Mean output size, rounded to 3 decimals; 0 when empty
    pub fn mean_swap_size(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        round_dp(self.swap_size_sum / self.count as f64, 3)
    }
}

/// Full-recompute aggregation result
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitAggregate {
    pub records: Vec<ProfitRecord>,
    pub viable_swaps: usize,
    pub mean_swap_size: f64,
}

/// Score and aggregate a complete viable sequence from scratch
pub fn aggregate(swaps: &[ViableSwap], model: &ProfitModel) -> ProfitAggregate {
    let estimates: Vec<ProfitEstimate> = swaps.iter().map(|v| model.estimate(&v.swap)).collect();

    let records: Vec<ProfitRecord> = estimates
        .iter()
        .scan((0.0_f64, 0.0_f64), |(profit_sum, cost_sum), e| {
            *profit_sum += e.profit;
            *cost_sum += e.cost;
            Some(ProfitRecord {
                revenue: e.revenue,
                cost: e.cost,
                profit: e.profit,
                cumulative_profit: *profit_sum,
                cumulative_cost: *cost_sum,
            })
        })
        .collect();

    let viable_swaps = estimates.iter().filter(|e| e.profit > 0.0).count();

    let mean_swap_size = if swaps.is_empty() {
        0.0
    } else {
        let size_sum = swaps.iter().fold(0.0_f64, |acc, v| acc + v.swap.to_token_qty);
        round_dp(size_sum / swaps.len() as f64, 3)
    };

    ProfitAggregate {
        records,
        viable_swaps,
        mean_swap_size,
    }
}
