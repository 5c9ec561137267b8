//! Revenue/cost model for JIT liquidity candidates

use super::normalizer::NormalizedSwap;
use serde::Serialize;

/// Fee and cost assumptions, all in target-token units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeSchedule {
    /// Share of the swap output captured as LP fee revenue
    pub fee_rate: f64,
    /// Swaps strictly above this output size use the high cost tier
    pub tier_threshold: f64,
    /// Assumed second-leg execution cost for large swaps
    pub cost_high: f64,
    /// Assumed second-leg execution cost for small swaps
    pub cost_low: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            fee_rate: 0.003,
            tier_threshold: 0.95,
            cost_high: 1.045,
            cost_low: 0.078,
        }
    }
}

/// How negative profit is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfitMode {
    /// Report true profit/loss
    TrueLoss,
    /// Legacy dashboards clamped losses to zero
    ClampedLegacy,
}

impl ProfitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfitMode::TrueLoss => "loss",
            ProfitMode::ClampedLegacy => "clamped",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "loss" => Some(ProfitMode::TrueLoss),
            "clamped" => Some(ProfitMode::ClampedLegacy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfitEstimate {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
}

pub struct ProfitModel {
    schedule: FeeSchedule,
    mode: ProfitMode,
}

impl ProfitModel {
    pub fn new(schedule: FeeSchedule, mode: ProfitMode) -> Self {
        Self { schedule, mode }
    }

    pub fn with_defaults() -> Self {
        Self::new(FeeSchedule::default(), ProfitMode::TrueLoss)
    }

    pub fn mode(&self) -> ProfitMode {
        self.mode
    }

    pub fn estimate(&self, swap: &NormalizedSwap) -> ProfitEstimate {
        self.estimate_amounts(swap.to_token_qty, swap.approve_fee)
    }

    /// Estimate revenue, cost and profit for one swap
    ///
    /// Cost is a two-bucket model: both legs pay the approve fee plus a flat
    /// execution cost picked by swap size.
    pub fn estimate_amounts(&self, to_token_qty: f64, approve_fee: f64) -> ProfitEstimate {
        let revenue = to_token_qty * self.schedule.fee_rate;

        let leg_cost = if to_token_qty > self.schedule.tier_threshold {
            self.schedule.cost_high
        } else {
            self.schedule.cost_low
        };
        let cost = 2.0 * (approve_fee + leg_cost);

        let profit = match self.mode {
            ProfitMode::TrueLoss => revenue - cost,
            ProfitMode::ClampedLegacy => (revenue - cost).max(0.0),
        };

        ProfitEstimate {
            revenue,
            cost,
            profit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_tier_loss_is_not_clamped() {
        let model = ProfitModel::with_defaults();
        let estimate = model.estimate_amounts(1.0, 0.1);

        assert!((estimate.revenue - 0.003).abs() < 1e-12);
        assert!((estimate.cost - 2.29).abs() < 1e-12);
        assert!((estimate.profit - (-2.287)).abs() < 1e-12);
    }

    #[test]
    fn test_low_tier_cost() {
        let model = ProfitModel::with_defaults();
        let estimate = model.estimate_amounts(0.5, 0.01);

        assert!((estimate.revenue - 0.0015).abs() < 1e-12);
        assert!((estimate.cost - 2.0 * (0.01 + 0.078)).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let model = ProfitModel::with_defaults();
        let at = model.estimate_amounts(0.95, 0.0);
        let above = model.estimate_amounts(0.9500001, 0.0);

        assert!((at.cost - 0.156).abs() < 1e-12);
        assert!((above.cost - 2.09).abs() < 1e-12);
    }

    #[test]
    fn test_large_swap_is_profitable() {
        let model = ProfitModel::with_defaults();
        // 1000 * 0.003 = 3.0 revenue vs 2 * (0.05 + 1.045) = 2.19 cost
        let estimate = model.estimate_amounts(1000.0, 0.05);
        assert!(estimate.profit > 0.0);
        assert!((estimate.profit - 0.81).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_legacy_mode() {
        let model = ProfitModel::new(FeeSchedule::default(), ProfitMode::ClampedLegacy);
        let estimate = model.estimate_amounts(1.0, 0.1);

        assert_eq!(estimate.profit, 0.0);
        assert!((estimate.cost - 2.29).abs() < 1e-12);
    }

    #[test]
    fn test_profit_mode_parsing() {
        assert_eq!(ProfitMode::from_str("loss"), Some(ProfitMode::TrueLoss));
        assert_eq!(ProfitMode::from_str("CLAMPED"), Some(ProfitMode::ClampedLegacy));
        assert_eq!(ProfitMode::from_str("zero"), None);
        assert_eq!(ProfitMode::TrueLoss.as_str(), "loss");
    }
}
