//! Constant-product consistency filter

use super::normalizer::NormalizedSwap;
use serde::Serialize;

/// A swap whose reported amounts are consistent with its pool reserves
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViableSwap {
    /// 1-based position in the current viable sequence (charting only)
    pub swap_number: usize,
    pub swap: NormalizedSwap,
}

/// Reserve products before and after a swap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvariantCheck {
    pub k_before: f64,
    pub k_after: f64,
}

impl InvariantCheck {
    /// `from_qty` enters reserve 1, `to_qty` leaves reserve 2
    pub fn compute(balance1: f64, balance2: f64, from_qty: f64, to_qty: f64) -> Self {
        Self {
            k_before: balance1 * balance2,
            k_after: (balance1 + from_qty) * (balance2 - to_qty),
        }
    }

    pub fn deviation(&self) -> f64 {
        (self.k_before - self.k_after).abs()
    }

    /// Deviation relative to `k_before`
    pub fn relative_deviation(&self) -> f64 {
        self.deviation() / self.k_before
    }
}

pub struct InvariantFilter {
    tolerance: f64,
}

impl InvariantFilter {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn with_defaults() -> Self {
        Self::new(0.005)
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Check raw reserve/amount figures against the tolerance
    ///
    /// Only pre-swap reserves are known, so this bounds how far the reported
    /// swap deviates from ideal x*y=k behaviour. It cannot catch a swap that
    /// is internally consistent but misreported.
    pub fn accepts(&self, balance1: f64, balance2: f64, from_qty: f64, to_qty: f64) -> bool {
        let check = InvariantCheck::compute(balance1, balance2, from_qty, to_qty);
        // NaN (overflowed products) compares false and is rejected
        check.deviation() <= self.tolerance * check.k_before
    }

    pub fn is_viable(&self, swap: &NormalizedSwap) -> bool {
        self.accepts(
            swap.balance1,
            swap.balance2,
            swap.from_token_qty,
            swap.to_token_qty,
        )
    }

    /// Keep viable swaps in input order, numbering them from `first_number`
    pub fn filter_from(&self, swaps: Vec<NormalizedSwap>, first_number: usize) -> Vec<ViableSwap> {
        swaps
            .into_iter()
            .filter(|swap| self.is_viable(swap))
            .enumerate()
            .map(|(i, swap)| ViableSwap {
                swap_number: first_number + i,
                swap,
            })
            .collect()
    }

    pub fn filter(&self, swaps: Vec<NormalizedSwap>) -> Vec<ViableSwap> {
        self.filter_from(swaps, 1)
    }
}
