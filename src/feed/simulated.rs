//! Seeded in-process stand-in for the upstream swap feed
//!
//! Mirrors the upstream dummy server: every call appends 1-3 random swaps
//! and returns the whole history. Quantities, reserve 2 and fees are emitted
//! in wei strings; reserve 1 in whole token units.

use super::{FetchError, SwapFeed};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

const FROM_SYMBOLS: [&str; 5] = ["USDC", "DAI", "PEPE", "LINK", "UNI"];
const OFF_TARGET_SYMBOLS: [&str; 3] = ["USDC", "DAI", "WBTC"];

pub struct SimulatedFeed {
    rng: StdRng,
    history: Vec<Value>,
    target_symbol: String,
    now_fn: Box<dyn Fn() -> i64 + Send>,
}

impl SimulatedFeed {
    pub fn new(seed: u64, target_symbol: impl Into<String>) -> Self {
        Self::new_with_clock(
            seed,
            target_symbol,
            Box::new(|| chrono::Utc::now().timestamp_millis()),
        )
    }

    /// Deterministic variant for tests: `now_fn` returns epoch millis
    pub fn new_with_clock(
        seed: u64,
        target_symbol: impl Into<String>,
        now_fn: Box<dyn Fn() -> i64 + Send>,
    ) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            history: Vec::new(),
            target_symbol: target_symbol.into(),
            now_fn,
        }
    }

    pub fn history(&self) -> &[Value] {
        &self.history
    }

    fn generate_record(&mut self) -> Value {
        let now = (self.now_fn)();
        let rng = &mut self.rng;

        let tx_hash = format!("0x{:032x}{:032x}", rng.gen::<u128>(), rng.gen::<u128>());
        let from_symbol = FROM_SYMBOLS[rng.gen_range(0..FROM_SYMBOLS.len())];
        let to_symbol = if rng.gen_bool(0.1) {
            OFF_TARGET_SYMBOLS[rng.gen_range(0..OFF_TARGET_SYMBOLS.len())].to_string()
        } else {
            self.target_symbol.clone()
        };

        let balance1: u64 = rng.gen_range(1_000_000..5_000_000);
        let balance2 = rng.gen_range(500.0..5_000.0);
        let from_qty = balance1 as f64 * rng.gen_range(0.00001..0.01);

        // Constant-product output, sometimes inflated past what the pool allows
        let mut to_qty = balance2 * from_qty / (balance1 as f64 + from_qty);
        if rng.gen_bool(0.25) {
            to_qty *= rng.gen_range(1.5..4.0);
        }

        let balance2_field = if rng.gen_bool(0.03) {
            json!("n/a")
        } else {
            json!(to_wei(balance2))
        };

        let approve_fee = rng.gen_range(0.001..0.02);
        let tx_receipt_ts = now - rng.gen_range(0..2_000);
        let tx_prosessed_ts = tx_receipt_ts + rng.gen_range(150..3_500);

        json!({
            "tx_hash": tx_hash,
            "from_token_qty": to_wei(from_qty),
            "from_token_symbol": from_symbol,
            "to_token_qty": to_wei(to_qty),
            "to_token_symbol": to_symbol,
            "balance1": balance1,
            "balance2": balance2_field,
            "approve_fee": to_wei(approve_fee),
            "liq_fee": "0",
            "tx_receipt_ts": tx_receipt_ts,
            "tx_prosessed_ts": tx_prosessed_ts.to_string(),
        })
    }
}

fn to_wei(tokens: f64) -> String {
    ((tokens * 1e18) as u128).to_string()
}

#[async_trait]
impl SwapFeed for SimulatedFeed {
    async fn fetch_all(&mut self) -> Result<Vec<Value>, FetchError> {
        let new_records = self.rng.gen_range(1..=3);
        for _ in 0..new_records {
            let record = self.generate_record();
            self.history.push(record);
        }
        Ok(self.history.clone())
    }

    fn source_name(&self) -> String {
        "simulated".to_string()
    }
}
