//! Swap normalization from raw feed records to unit-correct swaps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Smallest on-chain unit (wei) to token unit
pub const WEI_SCALE: f64 = 1e-18;

/// Numeric field as sent by the feed: a JSON number or a numeric string
///
/// Any other JSON value is kept as `Other` so that decoding the row still
/// succeeds; coercion then decides whether the field matters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
    Other(Value),
}

impl RawNumber {
    /// Coerce to a finite float
    pub fn to_f64(&self) -> Option<f64> {
        let value = match self {
            RawNumber::Number(n) => *n,
            RawNumber::Text(s) => s.trim().parse::<f64>().ok()?,
            RawNumber::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Coerce to integer milliseconds since epoch
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            RawNumber::Number(n) if n.is_finite() => Some(n.round() as i64),
            RawNumber::Number(_) => None,
            RawNumber::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .map(|v| v.round() as i64)
                })
            }
            RawNumber::Other(_) => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            RawNumber::Number(n) => n.to_string(),
            RawNumber::Text(s) => s.clone(),
            RawNumber::Other(v) => v.to_string(),
        }
    }
}

/// One upstream swap event, exactly as received
///
/// Every field is optional at decode time so that a single bad row never
/// fails the whole feed array. Field aliases accept the legacy dummy-feed
/// naming (`from_amount`, `to_reserve`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSwapRecord {
    #[serde(default, alias = "id", deserialize_with = "lenient_text")]
    pub tx_hash: Option<String>,
    #[serde(default, alias = "from_amount")]
    pub from_token_qty: Option<RawNumber>,
    #[serde(default, alias = "from_token", deserialize_with = "lenient_text")]
    pub from_token_symbol: Option<String>,
    #[serde(default, alias = "to_amount")]
    pub to_token_qty: Option<RawNumber>,
    #[serde(default, alias = "to_token", deserialize_with = "lenient_text")]
    pub to_token_symbol: Option<String>,
    #[serde(default, alias = "from_reserve")]
    pub balance1: Option<RawNumber>,
    #[serde(default, alias = "to_reserve")]
    pub balance2: Option<RawNumber>,
    #[serde(default)]
    pub approve_fee: Option<RawNumber>,
    #[serde(default)]
    pub liq_fee: Option<RawNumber>,
    #[serde(default, alias = "timestamp")]
    pub tx_receipt_ts: Option<RawNumber>,
    #[serde(default)]
    pub tx_prosessed_ts: Option<RawNumber>,
}

impl RawSwapRecord {
    /// Decode one element of the feed array
    pub fn from_value(value: &Value) -> Result<Self, RowError> {
        if !value.is_object() {
            return Err(RowError::Malformed(format!(
                "expected a JSON object, got {}",
                json_kind(value)
            )));
        }
        RawSwapRecord::deserialize(value).map_err(|e| RowError::Malformed(e.to_string()))
    }
}

/// Identifiers and symbols: numbers are stringified, other JSON types read as absent
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Per-field rescale factors applied to raw quantities
///
/// Feeds disagree on which fields arrive pre-scaled, so each field carries
/// its own factor. `balance1` defaults to 1.0 (token units); every other
/// quantity defaults to [`WEI_SCALE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldScales {
    pub from_token_qty: f64,
    pub to_token_qty: f64,
    pub balance1: f64,
    pub balance2: f64,
    pub approve_fee: f64,
    pub liq_fee: f64,
}

impl FieldScales {
    /// No rescaling at all; useful when the feed already reports token units
    pub fn identity() -> Self {
        Self {
            from_token_qty: 1.0,
            to_token_qty: 1.0,
            balance1: 1.0,
            balance2: 1.0,
            approve_fee: 1.0,
            liq_fee: 1.0,
        }
    }

    pub fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("from_token_qty", self.from_token_qty),
            ("to_token_qty", self.to_token_qty),
            ("balance1", self.balance1),
            ("balance2", self.balance2),
            ("approve_fee", self.approve_fee),
            ("liq_fee", self.liq_fee),
        ]
    }
}

impl Default for FieldScales {
    fn default() -> Self {
        Self {
            from_token_qty: WEI_SCALE,
            to_token_qty: WEI_SCALE,
            balance1: 1.0,
            balance2: WEI_SCALE,
            approve_fee: WEI_SCALE,
            liq_fee: WEI_SCALE,
        }
    }
}

/// A swap in token units with parsed timestamps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSwap {
    pub tx_hash: String,
    pub from_token_symbol: String,
    pub to_token_symbol: String,
    pub from_token_qty: f64,
    pub to_token_qty: f64,
    pub balance1: f64,
    pub balance2: f64,
    pub approve_fee: f64,
    pub liq_fee: f64,
    pub received_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}

/// Why a feed row was dropped
#[derive(Debug, Clone, PartialEq)]
pub enum RowError {
    Malformed(String),
    MissingField(&'static str),
    InvalidNumber { field: &'static str, value: String },
    InvalidTimestamp { field: &'static str, value: String },
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowError::Malformed(msg) => write!(f, "malformed row: {}", msg),
            RowError::MissingField(field) => write!(f, "missing field `{}`", field),
            RowError::InvalidNumber { field, value } => {
                write!(f, "field `{}` is not numeric: {:?}", field, value)
            }
            RowError::InvalidTimestamp { field, value } => {
                write!(f, "field `{}` is not a millisecond timestamp: {:?}", field, value)
            }
        }
    }
}

impl std::error::Error for RowError {}

/// Result of normalizing one batch of feed rows
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub swaps: Vec<NormalizedSwap>,
    /// Rows dropped because they failed decoding or coercion
    pub rejected: usize,
    /// Rows skipped because the destination symbol is not the target
    pub off_target: usize,
}

pub struct Normalizer {
    target_symbol: String,
    scales: FieldScales,
}

impl Normalizer {
    pub fn new(target_symbol: impl Into<String>, scales: FieldScales) -> Self {
        Self {
            target_symbol: target_symbol.into(),
            scales,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new("WETH", FieldScales::default())
    }

    pub fn target_symbol(&self) -> &str {
        &self.target_symbol
    }

    /// Normalize a batch of feed rows, preserving order
    pub fn normalize_batch(&self, rows: &[Value]) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();

        for row in rows {
            match RawSwapRecord::from_value(row).and_then(|raw| self.normalize_record(&raw)) {
                Ok(Some(swap)) => batch.swaps.push(swap),
                Ok(None) => batch.off_target += 1,
                Err(e) => {
                    log::debug!("Dropping feed row: {}", e);
                    batch.rejected += 1;
                }
            }
        }

        batch
    }

    /// Normalize one decoded record
    ///
    /// Returns `Ok(None)` when the destination symbol is not the target.
    pub fn normalize_record(&self, raw: &RawSwapRecord) -> Result<Option<NormalizedSwap>, RowError> {
        let to_token_symbol = raw
            .to_token_symbol
            .as_deref()
            .ok_or(RowError::MissingField("to_token_symbol"))?;
        if to_token_symbol != self.target_symbol {
            return Ok(None);
        }

        let balance1 = required_number("balance1", &raw.balance1)? * self.scales.balance1;
        let balance2 = required_number("balance2", &raw.balance2)? * self.scales.balance2;
        let from_token_qty =
            required_number("from_token_qty", &raw.from_token_qty)? * self.scales.from_token_qty;
        let to_token_qty =
            required_number("to_token_qty", &raw.to_token_qty)? * self.scales.to_token_qty;

        let received_at = required_timestamp("tx_receipt_ts", &raw.tx_receipt_ts)?;
        let processed_at = required_timestamp("tx_prosessed_ts", &raw.tx_prosessed_ts)?;

        Ok(Some(NormalizedSwap {
            tx_hash: raw.tx_hash.clone().unwrap_or_default(),
            from_token_symbol: raw.from_token_symbol.clone().unwrap_or_default(),
            to_token_symbol: to_token_symbol.to_string(),
            from_token_qty,
            to_token_qty,
            balance1,
            balance2,
            approve_fee: optional_fee("approve_fee", &raw.approve_fee) * self.scales.approve_fee,
            liq_fee: optional_fee("liq_fee", &raw.liq_fee) * self.scales.liq_fee,
            received_at,
            processed_at,
        }))
    }
}

fn required_number(field: &'static str, raw: &Option<RawNumber>) -> Result<f64, RowError> {
    let raw = raw.as_ref().ok_or(RowError::MissingField(field))?;
    raw.to_f64().ok_or_else(|| RowError::InvalidNumber {
        field,
        value: raw.describe(),
    })
}

fn required_timestamp(
    field: &'static str,
    raw: &Option<RawNumber>,
) -> Result<DateTime<Utc>, RowError> {
    let raw = raw.as_ref().ok_or(RowError::MissingField(field))?;
    raw.to_millis()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| RowError::InvalidTimestamp {
            field,
            value: raw.describe(),
        })
}

/// Fees are informational inputs; absent or garbled values count as zero
fn optional_fee(field: &'static str, raw: &Option<RawNumber>) -> f64 {
    match raw {
        None => 0.0,
        Some(raw) => raw.to_f64().unwrap_or_else(|| {
            log::debug!("Fee `{}` not numeric ({}), using 0", field, raw.describe());
            0.0
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weth_row() -> Value {
        json!({
            "tx_hash": "0xabc",
            "from_token_qty": "2000000000000000000",
            "from_token_symbol": "USDC",
            "to_token_qty": 1_000_000_000_000_000_000u64,
            "to_token_symbol": "WETH",
            "balance1": 1500,
            "balance2": "500000000000000000000",
            "approve_fee": "100000000000000000",
            "liq_fee": "0",
            "tx_receipt_ts": 1000,
            "tx_prosessed_ts": "1500"
        })
    }

    #[test]
    fn test_normalize_rescales_per_field() {
        let normalizer = Normalizer::with_defaults();
        let swap = normalizer
            .normalize_record(&RawSwapRecord::from_value(&weth_row()).unwrap())
            .unwrap()
            .unwrap();

        assert_eq!(swap.tx_hash, "0xabc");
        assert_eq!(swap.from_token_symbol, "USDC");
        assert!((swap.from_token_qty - 2.0).abs() < 1e-12);
        assert!((swap.to_token_qty - 1.0).abs() < 1e-12);
        assert_eq!(swap.balance1, 1500.0);
        assert!((swap.balance2 - 500.0).abs() < 1e-9);
        assert!((swap.approve_fee - 0.1).abs() < 1e-12);
        assert_eq!(swap.liq_fee, 0.0);
        assert_eq!(swap.received_at.timestamp_millis(), 1000);
        assert_eq!(swap.processed_at.timestamp_millis(), 1500);
    }

    #[test]
    fn test_balance1_scale_is_configurable() {
        let scales = FieldScales {
            balance1: WEI_SCALE,
            ..FieldScales::default()
        };
        let mut row = weth_row();
        row["balance1"] = json!("1500000000000000000000");

        let swap = Normalizer::new("WETH", scales)
            .normalize_record(&RawSwapRecord::from_value(&row).unwrap())
            .unwrap()
            .unwrap();
        assert!((swap.balance1 - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_off_target_symbol_is_skipped() {
        let mut row = weth_row();
        row["to_token_symbol"] = json!("DAI");

        let batch = Normalizer::with_defaults().normalize_batch(&[row]);
        assert!(batch.swaps.is_empty());
        assert_eq!(batch.off_target, 1);
        assert_eq!(batch.rejected, 0);
    }

    #[test]
    fn test_non_numeric_reserve_drops_row() {
        let mut row = weth_row();
        row["balance2"] = json!("n/a");

        let raw = RawSwapRecord::from_value(&row).unwrap();
        let err = Normalizer::with_defaults().normalize_record(&raw).unwrap_err();
        assert_eq!(
            err,
            RowError::InvalidNumber {
                field: "balance2",
                value: "n/a".to_string()
            }
        );
    }

    #[test]
    fn test_missing_quantity_drops_row() {
        let mut row = weth_row();
        row.as_object_mut().unwrap().remove("to_token_qty");

        let batch = Normalizer::with_defaults().normalize_batch(&[row, weth_row()]);
        assert_eq!(batch.swaps.len(), 1);
        assert_eq!(batch.rejected, 1);
    }

    #[test]
    fn test_bad_timestamp_drops_row() {
        let mut row = weth_row();
        row["tx_prosessed_ts"] = json!("yesterday");

        let raw = RawSwapRecord::from_value(&row).unwrap();
        let err = Normalizer::with_defaults().normalize_record(&raw).unwrap_err();
        assert!(matches!(
            err,
            RowError::InvalidTimestamp {
                field: "tx_prosessed_ts",
                ..
            }
        ));
    }

    #[test]
    fn test_garbled_fee_counts_as_zero() {
        let mut row = weth_row();
        row["approve_fee"] = json!("??");
        row.as_object_mut().unwrap().remove("liq_fee");

        let raw = RawSwapRecord::from_value(&row).unwrap();
        let swap = Normalizer::with_defaults().normalize_record(&raw).unwrap().unwrap();
        assert_eq!(swap.approve_fee, 0.0);
        assert_eq!(swap.liq_fee, 0.0);
    }

    #[test]
    fn test_non_scalar_fees_count_as_zero() {
        for fee in [json!(true), json!({"v": 1}), json!([1, 2])] {
            let mut row = weth_row();
            row["approve_fee"] = fee.clone();
            row["liq_fee"] = fee;

            let batch = Normalizer::with_defaults().normalize_batch(&[row]);
            assert_eq!(batch.rejected, 0);
            assert_eq!(batch.swaps.len(), 1);
            assert_eq!(batch.swaps[0].approve_fee, 0.0);
            assert_eq!(batch.swaps[0].liq_fee, 0.0);
        }
    }

    #[test]
    fn test_numeric_tx_hash_is_kept() {
        let mut row = weth_row();
        row["tx_hash"] = json!(12345);

        let batch = Normalizer::with_defaults().normalize_batch(&[row]);
        assert_eq!(batch.rejected, 0);
        assert_eq!(batch.swaps[0].tx_hash, "12345");
    }

    #[test]
    fn test_non_text_tx_hash_and_source_symbol_default_to_empty() {
        let mut row = weth_row();
        row["tx_hash"] = json!({"hash": "0xabc"});
        row["from_token_symbol"] = json!(false);

        let batch = Normalizer::with_defaults().normalize_batch(&[row]);
        assert_eq!(batch.swaps.len(), 1);
        assert_eq!(batch.swaps[0].tx_hash, "");
        assert_eq!(batch.swaps[0].from_token_symbol, "");
    }

    #[test]
    fn test_non_scalar_reserve_still_drops_row() {
        let mut row = weth_row();
        row["balance1"] = json!(true);

        let raw = RawSwapRecord::from_value(&row).unwrap();
        let err = Normalizer::with_defaults().normalize_record(&raw).unwrap_err();
        assert_eq!(
            err,
            RowError::InvalidNumber {
                field: "balance1",
                value: "true".to_string()
            }
        );
    }

    #[test]
    fn test_non_object_row_is_malformed() {
        let batch = Normalizer::with_defaults().normalize_batch(&[json!(42), json!("row"), weth_row()]);
        assert_eq!(batch.rejected, 2);
        assert_eq!(batch.swaps.len(), 1);
    }

    #[test]
    fn test_legacy_field_names() {
        let row = json!({
            "id": "aB3dE",
            "exchange_type": "Exchanging",
            "from_amount": 5000,
            "from_token": "QWERT",
            "to_amount": 300,
            "to_token": "WETH",
            "from_reserve": 1500000000u64,
            "to_reserve": 500000000u64,
            "timestamp": 1700000000000i64,
            "tx_prosessed_ts": 1700000000250i64
        });

        let swap = Normalizer::new("WETH", FieldScales::identity())
            .normalize_record(&RawSwapRecord::from_value(&row).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(swap.tx_hash, "aB3dE");
        assert_eq!(swap.from_token_qty, 5000.0);
        assert_eq!(swap.to_token_qty, 300.0);
        assert_eq!(swap.balance1, 1_500_000_000.0);
        assert_eq!(swap.balance2, 500_000_000.0);
    }

    #[test]
    fn test_every_normalized_swap_matches_target() {
        let rows: Vec<Value> = ["WETH", "USDC", "WETH", "weth", "DAI"]
            .iter()
            .map(|symbol| {
                let mut row = weth_row();
                row["to_token_symbol"] = json!(symbol);
                row
            })
            .collect();

        let batch = Normalizer::with_defaults().normalize_batch(&rows);
        assert_eq!(batch.swaps.len(), 2);
        assert_eq!(batch.off_target, 3);
        assert!(batch.swaps.iter().all(|s| s.to_token_symbol == "WETH"));
    }
}
