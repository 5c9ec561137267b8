//! Monitor configuration from environment variables

use crate::analytics::{AnalyticsConfig, FeeSchedule, FieldScales, ProfitMode};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    Http,
    Simulated,
}

impl FeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedMode::Http => "http",
            FeedMode::Simulated => "simulated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "http" => Some(FeedMode::Http),
            "simulated" => Some(FeedMode::Simulated),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for the polling monitor
///
/// Loaded from environment variables with the reference defaults.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Upstream feed endpoint
    pub feed_url: String,

    /// Where swap records come from
    pub feed_mode: FeedMode,

    /// Seed for the simulated feed
    pub simulated_seed: u64,

    /// Delay between poll cycles in milliseconds
    pub poll_interval_ms: u64,

    /// HTTP request timeout in milliseconds
    pub fetch_timeout_ms: u64,

    /// Optional JSONL file receiving one report per cycle
    pub report_path: Option<PathBuf>,

    /// Stage tunables
    pub analytics: AnalyticsConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            feed_url: "http://localhost:5000/get_data".to_string(),
            feed_mode: FeedMode::Http,
            simulated_seed: 42,
            poll_interval_ms: 5_000,
            fetch_timeout_ms: 10_000,
            report_path: None,
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `JIT_FEED_URL` (default: http://localhost:5000/get_data)
    /// - `JIT_FEED_MODE` (default: http; or simulated)
    /// - `JIT_SIMULATED_SEED` (default: 42)
    /// - `JIT_POLL_INTERVAL_MS` (default: 5000)
    /// - `JIT_FETCH_TIMEOUT_MS` (default: 10000)
    /// - `JIT_REPORT_PATH` (default: unset)
    /// - `JIT_TARGET_SYMBOL` (default: WETH)
    /// - `JIT_INVARIANT_TOLERANCE` (default: 0.005)
    /// - `JIT_FEE_RATE` (default: 0.003)
    /// - `JIT_FEE_TIER_THRESHOLD` (default: 0.95)
    /// - `JIT_COST_HIGH` (default: 1.045)
    /// - `JIT_COST_LOW` (default: 0.078)
    /// - `JIT_PROFIT_MODE` (default: loss; `clamped` is the legacy mode)
    /// - `JIT_SCALE_FROM_TOKEN_QTY`, `JIT_SCALE_TO_TOKEN_QTY`,
    ///   `JIT_SCALE_BALANCE1`, `JIT_SCALE_BALANCE2`, `JIT_SCALE_APPROVE_FEE`,
    ///   `JIT_SCALE_LIQ_FEE` (default: 1e-18, except balance1: 1.0)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`MonitorConfig::from_env`] with an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = MonitorConfig::default();
        let default_scales = defaults.analytics.scales;
        let default_fees = defaults.analytics.fees;

        let feed_mode = match non_empty(&lookup, "JIT_FEED_MODE") {
            Some(raw) => FeedMode::from_str(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "JIT_FEED_MODE='{}' (expected http or simulated)",
                    raw
                ))
            })?,
            None => defaults.feed_mode,
        };

        let profit_mode = match non_empty(&lookup, "JIT_PROFIT_MODE") {
            Some(raw) => ProfitMode::from_str(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "JIT_PROFIT_MODE='{}' (expected loss or clamped)",
                    raw
                ))
            })?,
            None => defaults.analytics.profit_mode,
        };

        let config = Self {
            feed_url: non_empty(&lookup, "JIT_FEED_URL").unwrap_or(defaults.feed_url),
            feed_mode,
            simulated_seed: parse_var(&lookup, "JIT_SIMULATED_SEED", defaults.simulated_seed)?,
            poll_interval_ms: parse_var(&lookup, "JIT_POLL_INTERVAL_MS", defaults.poll_interval_ms)?,
            fetch_timeout_ms: parse_var(&lookup, "JIT_FETCH_TIMEOUT_MS", defaults.fetch_timeout_ms)?,
            report_path: non_empty(&lookup, "JIT_REPORT_PATH").map(PathBuf::from),
            analytics: AnalyticsConfig {
                target_symbol: non_empty(&lookup, "JIT_TARGET_SYMBOL")
                    .unwrap_or(defaults.analytics.target_symbol),
                invariant_tolerance: parse_var(
                    &lookup,
                    "JIT_INVARIANT_TOLERANCE",
                    defaults.analytics.invariant_tolerance,
                )?,
                fees: FeeSchedule {
                    fee_rate: parse_var(&lookup, "JIT_FEE_RATE", default_fees.fee_rate)?,
                    tier_threshold: parse_var(
                        &lookup,
                        "JIT_FEE_TIER_THRESHOLD",
                        default_fees.tier_threshold,
                    )?,
                    cost_high: parse_var(&lookup, "JIT_COST_HIGH", default_fees.cost_high)?,
                    cost_low: parse_var(&lookup, "JIT_COST_LOW", default_fees.cost_low)?,
                },
                profit_mode,
                scales: FieldScales {
                    from_token_qty: parse_var(
                        &lookup,
                        "JIT_SCALE_FROM_TOKEN_QTY",
                        default_scales.from_token_qty,
                    )?,
                    to_token_qty: parse_var(
                        &lookup,
                        "JIT_SCALE_TO_TOKEN_QTY",
                        default_scales.to_token_qty,
                    )?,
                    balance1: parse_var(&lookup, "JIT_SCALE_BALANCE1", default_scales.balance1)?,
                    balance2: parse_var(&lookup, "JIT_SCALE_BALANCE2", default_scales.balance2)?,
                    approve_fee: parse_var(
                        &lookup,
                        "JIT_SCALE_APPROVE_FEE",
                        default_scales.approve_fee,
                    )?,
                    liq_fee: parse_var(&lookup, "JIT_SCALE_LIQ_FEE", default_scales.liq_fee)?,
                },
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_mode == FeedMode::Http
            && !self.feed_url.starts_with("http://")
            && !self.feed_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue(
                "JIT_FEED_URL must start with http:// or https://".to_string(),
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "JIT_POLL_INTERVAL_MS must be greater than 0".to_string(),
            ));
        }

        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "JIT_FETCH_TIMEOUT_MS must be greater than 0".to_string(),
            ));
        }

        let analytics = &self.analytics;
        if analytics.target_symbol.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "JIT_TARGET_SYMBOL must not be empty".to_string(),
            ));
        }

        let tolerance = analytics.invariant_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "JIT_INVARIANT_TOLERANCE must be a non-negative number, got {}",
                tolerance
            )));
        }

        let fees = &analytics.fees;
        for (name, value) in [
            ("JIT_FEE_RATE", fees.fee_rate),
            ("JIT_FEE_TIER_THRESHOLD", fees.tier_threshold),
            ("JIT_COST_HIGH", fees.cost_high),
            ("JIT_COST_LOW", fees.cost_low),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        for (field, factor) in analytics.scales.named() {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "scale for {} must be a positive number, got {}",
                    field, factor
                )));
            }
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup, name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(format!("{}='{}': {}", name, raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::WEI_SCALE;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.feed_url, "http://localhost:5000/get_data");
        assert_eq!(config.feed_mode, FeedMode::Http);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert!(config.report_path.is_none());
        assert_eq!(config.analytics.target_symbol, "WETH");
        assert_eq!(config.analytics.invariant_tolerance, 0.005);
        assert_eq!(config.analytics.fees, FeeSchedule::default());
        assert_eq!(config.analytics.profit_mode, ProfitMode::TrueLoss);
        assert_eq!(config.analytics.scales.balance1, 1.0);
        assert_eq!(config.analytics.scales.balance2, WEI_SCALE);
    }

    #[test]
    fn test_custom_config() {
        let config = MonitorConfig::from_lookup(lookup_from(&[
            ("JIT_FEED_MODE", "simulated"),
            ("JIT_SIMULATED_SEED", "9"),
            ("JIT_POLL_INTERVAL_MS", "2000"),
            ("JIT_REPORT_PATH", "/tmp/jit/cycles.jsonl"),
            ("JIT_TARGET_SYMBOL", "USDC"),
            ("JIT_INVARIANT_TOLERANCE", "0.01"),
            ("JIT_COST_HIGH", "2.5"),
            ("JIT_PROFIT_MODE", "clamped"),
            ("JIT_SCALE_BALANCE1", "1e-18"),
            ("JIT_SCALE_TO_TOKEN_QTY", "1e-6"),
        ]))
        .unwrap();

        assert_eq!(config.feed_mode, FeedMode::Simulated);
        assert_eq!(config.simulated_seed, 9);
        assert_eq!(config.poll_interval_ms, 2_000);
        assert_eq!(
            config.report_path,
            Some(PathBuf::from("/tmp/jit/cycles.jsonl"))
        );
        assert_eq!(config.analytics.target_symbol, "USDC");
        assert_eq!(config.analytics.invariant_tolerance, 0.01);
        assert_eq!(config.analytics.fees.cost_high, 2.5);
        assert_eq!(config.analytics.fees.cost_low, 0.078);
        assert_eq!(config.analytics.profit_mode, ProfitMode::ClampedLegacy);
        assert_eq!(config.analytics.scales.balance1, 1e-18);
        assert_eq!(config.analytics.scales.to_token_qty, 1e-6);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let result = MonitorConfig::from_lookup(lookup_from(&[("JIT_INVARIANT_TOLERANCE", "-0.1")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_unparsable_number_rejected() {
        let err = MonitorConfig::from_lookup(lookup_from(&[("JIT_POLL_INTERVAL_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("JIT_POLL_INTERVAL_MS"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(MonitorConfig::from_lookup(lookup_from(&[("JIT_POLL_INTERVAL_MS", "0")])).is_err());
    }

    #[test]
    fn test_non_positive_scale_rejected() {
        assert!(MonitorConfig::from_lookup(lookup_from(&[("JIT_SCALE_LIQ_FEE", "0")])).is_err());
        assert!(MonitorConfig::from_lookup(lookup_from(&[("JIT_SCALE_BALANCE2", "NaN")])).is_err());
    }

    #[test]
    fn test_bad_url_and_modes_rejected() {
        assert!(MonitorConfig::from_lookup(lookup_from(&[("JIT_FEED_URL", "localhost:5000")])).is_err());
        assert!(MonitorConfig::from_lookup(lookup_from(&[("JIT_FEED_MODE", "grpc")])).is_err());
        assert!(MonitorConfig::from_lookup(lookup_from(&[("JIT_PROFIT_MODE", "zero")])).is_err());
    }

    #[test]
    fn test_simulated_mode_ignores_url() {
        let config = MonitorConfig::from_lookup(lookup_from(&[
            ("JIT_FEED_MODE", "simulated"),
            ("JIT_FEED_URL", "not-a-url"),
        ]));
        assert!(config.is_ok());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = MonitorConfig::from_lookup(lookup_from(&[("JIT_TARGET_SYMBOL", "  ")])).unwrap();
        assert_eq!(config.analytics.target_symbol, "WETH");
    }
}
