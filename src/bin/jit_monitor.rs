//! JIT Monitor - polls the swap feed and reports JIT liquidity candidates
//!
//! Usage:
//!   cargo run --release --bin jit_monitor
//!   cargo run --release --bin jit_monitor -- --once
//!
//! `--once` fetches a single snapshot, prints the full report as JSON on
//! stdout and exits.
//!
//! Environment variables: see `MonitorConfig::from_env`. `.env` is honored.

use dotenv::dotenv;
use env_logger::{Env, Target};
use jitflow::analytics::ProfitMode;
use jitflow::config::{FeedMode, MonitorConfig};
use jitflow::driver::{fetch_snapshot, PollingDriver};
use jitflow::feed::{HttpSwapFeed, SimulatedFeed, SwapFeed};
use jitflow::sink::{JsonlReportWriter, LogReportSink};
use log::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();

    let once = std::env::args().skip(1).any(|arg| arg == "--once");

    let config = match MonitorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}", e);
            return Err(e.into());
        }
    };

    info!("🚀 JIT Monitor");
    info!("   ├─ Feed: {} ({})", config.feed_url, config.feed_mode.as_str());
    info!("   ├─ Target symbol: {}", config.analytics.target_symbol);
    info!("   ├─ Invariant tolerance: {}", config.analytics.invariant_tolerance);
    info!("   ├─ Profit mode: {}", config.analytics.profit_mode.as_str());
    info!("   └─ Poll interval: {}ms", config.poll_interval_ms);

    if config.analytics.profit_mode == ProfitMode::ClampedLegacy {
        warn!("⚠️  Clamped profit mode hides losses; cumulative profit never decreases");
    }

    match config.feed_mode {
        FeedMode::Http => {
            let feed = HttpSwapFeed::new(&config.feed_url, config.fetch_timeout())?;
            run(feed, &config, once).await
        }
        FeedMode::Simulated => {
            let feed = SimulatedFeed::new(config.simulated_seed, &config.analytics.target_symbol);
            run(feed, &config, once).await
        }
    }
}

async fn run<F: SwapFeed>(
    mut feed: F,
    config: &MonitorConfig,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if once {
        let snapshot = match fetch_snapshot(&mut feed, &config.analytics).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("❌ {}", e);
                return Err(e.into());
            }
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let mut driver = PollingDriver::new(feed, &config.analytics, config.poll_interval())
        .with_sink(Box::new(LogReportSink::new()));

    if let Some(path) = &config.report_path {
        driver.add_sink(Box::new(JsonlReportWriter::new(path)?));
    }

    tokio::select! {
        _ = driver.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("🛑 Shutting down");
        }
    }

    if let Some(report) = driver.latest_report() {
        info!(
            "✅ Last cycle {}: {} valid swaps, {} profitable",
            report.cycle, report.summary.valid_swaps, report.summary.viable_swaps
        );
    }

    Ok(())
}
