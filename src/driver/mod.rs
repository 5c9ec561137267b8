//! Polling driver - fetch, fold and emit on a fixed interval
//!
//! One cycle walks the stages in order:
//!
//! ```text
//! Idle → Fetching → Normalizing → Filtering → Scoring → Aggregating → Emitting → Idle
//! ```
//!
//! Only fetching can fail. A failed cycle leaves the previous report in
//! place and the next tick tries again.

use crate::analytics::{
    compute_report, AnalyticsConfig, CycleReport, IncrementalPipeline, SnapshotReport, SwapRow,
};
use crate::feed::{FetchError, SwapFeed};
use crate::sink::ReportSink;
use chrono::Utc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Idle,
    Fetching,
    Normalizing,
    Filtering,
    Scoring,
    Aggregating,
    Emitting,
}

impl CycleStage {
    /// Stage that follows this one; `Emitting` returns to `Idle`
    pub fn next(self) -> CycleStage {
        match self {
            CycleStage::Idle => CycleStage::Fetching,
            CycleStage::Fetching => CycleStage::Normalizing,
            CycleStage::Normalizing => CycleStage::Filtering,
            CycleStage::Filtering => CycleStage::Scoring,
            CycleStage::Scoring => CycleStage::Aggregating,
            CycleStage::Aggregating => CycleStage::Emitting,
            CycleStage::Emitting => CycleStage::Idle,
        }
    }
}

impl std::fmt::Display for CycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CycleStage::Idle => "idle",
            CycleStage::Fetching => "fetching",
            CycleStage::Normalizing => "normalizing",
            CycleStage::Filtering => "filtering",
            CycleStage::Scoring => "scoring",
            CycleStage::Aggregating => "aggregating",
            CycleStage::Emitting => "emitting",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug)]
pub enum CycleError {
    Fetch(FetchError),
}

impl From<FetchError> for CycleError {
    fn from(err: FetchError) -> Self {
        CycleError::Fetch(err)
    }
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleError::Fetch(e) => write!(f, "Fetch failed: {}", e),
        }
    }
}

impl std::error::Error for CycleError {}

pub struct PollingDriver<F: SwapFeed> {
    feed: F,
    pipeline: IncrementalPipeline,
    sinks: Vec<Box<dyn ReportSink>>,
    poll_interval: Duration,
    cycles: u64,
    latest: Option<CycleReport>,
}

impl<F: SwapFeed> PollingDriver<F> {
    pub fn new(feed: F, analytics: &AnalyticsConfig, poll_interval: Duration) -> Self {
        Self {
            feed,
            pipeline: IncrementalPipeline::new(analytics),
            sinks: Vec::new(),
            poll_interval,
            cycles: 0,
            latest: None,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.add_sink(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Box<dyn ReportSink>) {
        log::info!("   ├─ Report sink: {}", sink.sink_type());
        self.sinks.push(sink);
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Report of the last completed cycle
    pub fn latest_report(&self) -> Option<&CycleReport> {
        self.latest.as_ref()
    }

    /// Every viable swap row folded so far
    pub fn rows(&self) -> &[SwapRow] {
        self.pipeline.rows()
    }

    /// Run one fetch-to-emit cycle
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let mut stage = self.enter(CycleStage::Idle.next());
        let records = self.feed.fetch_all().await?;

        let rebuilt = self.pipeline.unseen(&records).is_none();
        if rebuilt {
            log::warn!(
                "⚠️  Feed returned {} records but {} were already consumed, rebuilding",
                records.len(),
                self.pipeline.records_seen()
            );
            self.pipeline.reset();
        }
        let unseen = &records[self.pipeline.records_seen()..];

        stage = self.enter(stage.next());
        let batch = self.pipeline.normalize(unseen);
        let normalized = batch.swaps.len();
        if batch.rejected > 0 || batch.off_target > 0 {
            log::debug!(
                "   ├─ {} new records: {} rejected, {} other symbols",
                unseen.len(),
                batch.rejected,
                batch.off_target
            );
        }

        stage = self.enter(stage.next());
        let viable = self.pipeline.filter(batch.swaps);
        if normalized > viable.len() {
            log::debug!(
                "   ├─ {} swaps outside invariant tolerance",
                normalized - viable.len()
            );
        }

        stage = self.enter(stage.next());
        let scored = self.pipeline.score(viable);

        stage = self.enter(stage.next());
        let new_rows = self.pipeline.fold(unseen.len(), normalized, scored);
        let summary = self.pipeline.summary();

        if summary.total_swaps == 0 {
            log::warn!(
                "⚠️  No swaps to the target symbol yet ({} records)",
                records.len()
            );
        } else if summary.valid_swaps == 0 {
            log::warn!(
                "⚠️  None of {} swaps satisfy the pool invariant",
                summary.total_swaps
            );
        }

        stage = self.enter(stage.next());
        self.cycles += 1;
        let report = CycleReport {
            cycle: self.cycles,
            completed_at: Utc::now(),
            records_seen: self.pipeline.records_seen(),
            rebuilt,
            summary,
            new_rows,
        };

        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.emit(&report, self.pipeline.rows()).await {
                log::error!("❌ {} sink failed for cycle {}: {}", sink.sink_type(), report.cycle, e);
            }
        }

        self.latest = Some(report.clone());
        self.enter(stage.next());
        Ok(report)
    }

    fn enter(&self, stage: CycleStage) -> CycleStage {
        log::trace!("cycle {} → {}", self.cycles + 1, stage);
        stage
    }

    /// Poll forever; cancel by dropping the future
    pub async fn run(&mut self) {
        log::info!(
            "⏰ Polling {} every {}ms",
            self.feed.source_name(),
            self.poll_interval.as_millis()
        );

        let mut timer = interval(self.poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;

            if let Err(e) = self.run_cycle().await {
                log::warn!("⚠️  Cycle skipped, retrying next tick: {}", e);
            }
        }
    }
}

/// Fetch once and recompute everything from that snapshot
pub async fn fetch_snapshot<F: SwapFeed>(
    feed: &mut F,
    analytics: &AnalyticsConfig,
) -> Result<SnapshotReport, CycleError> {
    let records = feed.fetch_all().await?;
    let (summary, rows) = compute_report(analytics, &records);
    Ok(SnapshotReport {
        records: records.len(),
        summary,
        rows,
    })
}
