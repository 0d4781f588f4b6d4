//! # Step and Suite Triggers
//!
//! The glue between a test runner's lifecycle hooks and the metrics core.
//!
//! - [`StepTracker`] runs at step boundaries: it counts steps, waits a short
//!   settle delay, asks a [`TimingSource`] for a sample and records it.
//!   Scenarios tagged with an opt-out tag are never sampled.
//! - [`SuiteFinalizer`] runs at suite end: it builds the report and writes
//!   the export exactly once, guarded by a one-shot latch it owns.
//!
//! Sampling problems are reported through `tracing` and never fail the
//! step that triggered them.

use crate::classify::ClassifierPolicy;
use crate::error::{PerfError, Result};
use crate::export::MetricsExport;
use crate::record::{MetricRecord, StepTimings};
use crate::report::{build_report_from_snapshot, ReportModel, SuiteReport};
use crate::store::MetricStore;
use crate::summary::WidgetData;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Timings observed for one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingSample {
    pub timings: StepTimings,
    pub from_cache: bool,
}

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("timing source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed timing payload: {0}")]
    Malformed(String),
}

/// Producer of navigation timings, typically backed by a browser session
#[async_trait]
pub trait TimingSource: Send {
    /// Sample timings for the step that just finished
    ///
    /// `Ok(None)` means the page did not change since the previous sample
    /// and nothing should be recorded.
    async fn sample(&mut self) -> std::result::Result<Option<TimingSample>, SampleError>;
}

/// What the runner knows about the scenario a step belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepContext {
    pub scenario_name: String,
    pub feature_uri: String,
    pub tags: Vec<String>,
}

impl StepContext {
    pub fn new(scenario_name: impl Into<String>, feature_uri: impl Into<String>) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            feature_uri: feature_uri.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// True when the scenario carries one of the opt-out tags
    pub fn skips_tracking(&self) -> bool {
        self.tags.iter().any(|tag| {
            crate::defaults::SKIP_TAGS
                .iter()
                .any(|skip| tag.eq_ignore_ascii_case(skip))
        })
    }

    pub fn feature_name(&self) -> String {
        feature_name_from_uri(&self.feature_uri)
    }
}

/// Derive a feature name from a feature file URI
///
/// `file:///specs/checkout/cart.feature` becomes `cart`.
pub fn feature_name_from_uri(uri: &str) -> String {
    let file = uri.rsplit('/').next().unwrap_or(uri);
    file.strip_suffix(".feature").unwrap_or(file).to_string()
}

/// Result of an `after_step` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The scenario opted out of tracking
    Skipped,
    /// The source reported no page change
    Unchanged,
    /// A record with this step label was stored
    Recorded(String),
    /// The source failed; nothing was stored
    SampleFailed,
}

/// Per-scenario step trigger
///
/// Create one per running scenario; many trackers may share one store.
pub struct StepTracker {
    store: Arc<MetricStore>,
    settle_delay: Duration,
    step_counter: usize,
}

impl StepTracker {
    pub fn new(store: Arc<MetricStore>) -> Self {
        Self {
            store,
            settle_delay: crate::defaults::SETTLE_DELAY,
            step_counter: 0,
        }
    }

    /// Override the pause between the end of a step and sampling
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn steps_started(&self) -> usize {
        self.step_counter
    }

    /// Called before each step; advances the step counter
    pub fn before_step(&mut self, ctx: &StepContext) {
        if ctx.skips_tracking() {
            return;
        }
        self.step_counter += 1;
    }

    /// Called after each step; failures are logged, never returned
    pub async fn after_step<S>(&mut self, ctx: &StepContext, source: &mut S) -> StepOutcome
    where
        S: TimingSource + ?Sized,
    {
        match self.try_after_step(ctx, source).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    "Performance sampling failed for '{}' step #{}: {}",
                    ctx.scenario_name, self.step_counter, e
                );
                StepOutcome::SampleFailed
            }
        }
    }

    /// Like [`StepTracker::after_step`] but propagates sampling errors
    pub async fn try_after_step<S>(
        &mut self,
        ctx: &StepContext,
        source: &mut S,
    ) -> Result<StepOutcome>
    where
        S: TimingSource + ?Sized,
    {
        if ctx.skips_tracking() {
            return Ok(StepOutcome::Skipped);
        }

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let Some(sample) = source.sample().await? else {
            debug!(
                "No page change after '{}' step #{}",
                ctx.scenario_name, self.step_counter
            );
            return Ok(StepOutcome::Unchanged);
        };

        let label = format!("Step #{}", self.step_counter);
        self.store.record(MetricRecord::new(
            label.clone(),
            ctx.scenario_name.clone(),
            ctx.feature_name(),
            sample.timings,
            sample.from_cache,
        ));
        debug!(
            "Recorded {} for '{}': page load {} ms",
            label, ctx.scenario_name, sample.timings.page_load
        );

        Ok(StepOutcome::Recorded(label))
    }
}

impl From<SampleError> for PerfError {
    fn from(e: SampleError) -> Self {
        PerfError::Sample(e.to_string())
    }
}

/// Result of a finalize call
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    /// The report was built and all outputs written
    Finalized(SuiteReport),
    /// The store was empty; the latch stays open for a later attempt
    NoData,
    /// An earlier call already finalized this run
    AlreadyFinalized,
    /// Another call is finalizing right now; its result is not known yet
    InProgress,
}

const LATCH_OPEN: u8 = 0;
const LATCH_RUNNING: u8 = 1;
const LATCH_DONE: u8 = 2;

/// Suite-end trigger owning the one-shot report latch
pub struct SuiteFinalizer {
    policy: ClassifierPolicy,
    export_path: Option<PathBuf>,
    widget_dir: Option<PathBuf>,
    latch: AtomicU8,
}

impl SuiteFinalizer {
    pub fn new(policy: ClassifierPolicy) -> Self {
        Self {
            policy,
            export_path: None,
            widget_dir: None,
            latch: AtomicU8::new(LATCH_OPEN),
        }
    }

    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = Some(path.into());
        self
    }

    pub fn with_widget_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.widget_dir = Some(dir.into());
        self
    }

    pub fn is_finalized(&self) -> bool {
        self.latch.load(Ordering::Acquire) == LATCH_DONE
    }

    /// Build the report and write outputs, at most once per finalizer
    ///
    /// If the store is empty or writing fails the latch is released so a
    /// later call can retry. A call made while another one is still running
    /// returns [`FinalizeOutcome::InProgress`] rather than claiming success,
    /// since the running call may yet fail.
    pub fn finalize(&self, store: &MetricStore) -> Result<FinalizeOutcome> {
        match self.latch.compare_exchange(
            LATCH_OPEN,
            LATCH_RUNNING,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {}
            Err(LATCH_DONE) => {
                debug!("Suite report already generated, skipping");
                return Ok(FinalizeOutcome::AlreadyFinalized);
            }
            Err(_) => {
                debug!("Suite report generation in progress, skipping");
                return Ok(FinalizeOutcome::InProgress);
            }
        }

        info!("Generating suite performance report...");
        let result = self.finalize_inner(store);
        let next = match &result {
            Ok(FinalizeOutcome::Finalized(_)) => LATCH_DONE,
            _ => LATCH_OPEN,
        };
        self.latch.store(next, Ordering::Release);
        result
    }

    fn finalize_inner(&self, store: &MetricStore) -> Result<FinalizeOutcome> {
        let snapshot = store.snapshot();
        let report = match build_report_from_snapshot(store.run_id(), &snapshot, &self.policy) {
            ReportModel::NoData => {
                warn!("No performance metrics collected");
                return Ok(FinalizeOutcome::NoData);
            }
            ReportModel::Collected(report) => report,
        };

        if let Some(ref path) = self.export_path {
            MetricsExport::from_snapshot(&snapshot).write_to(path)?;
        }

        if let Some(ref dir) = self.widget_dir {
            WidgetData::from_suite(&report).write_to_dir(dir)?;
        }

        info!("Suite performance report generated");
        info!("   Total Steps: {}", report.stats.total_steps);
        info!("   Total Scenarios: {}", report.total_scenarios);
        if let Some(page_load) = report.stats.mean(crate::record::TimingField::PageLoad) {
            info!("   Avg Page Load: {:.0} ms", page_load);
        }
        info!("   Overall: {}", report.stats.overall);

        Ok(FinalizeOutcome::Finalized(report))
    }
}
