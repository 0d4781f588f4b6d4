//! # Stepwise Performance Library
//!
//! Collects per-step page timing samples from UI test runs, aggregates them
//! per scenario and per suite, classifies the averages against thresholds
//! and exports the result as JSON.
//!
//! ## Architecture Overview
//!
//! The library is organized into several key modules:
//!
//! - `record`: One timing sample per test step
//! - `store`: Thread-safe store grouping records by scenario
//! - `aggregate`: Means over a set of records, with an explicit no-data result
//! - `classify`: Threshold verdicts and the suite-level rule
//! - `report`: Typed report model built from a store snapshot
//! - `export`: JSON export of a whole run, readable back into a store
//! - `summary`: Text summary, scenario and step tables, widget JSON
//! - `trigger`: Step tracking and one-shot suite finalization
//! - `cli`: Command-line interface parsing and configuration management
//! - `utils`: Formatting helpers and run identifiers
//!
//! ## Usage Example
//!
//! ```rust
//! use stepwise_perf::{
//!     build_report, ClassifierPolicy, MetricRecord, MetricStore, StepTimings, Verdict,
//! };
//!
//! let store = MetricStore::new();
//! for page_load in [1000, 1500, 2000] {
//!     store.record(MetricRecord::new(
//!         "Step #1",
//!         "Login",
//!         "auth",
//!         StepTimings::page_load_only(page_load),
//!         false,
//!     ));
//! }
//!
//! let report = build_report(&store, &ClassifierPolicy::default());
//! let login = report.suite().and_then(|suite| suite.scenario("Login")).unwrap();
//! assert_eq!(login.stats.overall, Verdict::Pass);
//! ```
//!
//! ## Concurrency
//!
//! Writers call [`MetricStore::record`] from any number of threads. A record
//! becomes visible in the suite-wide list and in its scenario bucket at the
//! same instant, so readers never observe one without the other.

/// Suite and scenario aggregation
///
/// Computes per-field means with exact integer sums. An empty input yields
/// `Aggregate::NoData`, which is never confused with all-zero timings.
pub mod aggregate;

/// Verdicts, thresholds and the overall-verdict rule
pub mod classify;

/// Command-line interface and configuration
///
/// Provides argument parsing using clap and converts CLI options into the
/// `ReportConfig` used by the binary.
pub mod cli;

pub mod error;

/// JSON export of a run
///
/// Writes `totalMetrics`, `suiteAverages`, `allMetrics` and
/// `scenarioMetrics`, and reads an export back into a fresh store.
pub mod export;

pub mod logging;

/// Step timing records
pub mod record;

/// Report model assembly
///
/// Builds the typed `ReportModel` from a store snapshot: suite statistics,
/// features, scenarios and per-step classified values.
pub mod report;

/// Thread-safe metric store
///
/// Records are appended under a single write lock that updates the
/// suite-wide list and the scenario bucket together. Reads return cheap
/// snapshots of shared record pointers.
pub mod store;

pub mod summary;

/// Step and suite lifecycle hooks
///
/// `StepTracker` turns test-runner step events into records; `SuiteFinalizer`
/// builds and persists the report exactly once per run.
pub mod trigger;

pub mod utils;

// Re-export key types for convenient library usage

pub use aggregate::{aggregate, Aggregate, AggregateStats};
pub use classify::{
    classify, overall_verdict, ClassifierPolicy, FieldThresholds, Thresholds, Verdict,
};
pub use cli::{Args, ReportConfig};
pub use error::{PerfError, Result};
pub use export::MetricsExport;
pub use record::{MetricRecord, StepTimings, TimingField};
pub use report::{build_report, ReportModel, ScenarioReport, ScenarioSummary, SuiteReport};
pub use store::{MetricStore, StoreSnapshot};
pub use summary::{render_scenario_table, render_step_table, render_suite_summary, WidgetData};
pub use trigger::{
    FinalizeOutcome, StepContext, StepOutcome, StepTracker, SuiteFinalizer, TimingSample,
    TimingSource,
};

/// The current version of the library
///
/// Populated from Cargo.toml and printed by the binary at startup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
///
/// Every value here can be overridden: thresholds from a JSON file, the
/// required pass count through `ClassifierPolicy` or `--required-passes`,
/// and the settle delay through `StepTracker::with_settle_delay`.
pub mod defaults {
    use std::time::Duration;

    /// Number of passing fields needed for an overall `Pass`
    ///
    /// Four of the six timing fields must be within their good threshold.
    /// The count is absolute, not a fraction of the fields classified.
    pub const REQUIRED_PASSES: usize = 4;

    /// Time allowed for the page to settle before timings are sampled
    pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

    /// Bucket for records with an empty scenario name
    pub const UNKNOWN_SCENARIO: &str = "unknown";

    /// Feature name used when a record carries none
    pub const UNKNOWN_FEATURE: &str = "Unknown Suite";

    /// Scenario tags that disable tracking, compared case-insensitively
    pub const SKIP_TAGS: [&str; 3] = ["@skip-performance", "@skipperformance", "@no-performance"];

    /// Default export file name
    pub const EXPORT_FILE: &str = "performance-metrics.json";

    /// Widget data file written into the widget directory
    pub const WIDGET_FILE: &str = "performance-widget.json";

    pub const WIDGET_NAME: &str = "performance";

    /// Good/poor threshold pairs in milliseconds
    ///
    /// A mean at or below `good` passes, at or below `poor` warns, and
    /// anything above `poor` fails.
    pub mod thresholds {
        use crate::classify::Thresholds;

        pub const PAGE_LOAD: Thresholds = Thresholds::new(2000.0, 3000.0);
        pub const DOM_READY: Thresholds = Thresholds::new(1500.0, 2500.0);
        pub const RESPONSE: Thresholds = Thresholds::new(800.0, 1200.0);
        pub const TTFB: Thresholds = Thresholds::new(400.0, 600.0);
        pub const CONNECT: Thresholds = Thresholds::new(200.0, 400.0);
        pub const DNS_LOOKUP: Thresholds = Thresholds::new(100.0, 200.0);
    }
}
