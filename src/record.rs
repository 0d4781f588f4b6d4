//! # Step Metric Records
//!
//! A [`MetricRecord`] is one measured test step: six navigation timings in
//! milliseconds, whether the page came from cache, and the scenario and
//! feature it belongs to. Records are immutable once built and are shared
//! between the store's indexes as `Arc<MetricRecord>`.
//!
//! Timing values are `i64` and are never validated. A record with all-zero
//! timings represents an untracked or instant step; negative values are
//! kept as delivered by the timing source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The six navigation timing fields tracked per step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimingField {
    PageLoad,
    DomReady,
    Response,
    TimeToFirstByte,
    Connect,
    DnsLookup,
}

impl TimingField {
    /// All fields in canonical report order
    pub const ALL: [TimingField; 6] = [
        TimingField::PageLoad,
        TimingField::DomReady,
        TimingField::Response,
        TimingField::TimeToFirstByte,
        TimingField::Connect,
        TimingField::DnsLookup,
    ];

    /// Number of standard fields
    pub const COUNT: usize = Self::ALL.len();

    /// Short human-readable label used by presenters
    pub fn label(&self) -> &'static str {
        match self {
            TimingField::PageLoad => "Page Load",
            TimingField::DomReady => "DOM Ready",
            TimingField::Response => "Response",
            TimingField::TimeToFirstByte => "TTFB",
            TimingField::Connect => "Connect",
            TimingField::DnsLookup => "DNS Lookup",
        }
    }

    /// Key of the field's mean in the exported `suiteAverages` mapping
    pub fn average_key(&self) -> &'static str {
        match self {
            TimingField::PageLoad => "avgPageLoadTime",
            TimingField::DomReady => "avgDomReadyTime",
            TimingField::Response => "avgResponseTime",
            TimingField::TimeToFirstByte => "avgTtfb",
            TimingField::Connect => "avgConnectTime",
            TimingField::DnsLookup => "avgDomainLookupTime",
        }
    }

    /// Position of the field in [`TimingField::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for TimingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Raw timings delivered by a timing source for a single step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTimings {
    pub page_load: i64,
    pub dom_ready: i64,
    pub response: i64,
    pub ttfb: i64,
    pub connect: i64,
    pub dns_lookup: i64,
}

impl StepTimings {
    /// Timings with only page load set, everything else zero
    pub fn page_load_only(page_load: i64) -> Self {
        Self {
            page_load,
            ..Self::default()
        }
    }

    pub fn get(&self, field: TimingField) -> i64 {
        match field {
            TimingField::PageLoad => self.page_load,
            TimingField::DomReady => self.dom_ready,
            TimingField::Response => self.response,
            TimingField::TimeToFirstByte => self.ttfb,
            TimingField::Connect => self.connect,
            TimingField::DnsLookup => self.dns_lookup,
        }
    }
}

/// One measured step
///
/// Field names on the wire follow the export format consumed by report
/// dashboards (`stepName`, `pageLoadTime`, ..., `timestamp` in epoch
/// milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(rename = "stepName")]
    step_label: String,
    #[serde(rename = "pageLoadTime")]
    page_load: i64,
    #[serde(rename = "domReadyTime")]
    dom_ready: i64,
    #[serde(rename = "responseTime")]
    response: i64,
    #[serde(rename = "ttfb")]
    ttfb: i64,
    #[serde(rename = "connectTime")]
    connect: i64,
    #[serde(rename = "domainLookupTime")]
    dns_lookup: i64,
    #[serde(rename = "fromCache")]
    from_cache: bool,
    #[serde(rename = "scenarioName")]
    scenario_name: String,
    #[serde(rename = "featureName")]
    feature_name: String,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    captured_at: DateTime<Utc>,
}

impl MetricRecord {
    /// Build a record stamped with the current wall clock
    pub fn new(
        step_label: impl Into<String>,
        scenario_name: impl Into<String>,
        feature_name: impl Into<String>,
        timings: StepTimings,
        from_cache: bool,
    ) -> Self {
        Self::with_capture_time(
            step_label,
            scenario_name,
            feature_name,
            timings,
            from_cache,
            Utc::now(),
        )
    }

    /// Build a record with an explicit capture time
    pub fn with_capture_time(
        step_label: impl Into<String>,
        scenario_name: impl Into<String>,
        feature_name: impl Into<String>,
        timings: StepTimings,
        from_cache: bool,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            step_label: step_label.into(),
            page_load: timings.page_load,
            dom_ready: timings.dom_ready,
            response: timings.response,
            ttfb: timings.ttfb,
            connect: timings.connect,
            dns_lookup: timings.dns_lookup,
            from_cache,
            scenario_name: scenario_name.into(),
            feature_name: feature_name.into(),
            captured_at,
        }
    }

    pub fn step_label(&self) -> &str {
        &self.step_label
    }

    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    pub fn feature_name(&self) -> &str {
        &self.feature_name
    }

    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn timings(&self) -> StepTimings {
        StepTimings {
            page_load: self.page_load,
            dom_ready: self.dom_ready,
            response: self.response,
            ttfb: self.ttfb,
            connect: self.connect,
            dns_lookup: self.dns_lookup,
        }
    }

    /// Value of a single timing field in milliseconds
    pub fn value(&self, field: TimingField) -> i64 {
        self.timings().get(field)
    }

    /// Scenario bucket this record is filed under
    ///
    /// An empty scenario name maps to [`crate::defaults::UNKNOWN_SCENARIO`].
    pub fn scenario_key(&self) -> &str {
        scenario_key(&self.scenario_name)
    }

    /// Feature group this record is presented under
    ///
    /// An empty feature name maps to [`crate::defaults::UNKNOWN_FEATURE`].
    pub fn feature_key(&self) -> &str {
        if self.feature_name.is_empty() {
            crate::defaults::UNKNOWN_FEATURE
        } else {
            &self.feature_name
        }
    }
}

impl AsRef<MetricRecord> for MetricRecord {
    fn as_ref(&self) -> &MetricRecord {
        self
    }
}

/// Map a raw scenario name to its store bucket key
///
/// A scenario literally named `unknown` shares the bucket of unnamed ones.
pub(crate) fn scenario_key(name: &str) -> &str {
    if name.is_empty() {
        crate::defaults::UNKNOWN_SCENARIO
    } else {
        name
    }
}
