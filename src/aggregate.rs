//! # Aggregation
//!
//! Pure computation of per-field means over a set of step records. The
//! aggregator holds no state and never touches the store; callers pass a
//! snapshot slice.
//!
//! An empty input produces [`Aggregate::NoData`], which presenters must
//! render as "no metrics collected" rather than as zero timings.

use crate::record::{MetricRecord, TimingField};
use serde::Serialize;

/// Mean and sample count of one timing field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldStats {
    pub field: TimingField,
    pub mean: f64,
    pub count: usize,
}

/// Statistics computed from a non-empty record set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    fields: [FieldStats; TimingField::COUNT],
    pub total_steps: usize,
    pub cached_steps: usize,
}

impl AggregateStats {
    pub fn field(&self, field: TimingField) -> &FieldStats {
        &self.fields[field.index()]
    }

    pub fn mean(&self, field: TimingField) -> f64 {
        self.field(field).mean
    }

    /// Per-field statistics in canonical field order
    pub fn fields(&self) -> &[FieldStats] {
        &self.fields
    }

    /// Share of steps served from cache, in percent
    pub fn cache_hit_rate(&self) -> f64 {
        self.cached_steps as f64 / self.total_steps as f64 * 100.0
    }
}

/// Result of aggregating a record set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "stats", rename_all = "camelCase")]
pub enum Aggregate {
    /// No records were supplied
    NoData,
    Collected(AggregateStats),
}

impl Aggregate {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Aggregate::NoData)
    }

    pub fn stats(&self) -> Option<&AggregateStats> {
        match self {
            Aggregate::NoData => None,
            Aggregate::Collected(stats) => Some(stats),
        }
    }

    pub fn into_stats(self) -> Option<AggregateStats> {
        match self {
            Aggregate::NoData => None,
            Aggregate::Collected(stats) => Some(stats),
        }
    }

    pub fn mean(&self, field: TimingField) -> Option<f64> {
        self.stats().map(|stats| stats.mean(field))
    }
}

/// Compute per-field means, step count and cached-step count
///
/// Sums are accumulated exactly in `i128`, so the result depends only on
/// the multiset of records and not on their order.
pub fn aggregate<R: AsRef<MetricRecord>>(records: &[R]) -> Aggregate {
    if records.is_empty() {
        return Aggregate::NoData;
    }

    let mut sums = [0i128; TimingField::COUNT];
    let mut cached_steps = 0;

    for record in records {
        let record = record.as_ref();
        for field in TimingField::ALL {
            sums[field.index()] += i128::from(record.value(field));
        }
        if record.from_cache() {
            cached_steps += 1;
        }
    }

    let count = records.len();
    let fields = TimingField::ALL.map(|field| FieldStats {
        field,
        mean: sums[field.index()] as f64 / count as f64,
        count,
    });

    Aggregate::Collected(AggregateStats {
        fields,
        total_steps: count,
        cached_steps,
    })
}
