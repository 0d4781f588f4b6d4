//! # Metrics Export
//!
//! Full-fidelity JSON export of a run: every stored record plus the suite
//! averages. Top-level keys, in order:
//!
//! - `totalMetrics`: number of records
//! - `suiteAverages`: `avgPageLoadTime` ... `avgDomainLookupTime`,
//!   `totalSteps`, `cachedSteps`; `{}` when nothing was collected
//! - `allMetrics`: every record in commit order
//! - `scenarioMetrics`: scenario name to records, in first-appearance order
//!
//! An export can be read back and replayed into a fresh [`MetricStore`] so a
//! finished run can be re-rendered with different thresholds.

use crate::aggregate::{aggregate, AggregateStats};
use crate::error::{PerfError, Result};
use crate::record::{MetricRecord, TimingField};
use crate::store::{MetricStore, StoreSnapshot};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Suite means as written to `suiteAverages`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageValues {
    pub avg_page_load_time: f64,
    pub avg_dom_ready_time: f64,
    pub avg_response_time: f64,
    pub avg_ttfb: f64,
    pub avg_connect_time: f64,
    pub avg_domain_lookup_time: f64,
    #[serde(deserialize_with = "count_from_number")]
    pub total_steps: usize,
    #[serde(deserialize_with = "count_from_number")]
    pub cached_steps: usize,
}

/// Accept counts written as integers or as integral floats (`3.0`)
fn count_from_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<usize, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value < 0.0 || value.fract() != 0.0 || value > usize::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative whole count, found {}",
            value
        )));
    }
    Ok(value as usize)
}

impl AverageValues {
    pub fn mean(&self, field: TimingField) -> f64 {
        match field {
            TimingField::PageLoad => self.avg_page_load_time,
            TimingField::DomReady => self.avg_dom_ready_time,
            TimingField::Response => self.avg_response_time,
            TimingField::TimeToFirstByte => self.avg_ttfb,
            TimingField::Connect => self.avg_connect_time,
            TimingField::DnsLookup => self.avg_domain_lookup_time,
        }
    }
}

impl From<&AggregateStats> for AverageValues {
    fn from(stats: &AggregateStats) -> Self {
        Self {
            avg_page_load_time: stats.mean(TimingField::PageLoad),
            avg_dom_ready_time: stats.mean(TimingField::DomReady),
            avg_response_time: stats.mean(TimingField::Response),
            avg_ttfb: stats.mean(TimingField::TimeToFirstByte),
            avg_connect_time: stats.mean(TimingField::Connect),
            avg_domain_lookup_time: stats.mean(TimingField::DnsLookup),
            total_steps: stats.total_steps,
            cached_steps: stats.cached_steps,
        }
    }
}

/// `suiteAverages` value; serializes to `{}` when there is no data
///
/// Only an empty map reads back as `NoData`. A non-empty map must parse as
/// [`AverageValues`] or deserialization fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SuiteAverages {
    Collected(AverageValues),
    NoData {},
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EmptyAverages {}

#[derive(Deserialize)]
#[serde(untagged)]
enum SuiteAveragesRepr {
    Empty(EmptyAverages),
    Collected(AverageValues),
}

impl<'de> Deserialize<'de> for SuiteAverages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match SuiteAveragesRepr::deserialize(deserializer) {
            Ok(SuiteAveragesRepr::Empty(_)) => Ok(SuiteAverages::NoData {}),
            Ok(SuiteAveragesRepr::Collected(values)) => Ok(SuiteAverages::Collected(values)),
            Err(_) => Err(serde::de::Error::custom(
                "suiteAverages must be empty or carry every average and count",
            )),
        }
    }
}

impl SuiteAverages {
    pub fn values(&self) -> Option<&AverageValues> {
        match self {
            SuiteAverages::Collected(values) => Some(values),
            SuiteAverages::NoData {} => None,
        }
    }
}

/// Scenario buckets keyed by name, preserving first-appearance order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioMetrics(Vec<(String, Vec<Arc<MetricRecord>>)>);

impl ScenarioMetrics {
    pub fn get(&self, name: &str) -> Option<&[Arc<MetricRecord>]> {
        self.0
            .iter()
            .find(|(bucket, _)| bucket == name)
            .map(|(_, records)| records.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ScenarioMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, records) in &self.0 {
            map.serialize_entry(name, records)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ScenarioMetrics {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = ScenarioMetrics;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of scenario name to metric records")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut buckets = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, records)) = access.next_entry()? {
                    buckets.push((name, records));
                }
                Ok(ScenarioMetrics(buckets))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Serialized form of a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsExport {
    pub total_metrics: usize,
    pub suite_averages: SuiteAverages,
    pub all_metrics: Vec<Arc<MetricRecord>>,
    pub scenario_metrics: ScenarioMetrics,
}

impl MetricsExport {
    pub fn from_store(store: &MetricStore) -> Self {
        Self::from_snapshot(&store.snapshot())
    }

    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Self {
        let suite_averages = match aggregate(snapshot.all()).stats() {
            Some(stats) => SuiteAverages::Collected(AverageValues::from(stats)),
            None => SuiteAverages::NoData {},
        };

        let scenario_metrics = ScenarioMetrics(
            snapshot
                .scenarios()
                .map(|(name, records)| (name.to_string(), records.to_vec()))
                .collect(),
        );

        Self {
            total_metrics: snapshot.len(),
            suite_averages,
            all_metrics: snapshot.all().to_vec(),
            scenario_metrics,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the export as indented JSON, creating parent directories
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PerfError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = self.to_json_pretty()?;
        std::fs::write(path, json).map_err(|source| PerfError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Performance metrics exported to: {:?}", path);
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PerfError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse an export from its JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let export: Self = serde_json::from_str(content)?;
        debug!(
            "Parsed export with {} records across {} scenarios",
            export.all_metrics.len(),
            export.scenario_metrics.len()
        );
        Ok(export)
    }

    /// Replay every exported record into a new store
    pub fn into_store(self) -> MetricStore {
        let store = MetricStore::new();
        for record in self.all_metrics {
            store.record(Arc::try_unwrap(record).unwrap_or_else(|shared| (*shared).clone()));
        }
        store
    }
}
