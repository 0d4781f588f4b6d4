//! # Report Model
//!
//! Assembles the presenter-agnostic [`ReportModel`] from one store snapshot:
//!
//! ```text
//! suite
//! ├── per-field averages + verdicts, overall verdict
//! └── feature (first-appearance order)
//!     └── scenario (first-appearance order)
//!         ├── per-field averages + verdicts, overall verdict
//!         └── step rows with per-field verdicts
//! ```
//!
//! Assembly is read-only with respect to the store and deterministic: two
//! calls on an unchanged store produce equal models. The model carries no
//! wall-clock timestamp for that reason.

use crate::aggregate::{aggregate, Aggregate, AggregateStats};
use crate::classify::{ClassifierPolicy, Verdict};
use crate::record::{MetricRecord, TimingField};
use crate::store::{MetricStore, StoreSnapshot};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A field's average together with its classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    pub field: TimingField,
    pub mean: f64,
    pub count: usize,
    pub good_threshold: f64,
    pub poor_threshold: f64,
    pub verdict: Verdict,
}

/// Classified averages for a record set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedStats {
    pub total_steps: usize,
    pub cached_steps: usize,
    pub cache_hit_rate: f64,
    pub fields: Vec<FieldSummary>,
    pub passed_fields: usize,
    pub overall: Verdict,
}

impl ClassifiedStats {
    fn classify(stats: &AggregateStats, policy: &ClassifierPolicy) -> Self {
        let fields: Vec<FieldSummary> = stats
            .fields()
            .iter()
            .map(|fs| {
                let thresholds = policy.thresholds.get(fs.field);
                FieldSummary {
                    field: fs.field,
                    mean: fs.mean,
                    count: fs.count,
                    good_threshold: thresholds.good,
                    poor_threshold: thresholds.poor,
                    verdict: thresholds.classify(fs.mean),
                }
            })
            .collect();

        let verdicts: Vec<Verdict> = fields.iter().map(|f| f.verdict).collect();
        Self {
            total_steps: stats.total_steps,
            cached_steps: stats.cached_steps,
            cache_hit_rate: stats.cache_hit_rate(),
            passed_fields: verdicts.iter().filter(|v| v.is_pass()).count(),
            overall: policy.overall(&verdicts),
            fields,
        }
    }

    pub fn field(&self, field: TimingField) -> Option<&FieldSummary> {
        self.fields.iter().find(|f| f.field == field)
    }

    pub fn mean(&self, field: TimingField) -> Option<f64> {
        self.field(field).map(|f| f.mean)
    }

    pub fn verdict(&self, field: TimingField) -> Option<Verdict> {
        self.field(field).map(|f| f.verdict)
    }
}

/// One timing value of a step with its classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepValue {
    pub field: TimingField,
    pub value: i64,
    pub verdict: Verdict,
}

/// A single step row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    /// 1-based position within the scenario
    pub index: usize,
    pub label: String,
    pub values: Vec<StepValue>,
    pub from_cache: bool,
}

impl StepReport {
    fn from_record(index: usize, record: &MetricRecord, policy: &ClassifierPolicy) -> Self {
        let values = TimingField::ALL
            .iter()
            .map(|&field| {
                let value = record.value(field);
                StepValue {
                    field,
                    value,
                    verdict: policy.classify(field, value as f64),
                }
            })
            .collect();

        Self {
            index,
            label: record.step_label().to_string(),
            values,
            from_cache: record.from_cache(),
        }
    }

    pub fn value(&self, field: TimingField) -> Option<&StepValue> {
        self.values.iter().find(|v| v.field == field)
    }
}

/// Statistics over every record sharing a scenario name, across features
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub name: String,
    pub stats: ClassifiedStats,
}

/// Steps of one scenario within one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub name: String,
    pub feature: String,
    pub stats: ClassifiedStats,
    pub steps: Vec<StepReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureReport {
    pub name: String,
    pub step_count: usize,
    pub scenarios: Vec<ScenarioReport>,
}

/// Suite-level report over every collected step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteReport {
    pub run_id: String,
    pub total_scenarios: usize,
    pub total_features: usize,
    pub stats: ClassifiedStats,
    /// One entry per distinct scenario name, in first-appearance order
    pub scenario_summaries: Vec<ScenarioSummary>,
    pub features: Vec<FeatureReport>,
}

impl SuiteReport {
    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.features.iter().flat_map(|f| f.scenarios.iter())
    }

    /// First feature-level entry for `name`
    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios().find(|s| s.name == name)
    }

    /// Statistics over every step of scenario `name`, whatever its feature
    pub fn scenario_summary(&self, name: &str) -> Option<&ScenarioSummary> {
        self.scenario_summaries.iter().find(|s| s.name == name)
    }
}

/// Report handed to presenters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "report", rename_all = "camelCase")]
pub enum ReportModel {
    /// The store held no records; render as "no metrics collected"
    NoData,
    Collected(SuiteReport),
}

impl ReportModel {
    pub fn is_no_data(&self) -> bool {
        matches!(self, ReportModel::NoData)
    }

    pub fn suite(&self) -> Option<&SuiteReport> {
        match self {
            ReportModel::NoData => None,
            ReportModel::Collected(report) => Some(report),
        }
    }

    /// Overall suite verdict, `None` when nothing was collected
    pub fn overall(&self) -> Option<Verdict> {
        self.suite().map(|s| s.stats.overall)
    }
}

/// Build the report from the store's current contents
pub fn build_report(store: &MetricStore, policy: &ClassifierPolicy) -> ReportModel {
    let snapshot = store.snapshot();
    build_report_from_snapshot(store.run_id(), &snapshot, policy)
}

/// Build the report from an already captured snapshot
pub fn build_report_from_snapshot(
    run_id: &str,
    snapshot: &StoreSnapshot,
    policy: &ClassifierPolicy,
) -> ReportModel {
    let suite_stats = match aggregate(snapshot.all()) {
        Aggregate::NoData => {
            debug!("No records in snapshot, report has no data");
            return ReportModel::NoData;
        }
        Aggregate::Collected(stats) => stats,
    };

    let scenario_summaries: Vec<ScenarioSummary> = snapshot
        .scenarios()
        .filter_map(|(name, records)| {
            let stats = aggregate(records).into_stats()?;
            Some(ScenarioSummary {
                name: name.to_string(),
                stats: ClassifiedStats::classify(&stats, policy),
            })
        })
        .collect();

    let features: Vec<FeatureReport> = group_by_feature(snapshot.all())
        .into_iter()
        .map(|(feature, scenarios)| {
            let scenarios: Vec<ScenarioReport> = scenarios
                .into_iter()
                .filter_map(|(name, records)| scenario_report(&feature, &name, &records, policy))
                .collect();
            FeatureReport {
                step_count: scenarios.iter().map(|s| s.steps.len()).sum(),
                name: feature,
                scenarios,
            }
        })
        .collect();

    let report = SuiteReport {
        run_id: run_id.to_string(),
        total_scenarios: snapshot.scenario_count(),
        total_features: features.len(),
        stats: ClassifiedStats::classify(&suite_stats, policy),
        scenario_summaries,
        features,
    };

    debug!(
        "Built report: {} steps, {} scenarios, {} features, overall {}",
        report.stats.total_steps, report.total_scenarios, report.total_features, report.stats.overall
    );

    ReportModel::Collected(report)
}

type ScenarioGroup = (String, Vec<Arc<MetricRecord>>);

/// Split records into feature → scenario groups, both in first-appearance
/// order. A scenario name used by two features yields one group per feature.
fn group_by_feature(records: &[Arc<MetricRecord>]) -> Vec<(String, Vec<ScenarioGroup>)> {
    let mut features: Vec<(String, Vec<ScenarioGroup>)> = Vec::new();
    let mut feature_slots: HashMap<&str, usize> = HashMap::new();
    let mut scenario_slots: HashMap<(usize, &str), usize> = HashMap::new();

    for record in records {
        let feature_key = record.feature_key();
        let feature_slot = *feature_slots.entry(feature_key).or_insert_with(|| {
            features.push((feature_key.to_string(), Vec::new()));
            features.len() - 1
        });

        let scenarios = &mut features[feature_slot].1;
        let scenario_key = record.scenario_key();
        let scenario_slot = *scenario_slots
            .entry((feature_slot, scenario_key))
            .or_insert_with(|| {
                scenarios.push((scenario_key.to_string(), Vec::new()));
                scenarios.len() - 1
            });
        scenarios[scenario_slot].1.push(Arc::clone(record));
    }

    features
}

/// Classified report for the steps of one scenario within one feature
fn scenario_report(
    feature: &str,
    name: &str,
    records: &[Arc<MetricRecord>],
    policy: &ClassifierPolicy,
) -> Option<ScenarioReport> {
    let stats = aggregate(records).into_stats()?;

    let steps = records
        .iter()
        .enumerate()
        .map(|(i, record)| StepReport::from_record(i + 1, record, policy))
        .collect();

    Some(ScenarioReport {
        name: name.to_string(),
        feature: feature.to_string(),
        stats: ClassifiedStats::classify(&stats, policy),
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{FieldThresholds, Thresholds};
    use crate::record::StepTimings;

    fn fast_timings(page_load: i64) -> StepTimings {
        StepTimings {
            page_load,
            dom_ready: 900,
            response: 300,
            ttfb: 150,
            connect: 40,
            dns_lookup: 10,
        }
    }

    fn record(scenario: &str, feature: &str, label: &str, timings: StepTimings) -> MetricRecord {
        MetricRecord::new(label, scenario, feature, timings, false)
    }

    #[test]
    fn test_empty_store_is_no_data() {
        let store = MetricStore::new();
        let report = build_report(&store, &ClassifierPolicy::default());

        assert_eq!(report, ReportModel::NoData);
        assert_eq!(report.overall(), None);
    }

    #[test]
    fn test_login_scenario_end_to_end() {
        let store = MetricStore::new();
        for (i, page_load) in [1000, 1500, 2000].into_iter().enumerate() {
            store.record(record(
                "Login",
                "auth",
                &format!("Step #{}", i + 1),
                StepTimings::page_load_only(page_load),
            ));
        }

        let report = build_report(&store, &ClassifierPolicy::default());
        let suite = report.suite().unwrap();
        let login = suite.scenario("Login").unwrap();

        assert_eq!(login.stats.mean(TimingField::PageLoad), Some(1500.0));
        assert_eq!(login.stats.verdict(TimingField::PageLoad), Some(Verdict::Pass));
        assert_eq!(login.stats.passed_fields, 6);
        assert_eq!(login.stats.overall, Verdict::Pass);
        assert_eq!(login.steps.len(), 3);
        assert_eq!(login.steps[2].index, 3);
        assert_eq!(login.steps[2].label, "Step #3");
    }

    #[test]
    fn test_features_group_scenarios_in_first_appearance_order() {
        let store = MetricStore::new();
        store.record(record("Search", "catalog", "Step #1", fast_timings(1000)));
        store.record(record("Login", "auth", "Step #1", fast_timings(1000)));
        store.record(record("Browse", "catalog", "Step #1", fast_timings(1000)));
        store.record(record("Search", "catalog", "Step #2", fast_timings(1000)));

        let report = build_report(&store, &ClassifierPolicy::default());
        let suite = report.suite().unwrap();

        let feature_names: Vec<&str> = suite.features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(feature_names, vec!["catalog", "auth"]);

        let catalog: Vec<&str> = suite.features[0]
            .scenarios
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(catalog, vec!["Search", "Browse"]);
        assert_eq!(suite.features[0].step_count, 3);
        assert_eq!(suite.total_scenarios, 3);
        assert_eq!(suite.total_features, 2);
    }

    #[test]
    fn test_shared_scenario_name_keeps_both_features() {
        let store = MetricStore::new();
        store.record(record("Login", "auth", "Step #1", fast_timings(1000)));
        store.record(record("Login", "admin", "Step #1", fast_timings(5000)));
        store.record(record("Login", "auth", "Step #2", fast_timings(1200)));

        let report = build_report(&store, &ClassifierPolicy::default());
        let suite = report.suite().unwrap();

        let features: Vec<(&str, usize)> = suite
            .features
            .iter()
            .map(|f| (f.name.as_str(), f.step_count))
            .collect();
        assert_eq!(features, vec![("auth", 2), ("admin", 1)]);
        assert_eq!(suite.total_features, 2);
        assert_eq!(suite.total_scenarios, 1);

        let admin = &suite.features[1].scenarios[0];
        assert_eq!(admin.feature, "admin");
        assert_eq!(admin.steps[0].index, 1);
        assert_eq!(admin.stats.verdict(TimingField::PageLoad), Some(Verdict::Fail));

        let auth = &suite.features[0].scenarios[0];
        assert_eq!(auth.stats.mean(TimingField::PageLoad), Some(1100.0));
        assert_eq!(auth.steps[1].label, "Step #2");

        let login = suite.scenario_summary("Login").unwrap();
        assert_eq!(login.stats.total_steps, 3);
        assert_eq!(login.stats.mean(TimingField::PageLoad), Some(2400.0));
    }

    #[test]
    fn test_empty_feature_name_uses_unknown_suite() {
        let store = MetricStore::new();
        store.record(record("Orphan", "", "Step #1", fast_timings(1000)));

        let report = build_report(&store, &ClassifierPolicy::default());
        assert_eq!(report.suite().unwrap().features[0].name, "Unknown Suite");
    }

    #[test]
    fn test_scenario_overall_fails_below_majority() {
        let store = MetricStore::new();
        store.record(record(
            "Slow",
            "auth",
            "Step #1",
            StepTimings {
                page_load: 5000,
                dom_ready: 4000,
                response: 2000,
                ttfb: 100,
                connect: 10,
                dns_lookup: 5,
            },
        ));

        let report = build_report(&store, &ClassifierPolicy::default());
        let slow = report.suite().unwrap().scenario("Slow").unwrap();

        assert_eq!(slow.stats.passed_fields, 3);
        assert_eq!(slow.stats.overall, Verdict::Fail);
        assert_eq!(slow.steps[0].value(TimingField::PageLoad).unwrap().verdict, Verdict::Fail);
    }

    #[test]
    fn test_policy_is_applied() {
        let store = MetricStore::new();
        store.record(record("Login", "auth", "Step #1", fast_timings(1800)));

        let strict = ClassifierPolicy::new(
            FieldThresholds {
                page_load: Thresholds::new(1000.0, 1500.0),
                ..FieldThresholds::default()
            },
            6,
        );
        let report = build_report(&store, &strict);
        let stats = &report.suite().unwrap().stats;

        assert_eq!(stats.verdict(TimingField::PageLoad), Some(Verdict::Fail));
        assert_eq!(stats.passed_fields, 5);
        assert_eq!(stats.overall, Verdict::Fail);
    }

    #[test]
    fn test_build_is_idempotent() {
        let store = MetricStore::new();
        store.record(record("Login", "auth", "Step #1", fast_timings(1200)));
        store.record(record("Search", "catalog", "Step #1", fast_timings(2600)));

        let policy = ClassifierPolicy::default();
        let first = build_report(&store, &policy);
        let second = build_report(&store, &policy);

        assert_eq!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_report_serializes_with_status_tag() {
        let value = serde_json::to_value(ReportModel::NoData).unwrap();
        assert_eq!(value["status"], "noData");

        let store = MetricStore::new();
        store.record(record("Login", "auth", "Step #1", fast_timings(1200)));
        let value = serde_json::to_value(build_report(&store, &ClassifierPolicy::default())).unwrap();

        assert_eq!(value["status"], "collected");
        assert_eq!(value["report"]["stats"]["overall"], "PASS");
        assert_eq!(value["report"]["features"][0]["scenarios"][0]["name"], "Login");
    }
}
