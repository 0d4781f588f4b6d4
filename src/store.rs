//! # Metric Store
//!
//! Concurrent accumulator for [`MetricRecord`]s produced during a run. The
//! store keeps two views of the same data:
//!
//! - `all`: every record in the order its `record()` call committed
//! - scenario buckets: per-scenario sequences, in first-appearance order
//!
//! Both views hold the same `Arc<MetricRecord>` allocation. A record enters
//! both views under one write guard, so readers never see it in one view and
//! missing from the other, and a racing [`MetricStore::clear`] places it
//! wholly in the old generation or wholly in the new one.
//!
//! ## Locking
//!
//! A single `parking_lot::RwLock` guards the generation. Writers hold it for
//! an O(1) append; readers hold it only while cloning `Arc` pointers into an
//! owned snapshot. `parking_lot` hands the lock over fairly, so a steady
//! stream of readers cannot starve a writer.

use crate::record::{scenario_key, MetricRecord};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// One generation of stored records
#[derive(Default)]
struct Generation {
    all: Vec<Arc<MetricRecord>>,
    buckets: Vec<(String, Vec<Arc<MetricRecord>>)>,
    index: HashMap<String, usize>,
    number: u64,
}

impl Generation {
    fn push(&mut self, record: Arc<MetricRecord>) {
        let key = record.scenario_key();
        let existing = self.index.get(key).copied();
        let slot = match existing {
            Some(slot) => slot,
            None => {
                let slot = self.buckets.len();
                self.index.insert(key.to_string(), slot);
                self.buckets.push((key.to_string(), Vec::new()));
                slot
            }
        };
        self.buckets[slot].1.push(Arc::clone(&record));
        self.all.push(record);
    }
}

/// Point-in-time copy of a store generation
///
/// Later writes to the store never change a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    all: Vec<Arc<MetricRecord>>,
    scenarios: Vec<(String, Vec<Arc<MetricRecord>>)>,
}

impl StoreSnapshot {
    /// Every record in commit order
    pub fn all(&self) -> &[Arc<MetricRecord>] {
        &self.all
    }

    /// Scenario buckets in first-appearance order
    pub fn scenarios(&self) -> impl Iterator<Item = (&str, &[Arc<MetricRecord>])> {
        self.scenarios
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Records of one scenario; empty for unknown names
    pub fn scenario(&self, name: &str) -> &[Arc<MetricRecord>] {
        let key = scenario_key(name);
        self.scenarios
            .iter()
            .find(|(bucket, _)| bucket == key)
            .map(|(_, records)| records.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }
}

/// Counters describing the current generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatistics {
    pub total_steps: usize,
    pub total_scenarios: usize,
    pub generation: u64,
}

/// Thread-safe storage for step metrics of a single run
///
/// Construct one per suite and share it by reference (or `Arc`) with every
/// step trigger and with the finalizer.
pub struct MetricStore {
    run_id: String,
    inner: RwLock<Generation>,
}

impl MetricStore {
    /// Create an empty store with a fresh run id
    pub fn new() -> Self {
        let run_id = crate::utils::generate_run_id();
        debug!("Created metric store for run {}", run_id);
        Self {
            run_id,
            inner: RwLock::new(Generation::default()),
        }
    }

    /// Identifier of the run this store collects for
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Append a record to the global sequence and to its scenario bucket
    ///
    /// Never fails and never validates the record.
    pub fn record(&self, record: MetricRecord) {
        let record = Arc::new(record);
        trace!(
            "Recording {} for scenario '{}'",
            record.step_label(),
            record.scenario_key()
        );
        self.inner.write().push(record);
    }

    /// Snapshot of one scenario's records in recording order
    pub fn scenario_records(&self, name: &str) -> Vec<Arc<MetricRecord>> {
        let key = scenario_key(name);
        let generation = self.inner.read();
        generation
            .index
            .get(key)
            .map(|&slot| generation.buckets[slot].1.clone())
            .unwrap_or_default()
    }

    /// Snapshot of every record in commit order
    pub fn all_records(&self) -> Vec<Arc<MetricRecord>> {
        self.inner.read().all.clone()
    }

    /// Snapshot of both views taken under a single guard
    pub fn snapshot(&self) -> StoreSnapshot {
        let generation = self.inner.read();
        StoreSnapshot {
            all: generation.all.clone(),
            scenarios: generation.buckets.clone(),
        }
    }

    /// Scenario bucket names in first-appearance order
    pub fn scenario_names(&self) -> Vec<String> {
        self.inner
            .read()
            .buckets
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().all.is_empty()
    }

    pub fn scenario_count(&self) -> usize {
        self.inner.read().buckets.len()
    }

    pub fn statistics(&self) -> StoreStatistics {
        let generation = self.inner.read();
        StoreStatistics {
            total_steps: generation.all.len(),
            total_scenarios: generation.buckets.len(),
            generation: generation.number,
        }
    }

    /// Drop every stored record and start a new generation
    pub fn clear(&self) {
        let mut generation = self.inner.write();
        let dropped = generation.all.len();
        let next = generation.number + 1;
        *generation = Generation {
            number: next,
            ..Generation::default()
        };
        drop(generation);
        debug!("Cleared {} records, now at generation {}", dropped, next);
    }
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.statistics();
        f.debug_struct("MetricStore")
            .field("run_id", &self.run_id)
            .field("total_steps", &stats.total_steps)
            .field("total_scenarios", &stats.total_scenarios)
            .field("generation", &stats.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::StepTimings;

    fn step(label: &str, scenario: &str, page_load: i64) -> MetricRecord {
        MetricRecord::new(
            label,
            scenario,
            "auth",
            StepTimings::page_load_only(page_load),
            false,
        )
    }

    #[test]
    fn test_record_populates_both_views() {
        let store = MetricStore::new();
        store.record(step("Step #1", "Login", 1000));
        store.record(step("Step #1", "Logout", 500));
        store.record(step("Step #2", "Login", 1500));

        assert_eq!(store.len(), 3);
        assert_eq!(store.scenario_count(), 2);
        assert_eq!(store.scenario_names(), vec!["Login", "Logout"]);

        let login = store.scenario_records("Login");
        let labels: Vec<&str> = login.iter().map(|r| r.step_label()).collect();
        assert_eq!(labels, vec!["Step #1", "Step #2"]);
    }

    #[test]
    fn test_views_share_allocations() {
        let store = MetricStore::new();
        store.record(step("Step #1", "Login", 1000));

        let all = store.all_records();
        let login = store.scenario_records("Login");
        assert!(Arc::ptr_eq(&all[0], &login[0]));
    }

    #[test]
    fn test_unknown_scenario_is_empty() {
        let store = MetricStore::new();
        store.record(step("Step #1", "Login", 1000));

        assert!(store.scenario_records("Checkout").is_empty());
    }

    #[test]
    fn test_empty_scenario_name_uses_unknown_bucket() {
        let store = MetricStore::new();
        store.record(step("Step #1", "", 1000));

        assert_eq!(store.scenario_names(), vec!["unknown"]);
        assert_eq!(store.scenario_records("").len(), 1);
        assert_eq!(store.scenario_records("unknown").len(), 1);
    }

    #[test]
    fn test_returned_sequences_are_stable() {
        let store = MetricStore::new();
        store.record(step("Step #1", "Login", 1000));

        let before = store.scenario_records("Login");
        let snapshot = store.snapshot();
        store.record(step("Step #2", "Login", 1500));

        assert_eq!(before.len(), 1);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.scenario("Login").len(), 1);
        assert_eq!(store.scenario_records("Login").len(), 2);
    }

    #[test]
    fn test_clear_then_record() {
        let store = MetricStore::new();
        store.record(step("Step #1", "Login", 1000));
        store.clear();

        assert!(store.is_empty());
        assert!(store.all_records().is_empty());
        assert!(store.scenario_records("Login").is_empty());
        assert_eq!(store.statistics().generation, 1);

        store.record(step("Step #1", "Signup", 700));
        assert_eq!(store.all_records().len(), 1);
        assert_eq!(store.scenario_names(), vec!["Signup"]);
    }

    #[test]
    fn test_statistics() {
        let store = MetricStore::new();
        store.record(step("Step #1", "Login", 1000));
        store.record(step("Step #2", "Login", 1000));
        store.record(step("Step #1", "Search", 1000));

        let stats = store.statistics();
        assert_eq!(stats.total_steps, 3);
        assert_eq!(stats.total_scenarios, 2);
        assert_eq!(stats.generation, 0);
        assert!(!store.run_id().is_empty());
    }
}
