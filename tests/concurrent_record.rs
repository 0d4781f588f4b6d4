use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use stepwise_perf::{aggregate, Aggregate, MetricRecord, MetricStore, StepTimings, TimingField};

const WRITERS: usize = 8;
const STEPS_PER_WRITER: usize = 500;

fn step(writer: usize, n: usize) -> MetricRecord {
    MetricRecord::new(
        format!("Step #{}", n + 1),
        format!("scenario-{}", writer % 4),
        "concurrency",
        StepTimings {
            page_load: n as i64,
            dom_ready: writer as i64,
            ..StepTimings::default()
        },
        n % 3 == 0,
    )
}

/// Many writers recording at once lose nothing and keep both views consistent.
#[test]
fn concurrent_writers_keep_views_consistent() {
    let store = MetricStore::new();

    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let store = &store;
            scope.spawn(move || {
                for n in 0..STEPS_PER_WRITER {
                    store.record(step(writer, n));
                }
            });
        }

        // Readers racing the writers must never see a half-committed record.
        for _ in 0..2 {
            let store = &store;
            scope.spawn(move || {
                for _ in 0..200 {
                    let snapshot = store.snapshot();
                    let bucketed: usize = snapshot.scenarios().map(|(_, r)| r.len()).sum();
                    assert_eq!(snapshot.len(), bucketed);
                }
            });
        }
    });

    assert_eq!(store.len(), WRITERS * STEPS_PER_WRITER);
    assert_eq!(store.scenario_count(), 4);

    let bucketed: usize = store
        .scenario_names()
        .iter()
        .map(|name| store.scenario_records(name).len())
        .sum();
    assert_eq!(store.all_records().len(), bucketed);
}

/// Records from one writer appear in its scenario bucket in call order.
#[test]
fn per_scenario_order_follows_record_order() {
    let store = MetricStore::new();

    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let store = &store;
            scope.spawn(move || {
                for n in 0..STEPS_PER_WRITER {
                    store.record(MetricRecord::new(
                        format!("Step #{}", n + 1),
                        format!("writer-{}", writer),
                        "ordering",
                        StepTimings::page_load_only(n as i64),
                        false,
                    ));
                }
            });
        }
    });

    for writer in 0..WRITERS {
        let records = store.scenario_records(&format!("writer-{}", writer));
        let loads: Vec<i64> = records
            .iter()
            .map(|r| r.value(TimingField::PageLoad))
            .collect();
        let expected: Vec<i64> = (0..STEPS_PER_WRITER as i64).collect();
        assert_eq!(loads, expected);
    }
}

/// `clear` racing with writers leaves the store consistent either way.
#[test]
fn clear_during_writes_stays_consistent() {
    let store = MetricStore::new();

    std::thread::scope(|scope| {
        for writer in 0..4 {
            let store = &store;
            scope.spawn(move || {
                for n in 0..STEPS_PER_WRITER {
                    store.record(step(writer, n));
                }
            });
        }
        let store = &store;
        scope.spawn(move || {
            for _ in 0..10 {
                store.clear();
                std::thread::yield_now();
            }
        });
    });

    let snapshot = store.snapshot();
    let bucketed: usize = snapshot.scenarios().map(|(_, r)| r.len()).sum();
    assert_eq!(snapshot.len(), bucketed);
    assert!(snapshot.len() <= 4 * STEPS_PER_WRITER);

    store.clear();
    assert!(store.is_empty());
    store.record(step(0, 0));
    assert_eq!(store.len(), 1);
}

/// Aggregation gives identical results for any permutation of its input.
#[test]
fn aggregate_is_order_independent() {
    let mut records: Vec<Arc<MetricRecord>> = (0..WRITERS)
        .flat_map(|w| (0..50).map(move |n| Arc::new(step(w, n * 37 + w))))
        .collect();
    let expected = aggregate(&records);
    assert!(matches!(expected, Aggregate::Collected(_)));

    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
    for _ in 0..20 {
        records.shuffle(&mut rng);
        assert_eq!(aggregate(&records), expected);
    }
}
