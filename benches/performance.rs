//! Performance benchmarks for the state store.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use statehub::{Action, CloneStrategy, ModifierResult, Store, StoreConfig};
use std::collections::BTreeMap;

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Item {
    id: u64,
    label: String,
    tags: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Catalog {
    counter: u64,
    items: Vec<Item>,
    index: BTreeMap<String, u64>,
}

fn catalog(size: usize) -> Catalog {
    let items: Vec<Item> = (0..size as u64)
        .map(|id| Item {
            id,
            label: format!("item-{}", id),
            tags: vec!["a".into(), "b".into()],
        })
        .collect();
    let index = items.iter().map(|i| (i.label.clone(), i.id)).collect();
    Catalog {
        counter: 0,
        items,
        index,
    }
}

fn create_store(size: usize, config: StoreConfig) -> Store<Catalog> {
    let store = Store::with_config(catalog(size), config);
    store
        .add_unit_modifier("TICK", |c: &mut Catalog| -> ModifierResult {
            c.counter += 1;
            Ok(())
        })
        .unwrap();
    store
}

/// Benchmark dispatch cost as the number of listeners grows
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    for listeners in [0, 1, 8, 32] {
        group.bench_with_input(
            BenchmarkId::new("listeners", listeners),
            &listeners,
            |b, &count| {
                let store = create_store(100, StoreConfig::default());
                // Handles are kept so channels stay open.
                let _handles: Vec<_> = (0..count)
                    .map(|i| store.add_listener(&format!("Items.{}.Label", i)).unwrap())
                    .collect();

                b.iter(|| {
                    store.dispatch(black_box(Action::new("TICK"))).unwrap();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark cached reads against reads right after a mutation
fn bench_get_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_state");

    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("cached", size), &size, |b, &size| {
            let store = create_store(size, StoreConfig::default());
            store.get_state().unwrap();

            b.iter(|| {
                black_box(store.get_state().unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("after_dispatch", size), &size, |b, &size| {
            let store = create_store(size, StoreConfig::default());

            b.iter(|| {
                store.dispatch(Action::new("TICK")).unwrap();
                black_box(store.get_state().unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark path reads
fn bench_get_state_by_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_state_by_path");
    let store = create_store(1000, StoreConfig::default());

    for path in ["Counter", "Items.500.Label", "Items.Id", "Index.item-999"] {
        group.bench_with_input(BenchmarkId::from_parameter(path), &path, |b, &path| {
            b.iter(|| {
                black_box(store.get_state_by_path(path).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark the snapshot clone strategies
fn bench_clone_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("clone_strategy");

    for (name, strategy) in [
        ("derive", CloneStrategy::Derive),
        ("msgpack", CloneStrategy::MessagePack),
        ("json", CloneStrategy::Json),
    ] {
        group.bench_function(name, |b| {
            let state = catalog(1000);
            b.iter(|| {
                black_box(statehub::deep_clone(&state, strategy).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_dispatch,
    bench_get_state,
    bench_get_state_by_path,
    bench_clone_strategies,
);
criterion_main!(benches);
