//! Performance benchmarks for the state tree.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use state_tree::Store;

fn deep_path(depth: usize) -> String {
    (0..depth)
        .map(|i| format!("n{i}"))
        .collect::<Vec<_>>()
        .join(".")
}

/// Benchmark reads at varying path depths
fn bench_get_by_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_by_depth");

    for depth in [1, 4, 16, 64] {
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, &depth| {
            let store = Store::new();
            let path = deep_path(depth);
            store.create(&path, json!(42)).unwrap();

            b.iter(|| {
                black_box(store.get(&path).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark updates with listeners along the ancestor chain
fn bench_update_with_subscribers(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_with_subscribers");

    for per_path in [0, 1, 10, 100] {
        group.bench_with_input(
            BenchmarkId::new("listeners_per_path", per_path),
            &per_path,
            |b, &per_path| {
                let store = Store::new();
                let path = deep_path(4);
                store.create(&path, json!(0)).unwrap();

                for ancestor in store.expand_tree(&path) {
                    for _ in 0..per_path {
                        store.subscribe(&ancestor, |change| {
                            black_box(change.value);
                            Ok(())
                        });
                    }
                }

                let mut i = 0u64;
                b.iter(|| {
                    i += 1;
                    store.update(&path, json!(i)).unwrap();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark updates while a snapshot handle forces copy-on-write
fn bench_update_with_held_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_with_held_snapshot");

    for width in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("width", width), &width, |b, &width| {
            let store = Store::new();
            for k in 0..width {
                store.create(&format!("k{k}"), json!(k)).unwrap();
            }

            b.iter(|| {
                let snapshot = store.get_state();
                store.update("k0", json!("changed")).unwrap();
                black_box(snapshot);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_get_by_depth,
    bench_update_with_subscribers,
    bench_update_with_held_snapshot
);
criterion_main!(benches);
