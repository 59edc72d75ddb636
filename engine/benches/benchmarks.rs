//! Performance benchmarks for gcounter-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gcounter_engine::{GCounter, PeerOutcome, SyncRound};

fn create_counter(nodes: usize, prefix: &str) -> GCounter {
    let mut counter = GCounter::default();
    for i in 0..nodes {
        counter.increment_by(&format!("{}-{}", prefix, i), (i as u64) + 1);
    }
    counter
}

fn bench_counter_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter_operations");

    group.bench_function("increment", |b| {
        let mut counter = GCounter::new("node1");
        b.iter(|| counter.increment(black_box("node1")))
    });

    group.bench_function("total_1000_nodes", |b| {
        let counter = create_counter(1000, "node");
        b.iter(|| black_box(&counter).total())
    });

    group.bench_function("snapshot_to_json_1000_nodes", |b| {
        let counter = create_counter(1000, "node");
        b.iter(|| black_box(&counter).snapshot().to_json())
    });

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("join_overlapping", size), &size, |b, &size| {
            let left = create_counter(size, "node");
            let mut right = create_counter(size, "node");
            right.increment("node-0");
            b.iter(|| black_box(&left).join(black_box(&right)))
        });

        group.bench_with_input(BenchmarkId::new("join_disjoint", size), &size, |b, &size| {
            let left = create_counter(size, "left");
            let right = create_counter(size, "right");
            b.iter(|| black_box(&left).join(black_box(&right)))
        });
    }

    group.bench_function("merge_all_16_replicas", |b| {
        let replicas: Vec<GCounter> = (0..16)
            .map(|i| create_counter(100, &format!("replica{}", i)))
            .collect();
        b.iter(|| GCounter::merge_all(black_box(&replicas)))
    });

    group.finish();
}

fn bench_sync_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_round");

    for peers in [1, 8, 64] {
        group.bench_with_input(BenchmarkId::new("fold_peers", peers), &peers, |b, &peers| {
            let local = create_counter(10, "local");
            let views: Vec<(String, GCounter)> = (0..peers)
                .map(|i| (format!("peer-{}", i), create_counter(10, &format!("p{}", i))))
                .collect();

            b.iter(|| {
                let mut round = SyncRound::new(local.clone());
                let _ = round.enumerate(views.iter().map(|(id, _)| id.as_str()));
                for (id, view) in &views {
                    let _ = round.record(id, PeerOutcome::Fetched(view.snapshot()));
                }
                round.finish()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_counter_operations, bench_merge, bench_sync_round);
criterion_main!(benches);
