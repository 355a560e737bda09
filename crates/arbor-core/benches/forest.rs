//! Forest build, flatten and cycle-guard benchmarks.
//!
//! Run with:
//! ```sh
//! cargo bench --bench forest
//! ```

use arbor_core::config::GroupingConfig;
use arbor_core::graph::builder::build_tree;
use arbor_core::graph::cycles::{find_parent_cycles, would_create_cycle};
use arbor_core::graph::grouped::build_grouped_tree_with;
use arbor_core::model::{Record, TypeRecord};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

const SIZES: [usize; 3] = [100, 1_000, 10_000];
const TYPE_COUNT: usize = 16;

/// Deterministic corpus: every record after the first picks one or two
/// earlier records as parents, every seventh is a subtype instead.
fn corpus(n: usize, seed: u64) -> Vec<Record> {
    let mut state = seed;
    let mut next = move |bound: usize| {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        usize::try_from(state >> 33).unwrap_or(0) % bound.max(1)
    };

    (0..n)
        .map(|i| {
            let record =
                Record::new(format!("r{i}"), format!("Record {i}")).typed(format!("t{}", i % TYPE_COUNT));
            if i == 0 || i % 10 == 0 {
                return record;
            }
            if i % 7 == 0 {
                return record.subtype_of(format!("r{}", next(i)));
            }
            let first = next(i);
            let second = next(i);
            record.with_parents([format!("r{first}"), format!("r{second}")])
        })
        .collect()
}

fn types() -> Vec<TypeRecord> {
    (0..TYPE_COUNT)
        .map(|i| {
            let t = TypeRecord::new(format!("t{i}"), format!("Type {i}"));
            if i == 0 {
                t
            } else {
                t.with_parents([format!("t{}", (i - 1) / 2)])
            }
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest.build");
    for n in SIZES {
        let records = corpus(n, 0xA4B0_u64);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &records, |b, records| {
            b.iter(|| black_box(build_tree(records).node_count()));
        });
    }
    group.finish();
}

fn bench_grouped(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest.grouped");
    let catalog = types();
    let grouping = GroupingConfig::default();
    for n in SIZES {
        let records = corpus(n, 0xA4B1_u64);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &records, |b, records| {
            b.iter(|| black_box(build_grouped_tree_with(records, &catalog, &grouping).len()));
        });
    }
    group.finish();
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest.flatten");
    for n in SIZES {
        let forest = build_tree(&corpus(n, 0xA4B2_u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &forest, |b, forest| {
            b.iter(|| black_box(forest.flatten(256).len()));
        });
    }
    group.finish();
}

fn bench_cycle_guard(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycles.guard");
    for n in SIZES {
        let records = corpus(n, 0xA4B3_u64);
        let deepest = format!("r{}", n - 1);
        group.bench_with_input(BenchmarkId::new("would_create", n), &records, |b, records| {
            b.iter(|| black_box(would_create_cycle(&deepest, "r0", records)));
        });
        group.bench_with_input(BenchmarkId::new("scan", n), &records, |b, records| {
            b.iter(|| black_box(find_parent_cycles(records).len()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_grouped, bench_flatten, bench_cycle_guard);
criterion_main!(benches);
