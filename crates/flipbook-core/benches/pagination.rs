use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flipbook_core::prelude::*;

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("pagination");

    for count in [24usize, 240, 2400] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("plan_pages", count), &count, |b, &n| {
            b.iter(|| black_box(plan_pages(n, 3, 2).expect("plan")));
        });

        group.bench_with_input(BenchmarkId::new("lazy_events", count), &count, |b, &n| {
            b.iter(|| {
                let packer = PagePacker::with_grid(n, 3, 2).expect("grid");
                black_box(packer.filter(|e| matches!(e, PackEvent::Flush { .. })).count())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
