//! Basic benchmarks for the `recycle_pool` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::time::Instant;

use alloc_tracker::Allocator;
use criterion::{Criterion, criterion_group, criterion_main};
use recycle_pool::RecyclePool;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

type TestObject = [u64; 16];
const TEST_VALUE: TestObject = [7; 16];

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("rp_basic");

    let allocs_op = allocs.operation("release_acquire_recycled");
    group.bench_function("release_acquire_recycled", |b| {
        let pool = RecyclePool::<TestObject, 16>::new();
        pool.release(Box::new(TEST_VALUE));

        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                let object = pool.acquire().expect("pool was just fed one object");
                pool.release(black_box(object));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("acquire_empty");
    group.bench_function("acquire_empty", |b| {
        let pool = RecyclePool::<TestObject, 16>::new();

        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                _ = black_box(pool.acquire());
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("allocate_free_baseline");
    group.bench_function("allocate_free_baseline", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(Box::new(black_box(TEST_VALUE))));
            }

            start.elapsed()
        });
    });

    group.finish();

    allocs.print_to_stdout();
}
