use std::{hint::black_box, sync::Arc, thread, time::Duration};

use criterion::{Criterion, criterion_group, criterion_main};

use hops::HoppingWindowCounter;

fn counter(window_units: usize) -> HoppingWindowCounter {
    HoppingWindowCounter::try_new(window_units, Duration::from_secs(1)).unwrap()
}

fn bench_observe_hot_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_counter/observe");
    group.sample_size(200);

    for window_units in [5_usize, 60, 3_600] {
        group.bench_function(format!("window_units={window_units}"), |b| {
            let counter = counter(window_units);
            b.iter(|| counter.observe());
        });
    }

    group.finish();
}

fn bench_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_counter/value");
    group.sample_size(200);

    for window_units in [5_usize, 60, 3_600] {
        group.bench_function(format!("window_units={window_units}"), |b| {
            let counter = counter(window_units);
            counter.observe_many(1_000);
            b.iter(|| black_box(counter.value()));
        });
    }

    group.finish();
}

fn bench_observe_under_reader_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_counter/observe_with_readers");
    group.sample_size(50);

    for readers in [1_usize, 4] {
        group.bench_function(format!("readers={readers}"), |b| {
            let counter = Arc::new(counter(60));
            let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));

            let handles: Vec<_> = (0..readers)
                .map(|_| {
                    let counter = Arc::clone(&counter);
                    let stop = Arc::clone(&stop);
                    thread::spawn(move || {
                        while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                            black_box(counter.value());
                        }
                    })
                })
                .collect();

            b.iter(|| counter.observe());

            stop.store(true, std::sync::atomic::Ordering::Relaxed);
            for h in handles {
                let _ = h.join();
            }
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_observe_hot_path,
    bench_value,
    bench_observe_under_reader_contention
);
criterion_main!(benches);
