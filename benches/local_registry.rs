use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use hops::{HopUnit, HoppingCounterRegistry, HoppingWindowOptions, WindowUnits};

fn registry() -> HoppingCounterRegistry {
    HoppingCounterRegistry::new(HoppingWindowOptions {
        window_units: WindowUnits::try_from(60).unwrap(),
        unit: HopUnit::seconds(1).unwrap(),
    })
    .unwrap()
}

fn bench_hot_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_registry/hot_key");
    group.sample_size(200);

    group.bench_function("observe", |b| {
        let registry = registry();
        registry.observe("k");
        b.iter(|| registry.observe(black_box("k")));
    });

    group.bench_function("value", |b| {
        let registry = registry();
        registry.observe("k");
        b.iter(|| black_box(registry.value(black_box("k"))));
    });

    group.finish();
}

fn bench_many_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_registry/many_keys");
    group.sample_size(100);

    for key_space in [1_000_usize, 100_000] {
        group.bench_function(format!("observe/keys={key_space}"), |b| {
            let registry = registry();
            let keys: Vec<String> = (0..key_space).map(|i| format!("user_{i}")).collect();

            let mut idx = 0_usize;
            b.iter(|| {
                idx = idx.wrapping_add(1);
                registry.observe(black_box(&keys[idx % keys.len()]));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hot_key, bench_many_keys);
criterion_main!(benches);
