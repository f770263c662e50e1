//! Criterion benchmarks for the factory scheduler.
//!
//! - `sort`: one sort pass over an Ultimate factory with mixed inputs
//! - `tick`: steady-state ticks of a powered Ultimate factory with sorting on
//! - `save`: encoding and decoding a populated factory

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use multifab_core::factory::Factory;
use multifab_core::fixed::Fixed64;
use multifab_core::recipe::RecipeTable;
use multifab_core::sim::TickContext;
use multifab_core::test_utils::*;
use multifab_core::tier::FactoryTier;

/// Ultimate factory with three item kinds spread over its first processes.
fn build_mixed_factory() -> Factory<RecipeTable> {
    let mut factory = factory_with_tier(FactoryTier::Ultimate);
    factory.set_input(0, Some(compressed_ore(64)));
    factory.set_input(1, Some(ore(40)));
    factory.set_input(3, Some(iron_dust(17)));
    factory.set_input(4, Some(ore(3)));
    factory
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");
    group.sample_size(50);

    group.bench_function("ultimate_mixed_inputs", |b| {
        b.iter_batched(
            build_mixed_factory,
            |mut factory| {
                factory.sort_inventory();
                factory
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group.sample_size(50);

    let mut factory = powered(build_mixed_factory());
    factory.set_sorting(true);
    let mut tick = 0;

    group.bench_function("ultimate_sorting_enabled", |b| {
        b.iter(|| {
            tick += 1;
            let refill = factory.energy().per_tick() * Fixed64::from_num(9);
            let _ = factory.insert_energy(refill);
            factory.tick(TickContext::new(tick))
        });
    });

    group.finish();
}

fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("save");
    group.sample_size(30);

    let factory = build_mixed_factory();
    let bytes = factory.save().unwrap();

    group.bench_function("save_ultimate", |b| {
        b.iter(|| factory.save().unwrap());
    });
    group.bench_function("load_ultimate", |b| {
        b.iter_batched(
            build_mixed_factory,
            |mut target| {
                target.load(&bytes).unwrap();
                target
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_sort, bench_tick, bench_save);
criterion_main!(benches);
