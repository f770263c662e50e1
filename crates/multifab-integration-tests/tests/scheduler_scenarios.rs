//! Integration test: tick-level scheduler scenarios.
//!
//! Each test drives a factory only through its public host surface: slot
//! operations, ticks and the published snapshot.

use std::thread;

use fixed::types::I32F32;
use multifab_core::computer::ComputerError;
use multifab_core::sim::TickContext;
use multifab_core::test_utils::*;
use multifab_core::tier::FactoryTier;

#[test]
fn stacked_batch_spreads_and_runs_in_parallel() {
    let mut factory = powered(basic_factory());
    factory.set_sorting(true);
    assert!(factory.insert_input(0, compressed_ore(64)).is_none());

    let report = factory.tick(TickContext::new(1));
    assert!(report.sorted);
    assert_eq!(input_counts(&factory), vec![32, 16, 16]);
    assert!(report.active);
    assert_eq!(report.energy_used, factory.energy().per_tick() * I32F32::from_num(3));
    assert_eq!(factory.snapshot().process_active, vec![true, true, true]);
}

#[test]
fn cache_flush_forces_fresh_lookup_with_unchanged_input() {
    let mut factory = counting_factory(FactoryTier::Basic);
    let _ = factory.insert_input(0, iron_dust(8));

    factory.tick(TickContext::new(1));
    assert_eq!(factory.recipes().lookups(), 1);
    factory.tick(TickContext::new(2));
    assert_eq!(factory.recipes().lookups(), 1, "cached recipe reused");

    factory.tick(TickContext::new(3).with_cache_flush());
    assert_eq!(factory.recipes().lookups(), 2, "flush bypasses the cache");
    factory.tick(TickContext::new(4));
    assert_eq!(factory.recipes().lookups(), 2);
}

#[test]
fn energy_shortage_stalls_later_processes() {
    let mut factory = basic_factory();
    let per_tick = factory.energy().per_tick();
    let _ = factory.insert_energy(per_tick * I32F32::from_num(3));
    let _ = factory.insert_input(0, ore(4));
    let _ = factory.insert_input(1, ore(4));

    let first = factory.tick(TickContext::new(1));
    assert_eq!(first.energy_used, per_tick * I32F32::from_num(2));

    let second = factory.tick(TickContext::new(2));
    assert_eq!(second.energy_used, per_tick);
    assert_eq!(factory.snapshot().progress, vec![2, 1, 0]);
    assert_eq!(factory.snapshot().process_active, vec![true, false, false]);

    let third = factory.tick(TickContext::new(3));
    assert!(!third.active);
    assert_eq!(factory.last_energy_usage(), I32F32::ZERO);
    assert_eq!(factory.snapshot().progress, vec![2, 1, 0]);
}

#[test]
fn outputs_accumulate_until_taken() {
    let mut factory = powered(fast_factory(FactoryTier::Basic, 1));
    let _ = factory.insert_input(2, ore(40));
    for tick in 1..=40 {
        factory.tick(TickContext::new(tick));
    }
    // 32 operations fill the output (64 dust); the rest wait for room.
    assert_eq!(factory.process(2).unwrap().output().count(), 64);
    assert_eq!(factory.process(2).unwrap().input().count(), 8);
    assert!(!factory.is_active());

    assert_eq!(factory.take_output(2, 10).map(|s| s.count), Some(10));
    factory.tick(TickContext::new(41));
    assert_eq!(factory.process(2).unwrap().output().count(), 56);
}

#[test]
fn remote_index_checks() {
    let factory = factory_with_tier(FactoryTier::Ultimate);
    assert_eq!(factory.get_recipe_progress(8), Ok(0));
    let err = factory.get_recipe_progress(9).unwrap_err();
    assert_eq!(err, ComputerError::ProcessOutOfBounds { process: 9, processes: 9 });
    assert!(err.to_string().contains("9"));
}

#[test]
fn snapshot_is_readable_from_another_thread() {
    let mut factory = powered(basic_factory());
    let _ = factory.insert_input(1, ore(2));
    factory.tick(TickContext::new(1));
    let snapshot = factory.snapshot();

    let reader = thread::spawn(move || (snapshot.tick, snapshot.scaled_progress(200.0, 1)));
    factory.tick(TickContext::new(2));

    let (tick, scaled) = reader.join().unwrap();
    assert_eq!(tick, 1);
    assert_eq!(scaled, 1.0);
    assert_eq!(factory.snapshot().progress[1], 2);
}
