//! Read-only view of a factory for UI, rendering and network sync.
//!
//! A [`FactorySnapshot`] is an owned copy rebuilt once at the end of every
//! tick and published by swapping an `Arc`, so readers on other threads never
//! observe a half-updated tick.

use crate::fixed::{Fixed64, Ticks};
use crate::tier::FactoryTier;

/// Immutable per-tick view of a factory's public counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorySnapshot {
    pub tier: FactoryTier,
    /// Host tick at which this snapshot was published.
    pub tick: Ticks,
    /// Progress of each process in ticks.
    pub progress: Vec<u64>,
    /// Per-process active flags.
    pub process_active: Vec<bool>,
    /// Union of the per-process flags; drives the active/idle visuals.
    pub active: bool,
    pub last_energy_usage: Fixed64,
    pub ticks_required: Ticks,
    pub sorting: bool,
    pub energy_stored: Fixed64,
    pub energy_capacity: Fixed64,
}

impl FactorySnapshot {
    /// Progress of `process` scaled to `[0, scale]`, e.g. for a progress bar.
    /// Returns 0 for an unknown process.
    pub fn scaled_progress(&self, scale: f64, process: usize) -> f64 {
        let Some(&progress) = self.progress.get(process) else {
            return 0.0;
        };
        if self.ticks_required == 0 {
            return 0.0;
        }
        progress as f64 * scale / self.ticks_required as f64
    }
}
