//! Per-tick inputs from the host and the outcome of one tick.

use crate::fixed::{Fixed64, Ticks};

/// Signals the host raises for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickContext {
    /// World tick counter, carried into the published snapshot.
    pub tick: Ticks,
    /// Set when backing recipe or tag data changed (e.g. on reload). Every
    /// cached recipe is treated as untrustworthy for this tick.
    pub flush_recipe_caches: bool,
}

impl TickContext {
    pub fn new(tick: Ticks) -> Self {
        Self {
            tick,
            flush_recipe_caches: false,
        }
    }

    pub fn with_cache_flush(mut self) -> Self {
        self.flush_recipe_caches = true;
        self
    }
}

/// What happened during one call to [`Factory::tick`](crate::factory::Factory::tick).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whether any process was active this tick.
    pub active: bool,
    /// Energy consumed this tick; zero when no process was active.
    pub energy_used: Fixed64,
    /// Whether an auto-sort pass ran before processing.
    pub sorted: bool,
    /// Number of operations that finished this tick.
    pub operations_completed: u32,
}
