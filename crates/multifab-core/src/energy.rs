use crate::fixed::Fixed64;
use serde::{Deserialize, Serialize};

/// Energy buffer of a factory. All active processes draw from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyContainer {
    stored: Fixed64,
    capacity: Fixed64,
    per_tick: Fixed64,
}

impl EnergyContainer {
    pub fn new(capacity: Fixed64, per_tick: Fixed64) -> Self {
        Self {
            stored: Fixed64::ZERO,
            capacity: capacity.max(Fixed64::ZERO),
            per_tick: per_tick.max(Fixed64::ZERO),
        }
    }

    pub fn stored(&self) -> Fixed64 {
        self.stored
    }

    pub fn capacity(&self) -> Fixed64 {
        self.capacity
    }

    /// Energy one active process uses per tick.
    pub fn per_tick(&self) -> Fixed64 {
        self.per_tick
    }

    pub(crate) fn set_per_tick(&mut self, per_tick: Fixed64) {
        self.per_tick = per_tick.max(Fixed64::ZERO);
    }

    /// Set the stored amount, clamped to `[0, capacity]`.
    pub fn set_stored(&mut self, amount: Fixed64) {
        self.stored = amount.clamp(Fixed64::ZERO, self.capacity);
    }

    /// Insert energy. Returns the amount that did not fit.
    pub fn insert(&mut self, amount: Fixed64) -> Fixed64 {
        if amount <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        let room = self.capacity - self.stored;
        let accepted = amount.min(room);
        self.stored += accepted;
        amount - accepted
    }

    /// Remove exactly `amount` if available. Returns false and leaves the
    /// buffer untouched otherwise.
    pub fn try_extract(&mut self, amount: Fixed64) -> bool {
        if amount > self.stored {
            return false;
        }
        self.stored -= amount;
        true
    }

    /// True if one process tick's worth of energy is available.
    pub fn can_run_tick(&self) -> bool {
        self.stored >= self.per_tick
    }
}
