//! Static factory configuration: tiers, machine kinds and upgrades.

use crate::config::FactoryConfig;
use crate::fixed::{Fixed64, Ticks, f64_to_fixed64};
use serde::{Deserialize, Serialize};

/// Highest number of installed upgrades of one kind.
pub const MAX_UPGRADES: u8 = 8;

/// Fixes the number of parallel processes of a factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FactoryTier {
    Basic,
    Advanced,
    Elite,
    Ultimate,
}

impl FactoryTier {
    pub const ALL: [FactoryTier; 4] = [
        FactoryTier::Basic,
        FactoryTier::Advanced,
        FactoryTier::Elite,
        FactoryTier::Ultimate,
    ];

    pub fn processes(self) -> usize {
        match self {
            FactoryTier::Basic => 3,
            FactoryTier::Advanced => 5,
            FactoryTier::Elite => 7,
            FactoryTier::Ultimate => 9,
        }
    }
}

/// What kind of processing a factory performs. Decides whether the factory
/// has a shared extra slot and whether configuration data from another
/// machine can be transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactoryType {
    Smelting,
    Enriching,
    Crushing,
    Compressing,
    Combining,
    Purifying,
    Injecting,
    Infusing,
    Sawing,
}

impl FactoryType {
    /// Types whose recipes draw a co-input from a shared extra slot.
    pub fn has_extra_slot(self) -> bool {
        matches!(
            self,
            FactoryType::Combining
                | FactoryType::Purifying
                | FactoryType::Injecting
                | FactoryType::Infusing
        )
    }

    /// Types whose processes have a secondary output slot.
    pub fn has_secondary_output(self) -> bool {
        self == FactoryType::Sawing
    }
}

/// A machine that may hand its state over to a factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineKind {
    /// The single-process machine a factory type is built from.
    Base(FactoryType),
    Factory(FactoryType, FactoryTier),
}

impl MachineKind {
    pub fn factory_type(self) -> FactoryType {
        match self {
            MachineKind::Base(ty) | MachineKind::Factory(ty, _) => ty,
        }
    }

    pub fn processes(self) -> usize {
        match self {
            MachineKind::Base(_) => 1,
            MachineKind::Factory(_, tier) => tier.processes(),
        }
    }
}

/// Installed upgrades. Counts above [`MAX_UPGRADES`] are clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrades {
    pub speed: u8,
    pub energy: u8,
}

impl Upgrades {
    pub fn clamped(self) -> Self {
        Self {
            speed: self.speed.min(MAX_UPGRADES),
            energy: self.energy.min(MAX_UPGRADES),
        }
    }

    /// Ticks one operation takes: `base * m^(-speed/8)`, at least 1.
    pub fn ticks_required(self, config: &FactoryConfig) -> Ticks {
        let speed = f64::from(self.clamped().speed);
        let scaled = config.base_ticks_required as f64
            * config.max_upgrade_multiplier.powf(-speed / f64::from(MAX_UPGRADES));
        (scaled as Ticks).max(1)
    }

    /// Energy one active process uses per tick: `base * m^((2*speed - energy)/8)`.
    pub fn energy_per_tick(self, config: &FactoryConfig) -> Fixed64 {
        let up = self.clamped();
        let exponent = (2.0 * f64::from(up.speed) - f64::from(up.energy)) / f64::from(MAX_UPGRADES);
        f64_to_fixed64(config.base_energy_per_tick * config.max_upgrade_multiplier.powf(exponent))
    }
}
