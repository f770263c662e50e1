//! Handing state over when a machine is replaced by a (higher tier) factory.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::factory::Factory;
use crate::fixed::Fixed64;
use crate::item::ItemStack;
use crate::recipe::RecipeLookup;
use crate::tier::{MachineKind, Upgrades};

#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    #[error("cannot transfer configuration from {from:?} to {to:?}")]
    Incompatible { from: MachineKind, to: MachineKind },
}

/// State captured from a machine being replaced.
///
/// The per-process vectors are indexed by the source's process index and
/// may be shorter or longer than the receiving factory's process count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeData {
    pub source: MachineKind,
    pub progress: Vec<u64>,
    pub inputs: Vec<Option<ItemStack>>,
    pub outputs: Vec<Option<ItemStack>>,
    pub secondary_outputs: Vec<Option<ItemStack>>,
    /// Contents of the shared co-input slot, if the source has one.
    pub extra: Option<ItemStack>,
    pub energy: Fixed64,
    /// Base machines have no sorter.
    pub sorting: Option<bool>,
    pub upgrades: Upgrades,
}

impl UpgradeData {
    /// Empty state for `source`, sized to its process count.
    pub fn new(source: MachineKind) -> Self {
        let processes = source.processes();
        Self {
            source,
            progress: vec![0; processes],
            inputs: vec![None; processes],
            outputs: vec![None; processes],
            secondary_outputs: vec![None; processes],
            extra: None,
            energy: Fixed64::ZERO,
            sorting: None,
            upgrades: Upgrades::default(),
        }
    }

    /// State of a single-process base machine.
    pub fn from_base_machine(
        source: MachineKind,
        progress: u64,
        input: Option<ItemStack>,
        output: Option<ItemStack>,
        energy: Fixed64,
        upgrades: Upgrades,
    ) -> Self {
        Self {
            source,
            progress: vec![progress],
            inputs: vec![input],
            outputs: vec![output],
            secondary_outputs: vec![None],
            extra: None,
            energy,
            sorting: None,
            upgrades,
        }
    }

    fn process_count(&self) -> usize {
        self.progress
            .len()
            .max(self.inputs.len())
            .max(self.outputs.len())
            .max(self.secondary_outputs.len())
    }
}

impl<R: RecipeLookup> Factory<R> {
    pub fn machine_kind(&self) -> MachineKind {
        MachineKind::Factory(self.factory_type, self.tier)
    }

    /// True if state from `source` may be applied to this factory: any
    /// machine of the same factory type, base or factory, at any tier.
    pub fn is_configuration_data_compatible(&self, source: MachineKind) -> bool {
        source.factory_type() == self.factory_type
    }

    /// Capture this factory's state for a replacement machine.
    pub fn upgrade_data(&self) -> UpgradeData {
        UpgradeData {
            source: self.machine_kind(),
            progress: self.processes.iter().map(|p| p.progress).collect(),
            inputs: self.processes.iter().map(|p| p.input.stack().cloned()).collect(),
            outputs: self.processes.iter().map(|p| p.output.stack().cloned()).collect(),
            secondary_outputs: self
                .processes
                .iter()
                .map(|p| p.secondary_output.as_ref().and_then(|s| s.stack().cloned()))
                .collect(),
            extra: self.extra.as_ref().and_then(|s| s.stack().cloned()),
            energy: self.energy.stored(),
            sorting: Some(self.sort.is_enabled()),
            upgrades: self.upgrades,
        }
    }

    /// Apply state captured from a replaced machine.
    ///
    /// Processes beyond this factory's count are dropped with a warning;
    /// processes the source did not have keep their current state. Progress
    /// and energy are clamped to this factory's bounds.
    pub fn parse_upgrade_data(&mut self, data: &UpgradeData) -> Result<(), UpgradeError> {
        if !self.is_configuration_data_compatible(data.source) {
            return Err(UpgradeError::Incompatible {
                from: data.source,
                to: self.machine_kind(),
            });
        }

        self.set_upgrades(data.upgrades);
        if let Some(sorting) = data.sorting {
            self.sort.set_enabled(sorting);
        }
        if data.energy > self.energy.capacity() {
            debug!(energy = %data.energy, capacity = %self.energy.capacity(), "clamping transferred energy");
        }
        self.energy.set_stored(data.energy);
        match self.extra.as_mut() {
            Some(slot) => {
                slot.set_stack(data.extra.clone());
            }
            None if data.extra.is_some() => {
                warn!("dropping extra slot contents; factory has no extra slot");
            }
            None => {}
        }

        let ticks_required = self.ticks_required;
        let transferred = data.process_count();
        for index in 0..transferred {
            let input = data.inputs.get(index).cloned().flatten();
            let output = data.outputs.get(index).cloned().flatten();
            let secondary = data.secondary_outputs.get(index).cloned().flatten();
            let Some(process) = self.processes.get_mut(index) else {
                if input.is_some() || output.is_some() || secondary.is_some() {
                    warn!(process = index, "dropping items of a process this factory does not have");
                }
                continue;
            };
            process.progress = data.progress.get(index).copied().unwrap_or(0).min(ticks_required);
            process.input.set_stack(input);
            process.output.set_stack(output);
            match process.secondary_output.as_mut() {
                Some(slot) => {
                    slot.set_stack(secondary);
                }
                None if secondary.is_some() => {
                    warn!(process = index, "dropping secondary output; factory has no secondary slot");
                }
                None => {}
            }
            process.cached = None;
            process.active = false;
        }

        self.sort.mark_needed();
        self.publish_snapshot();
        Ok(())
    }
}
