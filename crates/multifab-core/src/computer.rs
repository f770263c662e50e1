//! Remote command surface for scripted computers attached to a factory.
//!
//! Scripts address processes with signed integers, so every index is
//! validated before it touches the process list.

use crate::factory::Factory;
use crate::fixed::{Fixed64, Ticks};
use crate::item::ItemStack;
use crate::recipe::RecipeLookup;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComputerError {
    #[error("process index {process} is out of bounds for a factory with {processes} processes")]
    ProcessOutOfBounds { process: i64, processes: usize },
}

/// Convert a script-supplied index into a process index.
pub fn check_process_index(process: i64, processes: usize) -> Result<usize, ComputerError> {
    usize::try_from(process)
        .ok()
        .filter(|&index| index < processes)
        .ok_or(ComputerError::ProcessOutOfBounds { process, processes })
}

impl<R: RecipeLookup> Factory<R> {
    fn computer_process(&self, process: i64) -> Result<usize, ComputerError> {
        check_process_index(process, self.processes.len())
    }

    pub fn get_recipe_progress(&self, process: i64) -> Result<u64, ComputerError> {
        let index = self.computer_process(process)?;
        Ok(self.processes[index].progress)
    }

    pub fn get_input(&self, process: i64) -> Result<Option<ItemStack>, ComputerError> {
        let index = self.computer_process(process)?;
        Ok(self.processes[index].input.stack().cloned())
    }

    pub fn get_output(&self, process: i64) -> Result<Option<ItemStack>, ComputerError> {
        let index = self.computer_process(process)?;
        Ok(self.processes[index].output.stack().cloned())
    }

    pub fn set_auto_sort(&mut self, enabled: bool) {
        self.set_sorting(enabled);
    }

    pub fn is_auto_sort_enabled(&self) -> bool {
        self.is_sorting()
    }

    /// Energy used during the last tick.
    pub fn get_energy_usage(&self) -> Fixed64 {
        self.last_energy_usage()
    }

    pub fn get_ticks_required(&self) -> Ticks {
        self.ticks_required()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::TickContext;
    use crate::test_utils::*;

    #[test]
    fn out_of_bounds_names_index_and_bound() {
        let err = check_process_index(7, 4).unwrap_err();
        assert_eq!(err, ComputerError::ProcessOutOfBounds { process: 7, processes: 4 });
        let message = err.to_string();
        assert!(message.contains('7'));
        assert!(message.contains('4'));
    }

    #[test]
    fn negative_index_is_rejected() {
        let factory = basic_factory();
        assert!(matches!(
            factory.get_recipe_progress(-1),
            Err(ComputerError::ProcessOutOfBounds { process: -1, processes: 3 })
        ));
        assert!(factory.get_input(3).is_err());
        assert!(factory.get_output(i64::MAX).is_err());
    }

    #[test]
    fn queries_reflect_factory_state() {
        let mut factory = powered(basic_factory());
        let _ = factory.insert_input(1, ore(3));
        factory.tick(TickContext::new(1));
        assert_eq!(factory.get_recipe_progress(1), Ok(1));
        assert_eq!(factory.get_input(1).unwrap().map(|s| s.count), Some(3));
        assert_eq!(factory.get_output(1), Ok(None));
        assert_eq!(factory.get_energy_usage(), factory.energy().per_tick());
        assert_eq!(factory.get_ticks_required(), 200);
    }

    #[test]
    fn auto_sort_toggle() {
        let mut factory = basic_factory();
        assert!(!factory.is_auto_sort_enabled());
        factory.set_auto_sort(true);
        assert!(factory.is_auto_sort_enabled());
        // The read model only catches up at the next tick.
        assert!(!factory.snapshot().sorting);
        factory.tick(TickContext::new(1));
        assert!(factory.snapshot().sorting);
    }
}
