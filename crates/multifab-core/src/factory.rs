//! The multi-process factory: per-tick recipe driving, energy accounting and
//! the host-facing slot operations.
//!
//! # Tick pipeline
//!
//! Each call to [`Factory::tick`] runs, in order:
//!
//! 1. **Sort** -- if auto-sort is enabled and armed, disarm it and
//!    redistribute inputs (see [`crate::sort`]). A cache flush with nothing
//!    pending re-arms it for the next tick instead.
//! 2. **Process** -- every process looks up (or revalidates) its recipe and
//!    advances. Energy is snapshotted before this phase.
//! 3. **Publish** -- the union of active flags, the energy used and all
//!    progress counters are copied into a fresh [`FactorySnapshot`].

use std::sync::Arc;

use tracing::trace;

use crate::config::FactoryConfig;
use crate::dirty::SortTracker;
use crate::energy::EnergyContainer;
use crate::fixed::{Fixed64, Ticks, f64_to_fixed64};
use crate::item::{ItemStack, Slot};
use crate::process::{CachedRecipe, Process};
use crate::query::FactorySnapshot;
use crate::recipe::{Recipe, RecipeLookup};
use crate::sim::{TickContext, TickReport};
use crate::tier::{FactoryTier, FactoryType, Upgrades};

/// Outcome of driving a single process for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessOutcome {
    /// No recipe applies to the input; the process idles.
    NoRecipe,
    /// A recipe applies but something (input count, output room, energy)
    /// keeps it from running this tick.
    Blocked,
    Working,
    Completed,
}

/// A factory tile with `tier.processes()` independent recipe processes.
///
/// All mutation happens through `&mut self` on the host's tick thread. Other
/// threads read the published [`FactorySnapshot`] via [`Factory::snapshot`].
#[derive(Debug)]
pub struct Factory<R> {
    pub(crate) factory_type: FactoryType,
    pub(crate) tier: FactoryTier,
    pub(crate) config: FactoryConfig,
    pub(crate) recipes: R,
    pub(crate) processes: Vec<Process>,
    /// Co-input slot shared by every process, for types that have one.
    pub(crate) extra: Option<Slot>,
    pub(crate) upgrades: Upgrades,
    pub(crate) ticks_required: Ticks,
    pub(crate) energy: EnergyContainer,
    pub(crate) sort: SortTracker,
    pub(crate) last_usage: Fixed64,
    pub(crate) active: bool,
    /// The host's cache flush signal for the tick currently running.
    pub(crate) caches_flushed: bool,
    pub(crate) last_tick: Ticks,
    snapshot: Arc<FactorySnapshot>,
}

impl<R: RecipeLookup> Factory<R> {
    /// Build a factory. Sawing factories get a secondary output per process;
    /// combining, purifying, injecting and infusing factories get a shared
    /// extra slot for recipe co-inputs.
    pub fn new(factory_type: FactoryType, tier: FactoryTier, recipes: R, config: FactoryConfig) -> Self {
        let with_secondary = factory_type.has_secondary_output();
        let processes: Vec<Process> = (0..tier.processes())
            .map(|index| Process::new(index, with_secondary))
            .collect();
        let upgrades = Upgrades::default();
        let capacity = f64_to_fixed64(config.base_energy_capacity * processes.len() as f64);
        let energy = EnergyContainer::new(capacity, upgrades.energy_per_tick(&config));
        let ticks_required = upgrades.ticks_required(&config);
        let mut factory = Self {
            factory_type,
            tier,
            config,
            recipes,
            processes,
            extra: factory_type.has_extra_slot().then(Slot::new),
            upgrades,
            ticks_required,
            energy,
            sort: SortTracker::new(),
            last_usage: Fixed64::ZERO,
            active: false,
            caches_flushed: false,
            last_tick: 0,
            snapshot: Arc::new(FactorySnapshot {
                tier,
                tick: 0,
                progress: Vec::new(),
                process_active: Vec::new(),
                active: false,
                last_energy_usage: Fixed64::ZERO,
                ticks_required,
                sorting: false,
                energy_stored: Fixed64::ZERO,
                energy_capacity: capacity,
            }),
        };
        factory.publish_snapshot();
        factory
    }

    // -----------------------------------------------------------------------
    // Tick entry point
    // -----------------------------------------------------------------------

    /// Advance the factory by one host tick.
    pub fn tick(&mut self, ctx: TickContext) -> TickReport {
        self.caches_flushed = ctx.flush_recipe_caches;
        self.last_tick = ctx.tick;

        let mut report = TickReport::default();
        if self.sort.take_sort() {
            self.sort_inventory();
            report.sorted = true;
        } else if !self.sort.is_needed() && ctx.flush_recipe_caches {
            self.sort.on_cache_flush();
        }

        let before = self.energy.stored();
        for index in 0..self.processes.len() {
            match self.tick_process(index) {
                ProcessOutcome::NoRecipe | ProcessOutcome::Blocked => {
                    self.processes[index].active = false;
                }
                ProcessOutcome::Working => {}
                ProcessOutcome::Completed => report.operations_completed += 1,
            }
        }

        self.active = self.processes.iter().any(|p| p.active);
        self.last_usage = if self.active {
            before - self.energy.stored()
        } else {
            Fixed64::ZERO
        };
        report.active = self.active;
        report.energy_used = self.last_usage;

        self.caches_flushed = false;
        self.publish_snapshot();
        report
    }

    fn tick_process(&mut self, index: usize) -> ProcessOutcome {
        let Some(input) = self.processes[index].input.stack().cloned() else {
            self.processes[index].progress = 0;
            return ProcessOutcome::NoRecipe;
        };
        let Some(recipe) = self.recipe_for_input(index, &input, true) else {
            self.processes[index].progress = 0;
            return ProcessOutcome::NoRecipe;
        };
        let needed = self.recipes.needed_input(&recipe, &input).max(1);
        let co_needed = recipe.secondary_input_count();

        let process = &mut self.processes[index];
        let extra_count = self.extra.as_ref().map_or(0, Slot::count);
        let can_run = input.count >= needed
            && extra_count >= co_needed
            && recipe.outputs_fit(&process.output, process.secondary_output.as_ref())
            && self.energy.can_run_tick();
        if !can_run {
            return ProcessOutcome::Blocked;
        }
        let per_tick = self.energy.per_tick();
        if !self.energy.try_extract(per_tick) {
            return ProcessOutcome::Blocked;
        }

        process.active = true;
        process.progress += 1;
        if process.progress < self.ticks_required {
            return ProcessOutcome::Working;
        }

        process.progress = 0;
        let consumed = process.input.extract(needed).map_or(0, |s| s.count);
        debug_assert_eq!(consumed, needed, "an operation consumes exactly one batch");
        if co_needed > 0
            && let Some(extra) = self.extra.as_mut()
        {
            let consumed = extra.extract(co_needed).map_or(0, |s| s.count);
            debug_assert_eq!(consumed, co_needed, "an operation consumes exactly one co-input batch");
        }
        let overflow = process.output.insert(recipe.output.clone());
        debug_assert!(overflow.is_none(), "outputs_fit checked the main output");
        if let (Some(extra), Some(slot)) = (&recipe.secondary_output, process.secondary_output.as_mut()) {
            let overflow = slot.insert(extra.clone());
            debug_assert!(overflow.is_none(), "outputs_fit checked the secondary output");
        }
        self.sort.mark_needed();
        ProcessOutcome::Completed
    }

    // -----------------------------------------------------------------------
    // Recipe lookup & caching
    // -----------------------------------------------------------------------

    /// Find the recipe `process` would run for `input`.
    ///
    /// Unless the host flushed recipe caches this tick, the process's cached
    /// recipe is tried first and accepted only if it still matches `input`,
    /// the extra slot and the current output contents. Otherwise a full lookup runs; a hit
    /// replaces the cache when `update_cache` is set.
    pub fn recipe_for_input(
        &mut self,
        process: usize,
        input: &ItemStack,
        update_cache: bool,
    ) -> Option<Recipe> {
        let slots = self.processes.get(process)?;
        let extra = self.extra.as_ref().and_then(Slot::stack);
        if !self.caches_flushed
            && let Some(cached) = &slots.cached
            && cached.matches(input, extra, &slots.output, slots.secondary_output.as_ref())
        {
            return Some(cached.recipe().clone());
        }

        let found = self
            .recipes
            .find_recipe(input, extra, &slots.output, slots.secondary_output.as_ref());
        let Some(found) = found else {
            trace!(process, item = ?input.item_type, "no recipe matches input");
            return None;
        };
        if update_cache {
            self.processes[process].cached = Some(CachedRecipe::new(found.clone()));
        }
        Some(found)
    }

    /// True if the output slot of `process` is empty, or a recipe exists for
    /// `input` against its current output contents.
    pub fn input_produces_output(&mut self, process: usize, input: &ItemStack, update_cache: bool) -> bool {
        let Some(slots) = self.processes.get(process) else {
            return false;
        };
        if slots.output.is_empty() {
            return true;
        }
        self.recipe_for_input(process, input, update_cache).is_some()
    }

    /// The cached recipe of `process` if it is trustworthy this tick and still
    /// accepts `input`.
    pub(crate) fn valid_cached_recipe(&self, process: usize, input: &ItemStack) -> Option<&Recipe> {
        if self.caches_flushed {
            return None;
        }
        self.processes
            .get(process)?
            .cached
            .as_ref()
            .filter(|cached| cached.matches_input(input))
            .map(CachedRecipe::recipe)
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn factory_type(&self) -> FactoryType {
        self.factory_type
    }

    pub fn tier(&self) -> FactoryTier {
        self.tier
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn recipes(&self) -> &R {
        &self.recipes
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn process(&self, index: usize) -> Option<&Process> {
        self.processes.get(index)
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// The shared co-input slot; `None` for types without one.
    pub fn extra_slot(&self) -> Option<&Slot> {
        self.extra.as_ref()
    }

    pub fn progress(&self, index: usize) -> Option<u64> {
        self.processes.get(index).map(|p| p.progress)
    }

    pub fn ticks_required(&self) -> Ticks {
        self.ticks_required
    }

    pub fn upgrades(&self) -> Upgrades {
        self.upgrades
    }

    pub fn energy(&self) -> &EnergyContainer {
        &self.energy
    }

    /// Energy consumed during the last tick; zero if no process was active.
    pub fn last_energy_usage(&self) -> Fixed64 {
        self.last_usage
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_sorting(&self) -> bool {
        self.sort.is_enabled()
    }

    pub fn is_sorting_needed(&self) -> bool {
        self.sort.is_needed()
    }

    /// The view published at the end of the last tick.
    pub fn snapshot(&self) -> Arc<FactorySnapshot> {
        Arc::clone(&self.snapshot)
    }

    // -----------------------------------------------------------------------
    // Host-facing mutation
    // -----------------------------------------------------------------------

    pub fn set_sorting(&mut self, enabled: bool) {
        self.sort.set_enabled(enabled);
    }

    pub fn toggle_sorting(&mut self) {
        let enabled = !self.sort.is_enabled();
        self.sort.set_enabled(enabled);
    }

    /// Install upgrades and recalculate operation length and energy usage.
    /// Progress values are clamped to the new operation length.
    pub fn set_upgrades(&mut self, upgrades: Upgrades) {
        self.upgrades = upgrades.clamped();
        self.ticks_required = self.upgrades.ticks_required(&self.config);
        self.energy.set_per_tick(self.upgrades.energy_per_tick(&self.config));
        for process in &mut self.processes {
            process.progress = process.progress.min(self.ticks_required);
        }
    }

    /// Insert energy. Returns the amount that did not fit.
    pub fn insert_energy(&mut self, amount: Fixed64) -> Fixed64 {
        self.energy.insert(amount)
    }

    /// Merge `stack` into the input of `process`. Items no recipe accepts are
    /// refused. Returns whatever did not fit.
    #[must_use = "the remainder holds items that did not fit"]
    pub fn insert_input(&mut self, process: usize, stack: ItemStack) -> Option<ItemStack> {
        if stack.is_empty() {
            return None;
        }
        if !self.recipes.is_valid_input(&stack) {
            return Some(stack);
        }
        let Some(slot) = self.processes.get_mut(process).map(|p| &mut p.input) else {
            return Some(stack);
        };
        let before = slot.count();
        let left = slot.insert(stack);
        if slot.count() != before {
            self.sort.mark_needed();
        }
        left
    }

    /// Replace the input of `process` without recipe validation. Returns
    /// false for an unknown process.
    pub fn set_input(&mut self, process: usize, stack: Option<ItemStack>) -> bool {
        let Some(slot) = self.processes.get_mut(process).map(|p| &mut p.input) else {
            return false;
        };
        if slot.stack() != stack.as_ref() {
            slot.set_stack(stack);
            self.sort.mark_needed();
        }
        true
    }

    /// Merge `stack` into the extra slot. Items no recipe takes as a
    /// co-input, or any item when the factory has no extra slot, are refused.
    #[must_use = "the remainder holds items that did not fit"]
    pub fn insert_extra(&mut self, stack: ItemStack) -> Option<ItemStack> {
        if stack.is_empty() {
            return None;
        }
        if !self.recipes.is_valid_secondary_input(&stack) {
            return Some(stack);
        }
        let Some(slot) = self.extra.as_mut() else {
            return Some(stack);
        };
        let before = slot.count();
        let left = slot.insert(stack);
        if slot.count() != before {
            self.sort.mark_needed();
        }
        left
    }

    /// Remove up to `amount` items from the extra slot.
    pub fn take_extra(&mut self, amount: u32) -> Option<ItemStack> {
        let taken = self.extra.as_mut()?.extract(amount);
        if taken.is_some() {
            self.sort.mark_needed();
        }
        taken
    }

    /// Remove up to `amount` items from the main output of `process`.
    pub fn take_output(&mut self, process: usize, amount: u32) -> Option<ItemStack> {
        let taken = self.processes.get_mut(process)?.output.extract(amount);
        if taken.is_some() {
            self.sort.mark_needed();
        }
        taken
    }

    /// Remove up to `amount` items from the secondary output of `process`.
    pub fn take_secondary_output(&mut self, process: usize, amount: u32) -> Option<ItemStack> {
        let taken = self
            .processes
            .get_mut(process)?
            .secondary_output
            .as_mut()?
            .extract(amount);
        if taken.is_some() {
            self.sort.mark_needed();
        }
        taken
    }

    // -----------------------------------------------------------------------
    // Snapshot publication
    // -----------------------------------------------------------------------

    /// Rebuild the read model and swap it in.
    pub(crate) fn publish_snapshot(&mut self) {
        self.snapshot = Arc::new(FactorySnapshot {
            tier: self.tier,
            tick: self.last_tick,
            progress: self.processes.iter().map(|p| p.progress).collect(),
            process_active: self.processes.iter().map(|p| p.active).collect(),
            active: self.active,
            last_energy_usage: self.last_usage,
            ticks_required: self.ticks_required,
            sorting: self.sort.is_enabled(),
            energy_stored: self.energy.stored(),
            energy_capacity: self.energy.capacity(),
        });
    }
}
