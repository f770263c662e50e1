//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use std::cell::Cell;

use crate::config::FactoryConfig;
use crate::factory::Factory;
use crate::fixed::Ticks;
use crate::id::ItemTypeId;
use crate::item::{ItemStack, Slot};
use crate::recipe::{Recipe, RecipeInput, RecipeLookup, RecipeTable, RecipeTableBuilder};
use crate::tier::{FactoryTier, FactoryType};

// ===========================================================================
// Items
// ===========================================================================

/// Crushes into 2 [`dust`].
pub fn ore(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(0), count)
}
/// Needs 16 per operation; produces 1 [`plate`].
pub fn compressed_ore(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(1), count)
}
pub fn dust(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(2), count)
}
/// Processes into 1 [`ingot`].
pub fn iron_dust(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(3), count)
}
pub fn ingot(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(4), count)
}
pub fn plate(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(5), count)
}
/// Saws into 6 [`planks`] plus 1 [`sawdust`] as secondary output.
pub fn log(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(6), count)
}
pub fn planks(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(7), count)
}
pub fn sawdust(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(8), count)
}
/// Stacks to 16; needs 4 per operation; produces 1 [`plate`].
pub fn pearl(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(9), count).with_max_stack_size(16)
}
/// Combines 2 at a time with 1 [`clay`] from the extra slot into 1 [`brick`].
pub fn sand(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(10), count)
}
pub fn clay(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(11), count)
}
pub fn brick(count: u32) -> ItemStack {
    ItemStack::new(ItemTypeId(12), count)
}

fn input(stack: ItemStack, count: u32) -> RecipeInput {
    RecipeInput {
        item_type: stack.item_type,
        count,
    }
}

/// The recipe table every helper factory uses.
pub fn standard_recipes() -> RecipeTable {
    let mut builder = RecipeTableBuilder::new();
    builder.register(input(ore(1), 1), dust(2), None);
    builder.register(input(compressed_ore(1), 16), plate(1), None);
    builder.register(input(iron_dust(1), 1), ingot(1), None);
    builder.register(input(log(1), 1), planks(6), Some(sawdust(1)));
    builder.register(input(pearl(1), 4), plate(1), None);
    builder.register_with_secondary_input(input(sand(1), 2), input(clay(1), 1), brick(1));
    match builder.build() {
        Ok(table) => table,
        Err(e) => panic!("standard recipes are valid: {e}"),
    }
}

// ===========================================================================
// Counting lookup
// ===========================================================================

/// Wraps a lookup and counts full table lookups.
#[derive(Debug)]
pub struct CountingLookup<R> {
    inner: R,
    lookups: Cell<usize>,
}

impl<R> CountingLookup<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            lookups: Cell::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }
}

impl<R: RecipeLookup> RecipeLookup for CountingLookup<R> {
    fn find_recipe(
        &self,
        input: &ItemStack,
        extra: Option<&ItemStack>,
        output: &Slot,
        secondary: Option<&Slot>,
    ) -> Option<Recipe> {
        self.lookups.set(self.lookups.get() + 1);
        self.inner.find_recipe(input, extra, output, secondary)
    }

    fn needed_input(&self, recipe: &Recipe, input: &ItemStack) -> u32 {
        self.inner.needed_input(recipe, input)
    }

    fn is_valid_input(&self, stack: &ItemStack) -> bool {
        self.inner.is_valid_input(stack)
    }

    fn is_valid_secondary_input(&self, stack: &ItemStack) -> bool {
        self.inner.is_valid_secondary_input(stack)
    }
}

// ===========================================================================
// Factory builders
// ===========================================================================

pub fn factory_with_tier(tier: FactoryTier) -> Factory<RecipeTable> {
    Factory::new(
        FactoryType::Crushing,
        tier,
        standard_recipes(),
        FactoryConfig::default(),
    )
}

pub fn basic_factory() -> Factory<RecipeTable> {
    factory_with_tier(FactoryTier::Basic)
}

/// A factory whose operations take `ticks` ticks.
pub fn fast_factory(tier: FactoryTier, ticks: Ticks) -> Factory<RecipeTable> {
    Factory::new(
        FactoryType::Crushing,
        tier,
        standard_recipes(),
        FactoryConfig {
            base_ticks_required: ticks,
            ..FactoryConfig::default()
        },
    )
}

/// A Basic combining factory whose operations take `ticks` ticks.
pub fn combining_factory(ticks: Ticks) -> Factory<RecipeTable> {
    Factory::new(
        FactoryType::Combining,
        FactoryTier::Basic,
        standard_recipes(),
        FactoryConfig {
            base_ticks_required: ticks,
            ..FactoryConfig::default()
        },
    )
}

pub fn counting_factory(tier: FactoryTier) -> Factory<CountingLookup<RecipeTable>> {
    Factory::new(
        FactoryType::Crushing,
        tier,
        CountingLookup::new(standard_recipes()),
        FactoryConfig::default(),
    )
}

/// Fill the factory's energy buffer.
pub fn powered<R: RecipeLookup>(mut factory: Factory<R>) -> Factory<R> {
    let capacity = factory.energy().capacity();
    let _ = factory.insert_energy(capacity);
    factory
}

/// Input count of every process, in process order.
pub fn input_counts<R: RecipeLookup>(factory: &Factory<R>) -> Vec<u32> {
    factory.processes().iter().map(|p| p.input().count()).collect()
}
