//! Recipe definitions and the lookup capability the factory consumes.
//!
//! The factory never walks recipe tables itself. It is handed a
//! [`RecipeLookup`] at construction and asks it two questions: which recipe
//! applies to an input given what already sits in the extra and output
//! slots, and how many input items one operation of that recipe needs.

use crate::id::{ItemTypeId, RecipeId};
use crate::item::{ItemStack, Slot};
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Recipe types
// ---------------------------------------------------------------------------

/// The input requirement of a recipe. Matches on item type only; tags and
/// count are ignored when testing whether a stack is "this input".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeInput {
    pub item_type: ItemTypeId,
    pub count: u32,
}

/// A recipe with a main input, an optional co-input drawn from the
/// factory's shared extra slot, a main output and an optional secondary
/// output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: RecipeId,
    pub input: RecipeInput,
    pub secondary_input: Option<RecipeInput>,
    pub output: ItemStack,
    pub secondary_output: Option<ItemStack>,
}

impl Recipe {
    /// True if `stack` is the right kind of item for this recipe, ignoring count.
    pub fn accepts_input_type(&self, stack: &ItemStack) -> bool {
        stack.item_type == self.input.item_type
    }

    /// True if the extra slot contents satisfy this recipe's co-input by
    /// type. Recipes without a co-input accept anything, including nothing.
    pub fn accepts_secondary_input(&self, extra: Option<&ItemStack>) -> bool {
        match (&self.secondary_input, extra) {
            (None, _) => true,
            (Some(needed), Some(stack)) => stack.item_type == needed.item_type,
            (Some(_), None) => false,
        }
    }

    /// Co-input items one operation consumes from the extra slot.
    pub fn secondary_input_count(&self) -> u32 {
        self.secondary_input.as_ref().map_or(0, |input| input.count)
    }

    /// True if the outputs of this recipe can stack onto whatever already
    /// occupies the output slots. Free space is not considered.
    pub fn outputs_compatible(&self, output: &Slot, secondary: Option<&Slot>) -> bool {
        if !output.accepts_item(&self.output) {
            return false;
        }
        match (&self.secondary_output, secondary) {
            (Some(extra), Some(slot)) => slot.accepts_item(extra),
            _ => true,
        }
    }

    /// True if one operation's outputs fit completely in the output slots.
    pub fn outputs_fit(&self, output: &Slot, secondary: Option<&Slot>) -> bool {
        if !output.can_accept(&self.output) {
            return false;
        }
        match (&self.secondary_output, secondary) {
            (Some(extra), Some(slot)) => slot.can_accept(extra),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup capability
// ---------------------------------------------------------------------------

/// Recipe lookup capability supplied by the host.
pub trait RecipeLookup {
    /// Find the recipe for `input` (with `extra` as the co-input, if the
    /// factory has an extra slot) whose outputs are compatible with the
    /// current contents of the output slots. `None` means the process idles.
    fn find_recipe(
        &self,
        input: &ItemStack,
        extra: Option<&ItemStack>,
        output: &Slot,
        secondary: Option<&Slot>,
    ) -> Option<Recipe>;

    /// Input items one operation of `recipe` consumes from `input`.
    fn needed_input(&self, recipe: &Recipe, _input: &ItemStack) -> u32 {
        recipe.input.count
    }

    /// True if some recipe accepts this item at all, ignoring outputs.
    fn is_valid_input(&self, stack: &ItemStack) -> bool;

    /// True if some recipe takes this item as its co-input.
    fn is_valid_secondary_input(&self, stack: &ItemStack) -> bool;
}

impl<R: RecipeLookup + ?Sized> RecipeLookup for &R {
    fn find_recipe(
        &self,
        input: &ItemStack,
        extra: Option<&ItemStack>,
        output: &Slot,
        secondary: Option<&Slot>,
    ) -> Option<Recipe> {
        (**self).find_recipe(input, extra, output, secondary)
    }

    fn needed_input(&self, recipe: &Recipe, input: &ItemStack) -> u32 {
        (**self).needed_input(recipe, input)
    }

    fn is_valid_input(&self, stack: &ItemStack) -> bool {
        (**self).is_valid_input(stack)
    }

    fn is_valid_secondary_input(&self, stack: &ItemStack) -> bool {
        (**self).is_valid_secondary_input(stack)
    }
}

// ---------------------------------------------------------------------------
// Recipe table
// ---------------------------------------------------------------------------

/// Errors raised while building a [`RecipeTable`].
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("recipe {0:?} requires zero input items")]
    ZeroInput(RecipeId),
    #[error("recipe {0:?} produces an empty output")]
    EmptyOutput(RecipeId),
}

/// Builder for an immutable [`RecipeTable`].
#[derive(Debug, Default)]
pub struct RecipeTableBuilder {
    recipes: Vec<Recipe>,
}

impl RecipeTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe. Returns its ID.
    pub fn register(
        &mut self,
        input: RecipeInput,
        output: ItemStack,
        secondary_output: Option<ItemStack>,
    ) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(Recipe {
            id,
            input,
            secondary_input: None,
            output,
            secondary_output,
        });
        id
    }

    /// Register a recipe that also consumes `secondary_input` from the
    /// factory's extra slot. Returns its ID.
    pub fn register_with_secondary_input(
        &mut self,
        input: RecipeInput,
        secondary_input: RecipeInput,
        output: ItemStack,
    ) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(Recipe {
            id,
            input,
            secondary_input: Some(secondary_input),
            output,
            secondary_output: None,
        });
        id
    }

    pub fn build(self) -> Result<RecipeTable, RecipeError> {
        let mut by_input: HashMap<ItemTypeId, Vec<usize>> = HashMap::new();
        let mut secondary_inputs = HashSet::new();
        for (index, recipe) in self.recipes.iter().enumerate() {
            if recipe.input.count == 0 || recipe.secondary_input.as_ref().is_some_and(|s| s.count == 0) {
                return Err(RecipeError::ZeroInput(recipe.id));
            }
            let empty_secondary = recipe.secondary_output.as_ref().is_some_and(|s| s.is_empty());
            if recipe.output.is_empty() || empty_secondary {
                return Err(RecipeError::EmptyOutput(recipe.id));
            }
            by_input.entry(recipe.input.item_type).or_default().push(index);
            if let Some(extra) = &recipe.secondary_input {
                secondary_inputs.insert(extra.item_type);
            }
        }
        Ok(RecipeTable {
            recipes: self.recipes,
            by_input,
            secondary_inputs,
        })
    }
}

/// Immutable recipe table indexed by input item type.
///
/// When several recipes accept the same input, the first registered one whose
/// co-input matches the extra slot and whose outputs are compatible with the
/// output slots wins.
#[derive(Debug, Clone)]
pub struct RecipeTable {
    recipes: Vec<Recipe>,
    by_input: HashMap<ItemTypeId, Vec<usize>>,
    secondary_inputs: HashSet<ItemTypeId>,
}

impl RecipeTable {
    pub fn get(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl RecipeLookup for RecipeTable {
    fn find_recipe(
        &self,
        input: &ItemStack,
        extra: Option<&ItemStack>,
        output: &Slot,
        secondary: Option<&Slot>,
    ) -> Option<Recipe> {
        self.by_input
            .get(&input.item_type)?
            .iter()
            .map(|&index| &self.recipes[index])
            .find(|recipe| {
                recipe.accepts_secondary_input(extra) && recipe.outputs_compatible(output, secondary)
            })
            .cloned()
    }

    fn is_valid_input(&self, stack: &ItemStack) -> bool {
        self.by_input.contains_key(&stack.item_type)
    }

    fn is_valid_secondary_input(&self, stack: &ItemStack) -> bool {
        self.secondary_inputs.contains(&stack.item_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ore() -> ItemTypeId {
        ItemTypeId(0)
    }
    fn dust() -> ItemTypeId {
        ItemTypeId(1)
    }
    fn gravel() -> ItemTypeId {
        ItemTypeId(2)
    }

    fn table() -> RecipeTable {
        let mut builder = RecipeTableBuilder::new();
        builder.register(
            RecipeInput { item_type: ore(), count: 1 },
            ItemStack::new(dust(), 2),
            None,
        );
        builder.register(
            RecipeInput { item_type: ore(), count: 4 },
            ItemStack::new(gravel(), 1),
            None,
        );
        builder.build().unwrap()
    }

    #[test]
    fn find_recipe_by_input_type() {
        let table = table();
        let found = table.find_recipe(&ItemStack::new(ore(), 1), None, &Slot::new(), None);
        assert_eq!(found.map(|r| r.id), Some(RecipeId(0)));
    }

    #[test]
    fn find_recipe_skips_incompatible_output() {
        let table = table();
        let mut output = Slot::new();
        let _ = output.insert(ItemStack::new(gravel(), 3));
        let found = table.find_recipe(&ItemStack::new(ore(), 8), None, &output, None);
        assert_eq!(found.map(|r| r.id), Some(RecipeId(1)));
    }

    #[test]
    fn find_recipe_none_for_unknown_input() {
        let table = table();
        assert!(table.find_recipe(&ItemStack::new(dust(), 1), None, &Slot::new(), None).is_none());
        assert!(!table.is_valid_input(&ItemStack::new(dust(), 1)));
    }

    #[test]
    fn needed_input_defaults_to_recipe_count() {
        let table = table();
        let recipe = table.get(RecipeId(1)).unwrap();
        assert_eq!(table.needed_input(recipe, &ItemStack::new(ore(), 64)), 4);
    }

    #[test]
    fn build_rejects_zero_input() {
        let mut builder = RecipeTableBuilder::new();
        builder.register(
            RecipeInput { item_type: ore(), count: 0 },
            ItemStack::new(dust(), 1),
            None,
        );
        assert!(matches!(builder.build(), Err(RecipeError::ZeroInput(RecipeId(0)))));
    }

    #[test]
    fn co_input_recipe_needs_matching_extra() {
        let mut builder = RecipeTableBuilder::new();
        let id = builder.register_with_secondary_input(
            RecipeInput { item_type: dust(), count: 2 },
            RecipeInput { item_type: gravel(), count: 1 },
            ItemStack::new(ore(), 1),
        );
        let table = builder.build().unwrap();
        let input = ItemStack::new(dust(), 8);

        assert!(table.find_recipe(&input, None, &Slot::new(), None).is_none());
        let wrong = ItemStack::new(ore(), 1);
        assert!(table.find_recipe(&input, Some(&wrong), &Slot::new(), None).is_none());
        let extra = ItemStack::new(gravel(), 1);
        let found = table.find_recipe(&input, Some(&extra), &Slot::new(), None);
        assert_eq!(found.map(|r| r.id), Some(id));

        assert!(table.is_valid_secondary_input(&extra));
        assert!(!table.is_valid_secondary_input(&input));
    }

    #[test]
    fn build_rejects_zero_co_input() {
        let mut builder = RecipeTableBuilder::new();
        builder.register_with_secondary_input(
            RecipeInput { item_type: dust(), count: 1 },
            RecipeInput { item_type: gravel(), count: 0 },
            ItemStack::new(ore(), 1),
        );
        assert!(matches!(builder.build(), Err(RecipeError::ZeroInput(RecipeId(0)))));
    }

    #[test]
    fn outputs_fit_requires_secondary_slot() {
        let recipe = Recipe {
            id: RecipeId(0),
            input: RecipeInput { item_type: ore(), count: 1 },
            secondary_input: None,
            output: ItemStack::new(dust(), 1),
            secondary_output: Some(ItemStack::new(gravel(), 1)),
        };
        assert!(!recipe.outputs_fit(&Slot::new(), None));
        assert!(recipe.outputs_fit(&Slot::new(), Some(&Slot::new())));
    }
}
