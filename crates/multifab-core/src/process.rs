//! A single processing unit of a factory and its recipe cache.

use crate::item::{ItemStack, Slot};
use crate::recipe::Recipe;

/// Memoized recipe match for one process.
///
/// Never trusted blindly: every use re-checks it against the current input
/// (and, for lookups, the extra and output slots) before returning it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRecipe {
    recipe: Recipe,
}

impl CachedRecipe {
    pub fn new(recipe: Recipe) -> Self {
        Self { recipe }
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    /// True if the cached recipe still applies to `input`'s item type.
    pub fn matches_input(&self, input: &ItemStack) -> bool {
        self.recipe.accepts_input_type(input)
    }

    /// True if the cached recipe applies to `input` and `extra`, and its
    /// outputs can still stack onto the current output contents.
    pub fn matches(
        &self,
        input: &ItemStack,
        extra: Option<&ItemStack>,
        output: &Slot,
        secondary: Option<&Slot>,
    ) -> bool {
        self.matches_input(input)
            && self.recipe.accepts_secondary_input(extra)
            && self.recipe.outputs_compatible(output, secondary)
    }
}

/// One independently scheduled recipe slot of a factory.
///
/// Slots live for the factory's whole lifetime; progress belongs to the
/// process index, not to whatever item currently sits in the input.
#[derive(Debug, Clone)]
pub struct Process {
    pub(crate) index: usize,
    pub(crate) input: Slot,
    pub(crate) output: Slot,
    pub(crate) secondary_output: Option<Slot>,
    pub(crate) progress: u64,
    pub(crate) active: bool,
    pub(crate) cached: Option<CachedRecipe>,
}

impl Process {
    pub fn new(index: usize, with_secondary_output: bool) -> Self {
        Self {
            index,
            input: Slot::new(),
            output: Slot::new(),
            secondary_output: with_secondary_output.then(Slot::new),
            progress: 0,
            active: false,
            cached: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn input(&self) -> &Slot {
        &self.input
    }

    pub fn output(&self) -> &Slot {
        &self.output
    }

    pub fn secondary_output(&self) -> Option<&Slot> {
        self.secondary_output.as_ref()
    }

    pub fn progress(&self) -> u64 {
        self.progress
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn cached_recipe(&self) -> Option<&CachedRecipe> {
        self.cached.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{ItemTypeId, RecipeId};
    use crate::recipe::RecipeInput;

    fn recipe() -> Recipe {
        Recipe {
            id: RecipeId(0),
            input: RecipeInput { item_type: ItemTypeId(0), count: 2 },
            secondary_input: None,
            output: ItemStack::new(ItemTypeId(1), 1),
            secondary_output: None,
        }
    }

    #[test]
    fn cached_recipe_ignores_input_count() {
        let cached = CachedRecipe::new(recipe());
        assert!(cached.matches_input(&ItemStack::new(ItemTypeId(0), 1)));
        assert!(!cached.matches_input(&ItemStack::new(ItemTypeId(2), 1)));
    }

    #[test]
    fn cached_recipe_checks_output_contents() {
        let cached = CachedRecipe::new(recipe());
        let mut output = Slot::new();
        let _ = output.insert(ItemStack::new(ItemTypeId(5), 1));
        assert!(!cached.matches(&ItemStack::new(ItemTypeId(0), 4), None, &output, None));
        assert!(cached.matches(&ItemStack::new(ItemTypeId(0), 4), None, &Slot::new(), None));
    }

    #[test]
    fn cached_recipe_checks_extra_contents() {
        let cached = CachedRecipe::new(Recipe {
            secondary_input: Some(RecipeInput { item_type: ItemTypeId(7), count: 1 }),
            ..recipe()
        });
        let input = ItemStack::new(ItemTypeId(0), 2);
        let extra = ItemStack::new(ItemTypeId(7), 3);
        assert!(!cached.matches(&input, None, &Slot::new(), None));
        assert!(cached.matches(&input, Some(&extra), &Slot::new(), None));
    }

    #[test]
    fn new_process_is_idle() {
        let process = Process::new(2, true);
        assert_eq!(process.index(), 2);
        assert_eq!(process.progress(), 0);
        assert!(!process.is_active());
        assert!(process.secondary_output().is_some());
        assert!(process.cached_recipe().is_none());
    }
}
