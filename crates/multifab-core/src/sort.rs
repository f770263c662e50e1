//! Inventory auto-sort: balance stacked inputs across processes.
//!
//! A sort pass runs in three steps:
//!
//! 1. **Group** -- non-empty inputs are grouped by [`HashedItem`] in process
//!    order; empty inputs are set aside as candidate targets.
//! 2. **Admit** -- a group with enough material for more processes than it
//!    occupies claims empty processes whose outputs accept its recipe output.
//! 3. **Distribute** -- each group's total is split evenly across its
//!    processes in multiples of the recipe's input batch (`min_per_slot`),
//!    never exceeding the item's max stack size.
//!
//! Only input placement changes. Progress belongs to the process index and
//! is left alone, and the item total of every group is preserved.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::factory::Factory;
use crate::item::HashedItem;
use crate::recipe::RecipeLookup;

/// Compute-once cell for a group's recipe batch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MinPerSlot {
    /// Resolved by a speculative lookup the first time it is read.
    Deferred,
    Resolved(u32),
}

/// The processes currently holding one item. Lives for a single sort pass.
#[derive(Debug)]
struct ItemGroup {
    item: HashedItem,
    processes: Vec<usize>,
    total_count: u32,
    min_per_slot: MinPerSlot,
    /// The total does not fit in a `u32`; the group is left as it is.
    overflowed: bool,
}

impl ItemGroup {
    fn new(item: HashedItem) -> Self {
        Self {
            item,
            processes: Vec::new(),
            total_count: 0,
            min_per_slot: MinPerSlot::Deferred,
            overflowed: false,
        }
    }
}

impl<R: RecipeLookup> Factory<R> {
    /// Run one sorting pass now, regardless of the enabled and armed flags.
    pub fn sort_inventory(&mut self) {
        let (mut groups, mut empty) = self.group_inputs();
        if groups.is_empty() {
            return;
        }
        if !empty.is_empty() {
            self.add_empty_slots_as_targets(&mut groups, &mut empty);
        }
        debug!(
            groups = groups.len(),
            unused_empty = empty.len(),
            "sorting factory inputs"
        );
        self.distribute_items(&mut groups);
    }

    fn group_inputs(&self) -> (Vec<ItemGroup>, Vec<usize>) {
        let mut groups: Vec<ItemGroup> = Vec::new();
        let mut group_of: HashMap<HashedItem, usize> = HashMap::new();
        let mut empty = Vec::new();

        for process in &self.processes {
            let Some(stack) = process.input.stack() else {
                empty.push(process.index);
                continue;
            };
            let key = HashedItem::of(stack);
            let slot = *group_of.entry(key.clone()).or_insert_with(|| {
                groups.push(ItemGroup::new(key));
                groups.len() - 1
            });
            let group = &mut groups[slot];
            group.processes.push(process.index);
            match group.total_count.checked_add(stack.count) {
                Some(total) => group.total_count = total,
                None => group.overflowed = true,
            }
            if group.min_per_slot == MinPerSlot::Deferred
                && let Some(recipe) = self.valid_cached_recipe(process.index, stack)
            {
                let needed = self.recipes.needed_input(recipe, stack).max(1);
                group.min_per_slot = MinPerSlot::Resolved(needed);
            }
        }
        groups.retain(|group| {
            if group.overflowed {
                warn!(
                    item = ?group.item.item_type(),
                    processes = ?group.processes,
                    "item total overflows while sorting; leaving group unsorted"
                );
            }
            !group.overflowed
        });
        (groups, empty)
    }

    /// Read the group's batch size, resolving it on first use by looking up
    /// the recipe the first process would run with a full stack.
    fn min_per_slot(&mut self, group: &mut ItemGroup) -> u32 {
        if let MinPerSlot::Resolved(min) = group.min_per_slot {
            return min;
        }
        let larger = group
            .item
            .create_stack(group.item.max_stack_size().min(group.total_count));
        let first = group.processes[0];
        let min = self
            .recipe_for_input(first, &larger, true)
            .map_or(1, |recipe| self.recipes.needed_input(&recipe, &larger).max(1));
        group.min_per_slot = MinPerSlot::Resolved(min);
        min
    }

    fn add_empty_slots_as_targets(&mut self, groups: &mut [ItemGroup], empty: &mut Vec<usize>) {
        for group in groups.iter_mut() {
            let min = self.min_per_slot(group);
            let max_slots = group.total_count / min;
            if max_slots <= 1 {
                continue;
            }
            let occupied = group.processes.len() as u32;
            if max_slots <= occupied {
                continue;
            }

            let wanted = (max_slots - occupied) as usize;
            let source = group
                .item
                .create_stack(group.item.max_stack_size().min(group.total_count));
            let mut added = 0;
            let mut i = 0;
            while i < empty.len() && added < wanted {
                let candidate = empty[i];
                if self.input_produces_output(candidate, &source, true) {
                    group.processes.push(candidate);
                    empty.remove(i);
                    added += 1;
                } else {
                    i += 1;
                }
            }
            if empty.is_empty() {
                break;
            }
        }
    }

    fn distribute_items(&mut self, groups: &mut [ItemGroup]) {
        for group in groups.iter_mut() {
            let count = group.processes.len() as u32;
            if count <= 1 {
                continue;
            }
            let max_stack = group.item.max_stack_size();
            let mut per_slot = group.total_count / count;
            if per_slot >= max_stack {
                continue;
            }
            let mut remainder = group.total_count % count;
            let mut increment = self.min_per_slot(group);
            if increment > 1 {
                let excess = per_slot % increment;
                if excess > 0 {
                    per_slot -= excess;
                    remainder += excess * count;
                }
                // remainder <= count * increment - 1 here, and when the cap
                // applies the total is < count * max_stack, so
                // remainder <= count * (max_stack - per_slot) - 1.
                if per_slot + increment > max_stack {
                    increment = max_stack - per_slot;
                }
            }

            group.processes.sort_unstable();
            for &index in &group.processes {
                let extra = remainder.min(increment);
                remainder -= extra;
                self.apply_sorted_size(index, &group.item, per_slot + extra);
            }
            debug_assert_eq!(remainder, 0, "distribution must place every item");
        }
    }

    fn apply_sorted_size(&mut self, index: usize, item: &HashedItem, size: u32) {
        let slot = &mut self.processes[index].input;
        if slot.is_empty() {
            // Group membership already implies the item is valid here.
            if size > 0 {
                slot.set_stack_unchecked(item.create_stack(size));
                self.sort.mark_needed();
            }
        } else if size == 0 {
            slot.set_empty();
            self.sort.mark_needed();
        } else if slot.count() != size {
            let actual = slot.set_stack_size(size);
            if actual != size {
                warn!(
                    process = index,
                    expected = size,
                    actual,
                    "input slot stored a different amount than requested while sorting"
                );
            }
            self.sort.mark_needed();
        }
    }
}
