use crate::fixed::Fixed64;
use crate::id::{ItemTypeId, TagId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default maximum stack size for items that do not declare one.
pub const DEFAULT_MAX_STACK_SIZE: u32 = 64;

/// A stack of identical items.
///
/// Two stacks hold "the same" item when their type, max stack size and tags
/// all match; see [`HashedItem`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_type: ItemTypeId,
    pub count: u32,
    pub max_stack_size: u32,
    /// Tag data that distinguishes otherwise identical items.
    #[serde(default)]
    pub tags: BTreeMap<TagId, Fixed64>,
}

impl ItemStack {
    pub fn new(item_type: ItemTypeId, count: u32) -> Self {
        Self {
            item_type,
            count,
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
            tags: BTreeMap::new(),
        }
    }

    /// Builder-style override of the max stack size (minimum 1).
    pub fn with_max_stack_size(mut self, max_stack_size: u32) -> Self {
        self.max_stack_size = max_stack_size.max(1);
        self
    }

    /// Builder-style tag insertion.
    pub fn with_tag(mut self, tag: TagId, value: Fixed64) -> Self {
        self.tags.insert(tag, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True if `other` is the same item (ignoring count).
    pub fn is_same_item(&self, other: &ItemStack) -> bool {
        self.item_type == other.item_type
            && self.max_stack_size == other.max_stack_size
            && self.tags == other.tags
    }

    /// Copy of this stack with a different count.
    pub fn with_count(&self, count: u32) -> Self {
        Self {
            count,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// HashedItem
// ---------------------------------------------------------------------------

/// Value-equality key for an item ignoring its count.
///
/// Used to group process inputs that hold the same item so they can be
/// balanced against each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashedItem {
    item_type: ItemTypeId,
    max_stack_size: u32,
    tags: BTreeMap<TagId, Fixed64>,
}

impl HashedItem {
    pub fn of(stack: &ItemStack) -> Self {
        Self {
            item_type: stack.item_type,
            max_stack_size: stack.max_stack_size,
            tags: stack.tags.clone(),
        }
    }

    pub fn item_type(&self) -> ItemTypeId {
        self.item_type
    }

    pub fn max_stack_size(&self) -> u32 {
        self.max_stack_size
    }

    /// Create a stack of this item with the given count.
    pub fn create_stack(&self, count: u32) -> ItemStack {
        ItemStack {
            item_type: self.item_type,
            count,
            max_stack_size: self.max_stack_size,
            tags: self.tags.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// A single inventory slot holding at most one stack.
///
/// The effective capacity of a slot is the smaller of its own `limit` and
/// the max stack size of whatever it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    stack: Option<ItemStack>,
    limit: Option<u32>,
}

impl Slot {
    /// An empty slot bounded only by item max stack sizes.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty slot with an additional hard limit.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            stack: None,
            limit: Some(limit),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_none()
    }

    pub fn stack(&self) -> Option<&ItemStack> {
        self.stack.as_ref()
    }

    pub fn count(&self) -> u32 {
        self.stack.as_ref().map_or(0, |s| s.count)
    }

    /// Capacity of this slot for the given item.
    pub fn limit_for(&self, stack: &ItemStack) -> u32 {
        match self.limit {
            Some(limit) => limit.min(stack.max_stack_size),
            None => stack.max_stack_size,
        }
    }

    /// Replace the contents. The stack is clamped to the slot's capacity;
    /// returns the count actually stored.
    pub fn set_stack(&mut self, stack: Option<ItemStack>) -> u32 {
        match stack {
            Some(mut stack) if stack.count > 0 => {
                stack.count = stack.count.min(self.limit_for(&stack));
                let stored = stack.count;
                self.stack = Some(stack);
                stored
            }
            _ => {
                self.stack = None;
                0
            }
        }
    }

    /// Replace the contents without clamping to capacity.
    pub fn set_stack_unchecked(&mut self, stack: ItemStack) {
        self.stack = if stack.count == 0 { None } else { Some(stack) };
    }

    pub fn set_empty(&mut self) {
        self.stack = None;
    }

    /// Resize the held stack in place. Returns the resulting count, which is
    /// clamped to the slot's capacity and is 0 for an empty slot.
    pub fn set_stack_size(&mut self, size: u32) -> u32 {
        let Some(held) = self.stack.as_ref() else {
            return 0;
        };
        let size = size.min(self.limit_for(held));
        if size == 0 {
            self.stack = None;
        } else if let Some(stack) = self.stack.as_mut() {
            stack.count = size;
        }
        size
    }

    /// How many of `stack` could be merged into this slot.
    pub fn room_for(&self, stack: &ItemStack) -> u32 {
        match &self.stack {
            None => self.limit_for(stack),
            Some(held) if held.is_same_item(stack) => {
                self.limit_for(held).saturating_sub(held.count)
            }
            Some(_) => 0,
        }
    }

    /// True if the slot is empty or already holds the same item as `stack`,
    /// regardless of free space.
    pub fn accepts_item(&self, stack: &ItemStack) -> bool {
        self.stack.as_ref().is_none_or(|held| held.is_same_item(stack))
    }

    /// True if the whole of `stack` could be merged into this slot.
    pub fn can_accept(&self, stack: &ItemStack) -> bool {
        self.room_for(stack) >= stack.count
    }

    /// Merge `stack` into the slot. Returns the part that did not fit.
    #[must_use = "the remainder holds items that did not fit"]
    pub fn insert(&mut self, stack: ItemStack) -> Option<ItemStack> {
        let room = self.room_for(&stack);
        let moved = room.min(stack.count);
        if moved > 0 {
            match self.stack.as_mut() {
                Some(held) => held.count += moved,
                None => self.stack = Some(stack.with_count(moved)),
            }
        }
        let left = stack.count - moved;
        (left > 0).then(|| stack.with_count(left))
    }

    /// Remove up to `amount` items. Returns what was removed.
    pub fn extract(&mut self, amount: u32) -> Option<ItemStack> {
        let held = self.stack.as_mut()?;
        let taken = amount.min(held.count);
        if taken == 0 {
            return None;
        }
        let out = held.with_count(taken);
        held.count -= taken;
        if held.count == 0 {
            self.stack = None;
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ore(count: u32) -> ItemStack {
        ItemStack::new(ItemTypeId(0), count)
    }

    #[test]
    fn hashed_item_ignores_count() {
        assert_eq!(HashedItem::of(&ore(3)), HashedItem::of(&ore(40)));
    }

    #[test]
    fn hashed_item_respects_tags() {
        let tagged = ore(3).with_tag(TagId(1), Fixed64::from_num(2));
        assert_ne!(HashedItem::of(&tagged), HashedItem::of(&ore(3)));
    }

    #[test]
    fn create_stack_keeps_identity() {
        let key = HashedItem::of(&ore(1).with_max_stack_size(16));
        let stack = key.create_stack(9);
        assert_eq!(stack.count, 9);
        assert_eq!(stack.max_stack_size, 16);
        assert_eq!(HashedItem::of(&stack), key);
    }

    #[test]
    fn set_stack_clamps_to_max_stack_size() {
        let mut slot = Slot::new();
        assert_eq!(slot.set_stack(Some(ore(100))), 64);
        assert_eq!(slot.count(), 64);
    }

    #[test]
    fn set_stack_size_respects_limit() {
        let mut slot = Slot::with_limit(10);
        slot.set_stack_unchecked(ore(5));
        assert_eq!(slot.set_stack_size(20), 10);
        assert_eq!(slot.set_stack_size(0), 0);
        assert!(slot.is_empty());
    }

    #[test]
    fn set_stack_size_respects_item_max_below_limit() {
        let mut slot = Slot::with_limit(32);
        slot.set_stack_unchecked(ore(5).with_max_stack_size(16));
        assert_eq!(slot.set_stack_size(20), 16);
        assert_eq!(slot.count(), 16);
    }

    #[test]
    fn set_stack_size_on_empty_slot_is_zero() {
        let mut slot = Slot::new();
        assert_eq!(slot.set_stack_size(5), 0);
        assert!(slot.is_empty());
    }

    #[test]
    fn insert_merges_and_returns_remainder() {
        let mut slot = Slot::new();
        assert!(slot.insert(ore(60)).is_none());
        let left = slot.insert(ore(10)).unwrap();
        assert_eq!(left.count, 6);
        assert_eq!(slot.count(), 64);
    }

    #[test]
    fn insert_rejects_different_item() {
        let mut slot = Slot::new();
        let _ = slot.insert(ore(1));
        let other = ItemStack::new(ItemTypeId(1), 4);
        assert_eq!(slot.insert(other.clone()), Some(other));
    }

    #[test]
    fn extract_empties_slot() {
        let mut slot = Slot::new();
        let _ = slot.insert(ore(3));
        assert_eq!(slot.extract(5).unwrap().count, 3);
        assert!(slot.is_empty());
        assert!(slot.extract(1).is_none());
    }
}
