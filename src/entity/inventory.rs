//! Inventory - bounded item storage carried by an agent

use serde::{Deserialize, Serialize};

use crate::harvest::items::{ItemKind, ItemStack, MAX_STACK};

/// Fixed number of slots, each holding one stack of a single item kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Try to add a stack, returns whatever did not fit
    pub fn add_item(&mut self, stack: ItemStack) -> Option<ItemStack> {
        let mut remaining = stack.count;

        // Top up existing stacks of the same item first
        for slot in self.slots.iter_mut().flatten() {
            if remaining == 0 {
                break;
            }
            if slot.item == stack.item {
                let space = MAX_STACK.saturating_sub(slot.count);
                let added = remaining.min(space);
                slot.count += added;
                remaining -= added;
            }
        }

        for slot in self.slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            if slot.is_none() {
                let added = remaining.min(MAX_STACK);
                *slot = Some(ItemStack::new(stack.item, added));
                remaining -= added;
            }
        }

        (remaining > 0).then(|| ItemStack::new(stack.item, remaining))
    }

    /// True once every slot holds a stack
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn total_count(&self) -> u32 {
        self.slots.iter().flatten().map(|s| s.count).sum()
    }

    pub fn count_of(&self, item: ItemKind) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.item == item)
            .map(|s| s.count)
            .sum()
    }

    pub fn stacks(&self) -> impl Iterator<Item = &ItemStack> {
        self.slots.iter().flatten()
    }

    /// Empty the inventory, returning everything it held
    pub fn drain(&mut self) -> Vec<ItemStack> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_add_merges_stacks() {
        let mut inv = Inventory::new(2);
        assert!(inv.add_item(ItemStack::new(ItemKind::Wheat, 10)).is_none());
        assert!(inv.add_item(ItemStack::new(ItemKind::Wheat, 5)).is_none());
        assert_eq!(inv.count_of(ItemKind::Wheat), 15);
        assert!(!inv.is_full());
    }

    #[test]
    fn test_inventory_returns_remainder() {
        let mut inv = Inventory::new(1);
        assert!(inv.add_item(ItemStack::new(ItemKind::Carrot, 60)).is_none());
        let remainder = inv.add_item(ItemStack::new(ItemKind::Carrot, 10));
        assert_eq!(remainder, Some(ItemStack::new(ItemKind::Carrot, 6)));

        // A different item has nowhere to go
        let remainder = inv.add_item(ItemStack::new(ItemKind::Potato, 3));
        assert_eq!(remainder, Some(ItemStack::new(ItemKind::Potato, 3)));
        assert!(inv.is_full());
        assert_eq!(inv.total_count(), 64);
    }

    #[test]
    fn test_inventory_splits_large_stacks() {
        let mut inv = Inventory::new(3);
        assert!(inv.add_item(ItemStack::new(ItemKind::WheatSeeds, 100)).is_none());
        assert_eq!(inv.stacks().count(), 2);
        assert_eq!(inv.total_count(), 100);
    }

    #[test]
    fn test_inventory_drain() {
        let mut inv = Inventory::new(2);
        inv.add_item(ItemStack::new(ItemKind::Poppy, 1));
        inv.add_item(ItemStack::new(ItemKind::Dandelion, 2));
        let drained = inv.drain();
        assert_eq!(drained.len(), 2);
        assert!(inv.is_empty());
        assert_eq!(inv.total_count(), 0);
    }

    #[test]
    fn test_zero_capacity_is_always_full() {
        let mut inv = Inventory::new(0);
        assert!(inv.is_full());
        let remainder = inv.add_item(ItemStack::new(ItemKind::Wheat, 1));
        assert_eq!(remainder, Some(ItemStack::new(ItemKind::Wheat, 1)));
    }
}
