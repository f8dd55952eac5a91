//! Home structure - resident slots, resource claims and stored yield

use ahash::AHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{BlockPos, EntityId, HiveId};
use crate::harvest::items::{ItemKind, ItemStack};
use crate::hive::allocator::ResourceAllocator;
use crate::world::block::ResourceTag;
use crate::world::grid::GridQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    Empty,
    Inside,
    Outside,
}

/// One reservation unit, bound to at most one resident
///
/// `cooldown` counts down the remaining rest while `Inside` and the wait
/// before seeking may resume while `Outside`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiveSlot {
    pub state: SlotState,
    pub resident: Option<EntityId>,
    pub cooldown: u32,
}

impl Default for HiveSlot {
    fn default() -> Self {
        Self {
            state: SlotState::Empty,
            resident: None,
            cooldown: 0,
        }
    }
}

/// Read-only view of a slot for telemetry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSnapshot {
    pub index: usize,
    pub state: SlotState,
    pub resident: Option<EntityId>,
    pub assigned: Option<BlockPos>,
    pub cooldown: u32,
}

#[derive(Debug, Clone)]
pub struct Hive {
    pub id: HiveId,
    pub position: BlockPos,
    pub resource_tag: ResourceTag,
    pub scan_radius: i32,
    slots: Vec<HiveSlot>,
    allocator: ResourceAllocator,
    storage: AHashMap<ItemKind, u32>,
    honey_level: u32,
    deliveries: u32,
}

impl Hive {
    pub fn new(
        id: HiveId,
        position: BlockPos,
        slot_count: usize,
        resource_tag: ResourceTag,
        scan_radius: i32,
    ) -> Self {
        Self {
            id,
            position,
            resource_tag,
            scan_radius,
            slots: vec![HiveSlot::default(); slot_count],
            allocator: ResourceAllocator::new(slot_count),
            storage: AHashMap::new(),
            honey_level: 0,
            deliveries: 0,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&HiveSlot> {
        self.slots.get(index)
    }

    pub fn free_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Empty)
            .count()
    }

    pub fn slot_of(&self, agent: EntityId) -> Option<usize> {
        self.slots.iter().position(|s| s.resident == Some(agent))
    }

    pub fn slot_cooldown(&self, index: usize) -> u32 {
        self.slots.get(index).map(|s| s.cooldown).unwrap_or(0)
    }

    pub fn snapshot(&self) -> Vec<SlotSnapshot> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| SlotSnapshot {
                index,
                state: slot.state,
                resident: slot.resident,
                assigned: self.allocator.assigned(index),
                cooldown: slot.cooldown,
            })
            .collect()
    }

    // === RESIDENTS ===

    /// Bind `agent` to the first empty slot; it starts outside
    pub fn assign_resident(&mut self, agent: EntityId) -> Option<usize> {
        let index = self.slots.iter().position(|s| s.state == SlotState::Empty)?;
        self.slots[index] = HiveSlot {
            state: SlotState::Outside,
            resident: Some(agent),
            cooldown: 0,
        };
        Some(index)
    }

    /// Free a slot, dropping any claim it still holds
    pub fn remove_resident(&mut self, index: usize) -> Option<EntityId> {
        let slot = self.slots.get_mut(index)?;
        let resident = slot.resident.take();
        *slot = HiveSlot::default();
        if let Some(coord) = self.allocator.release_slot(index) {
            tracing::debug!(hive = ?self.id, slot = index, %coord, "Claim dropped with resident");
        }
        resident
    }

    /// Take a returning resident inside and store what it brought
    ///
    /// Returns false if the slot is not currently outside.
    pub fn admit(
        &mut self,
        index: usize,
        goods: Vec<ItemStack>,
        nectar: bool,
        rest_ticks: u32,
        max_honey: u32,
    ) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        if slot.state != SlotState::Outside {
            return false;
        }
        slot.state = SlotState::Inside;
        slot.cooldown = rest_ticks;

        for stack in goods {
            *self.storage.entry(stack.item).or_insert(0) += stack.count;
        }
        if nectar {
            self.deliveries += 1;
            self.honey_level = (self.honey_level + 1).min(max_honey);
        }
        true
    }

    /// Put `agent`'s slot back outside with no cooldown
    ///
    /// Returns false if the slot is not bound to `agent`.
    pub fn rearm_outside(&mut self, index: usize, agent: EntityId) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.resident == Some(agent) => {
                slot.state = SlotState::Outside;
                slot.cooldown = 0;
                true
            }
            _ => false,
        }
    }

    /// Count down slot cooldowns
    ///
    /// Returns the slots whose residents finished resting this tick; those are
    /// now outside with `forage_cooldown` before they may seek again.
    pub fn tick_slots(&mut self, forage_cooldown: u32) -> Vec<usize> {
        let mut leaving = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            match slot.state {
                SlotState::Inside => {
                    slot.cooldown = slot.cooldown.saturating_sub(1);
                    if slot.cooldown == 0 {
                        slot.state = SlotState::Outside;
                        slot.cooldown = forage_cooldown;
                        leaving.push(index);
                    }
                }
                SlotState::Outside => slot.cooldown = slot.cooldown.saturating_sub(1),
                SlotState::Empty => {}
            }
        }
        leaving
    }

    // === RESOURCES ===

    pub fn acquire_resource<R, F>(&mut self, index: usize, rng: &mut R, accept: F) -> Option<BlockPos>
    where
        R: Rng,
        F: Fn(BlockPos) -> bool,
    {
        if self.slots.get(index).map(|s| s.state) != Some(SlotState::Outside) {
            return None;
        }
        self.allocator.acquire_where(index, rng, accept)
    }

    pub fn release_resource(&mut self, index: usize, coord: BlockPos) -> bool {
        self.allocator.release(index, coord)
    }

    pub fn is_claimed(&self, coord: BlockPos) -> bool {
        self.allocator.is_claimed(coord)
    }

    pub fn allocator(&self) -> &ResourceAllocator {
        &self.allocator
    }

    pub fn rescan(&mut self, grid: &dyn GridQuery, cooldown: u32) -> usize {
        self.allocator
            .rescan(grid, self.position, self.scan_radius, self.resource_tag, cooldown)
    }

    pub fn tick_rescan(&mut self, grid: &dyn GridQuery, cooldown: u32) -> bool {
        self.allocator
            .tick_rescan(grid, self.position, self.scan_radius, self.resource_tag, cooldown)
    }

    // === STORAGE ===

    pub fn stored(&self, item: ItemKind) -> u32 {
        self.storage.get(&item).copied().unwrap_or(0)
    }

    /// Stored items in a stable order
    pub fn stored_items(&self) -> Vec<(ItemKind, u32)> {
        let mut items: Vec<_> = self.storage.iter().map(|(k, v)| (*k, *v)).collect();
        items.sort();
        items
    }

    pub fn honey_level(&self) -> u32 {
        self.honey_level
    }

    /// Total nectar deliveries, including those past the honey cap
    pub fn deliveries(&self) -> u32 {
        self.deliveries
    }
}

/// All home structures in the world, indexed by `HiveId`
#[derive(Debug, Clone, Default)]
pub struct HiveRegistry {
    hives: Vec<Hive>,
}

impl HiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        position: BlockPos,
        slot_count: usize,
        resource_tag: ResourceTag,
        scan_radius: i32,
    ) -> HiveId {
        let id = HiveId(self.hives.len() as u32);
        self.hives
            .push(Hive::new(id, position, slot_count, resource_tag, scan_radius));
        id
    }

    pub fn get(&self, id: HiveId) -> Option<&Hive> {
        self.hives.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: HiveId) -> Option<&mut Hive> {
        self.hives.get_mut(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hive> {
        self.hives.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Hive> {
        self.hives.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.hives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hives.is_empty()
    }
}
