//! Harvest policy per resource-node kind
//!
//! Decides whether a node is ready and what harvesting does to it. `harvest`
//! is the only place in the core that mutates the grid.

use rand::Rng;

use crate::core::types::BlockPos;
use crate::harvest::items::{ItemKind, ItemStack};
use crate::world::block::{AgedPlantKind, Block, CollectibleKind, CropKind, ResourceTag};
use crate::world::grid::GridQuery;

/// How a grid occupant is treated by harvesters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestClass {
    /// Staged crop; harvested at max stage and replanted at stage zero
    RenewableCrop { kind: CropKind, age: u8 },
    /// Age-gated single-resource plant with the same replant rule
    RenewableSpecial { kind: AgedPlantKind, age: u8 },
    /// Consumed entirely; any state is harvestable
    SingleShot(CollectibleKind),
    /// Trees are not handled by this engine
    TreeLike,
    Unsupported,
}

impl HarvestClass {
    pub fn is_supported(&self) -> bool {
        !matches!(self, HarvestClass::TreeLike | HarvestClass::Unsupported)
    }
}

pub fn classify(block: Block) -> HarvestClass {
    match block {
        Block::Crop { kind, age } => HarvestClass::RenewableCrop { kind, age },
        Block::AgedPlant { kind, age } => HarvestClass::RenewableSpecial { kind, age },
        Block::Collectible(kind) => HarvestClass::SingleShot(kind),
        Block::Log | Block::Leaves => HarvestClass::TreeLike,
        Block::Air | Block::Solid | Block::Hive => HarvestClass::Unsupported,
    }
}

/// Whether `pos` still holds a resource node carrying `tag`
pub fn is_valid_resource(grid: &dyn GridQuery, pos: BlockPos, tag: ResourceTag) -> bool {
    grid.is_tagged_resource(pos, tag)
}

pub fn is_ready_to_harvest(grid: &dyn GridQuery, pos: BlockPos) -> bool {
    match classify(grid.block_at(pos)) {
        HarvestClass::RenewableCrop { kind, age } => age >= kind.max_age(),
        HarvestClass::RenewableSpecial { kind, age } => age >= kind.max_age(),
        HarvestClass::SingleShot(_) => true,
        HarvestClass::TreeLike | HarvestClass::Unsupported => false,
    }
}

/// Harvest the node at `pos`
///
/// Renewable nodes are replanted at stage zero with one propagule withheld
/// from the yield; single-shot nodes are removed. A node that is not ready
/// (including one already harvested) yields nothing and is left untouched.
pub fn harvest<R: Rng>(grid: &mut dyn GridQuery, pos: BlockPos, rng: &mut R) -> Vec<ItemStack> {
    if !is_ready_to_harvest(grid, pos) {
        return Vec::new();
    }

    match classify(grid.block_at(pos)) {
        HarvestClass::RenewableCrop { kind, .. } => {
            let (mut drops, propagule) = crop_drops(kind, rng);
            withhold_one(&mut drops, propagule);
            grid.mutate(pos, Block::Crop { kind, age: 0 });
            drops
        }
        HarvestClass::RenewableSpecial { kind, .. } => {
            let (mut drops, propagule) = aged_plant_drops(kind, rng);
            withhold_one(&mut drops, propagule);
            grid.mutate(pos, Block::AgedPlant { kind, age: 0 });
            drops
        }
        HarvestClass::SingleShot(kind) => {
            grid.mutate(pos, Block::Air);
            vec![collectible_drop(kind)]
        }
        HarvestClass::TreeLike | HarvestClass::Unsupported => Vec::new(),
    }
}

/// Break drops of a mature crop and the item it replants from
fn crop_drops<R: Rng>(kind: CropKind, rng: &mut R) -> (Vec<ItemStack>, ItemKind) {
    match kind {
        CropKind::Wheat => (
            vec![
                ItemStack::new(ItemKind::Wheat, 1),
                ItemStack::new(ItemKind::WheatSeeds, 1 + rng.gen_range(0..=2)),
            ],
            ItemKind::WheatSeeds,
        ),
        CropKind::Carrots => (
            vec![ItemStack::new(ItemKind::Carrot, 2 + rng.gen_range(0..=2))],
            ItemKind::Carrot,
        ),
        CropKind::Potatoes => (
            vec![ItemStack::new(ItemKind::Potato, 2 + rng.gen_range(0..=2))],
            ItemKind::Potato,
        ),
        CropKind::Beetroots => (
            vec![
                ItemStack::new(ItemKind::Beetroot, 1),
                ItemStack::new(ItemKind::BeetrootSeeds, 1 + rng.gen_range(0..=2)),
            ],
            ItemKind::BeetrootSeeds,
        ),
    }
}

fn aged_plant_drops<R: Rng>(kind: AgedPlantKind, rng: &mut R) -> (Vec<ItemStack>, ItemKind) {
    match kind {
        AgedPlantKind::SweetBerryBush => (
            vec![ItemStack::new(ItemKind::SweetBerries, 2 + rng.gen_range(0..=1))],
            ItemKind::SweetBerries,
        ),
        AgedPlantKind::NetherWart => (
            vec![ItemStack::new(ItemKind::NetherWart, 2 + rng.gen_range(0..=2))],
            ItemKind::NetherWart,
        ),
    }
}

fn collectible_drop(kind: CollectibleKind) -> ItemStack {
    match kind {
        CollectibleKind::Poppy => ItemStack::new(ItemKind::Poppy, 1),
        CollectibleKind::Dandelion => ItemStack::new(ItemKind::Dandelion, 1),
        CollectibleKind::Cornflower => ItemStack::new(ItemKind::Cornflower, 1),
        CollectibleKind::RedMushroom => ItemStack::new(ItemKind::RedMushroom, 1),
        CollectibleKind::BrownMushroom => ItemStack::new(ItemKind::BrownMushroom, 1),
        CollectibleKind::AmethystCluster => ItemStack::new(ItemKind::AmethystShard, 4),
    }
}

/// Remove one `item` from the drops, discarding a stack that empties
fn withhold_one(drops: &mut Vec<ItemStack>, item: ItemKind) {
    if let Some(stack) = drops.iter_mut().find(|s| s.item == item && s.count > 0) {
        stack.count -= 1;
    }
    drops.retain(|s| !s.is_empty());
}
