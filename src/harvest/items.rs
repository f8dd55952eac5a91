//! Items produced by harvesting

use serde::{Deserialize, Serialize};

/// Largest count a single stack may hold
pub const MAX_STACK: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    Wheat,
    WheatSeeds,
    Carrot,
    Potato,
    Beetroot,
    BeetrootSeeds,
    SweetBerries,
    NetherWart,
    Poppy,
    Dandelion,
    Cornflower,
    RedMushroom,
    BrownMushroom,
    AmethystShard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemKind,
    pub count: u32,
}

impl ItemStack {
    pub fn new(item: ItemKind, count: u32) -> Self {
        Self { item, count }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
