//! Grid occupants and resource tags
//!
//! A resource node has no identity of its own: it is whatever block currently
//! sits at a coordinate, so every check re-reads the grid.

use serde::{Deserialize, Serialize};

/// Tag groups a resource node can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTag {
    Flowers,
    Crops,
    Mushrooms,
    Crystals,
}

/// Staged crops that are replanted after harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CropKind {
    Wheat,
    Carrots,
    Potatoes,
    Beetroots,
}

impl CropKind {
    pub fn max_age(&self) -> u8 {
        match self {
            CropKind::Beetroots => 3,
            _ => 7,
        }
    }
}

/// Age-gated plants that yield a single resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgedPlantKind {
    SweetBerryBush,
    NetherWart,
}

impl AgedPlantKind {
    pub fn max_age(&self) -> u8 {
        3
    }
}

/// Nodes that are consumed entirely when collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectibleKind {
    Poppy,
    Dandelion,
    Cornflower,
    RedMushroom,
    BrownMushroom,
    AmethystCluster,
}

/// What occupies a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Block {
    #[default]
    Air,
    Solid,
    Crop { kind: CropKind, age: u8 },
    AgedPlant { kind: AgedPlantKind, age: u8 },
    Collectible(CollectibleKind),
    Log,
    Leaves,
    Hive,
}

impl Block {
    /// Agents fly through open air and non-colliding plants
    pub fn is_traversable(&self) -> bool {
        matches!(
            self,
            Block::Air | Block::Crop { .. } | Block::AgedPlant { .. } | Block::Collectible(_)
        )
    }

    pub fn has_tag(&self, tag: ResourceTag) -> bool {
        match (tag, self) {
            (
                ResourceTag::Flowers,
                Block::Collectible(
                    CollectibleKind::Poppy | CollectibleKind::Dandelion | CollectibleKind::Cornflower,
                ),
            ) => true,
            (ResourceTag::Crops, Block::Crop { .. } | Block::AgedPlant { .. }) => true,
            (
                ResourceTag::Mushrooms,
                Block::Collectible(CollectibleKind::RedMushroom | CollectibleKind::BrownMushroom),
            ) => true,
            (ResourceTag::Crystals, Block::Collectible(CollectibleKind::AmethystCluster)) => true,
            _ => false,
        }
    }

    /// Advance growth by one stage; returns None if nothing changes
    pub fn grown(&self) -> Option<Block> {
        match *self {
            Block::Crop { kind, age } if age < kind.max_age() => {
                Some(Block::Crop { kind, age: age + 1 })
            }
            Block::AgedPlant { kind, age } if age < kind.max_age() => {
                Some(Block::AgedPlant { kind, age: age + 1 })
            }
            _ => None,
        }
    }

    pub fn is_growing(&self) -> bool {
        self.grown().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flowers_are_tagged() {
        assert!(Block::Collectible(CollectibleKind::Poppy).has_tag(ResourceTag::Flowers));
        assert!(!Block::Collectible(CollectibleKind::Poppy).has_tag(ResourceTag::Crops));
        assert!(!Block::Air.has_tag(ResourceTag::Flowers));
    }

    #[test]
    fn test_crops_tag_covers_aged_plants() {
        let wart = Block::AgedPlant { kind: AgedPlantKind::NetherWart, age: 0 };
        let wheat = Block::Crop { kind: CropKind::Wheat, age: 7 };
        assert!(wart.has_tag(ResourceTag::Crops));
        assert!(wheat.has_tag(ResourceTag::Crops));
    }

    #[test]
    fn test_traversability() {
        assert!(Block::Air.is_traversable());
        assert!(Block::Collectible(CollectibleKind::Dandelion).is_traversable());
        assert!(!Block::Solid.is_traversable());
        assert!(!Block::Hive.is_traversable());
        assert!(!Block::Log.is_traversable());
    }

    #[test]
    fn test_growth_stops_at_max_age() {
        let young = Block::Crop { kind: CropKind::Beetroots, age: 2 };
        let grown = young.grown().unwrap();
        assert_eq!(grown, Block::Crop { kind: CropKind::Beetroots, age: 3 });
        assert!(grown.grown().is_none());
        assert!(!Block::Collectible(CollectibleKind::Poppy).is_growing());
    }
}
