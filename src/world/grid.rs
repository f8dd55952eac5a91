//! Grid world query surface
//!
//! `GridQuery` is everything the forager core needs from the world: block
//! lookups, tag membership and the single mutation used by harvesting.
//! `GridWorld` is a sparse in-memory implementation with an optional solid
//! ground plane.

use ahash::AHashMap;
use rand::Rng;

use crate::core::types::BlockPos;
use crate::world::block::{Block, ResourceTag};

pub trait GridQuery {
    fn block_at(&self, pos: BlockPos) -> Block;

    /// Replace the occupant of a cell
    fn mutate(&mut self, pos: BlockPos, block: Block);

    fn is_tagged_resource(&self, pos: BlockPos, tag: ResourceTag) -> bool {
        self.block_at(pos).has_tag(tag)
    }

    fn is_traversable(&self, pos: BlockPos) -> bool {
        self.block_at(pos).is_traversable()
    }

    /// All cells within `radius` of `center` carrying `tag`, in scan order
    fn scan_tagged(&self, center: BlockPos, radius: i32, tag: ResourceTag) -> Vec<BlockPos> {
        center
            .within_radius(radius)
            .filter(|pos| self.is_tagged_resource(*pos, tag))
            .collect()
    }
}

/// Sparse block storage; unset cells are air, or solid below the floor
#[derive(Debug, Clone, Default)]
pub struct GridWorld {
    blocks: AHashMap<BlockPos, Block>,
    floor_y: Option<i32>,
}

impl GridWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// A world whose cells below `floor_y` are solid ground
    pub fn with_floor(floor_y: i32) -> Self {
        Self {
            blocks: AHashMap::new(),
            floor_y: Some(floor_y),
        }
    }

    pub fn set(&mut self, pos: BlockPos, block: Block) {
        self.mutate(pos, block);
    }

    /// Fill the inclusive box between two corners
    pub fn fill(&mut self, from: BlockPos, to: BlockPos, block: Block) {
        for x in from.x.min(to.x)..=from.x.max(to.x) {
            for y in from.y.min(to.y)..=from.y.max(to.y) {
                for z in from.z.min(to.z)..=from.z.max(to.z) {
                    self.mutate(BlockPos::new(x, y, z), block);
                }
            }
        }
    }

    /// Number of explicitly stored cells
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn count_tagged(&self, tag: ResourceTag) -> usize {
        self.blocks.values().filter(|b| b.has_tag(tag)).count()
    }

    /// Positions of plants that can still grow, sorted for deterministic iteration
    pub fn growing_plants(&self) -> Vec<BlockPos> {
        let mut plants: Vec<BlockPos> = self
            .blocks
            .iter()
            .filter(|(_, block)| block.is_growing())
            .map(|(pos, _)| *pos)
            .collect();
        plants.sort_unstable();
        plants
    }

    /// Advance each growing plant one stage with probability `chance`
    ///
    /// Returns the number of plants that grew.
    pub fn grow_plants<R: Rng>(&mut self, rng: &mut R, chance: f32) -> usize {
        let mut grown = 0;
        for pos in self.growing_plants() {
            if !rng.gen_bool(chance.clamp(0.0, 1.0) as f64) {
                continue;
            }
            if let Some(next) = self.block_at(pos).grown() {
                self.mutate(pos, next);
                grown += 1;
            }
        }
        grown
    }
}

impl GridQuery for GridWorld {
    fn block_at(&self, pos: BlockPos) -> Block {
        if let Some(block) = self.blocks.get(&pos) {
            return *block;
        }
        match self.floor_y {
            Some(floor) if pos.y < floor => Block::Solid,
            _ => Block::Air,
        }
    }

    fn mutate(&mut self, pos: BlockPos, block: Block) {
        let implicit = match self.floor_y {
            Some(floor) if pos.y < floor => Block::Solid,
            _ => Block::Air,
        };
        if block == implicit {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, block);
        }
    }
}
