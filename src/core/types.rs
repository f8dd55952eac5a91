//! Core type definitions used throughout the codebase

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for agents and other actors (intruders, players)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulation tick counter
pub type Tick = u64;

/// Identifier of a home structure (index into the hive registry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HiveId(pub u32);

/// Integer grid coordinate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Grid cell containing a continuous position
    pub fn containing(pos: Vec3) -> Self {
        Self::new(
            pos.x.floor() as i32,
            pos.y.floor() as i32,
            pos.z.floor() as i32,
        )
    }

    /// Centre of the cell in continuous space
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            self.x as f32 + 0.5,
            self.y as f32 + 0.5,
            self.z as f32 + 0.5,
        )
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn above(&self) -> Self {
        self.offset(0, 1, 0)
    }

    pub fn distance_sq(&self, other: &Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }

    /// Straight-line distance between cell coordinates
    pub fn distance(&self, other: &Self) -> f32 {
        (self.distance_sq(other) as f32).sqrt()
    }

    /// Distance from a continuous position to this cell's centre
    pub fn distance_to_point(&self, pos: Vec3) -> f32 {
        self.center().distance(pos)
    }

    /// All 26 surrounding cells, with the offset that reaches each
    pub fn neighbors(&self) -> impl Iterator<Item = (BlockPos, [i32; 3])> + '_ {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1).filter_map(move |dz| {
                    if dx == 0 && dy == 0 && dz == 0 {
                        None
                    } else {
                        Some((self.offset(dx, dy, dz), [dx, dy, dz]))
                    }
                })
            })
        })
    }

    /// The six face-adjacent cells
    pub fn face_neighbors(&self) -> [BlockPos; 6] {
        [
            self.offset(0, 1, 0),
            self.offset(1, 0, 0),
            self.offset(-1, 0, 0),
            self.offset(0, 0, 1),
            self.offset(0, 0, -1),
            self.offset(0, -1, 0),
        ]
    }

    /// Every cell within `radius` (Euclidean) of this one, in a fixed order
    pub fn within_radius(&self, radius: i32) -> impl Iterator<Item = BlockPos> + '_ {
        let r = radius.max(0);
        let limit = (r as i64) * (r as i64);
        (-r..=r).flat_map(move |dx| {
            (-r..=r).flat_map(move |dy| {
                (-r..=r).filter_map(move |dz| {
                    let pos = self.offset(dx, dy, dz);
                    (self.distance_sq(&pos) <= limit).then_some(pos)
                })
            })
        })
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
