//! The grid the agents live in

pub mod block;
pub mod grid;

pub use block::{AgedPlantKind, Block, CollectibleKind, CropKind, ResourceTag};
pub use grid::{GridQuery, GridWorld};
