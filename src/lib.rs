//! Hive Forage - per-agent behaviour engine for foraging swarms

pub mod core;
pub mod ecs;
pub mod entity;
pub mod goals;
pub mod harvest;
pub mod hive;
pub mod navigation;
pub mod simulation;
pub mod world;
