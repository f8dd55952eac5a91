//! Everything a goal may touch while it runs

use ahash::AHashMap;
use glam::Vec3;
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::types::{EntityId, Tick};
use crate::hive::home::HiveRegistry;
use crate::simulation::events::SimulationEvent;
use crate::world::grid::GridQuery;

/// Where a potential combat target is this step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInfo {
    pub position: Vec3,
    pub alive: bool,
}

/// Positions of every agent and intruder, built once per step
pub type TargetIndex = AHashMap<EntityId, TargetInfo>;

/// A hit to be applied once all agents have stepped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackIntent {
    pub attacker: EntityId,
    pub target: EntityId,
    pub damage: f32,
}

/// Borrowed world state for one agent's turn
///
/// Each field is a disjoint borrow of the world, so the agent being stepped
/// is never reachable through it.
pub struct GoalContext<'a> {
    pub tick: Tick,
    pub config: &'a SimulationConfig,
    pub grid: &'a mut dyn GridQuery,
    pub hives: &'a mut HiveRegistry,
    pub targets: &'a TargetIndex,
    pub rng: &'a mut ChaCha8Rng,
    pub events: &'a mut Vec<SimulationEvent>,
    pub attacks: &'a mut Vec<AttackIntent>,
}

impl GoalContext<'_> {
    pub fn is_target_alive(&self, id: EntityId) -> bool {
        self.targets.get(&id).is_some_and(|t| t.alive)
    }
}
