//! Agent state - the body goals act on, plus the arbiter that drives it

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{BlockPos, EntityId, HiveId};
use crate::entity::activity::ActivityState;
use crate::entity::behavior::{BehaviorConfig, BehaviorKind};
use crate::entity::inventory::Inventory;
use crate::goals::GoalArbiter;
use crate::navigation::Pathfinder;

/// Residency in a home structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeBinding {
    pub hive: HiveId,
    pub slot: usize,
}

/// Transient combat state
#[derive(Debug, Clone, Default)]
pub struct CombatState {
    pub last_attacker: Option<EntityId>,
    pub enraged_ticks: u32,
    pub attack_cooldown: u32,
}

impl CombatState {
    pub fn is_enraged(&self) -> bool {
        self.enraged_ticks > 0
    }

    pub fn provoke(&mut self, attacker: EntityId, ticks: u32) {
        self.last_attacker = Some(attacker);
        self.enraged_ticks = self.enraged_ticks.max(ticks);
    }

    pub fn calm(&mut self) {
        self.last_attacker = None;
        self.enraged_ticks = 0;
    }

    /// Count down; the attacker is forgotten once the rage wears off
    pub fn tick(&mut self) {
        self.attack_cooldown = self.attack_cooldown.saturating_sub(1);
        if self.enraged_ticks > 0 {
            self.enraged_ticks -= 1;
            if self.enraged_ticks == 0 {
                self.last_attacker = None;
            }
        }
    }
}

/// Everything about an agent except its goals
#[derive(Debug, Clone)]
pub struct AgentBody {
    pub id: EntityId,
    pub position: Vec3,
    /// Yaw in radians
    pub facing: f32,
    health: f32,
    pub activity: ActivityState,
    pub behavior: BehaviorConfig,
    pub home: Option<HomeBinding>,
    pub manual_target: Option<BlockPos>,
    pub inventory: Inventory,
    pub combat: CombatState,
    /// Forager yield; delivered on entering the hive
    pub carrying_nectar: bool,
    pub fleeing: bool,
    pub navigator: Pathfinder,
}

impl AgentBody {
    pub fn new(behavior: BehaviorConfig, position: Vec3) -> Self {
        Self {
            id: EntityId::new(),
            position,
            facing: 0.0,
            health: behavior.max_health,
            activity: ActivityState::Idle,
            inventory: Inventory::new(behavior.inventory_slots),
            behavior,
            home: None,
            manual_target: None,
            combat: CombatState::default(),
            carrying_nectar: false,
            fleeing: false,
            navigator: Pathfinder::new(),
        }
    }

    pub fn block_pos(&self) -> BlockPos {
        BlockPos::containing(self.position)
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn health_ratio(&self) -> f32 {
        self.health / self.behavior.max_health
    }

    pub fn set_health(&mut self, health: f32) {
        self.health = health.clamp(0.0, self.behavior.max_health);
    }

    pub fn damage(&mut self, amount: f32) {
        self.set_health(self.health - amount);
    }

    pub fn heal(&mut self, amount: f32) {
        self.set_health(self.health + amount);
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// In the world rather than inside the hive
    pub fn is_outside(&self) -> bool {
        self.activity != ActivityState::Resting
    }

    pub fn has_goods(&self) -> bool {
        self.carrying_nectar || !self.inventory.is_empty()
    }

    /// Inventory full or the configured return threshold reached
    pub fn wants_to_return(&self) -> bool {
        if self.behavior.kind != BehaviorKind::Harvester {
            return self.carrying_nectar;
        }
        self.inventory.is_full()
            || self
                .behavior
                .return_threshold
                .is_some_and(|threshold| self.inventory.total_count() >= threshold)
    }
}

/// A removed agent, suitable for storing and spawning again later
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedAgent {
    pub behavior: BehaviorConfig,
    pub health: f32,
    pub inventory: Inventory,
    pub carrying_nectar: bool,
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub body: AgentBody,
    pub arbiter: GoalArbiter,
}

impl Agent {
    pub fn new(behavior: BehaviorConfig, position: Vec3) -> Self {
        let arbiter = GoalArbiter::for_kind(behavior.kind);
        Self {
            body: AgentBody::new(behavior, position),
            arbiter,
        }
    }

    pub fn id(&self) -> EntityId {
        self.body.id
    }

    /// Snapshot of what survives capture; position, goals and combat do not
    pub fn capture(&self) -> CapturedAgent {
        CapturedAgent {
            behavior: self.body.behavior.clone(),
            health: self.body.health,
            inventory: self.body.inventory.clone(),
            carrying_nectar: self.body.carrying_nectar,
        }
    }

    pub fn from_captured(captured: CapturedAgent, position: Vec3) -> Self {
        let mut agent = Self::new(captured.behavior, position);
        agent.body.set_health(captured.health);
        agent.body.inventory = captured.inventory;
        agent.body.carrying_nectar = captured.carrying_nectar;
        agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::items::{ItemKind, ItemStack};

    #[test]
    fn test_health_is_clamped() {
        let mut body = AgentBody::new(BehaviorConfig::forager(), Vec3::ZERO);
        body.set_health(50.0);
        assert_eq!(body.health(), 10.0);
        body.damage(12.0);
        assert_eq!(body.health(), 0.0);
        assert!(!body.is_alive());
    }

    #[test]
    fn test_health_ratio() {
        let mut body = AgentBody::new(BehaviorConfig::forager(), Vec3::ZERO);
        body.set_health(2.5);
        assert!((body.health_ratio() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_harvester_return_threshold() {
        let mut behavior = BehaviorConfig::harvester();
        behavior.return_threshold = Some(10);
        let mut body = AgentBody::new(behavior, Vec3::ZERO);

        body.inventory.add_item(ItemStack::new(ItemKind::Carrot, 9));
        assert!(!body.wants_to_return());
        body.inventory.add_item(ItemStack::new(ItemKind::Carrot, 1));
        assert!(body.wants_to_return());
    }

    #[test]
    fn test_combat_rage_wears_off() {
        let mut combat = CombatState::default();
        let attacker = EntityId::new();
        combat.provoke(attacker, 2);
        assert!(combat.is_enraged());

        combat.tick();
        assert_eq!(combat.last_attacker, Some(attacker));
        combat.tick();
        assert!(!combat.is_enraged());
        assert_eq!(combat.last_attacker, None);
    }

    #[test]
    fn test_capture_keeps_cargo_and_health() {
        let mut agent = Agent::new(BehaviorConfig::harvester(), Vec3::ZERO);
        agent.body.set_health(4.0);
        agent.body.inventory.add_item(ItemStack::new(ItemKind::Wheat, 5));
        agent.body.manual_target = Some(BlockPos::new(3, 0, 3));

        let captured = agent.capture();
        let restored = Agent::from_captured(captured, Vec3::new(1.0, 0.0, 1.0));

        assert_ne!(restored.id(), agent.id());
        assert_eq!(restored.body.health(), 4.0);
        assert_eq!(restored.body.inventory.count_of(ItemKind::Wheat), 5);
        assert_eq!(restored.body.manual_target, None);
        assert_eq!(restored.body.activity, ActivityState::Idle);
    }
}
