//! World - owns the grid, hives, agents and intruders

use ahash::AHashMap;
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::{config, SimulationConfig};
use crate::core::error::{HiveError, Result};
use crate::core::types::{BlockPos, EntityId, HiveId, Tick};
use crate::entity::activity::ActivityState;
use crate::entity::agent::{Agent, CapturedAgent, HomeBinding};
use crate::entity::behavior::{BehaviorConfig, BehaviorKind};
use crate::goals::{AttackIntent, GoalContext, TargetIndex, TargetInfo};
use crate::hive::home::{Hive, HiveRegistry};
use crate::navigation::landing_spot;
use crate::simulation::events::SimulationEvent;
use crate::world::block::{Block, ResourceTag};
use crate::world::grid::GridWorld;

/// A hostile actor outside the agent population (a player, a predator)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intruder {
    pub position: Vec3,
    pub health: f32,
}

/// The simulated world
pub struct World {
    pub current_tick: Tick,
    pub config: SimulationConfig,
    pub grid: GridWorld,
    pub hives: HiveRegistry,
    pub agents: Vec<Agent>,
    pub intruders: AHashMap<EntityId, Intruder>,
    pub rng: ChaCha8Rng,
    pending_events: Vec<SimulationEvent>,
}

impl World {
    /// World using the process-wide config
    pub fn new(seed: u64) -> Self {
        Self::with_config(config().clone(), seed)
    }

    pub fn with_config(config: SimulationConfig, seed: u64) -> Self {
        Self {
            current_tick: 0,
            config,
            grid: GridWorld::new(),
            hives: HiveRegistry::new(),
            agents: Vec::new(),
            intruders: AHashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            pending_events: Vec::new(),
        }
    }

    pub fn tick(&mut self) {
        self.current_tick += 1;
    }

    // === HIVES ===

    /// Place a hive block and scan its surroundings straight away
    pub fn add_hive(&mut self, position: BlockPos, tag: ResourceTag) -> HiveId {
        self.grid.set(position, Block::Hive);
        let id = self.hives.add(
            position,
            self.config.hive_slots,
            tag,
            self.config.hive_scan_radius,
        );
        if let Some(hive) = self.hives.get_mut(id) {
            let found = hive.rescan(&self.grid, self.config.rescan_cooldown_ticks);
            tracing::info!(?id, %position, ?tag, found, "Hive placed");
        }
        id
    }

    pub fn hive(&self, id: HiveId) -> Option<&Hive> {
        self.hives.get(id)
    }

    // === AGENTS ===

    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    pub fn agent_mut(&mut self, id: EntityId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id() == id)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    fn index_of(&self, id: EntityId) -> Result<usize> {
        self.agents
            .iter()
            .position(|a| a.id() == id)
            .ok_or(HiveError::AgentNotFound(id))
    }

    /// Spawn an agent with the configured preset for `kind`
    pub fn spawn_agent(
        &mut self,
        kind: BehaviorKind,
        position: Vec3,
        home: Option<HiveId>,
    ) -> Result<EntityId> {
        let behavior = self.config.behavior(kind);
        self.spawn_with(behavior, position, home)
    }

    pub fn spawn_with(
        &mut self,
        behavior: BehaviorConfig,
        position: Vec3,
        home: Option<HiveId>,
    ) -> Result<EntityId> {
        behavior.validate().map_err(HiveError::InvalidConfig)?;
        self.insert_agent(Agent::new(behavior, position), home)
    }

    fn insert_agent(&mut self, mut agent: Agent, home: Option<HiveId>) -> Result<EntityId> {
        let id = agent.id();
        if let Some(hive_id) = home {
            agent.body.home = Some(self.bind_resident(id, hive_id)?);
        }
        tracing::debug!(agent = ?id, kind = ?agent.body.behavior.kind, ?home, "Agent spawned");
        self.agents.push(agent);
        Ok(id)
    }

    fn bind_resident(&mut self, agent: EntityId, hive_id: HiveId) -> Result<HomeBinding> {
        let hive = self
            .hives
            .get_mut(hive_id)
            .ok_or(HiveError::HiveNotFound(hive_id))?;
        let slot = hive
            .assign_resident(agent)
            .ok_or(HiveError::NoFreeSlot(hive_id))?;
        Ok(HomeBinding { hive: hive_id, slot })
    }

    /// Run `f` on one agent with the rest of the world lent out as a goal context
    pub(crate) fn with_goal_context<R>(
        &mut self,
        index: usize,
        targets: &TargetIndex,
        attacks: &mut Vec<AttackIntent>,
        f: impl FnOnce(&mut Agent, &mut GoalContext) -> R,
    ) -> R {
        let agent = &mut self.agents[index];
        let mut ctx = GoalContext {
            tick: self.current_tick,
            config: &self.config,
            grid: &mut self.grid,
            hives: &mut self.hives,
            targets,
            rng: &mut self.rng,
            events: &mut self.pending_events,
            attacks,
        };
        f(agent, &mut ctx)
    }

    /// Stop the agent's running goal, releasing whatever it holds
    fn stop_goals(&mut self, index: usize) {
        let targets = TargetIndex::default();
        let mut attacks = Vec::new();
        self.with_goal_context(index, &targets, &mut attacks, |agent, ctx| {
            agent.arbiter.stop_active(&mut agent.body, ctx);
        });
    }

    /// Remove an agent, returning its claim and its hive slot
    pub fn remove_agent(&mut self, id: EntityId) -> Result<Agent> {
        let index = self.index_of(id)?;
        self.stop_goals(index);
        let mut agent = self.agents.remove(index);
        if let Some(home) = agent.body.home.take() {
            if let Some(hive) = self.hives.get_mut(home.hive) {
                hive.remove_resident(home.slot);
            }
        }
        tracing::debug!(agent = ?id, "Agent removed");
        Ok(agent)
    }

    /// Remove an agent and keep what can be restored later
    pub fn capture_agent(&mut self, id: EntityId) -> Result<CapturedAgent> {
        Ok(self.remove_agent(id)?.capture())
    }

    pub fn release_captured(
        &mut self,
        captured: CapturedAgent,
        position: Vec3,
        home: Option<HiveId>,
    ) -> Result<EntityId> {
        captured
            .behavior
            .validate()
            .map_err(HiveError::InvalidConfig)?;
        self.insert_agent(Agent::from_captured(captured, position), home)
    }

    /// Move an agent into a (new) home, leaving any previous one
    ///
    /// Fails without touching the current home if the target hive is full.
    /// An agent resting inside its old hive comes out at the new one.
    pub fn assign_home(&mut self, id: EntityId, hive_id: HiveId) -> Result<usize> {
        let index = self.index_of(id)?;
        let hive = self.hives.get(hive_id).ok_or(HiveError::HiveNotFound(hive_id))?;
        let current = self.agents[index].body.home;
        if let Some(old) = current.filter(|old| old.hive == hive_id) {
            return Ok(old.slot);
        }
        if hive.free_slots() == 0 {
            return Err(HiveError::NoFreeSlot(hive_id));
        }
        let spot = landing_spot(&self.grid, hive.position);

        if let Some(old) = current {
            self.stop_goals(index);
            if let Some(hive) = self.hives.get_mut(old.hive) {
                hive.remove_resident(old.slot);
            }
            self.agents[index].body.home = None;
        }
        let binding = self.bind_resident(id, hive_id)?;

        let body = &mut self.agents[index].body;
        body.home = Some(binding);
        if matches!(body.activity, ActivityState::Resting | ActivityState::LeavingHome) {
            body.position = spot.center();
            body.activity = ActivityState::Idle;
            body.navigator.clear_path();
        }
        tracing::debug!(agent = ?id, hive = ?hive_id, slot = binding.slot, "Agent rehomed");
        Ok(binding.slot)
    }

    /// Stop whatever the agent is doing and forget its directive
    pub fn recall(&mut self, id: EntityId) -> Result<()> {
        let index = self.index_of(id)?;
        self.stop_goals(index);
        self.agents[index].body.manual_target = None;
        Ok(())
    }

    pub fn set_manual_target(&mut self, id: EntityId, target: Option<BlockPos>) -> Result<()> {
        let agent = self.agent_mut(id).ok_or(HiveError::AgentNotFound(id))?;
        agent.body.manual_target = target;
        Ok(())
    }

    pub fn set_health(&mut self, id: EntityId, health: f32) -> Result<()> {
        let agent = self.agent_mut(id).ok_or(HiveError::AgentNotFound(id))?;
        agent.body.set_health(health);
        Ok(())
    }

    pub fn health(&self, id: EntityId) -> Result<f32> {
        self.agent(id)
            .map(|a| a.body.health())
            .ok_or(HiveError::AgentNotFound(id))
    }

    /// Provoke the agent and rally nearby hive mates
    pub fn notify_attacked(&mut self, id: EntityId, attacker: EntityId) -> Result<()> {
        let index = self.index_of(id)?;
        let body = &mut self.agents[index].body;
        let enrage = body.behavior.aggression.enrage_ticks;
        body.combat.provoke(attacker, enrage);
        let (position, radius, hive) = (
            body.position,
            body.behavior.alert_radius,
            body.home.map(|h| h.hive),
        );

        let Some(hive) = hive else {
            return Ok(());
        };
        let mut rallied = 0;
        for mate in self.agents.iter_mut() {
            let body = &mut mate.body;
            if body.id == id
                || body.id == attacker
                || body.home.map(|h| h.hive) != Some(hive)
                || !body.is_outside()
                || !body.behavior.aggression.retaliates
                || body.position.distance(position) > radius
            {
                continue;
            }
            let enrage = body.behavior.aggression.enrage_ticks;
            body.combat.provoke(attacker, enrage);
            rallied += 1;
        }
        tracing::debug!(agent = ?id, ?attacker, rallied, "Agent attacked");
        Ok(())
    }

    /// Damage an agent on behalf of `attacker`
    pub fn attack_agent(&mut self, attacker: EntityId, target: EntityId, damage: f32) -> Result<()> {
        self.notify_attacked(target, attacker)?;
        let index = self.index_of(target)?;
        self.agents[index].body.damage(damage);
        self.pending_events.push(SimulationEvent::AttackLanded {
            attacker,
            target,
            damage,
        });
        Ok(())
    }

    // === INTRUDERS ===

    pub fn add_intruder(&mut self, position: Vec3, health: f32) -> EntityId {
        let id = EntityId::new();
        self.intruders.insert(id, Intruder { position, health });
        id
    }

    pub fn intruder(&self, id: EntityId) -> Option<&Intruder> {
        self.intruders.get(&id)
    }

    pub fn move_intruder(&mut self, id: EntityId, position: Vec3) -> Result<()> {
        let intruder = self
            .intruders
            .get_mut(&id)
            .ok_or(HiveError::AgentNotFound(id))?;
        intruder.position = position;
        Ok(())
    }

    // === STEP SUPPORT ===

    /// Where every agent and intruder is right now
    pub fn target_index(&self) -> TargetIndex {
        let mut index = TargetIndex::default();
        for agent in &self.agents {
            index.insert(
                agent.id(),
                TargetInfo {
                    position: agent.body.position,
                    alive: agent.body.is_alive(),
                },
            );
        }
        for (id, intruder) in &self.intruders {
            index.insert(
                *id,
                TargetInfo {
                    position: intruder.position,
                    alive: intruder.health > 0.0,
                },
            );
        }
        index
    }

    pub(crate) fn push_event(&mut self, event: SimulationEvent) {
        self.pending_events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
