//! Behaviour goals competing for control of an agent
//!
//! Each goal is a variant of the closed `Goal` enum. The arbiter holds them in
//! priority order and decides every step which one runs.

pub mod arbiter;
pub mod context;
pub mod directive;
pub mod flee;
pub mod forage;
pub mod harvest;
pub mod resource_run;
pub mod retaliate;

use serde::{Deserialize, Serialize};

use crate::entity::agent::AgentBody;

pub use arbiter::GoalArbiter;
pub use context::{AttackIntent, GoalContext, TargetIndex, TargetInfo};
pub use directive::DirectiveGoal;
pub use flee::FleeGoal;
pub use forage::ForageGoal;
pub use harvest::HarvestGoal;
pub use retaliate::RetaliateGoal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    Flee,
    Retaliate,
    Forage,
    Harvest,
    FollowDirective,
}

impl std::fmt::Display for GoalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GoalKind::Flee => "flee",
            GoalKind::Retaliate => "retaliate",
            GoalKind::Forage => "forage",
            GoalKind::Harvest => "harvest",
            GoalKind::FollowDirective => "follow_directive",
        };
        f.write_str(name)
    }
}

/// Common capability of every goal
///
/// `stop` must be idempotent and must hand any held resource claim back to the
/// hive before returning.
pub trait GoalBehavior {
    fn kind(&self) -> GoalKind;

    /// May this goal take over now?
    fn can_activate(&self, body: &AgentBody, ctx: &GoalContext) -> bool;

    /// May this goal keep running once started?
    fn can_continue(&self, body: &AgentBody, ctx: &GoalContext) -> bool {
        self.can_activate(body, ctx)
    }

    fn start(&mut self, body: &mut AgentBody, ctx: &mut GoalContext);
    fn tick(&mut self, body: &mut AgentBody, ctx: &mut GoalContext);
    fn stop(&mut self, body: &mut AgentBody, ctx: &mut GoalContext);
}

#[derive(Debug, Clone)]
pub enum Goal {
    Flee(FleeGoal),
    Retaliate(RetaliateGoal),
    Forage(ForageGoal),
    Harvest(HarvestGoal),
    FollowDirective(DirectiveGoal),
}

impl Goal {
    fn inner(&self) -> &dyn GoalBehavior {
        match self {
            Goal::Flee(g) => g,
            Goal::Retaliate(g) => g,
            Goal::Forage(g) => g,
            Goal::Harvest(g) => g,
            Goal::FollowDirective(g) => g,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn GoalBehavior {
        match self {
            Goal::Flee(g) => g,
            Goal::Retaliate(g) => g,
            Goal::Forage(g) => g,
            Goal::Harvest(g) => g,
            Goal::FollowDirective(g) => g,
        }
    }
}

impl GoalBehavior for Goal {
    fn kind(&self) -> GoalKind {
        self.inner().kind()
    }

    fn can_activate(&self, body: &AgentBody, ctx: &GoalContext) -> bool {
        self.inner().can_activate(body, ctx)
    }

    fn can_continue(&self, body: &AgentBody, ctx: &GoalContext) -> bool {
        self.inner().can_continue(body, ctx)
    }

    fn start(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        self.inner_mut().start(body, ctx)
    }

    fn tick(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        self.inner_mut().tick(body, ctx)
    }

    fn stop(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        self.inner_mut().stop(body, ctx)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Owned world pieces for driving goals directly

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{AttackIntent, GoalContext, TargetIndex};
    use crate::core::config::SimulationConfig;
    use crate::core::types::{BlockPos, Tick};
    use crate::entity::agent::{AgentBody, HomeBinding};
    use crate::entity::behavior::BehaviorConfig;
    use crate::hive::home::HiveRegistry;
    use crate::simulation::events::SimulationEvent;
    use crate::world::block::{Block, ResourceTag};
    use crate::world::grid::GridWorld;

    pub struct Harness {
        pub tick: Tick,
        pub config: SimulationConfig,
        pub grid: GridWorld,
        pub hives: HiveRegistry,
        pub targets: TargetIndex,
        pub rng: ChaCha8Rng,
        pub events: Vec<SimulationEvent>,
        pub attacks: Vec<AttackIntent>,
    }

    impl Harness {
        /// Open air with a hive at the origin scanning for `tag`
        pub fn new(tag: ResourceTag) -> Self {
            let config = SimulationConfig::default();
            let mut grid = GridWorld::new();
            grid.set(BlockPos::new(0, 0, 0), Block::Hive);
            let mut hives = HiveRegistry::new();
            hives.add(BlockPos::new(0, 0, 0), 2, tag, 8);
            Self {
                tick: 0,
                config,
                grid,
                hives,
                targets: TargetIndex::default(),
                rng: ChaCha8Rng::seed_from_u64(7),
                events: Vec::new(),
                attacks: Vec::new(),
            }
        }

        pub fn ctx(&mut self) -> GoalContext<'_> {
            GoalContext {
                tick: self.tick,
                config: &self.config,
                grid: &mut self.grid,
                hives: &mut self.hives,
                targets: &self.targets,
                rng: &mut self.rng,
                events: &mut self.events,
                attacks: &mut self.attacks,
            }
        }

        pub fn rescan(&mut self) {
            for hive in self.hives.iter_mut() {
                hive.rescan(&self.grid, 100);
            }
        }

        /// A resident of hive 0, floating next to it
        pub fn resident(&mut self, behavior: BehaviorConfig) -> AgentBody {
            let mut body = AgentBody::new(behavior, BlockPos::new(0, 1, 0).center());
            let hive = self.hives.iter_mut().next().map(|h| (h.id, h.assign_resident(body.id)));
            if let Some((hive, Some(slot))) = hive {
                body.home = Some(HomeBinding { hive, slot });
            }
            body
        }
    }
}
