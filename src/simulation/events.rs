//! Events produced by a simulation tick

use serde::Serialize;

use crate::core::types::{BlockPos, EntityId, HiveId, Tick};
use crate::goals::GoalKind;

/// Events generated during a simulation tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimulationEvent {
    /// The arbiter handed control to a different goal
    GoalChanged {
        agent: EntityId,
        from: Option<GoalKind>,
        to: Option<GoalKind>,
        tick: Tick,
    },
    /// Agent arrived at a node and began working it
    WorkStarted { agent: EntityId, pos: BlockPos },
    /// Forager finished working a flower
    Pollinated { agent: EntityId, pos: BlockPos },
    /// Harvester collected items from a node
    Harvested {
        agent: EntityId,
        pos: BlockPos,
        items: u32,
    },
    /// Harvest yield that did not fit in the inventory
    ItemsDropped { agent: EntityId, items: u32 },
    /// Nothing to work; agent is heading home
    NoResource { agent: EntityId },
    /// Seeking took too long
    SeekTimedOut { agent: EntityId, tick: Tick },
    /// Returning took too long; agent was moved next to its hive
    ReturnTimedOut { agent: EntityId, relocated_to: BlockPos },
    EnteredHive { agent: EntityId, hive: HiveId },
    LeftHive { agent: EntityId, hive: HiveId },
    /// Agent reached the target of an external directive
    DirectiveReached { agent: EntityId, pos: BlockPos },
    /// Combat: attacker hit target
    AttackLanded {
        attacker: EntityId,
        target: EntityId,
        damage: f32,
    },
    AgentDied { agent: EntityId },
    IntruderDefeated { intruder: EntityId },
}
