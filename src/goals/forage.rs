//! Pollination: work a flower, carry nectar home

use crate::entity::activity::ResourceClaim;
use crate::entity::agent::AgentBody;
use crate::entity::behavior::BehaviorKind;
use crate::goals::context::GoalContext;
use crate::goals::resource_run;
use crate::goals::{GoalBehavior, GoalKind};
use crate::simulation::events::SimulationEvent;

#[derive(Debug, Clone, Copy, Default)]
pub struct ForageGoal;

fn pollinated(body: &mut AgentBody, ctx: &mut GoalContext, claim: ResourceClaim) {
    tracing::debug!(agent = ?body.id, pos = %claim.pos, "Pollinated");
    body.carrying_nectar = true;
    ctx.events.push(SimulationEvent::Pollinated {
        agent: body.id,
        pos: claim.pos,
    });
    resource_run::begin_return(body, ctx);
}

impl GoalBehavior for ForageGoal {
    fn kind(&self) -> GoalKind {
        GoalKind::Forage
    }

    fn can_activate(&self, body: &AgentBody, ctx: &GoalContext) -> bool {
        resource_run::may_start(body, ctx, BehaviorKind::Forager)
    }

    fn can_continue(&self, body: &AgentBody, ctx: &GoalContext) -> bool {
        resource_run::may_continue(body, ctx, BehaviorKind::Forager)
    }

    fn start(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        resource_run::start(body, ctx);
    }

    fn tick(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        resource_run::tick(body, ctx, false, pollinated);
    }

    fn stop(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        resource_run::reset_after_stop(body, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BlockPos;
    use crate::entity::activity::ActivityState;
    use crate::entity::behavior::BehaviorConfig;
    use crate::goals::test_support::Harness;
    use crate::world::block::{Block, CollectibleKind, ResourceTag};
    use crate::world::grid::GridQuery;

    #[test]
    fn test_forager_pollinates_and_returns() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let flower = BlockPos::new(2, 1, 0);
        h.grid.set(flower, Block::Collectible(CollectibleKind::Dandelion));
        h.rescan();
        let mut body = h.resident(BehaviorConfig::forager().with_work_ticks(3));
        let mut goal = ForageGoal;

        {
            let ctx = h.ctx();
            assert!(goal.can_activate(&body, &ctx));
        }
        goal.start(&mut body, &mut h.ctx());

        let mut worked = Vec::new();
        for t in 0..200 {
            h.tick = t;
            goal.tick(&mut body, &mut h.ctx());
            if let Some(remaining) = body.activity.work_remaining() {
                worked.push(remaining);
            }
            if body.activity == ActivityState::Resting {
                break;
            }
        }

        assert_eq!(worked, vec![3, 2, 1]);
        assert_eq!(body.activity, ActivityState::Resting);
        assert!(!body.carrying_nectar);
        let hive = h.hives.iter().next().unwrap();
        assert_eq!(hive.honey_level(), 1);
        assert!(!hive.is_claimed(flower));
        // Flowers survive pollination
        assert!(h.grid.block_at(flower).has_tag(ResourceTag::Flowers));
    }

    #[test]
    fn test_inactive_without_home_or_while_enraged() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let homeless = AgentBody::new(BehaviorConfig::forager(), BlockPos::new(0, 1, 0).center());
        let mut enraged = h.resident(BehaviorConfig::forager());
        enraged.combat.provoke(crate::core::types::EntityId::new(), 10);
        let harvester = h.resident(BehaviorConfig::harvester());

        let ctx = h.ctx();
        assert!(!ForageGoal.can_activate(&homeless, &ctx));
        assert!(!ForageGoal.can_activate(&enraged, &ctx));
        assert!(!ForageGoal.can_activate(&harvester, &ctx));
    }
}
