//! Harvesting: collect from nodes until full, then deliver

use crate::entity::activity::ResourceClaim;
use crate::entity::agent::AgentBody;
use crate::entity::behavior::BehaviorKind;
use crate::goals::context::GoalContext;
use crate::goals::resource_run;
use crate::goals::{GoalBehavior, GoalKind};
use crate::harvest::policy;
use crate::simulation::events::SimulationEvent;

#[derive(Debug, Clone, Copy, Default)]
pub struct HarvestGoal;

fn harvested(body: &mut AgentBody, ctx: &mut GoalContext, claim: ResourceClaim) {
    let yielded = policy::harvest(&mut *ctx.grid, claim.pos, &mut *ctx.rng);
    if yielded.is_empty() {
        // Someone got there first
        tracing::debug!(agent = ?body.id, pos = %claim.pos, "Node empty at harvest");
        resource_run::begin_seek(body, ctx);
        return;
    }

    let mut collected = 0;
    let mut dropped = 0;
    for stack in yielded {
        collected += stack.count;
        if let Some(rest) = body.inventory.add_item(stack) {
            dropped += rest.count;
        }
    }
    tracing::debug!(agent = ?body.id, pos = %claim.pos, collected, dropped, "Harvested");
    ctx.events.push(SimulationEvent::Harvested {
        agent: body.id,
        pos: claim.pos,
        items: collected - dropped,
    });
    if dropped > 0 {
        ctx.events.push(SimulationEvent::ItemsDropped {
            agent: body.id,
            items: dropped,
        });
    }

    if body.wants_to_return() {
        resource_run::begin_return(body, ctx);
    } else {
        resource_run::begin_seek(body, ctx);
    }
}

impl GoalBehavior for HarvestGoal {
    fn kind(&self) -> GoalKind {
        GoalKind::Harvest
    }

    fn can_activate(&self, body: &AgentBody, ctx: &GoalContext) -> bool {
        resource_run::may_start(body, ctx, BehaviorKind::Harvester)
    }

    fn can_continue(&self, body: &AgentBody, ctx: &GoalContext) -> bool {
        resource_run::may_continue(body, ctx, BehaviorKind::Harvester)
    }

    fn start(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        resource_run::start(body, ctx);
    }

    fn tick(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        resource_run::tick(body, ctx, true, harvested);
    }

    fn stop(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        resource_run::reset_after_stop(body, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BlockPos;
    use crate::entity::activity::{ActivityState, ResourceClaim};
    use crate::entity::behavior::BehaviorConfig;
    use crate::goals::test_support::Harness;
    use crate::harvest::items::{ItemKind, ItemStack};
    use crate::world::block::{Block, CropKind, ResourceTag};
    use crate::world::grid::GridQuery;

    fn ripe_wheat() -> Block {
        Block::Crop {
            kind: CropKind::Wheat,
            age: CropKind::Wheat.max_age(),
        }
    }

    #[test]
    fn test_harvest_replants_and_seeks_again() {
        let mut h = Harness::new(ResourceTag::Crops);
        let node = BlockPos::new(1, 1, 0);
        h.grid.set(node, ripe_wheat());
        let mut body = h.resident(BehaviorConfig::harvester().with_work_ticks(1));
        body.activity = ActivityState::Working {
            target: ResourceClaim::from_search(node),
            remaining: 1,
        };

        HarvestGoal.tick(&mut body, &mut h.ctx());

        assert_eq!(body.inventory.count_of(ItemKind::Wheat), 1);
        assert!(matches!(body.activity, ActivityState::SeekingResource { target: None, .. }));
        assert_eq!(
            h.grid.block_at(node),
            Block::Crop { kind: CropKind::Wheat, age: 0 }
        );
    }

    #[test]
    fn test_full_inventory_forces_return() {
        let mut h = Harness::new(ResourceTag::Crops);
        let node = BlockPos::new(1, 1, 0);
        h.grid.set(node, ripe_wheat());
        let mut behavior = BehaviorConfig::harvester();
        behavior.inventory_slots = 2;
        behavior.return_threshold = None;
        let mut body = h.resident(behavior);
        body.inventory.add_item(ItemStack::new(ItemKind::Carrot, 64));
        body.inventory.add_item(ItemStack::new(ItemKind::Potato, 64));
        assert!(body.inventory.is_full());
        body.activity = ActivityState::Working {
            target: ResourceClaim::from_search(node),
            remaining: 1,
        };

        HarvestGoal.tick(&mut body, &mut h.ctx());

        assert!(matches!(body.activity, ActivityState::Returning { .. }));
        assert!(h.events.iter().any(|e| matches!(e, SimulationEvent::ItemsDropped { .. })));
    }

    #[test]
    fn test_unripe_crop_is_not_targeted() {
        let mut h = Harness::new(ResourceTag::Crops);
        h.grid.set(
            BlockPos::new(2, 1, 0),
            Block::Crop { kind: CropKind::Carrots, age: 2 },
        );
        h.rescan();
        let mut body = h.resident(BehaviorConfig::harvester());
        let mut goal = HarvestGoal;

        goal.start(&mut body, &mut h.ctx());
        goal.tick(&mut body, &mut h.ctx());
        assert!(matches!(body.activity, ActivityState::Returning { .. }));
    }

    #[test]
    fn test_lost_race_goes_back_to_seeking() {
        let mut h = Harness::new(ResourceTag::Crops);
        let node = BlockPos::new(1, 1, 0);
        // Freshly replanted by another agent
        h.grid.set(node, Block::Crop { kind: CropKind::Wheat, age: 0 });
        let mut body = h.resident(BehaviorConfig::harvester());
        body.activity = ActivityState::Working {
            target: ResourceClaim::from_search(node),
            remaining: 1,
        };

        HarvestGoal.tick(&mut body, &mut h.ctx());
        assert!(body.inventory.is_empty());
        assert!(matches!(body.activity, ActivityState::SeekingResource { target: None, .. }));
    }
}
