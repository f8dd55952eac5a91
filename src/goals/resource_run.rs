//! Seek, work and return - the loop shared by the forage and harvest goals
//!
//! Timeouts are absolute deadlines stored in the activity state and checked at
//! the top of each tick. Every path that leaves a state holding a claim goes
//! through `release_held` first.

use rand::seq::SliceRandom;

use crate::core::types::BlockPos;
use crate::entity::activity::{ActivityState, ClaimSource, ResourceClaim};
use crate::entity::agent::AgentBody;
use crate::entity::behavior::BehaviorKind;
use crate::goals::context::GoalContext;
use crate::harvest::policy::{is_ready_to_harvest, is_valid_resource};
use crate::hive::home::SlotState;
use crate::navigation::{landing_spot, navigate};
use crate::simulation::events::SimulationEvent;
use crate::world::block::ResourceTag;
use crate::world::grid::GridQuery;

/// Called when the work timer of a node runs out
pub type CompleteWork = fn(&mut AgentBody, &mut GoalContext, ResourceClaim);

/// Is `pos` still worth heading for?
pub fn node_usable(grid: &dyn GridQuery, pos: BlockPos, tag: ResourceTag, require_ready: bool) -> bool {
    is_valid_resource(grid, pos, tag) && (!require_ready || is_ready_to_harvest(grid, pos))
}

/// Hand the claim held by the current activity back to the hive
///
/// Area-search claims were never booked, so there is nothing to return.
/// The caller is expected to replace `body.activity` right after.
pub fn release_held(body: &AgentBody, ctx: &mut GoalContext) {
    let Some(claim) = body.activity.held_claim() else {
        return;
    };
    if claim.source != ClaimSource::Hive {
        return;
    }
    let Some(home) = body.home else {
        tracing::warn!(agent = ?body.id, pos = %claim.pos, "Hive claim held without a home");
        return;
    };
    if let Some(hive) = ctx.hives.get_mut(home.hive) {
        hive.release_resource(home.slot, claim.pos);
    }
}

/// Release, then drop back to idle if a goal owned the activity
pub fn reset_after_stop(body: &mut AgentBody, ctx: &mut GoalContext) {
    release_held(body, ctx);
    if body.activity.is_goal_driven() {
        body.activity = ActivityState::Idle;
    }
    body.navigator.clear_path();
}

pub fn begin_seek(body: &mut AgentBody, ctx: &mut GoalContext) {
    release_held(body, ctx);
    body.activity = ActivityState::seeking(ctx.tick, ctx.config.seek_timeout_ticks());
    body.navigator.clear_path();
}

pub fn begin_return(body: &mut AgentBody, ctx: &mut GoalContext) {
    release_held(body, ctx);
    body.activity = ActivityState::returning(ctx.tick, ctx.config.return_timeout_ticks());
    body.navigator.clear_path();
}

/// Gate shared by the forage and harvest goals
pub fn may_start(body: &AgentBody, ctx: &GoalContext, kind: BehaviorKind) -> bool {
    let Some(home) = body.home else {
        return false;
    };
    if body.behavior.kind != kind || body.fleeing || body.combat.is_enraged() || !body.is_outside() {
        return false;
    }
    let Some(hive) = ctx.hives.get(home.hive) else {
        return false;
    };
    body.wants_to_return() || hive.slot_cooldown(home.slot) == 0
}

pub fn may_continue(body: &AgentBody, ctx: &GoalContext, kind: BehaviorKind) -> bool {
    let Some(home) = body.home else {
        return false;
    };
    body.behavior.kind == kind
        && !body.fleeing
        && !body.combat.is_enraged()
        && body.activity.is_goal_driven()
        && ctx.hives.get(home.hive).is_some()
}

pub fn start(body: &mut AgentBody, ctx: &mut GoalContext) {
    if body.wants_to_return() {
        begin_return(body, ctx);
    } else {
        begin_seek(body, ctx);
    }
}

/// Advance whichever phase of the loop the agent is in
pub fn tick(body: &mut AgentBody, ctx: &mut GoalContext, require_ready: bool, complete: CompleteWork) {
    match body.activity {
        ActivityState::SeekingResource { .. } => tick_seeking(body, ctx, require_ready),
        ActivityState::Working { .. } => tick_working(body, ctx, complete),
        ActivityState::Returning { .. } => {
            let speed = body.behavior.flight_speed;
            tick_returning(body, ctx, speed);
        }
        _ => {}
    }
}

/// Pick a node: the hive's pool first, then the agent's own area search
fn obtain_resource(body: &AgentBody, ctx: &mut GoalContext, require_ready: bool) -> Option<ResourceClaim> {
    let home = body.home?;
    let tag = body.behavior.resource_tag;
    let grid: &dyn GridQuery = &*ctx.grid;
    let hive = ctx.hives.get_mut(home.hive)?;

    if let Some(pos) = hive.acquire_resource(home.slot, &mut *ctx.rng, |pos| {
        node_usable(grid, pos, tag, require_ready)
    }) {
        return Some(ResourceClaim::from_hive(pos));
    }

    // Not booked anywhere; two agents may pick the same node and the loser
    // finds it gone when it re-validates.
    let found: Vec<BlockPos> = grid
        .scan_tagged(body.block_pos(), body.behavior.search_radius, tag)
        .into_iter()
        .filter(|pos| !hive.is_claimed(*pos) && node_usable(grid, *pos, tag, require_ready))
        .collect();
    found
        .choose(&mut *ctx.rng)
        .copied()
        .map(ResourceClaim::from_search)
}

fn tick_seeking(body: &mut AgentBody, ctx: &mut GoalContext, require_ready: bool) {
    let ActivityState::SeekingResource { target, deadline } = body.activity else {
        return;
    };

    if ctx.tick >= deadline {
        tracing::debug!(agent = ?body.id, "Seek timed out");
        ctx.events.push(SimulationEvent::SeekTimedOut {
            agent: body.id,
            tick: ctx.tick,
        });
        begin_return(body, ctx);
        return;
    }

    let claim = match target {
        Some(claim) => claim,
        None => match obtain_resource(body, ctx, require_ready) {
            Some(claim) => {
                tracing::debug!(agent = ?body.id, pos = %claim.pos, source = ?claim.source, "Resource targeted");
                body.activity = ActivityState::SeekingResource {
                    target: Some(claim),
                    deadline,
                };
                claim
            }
            None => {
                tracing::debug!(agent = ?body.id, "No resource available");
                ctx.events.push(SimulationEvent::NoResource { agent: body.id });
                begin_return(body, ctx);
                return;
            }
        },
    };

    let tag = body.behavior.resource_tag;
    if !node_usable(&*ctx.grid, claim.pos, tag, require_ready) {
        tracing::debug!(agent = ?body.id, pos = %claim.pos, "Target went stale");
        release_held(body, ctx);
        body.activity = ActivityState::SeekingResource {
            target: None,
            deadline,
        };
        body.navigator.clear_path();
        return;
    }

    let speed = body.behavior.flight_speed;
    let distance = navigate(body, &*ctx.grid, claim.pos, speed, ctx.config);
    if distance <= body.behavior.reach_distance {
        body.activity = ActivityState::Working {
            target: claim,
            remaining: body.behavior.work_ticks,
        };
        body.navigator.clear_path();
        ctx.events.push(SimulationEvent::WorkStarted {
            agent: body.id,
            pos: claim.pos,
        });
    }
}

fn tick_working(body: &mut AgentBody, ctx: &mut GoalContext, complete: CompleteWork) {
    let ActivityState::Working { target, remaining } = body.activity else {
        return;
    };

    if !is_valid_resource(&*ctx.grid, target.pos, body.behavior.resource_tag) {
        tracing::debug!(agent = ?body.id, pos = %target.pos, "Node vanished while working");
        begin_seek(body, ctx);
        return;
    }

    let remaining = remaining.saturating_sub(1);
    if remaining > 0 {
        body.activity = ActivityState::Working { target, remaining };
        return;
    }
    complete(body, ctx, target);
}

/// Fly home and hand over to the hive
///
/// Shared with the flee goal, which flies faster.
pub fn tick_returning(body: &mut AgentBody, ctx: &mut GoalContext, speed: f32) {
    let Some(home) = body.home else {
        body.activity = ActivityState::Idle;
        return;
    };
    let Some(hive_pos) = ctx.hives.get(home.hive).map(|h| h.position) else {
        body.activity = ActivityState::Idle;
        return;
    };

    if body.activity.is_expired(ctx.tick) {
        let spot = landing_spot(&*ctx.grid, hive_pos);
        tracing::debug!(agent = ?body.id, %spot, "Return timed out, relocating");
        body.position = spot.center();
        body.navigator.clear_path();
        body.activity = ActivityState::returning(ctx.tick, ctx.config.return_timeout_ticks());
        ctx.events.push(SimulationEvent::ReturnTimedOut {
            agent: body.id,
            relocated_to: spot,
        });
    }

    let distance = navigate(body, &*ctx.grid, hive_pos, speed, ctx.config);
    if distance <= body.behavior.reach_distance {
        enter_hive(body, ctx);
    }
}

fn enter_hive(body: &mut AgentBody, ctx: &mut GoalContext) {
    let Some(home) = body.home else {
        return;
    };
    let Some(hive) = ctx.hives.get_mut(home.hive) else {
        return;
    };
    let outside = hive.slot(home.slot).map(|s| s.state) == Some(SlotState::Outside);
    if !outside && !hive.rearm_outside(home.slot, body.id) {
        // The binding no longer matches the hive; drop it rather than loop
        tracing::warn!(agent = ?body.id, hive = ?home.hive, slot = home.slot, "Slot not bound to this agent");
        let spot = landing_spot(&*ctx.grid, hive.position);
        body.position = spot.center();
        body.home = None;
        body.activity = ActivityState::Idle;
        body.navigator.clear_path();
        return;
    }

    let goods = body.inventory.drain();
    let delivered: u32 = goods.iter().map(|s| s.count).sum();
    hive.admit(
        home.slot,
        goods,
        body.carrying_nectar,
        ctx.config.rest_ticks,
        ctx.config.max_honey_level,
    );
    tracing::info!(
        agent = ?body.id,
        hive = ?home.hive,
        items = delivered,
        nectar = body.carrying_nectar,
        "Entered hive"
    );

    body.carrying_nectar = false;
    body.fleeing = false;
    body.activity = ActivityState::Resting;
    body.navigator.clear_path();
    ctx.events.push(SimulationEvent::EnteredHive {
        agent: body.id,
        hive: home.hive,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::agent::HomeBinding;
    use crate::entity::behavior::BehaviorConfig;
    use crate::goals::test_support::Harness;
    use crate::world::block::{Block, CollectibleKind};

    #[test]
    fn test_no_resource_sends_agent_home() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let mut body = h.resident(BehaviorConfig::forager());
        let mut ctx = h.ctx();

        start(&mut body, &mut ctx);
        tick(&mut body, &mut ctx, false, |_, _, _| {});
        assert!(matches!(body.activity, ActivityState::Returning { .. }));
        drop(ctx);
        assert!(h.events.contains(&SimulationEvent::NoResource { agent: body.id }));
    }

    #[test]
    fn test_fallback_search_when_pool_empty() {
        let mut h = Harness::new(ResourceTag::Flowers);
        // Hive has never scanned, so only the agent's own search can find it
        let flower = BlockPos::new(2, 1, 0);
        h.grid.set(flower, Block::Collectible(CollectibleKind::Poppy));
        let mut body = h.resident(BehaviorConfig::forager());
        let mut ctx = h.ctx();

        start(&mut body, &mut ctx);
        tick(&mut body, &mut ctx, false, |_, _, _| {});
        assert_eq!(
            body.activity.held_claim(),
            Some(ResourceClaim::from_search(flower))
        );
    }

    #[test]
    fn test_hive_claim_preferred_and_released() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let flower = BlockPos::new(3, 1, 0);
        h.grid.set(flower, Block::Collectible(CollectibleKind::Poppy));
        h.rescan();
        let mut body = h.resident(BehaviorConfig::forager());

        let mut ctx = h.ctx();
        start(&mut body, &mut ctx);
        tick(&mut body, &mut ctx, false, |_, _, _| {});
        assert_eq!(body.activity.held_claim(), Some(ResourceClaim::from_hive(flower)));
        reset_after_stop(&mut body, &mut ctx);
        reset_after_stop(&mut body, &mut ctx);
        drop(ctx);

        assert_eq!(body.activity, ActivityState::Idle);
        assert!(!h.hives.iter().any(|hive| hive.is_claimed(flower)));
    }

    #[test]
    fn test_return_timeout_relocates_next_to_hive() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let mut body = h.resident(BehaviorConfig::forager());
        // Sealed in, far away
        body.position = BlockPos::new(30, 1, 0).center();
        h.grid.fill(BlockPos::new(29, 0, -1), BlockPos::new(31, 2, 1), Block::Solid);
        h.grid.set(BlockPos::new(30, 1, 0), Block::Air);
        body.activity = ActivityState::Returning { deadline: 5 };

        for t in 0..6 {
            h.tick = t;
            let mut ctx = h.ctx();
            tick_returning(&mut body, &mut ctx, 0.3);
        }
        assert_eq!(body.activity, ActivityState::Resting);
        assert!(h.events.iter().any(|e| matches!(e, SimulationEvent::ReturnTimedOut { .. })));
    }

    #[test]
    fn test_enter_hive_when_slot_already_inside() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let mut body = h.resident(BehaviorConfig::forager());
        let home = body.home.unwrap();
        assert!(h.hives.get_mut(home.hive).unwrap().admit(home.slot, Vec::new(), false, 50, 5));
        body.carrying_nectar = true;
        body.activity = ActivityState::Returning { deadline: 1000 };

        let mut ctx = h.ctx();
        tick_returning(&mut body, &mut ctx, 0.3);
        drop(ctx);

        assert_eq!(body.activity, ActivityState::Resting);
        assert!(!body.carrying_nectar);
        let hive = h.hives.get(home.hive).unwrap();
        assert_eq!(hive.honey_level(), 1);
        assert_eq!(hive.slot(home.slot).unwrap().state, SlotState::Inside);
        assert!(h.events.contains(&SimulationEvent::EnteredHive { agent: body.id, hive: home.hive }));
    }

    #[test]
    fn test_enter_hive_with_stale_binding_drops_home() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let mut body = h.resident(BehaviorConfig::forager());
        let hive_id = body.home.unwrap().hive;
        // Slot 1 was never assigned to this agent
        body.home = Some(HomeBinding { hive: hive_id, slot: 1 });
        body.carrying_nectar = true;
        body.activity = ActivityState::Returning { deadline: 1000 };

        let mut ctx = h.ctx();
        tick_returning(&mut body, &mut ctx, 0.3);
        drop(ctx);

        assert_eq!(body.home, None);
        assert_eq!(body.activity, ActivityState::Idle);
        assert_eq!(body.position, landing_spot(&h.grid, BlockPos::new(0, 0, 0)).center());
        let hive = h.hives.get(hive_id).unwrap();
        assert_eq!(hive.slot(1).unwrap().state, SlotState::Empty);
        assert_eq!(hive.honey_level(), 0);
        assert!(h.events.is_empty());
    }
}
