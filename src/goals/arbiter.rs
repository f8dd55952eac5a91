//! Priority-ordered goal selection

use crate::entity::agent::AgentBody;
use crate::entity::behavior::BehaviorKind;
use crate::goals::context::GoalContext;
use crate::goals::{
    DirectiveGoal, FleeGoal, ForageGoal, Goal, GoalBehavior, GoalKind, HarvestGoal, RetaliateGoal,
};
use crate::simulation::events::SimulationEvent;

/// Runs at most one goal per agent, highest priority first
#[derive(Debug, Clone)]
pub struct GoalArbiter {
    goals: Vec<Goal>,
    active: Option<usize>,
}

impl GoalArbiter {
    /// Goals in priority order, highest first
    pub fn new(goals: Vec<Goal>) -> Self {
        Self {
            goals,
            active: None,
        }
    }

    /// Standard priority list; foraging and harvesting are exclusive by kind
    pub fn for_kind(kind: BehaviorKind) -> Self {
        let resource = match kind {
            BehaviorKind::Forager => Goal::Forage(ForageGoal),
            BehaviorKind::Harvester => Goal::Harvest(HarvestGoal),
        };
        Self::new(vec![
            Goal::Flee(FleeGoal),
            Goal::Retaliate(RetaliateGoal),
            resource,
            Goal::FollowDirective(DirectiveGoal),
        ])
    }

    pub fn active_kind(&self) -> Option<GoalKind> {
        self.active.map(|i| self.goals[i].kind())
    }

    pub fn goal_kinds(&self) -> impl Iterator<Item = GoalKind> + '_ {
        self.goals.iter().map(|g| g.kind())
    }

    /// Re-evaluate which goal should run, switch if needed, then tick it
    pub fn step(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        let (selected, restart) = self.select(body, ctx);
        if selected != self.active || restart {
            self.switch_to(selected, body, ctx);
        }
        if let Some(index) = self.active {
            self.goals[index].tick(body, ctx);
        }
    }

    /// Stop whatever is running
    ///
    /// Used on removal and recall; safe to call repeatedly.
    pub fn stop_active(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        if self.active.is_some() {
            self.switch_to(None, body, ctx);
        }
    }

    /// First eligible goal top-down
    ///
    /// The running goal is judged by `can_continue`; if that fails but it
    /// could start afresh, it is restarted.
    fn select(&self, body: &AgentBody, ctx: &GoalContext) -> (Option<usize>, bool) {
        for (index, goal) in self.goals.iter().enumerate() {
            if Some(index) == self.active {
                if goal.can_continue(body, ctx) {
                    return (Some(index), false);
                }
                if goal.can_activate(body, ctx) {
                    return (Some(index), true);
                }
            } else if goal.can_activate(body, ctx) {
                return (Some(index), false);
            }
        }
        (None, false)
    }

    fn switch_to(&mut self, next: Option<usize>, body: &mut AgentBody, ctx: &mut GoalContext) {
        let from = self.active_kind();
        if let Some(index) = self.active.take() {
            self.goals[index].stop(body, ctx);
        }

        let to = next.map(|i| self.goals[i].kind());
        tracing::debug!(agent = ?body.id, ?from, ?to, "Goal changed");
        ctx.events.push(SimulationEvent::GoalChanged {
            agent: body.id,
            from,
            to,
            tick: ctx.tick,
        });

        if let Some(index) = next {
            self.goals[index].start(body, ctx);
            self.active = Some(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BlockPos, EntityId};
    use crate::entity::activity::{ActivityState, ResourceClaim};
    use crate::entity::behavior::BehaviorConfig;
    use crate::goals::context::TargetInfo;
    use crate::goals::test_support::Harness;
    use crate::world::block::{Block, CropKind, ResourceTag};

    #[test]
    fn test_priority_order() {
        let arbiter = GoalArbiter::for_kind(BehaviorKind::Harvester);
        let kinds: Vec<_> = arbiter.goal_kinds().collect();
        assert_eq!(
            kinds,
            vec![
                GoalKind::Flee,
                GoalKind::Retaliate,
                GoalKind::Harvest,
                GoalKind::FollowDirective
            ]
        );
    }

    #[test]
    fn test_idle_without_any_eligible_goal() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let mut body = crate::entity::agent::AgentBody::new(
            BehaviorConfig::forager(),
            BlockPos::new(3, 1, 3).center(),
        );
        let mut arbiter = GoalArbiter::for_kind(BehaviorKind::Forager);

        arbiter.step(&mut body, &mut h.ctx());
        assert_eq!(arbiter.active_kind(), None);
        assert!(h.events.is_empty());

        body.manual_target = Some(BlockPos::new(6, 1, 3));
        arbiter.step(&mut body, &mut h.ctx());
        assert_eq!(arbiter.active_kind(), Some(GoalKind::FollowDirective));
    }

    #[test]
    fn test_flee_preempts_harvest_and_releases_claim() {
        let mut h = Harness::new(ResourceTag::Crops);
        let node = BlockPos::new(4, 1, 0);
        h.grid.set(node, Block::Crop { kind: CropKind::Potatoes, age: 7 });
        h.rescan();
        let mut body = h.resident(BehaviorConfig::harvester());
        let mut arbiter = GoalArbiter::for_kind(BehaviorKind::Harvester);

        let mut t = 0;
        while body.activity.work_remaining().is_none() && t < 100 {
            h.tick = t;
            arbiter.step(&mut body, &mut h.ctx());
            t += 1;
        }
        assert_eq!(arbiter.active_kind(), Some(GoalKind::Harvest));
        assert_eq!(body.activity.held_claim(), Some(ResourceClaim::from_hive(node)));

        body.set_health(2.5);
        h.tick = t;
        arbiter.step(&mut body, &mut h.ctx());

        assert_eq!(arbiter.active_kind(), Some(GoalKind::Flee));
        assert!(matches!(body.activity, ActivityState::Returning { .. }));
        assert!(!h.hives.iter().any(|hive| hive.is_claimed(node)));
    }

    #[test]
    fn test_retaliation_interrupts_foraging() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let mut body = h.resident(BehaviorConfig::forager());
        body.position = BlockPos::new(6, 1, 6).center();
        let mut arbiter = GoalArbiter::for_kind(BehaviorKind::Forager);
        arbiter.step(&mut body, &mut h.ctx());
        assert_eq!(arbiter.active_kind(), Some(GoalKind::Forage));

        let attacker = EntityId::new();
        h.targets.insert(attacker, TargetInfo { position: body.position, alive: true });
        body.combat.provoke(attacker, 100);
        arbiter.step(&mut body, &mut h.ctx());
        assert_eq!(arbiter.active_kind(), Some(GoalKind::Retaliate));
    }

    #[test]
    fn test_stop_active_is_idempotent() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let mut body = h.resident(BehaviorConfig::forager());
        body.position = BlockPos::new(6, 1, 6).center();
        let mut arbiter = GoalArbiter::for_kind(BehaviorKind::Forager);
        arbiter.step(&mut body, &mut h.ctx());

        arbiter.stop_active(&mut body, &mut h.ctx());
        let events = h.events.len();
        arbiter.stop_active(&mut body, &mut h.ctx());
        assert_eq!(h.events.len(), events);
        assert_eq!(arbiter.active_kind(), None);
        assert_eq!(body.activity, ActivityState::Idle);
    }
}
