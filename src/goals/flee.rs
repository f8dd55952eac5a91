//! Flee home when badly hurt
//!
//! Once started it cannot be preempted: it keeps control for as long as the
//! agent is still returning.

use crate::entity::activity::ActivityState;
use crate::entity::agent::AgentBody;
use crate::goals::context::GoalContext;
use crate::goals::resource_run;
use crate::goals::{GoalBehavior, GoalKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct FleeGoal;

impl GoalBehavior for FleeGoal {
    fn kind(&self) -> GoalKind {
        GoalKind::Flee
    }

    fn can_activate(&self, body: &AgentBody, ctx: &GoalContext) -> bool {
        body.home.is_some()
            && body.is_outside()
            && body.health_ratio() < ctx.config.critical_health_ratio
    }

    fn can_continue(&self, body: &AgentBody, _ctx: &GoalContext) -> bool {
        body.home.is_some() && matches!(body.activity, ActivityState::Returning { .. })
    }

    fn start(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        tracing::debug!(agent = ?body.id, health = body.health(), "Fleeing home");
        body.combat.calm();
        body.fleeing = true;
        resource_run::begin_return(body, ctx);
    }

    fn tick(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        let speed = body.behavior.flee_speed;
        resource_run::tick_returning(body, ctx, speed);
    }

    fn stop(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        body.fleeing = false;
        resource_run::reset_after_stop(body, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EntityId;
    use crate::entity::behavior::BehaviorConfig;
    use crate::goals::test_support::Harness;
    use crate::world::block::ResourceTag;

    #[test]
    fn test_activation_threshold() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let mut body = h.resident(BehaviorConfig::forager());
        body.set_health(3.0);
        assert!(!FleeGoal.can_activate(&body, &h.ctx()));
        body.set_health(2.5);
        assert!(FleeGoal.can_activate(&body, &h.ctx()));

        body.home = None;
        assert!(!FleeGoal.can_activate(&body, &h.ctx()));
    }

    #[test]
    fn test_start_clears_combat_and_returns() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let mut body = h.resident(BehaviorConfig::forager());
        body.combat.provoke(EntityId::new(), 100);
        let mut goal = FleeGoal;

        goal.start(&mut body, &mut h.ctx());
        assert!(body.fleeing);
        assert!(!body.combat.is_enraged());
        assert_eq!(body.combat.last_attacker, None);
        assert!(matches!(body.activity, ActivityState::Returning { .. }));

        goal.stop(&mut body, &mut h.ctx());
        goal.stop(&mut body, &mut h.ctx());
        assert!(!body.fleeing);
        assert_eq!(body.activity, ActivityState::Idle);
    }
}
