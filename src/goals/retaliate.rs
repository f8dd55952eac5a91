//! Fight back against the last attacker

use crate::core::types::BlockPos;
use crate::entity::agent::AgentBody;
use crate::goals::context::{AttackIntent, GoalContext};
use crate::goals::resource_run;
use crate::goals::{GoalBehavior, GoalKind};
use crate::navigation::navigate;

#[derive(Debug, Clone, Copy, Default)]
pub struct RetaliateGoal;

impl GoalBehavior for RetaliateGoal {
    fn kind(&self) -> GoalKind {
        GoalKind::Retaliate
    }

    fn can_activate(&self, body: &AgentBody, ctx: &GoalContext) -> bool {
        body.behavior.aggression.retaliates
            && !body.fleeing
            && body.is_outside()
            && body
                .combat
                .last_attacker
                .is_some_and(|attacker| ctx.is_target_alive(attacker))
    }

    fn start(&mut self, body: &mut AgentBody, _ctx: &mut GoalContext) {
        tracing::debug!(agent = ?body.id, attacker = ?body.combat.last_attacker, "Retaliating");
        body.navigator.clear_path();
    }

    fn tick(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        let Some(attacker) = body.combat.last_attacker else {
            return;
        };
        let Some(target) = ctx.targets.get(&attacker).copied() else {
            return;
        };

        let speed = body.behavior.attack_speed;
        navigate(body, &*ctx.grid, BlockPos::containing(target.position), speed, ctx.config);

        let aggression = &body.behavior.aggression;
        if body.position.distance(target.position) <= aggression.attack_reach
            && body.combat.attack_cooldown == 0
        {
            ctx.attacks.push(AttackIntent {
                attacker: body.id,
                target: attacker,
                damage: aggression.attack_damage,
            });
            body.combat.attack_cooldown = aggression.attack_cooldown_ticks;
            if aggression.single_strike {
                body.combat.calm();
            }
        }
    }

    fn stop(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        resource_run::reset_after_stop(body, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EntityId;
    use crate::entity::behavior::BehaviorConfig;
    use crate::goals::context::TargetInfo;
    use crate::goals::test_support::Harness;
    use crate::world::block::ResourceTag;

    #[test]
    fn test_needs_a_live_attacker() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let mut body = h.resident(BehaviorConfig::forager());
        let attacker = EntityId::new();
        body.combat.provoke(attacker, 50);

        assert!(!RetaliateGoal.can_activate(&body, &h.ctx()));

        h.targets.insert(attacker, TargetInfo { position: body.position, alive: true });
        assert!(RetaliateGoal.can_activate(&body, &h.ctx()));

        body.fleeing = true;
        assert!(!RetaliateGoal.can_activate(&body, &h.ctx()));
    }

    #[test]
    fn test_closes_in_and_strikes_once() {
        let mut h = Harness::new(ResourceTag::Flowers);
        let mut body = h.resident(BehaviorConfig::forager());
        let attacker = EntityId::new();
        let target_pos = BlockPos::new(4, 1, 0).center();
        h.targets.insert(attacker, TargetInfo { position: target_pos, alive: true });
        body.combat.provoke(attacker, 50);
        let mut goal = RetaliateGoal;

        goal.start(&mut body, &mut h.ctx());
        for _ in 0..40 {
            if !goal.can_continue(&body, &h.ctx()) {
                break;
            }
            goal.tick(&mut body, &mut h.ctx());
        }

        assert_eq!(h.attacks.len(), 1);
        assert_eq!(h.attacks[0].target, attacker);
        assert_eq!(h.attacks[0].damage, body.behavior.aggression.attack_damage);
        assert!(!body.combat.is_enraged());
    }
}
