//! Follow an externally set target coordinate

use crate::entity::agent::AgentBody;
use crate::goals::context::GoalContext;
use crate::goals::resource_run;
use crate::goals::{GoalBehavior, GoalKind};
use crate::navigation::navigate;
use crate::simulation::events::SimulationEvent;

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveGoal;

impl GoalBehavior for DirectiveGoal {
    fn kind(&self) -> GoalKind {
        GoalKind::FollowDirective
    }

    fn can_activate(&self, body: &AgentBody, _ctx: &GoalContext) -> bool {
        body.manual_target.is_some() && body.is_outside()
    }

    fn start(&mut self, body: &mut AgentBody, _ctx: &mut GoalContext) {
        body.navigator.clear_path();
    }

    fn tick(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        let Some(target) = body.manual_target else {
            return;
        };
        let speed = body.behavior.flight_speed;
        let distance = navigate(body, &*ctx.grid, target, speed, ctx.config);
        if distance <= body.behavior.reach_distance {
            tracing::debug!(agent = ?body.id, %target, "Directive reached");
            body.manual_target = None;
            body.navigator.clear_path();
            ctx.events.push(SimulationEvent::DirectiveReached {
                agent: body.id,
                pos: target,
            });
        }
    }

    fn stop(&mut self, body: &mut AgentBody, ctx: &mut GoalContext) {
        resource_run::reset_after_stop(body, ctx);
    }
}
