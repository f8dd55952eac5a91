//! Simulation tick - one synchronous step of the whole world

use crate::core::types::{BlockPos, EntityId, HiveId};
use crate::ecs::world::World;
use crate::entity::activity::ActivityState;
use crate::goals::{AttackIntent, TargetIndex};
use crate::navigation::landing_spot;
use crate::simulation::events::SimulationEvent;

/// Run a single simulation tick
///
/// Agents are stepped one after another in spawn order; nothing here runs
/// concurrently, so every claim and release completes within the owning
/// agent's turn.
pub fn run_simulation_tick(world: &mut World) -> Vec<SimulationEvent> {
    grow_plants(world);
    tick_hives(world);

    let targets = world.target_index();
    let attacks = step_agents(world, &targets);
    apply_attacks(world, attacks);
    remove_dead(world);

    world.tick();
    world.take_events()
}

fn grow_plants(world: &mut World) {
    let grown = world
        .grid
        .grow_plants(&mut world.rng, world.config.plant_growth_chance);
    if grown > 0 {
        tracing::trace!(grown, "Plants grew");
    }
}

/// Rescans, slot cooldowns, and residents leaving after their rest
fn tick_hives(world: &mut World) {
    let mut leaving: Vec<(EntityId, HiveId, BlockPos)> = Vec::new();
    for hive in world.hives.iter_mut() {
        hive.tick_rescan(&world.grid, world.config.rescan_cooldown_ticks);
        for slot in hive.tick_slots(world.config.forage_cooldown_ticks) {
            if let Some(resident) = hive.slot(slot).and_then(|s| s.resident) {
                leaving.push((resident, hive.id, landing_spot(&world.grid, hive.position)));
            }
        }
    }

    for (agent_id, hive, spot) in leaving {
        let Some(agent) = world.agent_mut(agent_id) else {
            continue;
        };
        agent.body.position = spot.center();
        agent.body.activity = ActivityState::LeavingHome;
        tracing::debug!(agent = ?agent_id, ?hive, %spot, "Left hive");
        world.push_event(SimulationEvent::LeftHive {
            agent: agent_id,
            hive,
        });
    }
}

fn step_agents(world: &mut World, targets: &TargetIndex) -> Vec<AttackIntent> {
    let mut attacks = Vec::new();
    let heal = world.config.rest_heal_per_tick;

    for index in 0..world.agents.len() {
        let body = &mut world.agents[index].body;
        body.combat.tick();
        match body.activity {
            // Inside the hive; the hive decides when it comes out
            ActivityState::Resting => {
                body.heal(heal);
                continue;
            }
            ActivityState::LeavingHome => body.activity = ActivityState::Idle,
            _ => {}
        }
        world.with_goal_context(index, targets, &mut attacks, |agent, ctx| {
            agent.arbiter.step(&mut agent.body, ctx);
        });
    }
    attacks
}

fn apply_attacks(world: &mut World, attacks: Vec<AttackIntent>) {
    for AttackIntent {
        attacker,
        target,
        damage,
    } in attacks
    {
        if world.agent(target).is_some() {
            if let Err(err) = world.attack_agent(attacker, target, damage) {
                tracing::warn!(?target, %err, "Attack on vanished agent");
            }
            continue;
        }

        let Some(intruder) = world.intruders.get_mut(&target) else {
            continue;
        };
        intruder.health -= damage;
        let defeated = intruder.health <= 0.0;
        world.push_event(SimulationEvent::AttackLanded {
            attacker,
            target,
            damage,
        });
        if defeated {
            world.intruders.remove(&target);
            tracing::info!(intruder = ?target, "Intruder defeated");
            world.push_event(SimulationEvent::IntruderDefeated { intruder: target });
        }
    }
}

/// Dead agents leave through the same path as explicit removal
fn remove_dead(world: &mut World) {
    let dead: Vec<EntityId> = world
        .agents
        .iter()
        .filter(|a| !a.body.is_alive())
        .map(|a| a.id())
        .collect();
    for id in dead {
        if world.remove_agent(id).is_ok() {
            tracing::info!(agent = ?id, "Agent died");
            world.push_event(SimulationEvent::AgentDied { agent: id });
        }
    }
}
