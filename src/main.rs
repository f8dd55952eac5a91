//! Hive Forage - headless runner
//!
//! Builds a seeded meadow with a flower hive and a crop hive, runs the swarm
//! for a number of ticks and reports what ended up in storage.

use std::path::PathBuf;

use ahash::AHashMap;
use clap::Parser;
use glam::Vec3;
use serde::Serialize;

use hive_forage::core::config::{set_config, SimulationConfig};
use hive_forage::core::error::Result;
use hive_forage::core::types::{BlockPos, HiveId};
use hive_forage::ecs::world::World;
use hive_forage::entity::behavior::BehaviorKind;
use hive_forage::hive::home::SlotSnapshot;
use hive_forage::simulation::events::SimulationEvent;
use hive_forage::simulation::tick::run_simulation_tick;
use hive_forage::world::block::{Block, CollectibleKind, CropKind, ResourceTag};

/// Headless forager swarm simulation
#[derive(Parser, Debug)]
#[command(name = "hive-forage")]
#[command(about = "Run a forager swarm and report hive storage")]
struct Args {
    /// Foragers living in the flower hive
    #[arg(long, default_value_t = 3)]
    foragers: usize,

    /// Harvesters living in the crop hive
    #[arg(long, default_value_t = 3)]
    harvesters: usize,

    /// Ticks to simulate
    #[arg(long, default_value_t = 6000)]
    ticks: u64,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// TOML config overriding the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize)]
struct HiveSummary {
    id: u32,
    position: BlockPos,
    honey_level: u32,
    deliveries: u32,
    stored: Vec<(String, u32)>,
    slots: Vec<SlotSnapshot>,
}

#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    agents_alive: usize,
    hives: Vec<HiveSummary>,
    events: Vec<(String, usize)>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hive_forage=info")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    if let Some(path) = &args.config {
        let loaded = SimulationConfig::load(path)?;
        if set_config(loaded).is_err() {
            tracing::warn!("Config already set, ignoring {}", path.display());
        }
    }

    let mut world = World::new(seed);
    let (flower_hive, crop_hive) = build_meadow(&mut world);
    spawn_swarm(&mut world, flower_hive, BehaviorKind::Forager, args.foragers)?;
    spawn_swarm(&mut world, crop_hive, BehaviorKind::Harvester, args.harvesters)?;
    tracing::info!(seed, agents = world.agent_count(), "Simulation starting");

    let mut event_counts: AHashMap<String, usize> = AHashMap::new();
    for _ in 0..args.ticks {
        for event in run_simulation_tick(&mut world) {
            *event_counts.entry(event_name(&event).to_string()).or_insert(0) += 1;
        }
    }

    let summary = summarize(&world, seed, args.ticks, event_counts);
    tracing::info!(ticks = summary.ticks, agents = summary.agents_alive, "Simulation finished");

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => print_text(&summary),
    }
    Ok(())
}

/// A flat meadow: flowers around one hive, crop rows around the other
fn build_meadow(world: &mut World) -> (HiveId, HiveId) {
    world
        .grid
        .fill(BlockPos::new(-24, -1, -24), BlockPos::new(24, -1, 24), Block::Solid);

    let flowers = [
        CollectibleKind::Poppy,
        CollectibleKind::Dandelion,
        CollectibleKind::Cornflower,
    ];
    for (i, (x, z)) in [(-4, 3), (-2, 6), (3, 5), (5, -2), (-5, -4), (1, -6), (6, 4)]
        .into_iter()
        .enumerate()
    {
        world
            .grid
            .set(BlockPos::new(x, 0, z), Block::Collectible(flowers[i % flowers.len()]));
    }

    for x in 14..=20 {
        for (z, kind) in [(-2, CropKind::Wheat), (0, CropKind::Carrots), (2, CropKind::Potatoes)] {
            world.grid.set(
                BlockPos::new(x, 0, z),
                Block::Crop {
                    kind,
                    age: kind.max_age(),
                },
            );
        }
    }

    let flower_hive = world.add_hive(BlockPos::new(0, 2, 0), ResourceTag::Flowers);
    let crop_hive = world.add_hive(BlockPos::new(17, 2, 4), ResourceTag::Crops);
    (flower_hive, crop_hive)
}

fn spawn_swarm(world: &mut World, hive: HiveId, kind: BehaviorKind, count: usize) -> Result<()> {
    let Some(position) = world.hive(hive).map(|h| h.position.above().center()) else {
        return Ok(());
    };
    let free = world.hive(hive).map(|h| h.free_slots()).unwrap_or(0);
    if count > free {
        tracing::warn!(?hive, count, free, "Not enough slots, spawning {} homeless", count - free);
    }
    for i in 0..count {
        let home = (i < free).then_some(hive);
        world.spawn_agent(kind, position + Vec3::new(0.0, 0.0, i as f32 * 0.1), home)?;
    }
    Ok(())
}

fn event_name(event: &SimulationEvent) -> &'static str {
    match event {
        SimulationEvent::GoalChanged { .. } => "goal_changed",
        SimulationEvent::WorkStarted { .. } => "work_started",
        SimulationEvent::Pollinated { .. } => "pollinated",
        SimulationEvent::Harvested { .. } => "harvested",
        SimulationEvent::ItemsDropped { .. } => "items_dropped",
        SimulationEvent::NoResource { .. } => "no_resource",
        SimulationEvent::SeekTimedOut { .. } => "seek_timed_out",
        SimulationEvent::ReturnTimedOut { .. } => "return_timed_out",
        SimulationEvent::EnteredHive { .. } => "entered_hive",
        SimulationEvent::LeftHive { .. } => "left_hive",
        SimulationEvent::DirectiveReached { .. } => "directive_reached",
        SimulationEvent::AttackLanded { .. } => "attack_landed",
        SimulationEvent::AgentDied { .. } => "agent_died",
        SimulationEvent::IntruderDefeated { .. } => "intruder_defeated",
    }
}

fn summarize(
    world: &World,
    seed: u64,
    ticks: u64,
    event_counts: AHashMap<String, usize>,
) -> RunSummary {
    let hives = world
        .hives
        .iter()
        .map(|hive| HiveSummary {
            id: hive.id.0,
            position: hive.position,
            honey_level: hive.honey_level(),
            deliveries: hive.deliveries(),
            stored: hive
                .stored_items()
                .into_iter()
                .map(|(item, count)| (format!("{:?}", item), count))
                .collect(),
            slots: hive.snapshot(),
        })
        .collect();

    let mut events: Vec<_> = event_counts.into_iter().collect();
    events.sort();

    RunSummary {
        seed,
        ticks,
        agents_alive: world.agent_count(),
        hives,
        events,
    }
}

fn print_text(summary: &RunSummary) {
    println!("Hive Forage Run");
    println!("===============");
    println!("Seed: {}", summary.seed);
    println!("Ticks: {}", summary.ticks);
    println!("Agents alive: {}", summary.agents_alive);
    for hive in &summary.hives {
        println!();
        println!("Hive {} at {}", hive.id, hive.position);
        println!("  Honey level: {} ({} deliveries)", hive.honey_level, hive.deliveries);
        for (item, count) in &hive.stored {
            println!("  {:<16} {}", item, count);
        }
        for slot in &hive.slots {
            println!(
                "  Slot {}: {:?} cooldown={} claim={}",
                slot.index,
                slot.state,
                slot.cooldown,
                slot.assigned
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".into())
            );
        }
    }
    println!();
    println!("Events:");
    for (name, count) in &summary.events {
        println!("  {:<18} {}", name, count);
    }
}
