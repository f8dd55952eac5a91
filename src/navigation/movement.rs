//! Agent movement along cached paths

use glam::Vec3;

use crate::core::config::SimulationConfig;
use crate::core::types::BlockPos;
use crate::entity::agent::AgentBody;
use crate::world::grid::GridQuery;

/// Distance at which an intermediate waypoint counts as passed
pub const WAYPOINT_REACH: f32 = 0.5;

/// Move straight toward `target` by at most `speed`
///
/// The move is refused if it would enter a blocked cell other than the one
/// containing `target`. Returns the remaining distance to `target`.
pub fn step_towards(body: &mut AgentBody, grid: &dyn GridQuery, target: Vec3, speed: f32) -> f32 {
    let delta = target - body.position;
    let distance = delta.length();
    if distance <= f32::EPSILON {
        return 0.0;
    }

    let next = if distance <= speed {
        target
    } else {
        body.position + delta / distance * speed
    };

    let cell = BlockPos::containing(next);
    if cell != BlockPos::containing(target) && !grid.is_traversable(cell) {
        return distance;
    }

    body.facing = delta.x.atan2(delta.z);
    body.position = next;
    next.distance(target)
}

/// Advance one step toward `destination`, following a path where one exists
///
/// Falls back to straight-line flight when the path is missing or exhausted.
/// Returns the distance from the agent to the destination's centre.
pub fn navigate(
    body: &mut AgentBody,
    grid: &dyn GridQuery,
    destination: BlockPos,
    speed: f32,
    config: &SimulationConfig,
) -> f32 {
    let from = body.block_pos();
    body.navigator
        .find_path(grid, from, destination, config.max_path_nodes);

    let waypoint = body
        .navigator
        .next_waypoint(body.position, WAYPOINT_REACH)
        .unwrap_or(destination);
    let remaining = step_towards(body, grid, waypoint.center(), speed);

    if body
        .navigator
        .record_progress(waypoint, remaining, config.stall_ticks)
    {
        tracing::debug!(agent = ?body.id, %destination, "Navigation stalled, path discarded");
    }

    destination.distance_to_point(body.position)
}

/// A traversable cell next to `home` for relocating a stuck agent
pub fn landing_spot(grid: &dyn GridQuery, home: BlockPos) -> BlockPos {
    home.face_neighbors()
        .into_iter()
        .find(|cell| grid.is_traversable(*cell))
        .unwrap_or_else(|| home.above())
}
