//! A* pathfinding over the block grid
//!
//! Agents fly, so every traversable cell in the 26-neighbourhood is a
//! successor. Step cost is the Euclidean length of the move and the heuristic
//! is straight-line distance, which never overestimates. Diagonal moves may
//! not clip the corner of a blocked cell.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use ahash::{AHashMap, AHashSet};
use glam::Vec3;
use ordered_float::OrderedFloat;

use crate::core::types::BlockPos;
use crate::world::grid::GridQuery;

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    coord: BlockPos,
    f_cost: OrderedFloat<f32>, // g_cost + heuristic
    order: u64,                // insertion sequence, breaks f-cost ties
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost && self.order == other.order
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn heuristic(from: &BlockPos, goal: &BlockPos) -> f32 {
    from.distance(goal)
}

/// Whether a move by `delta` from `from` stays clear of blocked corners
fn can_step(grid: &dyn GridQuery, from: BlockPos, delta: [i32; 3]) -> bool {
    let axes = delta.iter().filter(|d| **d != 0).count();
    if axes < 2 {
        return true;
    }
    let [dx, dy, dz] = delta;
    [
        (dx != 0).then(|| from.offset(dx, 0, 0)),
        (dy != 0).then(|| from.offset(0, dy, 0)),
        (dz != 0).then(|| from.offset(0, 0, dz)),
    ]
    .into_iter()
    .flatten()
    .all(|cell| grid.is_traversable(cell))
}

/// Find path using A*
///
/// The goal cell itself may be non-traversable (a hive entrance); every other
/// cell on the path is traversable. Returns None if no path exists or the
/// search expands more than `max_nodes` cells.
pub fn find_path(
    grid: &dyn GridQuery,
    start: BlockPos,
    goal: BlockPos,
    max_nodes: usize,
) -> Option<Vec<BlockPos>> {
    if start == goal {
        return Some(vec![start]);
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<BlockPos, BlockPos> = AHashMap::new();
    let mut g_scores: AHashMap<BlockPos, f32> = AHashMap::new();
    let mut closed: AHashSet<BlockPos> = AHashSet::new();
    let mut order = 0u64;

    g_scores.insert(start, 0.0);
    open_set.push(PathNode {
        coord: start,
        f_cost: OrderedFloat(heuristic(&start, &goal)),
        order,
    });

    while let Some(current) = open_set.pop() {
        if current.coord == goal {
            return Some(reconstruct_path(&came_from, current.coord));
        }

        if !closed.insert(current.coord) {
            continue;
        }
        if closed.len() > max_nodes {
            return None;
        }

        let current_g = *g_scores.get(&current.coord).unwrap_or(&f32::INFINITY);

        for (neighbor, delta) in current.coord.neighbors() {
            if closed.contains(&neighbor) {
                continue;
            }
            if neighbor != goal && !grid.is_traversable(neighbor) {
                continue;
            }
            if !can_step(grid, current.coord, delta) {
                continue;
            }

            let move_cost = Vec3::new(delta[0] as f32, delta[1] as f32, delta[2] as f32).length();
            let tentative_g = current_g + move_cost;
            let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&f32::INFINITY);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.coord);
                g_scores.insert(neighbor, tentative_g);

                order += 1;
                open_set.push(PathNode {
                    coord: neighbor,
                    f_cost: OrderedFloat(tentative_g + heuristic(&neighbor, &goal)),
                    order,
                });
            }
        }
    }

    None // No path found
}

/// Reconstruct path from came_from map
fn reconstruct_path(
    came_from: &AHashMap<BlockPos, BlockPos>,
    mut current: BlockPos,
) -> Vec<BlockPos> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Total Euclidean length of a path
pub fn path_length(path: &[BlockPos]) -> f32 {
    path.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// Cached path toward one destination, consumed a waypoint at a time
#[derive(Debug, Clone, Default)]
pub struct Pathfinder {
    destination: Option<BlockPos>,
    waypoints: VecDeque<BlockPos>,
    found: bool,
    tracked: Option<BlockPos>,
    best_distance: f32,
    stalled_ticks: u32,
}

impl Pathfinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute a path to `to`, reusing the cached one if the destination is unchanged
    ///
    /// Returns whether a path exists. A failed search is cached as well and is
    /// only retried after `clear_path` or a change of destination.
    pub fn find_path(
        &mut self,
        grid: &dyn GridQuery,
        from: BlockPos,
        to: BlockPos,
        max_nodes: usize,
    ) -> bool {
        if self.destination == Some(to) {
            return self.found;
        }

        self.clear_path();
        self.destination = Some(to);
        match find_path(grid, from, to, max_nodes) {
            Some(path) => {
                self.waypoints = path.into();
                self.found = true;
            }
            None => {
                tracing::debug!("No path from {} to {}", from, to);
                self.found = false;
            }
        }
        self.found
    }

    /// Drop waypoints already within `reach` of `position` and return the next one
    ///
    /// None means the path is exhausted (or was never found); callers then head
    /// straight for the destination.
    pub fn next_waypoint(&mut self, position: Vec3, reach: f32) -> Option<BlockPos> {
        while let Some(head) = self.waypoints.front() {
            if head.distance_to_point(position) <= reach {
                self.waypoints.pop_front();
            } else {
                break;
            }
        }
        self.waypoints.front().copied()
    }

    /// Discard all cached state
    pub fn clear_path(&mut self) {
        self.destination = None;
        self.waypoints.clear();
        self.found = false;
        self.tracked = None;
        self.best_distance = f32::INFINITY;
        self.stalled_ticks = 0;
    }

    /// Record distance to the waypoint being flown toward
    ///
    /// Returns true, and clears the path, when no progress has been made
    /// for `stall_limit` consecutive calls.
    pub fn record_progress(&mut self, waypoint: BlockPos, distance: f32, stall_limit: u32) -> bool {
        if self.tracked != Some(waypoint) {
            self.tracked = Some(waypoint);
            self.best_distance = distance;
            self.stalled_ticks = 0;
            return false;
        }

        if distance + 0.01 < self.best_distance {
            self.best_distance = distance;
            self.stalled_ticks = 0;
            return false;
        }

        self.stalled_ticks += 1;
        if self.stalled_ticks >= stall_limit {
            self.clear_path();
            return true;
        }
        false
    }

    pub fn destination(&self) -> Option<BlockPos> {
        self.destination
    }

    pub fn has_path(&self) -> bool {
        self.found
    }

    pub fn remaining(&self) -> usize {
        self.waypoints.len()
    }

    pub fn waypoints(&self) -> impl Iterator<Item = &BlockPos> {
        self.waypoints.iter()
    }
}
