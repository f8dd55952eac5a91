//! Grid pathfinding and movement

pub mod movement;
pub mod pathfinding;

pub use movement::{landing_spot, navigate, step_towards, WAYPOINT_REACH};
pub use pathfinding::{find_path, path_length, Pathfinder};
