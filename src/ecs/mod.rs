pub mod world;

pub use world::{Intruder, World};
