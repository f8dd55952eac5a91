pub mod events;
pub mod tick;

pub use events::SimulationEvent;
pub use tick::run_simulation_tick;
