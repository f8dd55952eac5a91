pub mod activity;
pub mod agent;
pub mod behavior;
pub mod inventory;

pub use activity::{ActivityKind, ActivityState, ClaimSource, ResourceClaim};
pub use agent::{Agent, AgentBody, CapturedAgent, CombatState, HomeBinding};
pub use behavior::{AggressionConfig, BehaviorConfig, BehaviorKind};
pub use inventory::Inventory;
