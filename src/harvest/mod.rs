//! Resource-node harvesting rules and the items they produce

pub mod items;
pub mod policy;

pub use items::{ItemKind, ItemStack, MAX_STACK};
pub use policy::{classify, harvest, is_ready_to_harvest, is_valid_resource, HarvestClass};
