//! Home structures and the resource slot allocator they own

pub mod allocator;
pub mod home;

pub use allocator::ResourceAllocator;
pub use home::{Hive, HiveRegistry, HiveSlot, SlotSnapshot, SlotState};
