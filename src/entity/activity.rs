//! Per-agent activity state machine
//!
//! Each state carries only the data that is meaningful in it, so a work timer
//! outside `Working` or a deadline outside the timed states cannot exist.
//! Deadlines are absolute ticks polled by the owning goal.

use serde::{Deserialize, Serialize};

use crate::core::types::{BlockPos, Tick};

/// Where a held resource coordinate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimSource {
    /// Issued by the home structure's allocator; must be released to it
    Hive,
    /// Picked by the agent's own area search; not bookkept anywhere
    AreaSearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceClaim {
    pub pos: BlockPos,
    pub source: ClaimSource,
}

impl ResourceClaim {
    pub fn from_hive(pos: BlockPos) -> Self {
        Self { pos, source: ClaimSource::Hive }
    }

    pub fn from_search(pos: BlockPos) -> Self {
        Self { pos, source: ClaimSource::AreaSearch }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityState {
    #[default]
    Idle,
    SeekingResource {
        target: Option<ResourceClaim>,
        deadline: Tick,
    },
    Working {
        target: ResourceClaim,
        remaining: u32,
    },
    Returning {
        deadline: Tick,
    },
    /// Driven by the home structure
    LeavingHome,
    /// Driven by the home structure
    Resting,
}

/// Payload-free view of `ActivityState` for logging and telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    Idle,
    SeekingResource,
    Working,
    Returning,
    LeavingHome,
    Resting,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActivityKind::Idle => "idle",
            ActivityKind::SeekingResource => "seeking",
            ActivityKind::Working => "working",
            ActivityKind::Returning => "returning",
            ActivityKind::LeavingHome => "leaving_home",
            ActivityKind::Resting => "resting",
        };
        f.write_str(name)
    }
}

impl ActivityState {
    pub fn seeking(now: Tick, timeout: Tick) -> Self {
        ActivityState::SeekingResource {
            target: None,
            deadline: now + timeout,
        }
    }

    pub fn returning(now: Tick, timeout: Tick) -> Self {
        ActivityState::Returning {
            deadline: now + timeout,
        }
    }

    pub fn kind(&self) -> ActivityKind {
        match self {
            ActivityState::Idle => ActivityKind::Idle,
            ActivityState::SeekingResource { .. } => ActivityKind::SeekingResource,
            ActivityState::Working { .. } => ActivityKind::Working,
            ActivityState::Returning { .. } => ActivityKind::Returning,
            ActivityState::LeavingHome => ActivityKind::LeavingHome,
            ActivityState::Resting => ActivityKind::Resting,
        }
    }

    /// The resource coordinate this state is holding, if any
    pub fn held_claim(&self) -> Option<ResourceClaim> {
        match self {
            ActivityState::SeekingResource { target, .. } => *target,
            ActivityState::Working { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// States owned by goals, as opposed to the home structure's entry logic
    pub fn is_goal_driven(&self) -> bool {
        matches!(
            self,
            ActivityState::SeekingResource { .. }
                | ActivityState::Working { .. }
                | ActivityState::Returning { .. }
        )
    }

    /// Remaining work ticks while `Working`
    pub fn work_remaining(&self) -> Option<u32> {
        match self {
            ActivityState::Working { remaining, .. } => Some(*remaining),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Tick> {
        match self {
            ActivityState::SeekingResource { deadline, .. }
            | ActivityState::Returning { deadline } => Some(*deadline),
            _ => None,
        }
    }

    pub fn is_expired(&self, now: Tick) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_claim_only_in_resource_states() {
        let claim = ResourceClaim::from_hive(BlockPos::new(1, 0, 1));
        assert_eq!(
            ActivityState::Working { target: claim, remaining: 3 }.held_claim(),
            Some(claim)
        );
        assert_eq!(
            ActivityState::SeekingResource { target: Some(claim), deadline: 10 }.held_claim(),
            Some(claim)
        );
        assert_eq!(ActivityState::seeking(0, 10).held_claim(), None);
        assert_eq!(ActivityState::returning(0, 10).held_claim(), None);
        assert_eq!(ActivityState::Idle.held_claim(), None);
    }

    #[test]
    fn test_deadline_expiry() {
        let state = ActivityState::seeking(100, 800);
        assert_eq!(state.deadline(), Some(900));
        assert!(!state.is_expired(899));
        assert!(state.is_expired(900));
        assert!(!ActivityState::Idle.is_expired(u64::MAX));
    }

    #[test]
    fn test_goal_driven_states() {
        assert!(ActivityState::returning(0, 1).is_goal_driven());
        assert!(!ActivityState::Resting.is_goal_driven());
        assert!(!ActivityState::LeavingHome.is_goal_driven());
        assert!(!ActivityState::Idle.is_goal_driven());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ActivityState::Resting.kind().to_string(), "resting");
        assert_eq!(ActivityState::seeking(0, 1).kind(), ActivityKind::SeekingResource);
    }
}
