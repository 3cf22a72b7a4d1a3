//! The trade lifecycle state machine.
//!
//! `Submitted → Validated → PendingFill → Filled`, with `Rejected` reachable
//! until an order is placed and `Cancelled` reachable only from
//! `PendingFill`. Terminal states never transition again, so status is
//! monotonic.

use orca_core::TradeStatus;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Submitted,
    Validated,
    PendingFill,
    Filled,
    Rejected,
    Cancelled,
}

impl LifecycleState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Filled | Self::Rejected | Self::Cancelled)
    }

    /// Whether the machine may move from `self` to `to`.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Submitted, Self::Validated)
                | (Self::Submitted, Self::Rejected)
                | (Self::Validated, Self::PendingFill)
                | (Self::Validated, Self::Rejected)
                | (Self::PendingFill, Self::Filled)
                | (Self::PendingFill, Self::Cancelled)
        )
    }

    /// The coarse stored status this state maps onto.
    #[must_use]
    pub const fn as_status(self) -> TradeStatus {
        match self {
            Self::Submitted | Self::Validated | Self::PendingFill => TradeStatus::Pending,
            Self::Filled => TradeStatus::Filled,
            Self::Rejected => TradeStatus::Rejected,
            Self::Cancelled => TradeStatus::Cancelled,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::Validated => write!(f, "validated"),
            Self::PendingFill => write!(f, "pending_fill"),
            Self::Filled => write!(f, "filled"),
            Self::Rejected => write!(f, "rejected"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LifecycleState::{
        Cancelled, Filled, PendingFill, Rejected, Submitted, Validated,
    };
    use super::*;

    const ALL: [LifecycleState; 6] =
        [Submitted, Validated, PendingFill, Filled, Rejected, Cancelled];

    #[test]
    fn happy_path_is_legal() {
        assert!(Submitted.can_transition(Validated));
        assert!(Validated.can_transition(PendingFill));
        assert!(PendingFill.can_transition(Filled));
    }

    #[test]
    fn rejection_is_legal_before_placement_only() {
        assert!(Submitted.can_transition(Rejected));
        assert!(Validated.can_transition(Rejected));
        assert!(!PendingFill.can_transition(Rejected));
    }

    #[test]
    fn cancellation_only_from_pending_fill() {
        assert!(PendingFill.can_transition(Cancelled));
        assert!(!Submitted.can_transition(Cancelled));
        assert!(!Validated.can_transition(Cancelled));
    }

    #[test]
    fn terminal_states_never_transition() {
        for from in [Filled, Rejected, Cancelled] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition(to), "{from} -> {to} must be illegal");
            }
        }
    }

    #[test]
    fn no_transition_reverts_to_an_earlier_state() {
        // Order index along the happy path; a legal transition never
        // decreases it.
        fn rank(state: LifecycleState) -> u8 {
            match state {
                Submitted => 0,
                Validated => 1,
                PendingFill => 2,
                Filled | Rejected | Cancelled => 3,
            }
        }
        for from in ALL {
            for to in ALL {
                if from.can_transition(to) {
                    assert!(rank(to) > rank(from), "{from} -> {to} goes backwards");
                }
            }
        }
    }

    #[test]
    fn stored_status_mapping_is_coarse() {
        assert_eq!(Submitted.as_status(), TradeStatus::Pending);
        assert_eq!(Validated.as_status(), TradeStatus::Pending);
        assert_eq!(PendingFill.as_status(), TradeStatus::Pending);
        assert_eq!(Filled.as_status(), TradeStatus::Filled);
        assert_eq!(Rejected.as_status(), TradeStatus::Rejected);
        assert_eq!(Cancelled.as_status(), TradeStatus::Cancelled);
    }
}
