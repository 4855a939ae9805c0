//! Transition table and guard evaluation for the booking state machine.

use super::error::LifecycleError;
use super::types::{TripAction, TripStatus};

/// The booking lifecycle state machine.
///
/// Holds only policy parameters; all transition decisions are pure.
/// Callers persist the resulting status and append the history entry
/// inside their own transactional scope.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    /// Minimum lead time (days) for a modification request.
    modification_cutoff_days: i64,
}

impl Lifecycle {
    /// Creates a lifecycle machine with the given modification cutoff.
    #[must_use]
    pub const fn new(modification_cutoff_days: i64) -> Self {
        Self {
            modification_cutoff_days,
        }
    }

    /// Evaluates an action against the current status.
    ///
    /// Returns the new status on success. Edges not in the transition
    /// table fail with `InvalidTransition { current, attempted }`; the
    /// modification guard fails with `ModificationCutoffPassed`.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError` if the transition is not allowed.
    pub fn apply(
        &self,
        current: TripStatus,
        action: TripAction,
    ) -> Result<TripStatus, LifecycleError> {
        use TripAction as A;
        use TripStatus as S;

        match (current, action) {
            (S::Pending, A::ConfirmPayment) => Ok(S::Upcoming),
            (S::Upcoming | S::Priority, A::StartTrip) => Ok(S::InProgress),
            (S::InProgress, A::CompleteTrip) => Ok(S::Completed),
            (S::Upcoming, A::Cancel) => Ok(S::Cancelled),
            (S::Upcoming, A::MarkNoShow) => Ok(S::NoShow),
            (S::Upcoming, A::Modify { lead_time_days }) => {
                if lead_time_days < self.modification_cutoff_days {
                    return Err(LifecycleError::ModificationCutoffPassed {
                        lead_time_days,
                        cutoff_days: self.modification_cutoff_days,
                    });
                }
                Ok(S::Modified)
            }
            (S::Modified, A::ApplyModification) => Ok(S::Upcoming),
            (S::WaitingList, A::PromoteFromWaitingList) => Ok(S::Upcoming),
            (S::Upcoming, A::GrantPriority) => Ok(S::Priority),
            (S::Cancelled, A::SettleRefund) => Ok(S::Refunded),
            (current, action) => Err(LifecycleError::InvalidTransition {
                current,
                attempted: action.target(),
            }),
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TripStatus::Pending, TripAction::ConfirmPayment, TripStatus::Upcoming)]
    #[case(TripStatus::Upcoming, TripAction::StartTrip, TripStatus::InProgress)]
    #[case(TripStatus::Priority, TripAction::StartTrip, TripStatus::InProgress)]
    #[case(TripStatus::InProgress, TripAction::CompleteTrip, TripStatus::Completed)]
    #[case(TripStatus::Upcoming, TripAction::Cancel, TripStatus::Cancelled)]
    #[case(TripStatus::Upcoming, TripAction::MarkNoShow, TripStatus::NoShow)]
    #[case(TripStatus::Upcoming, TripAction::Modify { lead_time_days: 5 }, TripStatus::Modified)]
    #[case(TripStatus::Modified, TripAction::ApplyModification, TripStatus::Upcoming)]
    #[case(
        TripStatus::WaitingList,
        TripAction::PromoteFromWaitingList,
        TripStatus::Upcoming
    )]
    #[case(TripStatus::Upcoming, TripAction::GrantPriority, TripStatus::Priority)]
    #[case(TripStatus::Cancelled, TripAction::SettleRefund, TripStatus::Refunded)]
    fn test_allowed_edges(
        #[case] current: TripStatus,
        #[case] action: TripAction,
        #[case] expected: TripStatus,
    ) {
        let machine = Lifecycle::default();
        assert_eq!(machine.apply(current, action), Ok(expected));
    }

    #[test]
    fn test_cancel_from_completed_rejected() {
        let machine = Lifecycle::default();
        let result = machine.apply(TripStatus::Completed, TripAction::Cancel);
        assert_eq!(
            result,
            Err(LifecycleError::InvalidTransition {
                current: TripStatus::Completed,
                attempted: TripStatus::Cancelled,
            })
        );
    }

    #[test]
    fn test_start_trip_requires_upcoming_or_priority() {
        let machine = Lifecycle::default();
        for current in [
            TripStatus::Pending,
            TripStatus::Completed,
            TripStatus::Cancelled,
            TripStatus::Modified,
            TripStatus::WaitingList,
        ] {
            assert!(
                machine.apply(current, TripAction::StartTrip).is_err(),
                "start_trip should be rejected from {current}"
            );
        }
    }

    #[test]
    fn test_modification_cutoff_guard() {
        let machine = Lifecycle::new(2);
        assert_eq!(
            machine.apply(TripStatus::Upcoming, TripAction::Modify { lead_time_days: 2 }),
            Ok(TripStatus::Modified)
        );
        assert_eq!(
            machine.apply(TripStatus::Upcoming, TripAction::Modify { lead_time_days: 1 }),
            Err(LifecycleError::ModificationCutoffPassed {
                lead_time_days: 1,
                cutoff_days: 2,
            })
        );
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let machine = Lifecycle::default();
        let actions = [
            TripAction::ConfirmPayment,
            TripAction::StartTrip,
            TripAction::CompleteTrip,
            TripAction::Cancel,
            TripAction::MarkNoShow,
            TripAction::Modify { lead_time_days: 10 },
            TripAction::ApplyModification,
            TripAction::PromoteFromWaitingList,
            TripAction::GrantPriority,
            TripAction::SettleRefund,
        ];
        for terminal in [TripStatus::Completed, TripStatus::NoShow, TripStatus::Refunded] {
            for action in actions {
                assert!(
                    machine.apply(terminal, action).is_err(),
                    "{terminal} should reject {action:?}"
                );
            }
        }
    }
}
