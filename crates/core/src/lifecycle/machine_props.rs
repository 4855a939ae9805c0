//! Property-based tests for state machine soundness.

use proptest::prelude::*;

use super::machine::Lifecycle;
use super::types::{TripAction, TripStatus};

/// Strategy for generating arbitrary lifecycle actions.
fn action_strategy() -> impl Strategy<Value = TripAction> {
    prop_oneof![
        Just(TripAction::ConfirmPayment),
        Just(TripAction::StartTrip),
        Just(TripAction::CompleteTrip),
        Just(TripAction::Cancel),
        Just(TripAction::MarkNoShow),
        (0i64..60).prop_map(|lead_time_days| TripAction::Modify { lead_time_days }),
        Just(TripAction::ApplyModification),
        Just(TripAction::PromoteFromWaitingList),
        Just(TripAction::GrantPriority),
        Just(TripAction::SettleRefund),
    ]
}

/// Applies a sequence of actions from the initial status, keeping the
/// statuses actually visited (failed transitions change nothing).
fn run_sequence(actions: &[TripAction]) -> Vec<TripStatus> {
    let machine = Lifecycle::default();
    let mut status = TripStatus::INITIAL;
    let mut visited = vec![status];

    for action in actions {
        if let Ok(next) = machine.apply(status, *action) {
            status = next;
            visited.push(status);
        }
    }
    visited
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// No operation sequence reaches `cancelled` from `completed`.
    #[test]
    fn prop_no_cancellation_after_completion(
        actions in proptest::collection::vec(action_strategy(), 0..40),
    ) {
        let visited = run_sequence(&actions);
        if let Some(completed_at) = visited.iter().position(|s| *s == TripStatus::Completed) {
            prop_assert!(
                visited[completed_at..].iter().all(|s| *s != TripStatus::Cancelled),
                "reached cancelled after completed: {visited:?}"
            );
        }
    }

    /// No sequence reaches `in_progress` without first reaching `upcoming`.
    #[test]
    fn prop_in_progress_requires_upcoming_first(
        actions in proptest::collection::vec(action_strategy(), 0..40),
    ) {
        let visited = run_sequence(&actions);
        if let Some(in_progress_at) = visited.iter().position(|s| *s == TripStatus::InProgress) {
            prop_assert!(
                visited[..in_progress_at].contains(&TripStatus::Upcoming),
                "reached in_progress without upcoming: {visited:?}"
            );
        }
    }

    /// Terminal statuses are never left once reached.
    #[test]
    fn prop_terminal_statuses_are_sinks(
        actions in proptest::collection::vec(action_strategy(), 0..40),
    ) {
        let visited = run_sequence(&actions);
        if let Some(terminal_at) = visited.iter().position(TripStatus::is_terminal) {
            prop_assert_eq!(
                terminal_at,
                visited.len() - 1,
                "transitioned out of a terminal status: {:?}", visited
            );
        }
    }

    /// Every applied transition lands on the action's declared target.
    #[test]
    fn prop_applied_transitions_match_targets(
        actions in proptest::collection::vec(action_strategy(), 0..40),
    ) {
        let machine = Lifecycle::default();
        let mut status = TripStatus::INITIAL;
        for action in actions {
            if let Ok(next) = machine.apply(status, action) {
                prop_assert_eq!(next, action.target());
                status = next;
            }
        }
    }
}
