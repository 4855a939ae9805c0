//! Lifecycle domain types for trip bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operational status of a trip booking.
///
/// A booking starts in `Pending` and moves through the machine until it
/// reaches a terminal state: `Completed`, `NoShow`, or `Refunded`
/// (`Cancelled` is terminal once its refund has been settled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    /// Booking created, payment not yet confirmed.
    Pending,
    /// Payment confirmed, departure in the future.
    Upcoming,
    /// Departure time reached, trip underway.
    InProgress,
    /// Trip end reached.
    Completed,
    /// Cancellation requested before departure.
    Cancelled,
    /// Refund disbursement settled after cancellation.
    Refunded,
    /// Departure passed with the customer absent.
    NoShow,
    /// Modification requested before the cutoff lead time.
    Modified,
    /// Waiting for capacity to free up.
    WaitingList,
    /// Priority upgrade granted.
    Priority,
}

impl TripStatus {
    /// The status every booking starts in.
    pub const INITIAL: Self = Self::Pending;

    /// Returns true if no further transitions are allowed from this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::NoShow | Self::Refunded)
    }

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Upcoming => "upcoming",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::NoShow => "no_show",
            Self::Modified => "modified",
            Self::WaitingList => "waiting_list",
            Self::Priority => "priority",
        }
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation requested against a booking's lifecycle.
///
/// Guard data travels with the action; the machine evaluates it against
/// the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripAction {
    /// Payment confirmed: `pending -> upcoming`.
    ConfirmPayment,
    /// Departure time reached: `upcoming -> in_progress`
    /// (also `priority -> in_progress` for upgraded bookings).
    StartTrip,
    /// Trip end reached: `in_progress -> completed`.
    CompleteTrip,
    /// Cancellation requested: `upcoming -> cancelled`.
    Cancel,
    /// Departure passed, customer absent: `upcoming -> no_show`.
    MarkNoShow,
    /// Modification requested: `upcoming -> modified`, guarded by the
    /// modification cutoff lead time.
    Modify {
        /// Days between the request and the scheduled departure.
        lead_time_days: i64,
    },
    /// Modification applied: `modified -> upcoming`.
    ApplyModification,
    /// Capacity freed: `waiting_list -> upcoming`.
    PromoteFromWaitingList,
    /// Priority upgrade granted: `upcoming -> priority`.
    GrantPriority,
    /// Refund disbursement settled: `cancelled -> refunded`.
    SettleRefund,
}

impl TripAction {
    /// The status this action attempts to reach.
    #[must_use]
    pub fn target(&self) -> TripStatus {
        match self {
            Self::ConfirmPayment | Self::ApplyModification | Self::PromoteFromWaitingList => {
                TripStatus::Upcoming
            }
            Self::StartTrip => TripStatus::InProgress,
            Self::CompleteTrip => TripStatus::Completed,
            Self::Cancel => TripStatus::Cancelled,
            Self::MarkNoShow => TripStatus::NoShow,
            Self::Modify { .. } => TripStatus::Modified,
            Self::GrantPriority => TripStatus::Priority,
            Self::SettleRefund => TripStatus::Refunded,
        }
    }
}

/// One append-only entry in a booking's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// The status before the transition.
    pub previous: TripStatus,
    /// The status after the transition.
    pub new: TripStatus,
    /// The user who requested the transition.
    pub actor: Uuid,
    /// When the transition was applied.
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(TripStatus::Completed.is_terminal());
        assert!(TripStatus::NoShow.is_terminal());
        assert!(TripStatus::Refunded.is_terminal());
        assert!(!TripStatus::Pending.is_terminal());
        assert!(!TripStatus::Upcoming.is_terminal());
        assert!(!TripStatus::Cancelled.is_terminal());
        assert!(!TripStatus::Modified.is_terminal());
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(TripStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TripStatus::WaitingList.as_str(), "waiting_list");
        assert_eq!(TripStatus::NoShow.as_str(), "no_show");
    }

    #[test]
    fn test_action_targets() {
        assert_eq!(TripAction::ConfirmPayment.target(), TripStatus::Upcoming);
        assert_eq!(TripAction::StartTrip.target(), TripStatus::InProgress);
        assert_eq!(
            TripAction::Modify { lead_time_days: 5 }.target(),
            TripStatus::Modified
        );
        assert_eq!(TripAction::SettleRefund.target(), TripStatus::Refunded);
    }
}
