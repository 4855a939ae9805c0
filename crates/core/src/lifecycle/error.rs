//! Lifecycle error types.

use thiserror::Error;

use super::types::TripStatus;

/// Errors that can occur during lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The requested edge is not in the transition table.
    ///
    /// Names both states so callers can render a precise message.
    #[error("Invalid transition from '{current}' to '{attempted}'")]
    InvalidTransition {
        /// The booking's current status.
        current: TripStatus,
        /// The status the operation attempted to reach.
        attempted: TripStatus,
    },

    /// Modification requested after the cutoff lead time.
    #[error(
        "Modification window closed: {lead_time_days} day(s) before departure, cutoff is {cutoff_days}"
    )]
    ModificationCutoffPassed {
        /// Days between the request and the scheduled departure.
        lead_time_days: i64,
        /// Minimum lead time allowed for modifications.
        cutoff_days: i64,
    },
}

impl LifecycleError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::ModificationCutoffPassed { .. } => "MODIFICATION_CUTOFF_PASSED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_names_both_states() {
        let err = LifecycleError::InvalidTransition {
            current: TripStatus::Completed,
            attempted: TripStatus::Cancelled,
        };
        assert_eq!(
            err.to_string(),
            "Invalid transition from 'completed' to 'cancelled'"
        );
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
    }

    #[test]
    fn test_cutoff_error_display() {
        let err = LifecycleError::ModificationCutoffPassed {
            lead_time_days: 1,
            cutoff_days: 2,
        };
        assert_eq!(
            err.to_string(),
            "Modification window closed: 1 day(s) before departure, cutoff is 2"
        );
    }
}
