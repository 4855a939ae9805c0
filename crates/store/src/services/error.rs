//! Service-layer error taxonomy.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use travesia_core::folio::FolioError;
use travesia_core::lifecycle::LifecycleError;
use travesia_shared::error::AppError;

use crate::store::StoreError;

/// Errors produced by the ledger services.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Input failed validation before any state was touched.
    #[error("Validation failed: {message}")]
    Validation {
        /// What was wrong with the input.
        message: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity type.
        entity: &'static str,
        /// The missing id.
        id: Uuid,
    },

    /// The record is already fully settled; nothing further applies.
    #[error("Record {record_id} is already fully settled")]
    AlreadySettled {
        /// The settled receivable or payable.
        record_id: Uuid,
    },

    /// The payment exceeds the record's outstanding amount.
    #[error("Payment of {attempted} exceeds pending amount {pending} on record {record_id}")]
    Overpayment {
        /// The receivable or payable.
        record_id: Uuid,
        /// Amount still outstanding.
        pending: Decimal,
        /// Amount the caller tried to apply.
        attempted: Decimal,
    },

    /// A payment with the same method, reference, and amount already
    /// exists.
    #[error("Duplicate payment: {method}/{reference} for {amount}")]
    DuplicatePayment {
        /// The payment method.
        method: String,
        /// The external reference.
        reference: String,
        /// The payment amount.
        amount: Decimal,
    },

    /// The disbursement needs manager approval before it can commit.
    #[error("Disbursement of {amount} at branch {branch_id} requires manager authorization")]
    AuthorizationRequired {
        /// The branch whose threshold gated the amount.
        branch_id: Uuid,
        /// The gated amount.
        amount: Decimal,
        /// The branch threshold, when one was configured.
        threshold: Option<Decimal>,
    },

    /// The booking state machine rejected the transition.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Folio construction or parsing failed.
    #[error(transparent)]
    Folio(#[from] FolioError),

    /// The persistence boundary failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadySettled { .. } => "ALREADY_SETTLED",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::DuplicatePayment { .. } => "DUPLICATE_PAYMENT",
            Self::AuthorizationRequired { .. } => "AUTHORIZATION_REQUIRED",
            Self::Lifecycle(e) => e.error_code(),
            Self::Folio(FolioError::SequenceExhausted { .. }) => "FOLIO_SEQUENCE_EXHAUSTED",
            Self::Folio(FolioError::Malformed(_)) => "FOLIO_MALFORMED",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns true if retrying the operation could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_retryable())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::Validation { .. } => Self::Validation(err.to_string()),
            LedgerError::NotFound { .. } => Self::NotFound(err.to_string()),
            LedgerError::DuplicatePayment { .. } => Self::Conflict(err.to_string()),
            LedgerError::AuthorizationRequired { .. } => {
                Self::AuthorizationRequired(err.to_string())
            }
            LedgerError::Store(_) => Self::Persistence(err.to_string()),
            LedgerError::Folio(FolioError::SequenceExhausted { .. }) => {
                Self::Internal(err.to_string())
            }
            LedgerError::AlreadySettled { .. }
            | LedgerError::Overpayment { .. }
            | LedgerError::Lifecycle(_)
            | LedgerError::Folio(_) => Self::BusinessRule(err.to_string()),
        }
    }
}
