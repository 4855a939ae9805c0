//! Domain events emitted for downstream collaborators.
//!
//! This core never sends notifications itself; it publishes these
//! events for an external channel-selection/notification service.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::authorization::AuthorizationRequest;
use crate::folio::Folio;
use crate::lifecycle::TripStatus;

/// A domain event describing a committed (or gated) state change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A booking moved to a new lifecycle status.
    BookingStatusChanged {
        /// The booking that transitioned.
        booking_id: Uuid,
        /// The status before the transition.
        previous: TripStatus,
        /// The status after the transition.
        new: TripStatus,
    },
    /// A payment was registered against a receivable or payable.
    PaymentRegistered {
        /// The payment record id.
        payment_id: Uuid,
        /// The payment folio.
        folio: Folio,
        /// The receivable or payable the payment was applied to.
        applied_to: Uuid,
        /// The payment amount.
        amount: Decimal,
    },
    /// A cancellation produced a refund disbursement.
    RefundIssued {
        /// The cancelled booking.
        booking_id: Uuid,
        /// The payable created for the refund disbursement.
        payable_id: Uuid,
        /// Amount returned to the customer.
        refund_amount: Decimal,
        /// Amount the business retains.
        retained_amount: Decimal,
    },
    /// A disbursement was blocked pending manager approval.
    AuthorizationRequired {
        /// The gate's decision record.
        request: AuthorizationRequest,
    },
}
