//! Booking lifecycle orchestration.
//!
//! Thin transactional shell around the pure state machine: each
//! operation reads the booking, asks the machine, and persists the new
//! status with its history entry in one transaction. Cancellation is
//! the big one, composing the refund policy, receivable reversal, and
//! refund payable into a single commit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use travesia_core::authorization::AuthorizationPolicy;
use travesia_core::events::DomainEvent;
use travesia_core::lifecycle::{Lifecycle, StatusChange, TripAction, TripStatus};
use travesia_core::refund::{RefundBreakdown, RefundPolicy};
use travesia_shared::config::LedgerConfig;
use travesia_shared::types::money::is_valid_amount;

use crate::records::{BookingRecord, PayableRecord, SettlementStatus};
use crate::services::audit::AuditTrail;
use crate::services::error::LedgerError;
use crate::services::ledger::{
    cancel_receivable_in_txn, create_payable_in_txn, NewPayable, PayableReason,
};
use crate::services::payment::{apply_payment_to_payable, validate_method};
use crate::services::EventBus;
use crate::store::{StoreTxn, TransactionalStore};

/// Input for registering a booking.
#[derive(Debug, Clone)]
pub struct NewBooking {
    /// Booking id (upstream-supplied).
    pub booking_id: Uuid,
    /// The branch operating the trip.
    pub branch_id: Uuid,
    /// The customer who booked.
    pub customer_id: Uuid,
    /// Scheduled departure.
    pub departure_date: DateTime<Utc>,
    /// Number of participants.
    pub participants: u32,
    /// Total booking amount.
    pub total_amount: Decimal,
    /// The user performing the operation.
    pub actor_id: Uuid,
}

/// What a committed cancellation produced.
#[derive(Debug, Clone)]
pub struct CancellationOutcome {
    /// The booking, now cancelled.
    pub booking: BookingRecord,
    /// The refund/retention split that was applied.
    pub breakdown: RefundBreakdown,
    /// The refund payable, when the refund amount was non-zero.
    pub refund_payable: Option<PayableRecord>,
}

/// What a committed refund settlement produced.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// The booking, now refunded.
    pub booking: BookingRecord,
    /// The refund payable, now fully paid.
    pub payable: PayableRecord,
}

/// Booking lifecycle service.
#[derive(Debug, Clone)]
pub struct BookingService<S> {
    store: S,
    events: EventBus,
    lifecycle: Lifecycle,
}

impl<S: TransactionalStore> BookingService<S> {
    /// Creates the service over a store.
    pub fn new(store: S, events: EventBus, config: &LedgerConfig) -> Self {
        Self {
            store,
            events,
            lifecycle: Lifecycle::new(config.modification_cutoff_days),
        }
    }

    /// Registers a booking in its initial status.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a bad amount, zero participants, or an
    /// id that already exists.
    pub async fn register_booking(&self, input: NewBooking) -> Result<BookingRecord, LedgerError> {
        if input.total_amount <= Decimal::ZERO || !is_valid_amount(input.total_amount) {
            return Err(LedgerError::Validation {
                message: format!(
                    "Booking amount must be positive with at most 2 decimal places, got {}",
                    input.total_amount
                ),
            });
        }
        if input.participants == 0 {
            return Err(LedgerError::Validation {
                message: "Booking needs at least one participant".to_string(),
            });
        }

        let mut txn = self.store.begin().await?;
        if txn.booking(input.booking_id).await?.is_some() {
            return Err(LedgerError::Validation {
                message: format!("Booking {} already exists", input.booking_id),
            });
        }

        let now = Utc::now();
        let booking = BookingRecord {
            id: input.booking_id,
            branch_id: input.branch_id,
            customer_id: input.customer_id,
            departure_date: input.departure_date,
            participants: input.participants,
            total_amount: input.total_amount,
            paid_amount: Decimal::ZERO,
            pending_amount: input.total_amount,
            status: TripStatus::INITIAL,
            status_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        txn.put_booking(booking.clone()).await?;
        AuditTrail::append(
            &mut txn,
            "booking",
            booking.id,
            "created",
            input.actor_id,
            None::<&BookingRecord>,
            Some(&booking),
        )
        .await?;
        txn.commit().await?;

        info!(booking_id = %booking.id, amount = %booking.total_amount, "Booking registered");
        Ok(booking)
    }

    /// Confirms payment: `pending -> upcoming`.
    ///
    /// Requires at least one registered payment.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when nothing has been paid, or the machine's
    /// rejection.
    pub async fn confirm_payment(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
    ) -> Result<BookingRecord, LedgerError> {
        let mut txn = self.store.begin().await?;
        let booking = self.read_booking(&txn, booking_id).await?;
        if booking.paid_amount <= Decimal::ZERO {
            return Err(LedgerError::Validation {
                message: format!("Booking {booking_id} has no registered payment to confirm"),
            });
        }
        let booking = self
            .transition_in_txn(&mut txn, booking, TripAction::ConfirmPayment, actor_id)
            .await?;
        txn.commit().await?;
        self.publish_status_change(&booking);
        Ok(booking)
    }

    /// Starts the trip: `upcoming|priority -> in_progress`.
    ///
    /// # Errors
    ///
    /// Returns the machine's rejection for any other status.
    pub async fn start_trip(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
    ) -> Result<BookingRecord, LedgerError> {
        self.simple_transition(booking_id, TripAction::StartTrip, actor_id)
            .await
    }

    /// Completes the trip: `in_progress -> completed`.
    ///
    /// # Errors
    ///
    /// Returns the machine's rejection for any other status.
    pub async fn complete_trip(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
    ) -> Result<BookingRecord, LedgerError> {
        self.simple_transition(booking_id, TripAction::CompleteTrip, actor_id)
            .await
    }

    /// Marks a no-show: `upcoming -> no_show`. No refund applies.
    ///
    /// # Errors
    ///
    /// Returns the machine's rejection for any other status.
    pub async fn mark_no_show(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
    ) -> Result<BookingRecord, LedgerError> {
        self.simple_transition(booking_id, TripAction::MarkNoShow, actor_id)
            .await
    }

    /// Requests a modification: `upcoming -> modified`, guarded by the
    /// cutoff lead time.
    ///
    /// # Errors
    ///
    /// Returns `ModificationCutoffPassed` when departure is too close.
    pub async fn modify(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
    ) -> Result<BookingRecord, LedgerError> {
        let mut txn = self.store.begin().await?;
        let booking = self.read_booking(&txn, booking_id).await?;
        let lead_time_days = lead_time_days(booking.departure_date);
        let booking = self
            .transition_in_txn(&mut txn, booking, TripAction::Modify { lead_time_days }, actor_id)
            .await?;
        txn.commit().await?;
        self.publish_status_change(&booking);
        Ok(booking)
    }

    /// Applies a requested modification: `modified -> upcoming`.
    ///
    /// # Errors
    ///
    /// Returns the machine's rejection for any other status.
    pub async fn apply_modification(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
    ) -> Result<BookingRecord, LedgerError> {
        self.simple_transition(booking_id, TripAction::ApplyModification, actor_id)
            .await
    }

    /// Promotes from the waiting list: `waiting_list -> upcoming`.
    ///
    /// # Errors
    ///
    /// Returns the machine's rejection for any other status.
    pub async fn promote_from_waiting_list(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
    ) -> Result<BookingRecord, LedgerError> {
        self.simple_transition(booking_id, TripAction::PromoteFromWaitingList, actor_id)
            .await
    }

    /// Grants a priority upgrade: `upcoming -> priority`.
    ///
    /// # Errors
    ///
    /// Returns the machine's rejection for any other status.
    pub async fn grant_priority(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
    ) -> Result<BookingRecord, LedgerError> {
        self.simple_transition(booking_id, TripAction::GrantPriority, actor_id)
            .await
    }

    /// Cancels a booking: `upcoming -> cancelled`.
    ///
    /// One transaction covers the status change, the reversal of the
    /// uncollected receivable remainder, and the refund payable for the
    /// tiered share of what was actually paid. A refund at or above the
    /// branch authorization limit needs an approver or the whole
    /// cancellation rolls back.
    ///
    /// # Errors
    ///
    /// Returns the machine's rejection, or `AuthorizationRequired` when
    /// the refund is gated and no approver was supplied.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        approver_id: Option<Uuid>,
        actor_id: Uuid,
    ) -> Result<CancellationOutcome, LedgerError> {
        let mut txn = self.store.begin().await?;
        let booking = self.read_booking(&txn, booking_id).await?;

        let lead_time_days = lead_time_days(booking.departure_date);
        let breakdown = RefundPolicy::calculate_refund(lead_time_days, booking.paid_amount);

        // Reverse the uncollected remainder; a fully-paid receivable
        // has nothing left to reverse.
        if let Some(receivable) = txn.receivable_for_booking(booking_id).await? {
            if matches!(
                receivable.status,
                SettlementStatus::Pending | SettlementStatus::Partial
            ) {
                cancel_receivable_in_txn(&mut txn, receivable.id, actor_id).await?;
            }
        }

        let refund_payable = if breakdown.refund_amount > Decimal::ZERO {
            let result = create_payable_in_txn(
                &mut txn,
                &NewPayable {
                    booking_id: Some(booking_id),
                    beneficiary_id: booking.customer_id,
                    branch_id: booking.branch_id,
                    total_amount: breakdown.refund_amount,
                    due_date: None,
                    reason: PayableReason::Refund,
                    approver_id,
                    actor_id,
                },
            )
            .await;
            match result {
                Ok(payable) => Some(payable),
                Err(err) => {
                    self.publish_if_gated(&err);
                    return Err(err);
                }
            }
        } else {
            None
        };

        let booking = self
            .transition_in_txn(&mut txn, booking, TripAction::Cancel, actor_id)
            .await?;
        txn.commit().await?;

        info!(
            booking_id = %booking.id,
            refund = %breakdown.refund_amount,
            retained = %breakdown.retained_amount,
            policy = breakdown.policy_applied.as_str(),
            "Booking cancelled"
        );
        self.publish_status_change(&booking);
        if let Some(payable) = &refund_payable {
            self.events.publish(DomainEvent::RefundIssued {
                booking_id: booking.id,
                payable_id: payable.id,
                refund_amount: breakdown.refund_amount,
                retained_amount: breakdown.retained_amount,
            });
        }

        Ok(CancellationOutcome {
            booking,
            breakdown,
            refund_payable,
        })
    }

    /// Settles the refund disbursement: `cancelled -> refunded`.
    ///
    /// Pays out the refund payable's full outstanding amount and moves
    /// the booking to its terminal status in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the booking has no open refund
    /// payable, `AuthorizationRequired` when the disbursement is gated,
    /// or the machine's rejection for a non-cancelled booking.
    pub async fn settle_refund(
        &self,
        booking_id: Uuid,
        method: &str,
        reference: Option<&str>,
        approver_id: Option<Uuid>,
        actor_id: Uuid,
    ) -> Result<SettlementOutcome, LedgerError> {
        validate_method(method)?;

        let mut txn = self.store.begin().await?;
        let booking = self.read_booking(&txn, booking_id).await?;

        let payable = txn
            .payable_for_booking(booking_id)
            .await?
            .ok_or_else(|| LedgerError::Validation {
                message: format!("Booking {booking_id} has no refund payable to settle"),
            })?;
        if payable.pending_amount <= Decimal::ZERO {
            return Err(LedgerError::AlreadySettled {
                record_id: payable.id,
            });
        }

        let payment = {
            let result = apply_payment_to_payable(
                &mut txn,
                payable.id,
                method,
                reference,
                payable.pending_amount,
                approver_id,
                actor_id,
            )
            .await;
            match result {
                Ok(payment) => payment,
                Err(err) => {
                    self.publish_if_gated(&err);
                    return Err(err);
                }
            }
        };

        let booking = self
            .transition_in_txn(&mut txn, booking, TripAction::SettleRefund, actor_id)
            .await?;
        let payable = txn
            .payable(payable.id)
            .await?
            .ok_or(LedgerError::NotFound {
                entity: "Payable",
                id: payable.id,
            })?;
        txn.commit().await?;

        info!(booking_id = %booking.id, folio = %payment.folio, "Refund settled");
        self.publish_status_change(&booking);
        self.events.publish(DomainEvent::PaymentRegistered {
            payment_id: payment.id,
            folio: payment.folio,
            applied_to: payable.id,
            amount: payment.amount,
        });

        Ok(SettlementOutcome { booking, payable })
    }

    async fn simple_transition(
        &self,
        booking_id: Uuid,
        action: TripAction,
        actor_id: Uuid,
    ) -> Result<BookingRecord, LedgerError> {
        let mut txn = self.store.begin().await?;
        let booking = self.read_booking(&txn, booking_id).await?;
        let booking = self
            .transition_in_txn(&mut txn, booking, action, actor_id)
            .await?;
        txn.commit().await?;
        self.publish_status_change(&booking);
        Ok(booking)
    }

    async fn read_booking<T: StoreTxn>(
        &self,
        txn: &T,
        booking_id: Uuid,
    ) -> Result<BookingRecord, LedgerError> {
        txn.booking(booking_id).await?.ok_or(LedgerError::NotFound {
            entity: "Booking",
            id: booking_id,
        })
    }

    async fn transition_in_txn<T: StoreTxn>(
        &self,
        txn: &mut T,
        booking: BookingRecord,
        action: TripAction,
        actor_id: Uuid,
    ) -> Result<BookingRecord, LedgerError> {
        let before = booking;
        let new_status = self.lifecycle.apply(before.status, action)?;

        let mut booking = before.clone();
        booking.status = new_status;
        booking.status_history.push(StatusChange {
            previous: before.status,
            new: new_status,
            actor: actor_id,
            occurred_at: Utc::now(),
        });
        booking.updated_at = Utc::now();

        txn.put_booking(booking.clone()).await?;
        AuditTrail::append(
            txn,
            "booking",
            booking.id,
            "status_changed",
            actor_id,
            Some(&before),
            Some(&booking),
        )
        .await?;
        Ok(booking)
    }

    fn publish_status_change(&self, booking: &BookingRecord) {
        if let Some(change) = booking.status_history.last() {
            self.events.publish(DomainEvent::BookingStatusChanged {
                booking_id: booking.id,
                previous: change.previous,
                new: change.new,
            });
        }
    }

    fn publish_if_gated(&self, err: &LedgerError) {
        if let LedgerError::AuthorizationRequired {
            branch_id,
            amount,
            threshold,
        } = err
        {
            self.events.publish(DomainEvent::AuthorizationRequired {
                request: AuthorizationPolicy::evaluate(*branch_id, *threshold, *amount, None),
            });
        }
    }
}

/// Whole days between now and the scheduled departure.
fn lead_time_days(departure_date: DateTime<Utc>) -> i64 {
    (departure_date.date_naive() - Utc::now().date_naive()).num_days()
}
