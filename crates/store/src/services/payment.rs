//! Payment registration against receivables and payables.
//!
//! Each registration is one transaction: guards, payment insert, amount
//! recomputation, cash posting, and audit entry all commit together.
//! Payments are idempotent on (method, reference, amount); a replayed
//! webhook or double submit is rejected without touching state.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use travesia_core::authorization::AuthorizationStatus;
use travesia_core::events::DomainEvent;
use travesia_core::folio::FolioKind;
use travesia_shared::types::money::is_valid_amount;

use crate::records::{
    LedgerAccount, PaymentRecord, PaymentTarget, SettlementStatus,
};
use crate::services::audit::AuditTrail;
use crate::services::authorization::AuthorizationGate;
use crate::services::error::LedgerError;
use crate::services::ledger::{next_folio, post_entry};
use crate::services::EventBus;
use crate::store::{StoreTxn, TransactionalStore};

/// Input for registering an incoming payment.
#[derive(Debug, Clone)]
pub struct IncomingPayment {
    /// The receivable the payment collects against.
    pub receivable_id: Uuid,
    /// Payment method (e.g. "cash", "transfer", "card").
    pub method: String,
    /// External reference. Required for non-cash methods; the
    /// idempotency guard keys on it.
    pub reference: Option<String>,
    /// Payment amount.
    pub amount: Decimal,
    /// The user performing the operation.
    pub actor_id: Uuid,
}

/// Input for registering an outgoing disbursement.
#[derive(Debug, Clone)]
pub struct OutgoingPayment {
    /// The payable the disbursement settles against.
    pub payable_id: Uuid,
    /// Payment method.
    pub method: String,
    /// External reference.
    pub reference: Option<String>,
    /// Disbursement amount.
    pub amount: Decimal,
    /// The manager approving the disbursement, when the gate needs one.
    pub approver_id: Option<Uuid>,
    /// The user performing the operation.
    pub actor_id: Uuid,
}

/// Payment registration over the transactional store.
#[derive(Debug, Clone)]
pub struct PaymentProcessor<S> {
    store: S,
    events: EventBus,
}

impl<S: TransactionalStore> PaymentProcessor<S> {
    /// Creates the processor over a store.
    pub fn new(store: S, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Registers an incoming payment against a receivable.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown receivable, `AlreadySettled`
    /// when it is fully paid, `Overpayment` when the amount exceeds the
    /// outstanding balance, `DuplicatePayment` when the same
    /// (method, reference, amount) was already registered, or
    /// `Validation` for a bad amount or a cancelled receivable.
    pub async fn register_payment_received(
        &self,
        input: IncomingPayment,
    ) -> Result<PaymentRecord, LedgerError> {
        validate_payment_amount(input.amount)?;
        validate_method(&input.method)?;

        let mut txn = self.store.begin().await?;
        let before = txn
            .receivable(input.receivable_id)
            .await?
            .ok_or(LedgerError::NotFound {
                entity: "Receivable",
                id: input.receivable_id,
            })?;

        check_open(before.status, before.id)?;
        if input.amount > before.pending_amount {
            return Err(LedgerError::Overpayment {
                record_id: before.id,
                pending: before.pending_amount,
                attempted: input.amount,
            });
        }
        check_duplicate(&txn, &input.method, input.reference.as_deref(), input.amount).await?;

        let folio = next_folio(&txn, FolioKind::Payment, Utc::now().date_naive()).await?;
        let payment = PaymentRecord {
            id: Uuid::new_v4(),
            folio,
            method: input.method,
            reference: input.reference,
            amount: input.amount,
            applied_to: PaymentTarget::Receivable(before.id),
            created_at: Utc::now(),
        };
        txn.insert_payment(payment.clone()).await?;

        let mut receivable = before.clone();
        receivable.paid_amount += input.amount;
        receivable.pending_amount = receivable.total_amount - receivable.paid_amount;
        receivable.status =
            SettlementStatus::from_amounts(receivable.paid_amount, receivable.total_amount);
        receivable.updated_at = Utc::now();
        txn.put_receivable(receivable.clone()).await?;

        // Mirror the collected amount onto the linked booking.
        if let Some(mut booking) = txn.booking(receivable.booking_id).await? {
            booking.paid_amount += input.amount;
            booking.pending_amount = booking.total_amount - booking.paid_amount;
            booking.updated_at = Utc::now();
            txn.put_booking(booking).await?;
        }

        post_entry(
            &mut txn,
            payment.folio,
            LedgerAccount::Cash,
            LedgerAccount::AccountsReceivable,
            input.amount,
        )
        .await?;
        AuditTrail::append(
            &mut txn,
            "receivable",
            receivable.id,
            "payment_registered",
            input.actor_id,
            Some(&before),
            Some(&receivable),
        )
        .await?;
        txn.commit().await?;

        info!(folio = %payment.folio, amount = %payment.amount, "Payment received");
        self.events.publish(DomainEvent::PaymentRegistered {
            payment_id: payment.id,
            folio: payment.folio,
            applied_to: receivable.id,
            amount: payment.amount,
        });
        Ok(payment)
    }

    /// Registers an outgoing disbursement against a payable.
    ///
    /// The authorization gate runs inside the transaction; a gated
    /// amount without an approver rolls everything back and publishes
    /// an authorization-required event.
    ///
    /// # Errors
    ///
    /// The receivable-side errors apply, plus `AuthorizationRequired`
    /// when the branch gate blocks the disbursement.
    pub async fn register_payment_sent(
        &self,
        input: OutgoingPayment,
    ) -> Result<PaymentRecord, LedgerError> {
        validate_payment_amount(input.amount)?;
        validate_method(&input.method)?;

        let mut txn = self.store.begin().await?;
        let result = apply_payment_to_payable(
            &mut txn,
            input.payable_id,
            &input.method,
            input.reference.as_deref(),
            input.amount,
            input.approver_id,
            input.actor_id,
        )
        .await;

        let payment = match result {
            Ok(payment) => payment,
            Err(err) => {
                if let LedgerError::AuthorizationRequired {
                    branch_id,
                    amount,
                    threshold,
                } = &err
                {
                    self.events.publish(DomainEvent::AuthorizationRequired {
                        request: travesia_core::authorization::AuthorizationPolicy::evaluate(
                            *branch_id, *threshold, *amount, None,
                        ),
                    });
                }
                return Err(err);
            }
        };
        txn.commit().await?;

        info!(folio = %payment.folio, amount = %payment.amount, "Payment sent");
        self.events.publish(DomainEvent::PaymentRegistered {
            payment_id: payment.id,
            folio: payment.folio,
            applied_to: input.payable_id,
            amount: payment.amount,
        });
        Ok(payment)
    }
}

fn validate_payment_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO || !is_valid_amount(amount) {
        return Err(LedgerError::Validation {
            message: format!(
                "Payment amount must be positive with at most 2 decimal places, got {amount}"
            ),
        });
    }
    Ok(())
}

pub(crate) fn validate_method(method: &str) -> Result<(), LedgerError> {
    if method.trim().is_empty() {
        return Err(LedgerError::Validation {
            message: "Payment method must not be blank".to_string(),
        });
    }
    Ok(())
}

fn check_open(status: SettlementStatus, record_id: Uuid) -> Result<(), LedgerError> {
    match status {
        SettlementStatus::Paid => Err(LedgerError::AlreadySettled { record_id }),
        SettlementStatus::Cancelled => Err(LedgerError::Validation {
            message: format!("Record {record_id} is cancelled and cannot take payments"),
        }),
        SettlementStatus::Pending | SettlementStatus::Partial => Ok(()),
    }
}

async fn check_duplicate<T: StoreTxn>(
    txn: &T,
    method: &str,
    reference: Option<&str>,
    amount: Decimal,
) -> Result<(), LedgerError> {
    // Cash payments carry no external reference and are exempt from
    // the idempotency guard.
    let Some(reference) = reference else {
        return Ok(());
    };
    if txn.find_payment(method, reference, amount).await?.is_some() {
        return Err(LedgerError::DuplicatePayment {
            method: method.to_string(),
            reference: reference.to_string(),
            amount,
        });
    }
    Ok(())
}

/// Applies a disbursement to a payable inside an open transaction.
///
/// Runs the authorization gate on the disbursement amount, then the
/// same guard/insert/recompute/post/audit sequence as the receivable
/// side with the cash posting reversed.
pub(crate) async fn apply_payment_to_payable<T: StoreTxn>(
    txn: &mut T,
    payable_id: Uuid,
    method: &str,
    reference: Option<&str>,
    amount: Decimal,
    approver_id: Option<Uuid>,
    actor_id: Uuid,
) -> Result<PaymentRecord, LedgerError> {
    let before = txn.payable(payable_id).await?.ok_or(LedgerError::NotFound {
        entity: "Payable",
        id: payable_id,
    })?;

    check_open(before.status, before.id)?;
    if amount > before.pending_amount {
        return Err(LedgerError::Overpayment {
            record_id: before.id,
            pending: before.pending_amount,
            attempted: amount,
        });
    }
    check_duplicate(txn, method, reference, amount).await?;

    let request =
        AuthorizationGate::evaluate(txn, before.branch_id, amount, approver_id).await?;
    if request.status == AuthorizationStatus::Pending {
        return Err(LedgerError::AuthorizationRequired {
            branch_id: before.branch_id,
            amount,
            threshold: request.threshold,
        });
    }

    let folio = next_folio(txn, FolioKind::Payment, Utc::now().date_naive()).await?;
    let payment = PaymentRecord {
        id: Uuid::new_v4(),
        folio,
        method: method.to_string(),
        reference: reference.map(str::to_string),
        amount,
        applied_to: PaymentTarget::Payable(before.id),
        created_at: Utc::now(),
    };
    txn.insert_payment(payment.clone()).await?;

    let mut payable = before.clone();
    payable.paid_amount += amount;
    payable.pending_amount = payable.total_amount - payable.paid_amount;
    payable.status = SettlementStatus::from_amounts(payable.paid_amount, payable.total_amount);
    payable.updated_at = Utc::now();
    txn.put_payable(payable.clone()).await?;

    post_entry(
        txn,
        payment.folio,
        LedgerAccount::AccountsPayable,
        LedgerAccount::Cash,
        amount,
    )
    .await?;
    AuditTrail::append(
        txn,
        "payable",
        payable.id,
        "payment_sent",
        actor_id,
        Some(&before),
        Some(&payable),
    )
    .await?;

    Ok(payment)
}
