//! Receivable and payable management with double-entry postings.
//!
//! Every document gets a folio generated inside its own transaction and
//! a balanced posting written alongside it. The `*_in_txn` helpers let
//! other services compose these steps into larger transactions, the
//! cancellation flow being the main consumer.

use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use travesia_core::authorization::AuthorizationStatus;
use travesia_core::folio::{Folio, FolioKind, FolioPeriod};
use travesia_shared::config::LedgerConfig;
use travesia_shared::types::money::is_valid_amount;

use crate::records::{
    LedgerAccount, LedgerEntryRecord, PayableRecord, ReceivableRecord, SettlementStatus,
};
use crate::services::audit::AuditTrail;
use crate::services::authorization::AuthorizationGate;
use crate::services::error::LedgerError;
use crate::store::{StoreError, StoreTxn, TransactionalStore};

/// Input for creating a receivable.
#[derive(Debug, Clone)]
pub struct NewReceivable {
    /// The booking the receivable collects for.
    pub booking_id: Uuid,
    /// The customer who owes.
    pub customer_id: Uuid,
    /// The branch the record belongs to.
    pub branch_id: Uuid,
    /// Total amount owed.
    pub total_amount: Decimal,
    /// Due date; defaults to the configured horizon when omitted.
    pub due_date: Option<NaiveDate>,
    /// The user performing the operation.
    pub actor_id: Uuid,
}

/// Why a payable exists, which decides its expense account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayableReason {
    /// Refund owed back to a customer.
    Refund,
    /// Cost owed to a supplier or guide.
    Supplier,
}

impl PayableReason {
    /// The expense account debited when the payable is created.
    #[must_use]
    pub const fn expense_account(self) -> LedgerAccount {
        match self {
            Self::Refund => LedgerAccount::RefundExpense,
            Self::Supplier => LedgerAccount::SupplierExpense,
        }
    }
}

/// Input for creating a payable.
#[derive(Debug, Clone)]
pub struct NewPayable {
    /// The booking the payable relates to, if any.
    pub booking_id: Option<Uuid>,
    /// Who gets paid.
    pub beneficiary_id: Uuid,
    /// The branch the record belongs to.
    pub branch_id: Uuid,
    /// Total amount owed.
    pub total_amount: Decimal,
    /// Due date; defaults to today when omitted.
    pub due_date: Option<NaiveDate>,
    /// Why the payable exists.
    pub reason: PayableReason,
    /// The manager approving the disbursement, when the gate needs one.
    pub approver_id: Option<Uuid>,
    /// The user performing the operation.
    pub actor_id: Uuid,
}

/// The mutable subset of a receivable.
///
/// Financial amounts only move through payments and cancellation, never
/// through updates.
#[derive(Debug, Clone, Default)]
pub struct ReceivablePatch {
    /// New due date.
    pub due_date: Option<NaiveDate>,
}

/// Receivable/payable lifecycle and ledger postings.
#[derive(Debug, Clone)]
pub struct LedgerService<S> {
    store: S,
    default_due_days: u32,
}

impl<S: TransactionalStore> LedgerService<S> {
    /// Creates the service over a store.
    pub fn new(store: S, config: &LedgerConfig) -> Self {
        Self {
            store,
            default_due_days: config.default_due_days,
        }
    }

    /// Creates a receivable with its folio and revenue posting.
    ///
    /// When the booking is known, the receivable must fit inside the
    /// booking's outstanding amount and the booking must not already
    /// carry an open receivable. Payments against the receivable mirror
    /// onto the booking, so these bounds keep the booking's
    /// `pending = total - paid` from ever going negative.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a non-positive or over-precise amount,
    /// an amount exceeding the linked booking's outstanding amount, or
    /// a booking that already has an open receivable.
    pub async fn create_receivable(
        &self,
        input: NewReceivable,
    ) -> Result<ReceivableRecord, LedgerError> {
        validate_amount(input.total_amount)?;

        let mut txn = self.store.begin().await?;
        if let Some(booking) = txn.booking(input.booking_id).await? {
            if input.total_amount > booking.pending_amount {
                return Err(LedgerError::Validation {
                    message: format!(
                        "Receivable total {} exceeds outstanding amount {} on booking {}",
                        input.total_amount, booking.pending_amount, booking.id
                    ),
                });
            }
            if let Some(existing) = txn.receivable_for_booking(booking.id).await? {
                if matches!(
                    existing.status,
                    SettlementStatus::Pending | SettlementStatus::Partial
                ) {
                    return Err(LedgerError::Validation {
                        message: format!(
                            "Booking {} already has an open receivable {}",
                            booking.id, existing.folio
                        ),
                    });
                }
            }
        }
        let today = Utc::now().date_naive();
        let due_date = input
            .due_date
            .unwrap_or_else(|| default_due_date(today, self.default_due_days));

        let folio = next_folio(&txn, FolioKind::Receivable, today).await?;
        let now = Utc::now();
        let receivable = ReceivableRecord {
            id: Uuid::new_v4(),
            folio,
            booking_id: input.booking_id,
            customer_id: input.customer_id,
            branch_id: input.branch_id,
            total_amount: input.total_amount,
            paid_amount: Decimal::ZERO,
            pending_amount: input.total_amount,
            status: SettlementStatus::Pending,
            due_date,
            created_at: now,
            updated_at: now,
        };

        txn.put_receivable(receivable.clone()).await?;
        post_entry(
            &mut txn,
            folio,
            LedgerAccount::AccountsReceivable,
            LedgerAccount::Revenue,
            input.total_amount,
        )
        .await?;
        AuditTrail::append(
            &mut txn,
            "receivable",
            receivable.id,
            "created",
            input.actor_id,
            None::<&ReceivableRecord>,
            Some(&receivable),
        )
        .await?;
        txn.commit().await?;

        info!(folio = %receivable.folio, amount = %receivable.total_amount, "Receivable created");
        Ok(receivable)
    }

    /// Creates a payable with its folio and expense posting.
    ///
    /// The authorization gate runs before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationRequired` when the amount is at or above
    /// the branch limit and no approver was supplied, `Validation` for
    /// a bad amount, or the folio/store errors from the transaction.
    pub async fn create_payable(&self, input: NewPayable) -> Result<PayableRecord, LedgerError> {
        let mut txn = self.store.begin().await?;
        let payable = create_payable_in_txn(&mut txn, &input).await?;
        txn.commit().await?;

        info!(folio = %payable.folio, amount = %payable.total_amount, "Payable created");
        Ok(payable)
    }

    /// Cancels a receivable, reversing the uncollected remainder.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, `AlreadySettled` when the
    /// receivable is fully paid, or `Validation` when it is already
    /// cancelled.
    pub async fn cancel_receivable(
        &self,
        id: Uuid,
        actor_id: Uuid,
    ) -> Result<ReceivableRecord, LedgerError> {
        let mut txn = self.store.begin().await?;
        let receivable = cancel_receivable_in_txn(&mut txn, id, actor_id).await?;
        txn.commit().await?;

        info!(folio = %receivable.folio, "Receivable cancelled");
        Ok(receivable)
    }

    /// Updates the mutable fields of a receivable.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id or `Validation` when the
    /// receivable is no longer open.
    pub async fn update_receivable(
        &self,
        id: Uuid,
        patch: ReceivablePatch,
        actor_id: Uuid,
    ) -> Result<ReceivableRecord, LedgerError> {
        let mut txn = self.store.begin().await?;
        let before = txn.receivable(id).await?.ok_or(LedgerError::NotFound {
            entity: "Receivable",
            id,
        })?;
        if matches!(
            before.status,
            SettlementStatus::Paid | SettlementStatus::Cancelled
        ) {
            return Err(LedgerError::Validation {
                message: format!("Receivable {id} is closed and cannot be updated"),
            });
        }

        let mut receivable = before.clone();
        if let Some(due_date) = patch.due_date {
            receivable.due_date = due_date;
        }
        receivable.updated_at = Utc::now();

        txn.put_receivable(receivable.clone()).await?;
        AuditTrail::append(
            &mut txn,
            "receivable",
            id,
            "updated",
            actor_id,
            Some(&before),
            Some(&receivable),
        )
        .await?;
        txn.commit().await?;

        Ok(receivable)
    }
}

fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO || !is_valid_amount(amount) {
        return Err(LedgerError::Validation {
            message: format!("Amount must be positive with at most 2 decimal places, got {amount}"),
        });
    }
    Ok(())
}

fn default_due_date(today: NaiveDate, due_days: u32) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(due_days)))
        .unwrap_or(today)
}

/// Generates the next folio in the (kind, current month) bucket.
///
/// Reads the last issued sequence through the same transaction that
/// will insert the record, so two concurrent creations can never see
/// the same sequence.
pub(crate) async fn next_folio<T: StoreTxn>(
    txn: &T,
    kind: FolioKind,
    today: NaiveDate,
) -> Result<Folio, LedgerError> {
    let period = FolioPeriod::from_date(today);
    let last = txn.last_folio_sequence(kind, period).await?;
    Ok(Folio::next(kind, period, last)?)
}

/// Appends one balanced posting under a document folio.
pub(crate) async fn post_entry<T: StoreTxn>(
    txn: &mut T,
    folio: Folio,
    debit_account: LedgerAccount,
    credit_account: LedgerAccount,
    amount: Decimal,
) -> Result<(), StoreError> {
    txn.append_ledger_entry(LedgerEntryRecord {
        id: Uuid::new_v4(),
        folio,
        debit_account,
        credit_account,
        amount,
        created_at: Utc::now(),
    })
    .await
}

/// Creates a payable inside an open transaction.
///
/// Runs the authorization gate first; a gated amount without an
/// approver aborts before any write.
pub(crate) async fn create_payable_in_txn<T: StoreTxn>(
    txn: &mut T,
    input: &NewPayable,
) -> Result<PayableRecord, LedgerError> {
    validate_amount(input.total_amount)?;

    let request = AuthorizationGate::evaluate(
        txn,
        input.branch_id,
        input.total_amount,
        input.approver_id,
    )
    .await?;
    if request.status == AuthorizationStatus::Pending {
        return Err(LedgerError::AuthorizationRequired {
            branch_id: input.branch_id,
            amount: input.total_amount,
            threshold: request.threshold,
        });
    }

    let today = Utc::now().date_naive();
    let folio = next_folio(txn, FolioKind::Payable, today).await?;
    let now = Utc::now();
    let payable = PayableRecord {
        id: Uuid::new_v4(),
        folio,
        booking_id: input.booking_id,
        beneficiary_id: input.beneficiary_id,
        branch_id: input.branch_id,
        total_amount: input.total_amount,
        paid_amount: Decimal::ZERO,
        pending_amount: input.total_amount,
        status: SettlementStatus::Pending,
        due_date: input.due_date.unwrap_or(today),
        created_at: now,
        updated_at: now,
    };

    txn.put_payable(payable.clone()).await?;
    post_entry(
        txn,
        folio,
        input.reason.expense_account(),
        LedgerAccount::AccountsPayable,
        input.total_amount,
    )
    .await?;
    AuditTrail::append(
        txn,
        "payable",
        payable.id,
        "created",
        input.actor_id,
        None::<&PayableRecord>,
        Some(&payable),
    )
    .await?;

    Ok(payable)
}

/// Cancels a receivable inside an open transaction.
///
/// Reverses the uncollected remainder with a Revenue-against-AR posting
/// and leaves the collected portion untouched.
pub(crate) async fn cancel_receivable_in_txn<T: StoreTxn>(
    txn: &mut T,
    id: Uuid,
    actor_id: Uuid,
) -> Result<ReceivableRecord, LedgerError> {
    let before = txn.receivable(id).await?.ok_or(LedgerError::NotFound {
        entity: "Receivable",
        id,
    })?;
    match before.status {
        SettlementStatus::Cancelled => {
            return Err(LedgerError::Validation {
                message: format!("Receivable {id} is already cancelled"),
            });
        }
        SettlementStatus::Paid => {
            return Err(LedgerError::AlreadySettled { record_id: id });
        }
        SettlementStatus::Pending | SettlementStatus::Partial => {}
    }

    if before.pending_amount > Decimal::ZERO {
        post_entry(
            txn,
            before.folio,
            LedgerAccount::Revenue,
            LedgerAccount::AccountsReceivable,
            before.pending_amount,
        )
        .await?;
    }

    let mut receivable = before.clone();
    receivable.pending_amount = Decimal::ZERO;
    receivable.status = SettlementStatus::Cancelled;
    receivable.updated_at = Utc::now();

    txn.put_receivable(receivable.clone()).await?;
    AuditTrail::append(
        txn,
        "receivable",
        id,
        "cancelled",
        actor_id,
        Some(&before),
        Some(&receivable),
    )
    .await?;

    Ok(receivable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::BranchConfig;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn service() -> LedgerService<MemoryStore> {
        LedgerService::new(MemoryStore::new(), &LedgerConfig::default())
    }

    fn new_receivable(amount: Decimal) -> NewReceivable {
        NewReceivable {
            booking_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            total_amount: amount,
            due_date: None,
            actor_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_create_receivable_posts_and_audits() {
        let service = service();
        let receivable = service
            .create_receivable(new_receivable(dec!(12000)))
            .await
            .unwrap();

        assert_eq!(receivable.folio.sequence, 1);
        assert_eq!(receivable.status, SettlementStatus::Pending);
        assert_eq!(receivable.pending_amount, dec!(12000));

        let txn = service.store.begin().await.unwrap();
        let entries = txn
            .ledger_entries_for_folio(receivable.folio)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].debit_account, LedgerAccount::AccountsReceivable);
        assert_eq!(entries[0].credit_account, LedgerAccount::Revenue);
        assert_eq!(entries[0].amount, dec!(12000));

        let audit = txn.audit_for("receivable", receivable.id).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, "created");
    }

    #[tokio::test]
    async fn test_create_receivable_rejects_bad_amounts() {
        let service = service();
        for amount in [dec!(0), dec!(-10), dec!(1.005)] {
            let result = service.create_receivable(new_receivable(amount)).await;
            assert!(matches!(result, Err(LedgerError::Validation { .. })));
        }
    }

    #[tokio::test]
    async fn test_folio_sequences_are_consecutive() {
        let service = service();
        for expected in 1..=3 {
            let receivable = service
                .create_receivable(new_receivable(dec!(100)))
                .await
                .unwrap();
            assert_eq!(receivable.folio.sequence, expected);
        }
    }

    #[tokio::test]
    async fn test_create_payable_gated_without_approver() {
        let service = service();
        let branch_id = Uuid::new_v4();

        let mut txn = service.store.begin().await.unwrap();
        txn.put_branch_config(BranchConfig {
            branch_id,
            manager_authorization_limit: dec!(5000),
        })
        .await
        .unwrap();
        txn.commit().await.unwrap();

        let input = NewPayable {
            booking_id: None,
            beneficiary_id: Uuid::new_v4(),
            branch_id,
            total_amount: dec!(8000),
            due_date: None,
            reason: PayableReason::Supplier,
            approver_id: None,
            actor_id: Uuid::new_v4(),
        };
        let result = service.create_payable(input.clone()).await;
        assert!(matches!(
            result,
            Err(LedgerError::AuthorizationRequired {
                threshold: Some(t), ..
            }) if t == dec!(5000)
        ));

        // With an approver the same disbursement commits.
        let payable = service
            .create_payable(NewPayable {
                approver_id: Some(Uuid::new_v4()),
                ..input
            })
            .await
            .unwrap();
        assert_eq!(payable.pending_amount, dec!(8000));

        let txn = service.store.begin().await.unwrap();
        let entries = txn.ledger_entries_for_folio(payable.folio).await.unwrap();
        assert_eq!(entries[0].debit_account, LedgerAccount::SupplierExpense);
        assert_eq!(entries[0].credit_account, LedgerAccount::AccountsPayable);
    }

    #[tokio::test]
    async fn test_cancel_reverses_pending_only() {
        let service = service();
        let receivable = service
            .create_receivable(new_receivable(dec!(12000)))
            .await
            .unwrap();

        let cancelled = service
            .cancel_receivable(receivable.id, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(cancelled.status, SettlementStatus::Cancelled);
        assert_eq!(cancelled.pending_amount, dec!(0));

        let txn = service.store.begin().await.unwrap();
        let entries = txn
            .ledger_entries_for_folio(receivable.folio)
            .await
            .unwrap();
        // Creation posting plus the reversal.
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].debit_account, LedgerAccount::Revenue);
        assert_eq!(entries[1].credit_account, LedgerAccount::AccountsReceivable);
        assert_eq!(entries[1].amount, dec!(12000));
        // Release the store lock before the next service call.
        drop(txn);

        // A second cancellation is rejected.
        let result = service.cancel_receivable(receivable.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(LedgerError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_update_receivable_due_date() {
        let service = service();
        let receivable = service
            .create_receivable(new_receivable(dec!(500)))
            .await
            .unwrap();

        let new_due = NaiveDate::from_ymd_opt(2027, 1, 15).unwrap();
        let updated = service
            .update_receivable(
                receivable.id,
                ReceivablePatch {
                    due_date: Some(new_due),
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        assert_eq!(updated.due_date, new_due);

        let txn = service.store.begin().await.unwrap();
        let audit = txn.audit_for("receivable", receivable.id).await.unwrap();
        assert_eq!(audit.len(), 2);
        assert_eq!(audit[1].action, "updated");
    }
}
