//! In-memory transactional store.
//!
//! The whole state sits behind one async mutex. A transaction takes the
//! lock for its entire lifetime and mutates a working copy; commit
//! writes the copy back, dropping the handle discards it. Holding the
//! lock across the transaction makes every transaction serializable,
//! which is exactly the guarantee folio generation needs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use travesia_core::folio::{Folio, FolioKind, FolioPeriod};

use crate::records::{
    AuditLogEntry, BookingRecord, BranchConfig, LedgerEntryRecord, PayableRecord, PaymentRecord,
    PaymentTarget, ReceivableRecord,
};
use crate::store::{StoreError, StoreTxn, TransactionalStore};

/// The logical tables.
#[derive(Debug, Clone, Default)]
struct StoreState {
    bookings: HashMap<Uuid, BookingRecord>,
    receivables: HashMap<Uuid, ReceivableRecord>,
    payables: HashMap<Uuid, PayableRecord>,
    payments: Vec<PaymentRecord>,
    ledger_entries: Vec<LedgerEntryRecord>,
    audit_log: Vec<AuditLogEntry>,
    branch_config: HashMap<Uuid, BranchConfig>,
}

/// An in-memory store with serializable transactions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionalStore for MemoryStore {
    type Txn = MemoryTxn;

    async fn begin(&self) -> Result<Self::Txn, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTxn { guard, working })
    }
}

/// An open transaction against a [`MemoryStore`].
///
/// Holds the store lock until committed or dropped.
#[derive(Debug)]
pub struct MemoryTxn {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
}

#[async_trait]
impl StoreTxn for MemoryTxn {
    async fn booking(&self, id: Uuid) -> Result<Option<BookingRecord>, StoreError> {
        Ok(self.working.bookings.get(&id).cloned())
    }

    async fn put_booking(&mut self, booking: BookingRecord) -> Result<(), StoreError> {
        self.working.bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn receivable(&self, id: Uuid) -> Result<Option<ReceivableRecord>, StoreError> {
        Ok(self.working.receivables.get(&id).cloned())
    }

    async fn receivable_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<ReceivableRecord>, StoreError> {
        Ok(self
            .working
            .receivables
            .values()
            .find(|r| r.booking_id == booking_id)
            .cloned())
    }

    async fn put_receivable(&mut self, receivable: ReceivableRecord) -> Result<(), StoreError> {
        self.working.receivables.insert(receivable.id, receivable);
        Ok(())
    }

    async fn payable(&self, id: Uuid) -> Result<Option<PayableRecord>, StoreError> {
        Ok(self.working.payables.get(&id).cloned())
    }

    async fn payable_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<PayableRecord>, StoreError> {
        Ok(self
            .working
            .payables
            .values()
            .find(|p| p.booking_id == Some(booking_id))
            .cloned())
    }

    async fn put_payable(&mut self, payable: PayableRecord) -> Result<(), StoreError> {
        self.working.payables.insert(payable.id, payable);
        Ok(())
    }

    async fn find_payment(
        &self,
        method: &str,
        reference: &str,
        amount: Decimal,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        Ok(self
            .working
            .payments
            .iter()
            .find(|p| {
                p.method == method
                    && p.reference.as_deref() == Some(reference)
                    && p.amount == amount
            })
            .cloned())
    }

    async fn payments_for(
        &self,
        target: PaymentTarget,
    ) -> Result<Vec<PaymentRecord>, StoreError> {
        Ok(self
            .working
            .payments
            .iter()
            .filter(|p| p.applied_to == target)
            .cloned()
            .collect())
    }

    async fn insert_payment(&mut self, payment: PaymentRecord) -> Result<(), StoreError> {
        self.working.payments.push(payment);
        Ok(())
    }

    async fn append_ledger_entry(&mut self, entry: LedgerEntryRecord) -> Result<(), StoreError> {
        self.working.ledger_entries.push(entry);
        Ok(())
    }

    async fn ledger_entries_for_folio(
        &self,
        folio: Folio,
    ) -> Result<Vec<LedgerEntryRecord>, StoreError> {
        Ok(self
            .working
            .ledger_entries
            .iter()
            .filter(|e| e.folio == folio)
            .cloned()
            .collect())
    }

    async fn append_audit(&mut self, entry: AuditLogEntry) -> Result<(), StoreError> {
        self.working.audit_log.push(entry);
        Ok(())
    }

    async fn audit_for(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(self
            .working
            .audit_log
            .iter()
            .filter(|e| e.entity_type == entity_type && e.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn branch_config(&self, branch_id: Uuid) -> Result<Option<BranchConfig>, StoreError> {
        Ok(self.working.branch_config.get(&branch_id).cloned())
    }

    async fn put_branch_config(&mut self, config: BranchConfig) -> Result<(), StoreError> {
        self.working.branch_config.insert(config.branch_id, config);
        Ok(())
    }

    async fn last_folio_sequence(
        &self,
        kind: FolioKind,
        period: FolioPeriod,
    ) -> Result<u32, StoreError> {
        let in_bucket = |f: &Folio| f.kind == kind && f.period == period;
        let max = match kind {
            FolioKind::Receivable => self
                .working
                .receivables
                .values()
                .filter(|r| in_bucket(&r.folio))
                .map(|r| r.folio.sequence)
                .max(),
            FolioKind::Payable => self
                .working
                .payables
                .values()
                .filter(|p| in_bucket(&p.folio))
                .map(|p| p.folio.sequence)
                .max(),
            FolioKind::Payment => self
                .working
                .payments
                .iter()
                .filter(|p| in_bucket(&p.folio))
                .map(|p| p.folio.sequence)
                .max(),
        };
        Ok(max.unwrap_or(0))
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        *self.guard = self.working;
        Ok(())
    }
}
