//! The abstract transactional-store contract.
//!
//! The services in this crate depend only on these traits, not on any
//! particular query language. A store exposes begin/commit/rollback,
//! parameterized reads/writes, and read-your-writes consistency within
//! a transaction, over the logical tables: `bookings`, `receivables`,
//! `payables`, `payments`, `ledger_entries`, `audit_log`, and
//! `branch_config`.
//!
//! Dropping an uncommitted transaction rolls it back; there is no
//! partially-visible intermediate state for concurrent transactions.

pub mod memory;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use travesia_core::folio::{Folio, FolioKind, FolioPeriod};

use crate::records::{
    AuditLogEntry, BookingRecord, BranchConfig, LedgerEntryRecord, PayableRecord, PaymentRecord,
    PaymentTarget, ReceivableRecord,
};

pub use memory::{MemoryStore, MemoryTxn};

/// Errors surfaced by the persistence boundary.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store is temporarily unavailable; the operation may be
    /// retried.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Stored data violates an integrity expectation.
    #[error("Store integrity error: {0}")]
    Integrity(String),
}

impl StoreError {
    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// A transactional store over the ledger's logical tables.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    /// The transaction handle type.
    type Txn: StoreTxn;

    /// Begins a transaction.
    ///
    /// The transaction serializes against concurrent writers; in
    /// particular the read-last-sequence/insert sub-sequence of folio
    /// generation observes no concurrent interleavings.
    async fn begin(&self) -> Result<Self::Txn, StoreError>;
}

/// One transactional scope with commit-or-rollback semantics.
///
/// All reads observe the transaction's own writes. Dropping the handle
/// without committing discards every write.
#[async_trait]
pub trait StoreTxn: Send {
    /// Reads a booking by id.
    async fn booking(&self, id: Uuid) -> Result<Option<BookingRecord>, StoreError>;

    /// Inserts or replaces a booking.
    async fn put_booking(&mut self, booking: BookingRecord) -> Result<(), StoreError>;

    /// Reads a receivable by id.
    async fn receivable(&self, id: Uuid) -> Result<Option<ReceivableRecord>, StoreError>;

    /// Reads the receivable linked to a booking, if any.
    async fn receivable_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<ReceivableRecord>, StoreError>;

    /// Inserts or replaces a receivable.
    async fn put_receivable(&mut self, receivable: ReceivableRecord) -> Result<(), StoreError>;

    /// Reads a payable by id.
    async fn payable(&self, id: Uuid) -> Result<Option<PayableRecord>, StoreError>;

    /// Reads the payable linked to a booking, if any.
    async fn payable_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<PayableRecord>, StoreError>;

    /// Inserts or replaces a payable.
    async fn put_payable(&mut self, payable: PayableRecord) -> Result<(), StoreError>;

    /// Finds a payment matching method + reference + amount.
    ///
    /// This is the idempotency guard's lookup.
    async fn find_payment(
        &self,
        method: &str,
        reference: &str,
        amount: Decimal,
    ) -> Result<Option<PaymentRecord>, StoreError>;

    /// Lists the payments applied to a record.
    async fn payments_for(
        &self,
        target: PaymentTarget,
    ) -> Result<Vec<PaymentRecord>, StoreError>;

    /// Appends a payment. Payments are immutable once created.
    async fn insert_payment(&mut self, payment: PaymentRecord) -> Result<(), StoreError>;

    /// Appends a balanced ledger posting. Entries are never updated or
    /// deleted.
    async fn append_ledger_entry(&mut self, entry: LedgerEntryRecord) -> Result<(), StoreError>;

    /// Lists the postings recorded under a document folio.
    async fn ledger_entries_for_folio(
        &self,
        folio: Folio,
    ) -> Result<Vec<LedgerEntryRecord>, StoreError>;

    /// Appends an audit trail entry.
    async fn append_audit(&mut self, entry: AuditLogEntry) -> Result<(), StoreError>;

    /// Lists the audit trail for an entity.
    async fn audit_for(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> Result<Vec<AuditLogEntry>, StoreError>;

    /// Reads a branch's configuration.
    async fn branch_config(&self, branch_id: Uuid) -> Result<Option<BranchConfig>, StoreError>;

    /// Inserts or replaces a branch's configuration.
    async fn put_branch_config(&mut self, config: BranchConfig) -> Result<(), StoreError>;

    /// The highest folio sequence already issued in a (kind, month)
    /// bucket, or 0 when the bucket is empty.
    async fn last_folio_sequence(
        &self,
        kind: FolioKind,
        period: FolioPeriod,
    ) -> Result<u32, StoreError>;

    /// Commits the transaction, making all writes visible atomically.
    async fn commit(self) -> Result<(), StoreError>;
}
