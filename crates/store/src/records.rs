//! Persisted record types for the booking ledger.
//!
//! These are fully-materialized value objects at the component boundary;
//! the services read and write them through the abstract store contract.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use travesia_core::folio::Folio;
use travesia_core::lifecycle::{StatusChange, TripStatus};

/// Settlement status of a receivable or payable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    /// Nothing paid yet.
    Pending,
    /// Partially paid.
    Partial,
    /// Fully paid.
    Paid,
    /// Cancelled; the uncollected remainder was reversed.
    Cancelled,
}

impl SettlementStatus {
    /// Recomputes the status from paid and total amounts.
    ///
    /// `pending` when nothing is paid, `partial` when some is, `paid`
    /// when the amounts match.
    #[must_use]
    pub fn from_amounts(paid_amount: Decimal, total_amount: Decimal) -> Self {
        if paid_amount.is_zero() {
            Self::Pending
        } else if paid_amount < total_amount {
            Self::Partial
        } else {
            Self::Paid
        }
    }

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A trip booking, as owned by this core: status and linked financials.
///
/// Identity and catalog data come from the upstream booking collaborator.
/// Invariant: `pending_amount = total_amount - paid_amount >= 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    /// Booking id (upstream-supplied).
    pub id: Uuid,
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
    /// Amount paid so far.
    pub paid_amount: Decimal,
    /// Amount outstanding.
    pub pending_amount: Decimal,
    /// Current lifecycle status.
    pub status: TripStatus,
    /// Append-only transition history.
    pub status_history: Vec<StatusChange>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// An accounts-receivable record (CXC): money owed by a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivableRecord {
    /// Record id.
    pub id: Uuid,
    /// Human-readable document identifier.
    pub folio: Folio,
    /// The booking this receivable collects for.
    pub booking_id: Uuid,
    /// The customer who owes.
    pub customer_id: Uuid,
    /// The branch the record belongs to.
    pub branch_id: Uuid,
    /// Total amount owed.
    pub total_amount: Decimal,
    /// Amount collected so far.
    pub paid_amount: Decimal,
    /// Amount outstanding.
    pub pending_amount: Decimal,
    /// Settlement status.
    pub status: SettlementStatus,
    /// Date the remainder falls due.
    pub due_date: NaiveDate,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// An accounts-payable record (CXP): money owed to a supplier, guide,
/// or customer (refund disbursement). Mirror of `ReceivableRecord`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayableRecord {
    /// Record id.
    pub id: Uuid,
    /// Human-readable document identifier.
    pub folio: Folio,
    /// The booking this payable relates to, if any.
    pub booking_id: Option<Uuid>,
    /// Who gets paid.
    pub beneficiary_id: Uuid,
    /// The branch the record belongs to.
    pub branch_id: Uuid,
    /// Total amount owed.
    pub total_amount: Decimal,
    /// Amount disbursed so far.
    pub paid_amount: Decimal,
    /// Amount outstanding.
    pub pending_amount: Decimal,
    /// Settlement status.
    pub status: SettlementStatus,
    /// Date the remainder falls due.
    pub due_date: NaiveDate,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Which record a payment was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum PaymentTarget {
    /// Applied to a receivable (incoming money).
    Receivable(Uuid),
    /// Applied to a payable (outgoing money).
    Payable(Uuid),
}

impl PaymentTarget {
    /// The id of the targeted record.
    #[must_use]
    pub fn id(&self) -> Uuid {
        match self {
            Self::Receivable(id) | Self::Payable(id) => *id,
        }
    }
}

/// A registered payment. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Record id.
    pub id: Uuid,
    /// Payment folio.
    pub folio: Folio,
    /// Payment method (e.g. "cash", "transfer", "card").
    pub method: String,
    /// External reference, when one exists. Cash payments have none.
    pub reference: Option<String>,
    /// Payment amount.
    pub amount: Decimal,
    /// The receivable or payable the payment was applied to.
    pub applied_to: PaymentTarget,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Ledger accounts used in postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerAccount {
    /// Cash and bank balances.
    Cash,
    /// Amounts owed by customers.
    AccountsReceivable,
    /// Amounts owed to suppliers/guides/customers.
    AccountsPayable,
    /// Trip revenue.
    Revenue,
    /// Refund disbursements.
    RefundExpense,
    /// Supplier and guide costs.
    SupplierExpense,
}

impl LedgerAccount {
    /// Returns the string representation of the account.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::AccountsReceivable => "accounts_receivable",
            Self::AccountsPayable => "accounts_payable",
            Self::Revenue => "revenue",
            Self::RefundExpense => "refund_expense",
            Self::SupplierExpense => "supplier_expense",
        }
    }
}

/// One balanced double-entry posting. Append-only: entries are never
/// updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntryRecord {
    /// Record id.
    pub id: Uuid,
    /// Folio of the document that produced the posting.
    pub folio: Folio,
    /// The debited account.
    pub debit_account: LedgerAccount,
    /// The credited account.
    pub credit_account: LedgerAccount,
    /// The posted amount.
    pub amount: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One immutable audit trail entry. Written in the same transaction as
/// the change it describes, or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Record id.
    pub id: Uuid,
    /// The entity type the change applies to (e.g. "receivable").
    pub entity_type: String,
    /// The entity id the change applies to.
    pub entity_id: Uuid,
    /// The action performed (e.g. "payment_registered").
    pub action: String,
    /// The user who performed the action.
    pub actor_id: Uuid,
    /// Snapshot before the change.
    pub before: Option<serde_json::Value>,
    /// Snapshot after the change.
    pub after: Option<serde_json::Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Per-branch configuration consumed by the authorization gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchConfig {
    /// The branch.
    pub branch_id: Uuid,
    /// Amounts at or above this limit need manager approval.
    pub manager_authorization_limit: Decimal,
}
