//! Persistence boundary and ledger services for Travesia.
//!
//! This crate provides:
//! - Persisted record types for the financial ledger
//! - The abstract transactional-store contract and an in-memory engine
//! - The orchestrating services: ledger, payments, bookings, audit trail,
//!   and the authorization gate

pub mod records;
pub mod services;
pub mod store;

pub use services::{
    AuditTrail, AuthorizationGate, BookingService, EventBus, LedgerError, LedgerService,
    PaymentProcessor,
};
pub use store::{MemoryStore, StoreError, StoreTxn, TransactionalStore};
