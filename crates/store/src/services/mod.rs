//! Orchestrating services over the transactional store.
//!
//! Each operation opens one transaction, performs every read, guard,
//! and write inside it, and commits once. Domain events are published
//! only after a successful commit.

pub mod audit;
pub mod authorization;
pub mod booking;
pub mod error;
pub mod ledger;
pub mod payment;

pub use audit::AuditTrail;
pub use authorization::AuthorizationGate;
pub use booking::{BookingService, CancellationOutcome, NewBooking, SettlementOutcome};
pub use error::LedgerError;
pub use ledger::{LedgerService, NewPayable, NewReceivable, PayableReason, ReceivablePatch};
pub use payment::{IncomingPayment, OutgoingPayment, PaymentProcessor};

use tokio::sync::broadcast;

use travesia_core::events::DomainEvent;

/// Broadcast channel for committed domain events.
///
/// Cloneable handle; every subscriber gets every event published after
/// it subscribed. Slow subscribers lag, they never block publishers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Creates a bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event. A bus with no subscribers drops the event.
    pub fn publish(&self, event: DomainEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(travesia_shared::config::EventsConfig::default().channel_capacity)
    }
}
