//! Demo data seeder for Travesia development and testing.
//!
//! Walks a complete booking through its financial lifecycle against the
//! in-memory store: branch setup, booking, receivable, payments, and a
//! tiered cancellation with its refund payable.
//!
//! Usage: cargo run --bin seeder

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use travesia_shared::config::AppConfig;
use travesia_store::records::BranchConfig;
use travesia_store::services::{
    BookingService, EventBus, IncomingPayment, LedgerService, NewBooking, NewReceivable,
    PaymentProcessor,
};
use travesia_store::store::{MemoryStore, StoreTxn, TransactionalStore};

/// Demo branch ID (consistent for all seeds)
const DEMO_BRANCH_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo customer ID (consistent for all seeds)
const DEMO_CUSTOMER_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Demo operator ID (consistent for all seeds)
const DEMO_ACTOR_ID: &str = "00000000-0000-0000-0000-000000000003";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().expect("Failed to load configuration");
    let store = MemoryStore::new();
    let events = EventBus::new(config.events.channel_capacity);

    let ledger = LedgerService::new(store.clone(), &config.ledger);
    let payments = PaymentProcessor::new(store.clone(), events.clone());
    let bookings = BookingService::new(store.clone(), events, &config.ledger);

    let branch_id = demo_id(DEMO_BRANCH_ID);
    let customer_id = demo_id(DEMO_CUSTOMER_ID);
    let actor_id = demo_id(DEMO_ACTOR_ID);

    println!("Seeding branch configuration...");
    let mut txn = store.begin().await.expect("Failed to begin transaction");
    txn.put_branch_config(BranchConfig {
        branch_id,
        manager_authorization_limit: dec!(50000),
    })
    .await
    .expect("Failed to seed branch configuration");
    txn.commit().await.expect("Failed to commit");

    println!("Seeding booking...");
    let booking_id = Uuid::new_v4();
    bookings
        .register_booking(NewBooking {
            booking_id,
            branch_id,
            customer_id,
            departure_date: Utc::now() + Duration::days(35),
            participants: 4,
            total_amount: dec!(12000),
            actor_id,
        })
        .await
        .expect("Failed to seed booking");

    println!("Seeding receivable...");
    let receivable = ledger
        .create_receivable(NewReceivable {
            booking_id,
            customer_id,
            branch_id,
            total_amount: dec!(12000),
            due_date: None,
            actor_id,
        })
        .await
        .expect("Failed to seed receivable");
    println!("  {}", receivable.folio);

    println!("Seeding payments...");
    for (amount, reference) in [(dec!(5000), "DEMO-OP-1"), (dec!(7000), "DEMO-OP-2")] {
        let payment = payments
            .register_payment_received(IncomingPayment {
                receivable_id: receivable.id,
                method: "transfer".to_string(),
                reference: Some(reference.to_string()),
                amount,
                actor_id,
            })
            .await
            .expect("Failed to seed payment");
        println!("  {} ({})", payment.folio, amount);
    }

    println!("Confirming booking...");
    bookings
        .confirm_payment(booking_id, actor_id)
        .await
        .expect("Failed to confirm booking");

    println!("Cancelling with tiered refund...");
    let outcome = bookings
        .cancel(booking_id, None, actor_id)
        .await
        .expect("Failed to cancel booking");
    println!(
        "  refund {} / retained {} ({})",
        outcome.breakdown.refund_amount,
        outcome.breakdown.retained_amount,
        outcome.breakdown.policy_applied.as_str()
    );
    if let Some(payable) = &outcome.refund_payable {
        println!("  {}", payable.folio);
    }

    println!("Seeding complete!");
}

fn demo_id(id: &str) -> Uuid {
    Uuid::parse_str(id).expect("Demo id must be a valid UUID")
}
