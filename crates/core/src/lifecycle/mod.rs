//! Trip booking lifecycle state machine.
//!
//! This module implements the 10-state booking status machine and its
//! transition guards.
//!
//! # Modules
//!
//! - `types` - Status enum, actions, and status history entries
//! - `error` - Lifecycle-specific error types
//! - `machine` - Transition table and guard evaluation

pub mod error;
pub mod machine;
pub mod types;

#[cfg(test)]
mod machine_props;

pub use error::LifecycleError;
pub use machine::Lifecycle;
pub use types::{StatusChange, TripAction, TripStatus};
