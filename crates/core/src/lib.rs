//! Core business logic for Travesia.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, transition rules, and calculations
//! live here.
//!
//! # Modules
//!
//! - `lifecycle` - Trip booking status state machine
//! - `refund` - Tiered time-based refund policy engine
//! - `folio` - Human-readable document identifiers with monthly sequences
//! - `authorization` - Manager authorization threshold decisions
//! - `events` - Domain events emitted for downstream collaborators

pub mod authorization;
pub mod events;
pub mod folio;
pub mod lifecycle;
pub mod refund;
