//! Tiered time-based refund policy engine.
//!
//! Maps cancellation lead time and amount paid to a refund/retention
//! split with no rounding leakage at the cent level.

pub mod policy;

pub use policy::{RefundBreakdown, RefundPolicy, RefundTier};
