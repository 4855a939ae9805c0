//! Shared types, errors, and configuration for Travesia.
//!
//! This crate provides common types used across all other crates:
//! - Monetary rounding helpers with decimal precision
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
