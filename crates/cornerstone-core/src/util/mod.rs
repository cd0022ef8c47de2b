//! Utility helpers shared across record types.
//!
//! # Modules
//!
//! - [`ids`]: Id generation and normalization

pub mod ids;
