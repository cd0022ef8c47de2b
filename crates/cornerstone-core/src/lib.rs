//! Cornerstone core: record types, validation rules, and shared utilities.
//!
//! This crate has no internal Cornerstone dependencies. Storage, clients,
//! and the HTTP surface all build on the types defined here.
//!
//! # Modules
//!
//! - [`error`]: Error type and Result alias
//! - [`model`]: Records for every console app
//! - [`record`]: The `Record` trait implemented by stored records
//! - [`service`]: Service lifecycle handles reported by `/health`
//! - [`traits`]: Configuration management trait
//! - [`util`]: Id helpers

#![doc = include_str!("../README.md")]

pub mod error;
pub mod model;
pub mod record;
pub mod service;
pub mod traits;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use record::Record;
pub use service::{ServiceHandle, ServiceState};
pub use traits::ConfigManager;

// Convenience re-exports from util
pub use util::ids::{new_id, normalize_id};
