//! QoE Meter Common Library
//!
//! Shared types and the error taxonomy for the QoE scenario harness.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// QoE Meter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
