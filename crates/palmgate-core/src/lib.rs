//! Shared domain types for the PalmGate access-control simulation.
//!
//! This crate holds the vocabulary used by every other workspace member:
//! user roles, the protocol label shown while a record is in transit, the
//! validated user-name newtype, scan outcomes, and the append-only event
//! log that records every step of a scan.

pub mod constants;
pub mod error;
pub mod log;
pub mod types;

pub use error::{Error, Result};
pub use log::{EventLog, LogEntry};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
