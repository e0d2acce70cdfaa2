//! Electric door lock model for the PalmGate simulation.
//!
//! The door has exactly two states and one directed cycle:
//!
//! - `Closed → Open` via [`DoorController::open`]
//! - `Open → Closed` via the auto-close timer only (no manual close)
//!
//! # Auto-close invariant
//!
//! At most one auto-close may ever be pending. Calling `open()` while the
//! door is already open does not stack a second timer: the pending close is
//! aborted and replaced, so the door closes once, timed from the most
//! recent open. Without this rule two scans in quick succession would each
//! schedule an independent close and race.

pub mod controller;

pub use controller::{DoorController, DoorEvent, DoorState};
