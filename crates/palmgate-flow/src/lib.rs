//! Access-flow orchestration for the PalmGate simulation.
//!
//! This crate ties the event log, session manager, and door controller
//! together into the scripted access flow: device identification, the
//! TCP → HTTP → TCP protocol hand-off, role-specific business logic
//! (security / teacher / student), and the reset back to idle.
//!
//! # Phases
//!
//! Every scan walks an explicit finite-state machine:
//!
//! - `Idle → Identifying → Identified → ForwardingTcp → TranslatingToHttp → ForwardingHttp`
//! - then one role branch:
//!   - security: `CheckingClearance`
//!   - teacher: `CheckingSchedule → StartingSession`
//!   - student: `CheckingSession → VerifyingEnrollment → MarkingPresent`
//! - granted paths: `→ SendingDoorCommand → Resetting → Idle` (reset runs
//!   after the door auto-closes)
//! - denial paths: `CheckingSession`/`VerifyingEnrollment → Denied → Resetting → Idle`
//!
//! Each transition mutates the shared [`SystemState`], appends an event-log
//! entry, publishes a snapshot to subscribers, and sleeps the phase delay.
//!
//! # Single flight
//!
//! At most one scan is in flight; [`Orchestrator::trigger_scan`] rejects a
//! second scan with `Error::ScannerBusy` until the system has returned to
//! baseline.

pub mod orchestrator;
pub mod phase;
pub mod state;

pub use orchestrator::{FlowTimings, Orchestrator, OrchestratorBuilder};
pub use phase::{FlowPhase, PhaseMachine, PhaseTransition};
pub use state::{SharedSystem, SystemState};
