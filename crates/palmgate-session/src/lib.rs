//! Class sessions and attendance bookkeeping for the PalmGate simulation.
//!
//! A [`Session`] is the single currently active class: course, teacher,
//! room, a fixed enrollment roster, and an ordered attendance log. At most
//! one session is active at a time; starting a new one replaces the prior
//! session wholesale (no merging, no archival).

pub mod schedule;
pub mod session;

pub use schedule::{Schedule, ScheduledClass};
pub use session::{AttendanceRecord, AttendanceStatus, Session};
