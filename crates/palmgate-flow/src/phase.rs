//! Named phases of the access flow and the machine that enforces their order.
//!
//! The original scripted flow expressed its sequencing implicitly through
//! sequential awaits; here the sequence is an explicit transition table so
//! observers and tests can assert on phase identity instead of matching
//! status strings.

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use palmgate_core::{Error, Result};

/// Maximum number of phase transitions to keep in history.
///
/// A full granted scan is at most 10 transitions, so 100 covers roughly the
/// last ten scans, which is plenty for debugging a demo run.
const MAX_HISTORY_SIZE: usize = 100;

/// One named step of the orchestrator's sequential state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    /// Baseline: waiting for a scan.
    Idle,

    /// Device is capturing and looking up the palm print.
    Identifying,

    /// Device has resolved the user; confirmation shown before transmit.
    Identified,

    /// Device is pushing the TCP identification record to the middleware.
    ForwardingTcp,

    /// Middleware is converting the TCP record into an HTTP request.
    TranslatingToHttp,

    /// Middleware has posted the HTTP request to the school app.
    ForwardingHttp,

    /// Security branch: confirming the agent's clearance.
    CheckingClearance,

    /// Teacher branch: looking up the teacher's schedule.
    CheckingSchedule,

    /// Teacher branch: opening the new class session.
    StartingSession,

    /// Student branch: checking whether any session is active.
    CheckingSession,

    /// Student branch: verifying enrollment against the roster.
    VerifyingEnrollment,

    /// Student branch: appending the attendance record.
    MarkingPresent,

    /// Shared door-open sub-sequence (HTTP command → TCP → door).
    SendingDoorCommand,

    /// Terminal failure branch: access denied, no door action.
    Denied,

    /// Pause before the panels return to baseline.
    Resetting,
}

impl fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase_str = match self {
            FlowPhase::Idle => "Idle",
            FlowPhase::Identifying => "Identifying",
            FlowPhase::Identified => "Identified",
            FlowPhase::ForwardingTcp => "ForwardingTcp",
            FlowPhase::TranslatingToHttp => "TranslatingToHttp",
            FlowPhase::ForwardingHttp => "ForwardingHttp",
            FlowPhase::CheckingClearance => "CheckingClearance",
            FlowPhase::CheckingSchedule => "CheckingSchedule",
            FlowPhase::StartingSession => "StartingSession",
            FlowPhase::CheckingSession => "CheckingSession",
            FlowPhase::VerifyingEnrollment => "VerifyingEnrollment",
            FlowPhase::MarkingPresent => "MarkingPresent",
            FlowPhase::SendingDoorCommand => "SendingDoorCommand",
            FlowPhase::Denied => "Denied",
            FlowPhase::Resetting => "Resetting",
        };
        write!(f, "{}", phase_str)
    }
}

impl FlowPhase {
    /// Check if transition to target phase is valid from this phase.
    ///
    /// # Examples
    ///
    /// ```
    /// use palmgate_flow::FlowPhase;
    ///
    /// assert!(FlowPhase::Idle.can_transition_to(&FlowPhase::Identifying));
    /// assert!(!FlowPhase::Idle.can_transition_to(&FlowPhase::SendingDoorCommand));
    /// ```
    #[must_use]
    pub fn can_transition_to(&self, target: &FlowPhase) -> bool {
        matches!(
            (self, target),
            (FlowPhase::Idle, FlowPhase::Identifying)
                | (FlowPhase::Identifying, FlowPhase::Identified)
                | (FlowPhase::Identified, FlowPhase::ForwardingTcp)
                | (FlowPhase::ForwardingTcp, FlowPhase::TranslatingToHttp)
                | (FlowPhase::TranslatingToHttp, FlowPhase::ForwardingHttp)
                // Role dispatch
                | (
                    FlowPhase::ForwardingHttp,
                    FlowPhase::CheckingClearance
                        | FlowPhase::CheckingSchedule
                        | FlowPhase::CheckingSession,
                )
                // Security branch
                | (FlowPhase::CheckingClearance, FlowPhase::SendingDoorCommand)
                // Teacher branch
                | (FlowPhase::CheckingSchedule, FlowPhase::StartingSession)
                | (FlowPhase::StartingSession, FlowPhase::SendingDoorCommand)
                // Student branch
                | (
                    FlowPhase::CheckingSession,
                    FlowPhase::VerifyingEnrollment | FlowPhase::Denied,
                )
                | (
                    FlowPhase::VerifyingEnrollment,
                    FlowPhase::MarkingPresent | FlowPhase::Denied,
                )
                | (FlowPhase::MarkingPresent, FlowPhase::SendingDoorCommand)
                // Wind-down
                | (FlowPhase::SendingDoorCommand, FlowPhase::Resetting)
                | (FlowPhase::Denied, FlowPhase::Resetting)
                | (FlowPhase::Resetting, FlowPhase::Idle)
        )
    }

    /// Returns `true` for the phases that end a scan without door action.
    #[must_use]
    pub fn is_denial(&self) -> bool {
        matches!(self, FlowPhase::Denied)
    }
}

/// A single recorded phase transition.
///
/// The `timestamp` is process-local and skipped during serialization; a
/// deserialized transition is stamped with the time of deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// The phase transitioned from.
    pub from: FlowPhase,

    /// The phase transitioned to.
    pub to: FlowPhase,

    /// When the transition occurred.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl PhaseTransition {
    fn new(from: FlowPhase, to: FlowPhase) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }
}

/// State machine enforcing the access-flow phase order.
///
/// Not thread-safe by design; the orchestrator guards it with a
/// `tokio::sync::Mutex`.
///
/// # Examples
///
/// ```
/// use palmgate_flow::{FlowPhase, PhaseMachine};
///
/// let mut machine = PhaseMachine::new();
/// machine.transition_to(FlowPhase::Identifying).unwrap();
/// assert_eq!(machine.current_phase(), FlowPhase::Identifying);
///
/// // Skipping ahead is rejected.
/// assert!(machine.transition_to(FlowPhase::SendingDoorCommand).is_err());
/// ```
#[derive(Debug)]
pub struct PhaseMachine {
    current: FlowPhase,
    entered_at: Instant,
    history: VecDeque<PhaseTransition>,
}

impl PhaseMachine {
    /// Create a machine in the `Idle` phase with empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: FlowPhase::Idle,
            entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// The phase the machine is currently in.
    #[must_use]
    pub fn current_phase(&self) -> FlowPhase {
        self.current
    }

    /// Time elapsed in the current phase.
    #[must_use]
    pub fn time_in_current_phase(&self) -> std::time::Duration {
        self.entered_at.elapsed()
    }

    /// Recorded transitions, oldest to newest, capped at the last 100.
    #[must_use]
    pub fn history(&self) -> &VecDeque<PhaseTransition> {
        &self.history
    }

    /// Transition to `next`, validating against the transition table.
    ///
    /// # Errors
    /// Returns `Error::InvalidPhaseTransition` if the flow does not allow
    /// moving from the current phase to `next`.
    pub fn transition_to(&mut self, next: FlowPhase) -> Result<PhaseTransition> {
        if !self.current.can_transition_to(&next) {
            return Err(Error::InvalidPhaseTransition {
                from: self.current.to_string(),
                to: next.to_string(),
            });
        }

        let transition = PhaseTransition::new(self.current, next);
        self.apply(next, transition.clone());
        Ok(transition)
    }

    /// Force the machine back to `Idle` regardless of the current phase.
    ///
    /// Recovery path only; normal flows reach `Idle` through `Resetting`.
    pub fn reset(&mut self) -> PhaseTransition {
        let transition = PhaseTransition::new(self.current, FlowPhase::Idle);
        self.apply(FlowPhase::Idle, transition.clone());
        transition
    }

    fn apply(&mut self, next: FlowPhase, transition: PhaseTransition) {
        self.current = next;
        self.entered_at = Instant::now();
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(machine: &mut PhaseMachine, phases: &[FlowPhase]) {
        for phase in phases {
            machine.transition_to(*phase).unwrap();
        }
    }

    #[test]
    fn test_new_machine_starts_idle() {
        let machine = PhaseMachine::new();
        assert_eq!(machine.current_phase(), FlowPhase::Idle);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_security_path_is_valid() {
        let mut machine = PhaseMachine::new();
        drive(
            &mut machine,
            &[
                FlowPhase::Identifying,
                FlowPhase::Identified,
                FlowPhase::ForwardingTcp,
                FlowPhase::TranslatingToHttp,
                FlowPhase::ForwardingHttp,
                FlowPhase::CheckingClearance,
                FlowPhase::SendingDoorCommand,
                FlowPhase::Resetting,
                FlowPhase::Idle,
            ],
        );
        assert_eq!(machine.current_phase(), FlowPhase::Idle);
        assert_eq!(machine.history().len(), 9);
    }

    #[test]
    fn test_teacher_path_is_valid() {
        let mut machine = PhaseMachine::new();
        drive(
            &mut machine,
            &[
                FlowPhase::Identifying,
                FlowPhase::Identified,
                FlowPhase::ForwardingTcp,
                FlowPhase::TranslatingToHttp,
                FlowPhase::ForwardingHttp,
                FlowPhase::CheckingSchedule,
                FlowPhase::StartingSession,
                FlowPhase::SendingDoorCommand,
                FlowPhase::Resetting,
                FlowPhase::Idle,
            ],
        );
        assert_eq!(machine.current_phase(), FlowPhase::Idle);
    }

    #[test]
    fn test_student_granted_path_is_valid() {
        let mut machine = PhaseMachine::new();
        drive(
            &mut machine,
            &[
                FlowPhase::Identifying,
                FlowPhase::Identified,
                FlowPhase::ForwardingTcp,
                FlowPhase::TranslatingToHttp,
                FlowPhase::ForwardingHttp,
                FlowPhase::CheckingSession,
                FlowPhase::VerifyingEnrollment,
                FlowPhase::MarkingPresent,
                FlowPhase::SendingDoorCommand,
                FlowPhase::Resetting,
                FlowPhase::Idle,
            ],
        );
        assert_eq!(machine.current_phase(), FlowPhase::Idle);
    }

    #[test]
    fn test_student_denial_paths_are_valid() {
        // No active session: CheckingSession → Denied.
        assert!(FlowPhase::CheckingSession.can_transition_to(&FlowPhase::Denied));
        // Not enrolled: VerifyingEnrollment → Denied.
        assert!(FlowPhase::VerifyingEnrollment.can_transition_to(&FlowPhase::Denied));
        // Both wind down through Resetting.
        assert!(FlowPhase::Denied.can_transition_to(&FlowPhase::Resetting));
        assert!(FlowPhase::Resetting.can_transition_to(&FlowPhase::Idle));
    }

    #[test]
    fn test_denial_never_reaches_the_door() {
        assert!(!FlowPhase::Denied.can_transition_to(&FlowPhase::SendingDoorCommand));
    }

    #[test]
    fn test_role_dispatch_fans_out_from_forwarding_http() {
        assert!(FlowPhase::ForwardingHttp.can_transition_to(&FlowPhase::CheckingClearance));
        assert!(FlowPhase::ForwardingHttp.can_transition_to(&FlowPhase::CheckingSchedule));
        assert!(FlowPhase::ForwardingHttp.can_transition_to(&FlowPhase::CheckingSession));
        assert!(!FlowPhase::ForwardingHttp.can_transition_to(&FlowPhase::SendingDoorCommand));
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut machine = PhaseMachine::new();
        assert!(machine.transition_to(FlowPhase::Identified).is_err());
        assert!(machine.transition_to(FlowPhase::SendingDoorCommand).is_err());
        // Machine unchanged after rejection.
        assert_eq!(machine.current_phase(), FlowPhase::Idle);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_transition_records_from_and_to() {
        let mut machine = PhaseMachine::new();
        let transition = machine.transition_to(FlowPhase::Identifying).unwrap();
        assert_eq!(transition.from, FlowPhase::Idle);
        assert_eq!(transition.to, FlowPhase::Identifying);
    }

    #[test]
    fn test_history_is_ordered_and_bounded() {
        let mut machine = PhaseMachine::new();
        for _ in 0..30 {
            drive(
                &mut machine,
                &[
                    FlowPhase::Identifying,
                    FlowPhase::Identified,
                    FlowPhase::ForwardingTcp,
                    FlowPhase::TranslatingToHttp,
                    FlowPhase::ForwardingHttp,
                    FlowPhase::CheckingSession,
                    FlowPhase::Denied,
                    FlowPhase::Resetting,
                    FlowPhase::Idle,
                ],
            );
        }
        assert_eq!(machine.history().len(), 100);
    }

    #[test]
    fn test_reset_forces_idle_from_any_phase() {
        let mut machine = PhaseMachine::new();
        drive(&mut machine, &[FlowPhase::Identifying, FlowPhase::Identified]);

        let transition = machine.reset();
        assert_eq!(machine.current_phase(), FlowPhase::Idle);
        assert_eq!(transition.from, FlowPhase::Identified);
        assert_eq!(transition.to, FlowPhase::Idle);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(FlowPhase::Idle.to_string(), "Idle");
        assert_eq!(FlowPhase::SendingDoorCommand.to_string(), "SendingDoorCommand");
        assert_eq!(FlowPhase::VerifyingEnrollment.to_string(), "VerifyingEnrollment");
    }

    #[test]
    fn test_phase_serialization() {
        let serialized = serde_json::to_string(&FlowPhase::CheckingSchedule).unwrap();
        assert_eq!(serialized, "\"checking_schedule\"");

        let deserialized: FlowPhase = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, FlowPhase::CheckingSchedule);
    }
}
