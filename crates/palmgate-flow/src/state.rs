//! Shared system state: the single mutable snapshot every panel observes.
//!
//! The original simulation kept this as ambient UI state; here it is an
//! explicit context object owned by [`SharedSystem`], mutated only through
//! the orchestrator's phase transitions and the door-close handler, and
//! published to observers after every mutation over a watch channel.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tracing::debug;

use palmgate_core::{
    ActiveProtocol, Error, EventLog, LogCategory, Result, UserName, UserRole,
    constants::{STATUS_APP_READY, STATUS_DEVICE_READY, STATUS_MIDDLEWARE_WAITING},
};
use palmgate_session::Session;

use crate::phase::{FlowPhase, PhaseMachine};

/// Observable snapshot of the whole simulated system.
///
/// Cloned out to observers on every mutation; the event log rides along so
/// a single snapshot carries both current statuses and full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    /// Current phase of the access flow.
    pub phase: FlowPhase,

    /// Human-readable phase label for the scanning device panel.
    pub device_status: String,

    /// Whether the door is currently open.
    pub door_open: bool,

    /// Middleware panel label.
    pub middleware_status: String,

    /// School-app panel label.
    pub app_status: String,

    /// Which transport leg is active, for visualization only.
    pub active_protocol: ActiveProtocol,

    /// User attached to the in-flight scan, if any.
    pub current_user: Option<UserName>,

    /// Role attached to the in-flight scan, if any.
    pub user_role: Option<UserRole>,

    /// The single active class session. Survives resets; replaced wholesale
    /// by a later teacher scan.
    pub current_session: Option<Session>,

    /// Append-only record of everything that happened.
    pub event_log: EventLog,
}

impl SystemState {
    /// The idle baseline the system starts in and returns to after every
    /// completed or denied scan.
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            phase: FlowPhase::Idle,
            device_status: STATUS_DEVICE_READY.to_string(),
            door_open: false,
            middleware_status: STATUS_MIDDLEWARE_WAITING.to_string(),
            app_status: STATUS_APP_READY.to_string(),
            active_protocol: ActiveProtocol::None,
            current_user: None,
            user_role: None,
            current_session: None,
            event_log: EventLog::new(),
        }
    }

    /// Return the panels to baseline, keeping the session and the log.
    ///
    /// The session intentionally persists so students can keep checking in
    /// to the same class across scans.
    pub fn reset_to_baseline(&mut self) {
        self.phase = FlowPhase::Idle;
        self.device_status = STATUS_DEVICE_READY.to_string();
        self.middleware_status = STATUS_MIDDLEWARE_WAITING.to_string();
        self.app_status = STATUS_APP_READY.to_string();
        self.active_protocol = ActiveProtocol::None;
        self.current_user = None;
        self.user_role = None;
    }

    /// Returns `true` when the system is idle and ready for the next scan.
    #[must_use]
    pub fn is_at_baseline(&self) -> bool {
        self.phase == FlowPhase::Idle
            && self.device_status == STATUS_DEVICE_READY
            && self.active_protocol == ActiveProtocol::None
            && self.current_user.is_none()
            && !self.door_open
    }
}

impl Default for SystemState {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Owner of the mutable [`SystemState`] and the phase machine guarding it.
///
/// All mutations go through this handle, which publishes a fresh snapshot
/// to watch subscribers after each one. Observers may either poll
/// [`snapshot`](SharedSystem::snapshot) or [`subscribe`](SharedSystem::subscribe).
#[derive(Debug)]
pub struct SharedSystem {
    state: Mutex<SystemState>,
    machine: Mutex<PhaseMachine>,
    scan_in_flight: AtomicBool,
    watch_tx: watch::Sender<SystemState>,
}

impl SharedSystem {
    /// Create a system at baseline with an idle phase machine.
    #[must_use]
    pub fn new() -> Self {
        let baseline = SystemState::baseline();
        let (watch_tx, _) = watch::channel(baseline.clone());
        Self {
            state: Mutex::new(baseline),
            machine: Mutex::new(PhaseMachine::new()),
            scan_in_flight: AtomicBool::new(false),
            watch_tx,
        }
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SystemState {
        self.watch_tx.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SystemState> {
        self.watch_tx.subscribe()
    }

    /// Returns `true` while a scan is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.scan_in_flight.load(Ordering::SeqCst)
    }

    /// Claim the single scan slot.
    ///
    /// # Errors
    /// Returns `Error::ScannerBusy` if a scan is already in flight. The slot
    /// is released only when the system returns to baseline.
    pub fn try_begin_scan(&self) -> Result<()> {
        self.scan_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| Error::ScannerBusy)
    }

    /// Mutate the state and publish the new snapshot.
    pub async fn update(&self, f: impl FnOnce(&mut SystemState)) {
        let mut state = self.state.lock().await;
        f(&mut state);
        self.watch_tx.send_replace(state.clone());
    }

    /// Read from the current state without publishing.
    pub async fn read<R>(&self, f: impl FnOnce(&SystemState) -> R) -> R {
        let state = self.state.lock().await;
        f(&state)
    }

    /// Append an event-log entry and publish the new snapshot.
    pub async fn log(&self, message: impl Into<String>, category: LogCategory) {
        let message = message.into();
        debug!(%category, "{message}");
        let mut state = self.state.lock().await;
        state.event_log.append(message, category);
        self.watch_tx.send_replace(state.clone());
    }

    /// Advance the phase machine and mirror the new phase into the state.
    ///
    /// # Errors
    /// Returns `Error::InvalidPhaseTransition` if the flow does not allow
    /// the move; neither the machine nor the state changes in that case.
    pub async fn advance(&self, next: FlowPhase) -> Result<()> {
        let mut machine = self.machine.lock().await;
        machine.transition_to(next)?;
        drop(machine);

        let mut state = self.state.lock().await;
        state.phase = next;
        self.watch_tx.send_replace(state.clone());
        Ok(())
    }

    /// Complete the `Resetting → Idle` transition and release the scan slot.
    ///
    /// The slot is released before the baseline snapshot is published, so an
    /// observer that sees the system idle can immediately start a new scan.
    ///
    /// # Errors
    /// Returns `Error::InvalidPhaseTransition` if the machine is not in
    /// `Resetting`; callers should fall back to [`force_idle`](Self::force_idle).
    pub async fn reset_to_idle(&self) -> Result<()> {
        let mut machine = self.machine.lock().await;
        machine.transition_to(FlowPhase::Idle)?;
        drop(machine);

        let mut state = self.state.lock().await;
        state.reset_to_baseline();
        self.scan_in_flight.store(false, Ordering::SeqCst);
        self.watch_tx.send_replace(state.clone());
        Ok(())
    }

    /// Recovery path: force the machine and state back to baseline
    /// regardless of the current phase, releasing the scan slot.
    pub async fn force_idle(&self) {
        let mut machine = self.machine.lock().await;
        machine.reset();
        drop(machine);

        let mut state = self.state.lock().await;
        state.reset_to_baseline();
        self.scan_in_flight.store(false, Ordering::SeqCst);
        self.watch_tx.send_replace(state.clone());
    }
}

impl Default for SharedSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmgate_session::ScheduledClass;

    #[test]
    fn test_baseline_is_idle() {
        let state = SystemState::baseline();
        assert!(state.is_at_baseline());
        assert_eq!(state.phase, FlowPhase::Idle);
        assert_eq!(state.device_status, STATUS_DEVICE_READY);
        assert!(state.current_session.is_none());
        assert!(state.event_log.is_empty());
    }

    #[test]
    fn test_reset_keeps_session_and_log() {
        let mut state = SystemState::baseline();
        let teacher = UserName::new("AHMED").unwrap();
        state.current_session = Some(Session::start(ScheduledClass::demo(), teacher));
        state.event_log.append("something", LogCategory::App);
        state.device_status = "User Identified: AHMED".to_string();
        state.current_user = Some(UserName::new("AHMED").unwrap());

        state.reset_to_baseline();

        assert!(state.is_at_baseline());
        assert!(state.current_session.is_some());
        assert_eq!(state.event_log.len(), 1);
    }

    #[tokio::test]
    async fn test_advance_mirrors_phase_into_state() {
        let system = SharedSystem::new();
        system.advance(FlowPhase::Identifying).await.unwrap();
        assert_eq!(system.snapshot().phase, FlowPhase::Identifying);
    }

    #[tokio::test]
    async fn test_advance_rejects_illegal_transition() {
        let system = SharedSystem::new();
        let result = system.advance(FlowPhase::SendingDoorCommand).await;
        assert!(result.is_err());
        assert_eq!(system.snapshot().phase, FlowPhase::Idle);
    }

    #[tokio::test]
    async fn test_scan_slot_is_exclusive() {
        let system = SharedSystem::new();
        system.try_begin_scan().unwrap();
        assert!(matches!(system.try_begin_scan(), Err(Error::ScannerBusy)));

        system.force_idle().await;
        system.try_begin_scan().unwrap();
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let system = SharedSystem::new();
        let mut rx = system.subscribe();

        system
            .update(|s| s.device_status = "Identifying User...".to_string())
            .await;

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().device_status, "Identifying User...");
    }

    #[tokio::test]
    async fn test_log_publishes_snapshot() {
        let system = SharedSystem::new();
        system.log("Door: Opened", LogCategory::Door).await;

        let snapshot = system.snapshot();
        assert_eq!(snapshot.event_log.len(), 1);
        assert_eq!(snapshot.event_log.entries()[0].message, "Door: Opened");
    }
}
