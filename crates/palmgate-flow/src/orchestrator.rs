//! The access-flow orchestrator: sequences every phase of a scan.
//!
//! One call to [`Orchestrator::trigger_scan`] drives the full scripted
//! pipeline: palm identification on the device, the TCP record hand-off to
//! the middleware, the HTTP request to the school app, the role branch, and
//! the shared door-open sub-sequence. The door's auto-close timer is the
//! only detached task; when it fires, a background listener logs the
//! closure, resets the system to baseline, and releases the scan slot.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tracing::{error, info, warn};
use uuid::Uuid;

use palmgate_core::{
    ActiveProtocol, DenialReason, LogCategory, Result, ScanOutcome, UserName, UserRole, constants,
};
use palmgate_door::{DoorController, DoorEvent};
use palmgate_session::{Schedule, Session};

use crate::phase::FlowPhase;
use crate::state::{SharedSystem, SystemState};

/// Per-phase delays of the scripted flow.
///
/// Defaults reproduce the demo pacing; tests normally pair the defaults
/// with a paused tokio clock instead of shrinking them.
#[derive(Debug, Clone)]
pub struct FlowTimings {
    /// Palm capture and lookup.
    pub identify: Duration,
    /// Pause on the identification confirmation.
    pub confirm: Duration,
    /// Device → middleware TCP push.
    pub tcp_forward: Duration,
    /// Middleware TCP → HTTP translation.
    pub translate: Duration,
    /// Middleware → school-app HTTP post.
    pub http_forward: Duration,
    /// Security clearance confirmation.
    pub clearance: Duration,
    /// Teacher schedule lookup.
    pub schedule_lookup: Duration,
    /// New class session opening.
    pub session_start: Duration,
    /// Active-session check for students.
    pub session_check: Duration,
    /// Enrollment verification.
    pub enrollment: Duration,
    /// Attendance recording.
    pub mark_present: Duration,
    /// School app → middleware door command (HTTP leg).
    pub door_relay: Duration,
    /// Middleware HTTP → TCP door-command conversion.
    pub door_convert: Duration,
    /// Pause before the panels return to baseline.
    pub reset: Duration,
}

impl Default for FlowTimings {
    fn default() -> Self {
        Self {
            identify: Duration::from_millis(constants::DELAY_IDENTIFY_MS),
            confirm: Duration::from_millis(constants::DELAY_CONFIRM_MS),
            tcp_forward: Duration::from_millis(constants::DELAY_TCP_FORWARD_MS),
            translate: Duration::from_millis(constants::DELAY_TRANSLATE_MS),
            http_forward: Duration::from_millis(constants::DELAY_HTTP_FORWARD_MS),
            clearance: Duration::from_millis(constants::DELAY_CLEARANCE_MS),
            schedule_lookup: Duration::from_millis(constants::DELAY_SCHEDULE_MS),
            session_start: Duration::from_millis(constants::DELAY_SESSION_START_MS),
            session_check: Duration::from_millis(constants::DELAY_SESSION_CHECK_MS),
            enrollment: Duration::from_millis(constants::DELAY_ENROLLMENT_MS),
            mark_present: Duration::from_millis(constants::DELAY_MARK_PRESENT_MS),
            door_relay: Duration::from_millis(constants::DELAY_DOOR_RELAY_MS),
            door_convert: Duration::from_millis(constants::DELAY_DOOR_CONVERT_MS),
            reset: Duration::from_millis(constants::DELAY_RESET_MS),
        }
    }
}

/// Builder for [`Orchestrator`] instances with custom configuration.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use palmgate_flow::Orchestrator;
///
/// # fn inside_runtime() {
/// let flow = Orchestrator::builder()
///     .with_auto_close(Duration::from_secs(5))
///     .build();
/// # }
/// ```
#[derive(Debug, Default)]
pub struct OrchestratorBuilder {
    timings: Option<FlowTimings>,
    auto_close: Option<Duration>,
    schedule: Option<Schedule>,
}

impl OrchestratorBuilder {
    /// Override the per-phase delays.
    #[must_use]
    pub fn with_timings(mut self, timings: FlowTimings) -> Self {
        self.timings = Some(timings);
        self
    }

    /// Override the door auto-close delay (default 3 seconds).
    #[must_use]
    pub fn with_auto_close(mut self, auto_close: Duration) -> Self {
        self.auto_close = Some(auto_close);
        self
    }

    /// Override the class schedule the teacher branch consults.
    #[must_use]
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Build the orchestrator and spawn its door-close listener.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn build(self) -> Orchestrator {
        let timings = self.timings.unwrap_or_default();
        let auto_close = self
            .auto_close
            .unwrap_or(Duration::from_millis(constants::DOOR_AUTO_CLOSE_MS));
        let schedule = self.schedule.unwrap_or_default();

        let system = Arc::new(SharedSystem::new());
        let (door, door_events) = DoorController::new(auto_close);

        tokio::spawn(run_door_listener(
            door_events,
            Arc::clone(&system),
            timings.reset,
        ));

        Orchestrator {
            system,
            door: Mutex::new(door),
            timings,
            schedule,
        }
    }
}

/// Reacts to the door auto-close: records the closure, waits the reset
/// delay, and returns the system to baseline, releasing the scan slot.
async fn run_door_listener(
    mut events: mpsc::UnboundedReceiver<DoorEvent>,
    system: Arc<SharedSystem>,
    reset_delay: Duration,
) {
    while let Some(DoorEvent::Closed) = events.recv().await {
        system.update(|s| s.door_open = false).await;
        system.log("Door: Closed", LogCategory::Door).await;

        if let Err(e) = system.advance(FlowPhase::Resetting).await {
            error!(error = %e, "door closed in unexpected phase, forcing idle");
            system.force_idle().await;
            continue;
        }

        tokio::time::sleep(reset_delay).await;

        if let Err(e) = system.reset_to_idle().await {
            error!(error = %e, "reset transition rejected, forcing idle");
            system.force_idle().await;
        }
    }
}

/// The central state machine of the simulation.
///
/// Owns the shared system state, the door controller, and the schedule;
/// [`trigger_scan`](Orchestrator::trigger_scan) is the sole entry point.
///
/// # Examples
///
/// ```no_run
/// use palmgate_core::{ScanOutcome, UserRole};
/// use palmgate_flow::Orchestrator;
///
/// # async fn example() -> palmgate_core::Result<()> {
/// let flow = Orchestrator::new();
///
/// let outcome = flow
///     .trigger_scan(UserRole::Security, "RACHID".parse()?)
///     .await?;
/// assert!(outcome.is_granted());
///
/// // The door auto-closes and the panels return to baseline.
/// flow.wait_for_idle().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Orchestrator {
    system: Arc<SharedSystem>,
    door: Mutex<DoorController>,
    timings: FlowTimings,
    schedule: Schedule,
}

impl Orchestrator {
    /// Create an orchestrator with default timings and the demo schedule.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for custom configuration.
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Latest published snapshot of the system state.
    #[must_use]
    pub fn snapshot(&self) -> SystemState {
        self.system.snapshot()
    }

    /// Subscribe to snapshot updates (one value per mutation).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SystemState> {
        self.system.subscribe()
    }

    /// Returns `true` while a scan is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.system.is_busy()
    }

    /// Wait until the system is back at its idle baseline.
    pub async fn wait_for_idle(&self) {
        let mut rx = self.system.subscribe();
        // Only fails if the sender is dropped, which outlives self.
        let _ = rx.wait_for(SystemState::is_at_baseline).await;
    }

    /// Run one end-to-end scan for the given role and user.
    ///
    /// Granted scans return once the door has been commanded open; the
    /// auto-close and the reset to baseline complete in the background.
    /// Denied scans return after the system is already back at baseline.
    ///
    /// # Errors
    ///
    /// - `Error::ScannerBusy` if a scan is already in flight; the in-flight
    ///   scan is unaffected.
    /// - `Error::InvalidPhaseTransition` if the flow invariants are broken
    ///   (the system is forced back to idle first).
    pub async fn trigger_scan(&self, role: UserRole, name: UserName) -> Result<ScanOutcome> {
        self.system.try_begin_scan()?;

        let scan_id = Uuid::new_v4();
        info!(%scan_id, %role, user = %name, "scan initiated");

        match self.run_flow(role, &name, scan_id).await {
            Ok(outcome) => {
                info!(%scan_id, ?outcome, "scan completed");
                Ok(outcome)
            }
            Err(e) => {
                warn!(%scan_id, error = %e, "scan aborted, forcing idle");
                self.system.force_idle().await;
                Err(e)
            }
        }
    }

    async fn run_flow(&self, role: UserRole, name: &UserName, scan_id: Uuid) -> Result<ScanOutcome> {
        let system = &self.system;
        let t = &self.timings;

        // Identify
        system.advance(FlowPhase::Identifying).await?;
        system
            .update(|s| {
                s.device_status = "Identifying User...".to_string();
                s.current_user = Some(name.clone());
                s.user_role = Some(role);
            })
            .await;
        system
            .log(format!("User scan initiated for {name}"), LogCategory::Device)
            .await;
        tokio::time::sleep(t.identify).await;

        system.advance(FlowPhase::Identified).await?;
        system
            .update(|s| s.device_status = format!("User Identified: {name}"))
            .await;
        system
            .log(
                format!("Device: User '{name}' identified"),
                LogCategory::Device,
            )
            .await;
        tokio::time::sleep(t.confirm).await;

        // Device → middleware over TCP
        system.advance(FlowPhase::ForwardingTcp).await?;
        system
            .update(|s| {
                s.active_protocol = ActiveProtocol::Tcp;
                s.middleware_status = "Processing TCP Data...".to_string();
            })
            .await;
        system
            .log(
                "Device: Sending TCP identification record to middleware",
                LogCategory::Device,
            )
            .await;
        tokio::time::sleep(t.tcp_forward).await;

        // Middleware translation
        system.advance(FlowPhase::TranslatingToHttp).await?;
        system
            .update(|s| s.middleware_status = "Converting to HTTP Request...".to_string())
            .await;
        system
            .log(
                "Middleware: TCP received, converting to HTTP",
                LogCategory::Middleware,
            )
            .await;
        tokio::time::sleep(t.translate).await;

        // Middleware → school app over HTTP
        system.advance(FlowPhase::ForwardingHttp).await?;
        system
            .update(|s| {
                s.active_protocol = ActiveProtocol::Http;
                s.middleware_status = "HTTP Request Sent".to_string();
            })
            .await;
        system
            .log(
                "Middleware: HTTP POST request sent to school application",
                LogCategory::Middleware,
            )
            .await;
        tokio::time::sleep(t.http_forward).await;

        info!(%scan_id, %role, "dispatching role branch");
        match role {
            UserRole::Security => self.handle_security(name).await,
            UserRole::Teacher => self.handle_teacher(name).await,
            UserRole::Student => self.handle_student(name).await,
        }
    }

    async fn handle_security(&self, name: &UserName) -> Result<ScanOutcome> {
        let system = &self.system;

        system.advance(FlowPhase::CheckingClearance).await?;
        system
            .update(|s| s.app_status = "User is Security Agent. Opening door.".to_string())
            .await;
        system
            .log(
                "School App: Security agent identified, sending door open command",
                LogCategory::App,
            )
            .await;
        tokio::time::sleep(self.timings.clearance).await;

        self.send_door_command().await?;
        system
            .log(format!("Security Agent {name} entered"), LogCategory::App)
            .await;
        Ok(ScanOutcome::Granted)
    }

    async fn handle_teacher(&self, name: &UserName) -> Result<ScanOutcome> {
        let system = &self.system;

        system.advance(FlowPhase::CheckingSchedule).await?;
        system
            .update(|s| {
                s.app_status = format!("User is Teacher. Checking schedule for {name}...");
            })
            .await;
        system
            .log(
                format!("School App: Checking schedule for teacher {name}"),
                LogCategory::App,
            )
            .await;
        tokio::time::sleep(self.timings.schedule_lookup).await;

        system.advance(FlowPhase::StartingSession).await?;
        let class = self.schedule.class_for(name);
        let course = class.course.clone();
        let room = class.room.clone();
        let session = Session::start(class, name.clone());
        system
            .update(|s| {
                s.app_status =
                    format!("Class Scheduled: {course} - {room}. Starting New Session...");
                // Replaces any prior session wholesale.
                s.current_session = Some(session);
            })
            .await;
        system
            .log(
                format!("School App: Class session started - {course} in {room}"),
                LogCategory::App,
            )
            .await;
        tokio::time::sleep(self.timings.session_start).await;

        self.send_door_command().await?;
        system
            .log(
                format!("Teacher {name} started {course} session in {room}"),
                LogCategory::App,
            )
            .await;
        Ok(ScanOutcome::Granted)
    }

    async fn handle_student(&self, name: &UserName) -> Result<ScanOutcome> {
        let system = &self.system;

        system.advance(FlowPhase::CheckingSession).await?;
        system
            .update(|s| {
                s.app_status = "User is Student. Checking for active session...".to_string();
            })
            .await;
        system
            .log("School App: Checking for active session", LogCategory::App)
            .await;
        tokio::time::sleep(self.timings.session_check).await;

        let Some(session) = system.read(|s| s.current_session.clone()).await else {
            self.deny(
                "No active session found. Access denied.".to_string(),
                format!("Student {name} - No active session, access denied"),
            )
            .await?;
            return Ok(ScanOutcome::Denied(DenialReason::NoActiveSession));
        };

        let course = session.course().to_string();
        system.advance(FlowPhase::VerifyingEnrollment).await?;
        system
            .update(|s| {
                s.app_status =
                    format!("Active session ({course}) found. Verifying {name}'s enrollment...");
            })
            .await;
        system
            .log(
                format!("School App: Verifying {name}'s enrollment in {course}"),
                LogCategory::App,
            )
            .await;
        tokio::time::sleep(self.timings.enrollment).await;

        if !session.is_enrolled(name) {
            self.deny(
                format!("Student {name} not enrolled. Access denied."),
                format!("Student {name} not enrolled in current session, access denied"),
            )
            .await?;
            return Ok(ScanOutcome::Denied(DenialReason::NotEnrolled));
        }

        system.advance(FlowPhase::MarkingPresent).await?;
        system
            .update(|s| {
                s.app_status = format!("Student {name} is enrolled. Marking present.");
                if let Some(active) = &mut s.current_session {
                    active.mark_present(name.clone());
                }
            })
            .await;
        system
            .log(
                format!("School App: Student {name} marked present for {course}"),
                LogCategory::App,
            )
            .await;
        tokio::time::sleep(self.timings.mark_present).await;

        self.send_door_command().await?;
        system
            .log(
                format!("Student {name} marked present for {course}"),
                LogCategory::App,
            )
            .await;
        Ok(ScanOutcome::Granted)
    }

    /// Shared door-open sub-sequence: HTTP door command to the middleware,
    /// conversion back to TCP, then the door opens with auto-close armed.
    async fn send_door_command(&self) -> Result<()> {
        let system = &self.system;

        system.advance(FlowPhase::SendingDoorCommand).await?;
        system
            .update(|s| {
                s.active_protocol = ActiveProtocol::Http;
                s.middleware_status = "Receiving Door Command...".to_string();
            })
            .await;
        system
            .log(
                "School App: Sending door open command to middleware",
                LogCategory::App,
            )
            .await;
        tokio::time::sleep(self.timings.door_relay).await;

        system
            .update(|s| {
                s.active_protocol = ActiveProtocol::Tcp;
                s.middleware_status = "Converting HTTP to TCP...".to_string();
            })
            .await;
        system
            .log(
                "Middleware: Converting HTTP command to TCP",
                LogCategory::Middleware,
            )
            .await;
        tokio::time::sleep(self.timings.door_convert).await;

        {
            let mut door = self.door.lock().await;
            door.open();
        }
        system
            .update(|s| {
                s.middleware_status = "TCP Command Sent".to_string();
                s.door_open = true;
            })
            .await;
        system
            .log(
                "Middleware: TCP door command sent to device",
                LogCategory::Middleware,
            )
            .await;
        system.log("Door: Opened", LogCategory::Door).await;
        Ok(())
    }

    /// Terminal denial: expected domain outcome, not an error. Logs, winds
    /// down through `Denied → Resetting`, and returns only after the system
    /// is back at baseline.
    async fn deny(&self, app_status: String, log_message: String) -> Result<()> {
        let system = &self.system;

        system.advance(FlowPhase::Denied).await?;
        system.update(|s| s.app_status = app_status).await;
        system.log(log_message, LogCategory::App).await;

        system.advance(FlowPhase::Resetting).await?;
        tokio::time::sleep(self.timings.reset).await;
        system.reset_to_idle().await
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
