//! Display texts and default timings for the access-flow simulation.
//!
//! All delay values are illustrative, matching the pacing of the scripted
//! demo rather than any real device latency. They are defaults only; the
//! orchestrator accepts custom timings for tests.

// ============================================================================
// Baseline status texts
// ============================================================================

/// Device panel text while idle and accepting scans.
pub const STATUS_DEVICE_READY: &str = "Ready to Scan";

/// Middleware panel text while idle.
pub const STATUS_MIDDLEWARE_WAITING: &str = "Waiting for Connection";

/// School-app panel text while idle.
pub const STATUS_APP_READY: &str = "Ready";

// ============================================================================
// Default phase delays (milliseconds)
// ============================================================================

/// Palm capture and lookup.
pub const DELAY_IDENTIFY_MS: u64 = 2000;

/// Pause on the "User Identified" confirmation before transmitting.
pub const DELAY_CONFIRM_MS: u64 = 1000;

/// Device pushing the TCP identification record to the middleware.
pub const DELAY_TCP_FORWARD_MS: u64 = 1500;

/// Middleware translating the TCP record into an HTTP request.
pub const DELAY_TRANSLATE_MS: u64 = 1000;

/// Middleware posting the HTTP request to the school app.
pub const DELAY_HTTP_FORWARD_MS: u64 = 1000;

/// School app confirming a security agent's clearance.
pub const DELAY_CLEARANCE_MS: u64 = 1000;

/// School app looking up the teacher's schedule.
pub const DELAY_SCHEDULE_MS: u64 = 2000;

/// School app opening the new class session.
pub const DELAY_SESSION_START_MS: u64 = 1500;

/// School app checking whether any session is active.
pub const DELAY_SESSION_CHECK_MS: u64 = 1500;

/// School app verifying a student's enrollment.
pub const DELAY_ENROLLMENT_MS: u64 = 2000;

/// School app recording the attendance entry.
pub const DELAY_MARK_PRESENT_MS: u64 = 1000;

/// Middleware receiving the door command over HTTP.
pub const DELAY_DOOR_RELAY_MS: u64 = 1000;

/// Middleware converting the door command back to TCP.
pub const DELAY_DOOR_CONVERT_MS: u64 = 1000;

/// How long the door stays open before the auto-close fires.
pub const DOOR_AUTO_CLOSE_MS: u64 = 3000;

/// Pause before the panels return to their baseline texts.
pub const DELAY_RESET_MS: u64 = 1000;

// ============================================================================
// User name constraints
// ============================================================================

/// Minimum accepted user-name length (characters, after trimming).
pub const MIN_USER_NAME_LENGTH: usize = 2;

/// Maximum accepted user-name length (characters, after trimming).
pub const MAX_USER_NAME_LENGTH: usize = 40;
