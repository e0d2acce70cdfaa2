use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Physical state of the door lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    /// Locked; the resting state.
    Closed,

    /// Unlocked; always transient, the auto-close timer returns the door
    /// to `Closed`.
    Open,
}

impl DoorState {
    /// Check if transition to target state is valid from this state.
    ///
    /// The door cycle is strictly `Closed → Open → Closed`.
    #[must_use]
    pub fn can_transition_to(&self, target: &DoorState) -> bool {
        matches!(
            (self, target),
            (DoorState::Closed, DoorState::Open) | (DoorState::Open, DoorState::Closed)
        )
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoorState::Closed => write!(f, "Closed"),
            DoorState::Open => write!(f, "Open"),
        }
    }
}

/// Event emitted by the door controller.
///
/// Opening is synchronous in the caller, so only the timer-driven closure
/// needs announcing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorEvent {
    /// The auto-close timer fired and the door is closed again.
    Closed,
}

/// Controller owning the door state and its one-shot auto-close timer.
///
/// # Auto-close
///
/// [`open`](DoorController::open) arms a timer that flips the door back to
/// `Closed` and sends [`DoorEvent::Closed`] on the event channel. A second
/// `open()` while a close is pending aborts and replaces the timer, so at
/// most one close can ever fire.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use palmgate_door::{DoorController, DoorEvent, DoorState};
///
/// # async fn example() {
/// let (mut door, mut events) = DoorController::new(Duration::from_secs(3));
/// assert_eq!(door.state(), DoorState::Closed);
///
/// door.open();
/// assert!(door.is_open());
///
/// // Roughly 3 seconds later:
/// assert_eq!(events.recv().await, Some(DoorEvent::Closed));
/// assert!(!door.is_open());
/// # }
/// ```
#[derive(Debug)]
pub struct DoorController {
    /// Shared with the auto-close task so closure is visible immediately.
    open_flag: Arc<AtomicBool>,

    /// Handle of the pending auto-close task, if any.
    pending_close: Option<JoinHandle<()>>,

    /// Delay between opening and the auto-close firing.
    auto_close: Duration,

    events: mpsc::UnboundedSender<DoorEvent>,
}

impl DoorController {
    /// Create a closed door with the given auto-close delay.
    ///
    /// Returns the controller and the receiving end of its event channel.
    #[must_use]
    pub fn new(auto_close: Duration) -> (Self, mpsc::UnboundedReceiver<DoorEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let controller = Self {
            open_flag: Arc::new(AtomicBool::new(false)),
            pending_close: None,
            auto_close,
            events,
        };
        (controller, rx)
    }

    /// Current door state.
    #[must_use]
    pub fn state(&self) -> DoorState {
        if self.is_open() {
            DoorState::Open
        } else {
            DoorState::Closed
        }
    }

    /// Returns `true` while the door is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open_flag.load(Ordering::SeqCst)
    }

    /// Open the door and arm the auto-close timer.
    ///
    /// If a close is already pending it is aborted and replaced; the door
    /// then closes once, `auto_close` after this call. Must be called from
    /// within a tokio runtime.
    pub fn open(&mut self) {
        if let Some(handle) = self.pending_close.take() {
            handle.abort();
            debug!("replacing pending auto-close timer");
        }

        self.open_flag.store(true, Ordering::SeqCst);
        debug!(delay_ms = self.auto_close.as_millis() as u64, "door opened, auto-close armed");

        let open_flag = Arc::clone(&self.open_flag);
        let events = self.events.clone();
        let delay = self.auto_close;
        self.pending_close = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            open_flag.store(false, Ordering::SeqCst);
            debug!("auto-close fired, door closed");
            // Receiver may be gone during shutdown; closing still happened.
            let _ = events.send(DoorEvent::Closed);
        }));
    }
}
