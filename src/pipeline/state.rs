//! Capture pipeline state machine and shared application state.
//!
//! [`CaptureState`] drives the orchestrator's state machine.  The UI reads
//! it via [`SharedState`] to render the appropriate screen.
//!
//! [`SessionState`] is the transient capture session: it lives only while
//! the capture screen is in use and is reset wholesale, never partially.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::Settings;

// ---------------------------------------------------------------------------
// BlockReason
// ---------------------------------------------------------------------------

/// Why the pipeline refused to enter `CameraActive`.
///
/// Each reason renders a distinct terminal explanation screen; none of them
/// offers a retry loop — the preconditions are re-evaluated the next time
/// the user tries to activate the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Camera permission was not granted.
    PermissionDenied,
    /// No usable capture device exists.
    NoCamera,
    /// The settings record is not fully populated.
    MissingConfig,
}

impl BlockReason {
    /// The static message shown on the terminal explanation screen.
    pub fn message(&self) -> &'static str {
        match self {
            BlockReason::PermissionDenied => "Camera Access Denied",
            BlockReason::NoCamera => "No Camera Found",
            BlockReason::MissingConfig => "Please set host, port and languages",
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureState
// ---------------------------------------------------------------------------

/// States of the capture pipeline.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──activate (preconditions pass)──▶ CameraActive
///      ──activate (a precondition fails)─▶ Blocked(reason)
/// CameraActive ──photo taken + saved──▶ PhotoCaptured
/// PhotoCaptured ──caption extracted──▶ CaptionReceived
/// any state ──reset──▶ Idle
/// ```
///
/// Failures inside a stage never advance the state: a failed capture leaves
/// `CameraActive`, a failed upload leaves `PhotoCaptured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Waiting for the user to activate the camera.
    Idle,

    /// Camera preview is live; waiting for a capture action.
    CameraActive,

    /// A photo has been taken and saved; captioning is in flight or failed.
    PhotoCaptured,

    /// A caption arrived; translation and speech have been triggered.
    CaptionReceived,

    /// A precondition failed; a terminal explanation screen is shown.
    Blocked(BlockReason),
}

impl CaptureState {
    /// `true` while a terminal explanation screen is shown.
    pub fn is_blocked(&self) -> bool {
        matches!(self, CaptureState::Blocked(_))
    }

    /// `true` when the capture action is accepted in this state.
    ///
    /// ```
    /// use vsynth::pipeline::CaptureState;
    ///
    /// assert!(!CaptureState::Idle.accepts_capture());
    /// assert!(CaptureState::CameraActive.accepts_capture());
    /// assert!(!CaptureState::CaptionReceived.accepts_capture());
    /// ```
    pub fn accepts_capture(&self) -> bool {
        matches!(self, CaptureState::CameraActive | CaptureState::PhotoCaptured)
    }

    /// A short human-readable label for the UI status line.
    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "Idle",
            CaptureState::CameraActive => "Camera",
            CaptureState::PhotoCaptured => "Captioning",
            CaptureState::CaptionReceived => "Done",
            CaptureState::Blocked(_) => "Blocked",
        }
    }
}

impl Default for CaptureState {
    fn default() -> Self {
        CaptureState::Idle
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Transient capture-session values, scoped to the capture screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Whether the camera preview is live.
    pub camera_active: bool,
    /// Where the most recent photo was saved, if any.
    pub captured_photo: Option<PathBuf>,
    /// Caption returned by the captioning backend (source language).
    pub caption: String,
    /// Translated caption, when translation succeeded.
    pub translated_caption: String,
}

impl SessionState {
    /// Reset every field to its initial value.  Always succeeds.
    pub fn reset(&mut self) {
        *self = SessionState::default();
    }

    /// The text shown (and spoken) to the user: the translation when it
    /// exists, the original caption otherwise.
    pub fn display_caption(&self) -> Option<&str> {
        if !self.translated_caption.is_empty() {
            Some(&self.translated_caption)
        } else if !self.caption.is_empty() {
            Some(&self.caption)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// AppState / SharedState
// ---------------------------------------------------------------------------

/// Shared application state — the single source of truth for the UI.
///
/// Held behind [`SharedState`] (`Arc<Mutex<AppState>>`).  The pipeline
/// orchestrator mutates it; the egui update loop reads it each frame.
pub struct AppState {
    /// Current phase of the capture pipeline.
    pub state: CaptureState,

    /// Transient capture-session values.
    pub session: SessionState,

    /// Settings snapshot the orchestrator works from.
    pub settings: Settings,

    /// Scoped error message from the most recent failed step, if any.
    pub error_message: Option<String>,
}

impl AppState {
    /// Create a new `AppState` around a settings snapshot.
    pub fn new(settings: Settings) -> Self {
        Self {
            state: CaptureState::Idle,
            session: SessionState::default(),
            settings,
            error_message: None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

/// Thread-safe handle to [`AppState`].
///
/// Cheap to clone (`Arc` clone).  Lock with `.lock().unwrap()` for a short
/// critical section; do **not** hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<AppState>>;

/// Construct a new [`SharedState`] wrapping a fresh [`AppState`].
pub fn new_shared_state(settings: Settings) -> SharedState {
    Arc::new(Mutex::new(AppState::new(settings)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
