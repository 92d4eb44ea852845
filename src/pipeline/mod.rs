//! Capture pipeline orchestrator for V-Synth.
//!
//! This module wires the full camera → gallery → encode → caption →
//! translate → speak pipeline and exposes the shared state the UI reads
//! every frame.
//!
//! # Architecture
//!
//! ```text
//! CaptureCommand (mpsc)
//!        │
//!        ▼
//! CaptureOrchestrator::run()  ← async tokio task
//!        │
//!        ├─ ActivateCamera → precondition gate → CameraActive / Blocked
//!        │
//!        ├─ TakePhoto
//!        │     ├─ spawn_blocking(CameraDevice::capture)
//!        │     ├─ spawn_blocking(MediaLibrary::save)      (capability re-check)
//!        │     ├─ re-read saved file → base64
//!        │     ├─ Captioner::caption (async)              → PhotoCaptured
//!        │     └─ caption set → Translator::translate     → CaptionReceived
//!        │            └─ ok / fallback → spawn_blocking(Speaker::speak)
//!        │
//!        ├─ Reset → clear session, back to Idle (always succeeds)
//!        └─ CheckConnectivity → ConnectivityProbe
//!
//! SharedState (Arc<Mutex<AppState>>) ←─── read by egui update() each frame
//! CaptureEvent (mpsc) ──────────────────▶ drained by the UI each frame
//! ```
//!
//! The caption → translate → speak chain is an explicit event inside the
//! orchestrator, de-duplicated by caption value: the same caption value is
//! never translated twice within one capture session.

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{CaptureOrchestrator, Collaborators};
pub use state::{new_shared_state, AppState, BlockReason, CaptureState, SessionState, SharedState};
