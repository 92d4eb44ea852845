//! V-Synth — photo → caption → translation → speech.
//!
//! A thin client around three external services: a remote image-captioning
//! backend (`POST /caption-base64`), the MyMemory translation API, and the
//! local text-to-speech engine.  The crate is organised around one capture
//! pipeline driven by an async orchestrator:
//!
//! ```text
//! Settings Store ─▶ Capture Pipeline ─▶ Captioning Client
//!                                          │ (caption set)
//!                                          ▼
//!                                   Translation Client ─▶ Speech Output
//! ```
//!
//! Device capabilities (camera, media library, TTS engine) are consumed
//! through object-safe traits in [`device`] and [`speech`] so the pipeline
//! can be tested end-to-end without hardware.

pub mod app;
pub mod config;
pub mod device;
pub mod net;
pub mod pipeline;
pub mod speech;
