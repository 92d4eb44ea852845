//! Speech output — wraps the device text-to-speech engine.
//!
//! This module provides:
//! * [`Speaker`] — object-safe trait the pipeline speaks through.
//! * [`CommandSpeaker`] — production engine backed by the platform speech
//!   command.
//! * [`startup`] — explicit process-startup initialisation: set the default
//!   locale once (failure logged, non-fatal), announce readiness with a
//!   fixed greeting, and request engine installation when no engine exists.
//!
//! Speech never fails the pipeline: a broken engine degrades to log output.

pub mod engine;

pub use engine::CommandSpeaker;

#[cfg(test)]
pub use engine::MockSpeaker;

use thiserror::Error;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors the text-to-speech engine can report.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// No speech engine is installed on this system.
    #[error("no speech engine installed")]
    NoEngine,

    /// The engine exists but the utterance failed.
    #[error("speech engine error: {0}")]
    Engine(String),
}

// ---------------------------------------------------------------------------
// Speaker trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to a text-to-speech engine.
pub trait Speaker: Send + Sync {
    /// Set the locale used for subsequent utterances.
    fn set_default_language(&self, locale: &str) -> Result<(), SpeechError>;

    /// Speak `text` aloud.  Returns once the utterance has been handed to
    /// the engine; playback is not awaited.
    fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Ask the platform to install a speech engine.  Called when `speak`
    /// reports [`SpeechError::NoEngine`].
    fn request_engine_install(&self);
}

// Compile-time assertion: Box<dyn Speaker> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Speaker>) {}
};

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

/// Fixed readiness greeting, spoken once at startup.
pub const GREETING: &str = "Selamat Datang!";

/// Locale used until the user has picked a voice language.
pub const DEFAULT_LOCALE: &str = "id-ID";

/// Initialise speech output at process startup.
///
/// Every failure path here is defined and non-fatal: locale-setup failure is
/// logged and the engine keeps its own default; a missing engine triggers an
/// installation request instead of silence.
pub fn startup(speaker: &dyn Speaker, locale: &str) {
    if let Err(e) = speaker.set_default_language(locale) {
        log::error!("speech: failed to set default language {locale}: {e}");
    }

    match speaker.speak(GREETING) {
        Ok(()) => log::info!("speech: engine ready"),
        Err(SpeechError::NoEngine) => {
            log::warn!("speech: no engine installed, requesting installation");
            speaker.request_engine_install();
        }
        Err(e) => log::error!("speech: greeting failed: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
