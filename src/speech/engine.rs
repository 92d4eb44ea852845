//! Speech engine implementations.
//!
//! [`CommandSpeaker`] drives the platform speech command — `spd-say` on
//! Linux (speech-dispatcher), `say` on macOS, PowerShell's
//! `System.Speech` on Windows.  A missing binary is the desktop equivalent
//! of "no engine installed".
//!
//! [`MockSpeaker`] (under `#[cfg(test)]`) records utterances for assertions.

use std::process::{Command, Stdio};
use std::sync::Mutex;

use super::{SpeechError, Speaker};

// ---------------------------------------------------------------------------
// CommandSpeaker
// ---------------------------------------------------------------------------

#[cfg(target_os = "linux")]
const SPEECH_PROGRAM: &str = "spd-say";
#[cfg(target_os = "macos")]
const SPEECH_PROGRAM: &str = "say";
#[cfg(target_os = "windows")]
const SPEECH_PROGRAM: &str = "powershell";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const SPEECH_PROGRAM: &str = "spd-say";

/// Production speaker backed by the platform speech command.
pub struct CommandSpeaker {
    program: &'static str,
    locale: Mutex<Option<String>>,
}

impl CommandSpeaker {
    /// Speaker using the platform default speech command.
    pub fn new() -> Self {
        Self {
            program: SPEECH_PROGRAM,
            locale: Mutex::new(None),
        }
    }

    /// Arguments for one utterance of `text` in the current locale.
    fn utterance_args(&self, text: &str) -> Vec<String> {
        let locale = self.locale.lock().unwrap().clone();

        match self.program {
            "spd-say" => {
                // speech-dispatcher takes the bare language part of the
                // locale ("id-ID" → "id").
                let mut args = Vec::new();
                if let Some(locale) = locale {
                    let lang = locale.split('-').next().unwrap_or(&locale).to_string();
                    args.push("-l".to_string());
                    args.push(lang);
                }
                args.push(text.to_string());
                args
            }
            "say" => vec![text.to_string()],
            _ => {
                // PowerShell System.Speech one-liner; single quotes are
                // doubled to stay inside the literal.
                let escaped = text.replace('\'', "''");
                vec![
                    "-NoProfile".to_string(),
                    "-Command".to_string(),
                    format!(
                        "Add-Type -AssemblyName System.Speech; \
                         (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak('{escaped}')"
                    ),
                ]
            }
        }
    }
}

impl Default for CommandSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

impl Speaker for CommandSpeaker {
    fn set_default_language(&self, locale: &str) -> Result<(), SpeechError> {
        *self.locale.lock().unwrap() = Some(locale.to_string());
        Ok(())
    }

    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let args = self.utterance_args(text);

        // Fire and forget; playback outlives the call.
        match Command::new(self.program)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(_child) => {
                log::debug!("speech: speaking {} chars via {}", text.len(), self.program);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SpeechError::NoEngine),
            Err(e) => Err(SpeechError::Engine(e.to_string())),
        }
    }

    fn request_engine_install(&self) {
        // No installer intent exists on desktop; surface an explicit,
        // actionable hint instead of failing silently.
        let hint = match self.program {
            "spd-say" => "install speech-dispatcher (provides spd-say)",
            "say" => "the macOS `say` command ships with the OS; check PATH",
            _ => "enable Windows PowerShell and the System.Speech assembly",
        };
        log::warn!("speech: no engine available — {hint}");
    }
}

// ---------------------------------------------------------------------------
// MockSpeaker  (test-only)
// ---------------------------------------------------------------------------

/// Recording speaker double.
#[cfg(test)]
pub struct MockSpeaker {
    mode: MockMode,
    spoken: Mutex<Vec<String>>,
    locale: Mutex<Option<String>>,
    install_requested: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
enum MockMode {
    Working,
    NoEngine,
    Broken(&'static str),
    RejectLocale,
}

#[cfg(test)]
impl MockSpeaker {
    /// Engine that accepts everything.
    pub fn working() -> Self {
        Self::with_mode(MockMode::Working)
    }

    /// Engine that is not installed.
    pub fn without_engine() -> Self {
        Self::with_mode(MockMode::NoEngine)
    }

    /// Engine that fails every utterance with `message`.
    pub fn broken(message: &'static str) -> Self {
        Self::with_mode(MockMode::Broken(message))
    }

    /// Engine that refuses locale changes but speaks fine.
    pub fn rejecting_locale() -> Self {
        Self::with_mode(MockMode::RejectLocale)
    }

    fn with_mode(mode: MockMode) -> Self {
        Self {
            mode,
            spoken: Mutex::new(Vec::new()),
            locale: Mutex::new(None),
            install_requested: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Every utterance spoken so far, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    /// The most recently set locale.
    pub fn locale(&self) -> Option<String> {
        self.locale.lock().unwrap().clone()
    }

    /// Whether `request_engine_install` was called.
    pub fn install_requested(&self) -> bool {
        self.install_requested
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl Speaker for MockSpeaker {
    fn set_default_language(&self, locale: &str) -> Result<(), SpeechError> {
        if matches!(self.mode, MockMode::RejectLocale) {
            return Err(SpeechError::Engine("unsupported locale".into()));
        }
        *self.locale.lock().unwrap() = Some(locale.to_string());
        Ok(())
    }

    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        match self.mode {
            MockMode::NoEngine => Err(SpeechError::NoEngine),
            MockMode::Broken(message) => Err(SpeechError::Engine(message.into())),
            MockMode::Working | MockMode::RejectLocale => {
                self.spoken.lock().unwrap().push(text.to_string());
                Ok(())
            }
        }
    }

    fn request_engine_install(&self) {
        self.install_requested
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spd_say_args_carry_bare_language_code() {
        let speaker = CommandSpeaker {
            program: "spd-say",
            locale: Mutex::new(Some("id-ID".into())),
        };
        let args = speaker.utterance_args("halo");
        assert_eq!(args, vec!["-l", "id", "halo"]);
    }

    #[test]
    fn spd_say_without_locale_passes_text_only() {
        let speaker = CommandSpeaker {
            program: "spd-say",
            locale: Mutex::new(None),
        };
        assert_eq!(speaker.utterance_args("hello"), vec!["hello"]);
    }

    #[test]
    fn powershell_args_escape_single_quotes() {
        let speaker = CommandSpeaker {
            program: "powershell",
            locale: Mutex::new(None),
        };
        let args = speaker.utterance_args("it's a cat");
        assert!(args.last().unwrap().contains("it''s a cat"));
    }

    #[test]
    fn set_default_language_is_remembered() {
        let speaker = CommandSpeaker::new();
        speaker.set_default_language("en-US").unwrap();
        assert_eq!(speaker.locale.lock().unwrap().as_deref(), Some("en-US"));
    }

    #[test]
    fn mock_records_utterances_in_order() {
        let speaker = MockSpeaker::working();
        speaker.speak("one").unwrap();
        speaker.speak("two").unwrap();
        assert_eq!(speaker.spoken(), vec!["one", "two"]);
    }

    #[test]
    fn missing_engine_surfaces_no_engine() {
        let speaker = MockSpeaker::without_engine();
        assert!(matches!(speaker.speak("x"), Err(SpeechError::NoEngine)));
    }
}
