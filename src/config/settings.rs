//! The persisted settings record and its JSON-blob store.
//!
//! The entire configuration is one record — captioning backend host/port plus
//! the translation language pair — serialised as a single JSON object with
//! camelCase keys (`host`, `port`, `modelLanguage`, `voiceLanguage`) under one
//! fixed path.  There are no partial updates: `save` overwrites wholesale and
//! `load` reads wholesale.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppPaths;

// ---------------------------------------------------------------------------
// LanguageCode
// ---------------------------------------------------------------------------

/// A language from the closed set the app supports.
///
/// The same code drives both sides of the system: as one half of the
/// translation pair sent to MyMemory, and as the TTS locale of the spoken
/// output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageCode {
    /// Indonesian.
    #[serde(rename = "ID")]
    Id,
    /// English.
    #[serde(rename = "EN")]
    En,
}

impl LanguageCode {
    /// All selectable languages, in picker order.
    pub const ALL: [LanguageCode; 2] = [LanguageCode::Id, LanguageCode::En];

    /// The wire code used in the settings blob and the MyMemory langpair.
    pub fn code(&self) -> &'static str {
        match self {
            LanguageCode::Id => "ID",
            LanguageCode::En => "EN",
        }
    }

    /// The locale passed to the text-to-speech engine.
    pub fn locale(&self) -> &'static str {
        match self {
            LanguageCode::Id => "id-ID",
            LanguageCode::En => "en-US",
        }
    }

    /// Human-readable name for the settings pickers.
    pub fn label(&self) -> &'static str {
        match self {
            LanguageCode::Id => "Indonesian",
            LanguageCode::En => "English",
        }
    }

    /// Parse a stored wire code.  Returns `None` for anything outside the
    /// closed set, including the empty "not yet selected" value.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "ID" => Some(LanguageCode::Id),
            "EN" => Some(LanguageCode::En),
            _ => None,
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// SettingsError
// ---------------------------------------------------------------------------

/// Errors surfaced by the settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A required form field was left empty on submit.
    #[error("please fill out all fields — {0} is empty")]
    EmptyField(&'static str),

    /// A stored language code is outside the supported set.
    #[error("unsupported language code: {0}")]
    UnknownLanguage(String),

    /// The blob could not be written to disk.
    #[error("failed to save settings: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialised.
    #[error("failed to serialise settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// The single persisted configuration record.
///
/// All four fields are plain strings, matching the stored blob exactly; the
/// language fields hold wire codes from [`LanguageCode`] once selected.  The
/// capture pipeline refuses to start until [`validate`](Self::validate)
/// passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Captioning backend host (IP or hostname).
    pub host: String,
    /// Captioning backend port.
    pub port: String,
    /// Language the captioning model answers in (translation source).
    pub model_language: String,
    /// Language the caption is spoken in (translation target).
    pub voice_language: String,
}

impl Settings {
    /// Check that every field is non-empty.
    ///
    /// Returns the first offending field so the UI can name it.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.host.trim().is_empty() {
            return Err(SettingsError::EmptyField("host"));
        }
        if self.port.trim().is_empty() {
            return Err(SettingsError::EmptyField("port"));
        }
        if self.model_language.trim().is_empty() {
            return Err(SettingsError::EmptyField("model language"));
        }
        if self.voice_language.trim().is_empty() {
            return Err(SettingsError::EmptyField("voice language"));
        }
        Ok(())
    }

    /// `true` when the record is fully populated and both language codes are
    /// valid — the precondition for entering the capture flow.
    pub fn is_complete(&self) -> bool {
        self.validate().is_ok() && self.language_pair().is_ok()
    }

    /// The `(source, target)` translation pair.
    pub fn language_pair(&self) -> Result<(LanguageCode, LanguageCode), SettingsError> {
        let src = LanguageCode::parse(&self.model_language)
            .ok_or_else(|| SettingsError::UnknownLanguage(self.model_language.clone()))?;
        let dst = LanguageCode::parse(&self.voice_language)
            .ok_or_else(|| SettingsError::UnknownLanguage(self.voice_language.clone()))?;
        Ok((src, dst))
    }
}

// ---------------------------------------------------------------------------
// SettingsStore
// ---------------------------------------------------------------------------

/// Persistence for the settings blob.
///
/// # Persistence
///
/// ```rust,no_run
/// use vsynth::config::SettingsStore;
///
/// let store = SettingsStore::new();
///
/// // Load (returns empty defaults when the file is missing or unreadable)
/// let settings = store.load();
///
/// // Validate-and-save
/// // store.save(&settings).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at the platform-appropriate `vsynth-config.json` location.
    pub fn new() -> Self {
        Self {
            path: AppPaths::new().settings_file,
        }
    }

    /// Store at an explicit path (useful for tests).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path of the persisted blob.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record.
    ///
    /// A missing file is the first-run case and a malformed payload is
    /// treated as "no data" — both return empty defaults.  Parse failures
    /// are logged here and never propagate.
    pub fn load(&self) -> Settings {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Settings::default();
            }
            Err(e) => {
                log::warn!(
                    "settings: cannot read {} ({e}); using defaults",
                    self.path.display()
                );
                return Settings::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!(
                    "settings: malformed blob at {} ({e}); treating as no data",
                    self.path.display()
                );
                Settings::default()
            }
        }
    }

    /// Validate and persist `settings`, overwriting any prior value.
    ///
    /// Rejects records with any empty field before touching the disk, so a
    /// failed save leaves the stored blob unchanged.  The write is atomic:
    /// the blob is written to a temp file and renamed into place.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        settings.validate()?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;

        log::info!("settings: saved to {}", self.path.display());
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn valid_settings() -> Settings {
        Settings {
            host: "192.168.1.5".into(),
            port: "8000".into(),
            model_language: "ID".into(),
            voice_language: "EN".into(),
        }
    }

    // ---- validation ---

    #[test]
    fn valid_record_passes_validation() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn each_empty_field_is_rejected() {
        for field in 0..4 {
            let mut s = valid_settings();
            match field {
                0 => s.host.clear(),
                1 => s.port.clear(),
                2 => s.model_language.clear(),
                _ => s.voice_language.clear(),
            }
            assert!(
                matches!(s.validate(), Err(SettingsError::EmptyField(_))),
                "field {field} should be rejected"
            );
        }
    }

    #[test]
    fn whitespace_only_field_is_rejected() {
        let mut s = valid_settings();
        s.host = "   ".into();
        assert!(matches!(s.validate(), Err(SettingsError::EmptyField("host"))));
    }

    #[test]
    fn language_pair_resolves_codes() {
        let (src, dst) = valid_settings().language_pair().unwrap();
        assert_eq!(src, LanguageCode::Id);
        assert_eq!(dst, LanguageCode::En);
    }

    #[test]
    fn language_pair_rejects_unknown_code() {
        let mut s = valid_settings();
        s.model_language = "FR".into();
        assert!(matches!(
            s.language_pair(),
            Err(SettingsError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn default_record_is_incomplete() {
        assert!(!Settings::default().is_complete());
    }

    // ---- store round trip ---

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().expect("temp dir");
        let store = SettingsStore::at(dir.path().join("vsynth-config.json"));

        let original = valid_settings();
        store.save(&original).expect("save");

        assert_eq!(store.load(), original);
    }

    #[test]
    fn blob_uses_camel_case_keys() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("vsynth-config.json");
        let store = SettingsStore::at(&path);

        store.save(&valid_settings()).expect("save");
        let raw = std::fs::read_to_string(&path).expect("read blob");

        assert!(raw.contains("\"modelLanguage\""));
        assert!(raw.contains("\"voiceLanguage\""));
        assert!(raw.contains("\"host\""));
        assert!(raw.contains("\"port\""));
    }

    #[test]
    fn rejected_save_leaves_store_unchanged() {
        let dir = tempdir().expect("temp dir");
        let store = SettingsStore::at(dir.path().join("vsynth-config.json"));

        let original = valid_settings();
        store.save(&original).expect("save valid");

        let mut invalid = original.clone();
        invalid.port.clear();
        assert!(store.save(&invalid).is_err());

        // The previously stored record must survive intact.
        assert_eq!(store.load(), original);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let store = SettingsStore::at(dir.path().join("nonexistent.json"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn load_malformed_blob_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("vsynth-config.json");
        std::fs::write(&path, "{ not json at all").expect("write garbage");

        let store = SettingsStore::at(&path);
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn load_accepts_hand_written_blob() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("vsynth-config.json");
        std::fs::write(
            &path,
            r#"{"host":"10.0.0.2","port":"9001","modelLanguage":"EN","voiceLanguage":"ID"}"#,
        )
        .expect("write blob");

        let loaded = SettingsStore::at(&path).load();
        assert_eq!(loaded.host, "10.0.0.2");
        assert_eq!(loaded.port, "9001");
        assert_eq!(loaded.language_pair().unwrap(), (LanguageCode::En, LanguageCode::Id));
    }

    // ---- LanguageCode ---

    #[test]
    fn language_code_parse_round_trips() {
        for lang in LanguageCode::ALL {
            assert_eq!(LanguageCode::parse(lang.code()), Some(lang));
        }
    }

    #[test]
    fn language_code_parse_rejects_empty_and_unknown() {
        assert_eq!(LanguageCode::parse(""), None);
        assert_eq!(LanguageCode::parse("TH"), None);
        assert_eq!(LanguageCode::parse("id"), None);
    }

    #[test]
    fn locales_match_codes() {
        assert_eq!(LanguageCode::Id.locale(), "id-ID");
        assert_eq!(LanguageCode::En.locale(), "en-US");
    }
}
