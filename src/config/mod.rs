//! Configuration module for V-Synth.
//!
//! Provides `Settings` (the single persisted record), `LanguageCode`,
//! `SettingsStore` for JSON-blob persistence, and `AppPaths` for
//! cross-platform data directories.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{LanguageCode, Settings, SettingsError, SettingsStore};
