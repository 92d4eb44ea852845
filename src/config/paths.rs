//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings blob):
//!   Windows: %APPDATA%\vsynth\
//!   macOS:   ~/Library/Application Support/vsynth/
//!   Linux:   ~/.config/vsynth/
//!
//! Data dir (camera spool):
//!   Windows: %LOCALAPPDATA%\vsynth\
//!   macOS:   ~/Library/Application Support/vsynth/
//!   Linux:   ~/.local/share/vsynth/
//!
//! Gallery dir (saved photos):
//!   {pictures dir}/vsynth/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for the settings blob.
    pub config_dir: PathBuf,
    /// Full path to `vsynth-config.json` — the single persisted record.
    pub settings_file: PathBuf,
    /// Directory the camera device watches for freshly captured images.
    pub camera_spool_dir: PathBuf,
    /// Directory saved photos are copied into (the "device gallery").
    pub gallery_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "vsynth";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let gallery_dir = dirs::picture_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("vsynth-config.json");
        let camera_spool_dir = data_dir.join("camera");

        Self {
            config_dir,
            settings_file,
            camera_spool_dir,
            gallery_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
