//! Media library — persists captured photos outside the app.
//!
//! Mirrors the platform gallery contract: the write capability is
//! re-verified through the configured [`MediaAccess`] strategy on every
//! save, and a successful save is never rolled back by later pipeline
//! failures.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use super::camera::CapturedPhoto;
use super::permissions::MediaAccess;

// ---------------------------------------------------------------------------
// GalleryError
// ---------------------------------------------------------------------------

/// Errors that can surface while saving to the media library.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// The gallery-write capability was not granted.
    #[error("gallery write permission denied")]
    PermissionDenied,

    /// The copy into the gallery failed.
    #[error("gallery I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// MediaLibrary trait
// ---------------------------------------------------------------------------

/// Object-safe interface to the device media library.
pub trait MediaLibrary: Send + Sync {
    /// Persist `photo` and return where it landed.
    fn save(&self, photo: &CapturedPhoto) -> Result<PathBuf, GalleryError>;
}

// ---------------------------------------------------------------------------
// FsMediaLibrary
// ---------------------------------------------------------------------------

/// Filesystem gallery rooted at a pictures directory.
pub struct FsMediaLibrary {
    root: PathBuf,
    access: Box<dyn MediaAccess>,
}

impl FsMediaLibrary {
    /// Gallery at `root`, guarded by `access`.
    pub fn new(root: impl Into<PathBuf>, access: Box<dyn MediaAccess>) -> Self {
        Self {
            root: root.into(),
            access,
        }
    }

    /// The gallery root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Timestamped destination filename preserving the source extension.
    fn destination_for(&self, source: &Path) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);

        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");

        self.root.join(format!("photo-{millis}.{ext}"))
    }
}

impl MediaLibrary for FsMediaLibrary {
    fn save(&self, photo: &CapturedPhoto) -> Result<PathBuf, GalleryError> {
        if !self.access.ensure_granted(&self.root) {
            return Err(GalleryError::PermissionDenied);
        }

        let dest = self.destination_for(&photo.path);
        std::fs::copy(&photo.path, &dest)?;

        log::info!("gallery: photo saved to {}", dest.display());
        Ok(dest)
    }
}

// ---------------------------------------------------------------------------
// MockMediaLibrary  (test-only)
// ---------------------------------------------------------------------------

/// Scripted gallery double: either echoes the photo path back as the saved
/// location or fails with a fixed error.
#[cfg(test)]
pub struct MockMediaLibrary {
    pub deny: bool,
    pub saves: std::sync::Mutex<Vec<PathBuf>>,
}

#[cfg(test)]
impl MockMediaLibrary {
    pub fn granting() -> Self {
        Self {
            deny: false,
            saves: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn denying() -> Self {
        Self {
            deny: true,
            saves: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }
}

#[cfg(test)]
impl MediaLibrary for MockMediaLibrary {
    fn save(&self, photo: &CapturedPhoto) -> Result<PathBuf, GalleryError> {
        if self.deny {
            return Err(GalleryError::PermissionDenied);
        }
        self.saves.lock().unwrap().push(photo.path.clone());
        Ok(photo.path.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
