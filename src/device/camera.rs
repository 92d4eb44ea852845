//! Camera device trait and the spool-directory implementation.
//!
//! [`CameraDevice`] is the contract the capture pipeline programs against:
//! permission, availability, and a single-shot capture that yields a photo
//! file handle.
//!
//! [`DirectoryCamera`] is the desktop stand-in for a capture device: it
//! watches a spool directory and "captures" the most recently modified image
//! file found there.  Phones drop files into a camera directory; here the
//! user (or another tool) does.
//!
//! [`MockCameraDevice`] (under `#[cfg(test)]`) is a fully scripted double.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;

// ---------------------------------------------------------------------------
// CameraError
// ---------------------------------------------------------------------------

/// Errors that can arise from the camera subsystem.
#[derive(Debug, Error)]
pub enum CameraError {
    /// No usable capture device (or spool image) exists.
    #[error("no camera found")]
    NoDevice,

    /// The device exists but the capture itself failed.
    #[error("capture failed: {0}")]
    Capture(String),

    /// Filesystem error while reaching the device.
    #[error("camera I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// CapturedPhoto
// ---------------------------------------------------------------------------

/// Handle to a freshly captured photo — a path to the image file, exactly
/// what the platform capture API hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    /// Location of the captured image on disk.
    pub path: PathBuf,
}

// ---------------------------------------------------------------------------
// CameraDevice trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to a camera.
///
/// # Contract
///
/// - `has_permission` and `is_available` are re-evaluated every time the
///   capture screen is entered; neither result is cached by callers.
/// - `capture` is single-shot and may fail without leaving any state behind.
pub trait CameraDevice: Send + Sync {
    /// Whether the app is allowed to use the camera at all.
    fn has_permission(&self) -> bool;

    /// Whether a usable capture device currently exists.
    fn is_available(&self) -> bool;

    /// Take one photo and return its file handle.
    fn capture(&self) -> Result<CapturedPhoto, CameraError>;
}

// Compile-time assertion: Box<dyn CameraDevice> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn CameraDevice>) {}
};

// ---------------------------------------------------------------------------
// DirectoryCamera
// ---------------------------------------------------------------------------

/// Spool-directory camera.
///
/// Permission maps to the spool directory being listable; availability
/// additionally requires at least one recognisable image file in it.
#[derive(Debug, Clone)]
pub struct DirectoryCamera {
    spool_dir: PathBuf,
}

impl DirectoryCamera {
    /// Watch `spool_dir` for captured images.
    pub fn new(spool_dir: impl Into<PathBuf>) -> Self {
        Self {
            spool_dir: spool_dir.into(),
        }
    }

    /// The directory this camera watches.
    pub fn spool_dir(&self) -> &Path {
        &self.spool_dir
    }

    /// The most recently modified image file in the spool, if any.
    fn newest_image(&self) -> Result<Option<PathBuf>, std::io::Error> {
        let mut newest: Option<(SystemTime, PathBuf)> = None;

        for entry in std::fs::read_dir(&self.spool_dir)? {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() || !is_image_file(&path) {
                continue;
            }

            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);

            let replace = match &newest {
                Some((best, _)) => modified > *best,
                None => true,
            };
            if replace {
                newest = Some((modified, path));
            }
        }

        Ok(newest.map(|(_, path)| path))
    }
}

/// Recognise a path as an image by its extension, the way a gallery does.
fn is_image_file(path: &Path) -> bool {
    image::ImageFormat::from_path(path).is_ok()
}

impl CameraDevice for DirectoryCamera {
    fn has_permission(&self) -> bool {
        // Listable spool == usable camera. A missing directory is a
        // no-device condition, not a permission one.
        match std::fs::read_dir(&self.spool_dir) {
            Ok(_) => true,
            Err(e) => e.kind() != std::io::ErrorKind::PermissionDenied,
        }
    }

    fn is_available(&self) -> bool {
        matches!(self.newest_image(), Ok(Some(_)))
    }

    fn capture(&self) -> Result<CapturedPhoto, CameraError> {
        let path = self.newest_image()?.ok_or(CameraError::NoDevice)?;
        log::debug!("camera: captured {}", path.display());
        Ok(CapturedPhoto { path })
    }
}

// ---------------------------------------------------------------------------
// MockCameraDevice  (test-only)
// ---------------------------------------------------------------------------

/// A scripted camera double for pipeline tests.
#[cfg(test)]
pub struct MockCameraDevice {
    pub permission: bool,
    pub available: bool,
    pub result: Result<CapturedPhoto, &'static str>,
}

#[cfg(test)]
impl MockCameraDevice {
    /// A camera that always succeeds, yielding `path`.
    pub fn ok(path: impl Into<PathBuf>) -> Self {
        Self {
            permission: true,
            available: true,
            result: Ok(CapturedPhoto { path: path.into() }),
        }
    }

    /// A camera whose capture always fails with `message`.
    pub fn failing(message: &'static str) -> Self {
        Self {
            permission: true,
            available: true,
            result: Err(message),
        }
    }

    /// A camera the user has not granted access to.
    pub fn denied() -> Self {
        Self {
            permission: false,
            available: true,
            result: Err("permission denied"),
        }
    }

    /// No capture device present.
    pub fn absent() -> Self {
        Self {
            permission: true,
            available: false,
            result: Err("no device"),
        }
    }
}

#[cfg(test)]
impl CameraDevice for MockCameraDevice {
    fn has_permission(&self) -> bool {
        self.permission
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn capture(&self) -> Result<CapturedPhoto, CameraError> {
        match &self.result {
            Ok(photo) => Ok(photo.clone()),
            Err(msg) => Err(CameraError::Capture((*msg).to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
