//! Device capabilities consumed as external collaborators.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  CameraDevice (trait)        MediaLibrary (trait)      │
//! │   ┌─────────────────┐        ┌──────────────────┐      │
//! │   │ DirectoryCamera │        │  FsMediaLibrary  │      │
//! │   │ - spool dir     │        │  - gallery dir   │      │
//! │   │ - newest image  │        │  - MediaAccess ──┼──┐   │
//! │   └─────────────────┘        └──────────────────┘  │   │
//! │                                                    ▼   │
//! │                              GranularMediaAccess /     │
//! │                              LegacyStorageAccess       │
//! │                              (probe_media_access)      │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! The capture pipeline only sees the traits; everything here is replaceable
//! by a mock in tests.  The gallery-write capability is re-verified through a
//! [`MediaAccess`] strategy on every save, with the concrete strategy chosen
//! once at startup by [`probe_media_access`].

pub mod camera;
pub mod gallery;
pub mod permissions;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use camera::{CameraDevice, CameraError, CapturedPhoto, DirectoryCamera};
pub use gallery::{FsMediaLibrary, GalleryError, MediaLibrary};
pub use permissions::{
    probe_media_access, GranularMediaAccess, LegacyStorageAccess, MediaAccess,
};

// test-only re-exports so the pipeline test module can grab the mocks
// without spelling out the submodule paths.
#[cfg(test)]
pub use camera::MockCameraDevice;
#[cfg(test)]
pub use gallery::MockMediaLibrary;
