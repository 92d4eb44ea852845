//! Gallery-write capability checks.
//!
//! The original platform gates media-library writes behind two different
//! permission sets depending on OS generation: newer systems grant access
//! per media kind (images, videos), older ones grant one blanket storage
//! permission.  That branch is expressed here as a single [`MediaAccess`]
//! interface with two concrete strategies, selected once at startup by
//! [`probe_media_access`] — call sites never branch on platform generation.

use std::path::Path;

// ---------------------------------------------------------------------------
// MediaAccess trait
// ---------------------------------------------------------------------------

/// Capability check guarding writes under a media root.
///
/// `check` is a passive query; `request` may create directories or probe
/// files to obtain access.  [`ensure_granted`](Self::ensure_granted) is what
/// the gallery calls before every save.
pub trait MediaAccess: Send + Sync {
    /// Strategy name, for logs.
    fn name(&self) -> &'static str;

    /// Whether access is currently granted for `root`.
    fn check(&self, root: &Path) -> bool;

    /// Try to obtain access for `root`.
    fn request(&self, root: &Path) -> bool;

    /// Check first, request only when the check fails.
    fn ensure_granted(&self, root: &Path) -> bool {
        if self.check(root) {
            return true;
        }
        log::debug!("permissions: {} check failed, requesting", self.name());
        self.request(root)
    }
}

/// Probe a directory for writability by touching and removing a marker file.
fn dir_is_writable(dir: &Path) -> bool {
    let marker = dir.join(".vsynth-probe");
    match std::fs::write(&marker, b"") {
        Ok(()) => {
            let _ = std::fs::remove_file(&marker);
            true
        }
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// GranularMediaAccess
// ---------------------------------------------------------------------------

/// Per-media-kind access: images and videos are granted separately and both
/// must pass, mirroring the granular permission set of newer platforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct GranularMediaAccess;

impl GranularMediaAccess {
    const KINDS: [&'static str; 2] = ["images", "videos"];
}

impl MediaAccess for GranularMediaAccess {
    fn name(&self) -> &'static str {
        "granular"
    }

    fn check(&self, root: &Path) -> bool {
        Self::KINDS
            .iter()
            .all(|kind| dir_is_writable(&root.join(kind)))
    }

    fn request(&self, root: &Path) -> bool {
        for kind in Self::KINDS {
            if std::fs::create_dir_all(root.join(kind)).is_err() {
                return false;
            }
        }
        self.check(root)
    }
}

// ---------------------------------------------------------------------------
// LegacyStorageAccess
// ---------------------------------------------------------------------------

/// Blanket storage access: one writability check of the media root, the way
/// older platforms grant a single external-storage permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyStorageAccess;

impl MediaAccess for LegacyStorageAccess {
    fn name(&self) -> &'static str {
        "legacy-storage"
    }

    fn check(&self, root: &Path) -> bool {
        dir_is_writable(root)
    }

    fn request(&self, root: &Path) -> bool {
        if std::fs::create_dir_all(root).is_err() {
            return false;
        }
        self.check(root)
    }
}

// ---------------------------------------------------------------------------
// Runtime capability probe
// ---------------------------------------------------------------------------

/// Pick the access strategy for this system.
///
/// Systems that expose distinct per-kind media directories get the granular
/// strategy; everything else falls back to the blanket storage check.
pub fn probe_media_access() -> Box<dyn MediaAccess> {
    let has_kind_dirs = dirs::picture_dir().is_some() && dirs::video_dir().is_some();

    if has_kind_dirs {
        log::info!("permissions: using granular media access");
        Box::new(GranularMediaAccess)
    } else {
        log::info!("permissions: using legacy storage access");
        Box::new(LegacyStorageAccess)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
