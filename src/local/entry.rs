//! A single downloaded wallpaper on disk.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::storage::PhotoStorage;
use crate::model::Resolution;

/// Extract the photo id from a file name: everything before the first `.`.
///
/// Returns `None` for names without a dot or with an empty id
/// (e.g. `.hidden`).
#[must_use]
pub fn photo_id_from_file_name(name: &str) -> Option<&str> {
    match name.split_once('.') {
        Some((id, _)) if !id.is_empty() => Some(id),
        _ => None,
    }
}

/// A photo file in the download directory.
///
/// Bounds are read once from the file header and the modification time is
/// captured when the entry is built; neither is refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPhotoEntry {
    photo_id: String,
    path: PathBuf,
    resolution: Option<Resolution>,
    modified: SystemTime,
}

impl LocalPhotoEntry {
    /// Create an entry from already known values.
    #[must_use]
    pub fn new(
        photo_id: impl Into<String>,
        path: impl Into<PathBuf>,
        resolution: Option<Resolution>,
        modified: SystemTime,
    ) -> Self {
        Self {
            photo_id: photo_id.into(),
            path: path.into(),
            resolution,
            modified,
        }
    }

    /// Build an entry by reading the file header and metadata through `storage`.
    ///
    /// An unreadable header leaves the resolution empty; a missing mtime
    /// falls back to the Unix epoch so the entry sorts last.
    #[must_use]
    pub fn load(photo_id: impl Into<String>, path: PathBuf, storage: &dyn PhotoStorage) -> Self {
        let resolution = storage.read_dimensions(&path);
        let modified = storage.modified(&path).unwrap_or(SystemTime::UNIX_EPOCH);
        Self::new(photo_id, path, resolution, modified)
    }

    #[must_use]
    pub fn photo_id(&self) -> &str {
        &self.photo_id
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    #[must_use]
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Width in pixels, 0 when unknown.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.resolution.map_or(0, |r| r.width)
    }

    /// Height in pixels, 0 when unknown.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.resolution.map_or(0, |r| r.height)
    }

    /// Display label such as `"1920 x 1080"`, or `"unknown"`.
    #[must_use]
    pub fn resolution_label(&self) -> String {
        self.resolution
            .map_or_else(|| "unknown".to_string(), |r| r.to_string())
    }
}
