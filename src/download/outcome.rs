//! Terminal results of a download.

use std::path::PathBuf;

use super::DownloadError;

/// How a download ended.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// A new file was written.
    Saved {
        /// Written file
        path: PathBuf,
        /// Whether the local index accepted the new file
        indexed: bool,
    },
    /// A file with the same name was already present; nothing was written.
    AlreadySaved {
        /// Existing file
        path: PathBuf,
    },
    /// The photo could not be fetched or written.
    Failed(DownloadError),
}

impl DownloadOutcome {
    /// Whether the photo is on disk after this download.
    #[must_use]
    pub fn is_on_disk(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// One-line notification for the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Saved {
                path,
                indexed: true,
            } => format!("Saved to {}", path.display()),
            Self::Saved {
                path,
                indexed: false,
            } => format!(
                "Saved to {}, but adding it to Downloads failed",
                path.display()
            ),
            Self::AlreadySaved { path } => {
                format!("The file already exists in:\n{}", path.display())
            }
            Self::Failed(e) => format!("Download failed: {e}"),
        }
    }
}

/// Which display item the caller should refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// Refresh the item showing `photo_id` at `position`.
    Item {
        photo_id: String,
        position: usize,
    },
    /// The id was no longer marked in progress; refresh everything.
    Unexpected,
}

/// Delivered to the caller once a download has ended.
///
/// By the time this is delivered the id is no longer in progress.
#[derive(Debug)]
pub struct DownloadFinished {
    pub photo_id: String,
    pub outcome: DownloadOutcome,
    pub refresh: Refresh,
}
