//! Index of wallpapers already saved to the download directory.
//!
//! # Overview
//!
//! [`LocalPhotoIndex`] mirrors the download directory as of the last scan or
//! explicit mutation. It keeps two views of the same entries:
//!
//! - a map from photo id to entry, for O(1) membership checks
//! - a display list, newest first after a scan
//!
//! Both live behind one mutex, so every public method sees and leaves them
//! consistent. The index never watches the filesystem: whoever writes or
//! deletes a file calls [`add`](LocalPhotoIndex::add) or
//! [`remove`](LocalPhotoIndex::remove) to match.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wallstash::local::{storage::DiskStorage, LocalPhotoIndex};
//!
//! let index = LocalPhotoIndex::open("/home/me/Pictures/WallHaven Wallpapers", Arc::new(DiskStorage::new()))?;
//! for entry in index.list() {
//!     println!("{} {}", entry.photo_id(), entry.resolution_label());
//! }
//! # Ok::<(), wallstash::local::IndexError>(())
//! ```

pub mod entry;
pub mod storage;

use std::cmp::Reverse;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::dispatch::{DispatchError, MainHandle, SerialQueue};

pub use entry::{photo_id_from_file_name, LocalPhotoEntry};
pub use storage::{DiskStorage, PhotoStorage, WriteOutcome};

/// Errors that can occur while building the index.
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// The download directory could not be listed.
    #[error("Failed to read download directory {path}: {source}")]
    Io {
        /// Directory that was scanned
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The reload worker could not be started.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Ordering applied by [`LocalPhotoIndex::sort_by`]. All keys sort descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Most recently modified first
    #[default]
    Added,
    /// Widest first
    Width,
    /// Tallest first
    Height,
}

#[derive(Debug, Default)]
struct IndexState {
    by_id: HashMap<String, Arc<LocalPhotoEntry>>,
    ordered: Vec<Arc<LocalPhotoEntry>>,
}

impl IndexState {
    fn remove_arc(&mut self, entry: &Arc<LocalPhotoEntry>) {
        if let Some(pos) = self.ordered.iter().position(|e| Arc::ptr_eq(e, entry)) {
            self.ordered.remove(pos);
        }
    }
}

/// Thread-safe index of downloaded photos.
///
/// Built once with [`open`](Self::open) and shared as `Arc<LocalPhotoIndex>`.
pub struct LocalPhotoIndex {
    directory: PathBuf,
    storage: Arc<dyn PhotoStorage>,
    state: Mutex<IndexState>,
    reload_queue: SerialQueue,
}

impl LocalPhotoIndex {
    /// Scan `directory` and build the index.
    ///
    /// A missing directory yields an empty index; it is created on the first
    /// download.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] if the directory exists but cannot be read,
    /// or [`IndexError::Dispatch`] if the reload worker cannot be spawned.
    pub fn open(
        directory: impl Into<PathBuf>,
        storage: Arc<dyn PhotoStorage>,
    ) -> Result<Self, IndexError> {
        let directory = directory.into();
        let state = scan(&directory, storage.as_ref())?;
        log::debug!(
            "Indexed {} photos in {}",
            state.ordered.len(),
            directory.display()
        );

        Ok(Self {
            directory,
            storage,
            state: Mutex::new(state),
            reload_queue: SerialQueue::new("index-reload")?,
        })
    }

    fn lock(&self) -> MutexGuard<'_, IndexState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-scan the directory in the background, then run `on_loaded` on the
    /// caller's main loop.
    ///
    /// Reloads run one at a time in submission order. A failed scan keeps
    /// the previous contents; `on_loaded` runs either way.
    pub fn reload<F>(self: &Arc<Self>, handle: &MainHandle, on_loaded: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let index = Arc::clone(self);
        let handle = handle.clone();
        self.reload_queue.submit(move || {
            if let Err(e) = index.reload_now() {
                log::warn!("Keeping previous index contents: {}", e);
            }
            handle.post(on_loaded);
        });
    }

    /// Re-scan the directory on the current thread and replace the contents.
    ///
    /// The index lock is held for the whole scan, so an [`add`](Self::add) or
    /// [`remove`](Self::remove) issued meanwhile waits and lands on the fresh
    /// contents instead of being overwritten by them.
    ///
    /// # Returns
    ///
    /// The number of indexed photos.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] and leaves the index unchanged if the
    /// directory cannot be read.
    pub fn reload_now(&self) -> Result<usize, IndexError> {
        let mut state = self.lock();
        let fresh = scan(&self.directory, self.storage.as_ref())?;
        let count = fresh.ordered.len();
        *state = fresh;
        drop(state);
        log::debug!("Reloaded index: {} photos", count);
        Ok(count)
    }

    /// Whether a photo with this id is indexed.
    #[must_use]
    pub fn contains(&self, photo_id: &str) -> bool {
        self.lock().by_id.contains_key(photo_id)
    }

    /// Index a newly written file `{directory}/{photo_id}{format_extension}`.
    ///
    /// The entry goes to the front of the display list. The check, the
    /// header read and the insert form one critical section.
    ///
    /// # Returns
    ///
    /// `false` without changing anything if the id is already indexed.
    pub fn add(&self, photo_id: &str, format_extension: &str) -> bool {
        let mut state = self.lock();
        if state.by_id.contains_key(photo_id) {
            return false;
        }

        let path = self.directory.join(format!("{photo_id}{format_extension}"));
        let entry = Arc::new(LocalPhotoEntry::load(photo_id, path, self.storage.as_ref()));
        state.by_id.insert(photo_id.to_string(), Arc::clone(&entry));
        state.ordered.insert(0, entry);
        log::debug!("Indexed {}", photo_id);
        true
    }

    /// Remove a photo by id.
    ///
    /// # Returns
    ///
    /// `false` if the id was not indexed.
    pub fn remove(&self, photo_id: &str) -> bool {
        let mut state = self.lock();
        match state.by_id.remove(photo_id) {
            Some(entry) => {
                state.remove_arc(&entry);
                true
            }
            None => false,
        }
    }

    /// Remove a photo given an entry handle.
    pub fn remove_entry(&self, entry: &LocalPhotoEntry) -> bool {
        self.remove(entry.photo_id())
    }

    /// Remove a photo only if it sits at `index` in the display list.
    ///
    /// # Returns
    ///
    /// `false` without changing anything if `index` is out of bounds or the
    /// entry there is not the one indexed under `photo_id`.
    pub fn remove_at(&self, photo_id: &str, index: usize) -> bool {
        let mut state = self.lock();
        let matches = match (state.by_id.get(photo_id), state.ordered.get(index)) {
            (Some(mapped), Some(listed)) => Arc::ptr_eq(mapped, listed),
            _ => false,
        };
        if !matches {
            log::debug!(
                "Refusing to remove {} at position {}: list and map disagree",
                photo_id,
                index
            );
            return false;
        }

        state.by_id.remove(photo_id);
        state.ordered.remove(index);
        true
    }

    /// Entry-based twin of [`remove_at`](Self::remove_at).
    pub fn remove_entry_at(&self, entry: &LocalPhotoEntry, index: usize) -> bool {
        self.remove_at(entry.photo_id(), index)
    }

    /// Look up an entry by id.
    #[must_use]
    pub fn get(&self, photo_id: &str) -> Option<Arc<LocalPhotoEntry>> {
        self.lock().by_id.get(photo_id).cloned()
    }

    /// Entry at a display position.
    #[must_use]
    pub fn entry_at(&self, index: usize) -> Option<Arc<LocalPhotoEntry>> {
        self.lock().ordered.get(index).cloned()
    }

    /// Snapshot of the display list.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<LocalPhotoEntry>> {
        self.lock().ordered.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().ordered.is_empty()
    }

    /// The download directory this index mirrors.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Reorder the display list. Ties keep their current relative order.
    pub fn sort_by(&self, key: SortKey) {
        let mut state = self.lock();
        match key {
            SortKey::Added => state.ordered.sort_by_key(|e| Reverse(e.modified())),
            SortKey::Width => state.ordered.sort_by_key(|e| Reverse(e.width())),
            SortKey::Height => state.ordered.sort_by_key(|e| Reverse(e.height())),
        }
    }
}

impl std::fmt::Debug for LocalPhotoIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalPhotoIndex")
            .field("directory", &self.directory)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

fn scan(directory: &Path, storage: &dyn PhotoStorage) -> Result<IndexState, IndexError> {
    let names = match storage.list_directory(directory) {
        Ok(names) => names,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!(
                "Download directory {} does not exist yet",
                directory.display()
            );
            Vec::new()
        }
        Err(source) => {
            return Err(IndexError::Io {
                path: directory.to_path_buf(),
                source,
            })
        }
    };

    let mut state = IndexState::default();
    for name in names {
        let Some(photo_id) = photo_id_from_file_name(&name) else {
            log::debug!("Skipping {}: no photo id in file name", name);
            continue;
        };
        let entry = Arc::new(LocalPhotoEntry::load(
            photo_id,
            directory.join(&name),
            storage,
        ));
        if let Some(previous) = state.by_id.insert(photo_id.to_string(), entry) {
            log::debug!(
                "Duplicate photo id {}, replacing {}",
                photo_id,
                previous.path().display()
            );
        }
    }

    state.ordered = state.by_id.values().cloned().collect();
    state
        .ordered
        .sort_by(|a, b| b.modified().cmp(&a.modified()).then_with(|| a.photo_id().cmp(b.photo_id())));
    Ok(state)
}
