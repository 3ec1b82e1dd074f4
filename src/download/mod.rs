//! De-duplicating photo downloader.
//!
//! # Overview
//!
//! [`DownloadCoordinator`] fetches a photo (from the cache, or the remote
//! gateway on a miss), writes it to the download directory, updates the local
//! index and reports the outcome on the caller's main loop.
//!
//! At most one download per photo id is in flight. A second request for the
//! same id is rejected with [`DownloadError::AlreadyInProgress`] until the
//! first one's completion has been delivered.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use std::time::Duration;
//! # use wallstash::dispatch::MainLoop;
//! # use wallstash::download::{DownloadConfig, DownloadCoordinator};
//! # fn demo(coordinator: Arc<DownloadCoordinator>) {
//! let main_loop = MainLoop::new();
//! coordinator
//!     .start_download("94x38z", 0, &main_loop.handle(), |finished| {
//!         println!("{}", finished.outcome.message());
//!     })
//!     .ok();
//! main_loop.run_until(Duration::from_secs(30), || !coordinator.is_downloading("94x38z"));
//! # }
//! ```

mod outcome;

use std::any::Any;
use std::collections::HashSet;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rayon::ThreadPool;

use crate::cache::{PhotoCache, DEFAULT_CACHE_CAPACITY};
use crate::dispatch::{worker_pool, DispatchError, MainHandle};
use crate::local::{LocalPhotoIndex, PhotoStorage, WriteOutcome};
use crate::model::CachedPhoto;
use crate::remote::{NetworkError, RemotePhotoGateway};

pub use outcome::{DownloadFinished, DownloadOutcome, Refresh};

/// Highest encoder quality; the default for saved files.
pub const MAX_QUALITY: u8 = 100;

/// Default number of download worker threads.
pub const DEFAULT_WORKERS: usize = 4;

/// Errors produced by the downloader.
#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    /// The same photo is already being downloaded.
    #[error("{0} is already being downloaded")]
    AlreadyInProgress(String),

    /// The photo could not be fetched.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The photo could not be written.
    #[error("Failed to write {path}: {source}")]
    Io {
        /// Target file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The gateway or storage panicked while handling the photo.
    #[error("Worker panicked: {0}")]
    Panicked(String),
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Downloader settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Encoder quality for lossy formats (0-100)
    pub save_quality: u8,
    /// Worker threads for fetch-and-save jobs
    pub workers: usize,
    /// Capacity of the in-memory photo cache
    pub cache_capacity: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            save_quality: MAX_QUALITY,
            workers: DEFAULT_WORKERS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl DownloadConfig {
    #[must_use]
    pub fn with_save_quality(mut self, quality: u8) -> Self {
        self.save_quality = quality.min(MAX_QUALITY);
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

/// State shared between the coordinator and its worker jobs.
struct Shared {
    cache: Arc<PhotoCache>,
    in_progress: Mutex<HashSet<String>>,
    index: Arc<LocalPhotoIndex>,
    gateway: Arc<dyn RemotePhotoGateway>,
    storage: Arc<dyn PhotoStorage>,
    save_quality: u8,
}

impl Shared {
    fn in_progress(&self) -> MutexGuard<'_, HashSet<String>> {
        self.in_progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached photo, or a fresh fetch that is then cached.
    fn resolve(&self, photo_id: &str) -> Result<CachedPhoto, NetworkError> {
        if let Some(photo) = self.cache.get(photo_id) {
            return Ok(photo);
        }
        let photo = self.gateway.fetch_full(photo_id)?;
        self.cache.insert(photo.clone());
        Ok(photo)
    }

    fn download(&self, photo_id: &str) -> DownloadOutcome {
        let photo = match self.resolve(photo_id) {
            Ok(photo) => photo,
            Err(e) => {
                log::warn!("Fetching {} failed: {}", photo_id, e);
                return DownloadOutcome::Failed(e.into());
            }
        };

        let record = photo.record();
        let extension = record.format_extension();
        let file_name = format!("{photo_id}{extension}");
        let directory = self.index.directory();
        let path = directory.join(&file_name);

        match self.storage.write_image(
            directory,
            &file_name,
            photo.image(),
            record.format(),
            self.save_quality,
        ) {
            Ok(WriteOutcome::Created) => {
                let indexed = self.index.add(photo_id, extension);
                if !indexed {
                    log::warn!("Saved {} but the index already had it", photo_id);
                }
                DownloadOutcome::Saved { path, indexed }
            }
            Ok(WriteOutcome::AlreadyExists) => DownloadOutcome::AlreadySaved { path },
            Err(source) => {
                log::warn!("Writing {} failed: {}", path.display(), source);
                DownloadOutcome::Failed(DownloadError::Io { path, source })
            }
        }
    }
}

/// Fetches, saves and indexes photos, one in-flight download per id.
pub struct DownloadCoordinator {
    shared: Arc<Shared>,
    pool: ThreadPool,
}

impl DownloadCoordinator {
    /// Create a coordinator that saves into `index`'s directory.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PoolBuild`] if the worker pool cannot be built.
    pub fn new(
        config: DownloadConfig,
        index: Arc<LocalPhotoIndex>,
        gateway: Arc<dyn RemotePhotoGateway>,
        storage: Arc<dyn PhotoStorage>,
    ) -> Result<Self, DispatchError> {
        let cache = Arc::new(PhotoCache::new(config.cache_capacity));
        Self::with_cache(config, cache, index, gateway, storage)
    }

    /// Like [`new`](Self::new), sharing an existing photo cache.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PoolBuild`] if the worker pool cannot be built.
    pub fn with_cache(
        config: DownloadConfig,
        cache: Arc<PhotoCache>,
        index: Arc<LocalPhotoIndex>,
        gateway: Arc<dyn RemotePhotoGateway>,
        storage: Arc<dyn PhotoStorage>,
    ) -> Result<Self, DispatchError> {
        Ok(Self {
            shared: Arc::new(Shared {
                cache,
                in_progress: Mutex::new(HashSet::new()),
                index,
                gateway,
                storage,
                save_quality: config.save_quality.min(MAX_QUALITY),
            }),
            pool: worker_pool("download", config.workers)?,
        })
    }

    /// Download `photo_id` in the background.
    ///
    /// `position` is the caller's display position for the photo; it comes
    /// back in [`Refresh::Item`]. `on_finished` runs on the caller's main
    /// loop after the id has been cleared from the in-progress set.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::AlreadyInProgress`] immediately if the id is
    /// already being downloaded. `on_finished` is not called in that case.
    pub fn start_download<F>(
        &self,
        photo_id: &str,
        position: usize,
        handle: &MainHandle,
        on_finished: F,
    ) -> Result<(), DownloadError>
    where
        F: FnOnce(DownloadFinished) + Send + 'static,
    {
        if !self.shared.in_progress().insert(photo_id.to_string()) {
            log::debug!("Ignoring duplicate download request for {}", photo_id);
            return Err(DownloadError::AlreadyInProgress(photo_id.to_string()));
        }

        let shared = Arc::clone(&self.shared);
        let handle = handle.clone();
        let photo_id = photo_id.to_string();

        self.pool.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| shared.download(&photo_id)))
                .unwrap_or_else(|payload| {
                    let message = panic_message(payload.as_ref());
                    log::error!("Download of {} panicked: {}", photo_id, message);
                    DownloadOutcome::Failed(DownloadError::Panicked(message))
                });
            handle.post(move || {
                let refresh = if shared.in_progress().remove(&photo_id) {
                    Refresh::Item {
                        photo_id: photo_id.clone(),
                        position,
                    }
                } else {
                    log::warn!("{} finished but was not marked in progress", photo_id);
                    Refresh::Unexpected
                };
                on_finished(DownloadFinished {
                    photo_id,
                    outcome,
                    refresh,
                });
            });
        });
        Ok(())
    }

    /// Whether `photo_id` is currently being downloaded.
    #[must_use]
    pub fn is_downloading(&self, photo_id: &str) -> bool {
        self.shared.in_progress().contains(photo_id)
    }

    /// Number of downloads in flight.
    #[must_use]
    pub fn active_downloads(&self) -> usize {
        self.shared.in_progress().len()
    }

    /// Resolve a full photo (cache first, then network) without saving it,
    /// and deliver it on the caller's main loop.
    pub fn load_photo<F>(&self, photo_id: &str, handle: &MainHandle, on_loaded: F)
    where
        F: FnOnce(Result<CachedPhoto, DownloadError>) + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let handle = handle.clone();
        let photo_id = photo_id.to_string();

        self.pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| shared.resolve(&photo_id)))
                .map_err(|payload| DownloadError::Panicked(panic_message(payload.as_ref())))
                .and_then(|r| r.map_err(DownloadError::from));
            handle.post(move || on_loaded(result));
        });
    }

    /// Peek at the cache without touching the network.
    #[must_use]
    pub fn cached(&self, photo_id: &str) -> Option<CachedPhoto> {
        self.shared.cache.get(photo_id)
    }

    /// The shared photo cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<PhotoCache> {
        &self.shared.cache
    }

    /// The local index downloads are added to.
    #[must_use]
    pub fn index(&self) -> &Arc<LocalPhotoIndex> {
        &self.shared.index
    }
}

impl std::fmt::Debug for DownloadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadCoordinator")
            .field("workers", &self.pool.current_num_threads())
            .field("active", &self.active_downloads())
            .finish_non_exhaustive()
    }
}
