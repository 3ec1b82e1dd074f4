//! Shared fakes and helpers for the integration tests.

use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, SystemTime};

use image::DynamicImage;
use wallstash::dispatch::MainLoop;
use wallstash::local::{DiskStorage, PhotoStorage, WriteOutcome};
use wallstash::model::{CachedPhoto, PhotoDetails, PhotoFormat, PhotoRecord, Resolution};
use wallstash::remote::{ListingCategory, NetworkError, RemotePhotoGateway};

pub const WAIT: Duration = Duration::from_secs(10);

/// Scriptable gateway: counts calls, can fail ids, can hold fetches until
/// released.
pub struct FakeGateway {
    full_calls: AtomicUsize,
    listing_calls: AtomicUsize,
    failing: Mutex<HashSet<String>>,
    extension: &'static str,
    gate: Option<(Mutex<bool>, Condvar)>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            full_calls: AtomicUsize::new(0),
            listing_calls: AtomicUsize::new(0),
            failing: Mutex::new(HashSet::new()),
            extension: "jpg",
            gate: None,
        }
    }

    /// Fetches block until [`open`](Self::open) is called.
    pub fn gated() -> Self {
        Self {
            gate: Some((Mutex::new(false), Condvar::new())),
            ..Self::new()
        }
    }

    pub fn with_extension(mut self, extension: &'static str) -> Self {
        self.extension = extension;
        self
    }

    pub fn fail(&self, photo_id: &str) {
        self.failing.lock().unwrap().insert(photo_id.to_string());
    }

    pub fn open(&self) {
        if let Some((ref open, ref cvar)) = self.gate {
            *open.lock().unwrap() = true;
            cvar.notify_all();
        }
    }

    pub fn full_calls(&self) -> usize {
        self.full_calls.load(Ordering::SeqCst)
    }

    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    fn wait_for_gate(&self) {
        if let Some((ref open, ref cvar)) = self.gate {
            let guard = open.lock().unwrap();
            let _guard = cvar
                .wait_timeout_while(guard, WAIT, |open| !*open)
                .unwrap();
        }
    }
}

impl RemotePhotoGateway for FakeGateway {
    fn fetch_listing(
        &self,
        category: &ListingCategory,
        page: u32,
    ) -> Result<Vec<PhotoRecord>, NetworkError> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate();
        Ok((0..3)
            .map(|i| {
                PhotoRecord::thumb(
                    format!("{}{}{}", category.kind(), page, i),
                    Some(Resolution::new(1920, 1080)),
                )
            })
            .collect())
    }

    fn fetch_full(&self, photo_id: &str) -> Result<CachedPhoto, NetworkError> {
        self.full_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate();

        let url = format!("https://w.example.test/full/{photo_id}.{}", self.extension);
        if self.failing.lock().unwrap().contains(photo_id) {
            return Err(NetworkError::Transport {
                url,
                message: "connection reset".to_string(),
            });
        }
        let record = PhotoRecord::full(
            photo_id,
            url,
            Some(Resolution::new(4, 3)),
            PhotoDetails::default(),
        )?;
        Ok(CachedPhoto::new(record, DynamicImage::new_rgb8(4, 3)))
    }
}

/// Disk storage whose writes always fail.
pub struct FailingStorage {
    inner: DiskStorage,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self {
            inner: DiskStorage::new(),
        }
    }
}

impl PhotoStorage for FailingStorage {
    fn list_directory(&self, dir: &Path) -> io::Result<Vec<String>> {
        self.inner.list_directory(dir)
    }

    fn write_image(
        &self,
        _dir: &Path,
        _file_name: &str,
        _image: &DynamicImage,
        _format: PhotoFormat,
        _quality: u8,
    ) -> io::Result<WriteOutcome> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only volume"))
    }

    fn read_dimensions(&self, path: &Path) -> Option<Resolution> {
        self.inner.read_dimensions(path)
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.inner.modified(path)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        self.inner.delete(path)
    }
}

/// Write a real image file of the given size.
pub fn write_image(dir: &Path, file_name: &str, width: u32, height: u32) {
    let format = PhotoFormat::from_url(file_name).unwrap();
    let outcome = DiskStorage::new()
        .write_image(dir, file_name, &DynamicImage::new_rgb8(width, height), format, 90)
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Created);
}

/// Pump `main_loop` until `items` holds `count` values.
pub fn wait_for<T>(main_loop: &MainLoop, items: &Arc<Mutex<Vec<T>>>, count: usize) {
    let done = main_loop.run_until(WAIT, || items.lock().unwrap().len() >= count);
    assert!(done, "timed out waiting for {} results", count);
}

/// Disk storage whose directory listing, once armed, reports that it started
/// and then blocks until released.
pub struct GatedStorage {
    inner: DiskStorage,
    armed: AtomicBool,
    entered: (Mutex<bool>, Condvar),
    released: (Mutex<bool>, Condvar),
}

impl GatedStorage {
    pub fn new() -> Self {
        Self {
            inner: DiskStorage::new(),
            armed: AtomicBool::new(false),
            entered: (Mutex::new(false), Condvar::new()),
            released: (Mutex::new(false), Condvar::new()),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Block until an armed listing is in progress.
    pub fn wait_entered(&self) {
        let (ref flag, ref cvar) = self.entered;
        let guard = flag.lock().unwrap();
        let (guard, _) = cvar.wait_timeout_while(guard, WAIT, |e| !*e).unwrap();
        assert!(*guard, "listing never started");
    }

    pub fn release(&self) {
        let (ref flag, ref cvar) = self.released;
        *flag.lock().unwrap() = true;
        cvar.notify_all();
    }
}

impl PhotoStorage for GatedStorage {
    fn list_directory(&self, dir: &Path) -> io::Result<Vec<String>> {
        let names = self.inner.list_directory(dir);
        if self.armed.load(Ordering::SeqCst) {
            {
                let (ref flag, ref cvar) = self.entered;
                *flag.lock().unwrap() = true;
                cvar.notify_all();
            }
            let (ref flag, ref cvar) = self.released;
            let guard = flag.lock().unwrap();
            let _guard = cvar.wait_timeout_while(guard, WAIT, |r| !*r).unwrap();
        }
        names
    }

    fn write_image(
        &self,
        dir: &Path,
        file_name: &str,
        image: &DynamicImage,
        format: PhotoFormat,
        quality: u8,
    ) -> io::Result<WriteOutcome> {
        self.inner.write_image(dir, file_name, image, format, quality)
    }

    fn read_dimensions(&self, path: &Path) -> Option<Resolution> {
        self.inner.read_dimensions(path)
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.inner.modified(path)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        self.inner.delete(path)
    }
}
