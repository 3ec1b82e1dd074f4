//! Filesystem access for the download directory.
//!
//! # Overview
//!
//! [`PhotoStorage`] is the only path through which the index and the
//! download coordinator touch the disk. [`DiskStorage`] is the real
//! implementation; tests substitute their own.
//!
//! Writes never overwrite: a file is created with `create_new`, and an
//! existing file is reported as [`WriteOutcome::AlreadyExists`]. If encoding
//! fails halfway, the partial file is removed.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageReader};

use crate::model::{PhotoFormat, Resolution};

/// Result of writing an image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new file was created and fully written.
    Created,
    /// A file with that name already existed; nothing was written.
    AlreadyExists,
}

/// Filesystem operations used by the local index and the downloader.
///
/// Implementations must be thread-safe; calls arrive from worker threads.
pub trait PhotoStorage: Send + Sync {
    /// Names of the regular files directly inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error, including `NotFound` for a missing
    /// directory.
    fn list_directory(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Encode `image` and write it to `dir/file_name`, creating `dir` if needed.
    ///
    /// `quality` (0-100) is a hint for lossy formats; lossless formats ignore it.
    ///
    /// # Errors
    ///
    /// Returns the I/O or encoding error. No partial file is left behind.
    fn write_image(
        &self,
        dir: &Path,
        file_name: &str,
        image: &DynamicImage,
        format: PhotoFormat,
        quality: u8,
    ) -> io::Result<WriteOutcome>;

    /// Image bounds read from the file header, without decoding pixels.
    fn read_dimensions(&self, path: &Path) -> Option<Resolution>;

    /// Last modification time of a file.
    fn modified(&self, path: &Path) -> Option<SystemTime>;

    /// Delete a file.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn delete(&self, path: &Path) -> io::Result<()>;
}

/// [`PhotoStorage`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskStorage;

impl DiskStorage {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PhotoStorage for DiskStorage {
    fn list_directory(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // Follows symlinks so linked wallpapers are indexed too.
            if !entry.path().is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => log::debug!("Skipping non UTF-8 file name: {:?}", raw),
            }
        }
        Ok(names)
    }

    fn write_image(
        &self,
        dir: &Path,
        file_name: &str,
        image: &DynamicImage,
        format: PhotoFormat,
        quality: u8,
    ) -> io::Result<WriteOutcome> {
        fs::create_dir_all(dir)?;
        let path = dir.join(file_name);

        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                log::debug!("Not overwriting existing file {}", path.display());
                return Ok(WriteOutcome::AlreadyExists);
            }
            Err(e) => return Err(e),
        };

        let mut writer = BufWriter::new(file);
        let result = encode(&mut writer, image, format, quality).and_then(|()| writer.flush());
        if let Err(e) = result {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(&path) {
                log::warn!(
                    "Failed to remove partial file {}: {}",
                    path.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        log::debug!("Wrote {}", path.display());
        Ok(WriteOutcome::Created)
    }

    fn read_dimensions(&self, path: &Path) -> Option<Resolution> {
        let reader = ImageReader::open(path).ok()?.with_guessed_format().ok()?;
        match reader.into_dimensions() {
            Ok((width, height)) => Some(Resolution::new(width, height)),
            Err(e) => {
                log::debug!("Cannot read image header of {}: {}", path.display(), e);
                None
            }
        }
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

fn encode<W: Write>(
    writer: &mut W,
    image: &DynamicImage,
    format: PhotoFormat,
    quality: u8,
) -> io::Result<()> {
    let result = match format {
        PhotoFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)
        }
        PhotoFormat::Png => image.write_with_encoder(PngEncoder::new(writer)),
        PhotoFormat::WebP => {
            let encoder = WebPEncoder::new_lossless(writer);
            DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)
        }
    };
    result.map_err(io::Error::other)
}
