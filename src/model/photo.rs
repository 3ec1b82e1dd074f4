//! Photo records, formats and resolutions.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::ModelError;

const INFO_LINK: &str = "https://wallhaven.cc/w/";
const THUMB_LINK: &str = "https://th.wallhaven.cc/small/";
const TAG_LINK: &str = "https://wallhaven.cc/tag/";
const COLOR_LINK: &str = "https://wallhaven.cc/search?colors=";

/// Colors the site accepts as a search filter.
const SEARCHABLE_COLORS: [&str; 29] = [
    "#660000", "#990000", "#cc0000", "#cc3333", "#ea4c88", "#993399", "#663399", "#333399",
    "#0066cc", "#0099cc", "#66cccc", "#77cc33", "#669900", "#336600", "#666600", "#999900",
    "#cccc33", "#ffff00", "#ffcc33", "#ff9900", "#ff6600", "#cc6633", "#996633", "#663300",
    "#000000", "#999999", "#cccccc", "#ffffff", "#424153",
];

/// Compression format of a wallpaper file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoFormat {
    /// `.jpg`
    Jpeg,
    /// `.png`
    Png,
    /// `.webp`
    WebP,
}

impl PhotoFormat {
    /// File extension including the leading dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => ".jpg",
            Self::Png => ".png",
            Self::WebP => ".webp",
        }
    }

    /// Derive the format from the suffix of a URL or file name.
    ///
    /// Query strings and fragments are ignored; matching is case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnsupportedFormat`] for any other suffix.
    pub fn from_url(url: &str) -> Result<Self, ModelError> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let suffix = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match suffix.as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            _ => Err(ModelError::UnsupportedFormat(url.to_string())),
        }
    }

    /// Matching codec format in the `image` crate.
    #[must_use]
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::WebP => image::ImageFormat::WebP,
        }
    }
}

impl fmt::Display for PhotoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => write!(f, "jpeg"),
            Self::Png => write!(f, "png"),
            Self::WebP => write!(f, "webp"),
        }
    }
}

/// Pixel dimensions of a wallpaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Resolution {
    /// Create a resolution.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = ModelError;

    /// Parse listing labels such as `"1920 x 1080"` or `"1920x1080"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidResolution(s.to_string());
        let (width, height) = s
            .trim()
            .split_once(['x', 'X', '×'])
            .ok_or_else(invalid)?;
        let width = width.trim().parse().map_err(|_| invalid())?;
        let height = height.trim().parse().map_err(|_| invalid())?;
        Ok(Self { width, height })
    }
}

/// A tag attached to a wallpaper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Site tag id
    pub id: String,
    /// Display name
    pub name: String,
}

impl Tag {
    /// Create a tag.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Page listing every wallpaper with this tag.
    #[must_use]
    pub fn link(&self) -> String {
        format!("{TAG_LINK}{}", self.id)
    }
}

/// A dominant color, as a `#rrggbb` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoColor(String);

impl PhotoColor {
    /// Wrap a color value. The value is stored lowercase.
    #[must_use]
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into().to_ascii_lowercase())
    }

    /// The full `#rrggbb` value.
    #[must_use]
    pub fn hex(&self) -> &str {
        &self.0
    }

    /// The value without the leading `#`.
    #[must_use]
    pub fn number(&self) -> &str {
        self.0.strip_prefix('#').unwrap_or(&self.0)
    }

    /// Whether the site accepts this color as a search filter.
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        SEARCHABLE_COLORS.contains(&self.0.as_str())
    }

    /// `colors=rrggbb` query fragment.
    #[must_use]
    pub fn as_query(&self) -> String {
        format!("colors={}", self.number())
    }

    /// Search page for wallpapers with this dominant color.
    #[must_use]
    pub fn search_link(&self) -> String {
        format!("{COLOR_LINK}{}", self.number())
    }
}

/// Metadata only available after a full fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoDetails {
    pub uploader: String,
    pub category: String,
    /// Human readable file size as reported by the site
    pub file_size: String,
    pub views: u64,
    pub favorites: u64,
    pub tags: Vec<Tag>,
    pub colors: Vec<PhotoColor>,
}

/// Metadata describing one wallpaper.
///
/// A listing page yields records without [`details`](Self::details); a full
/// fetch fills them in. Records are not modified after construction, with the
/// single exception of [`retag_format`](Self::retag_format).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    id: String,
    resolution: Option<Resolution>,
    source_url: String,
    format: PhotoFormat,
    details: Option<PhotoDetails>,
}

impl PhotoRecord {
    /// Build a listing record. The source URL is the thumbnail link.
    #[must_use]
    pub fn thumb(id: impl Into<String>, resolution: Option<Resolution>) -> Self {
        let id = id.into();
        let source_url = thumb_link(&id);
        Self {
            id,
            resolution,
            source_url,
            format: PhotoFormat::Jpeg,
            details: None,
        }
    }

    /// Build a full record. The format is derived from `source_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnsupportedFormat`] if the URL suffix is not a
    /// known image format.
    pub fn full(
        id: impl Into<String>,
        source_url: impl Into<String>,
        resolution: Option<Resolution>,
        details: PhotoDetails,
    ) -> Result<Self, ModelError> {
        let source_url = source_url.into();
        let format = PhotoFormat::from_url(&source_url)?;
        Ok(Self {
            id: id.into(),
            resolution,
            source_url,
            format,
            details: Some(details),
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    #[must_use]
    pub fn format(&self) -> PhotoFormat {
        self.format
    }

    /// Extension for the saved file, e.g. `.png`.
    #[must_use]
    pub fn format_extension(&self) -> &'static str {
        self.format.extension()
    }

    #[must_use]
    pub fn details(&self) -> Option<&PhotoDetails> {
        self.details.as_ref()
    }

    /// Whether this record came from a full fetch.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.details.is_some()
    }

    /// File name the photo is saved under.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}{}", self.id, self.format.extension())
    }

    /// Page describing this wallpaper on the site.
    #[must_use]
    pub fn info_link(&self) -> String {
        format!("{INFO_LINK}{}", self.id)
    }

    /// Small preview image.
    #[must_use]
    pub fn thumb_link(&self) -> String {
        thumb_link(&self.id)
    }

    /// Re-tag the compression format before the photo is written again.
    ///
    /// This is the only mutation a record allows.
    pub fn retag_format(&mut self, format: PhotoFormat) {
        log::debug!("Re-tagging {} from {} to {}", self.id, self.format, format);
        self.format = format;
    }
}

fn thumb_link(id: &str) -> String {
    let prefix: String = id.chars().take(2).collect();
    format!("{THUMB_LINK}{prefix}/{id}.jpg")
}

/// A full record together with its decoded image.
#[derive(Debug, Clone)]
pub struct CachedPhoto {
    record: PhotoRecord,
    image: Arc<DynamicImage>,
}

impl CachedPhoto {
    /// Pair a record with its decoded pixels.
    #[must_use]
    pub fn new(record: PhotoRecord, image: DynamicImage) -> Self {
        Self {
            record,
            image: Arc::new(image),
        }
    }

    #[must_use]
    pub fn record(&self) -> &PhotoRecord {
        &self.record
    }

    #[must_use]
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.record.id()
    }
}
