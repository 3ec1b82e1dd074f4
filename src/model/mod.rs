//! Data model for wallpapers.
//!
//! # Architecture
//!
//! * [`photo`]: [`PhotoRecord`], the single record type for listing and full
//!   fetches, plus [`CachedPhoto`] which pairs a record with decoded pixels.
//! * [`query`]: listing filters (category, purity, sorting, ...).

pub mod photo;
pub mod query;

pub use photo::{CachedPhoto, PhotoColor, PhotoDetails, PhotoFormat, PhotoRecord, Resolution, Tag};
pub use query::{Category, Order, Purity, SearchQuery, Sorting, TopRange};

/// Errors raised while building model values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The URL or file name does not end in a supported image suffix.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// A resolution label could not be parsed.
    #[error("Invalid resolution: '{0}'")]
    InvalidResolution(String),

    /// A multi-select filter was combined from an empty set.
    #[error("At least one {0} option must be selected")]
    EmptySelection(&'static str),
}
