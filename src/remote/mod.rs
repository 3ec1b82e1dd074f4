//! Access to the remote wallpaper site.
//!
//! # Architecture
//!
//! - [`RemotePhotoGateway`]: the network collaborator used by the downloader
//!   and the listing service. All calls block; callers run them on worker
//!   threads.
//! - [`listing`]: serial per-kind listing fetches.
//! - `wallhaven`: HTTP implementation over the site's JSON API (feature `http`).

pub mod listing;
#[cfg(feature = "http")]
pub mod wallhaven;

use std::fmt;

use crate::model::{CachedPhoto, ModelError, PhotoRecord, SearchQuery, Sorting};

pub use listing::ListingService;
#[cfg(feature = "http")]
pub use wallhaven::WallhavenGateway;

/// Errors reported by a [`RemotePhotoGateway`].
///
/// Messages are captured as text so the error can be cloned and moved
/// between threads freely.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("Request to {url} failed: {message}")]
    Transport {
        /// Requested URL
        url: String,
        /// Description of the failure
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from {url}: {message}")]
    Parse {
        /// Requested URL
        url: String,
        /// Parser message
        message: String,
    },

    /// The image bytes could not be decoded.
    #[error("Cannot decode image {url}: {message}")]
    Decode {
        /// Image URL
        url: String,
        /// Codec message
        message: String,
    },

    /// The record refers to something this crate cannot handle.
    #[error(transparent)]
    Unsupported(#[from] ModelError),
}

/// Listing kinds. Each kind gets its own serial queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingKind {
    Latest,
    Toplist,
    Random,
    Search,
}

impl ListingKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Toplist => "toplist",
            Self::Random => "random",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which listing page to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingCategory {
    /// Newest uploads
    Latest,
    /// Most favorited
    Toplist,
    /// Random selection
    Random,
    /// Custom filters
    Search(SearchQuery),
}

impl ListingCategory {
    #[must_use]
    pub fn kind(&self) -> ListingKind {
        match self {
            Self::Latest => ListingKind::Latest,
            Self::Toplist => ListingKind::Toplist,
            Self::Random => ListingKind::Random,
            Self::Search(_) => ListingKind::Search,
        }
    }

    /// Filters sent to the site for this listing.
    #[must_use]
    pub fn query(&self) -> SearchQuery {
        match self {
            Self::Latest => SearchQuery::sorted(Sorting::DateAdded),
            Self::Toplist => SearchQuery::sorted(Sorting::Toplist),
            Self::Random => SearchQuery::sorted(Sorting::Random),
            Self::Search(query) => query.clone(),
        }
    }
}

/// Network collaborator: listing pages and full photo fetches.
///
/// Implementations must be thread-safe. Every method blocks until the
/// request finishes.
pub trait RemotePhotoGateway: Send + Sync {
    /// Fetch one page (1-based) of listing records.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] describing the failed request.
    fn fetch_listing(
        &self,
        category: &ListingCategory,
        page: u32,
    ) -> Result<Vec<PhotoRecord>, NetworkError>;

    /// Fetch the full record and decoded image for `photo_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] describing the failed request or decode.
    fn fetch_full(&self, photo_id: &str) -> Result<CachedPhoto, NetworkError>;
}
