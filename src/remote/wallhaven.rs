//! HTTP gateway over the wallpaper site's JSON API.
//!
//! Listings come from `GET {base}/search`, full records from
//! `GET {base}/w/{id}`. The full image is then downloaded from the record's
//! `path` and decoded in memory.

use std::time::Duration;

use bytesize::ByteSize;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;

use super::{ListingCategory, NetworkError, RemotePhotoGateway};
use crate::model::{CachedPhoto, PhotoColor, PhotoDetails, PhotoRecord, Resolution, Tag};

/// Default API root.
pub const DEFAULT_API_BASE: &str = "https://wallhaven.cc/api/v1";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Vec<ListingItem>,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    id: String,
    dimension_x: Option<u32>,
    dimension_y: Option<u32>,
    resolution: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    data: InfoItem,
}

#[derive(Debug, Deserialize)]
struct InfoItem {
    id: String,
    path: String,
    dimension_x: Option<u32>,
    dimension_y: Option<u32>,
    resolution: Option<String>,
    uploader: Option<Uploader>,
    #[serde(default)]
    category: String,
    #[serde(default)]
    file_size: u64,
    #[serde(default)]
    views: u64,
    #[serde(default)]
    favorites: u64,
    #[serde(default)]
    tags: Vec<ApiTag>,
    #[serde(default)]
    colors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Uploader {
    username: String,
}

#[derive(Debug, Deserialize)]
struct ApiTag {
    id: u64,
    name: String,
}

fn resolution_of(
    x: Option<u32>,
    y: Option<u32>,
    label: Option<&str>,
) -> Option<Resolution> {
    match (x, y) {
        (Some(width), Some(height)) => Some(Resolution::new(width, height)),
        _ => label.and_then(|l| l.parse().ok()),
    }
}

/// Parse a `/search` response body into listing records.
pub(crate) fn parse_listing(body: &str) -> Result<Vec<PhotoRecord>, serde_json::Error> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .data
        .into_iter()
        .map(|item| {
            let resolution =
                resolution_of(item.dimension_x, item.dimension_y, item.resolution.as_deref());
            PhotoRecord::thumb(item.id, resolution)
        })
        .collect())
}

/// Parse a `/w/{id}` response body into a full record.
pub(crate) fn parse_full(body: &str, url: &str) -> Result<PhotoRecord, NetworkError> {
    let response: InfoResponse = serde_json::from_str(body).map_err(|e| NetworkError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let item = response.data;

    let details = PhotoDetails {
        uploader: item.uploader.map(|u| u.username).unwrap_or_default(),
        category: item.category,
        file_size: ByteSize::b(item.file_size).to_string(),
        views: item.views,
        favorites: item.favorites,
        tags: item
            .tags
            .into_iter()
            .map(|t| Tag::new(t.id.to_string(), t.name))
            .collect(),
        colors: item.colors.into_iter().map(PhotoColor::new).collect(),
    };
    let resolution = resolution_of(item.dimension_x, item.dimension_y, item.resolution.as_deref());

    Ok(PhotoRecord::full(item.id, item.path, resolution, details)?)
}

/// [`RemotePhotoGateway`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct WallhavenGateway {
    client: Client,
    base_url: String,
}

impl WallhavenGateway {
    /// Create a gateway for `base_url` (e.g. [`DEFAULT_API_BASE`]).
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, NetworkError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wallstash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetworkError::Transport {
                url: base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { client, base_url })
    }

    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response, NetworkError> {
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| NetworkError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, NetworkError> {
        self.get(url, query)?
            .text()
            .map_err(|e| NetworkError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}

impl RemotePhotoGateway for WallhavenGateway {
    fn fetch_listing(
        &self,
        category: &ListingCategory,
        page: u32,
    ) -> Result<Vec<PhotoRecord>, NetworkError> {
        let url = format!("{}/search", self.base_url);
        let mut query = category.query().params();
        query.push(("page", page.max(1).to_string()));

        let body = self.get_text(&url, &query)?;
        parse_listing(&body).map_err(|e| NetworkError::Parse {
            url,
            message: e.to_string(),
        })
    }

    fn fetch_full(&self, photo_id: &str) -> Result<CachedPhoto, NetworkError> {
        let url = format!("{}/w/{}", self.base_url, photo_id);
        let body = self.get_text(&url, &[])?;
        let record = parse_full(&body, &url)?;

        let image_url = record.source_url().to_string();
        let bytes = self
            .get(&image_url, &[])?
            .bytes()
            .map_err(|e| NetworkError::Transport {
                url: image_url.clone(),
                message: e.to_string(),
            })?;
        let image = image::load_from_memory_with_format(&bytes, record.format().image_format())
            .or_else(|_| image::load_from_memory(&bytes))
            .map_err(|e| NetworkError::Decode {
                url: image_url,
                message: e.to_string(),
            })?;

        log::debug!(
            "Fetched {} ({}x{})",
            photo_id,
            image.width(),
            image.height()
        );
        Ok(CachedPhoto::new(record, image))
    }
}
