//! Listing page fetches, serialized per listing kind.
//!
//! Each [`ListingKind`] owns a single-worker queue, so pages of one kind are
//! fetched and delivered in request order while different kinds proceed in
//! parallel.

use std::sync::Arc;

use super::{ListingCategory, ListingKind, NetworkError, RemotePhotoGateway};
use crate::dispatch::{DispatchError, MainHandle, SerialQueue};
use crate::model::PhotoRecord;

/// Result delivered for one listing page.
pub type PageResult = Result<Vec<PhotoRecord>, NetworkError>;

/// Runs listing fetches on one serial queue per listing kind.
pub struct ListingService {
    gateway: Arc<dyn RemotePhotoGateway>,
    latest: SerialQueue,
    toplist: SerialQueue,
    random: SerialQueue,
    search: SerialQueue,
}

impl ListingService {
    /// Create the service and its four queues.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PoolBuild`] if a queue thread cannot be spawned.
    pub fn new(gateway: Arc<dyn RemotePhotoGateway>) -> Result<Self, DispatchError> {
        Ok(Self {
            gateway,
            latest: SerialQueue::new("listing-latest")?,
            toplist: SerialQueue::new("listing-toplist")?,
            random: SerialQueue::new("listing-random")?,
            search: SerialQueue::new("listing-search")?,
        })
    }

    fn queue(&self, kind: ListingKind) -> &SerialQueue {
        match kind {
            ListingKind::Latest => &self.latest,
            ListingKind::Toplist => &self.toplist,
            ListingKind::Random => &self.random,
            ListingKind::Search => &self.search,
        }
    }

    /// Fetch `page` (1-based; 0 is treated as 1) of `category` in the
    /// background and deliver the result to `on_page` on the caller's main
    /// loop.
    pub fn fetch_page<F>(
        &self,
        category: ListingCategory,
        page: u32,
        handle: &MainHandle,
        on_page: F,
    ) where
        F: FnOnce(PageResult) + Send + 'static,
    {
        let page = page.max(1);
        let gateway = Arc::clone(&self.gateway);
        let handle = handle.clone();
        let kind = category.kind();

        self.queue(kind).submit(move || {
            log::debug!("Fetching {} page {}", kind, page);
            let result = gateway.fetch_listing(&category, page);
            match &result {
                Ok(records) => log::debug!("{} page {}: {} records", kind, page, records.len()),
                Err(e) => log::warn!("{} page {} failed: {}", kind, page, e),
            }
            handle.post(move || on_page(result));
        });
    }
}

impl std::fmt::Debug for ListingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingService").finish_non_exhaustive()
    }
}
