use async_trait::async_trait;
use serde_json::Value;

use crate::error::ScoutError;
use crate::models::Item;

/// Common trait for listing-site scrapers
/// This allows easy addition of new sources in the future
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch a listing search page and return its normalized items,
    /// commercial entries before private ones, each in feed order.
    async fn fetch_listing(&self, url: &str) -> Result<Vec<Item>, ScoutError>;

    /// Best-effort fetch of an item's detail-page data fragment. Returns
    /// `None` on any failure; never fails the enclosing run.
    async fn fetch_item_details(&self, item_id: &str) -> Option<Value>;

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str;
}
