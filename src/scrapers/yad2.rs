use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ScoutError;
use crate::models::Item;
use crate::scrapers::detail::fetch_item_details;
use crate::scrapers::feed::parse_listing;
use crate::scrapers::normalize::{normalize, ITEM_PAGE_BASE};
use crate::scrapers::page_data::{ensure_not_blocked, extract_page_data};
use crate::scrapers::traits::ListingSource;

/// Fixed desktop-browser user agent; the site serves the challenge page to
/// anything that looks like a bot client.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Yad2 scraper implementation
pub struct Yad2Scraper {
    client: Client,
    item_page_base: String,
}

impl Yad2Scraper {
    /// Create a new Yad2 scraper with its own HTTP client.
    pub fn new() -> Result<Self, ScoutError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            item_page_base: ITEM_PAGE_BASE.to_string(),
        }
    }

    /// Point item detail fetches at a different base URL. Used by tests to
    /// target a mock server.
    pub fn with_item_page_base(mut self, base: impl Into<String>) -> Self {
        self.item_page_base = base.into();
        self
    }

    async fn fetch_html(&self, url: &str) -> Result<String, ScoutError> {
        debug!("Fetching URL: {}", url);
        let response = self.client.get(url).send().await?;
        let html = response.text().await?;
        debug!("Downloaded {} bytes of HTML", html.len());
        Ok(html)
    }
}

/// Parse a listing page into normalized items. Fails on the bot challenge
/// page before any extraction is attempted.
fn parse_listing_html(html: &str) -> Result<Vec<Item>, ScoutError> {
    let document = Html::parse_document(html);
    ensure_not_blocked(&document)?;
    let data = extract_page_data(&document)?;
    let records = parse_listing(&data)?;
    Ok(records.iter().map(normalize).collect())
}

#[async_trait]
impl ListingSource for Yad2Scraper {
    async fn fetch_listing(&self, url: &str) -> Result<Vec<Item>, ScoutError> {
        let html = self.fetch_html(url).await?;
        let items = parse_listing_html(&html)?;
        info!("Scraped {} items from listing feed", items.len());
        Ok(items)
    }

    async fn fetch_item_details(&self, item_id: &str) -> Option<Value> {
        fetch_item_details(&self.client, &self.item_page_base, item_id).await
    }

    fn source_name(&self) -> &'static str {
        "yad2"
    }
}
