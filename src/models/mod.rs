use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical vehicle listing item.
///
/// The unit of identity, persistence, and notification. `id` is unique
/// within a topic's snapshot; `km` may be backfilled once from the item's
/// detail page before the item is first persisted, and the record is never
/// touched again after that.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: String,
    pub link: String,
    pub img_url: Option<String>,
    pub price: Option<i64>,
    pub year: Option<i64>,
    /// Ownership count display text ("יד").
    pub hand: Option<String>,
    /// Odometer reading; absent in the listing feed for some categories and
    /// backfilled from the item detail page.
    pub km: Option<i64>,
    pub merchant: bool,
    pub agency_name: Option<String>,
    pub model: Option<String>,
    pub sub_model: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

/// One independently configured scrape target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// Snapshot key and display name.
    pub topic: String,
    /// Listing search URL.
    pub url: String,
    #[serde(default)]
    pub disabled: bool,
}
