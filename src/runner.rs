use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::ScoutError;
use crate::models::Topic;
use crate::notifier::TelegramNotifier;
use crate::scrapers::ListingSource;
use crate::storage::SnapshotStore;

/// Run one topic end to end: scrape → detect new → enrich → notify →
/// persist. Returns the number of new items.
///
/// The starting status notification is deliberately unguarded; if it cannot
/// be delivered the run fails like any other step.
pub async fn run_topic<S: ListingSource>(
    scraper: &S,
    store: &SnapshotStore,
    notifier: &TelegramNotifier,
    topic: &Topic,
) -> Result<usize, ScoutError> {
    notifier
        .notify_status(&format!(
            "Starting scanning {} on link:\n{}",
            topic.topic, topic.url
        ))
        .await?;

    let items = scraper.fetch_listing(&topic.url).await?;
    info!(topic = %topic.topic, count = items.len(), "Listing scraped");

    let saved = store.load_or_init(&topic.topic).await?;
    let mut new_items = SnapshotStore::partition_new(&saved, items);

    if new_items.is_empty() {
        info!(topic = %topic.topic, "No new items");
        notifier.notify_status("No new items were added").await?;
        return Ok(0);
    }

    // Sequential on purpose: keeps request pacing toward the site
    // predictable, and a failed enrichment only affects its own item.
    for item in &mut new_items {
        info!("Fetching details for new item: {}", item.id);
        if let Some(details) = scraper.fetch_item_details(&item.id).await {
            if let Some(km) = details.get("km").and_then(Value::as_i64) {
                item.km = Some(km);
            }
        }
    }

    notifier
        .notify_status(&format!("Found {} new items", new_items.len()))
        .await?;
    for item in &new_items {
        notifier.notify_item(item).await?;
    }

    store.commit(&topic.topic, &saved, &new_items).await?;
    Ok(new_items.len())
}

/// [`run_topic`] wrapped with failure reporting: a fatal error is reported
/// to the chat best-effort, then handed back to the scheduler unchanged.
pub async fn run_topic_reporting<S: ListingSource>(
    scraper: &S,
    store: &SnapshotStore,
    notifier: &TelegramNotifier,
    topic: &Topic,
) -> Result<usize, ScoutError> {
    match run_topic(scraper, store, notifier, topic).await {
        Ok(count) => Ok(count),
        Err(e) => {
            error!(topic = %topic.topic, "Scan failed: {e}");
            let report = format!("Scan workflow failed... 😥\nError: {e}");
            if let Err(send_err) = notifier.notify_status(&report).await {
                warn!("Failed to deliver the failure report: {send_err}");
            }
            Err(e)
        }
    }
}
