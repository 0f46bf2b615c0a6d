mod config;
mod error;
mod models;
mod notifier;
mod runner;
mod scrapers;
mod storage;

use std::sync::Arc;

use config::Config;
use notifier::TelegramNotifier;
use scrapers::{ListingSource, Yad2Scraper};
use storage::SnapshotStore;
use tokio::task::JoinSet;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("🚗 Yad2 Scout - new listing watcher");
    info!("====================================");

    let config = Config::load("config.json")?;
    let scraper = Arc::new(Yad2Scraper::new()?);
    let store = Arc::new(SnapshotStore::new("data", "push_me"));
    let notifier = Arc::new(TelegramNotifier::new(&config.api_token, &config.chat_id)?);

    info!("Using {} listing source", scraper.source_name());

    for topic in &config.topics {
        if topic.disabled {
            info!("Topic \"{}\" is disabled. Skipping.", topic.topic);
        }
    }

    // One task per enabled topic; topics run independently and one
    // failure never cancels the others.
    let mut tasks = JoinSet::new();
    for topic in config.enabled_topics() {
        let scraper = Arc::clone(&scraper);
        let store = Arc::clone(&store);
        let notifier = Arc::clone(&notifier);
        let topic = topic.clone();
        tasks.spawn(async move {
            let outcome =
                runner::run_topic_reporting(scraper.as_ref(), &store, &notifier, &topic).await;
            (topic.topic, outcome)
        });
    }

    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((topic, Ok(new_items))) => {
                info!("✅ Topic \"{topic}\" finished with {new_items} new items");
            }
            Ok((topic, Err(e))) => {
                failed += 1;
                error!("Topic \"{topic}\" failed: {e}");
            }
            Err(join_err) => {
                failed += 1;
                error!("Topic task panicked: {join_err}");
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} topic(s) failed");
    }
    Ok(())
}
