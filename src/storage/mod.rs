use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ScoutError;
use crate::models::Item;

/// File-backed store for the per-topic set of previously seen items.
///
/// One JSON array per topic under `data_dir`. A topic's snapshot file is
/// exclusively owned by its topic run; no locking is done, so two runs of
/// the same topic must not execute concurrently against the same directory.
pub struct SnapshotStore {
    data_dir: PathBuf,
    marker_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>, marker_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            marker_path: marker_path.into(),
        }
    }

    fn snapshot_path(&self, topic: &str) -> PathBuf {
        self.data_dir.join(format!("{topic}.json"))
    }

    /// Load the snapshot for `topic`, creating an empty one when none
    /// exists yet. Any read or parse failure other than "does not exist"
    /// is a [`ScoutError::Storage`].
    pub async fn load_or_init(&self, topic: &str) -> Result<Vec<Item>, ScoutError> {
        let path = self.snapshot_path(topic);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| storage_error(&path, e)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tokio::fs::create_dir_all(&self.data_dir)
                    .await
                    .map_err(|e| storage_error(&self.data_dir, e))?;
                tokio::fs::write(&path, "[]")
                    .await
                    .map_err(|e| storage_error(&path, e))?;
                debug!("Initialized empty snapshot at {}", path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    /// Ordered subsequence of `current` whose ids are not in `saved`.
    /// A duplicate id inside `current` itself is yielded only once, keeping
    /// the snapshot free of duplicates.
    pub fn partition_new(saved: &[Item], current: Vec<Item>) -> Vec<Item> {
        let mut seen: HashSet<String> = saved.iter().map(|i| i.id.clone()).collect();
        current
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect()
    }

    /// Persist `saved` extended by `new_items`, in that order.
    ///
    /// A commit with zero new items is a no-op: no write, no marker. The
    /// snapshot is written to a sibling temp file and renamed into place so
    /// a partially written file is never loadable; on success the zero-byte
    /// work marker is touched for downstream automation.
    pub async fn commit(
        &self,
        topic: &str,
        saved: &[Item],
        new_items: &[Item],
    ) -> Result<(), ScoutError> {
        if new_items.is_empty() {
            return Ok(());
        }
        let merged: Vec<&Item> = saved.iter().chain(new_items.iter()).collect();
        let json = serde_json::to_string_pretty(&merged)
            .map_err(|e| storage_error(&self.snapshot_path(topic), e))?;

        let path = self.snapshot_path(topic);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| storage_error(&self.data_dir, e))?;
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| storage_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage_error(&path, e))?;

        tokio::fs::write(&self.marker_path, "")
            .await
            .map_err(|e| storage_error(&self.marker_path, e))?;
        info!(
            topic,
            new = new_items.len(),
            total = merged.len(),
            "Snapshot committed"
        );
        Ok(())
    }
}

fn storage_error(path: &Path, reason: impl std::fmt::Display) -> ScoutError {
    ScoutError::Storage {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;

    fn item(id: &str) -> Item {
        Item {
            id: id.to_string(),
            link: format!("https://www.yad2.co.il/item/{id}"),
            img_url: Some(format!("https://img.example/{id}.jpg")),
            price: Some(50000),
            year: Some(2018),
            hand: Some("יד ראשונה".to_string()),
            km: Some(90000),
            merchant: false,
            agency_name: None,
            model: Some("i30".to_string()),
            sub_model: None,
            city: Some("תל אביב".to_string()),
            area: None,
            scraped_at: Utc::now(),
        }
    }

    fn store(dir: &TempDir) -> SnapshotStore {
        SnapshotStore::new(dir.path().join("data"), dir.path().join("push_me"))
    }

    #[tokio::test]
    async fn missing_snapshot_is_initialized_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let snapshot = store.load_or_init("cars").await.unwrap();
        assert!(snapshot.is_empty());
        let on_disk = std::fs::read_to_string(dir.path().join("data/cars.json")).unwrap();
        assert_eq!(on_disk, "[]");
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/cars.json"), "{ not json").unwrap();
        let err = store.load_or_init("cars").await.unwrap_err();
        assert!(matches!(err, ScoutError::Storage { .. }));
    }

    #[tokio::test]
    async fn commit_then_load_round_trips_items() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let saved = store.load_or_init("cars").await.unwrap();
        let new_items = vec![item("A"), item("B")];
        store.commit("cars", &saved, &new_items).await.unwrap();

        let reloaded = store.load_or_init("cars").await.unwrap();
        assert_eq!(reloaded, new_items);
        assert!(dir.path().join("push_me").exists());
    }

    #[tokio::test]
    async fn commit_appends_after_existing_items() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.commit("cars", &[], &[item("A")]).await.unwrap();
        let saved = store.load_or_init("cars").await.unwrap();
        store.commit("cars", &saved, &[item("B")]).await.unwrap();

        let reloaded = store.load_or_init("cars").await.unwrap();
        let ids: Vec<&str> = reloaded.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
    }

    #[tokio::test]
    async fn commit_with_zero_new_items_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let saved = store.load_or_init("cars").await.unwrap();
        let before = std::fs::read_to_string(dir.path().join("data/cars.json")).unwrap();

        store.commit("cars", &saved, &[]).await.unwrap();

        let after = std::fs::read_to_string(dir.path().join("data/cars.json")).unwrap();
        assert_eq!(before, after);
        assert!(!dir.path().join("push_me").exists());
    }

    #[tokio::test]
    async fn no_leftover_temp_file_after_commit() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.commit("cars", &[], &[item("A")]).await.unwrap();
        assert!(!dir.path().join("data/cars.json.tmp").exists());
    }

    #[test]
    fn partition_new_keeps_input_order_and_drops_seen() {
        let saved = vec![item("A")];
        let new_items =
            SnapshotStore::partition_new(&saved, vec![item("A"), item("B"), item("C")]);
        let ids: Vec<&str> = new_items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["B", "C"]);
    }

    #[test]
    fn partition_new_is_idempotent_after_merge() {
        let saved: Vec<Item> = Vec::new();
        let current = vec![item("A"), item("B")];
        let first = SnapshotStore::partition_new(&saved, current.clone());
        let merged: Vec<Item> = saved.iter().cloned().chain(first).collect();
        let second = SnapshotStore::partition_new(&merged, current);
        assert!(second.is_empty());
    }

    #[test]
    fn partition_new_dedupes_within_candidates() {
        let new_items = SnapshotStore::partition_new(&[], vec![item("A"), item("A")]);
        assert_eq!(new_items.len(), 1);
    }
}
