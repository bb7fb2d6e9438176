//! Local content store: the durable offline snapshot of server content.

use std::sync::Arc;

use tracing::debug;

use studium_core::defaults::CONTENT_SNAPSHOT_KEY;
use studium_core::{ContentSection, Entity, Error, Result, StorageBackend, SyncableContent};

/// Persists the last-synchronized [`SyncableContent`] snapshot.
///
/// The snapshot is owned exclusively by this store and only ever written
/// whole: [`replace`](Self::replace) serializes the complete snapshot and
/// stores it under a single key, so readers never see a partial write.
#[derive(Clone)]
pub struct LocalContentStore {
    storage: Arc<dyn StorageBackend>,
}

impl LocalContentStore {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Load the current snapshot, `None` if no sync has succeeded yet.
    pub async fn load(&self) -> Result<Option<SyncableContent>> {
        match self.storage.get(CONTENT_SNAPSHOT_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Atomically replace the snapshot with a merged result.
    pub async fn replace(&self, content: &SyncableContent) -> Result<()> {
        let raw = serde_json::to_string(content)?;
        self.storage.set(CONTENT_SNAPSHOT_KEY, &raw).await?;
        debug!(
            entity_count = content.entity_count(),
            last_sync = content.last_sync_timestamp,
            "Replaced offline content snapshot"
        );
        Ok(())
    }

    /// Drop the snapshot entirely.
    pub async fn clear(&self) -> Result<()> {
        self.storage.remove(CONTENT_SNAPSHOT_KEY).await
    }

    /// Whether any snapshot is available for offline use.
    pub async fn is_available(&self) -> Result<bool> {
        Ok(self.storage.get(CONTENT_SNAPSHOT_KEY).await?.is_some())
    }

    /// Read one entity section from the snapshot.
    ///
    /// Fails with [`Error::NoOfflineContent`] when no snapshot exists.
    pub async fn section(&self, section: ContentSection) -> Result<Vec<Entity>> {
        let content = self.load().await?.ok_or(Error::NoOfflineContent)?;
        Ok(content.section(section).to_vec())
    }

    /// Timestamp of the last successful sync, 0 if never synced.
    pub async fn last_sync_timestamp(&self) -> Result<i64> {
        Ok(self
            .load()
            .await?
            .map(|c| c.last_sync_timestamp)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;

    fn store() -> LocalContentStore {
        LocalContentStore::new(Arc::new(MemoryStorage::new()))
    }

    fn sample() -> SyncableContent {
        SyncableContent {
            topics: vec![Entity::bare("t1")],
            quizzes: vec![Entity::bare("q1")],
            last_sync_timestamp: 123,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn load_is_none_before_first_sync() {
        let store = store();
        assert!(store.load().await.unwrap().is_none());
        assert!(!store.is_available().await.unwrap());
        assert_eq!(store.last_sync_timestamp().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn replace_then_load_round_trips() {
        let store = store();
        let content = sample();
        store.replace(&content).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, content);
        assert!(store.is_available().await.unwrap());
        assert_eq!(store.last_sync_timestamp().await.unwrap(), 123);
    }

    #[tokio::test]
    async fn section_without_snapshot_fails() {
        let store = store();
        match store.section(ContentSection::Topics).await {
            Err(Error::NoOfflineContent) => {}
            other => panic!("expected NoOfflineContent, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn section_reads_one_array() {
        let store = store();
        store.replace(&sample()).await.unwrap();

        let quizzes = store.section(ContentSection::Quizzes).await.unwrap();
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].id, "q1");

        let progress = store.section(ContentSection::Progress).await.unwrap();
        assert!(progress.is_empty());
    }

    #[tokio::test]
    async fn clear_removes_snapshot() {
        let store = store();
        store.replace(&sample()).await.unwrap();
        store.clear().await.unwrap();
        assert!(!store.is_available().await.unwrap());
    }
}
