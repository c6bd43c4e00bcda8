//! Durable storage for queued requests.
//!
//! Every mutation runs under the storage's own lock, so concurrent
//! enqueue, remove and drain bookkeeping never lose each other's writes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::error::{QueueError, QueueResult};
use super::request::QueuedRequest;

/// Persistence for the offline queue, in enqueue order.
#[async_trait]
pub trait QueueStorage: Send + Sync {
    /// Returns every stored item, oldest first.
    async fn load(&self) -> QueueResult<Vec<QueuedRequest>>;

    /// Appends an item.
    async fn push(&self, item: QueuedRequest) -> QueueResult<()>;

    /// Removes an item. Returns false if it was not stored.
    async fn remove(&self, id: &str) -> QueueResult<bool>;

    /// Overwrites a stored item in place. Returns false if it was not stored.
    async fn replace(&self, item: QueuedRequest) -> QueueResult<bool>;

    /// Removes every item.
    async fn clear(&self) -> QueueResult<()>;
}

/// Volatile queue storage.
#[derive(Debug, Default)]
pub struct MemoryQueueStorage {
    items: RwLock<Vec<QueuedRequest>>,
}

impl MemoryQueueStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStorage for MemoryQueueStorage {
    async fn load(&self) -> QueueResult<Vec<QueuedRequest>> {
        Ok(self.items.read().await.clone())
    }

    async fn push(&self, item: QueuedRequest) -> QueueResult<()> {
        self.items.write().await.push(item);
        Ok(())
    }

    async fn remove(&self, id: &str) -> QueueResult<bool> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() != before)
    }

    async fn replace(&self, item: QueuedRequest) -> QueueResult<bool> {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(slot) => {
                *slot = item;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear(&self) -> QueueResult<()> {
        self.items.write().await.clear();
        Ok(())
    }
}

/// Queue storage in a JSON file that survives restarts.
///
/// A missing file is an empty queue. Writes go to a sibling temporary file
/// that is then renamed over the original.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStorage {
    /// Creates storage backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> QueueResult<Vec<QueuedRequest>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(QueueError::storage(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write(&self, items: &[QueuedRequest]) -> QueueResult<()> {
        let content = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await.map_err(|e| {
            QueueError::storage(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            QueueError::storage(format!("failed to replace {}: {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), items = items.len(), "Queue file written");
        Ok(())
    }
}

#[async_trait]
impl QueueStorage for JsonFileStorage {
    async fn load(&self) -> QueueResult<Vec<QueuedRequest>> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    async fn push(&self, item: QueuedRequest) -> QueueResult<()> {
        let _guard = self.lock.lock().await;
        let mut items = self.read().await?;
        items.push(item);
        self.write(&items).await
    }

    async fn remove(&self, id: &str) -> QueueResult<bool> {
        let _guard = self.lock.lock().await;
        let mut items = self.read().await?;
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.write(&items).await?;
        Ok(true)
    }

    async fn replace(&self, item: QueuedRequest) -> QueueResult<bool> {
        let _guard = self.lock.lock().await;
        let mut items = self.read().await?;
        let Some(slot) = items.iter_mut().find(|i| i.id == item.id) else {
            return Ok(false);
        };
        *slot = item;
        self.write(&items).await?;
        Ok(true)
    }

    async fn clear(&self) -> QueueResult<()> {
        let _guard = self.lock.lock().await;
        self.write(&[]).await
    }
}
