//! In-memory storage backends.
//!
//! Used by tests and by hosts that keep the publish queue in process.
//! Dedupe follows the same key as the Postgres table: an entry is unique by
//! (database, item, language, action, timestamp).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::host::{PublishQueueStore, TemplateIndex};
use crate::model::{ItemId, ItemRecord, QueueEntry, QueuedEntry};

/// Publish queue held in memory.
#[derive(Debug, Default)]
pub struct MemoryPublishQueue {
    inner: Mutex<QueueState>,
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: i64,
    rows: Vec<QueuedEntry>,
    /// Total calls received, including duplicates.
    calls: usize,
}

impl MemoryPublishQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored entries in insertion order.
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.inner
            .lock()
            .rows
            .iter()
            .map(|row| row.entry.clone())
            .collect()
    }

    pub fn rows(&self) -> Vec<QueuedEntry> {
        self.inner.lock().rows.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of insert calls received, duplicates included.
    pub fn calls(&self) -> usize {
        self.inner.lock().calls
    }

    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.rows.clear();
        state.calls = 0;
    }
}

impl QueueState {
    fn insert(&mut self, entry: &QueueEntry) -> bool {
        self.calls += 1;
        if self.rows.iter().any(|row| row.entry == *entry) {
            return false;
        }
        self.next_id += 1;
        self.rows.push(QueuedEntry {
            id: self.next_id,
            entry: entry.clone(),
            created_at: Utc::now(),
        });
        true
    }
}

#[async_trait]
impl PublishQueueStore for MemoryPublishQueue {
    async fn add_to_publish_queue(&self, entry: &QueueEntry) -> Result<bool> {
        Ok(self.inner.lock().insert(entry))
    }

    async fn add_batch(&self, entries: &[QueueEntry]) -> Result<usize> {
        let mut state = self.inner.lock();
        Ok(entries.iter().filter(|e| state.insert(e)).count())
    }
}

/// Template index held in memory, keyed by (database, item). Usages are
/// derived from each item's `template_id`.
#[derive(Debug, Default)]
pub struct MemoryTemplateIndex {
    items: RwLock<HashMap<(String, ItemId), ItemRecord>>,
}

impl MemoryTemplateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: ItemRecord) {
        self.items
            .write()
            .insert((record.database.clone(), record.id), record);
    }

    pub fn remove(&self, database: &str, id: ItemId) -> Option<ItemRecord> {
        self.items.write().remove(&(database.to_string(), id))
    }
}

#[async_trait]
impl TemplateIndex for MemoryTemplateIndex {
    async fn item(&self, database: &str, id: ItemId) -> Result<Option<ItemRecord>> {
        Ok(self.items.read().get(&(database.to_string(), id)).cloned())
    }

    async fn usages_of(&self, database: &str, template_id: ItemId) -> Result<Vec<ItemId>> {
        let mut usages: Vec<ItemId> = self
            .items
            .read()
            .values()
            .filter(|item| item.database == database && item.template_id == Some(template_id))
            .map(|item| item.id)
            .collect();
        // Stable order so cascades issue entries deterministically.
        usages.sort();
        Ok(usages)
    }
}
