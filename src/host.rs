//! Seams to the host platform.
//!
//! The gatekeeper owns no state. Everything it reads or writes lives behind
//! one of these traits: the publish-queue store, the template index, the
//! publishing and bulk-update flags, and the smart-publish heuristic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{ItemId, ItemRecord, QueueEntry, SavedItem};

/// Durable worklist of items awaiting a publish run.
#[async_trait]
pub trait PublishQueueStore: Send + Sync {
    /// Record an entry. Returns `true` when a new entry was created, `false`
    /// when an identical one already existed.
    async fn add_to_publish_queue(&self, entry: &QueueEntry) -> Result<bool>;

    /// Record several entries. Returns how many were new.
    ///
    /// The default inserts one entry at a time and is not atomic: an error
    /// part way through leaves the earlier entries stored. Stores that can
    /// write in a single transaction should override it.
    async fn add_batch(&self, entries: &[QueueEntry]) -> Result<usize> {
        let mut created = 0;
        for entry in entries {
            if self.add_to_publish_queue(entry).await? {
                created += 1;
            }
        }
        Ok(created)
    }
}

/// Read-only view of items, their templates, and template usages.
///
/// Every lookup is scoped to one content database; the same item ID in two
/// databases names two different items.
#[async_trait]
pub trait TemplateIndex: Send + Sync {
    async fn item(&self, database: &str, id: ItemId) -> Result<Option<ItemRecord>>;

    /// Items in `database` registered as usages of `template_id`.
    async fn usages_of(&self, database: &str, template_id: ItemId) -> Result<Vec<ItemId>>;

    /// Unknown items are not clones.
    async fn is_clone(&self, database: &str, id: ItemId) -> Result<bool> {
        Ok(self
            .item(database, id)
            .await?
            .is_some_and(|item| item.is_clone))
    }
}

/// Is a publish run in progress right now?
pub trait PublishingOracle: Send + Sync {
    fn is_publishing(&self) -> bool;
}

/// Is the caller inside a bulk-update scope?
pub trait BulkUpdateOracle: Send + Sync {
    fn is_bulk_update_active(&self) -> bool;
}

/// Heuristic that may schedule an automatic publish after a save.
#[async_trait]
pub trait SmartPublish: Send + Sync {
    async fn consider(&self, item: &SavedItem) -> Result<()>;
}

/// Smart publish that never schedules anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSmartPublish;

#[async_trait]
impl SmartPublish for NoSmartPublish {
    async fn consider(&self, _item: &SavedItem) -> Result<()> {
        Ok(())
    }
}

tokio::task_local! {
    static BULK_UPDATE_DEPTH: usize;
}

/// Bulk-update scope bound to the current task.
///
/// Saves handled inside [`BulkUpdateScope::run`] see an active bulk update;
/// saves on every other task do not. Tasks spawned from inside the scope
/// start outside it.
#[derive(Debug, Default, Clone, Copy)]
pub struct BulkUpdateScope;

impl BulkUpdateScope {
    /// Drive `fut` inside a bulk-update scope. Scopes nest.
    pub async fn run<F: Future>(fut: F) -> F::Output {
        BULK_UPDATE_DEPTH.scope(Self::depth() + 1, fut).await
    }

    pub fn is_active() -> bool {
        Self::depth() > 0
    }

    fn depth() -> usize {
        BULK_UPDATE_DEPTH.try_with(|depth| *depth).unwrap_or(0)
    }
}

impl BulkUpdateOracle for BulkUpdateScope {
    fn is_bulk_update_active(&self) -> bool {
        Self::is_active()
    }
}

/// Host flags: the process-wide publishing switch, plus the task-scoped
/// bulk-update state from [`BulkUpdateScope`].
#[derive(Debug, Default)]
pub struct HostFlags {
    publishing: AtomicBool,
}

impl HostFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_publishing(&self, publishing: bool) {
        self.publishing.store(publishing, Ordering::SeqCst);
    }
}

impl PublishingOracle for HostFlags {
    fn is_publishing(&self) -> bool {
        self.publishing.load(Ordering::SeqCst)
    }
}

impl BulkUpdateOracle for HostFlags {
    fn is_bulk_update_active(&self) -> bool {
        BulkUpdateScope::is_active()
    }
}

/// Collaborators shared by every save handler.
#[derive(Clone)]
pub struct PublishContext {
    pub store: Arc<dyn PublishQueueStore>,
    pub index: Arc<dyn TemplateIndex>,
    pub publishing: Arc<dyn PublishingOracle>,
    pub bulk_update: Arc<dyn BulkUpdateOracle>,
    pub smart_publish: Arc<dyn SmartPublish>,
}

impl PublishContext {
    /// Context whose flags both come from one `HostFlags`, with smart
    /// publish disabled.
    pub fn new(
        store: Arc<dyn PublishQueueStore>,
        index: Arc<dyn TemplateIndex>,
        flags: Arc<HostFlags>,
    ) -> Self {
        Self {
            store,
            index,
            publishing: flags.clone(),
            bulk_update: flags,
            smart_publish: Arc::new(NoSmartPublish),
        }
    }

    pub fn with_smart_publish(mut self, smart_publish: Arc<dyn SmartPublish>) -> Self {
        self.smart_publish = smart_publish;
        self
    }
}
