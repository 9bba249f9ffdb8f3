//! Publish-queue insertion and clone propagation.

use opentelemetry::KeyValue;
use tracing::{debug, trace};

use crate::error::Result;
use crate::host::PublishContext;
use crate::model::{ItemId, LanguageScope, QueueEntry, SavedItem};
use crate::telemetry::metrics;

/// Whether an insertion may fan out to clones of a standard-values item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cascade {
    Clones,
    Suppressed,
}

/// Entries sent to the store while handling one save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueReport {
    /// Every entry passed to the store, clone entries included.
    pub entries: Vec<QueueEntry>,
    /// How many of those the store reported as new.
    pub created: usize,
}

impl QueueReport {
    fn record(&mut self, entry: QueueEntry, created: bool) {
        self.entries.push(entry);
        if created {
            self.created += 1;
        }
    }
}

/// Writes entries to the publish queue on behalf of the save handlers.
#[derive(Clone)]
pub struct PublishQueuer {
    ctx: PublishContext,
}

impl PublishQueuer {
    pub fn new(ctx: PublishContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &PublishContext {
        &self.ctx
    }

    /// Ask the store to queue `entry`.
    ///
    /// Unless `force` is set, nothing is written while a publish run is in
    /// progress, so publishing cannot feed itself new work. `origin` is the
    /// saved item the entry was built from, when there is one; its name and
    /// parent decide whether the entry cascades to clones. Returns whether
    /// the store created a new entry.
    pub async fn insert(
        &self,
        entry: QueueEntry,
        origin: Option<&SavedItem>,
        force: bool,
        cascade: Cascade,
        report: &mut QueueReport,
    ) -> Result<bool> {
        entry.validate()?;

        if !force && self.ctx.publishing.is_publishing() {
            debug!(item = %entry.item_id, "publish in progress, entry not queued");
            metrics::queue_insertions().add(1, &[KeyValue::new("result", "guarded")]);
            return Ok(false);
        }

        let created = self.ctx.store.add_to_publish_queue(&entry).await?;
        metrics::queue_insertions().add(
            1,
            &[KeyValue::new(
                "result",
                if created { "created" } else { "duplicate" },
            )],
        );
        trace!(
            item = %entry.item_id,
            language = %entry.language,
            action = %entry.action,
            created,
            "queued for publishing"
        );

        report.record(entry.clone(), created);

        if cascade == Cascade::Clones {
            if let Some(template_id) = self.standard_values_template(&entry, origin).await? {
                self.propagate_to_clones(&entry, template_id, report).await?;
            }
        }

        Ok(created)
    }

    /// Template owning the entry's item when that item is a standard-values
    /// item. The saved item is authoritative; the index is consulted only
    /// for entries that do not describe it.
    async fn standard_values_template(
        &self,
        entry: &QueueEntry,
        origin: Option<&SavedItem>,
    ) -> Result<Option<ItemId>> {
        if let Some(item) =
            origin.filter(|item| item.id == entry.item_id && item.database == entry.database)
        {
            return Ok(item.parent_id.filter(|_| item.is_standard_values()));
        }

        Ok(self
            .ctx
            .index
            .item(&entry.database, entry.item_id)
            .await?
            .filter(|item| item.is_standard_values())
            .and_then(|item| item.parent_id))
    }

    /// Queue every clone that uses `template_id`, the template whose
    /// standard values `source` describes.
    ///
    /// A missing template or missing usage means there is nothing to
    /// propagate. Clone entries carry no language and skip the publishing
    /// guard.
    pub async fn propagate_to_clones(
        &self,
        source: &QueueEntry,
        template_id: ItemId,
        report: &mut QueueReport,
    ) -> Result<usize> {
        let database = source.database.as_str();
        let Some(template) = self.ctx.index.item(database, template_id).await? else {
            return Ok(0);
        };

        let mut clones = Vec::new();
        for usage in self.ctx.index.usages_of(database, template.id).await? {
            if usage == source.item_id {
                continue;
            }
            if self.ctx.index.is_clone(database, usage).await? {
                clones.push(QueueEntry {
                    database: source.database.clone(),
                    item_id: usage,
                    action: source.action,
                    timestamp: source.timestamp,
                    language: LanguageScope::Default,
                });
            }
        }

        if clones.is_empty() {
            return Ok(0);
        }

        let created = self.ctx.store.add_batch(&clones).await?;
        metrics::clone_cascades().add(clones.len() as u64, &[]);
        debug!(
            template = %template.id,
            clones = clones.len(),
            created,
            "standard values saved, clones queued"
        );

        let issued = clones.len();
        report.entries.extend(clones);
        report.created += created;
        Ok(issued)
    }
}
