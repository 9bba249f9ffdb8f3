//! Save handlers: turn one save event into publish-queue entries.

use async_trait::async_trait;
use chrono::Utc;
use opentelemetry::KeyValue;
use serde::Serialize;
use tracing::debug;

use super::queue::{Cascade, PublishQueuer, QueueReport};
use crate::error::Result;
use crate::host::PublishContext;
use crate::model::{ItemUpdateType, LanguageScope, QueueEntry, SaveEvent};
use crate::telemetry::metrics;

/// Why a save produced no queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Only lock-state bookkeeping changed.
    LockToggle,
    /// A bulk-update scope is active; the bulk operation queues on its own.
    BulkUpdate,
    /// No handler is installed because publishing is disabled.
    PublishingDisabled,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::LockToggle => "lock_toggle",
            SkipReason::BulkUpdate => "bulk_update",
            SkipReason::PublishingDisabled => "publishing_disabled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Skipped(SkipReason),
    Queued(QueueReport),
}

impl SaveOutcome {
    pub(crate) fn skipped(reason: SkipReason) -> Self {
        metrics::saves_skipped().add(1, &[KeyValue::new("reason", reason.as_str())]);
        SaveOutcome::Skipped(reason)
    }

    /// Entries sent to the store; empty when skipped.
    pub fn entries(&self) -> &[QueueEntry] {
        match self {
            SaveOutcome::Skipped(_) => &[],
            SaveOutcome::Queued(report) => &report.entries,
        }
    }
}

/// Receives item-saved notifications.
#[async_trait]
pub trait SaveHandler: Send + Sync {
    async fn handle(&self, event: &SaveEvent) -> Result<SaveOutcome>;
}

/// How a handler queues a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueMode {
    cascade: Cascade,
    /// Language-scoped entries bypass the publishing guard.
    force_language_entries: bool,
}

impl QueueMode {
    const STANDARD: QueueMode = QueueMode {
        cascade: Cascade::Clones,
        force_language_entries: false,
    };

    const NO_CASCADE: QueueMode = QueueMode {
        cascade: Cascade::Suppressed,
        force_language_entries: true,
    };
}

async fn queue_saved_item(
    queuer: &PublishQueuer,
    event: &SaveEvent,
    mode: QueueMode,
) -> Result<SaveOutcome> {
    let ctx = queuer.context();
    if ctx.bulk_update.is_bulk_update_active() {
        debug!(item = %event.item.id, "bulk update active, save not queued");
        return Ok(SaveOutcome::skipped(SkipReason::BulkUpdate));
    }

    let item = &event.item;
    let mut report = QueueReport::default();

    if event.changes.is_property_only() {
        // Property changes are not language-scoped.
        let entry = entry_for(event, Utc::now(), LanguageScope::All);
        queuer
            .insert(entry, Some(item), false, mode.cascade, &mut report)
            .await?;
    } else if event.changes.fields.any_shared() {
        let entry = entry_for(event, item.updated, LanguageScope::All);
        queuer
            .insert(entry, Some(item), false, mode.cascade, &mut report)
            .await?;
    } else {
        let entry = entry_for(
            event,
            item.updated,
            LanguageScope::Specific(item.language.clone()),
        );
        queuer
            .insert(
                entry,
                Some(item),
                mode.force_language_entries,
                mode.cascade,
                &mut report,
            )
            .await?;
    }

    ctx.smart_publish.consider(item).await?;
    Ok(SaveOutcome::Queued(report))
}

fn entry_for(
    event: &SaveEvent,
    timestamp: chrono::DateTime<Utc>,
    language: LanguageScope,
) -> QueueEntry {
    QueueEntry {
        database: event.item.database.clone(),
        item_id: event.item.id,
        action: ItemUpdateType::Saved,
        timestamp,
        language,
    }
}

/// The stock save path: queue the item and cascade to clones when the
/// saved item is a template's standard values.
#[derive(Clone)]
pub struct StandardSaveHandler {
    queuer: PublishQueuer,
}

impl StandardSaveHandler {
    pub fn new(ctx: PublishContext) -> Self {
        Self {
            queuer: PublishQueuer::new(ctx),
        }
    }
}

#[async_trait]
impl SaveHandler for StandardSaveHandler {
    async fn handle(&self, event: &SaveEvent) -> Result<SaveOutcome> {
        queue_saved_item(&self.queuer, event, QueueMode::STANDARD).await
    }
}

/// Queues the saved item alone, never its clones. Language-scoped entries
/// are written even during a publish run.
#[derive(Clone)]
pub struct NoCascadeSaveHandler {
    queuer: PublishQueuer,
}

impl NoCascadeSaveHandler {
    pub fn new(ctx: PublishContext) -> Self {
        Self {
            queuer: PublishQueuer::new(ctx),
        }
    }
}

#[async_trait]
impl SaveHandler for NoCascadeSaveHandler {
    async fn handle(&self, event: &SaveEvent) -> Result<SaveOutcome> {
        queue_saved_item(&self.queuer, event, QueueMode::NO_CASCADE).await
    }
}
