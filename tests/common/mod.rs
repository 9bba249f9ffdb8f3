//! Shared fixtures: in-memory collaborators and save-event builders.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use publish_gatekeeper::classify::{LOCK_TOGGLE_FIELDS, WORKFLOW_STATE_FIELDS};
use publish_gatekeeper::error::Result;
use publish_gatekeeper::host::{HostFlags, PublishContext, SmartPublish};
use publish_gatekeeper::model::*;
use publish_gatekeeper::storage::{MemoryPublishQueue, MemoryTemplateIndex};

/// Counts smart-publish consultations.
#[derive(Default)]
pub struct SmartPublishSpy {
    calls: AtomicUsize,
}

impl SmartPublishSpy {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmartPublish for SmartPublishSpy {
    async fn consider(&self, _item: &SavedItem) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct Fixture {
    pub queue: Arc<MemoryPublishQueue>,
    pub index: Arc<MemoryTemplateIndex>,
    pub flags: Arc<HostFlags>,
    pub smart: Arc<SmartPublishSpy>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(MemoryPublishQueue::new()),
            index: Arc::new(MemoryTemplateIndex::new()),
            flags: Arc::new(HostFlags::new()),
            smart: Arc::new(SmartPublishSpy::default()),
        }
    }

    pub fn context(&self) -> PublishContext {
        PublishContext::new(self.queue.clone(), self.index.clone(), self.flags.clone())
            .with_smart_publish(self.smart.clone())
    }

    /// Register a template with a standard-values item, one clone usage and
    /// one plain usage.
    pub fn template_with_usages(&self) -> TemplateItems {
        let template = ItemId::new();
        let standard_values = ItemId::new();
        let clone = ItemId::new();
        let plain = ItemId::new();

        self.index.insert(record(template, "Article", None, None, false));
        self.index.insert(record(
            standard_values,
            STANDARD_VALUES_NAME,
            Some(template),
            Some(template),
            false,
        ));
        self.index.insert(record(clone, "Clone of home", None, Some(template), true));
        self.index.insert(record(plain, "Home", None, Some(template), false));

        TemplateItems {
            template,
            standard_values,
            clone,
            plain,
        }
    }
}

pub struct TemplateItems {
    pub template: ItemId,
    pub standard_values: ItemId,
    pub clone: ItemId,
    pub plain: ItemId,
}

impl TemplateItems {
    /// The template's standard-values item as it arrives in a save event.
    pub fn standard_values_item(&self) -> SavedItem {
        let mut item = saved_item(self.standard_values, STANDARD_VALUES_NAME);
        item.parent_id = Some(self.template);
        item
    }
}

pub fn record(
    id: ItemId,
    name: &str,
    parent_id: Option<ItemId>,
    template_id: Option<ItemId>,
    is_clone: bool,
) -> ItemRecord {
    ItemRecord {
        database: "master".to_string(),
        id,
        name: name.to_string(),
        parent_id,
        template_id,
        is_clone,
    }
}

pub fn updated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
}

pub fn saved_item(id: ItemId, name: &str) -> SavedItem {
    SavedItem {
        id,
        database: "master".to_string(),
        name: name.to_string(),
        language: Language::new("en").unwrap(),
        parent_id: None,
        updated: updated_at(),
    }
}

pub fn save_event(item: SavedItem, fields: FieldChangeSet, properties_changed: bool) -> SaveEvent {
    SaveEvent::new(
        item,
        ItemChanges {
            fields,
            properties_changed,
        },
    )
}

pub fn versioned(ids: &[FieldId]) -> FieldChangeSet {
    ids.iter().copied().map(FieldChange::versioned).collect()
}

pub fn lock_toggle() -> FieldChangeSet {
    versioned(&LOCK_TOGGLE_FIELDS)
}

pub fn workflow_move() -> FieldChangeSet {
    versioned(&WORKFLOW_STATE_FIELDS)
}

/// Some content field, e.g. a page title.
pub fn content_field() -> FieldId {
    FieldId(uuid::Uuid::from_u128(0x75577384_3C97_45DA_A847_81B00500E250))
}
