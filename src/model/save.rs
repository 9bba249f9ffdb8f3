//! Save events and the field changes they carry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::item::SavedItem;

/// Newtype for field IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub Uuid);

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.hyphenated().to_string().to_uppercase())
    }
}

/// Well-known system field IDs. Fixed by the host platform.
pub mod fields {
    use super::FieldId;
    use uuid::Uuid;

    /// `__Lock`
    pub const LOCK: FieldId = FieldId(Uuid::from_u128(0x001DD393_96C5_490B_924A_B0F25CD9EFD8));
    /// `__Workflow state`
    pub const WORKFLOW_STATE: FieldId =
        FieldId(Uuid::from_u128(0x3E431DE1_525E_47A3_B6B0_1CCBEC3A8C98));
    /// `__Revision`
    pub const REVISION: FieldId = FieldId(Uuid::from_u128(0x8CDC337E_A112_42FB_BBB4_4143751E123F));
    /// `__Updated`
    pub const UPDATED: FieldId = FieldId(Uuid::from_u128(0xD9CF14B1_FA16_4BA6_9288_E8A174D4D522));
    /// `__Updated by`
    pub const UPDATED_BY: FieldId =
        FieldId(Uuid::from_u128(0xBADD9CF9_53E0_4D0C_BCC0_2D784C282F6A));
}

/// One changed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field_id: FieldId,
    /// Shared fields hold one value across all language versions.
    #[serde(default)]
    pub shared: bool,
}

impl FieldChange {
    pub fn versioned(field_id: FieldId) -> Self {
        Self {
            field_id,
            shared: false,
        }
    }

    pub fn shared(field_id: FieldId) -> Self {
        Self {
            field_id,
            shared: true,
        }
    }
}

/// Set of fields mutated by one save. Field IDs are unique; a repeated ID
/// replaces the earlier change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FieldChange>", into = "Vec<FieldChange>")]
pub struct FieldChangeSet {
    changes: BTreeMap<FieldId, FieldChange>,
}

impl FieldChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, change: FieldChange) {
        self.changes.insert(change.field_id, change);
    }

    pub fn with(mut self, change: FieldChange) -> Self {
        self.insert(change);
        self
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn contains(&self, field_id: &FieldId) -> bool {
        self.changes.contains_key(field_id)
    }

    /// Does any changed field apply across all language versions?
    pub fn any_shared(&self) -> bool {
        self.changes.values().any(|c| c.shared)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.values()
    }
}

impl FromIterator<FieldChange> for FieldChangeSet {
    fn from_iter<I: IntoIterator<Item = FieldChange>>(iter: I) -> Self {
        let mut set = Self::new();
        for change in iter {
            set.insert(change);
        }
        set
    }
}

impl From<Vec<FieldChange>> for FieldChangeSet {
    fn from(value: Vec<FieldChange>) -> Self {
        value.into_iter().collect()
    }
}

impl From<FieldChangeSet> for Vec<FieldChange> {
    fn from(value: FieldChangeSet) -> Self {
        value.changes.into_values().collect()
    }
}

/// Everything a save changed on the item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemChanges {
    #[serde(default)]
    pub fields: FieldChangeSet,
    /// Non-field properties (name, template, branch...) changed.
    #[serde(default)]
    pub properties_changed: bool,
}

impl ItemChanges {
    /// Properties changed and no field did.
    pub fn is_property_only(&self) -> bool {
        self.properties_changed && self.fields.is_empty()
    }
}

/// One persisted mutation of a content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEvent {
    pub item: SavedItem,
    #[serde(default)]
    pub changes: ItemChanges,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl SaveEvent {
    pub fn new(item: SavedItem, changes: ItemChanges) -> Self {
        Self {
            item,
            changes,
            timestamp: Utc::now(),
        }
    }
}
