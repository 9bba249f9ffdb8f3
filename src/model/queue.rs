//! Publish-queue entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::{ItemId, ItemUpdateType, Language};
use crate::error::{Error, Result};

/// Which language versions an entry asks to republish.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageScope {
    /// Every language version (stored as `*`).
    All,
    /// One language version.
    Specific(Language),
    /// No language given; the store uses the item's current language.
    Default,
}

impl LanguageScope {
    pub const WILDCARD: &'static str = "*";

    /// Storage form: `*`, the language code, or empty.
    pub fn as_storage_str(&self) -> &str {
        match self {
            LanguageScope::All => Self::WILDCARD,
            LanguageScope::Specific(language) => language.as_str(),
            LanguageScope::Default => "",
        }
    }

    pub fn from_storage_str(s: &str) -> Result<Self> {
        match s {
            Self::WILDCARD => Ok(LanguageScope::All),
            "" => Ok(LanguageScope::Default),
            code => Language::new(code).map(LanguageScope::Specific),
        }
    }
}

impl std::fmt::Display for LanguageScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageScope::Default => f.write_str("(default)"),
            other => f.write_str(other.as_storage_str()),
        }
    }
}

/// A request to mark an item as needing publication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Content database the item lives in.
    pub database: String,
    pub item_id: ItemId,
    pub action: ItemUpdateType,
    pub timestamp: DateTime<Utc>,
    pub language: LanguageScope,
}

impl QueueEntry {
    /// Check the required inputs. Called before any store interaction.
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(Error::invalid_argument("database", "database name is empty"));
        }
        if self.item_id.is_nil() {
            return Err(Error::invalid_argument("item_id", "item id is nil"));
        }
        Ok(())
    }
}

/// A stored queue row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedEntry {
    pub id: i64,
    pub entry: QueueEntry,
    pub created_at: DateTime<Utc>,
}
