//! Content item identity and the read-only views the gatekeeper works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Name every template's standard-values item carries.
pub const STANDARD_VALUES_NAME: &str = "__Standard Values";

/// Newtype for content item IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.hyphenated().to_string().to_uppercase())
    }
}

impl std::str::FromStr for ItemId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::invalid_argument("item_id", e.to_string()))
    }
}

/// A language code such as `en` or `da-DK`. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(Error::invalid_argument("language", "language code is empty"));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Language {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.0
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The item a save event refers to, as it looked right after the save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedItem {
    pub id: ItemId,
    /// Name of the content database the item lives in (e.g. "master").
    pub database: String,
    pub name: String,
    /// Language version that was saved.
    pub language: Language,
    pub parent_id: Option<ItemId>,
    /// Last-updated statistic of the saved version.
    pub updated: DateTime<Utc>,
}

impl SavedItem {
    pub fn is_standard_values(&self) -> bool {
        is_standard_values_name(&self.name)
    }
}

/// An item as seen through the template index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Content database the item lives in.
    pub database: String,
    pub id: ItemId,
    pub name: String,
    pub parent_id: Option<ItemId>,
    /// Template this item is based on. Items sharing a template are its usages.
    pub template_id: Option<ItemId>,
    #[serde(default)]
    pub is_clone: bool,
}

impl ItemRecord {
    pub fn is_standard_values(&self) -> bool {
        is_standard_values_name(&self.name)
    }
}

fn is_standard_values_name(name: &str) -> bool {
    name.eq_ignore_ascii_case(STANDARD_VALUES_NAME)
}

/// What happened to an item. Stored verbatim as the queue entry's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemUpdateType {
    Created,
    Saved,
    Deleted,
    Moved,
    Renamed,
}

impl std::fmt::Display for ItemUpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemUpdateType::Created => "Created",
            ItemUpdateType::Saved => "Saved",
            ItemUpdateType::Deleted => "Deleted",
            ItemUpdateType::Moved => "Moved",
            ItemUpdateType::Renamed => "Renamed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ItemUpdateType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Created" => Ok(ItemUpdateType::Created),
            "Saved" => Ok(ItemUpdateType::Saved),
            "Deleted" => Ok(ItemUpdateType::Deleted),
            "Moved" => Ok(ItemUpdateType::Moved),
            "Renamed" => Ok(ItemUpdateType::Renamed),
            _ => Err(Error::invalid_argument(
                "action",
                format!("unknown update type: {s}"),
            )),
        }
    }
}
