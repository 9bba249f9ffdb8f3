//! Core data model.
//!
//! A save event says which item changed and how. A queue entry asks the
//! publish queue to republish an item in one or all languages.

pub mod item;
pub mod queue;
pub mod save;

pub use item::{ItemId, ItemRecord, ItemUpdateType, Language, STANDARD_VALUES_NAME, SavedItem};
pub use queue::{LanguageScope, QueueEntry, QueuedEntry};
pub use save::{FieldChange, FieldChangeSet, FieldId, ItemChanges, SaveEvent, fields};
