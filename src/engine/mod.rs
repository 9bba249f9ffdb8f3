//! Save handling: queue insertion, the gatekeeper, and the dispatch point.

pub mod dispatch;
pub mod gatekeeper;
pub mod queue;
pub mod save;

pub use dispatch::SavedItemDispatch;
pub use gatekeeper::Gatekeeper;
pub use queue::{Cascade, PublishQueuer, QueueReport};
pub use save::{
    NoCascadeSaveHandler, SaveHandler, SaveOutcome, SkipReason, StandardSaveHandler,
};
