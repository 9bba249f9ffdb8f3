//! The single dispatch point for item-saved notifications.
//!
//! Exactly one handler is installed at startup, chosen by configuration.
//! Installing the gatekeeper replaces the stock handler outright, so a save
//! is never handled twice.

use std::sync::Arc;

use tracing::{Instrument, info, warn};

use super::gatekeeper::Gatekeeper;
use super::save::{SaveHandler, SaveOutcome, SkipReason, StandardSaveHandler};
use crate::config::{HandlerKind, PublishingSettings};
use crate::error::Result;
use crate::host::PublishContext;
use crate::model::SaveEvent;
use crate::telemetry::save::start_save_span;

pub struct SavedItemDispatch {
    handler: Option<Arc<dyn SaveHandler>>,
}

impl SavedItemDispatch {
    /// Install the handler named by `settings.save_handler`.
    ///
    /// With publishing disabled nothing is installed and a warning is
    /// logged; every later dispatch is skipped.
    pub fn initialize(settings: &PublishingSettings, ctx: PublishContext) -> Self {
        let handler: Arc<dyn SaveHandler> = match settings.save_handler {
            HandlerKind::Gatekeeper => Arc::new(Gatekeeper::new(ctx)),
            HandlerKind::Stock => Arc::new(StandardSaveHandler::new(ctx)),
        };
        let dispatch = Self::with_handler(settings, handler);
        if dispatch.is_active() {
            info!(handler = %settings.save_handler, "save handler installed");
        }
        dispatch
    }

    /// Install a host-built handler (e.g. a [`Gatekeeper`] wrapping the
    /// host's own stock path). `settings.save_handler` is not consulted.
    pub fn with_handler(settings: &PublishingSettings, handler: Arc<dyn SaveHandler>) -> Self {
        if !settings.enabled {
            warn!("publishing is disabled due to running under a restricted license");
            return Self { handler: None };
        }
        Self {
            handler: Some(handler),
        }
    }

    pub fn is_active(&self) -> bool {
        self.handler.is_some()
    }

    pub async fn dispatch(&self, event: &SaveEvent) -> Result<SaveOutcome> {
        let Some(handler) = self.handler.as_ref() else {
            return Ok(SaveOutcome::skipped(SkipReason::PublishingDisabled));
        };
        handler.handle(event).instrument(start_save_span(event)).await
    }
}
