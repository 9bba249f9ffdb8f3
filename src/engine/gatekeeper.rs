//! The gatekeeper: replaces the stock save handler and keeps lock toggles
//! and workflow-state moves from flooding the publish queue.

use std::sync::Arc;

use async_trait::async_trait;
use opentelemetry::KeyValue;
use tracing::{Span, debug};

use super::save::{NoCascadeSaveHandler, SaveHandler, SaveOutcome, SkipReason, StandardSaveHandler};
use crate::classify::{ChangeClass, classify};
use crate::error::Result;
use crate::host::PublishContext;
use crate::model::SaveEvent;
use crate::telemetry::metrics;
use crate::telemetry::save::record_class;

pub struct Gatekeeper {
    /// Handles everything that is not a lock toggle or workflow move.
    standard: Arc<dyn SaveHandler>,
    no_cascade: NoCascadeSaveHandler,
}

impl Gatekeeper {
    /// Gatekeeper delegating general saves to [`StandardSaveHandler`].
    pub fn new(ctx: PublishContext) -> Self {
        let standard = Arc::new(StandardSaveHandler::new(ctx.clone()));
        Self::with_standard(ctx, standard)
    }

    /// Gatekeeper delegating general saves to a host-provided handler.
    pub fn with_standard(ctx: PublishContext, standard: Arc<dyn SaveHandler>) -> Self {
        Self {
            standard,
            no_cascade: NoCascadeSaveHandler::new(ctx),
        }
    }

    async fn route(&self, event: &SaveEvent, class: ChangeClass) -> Result<SaveOutcome> {
        match class {
            ChangeClass::LockToggleOnly => {
                debug!(item = %event.item.id, "lock/unlock only, publish queue untouched");
                Ok(SaveOutcome::skipped(SkipReason::LockToggle))
            }
            ChangeClass::WorkflowStateOnly => {
                debug!(item = %event.item.id, "workflow state changed, clones not queued");
                self.no_cascade.handle(event).await
            }
            ChangeClass::General => self.standard.handle(event).await,
        }
    }
}

#[async_trait]
impl SaveHandler for Gatekeeper {
    async fn handle(&self, event: &SaveEvent) -> Result<SaveOutcome> {
        let class = classify(&event.changes.fields);
        metrics::saves_classified().add(1, &[KeyValue::new("class", class.as_str())]);

        record_class(&Span::current(), class);
        self.route(event, class).await
    }
}
