//! Save-handling span helpers.

use tracing::Span;

use crate::classify::ChangeClass;
use crate::model::SaveEvent;

/// Start a span covering one dispatched save event.
///
/// `save.class` is declared empty and filled in by [`record_class`] once the
/// gatekeeper has classified the change set.
pub fn start_save_span(event: &SaveEvent) -> Span {
    tracing::info_span!(
        "save.handle",
        "save.item" = %event.item.id,
        "save.database" = %event.item.database,
        "save.language" = %event.item.language,
        "save.fields" = event.changes.fields.len(),
        "save.class" = tracing::field::Empty,
    )
}

pub fn record_class(span: &Span, class: ChangeClass) {
    span.record("save.class", class.as_str());
}
