//! Metric instrument factories for publish-gatekeeper.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"publish-gatekeeper"` meter.

use opentelemetry::metrics::{Counter, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("publish-gatekeeper")
}

/// Counter: save events seen by the gatekeeper.
/// Labels: `class` ("lock_toggle_only" | "workflow_state_only" | "general").
pub fn saves_classified() -> Counter<u64> {
    meter()
        .u64_counter("gatekeeper.saves.classified")
        .with_description("Number of save events classified")
        .build()
}

/// Counter: publish-queue insertion attempts.
/// Labels: `result` ("created" | "duplicate" | "guarded").
pub fn queue_insertions() -> Counter<u64> {
    meter()
        .u64_counter("gatekeeper.queue.insertions")
        .with_description("Number of publish-queue insertion attempts")
        .build()
}

/// Counter: entries issued for clones of a standard-values item.
pub fn clone_cascades() -> Counter<u64> {
    meter()
        .u64_counter("gatekeeper.queue.clone_cascades")
        .with_description("Number of queue entries cascaded to clones")
        .build()
}

/// Counter: save events skipped without touching the queue.
/// Labels: `reason`.
pub fn saves_skipped() -> Counter<u64> {
    meter()
        .u64_counter("gatekeeper.saves.skipped")
        .with_description("Number of save events that produced no queue entry")
        .build()
}
