//! Integration tests for the gatekeeper and its save handlers.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::*;
use publish_gatekeeper::engine::*;
use publish_gatekeeper::error::{Error, Result};
use publish_gatekeeper::host::BulkUpdateScope;
use publish_gatekeeper::model::*;
use tokio::sync::oneshot;

fn queued(outcome: SaveOutcome) -> QueueReport {
    match outcome {
        SaveOutcome::Queued(report) => report,
        SaveOutcome::Skipped(reason) => panic!("expected Queued, got Skipped({reason:?})"),
    }
}

fn en() -> LanguageScope {
    LanguageScope::Specific(Language::new("en").unwrap())
}

// ---------------------------------------------------------------------------
// Lock toggles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lock_toggle_produces_no_entry() {
    let fx = Fixture::new();
    let items = fx.template_with_usages();
    let gatekeeper = Gatekeeper::new(fx.context());

    let event = save_event(
        items.standard_values_item(),
        lock_toggle(),
        false,
    );
    let outcome = gatekeeper.handle(&event).await.unwrap();

    assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::LockToggle));
    assert_eq!(fx.queue.calls(), 0);
    assert_eq!(fx.smart.calls(), 0);
}

#[tokio::test]
async fn lock_toggle_with_extra_field_queues_normally() {
    let fx = Fixture::new();
    let gatekeeper = Gatekeeper::new(fx.context());

    let mut fields = lock_toggle();
    fields.insert(FieldChange::versioned(content_field()));
    let event = save_event(saved_item(ItemId::new(), "Home"), fields, false);

    let report = queued(gatekeeper.handle(&event).await.unwrap());
    assert_eq!(report.entries.len(), 1);
    assert_eq!(fx.queue.len(), 1);
}

// ---------------------------------------------------------------------------
// Workflow-state moves
// ---------------------------------------------------------------------------

#[tokio::test]
async fn workflow_move_queues_one_entry_and_no_clones() {
    let fx = Fixture::new();
    let items = fx.template_with_usages();
    let gatekeeper = Gatekeeper::new(fx.context());

    let event = save_event(
        items.standard_values_item(),
        workflow_move(),
        false,
    );
    let report = queued(gatekeeper.handle(&event).await.unwrap());

    assert_eq!(report.entries.len(), 1);
    let entries = fx.queue.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].item_id, items.standard_values);
    assert_eq!(entries[0].language, en());
    assert!(entries.iter().all(|e| e.item_id != items.clone));
}

#[tokio::test]
async fn workflow_move_with_shared_state_field_queues_all_languages() {
    let fx = Fixture::new();
    let gatekeeper = Gatekeeper::new(fx.context());

    let fields = FieldChangeSet::new()
        .with(FieldChange::shared(fields::WORKFLOW_STATE))
        .with(FieldChange::versioned(fields::REVISION))
        .with(FieldChange::versioned(fields::UPDATED))
        .with(FieldChange::versioned(fields::UPDATED_BY));
    let event = save_event(saved_item(ItemId::new(), "Home"), fields, false);

    queued(gatekeeper.handle(&event).await.unwrap());

    let entries = fx.queue.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].language, LanguageScope::All);
    assert_eq!(entries[0].action, ItemUpdateType::Saved);
    assert_eq!(entries[0].timestamp, updated_at());
}

#[tokio::test]
async fn workflow_move_is_queued_while_publishing() {
    let fx = Fixture::new();
    fx.flags.set_publishing(true);
    let gatekeeper = Gatekeeper::new(fx.context());

    let item = ItemId::new();
    let event = save_event(saved_item(item, "Home"), workflow_move(), false);
    queued(gatekeeper.handle(&event).await.unwrap());

    let entries = fx.queue.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].item_id, item);
    assert_eq!(entries[0].language, en());
}

#[tokio::test]
async fn workflow_move_in_bulk_update_queues_nothing() {
    let fx = Fixture::new();
    let gatekeeper = Gatekeeper::new(fx.context());

    let event = save_event(saved_item(ItemId::new(), "Home"), workflow_move(), false);
    let outcome = BulkUpdateScope::run(gatekeeper.handle(&event)).await.unwrap();

    assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::BulkUpdate));
    assert!(fx.queue.is_empty());
}

// ---------------------------------------------------------------------------
// No-cascade handler scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn property_only_change_queues_all_languages_now() {
    let fx = Fixture::new();
    let handler = NoCascadeSaveHandler::new(fx.context());

    let before = Utc::now();
    let event = save_event(saved_item(ItemId::new(), "Home"), FieldChangeSet::new(), true);
    queued(handler.handle(&event).await.unwrap());
    let after = Utc::now();

    let entries = fx.queue.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].language, LanguageScope::All);
    assert_eq!(entries[0].action, ItemUpdateType::Saved);
    assert!(entries[0].timestamp >= before && entries[0].timestamp <= after);
}

#[tokio::test]
async fn shared_field_change_queues_all_languages() {
    let fx = Fixture::new();
    let handler = NoCascadeSaveHandler::new(fx.context());

    let fields = FieldChangeSet::new()
        .with(FieldChange::shared(content_field()))
        .with(FieldChange::versioned(fields::REVISION))
        .with(FieldChange::versioned(fields::UPDATED))
        .with(FieldChange::versioned(fields::UPDATED_BY));
    let event = save_event(saved_item(ItemId::new(), "Home"), fields, false);
    queued(handler.handle(&event).await.unwrap());

    let entries = fx.queue.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].language, LanguageScope::All);
}

#[tokio::test]
async fn language_field_change_is_forced_past_publishing_guard() {
    let fx = Fixture::new();
    fx.flags.set_publishing(true);
    let handler = NoCascadeSaveHandler::new(fx.context());

    let event = save_event(
        saved_item(ItemId::new(), "Home"),
        versioned(&[content_field()]),
        false,
    );
    queued(handler.handle(&event).await.unwrap());

    let entries = fx.queue.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].language, en());
    assert_eq!(entries[0].timestamp, updated_at());
}

// ---------------------------------------------------------------------------
// General path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn standard_values_save_cascades_to_clones_only() {
    let fx = Fixture::new();
    let items = fx.template_with_usages();
    let gatekeeper = Gatekeeper::new(fx.context());

    let event = save_event(
        items.standard_values_item(),
        versioned(&[content_field()]),
        false,
    );
    let report = queued(gatekeeper.handle(&event).await.unwrap());

    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.created, 2);

    let entries = fx.queue.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].item_id, items.standard_values);

    let clone_entry = entries
        .iter()
        .find(|e| e.item_id == items.clone)
        .expect("clone should be queued");
    assert_eq!(clone_entry.language, LanguageScope::Default);
    assert_eq!(clone_entry.action, ItemUpdateType::Saved);
    assert_eq!(clone_entry.timestamp, updated_at());

    assert!(entries.iter().all(|e| e.item_id != items.plain));
    assert!(entries.iter().all(|e| e.item_id != items.template));
}

#[tokio::test]
async fn standard_values_missing_from_index_still_cascades() {
    let fx = Fixture::new();
    let items = fx.template_with_usages();
    fx.index.remove("master", items.standard_values);
    let gatekeeper = Gatekeeper::new(fx.context());

    let event = save_event(
        items.standard_values_item(),
        versioned(&[content_field()]),
        false,
    );
    let report = queued(gatekeeper.handle(&event).await.unwrap());

    assert_eq!(report.entries.len(), 2);
    let queued_ids: Vec<ItemId> = fx.queue.entries().iter().map(|e| e.item_id).collect();
    assert_eq!(queued_ids, vec![items.standard_values, items.clone]);
}

#[tokio::test]
async fn clones_in_another_database_are_not_queued() {
    let fx = Fixture::new();
    let items = fx.template_with_usages();
    let gatekeeper = Gatekeeper::new(fx.context());

    let mut item = items.standard_values_item();
    item.database = "web".to_string();
    let event = save_event(item, versioned(&[content_field()]), false);
    let report = queued(gatekeeper.handle(&event).await.unwrap());

    assert_eq!(report.entries.len(), 1);
    assert_eq!(fx.queue.entries()[0].database, "web");
}

#[tokio::test]
async fn standard_values_without_parent_cascades_nothing() {
    let fx = Fixture::new();
    let orphan = ItemId::new();
    fx.index
        .insert(record(orphan, "__standard values", None, None, false));
    let gatekeeper = Gatekeeper::new(fx.context());

    let event = save_event(
        saved_item(orphan, "__standard values"),
        versioned(&[content_field()]),
        false,
    );
    let report = queued(gatekeeper.handle(&event).await.unwrap());

    assert_eq!(report.entries.len(), 1);
    assert_eq!(fx.queue.len(), 1);
}

#[tokio::test]
async fn general_language_change_is_guarded_while_publishing() {
    let fx = Fixture::new();
    fx.flags.set_publishing(true);
    let gatekeeper = Gatekeeper::new(fx.context());

    let event = save_event(
        saved_item(ItemId::new(), "Home"),
        versioned(&[content_field()]),
        false,
    );
    let report = queued(gatekeeper.handle(&event).await.unwrap());

    assert!(report.entries.is_empty());
    assert_eq!(fx.queue.calls(), 0);
    assert_eq!(fx.smart.calls(), 1);
}

#[tokio::test]
async fn general_save_delegates_to_host_standard_handler() {
    struct CountingHandler(AtomicUsize);

    #[async_trait]
    impl SaveHandler for CountingHandler {
        async fn handle(&self, _event: &SaveEvent) -> Result<SaveOutcome> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(SaveOutcome::Queued(QueueReport::default()))
        }
    }

    let fx = Fixture::new();
    let standard = Arc::new(CountingHandler(AtomicUsize::new(0)));
    let gatekeeper = Gatekeeper::with_standard(fx.context(), standard.clone());

    let item = saved_item(ItemId::new(), "Home");
    gatekeeper
        .handle(&save_event(item.clone(), versioned(&[content_field()]), false))
        .await
        .unwrap();
    gatekeeper
        .handle(&save_event(item.clone(), workflow_move(), false))
        .await
        .unwrap();
    gatekeeper
        .handle(&save_event(item, lock_toggle(), false))
        .await
        .unwrap();

    assert_eq!(standard.0.load(Ordering::SeqCst), 1);
    assert_eq!(fx.queue.len(), 1);
}

// ---------------------------------------------------------------------------
// Cross-cutting properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_update_suppresses_every_class() {
    let fx = Fixture::new();
    let items = fx.template_with_usages();
    let gatekeeper = Gatekeeper::new(fx.context());

    BulkUpdateScope::run(async {
        for fields in [
            lock_toggle(),
            workflow_move(),
            versioned(&[content_field()]),
            FieldChangeSet::new(),
        ] {
            let event = save_event(items.standard_values_item(), fields, true);
            let outcome = gatekeeper.handle(&event).await.unwrap();
            assert!(outcome.entries().is_empty());
        }
    })
    .await;

    assert_eq!(fx.queue.calls(), 0);
}

#[tokio::test]
async fn bulk_update_in_one_task_does_not_silence_another() {
    let fx = Fixture::new();
    let gatekeeper = Arc::new(Gatekeeper::new(fx.context()));
    let (entered_tx, entered_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let bulk = {
        let gatekeeper = gatekeeper.clone();
        tokio::spawn(BulkUpdateScope::run(async move {
            let event = save_event(
                saved_item(ItemId::new(), "Imported"),
                versioned(&[content_field()]),
                false,
            );
            let outcome = gatekeeper.handle(&event).await.unwrap();
            entered_tx.send(()).unwrap();
            release_rx.await.unwrap();
            outcome
        }))
    };

    // The bulk task is parked inside its scope while this save runs.
    entered_rx.await.unwrap();
    let home = ItemId::new();
    let event = save_event(saved_item(home, "Home"), versioned(&[content_field()]), false);
    let report = queued(gatekeeper.handle(&event).await.unwrap());
    assert_eq!(report.entries.len(), 1);

    release_tx.send(()).unwrap();
    let bulk_outcome = bulk.await.unwrap();
    assert_eq!(bulk_outcome, SaveOutcome::Skipped(SkipReason::BulkUpdate));

    let entries = fx.queue.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].item_id, home);
}

#[tokio::test]
async fn handling_the_same_save_twice_stores_one_entry() {
    let fx = Fixture::new();
    let gatekeeper = Gatekeeper::new(fx.context());

    let event = save_event(saved_item(ItemId::new(), "Home"), workflow_move(), false);
    let first = queued(gatekeeper.handle(&event).await.unwrap());
    let second = queued(gatekeeper.handle(&event).await.unwrap());

    assert_eq!(first.entries, second.entries);
    assert_eq!(first.created, 1);
    assert_eq!(second.created, 0);
    assert_eq!(fx.queue.len(), 1);
    assert_eq!(fx.queue.calls(), 2);
}

#[tokio::test]
async fn smart_publish_is_consulted_after_queueing() {
    let fx = Fixture::new();
    let gatekeeper = Gatekeeper::new(fx.context());
    let item = saved_item(ItemId::new(), "Home");

    gatekeeper
        .handle(&save_event(item.clone(), workflow_move(), false))
        .await
        .unwrap();
    gatekeeper
        .handle(&save_event(item, versioned(&[content_field()]), false))
        .await
        .unwrap();

    assert_eq!(fx.smart.calls(), 2);
}

#[tokio::test]
async fn missing_database_is_rejected_before_store_call() {
    let fx = Fixture::new();
    let gatekeeper = Gatekeeper::new(fx.context());

    let mut item = saved_item(ItemId::new(), "Home");
    item.database = String::new();
    let result = gatekeeper
        .handle(&save_event(item, workflow_move(), false))
        .await;

    assert!(matches!(
        result,
        Err(Error::InvalidArgument { name: "database", .. })
    ));
    assert_eq!(fx.queue.calls(), 0);
}
