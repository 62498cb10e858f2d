//! Creation defaults, full update with the optimistic-concurrency check, and
//! deletion with the callback rule.

mod common;

use common::{admin, new_task, user, TestHarness, CLASSIFICATION_KEY, WORKBASKET_ID};
use taskdesk_core::error::TaskError;
use taskdesk_core::models::CALLBACK_STATE_KEY;
use taskdesk_core::state_machine::{CallbackState, TaskState};

#[tokio::test]
async fn create_assigns_ids_and_defaults() {
    let harness = TestHarness::new();
    let task = harness.create_ready_task().await;

    assert!(task.id.starts_with("TKI:"));
    assert!(task.external_id.starts_with("ETI:"));
    assert_eq!(task.state, TaskState::Ready);
    assert_eq!(task.creator.as_deref(), Some("alice"));
    assert!(task.created.is_some());
    assert!(task.modified.is_some());
    assert!(task.planned.is_some());
    assert!(task.business_process_id.is_some());
    assert!(!task.read);
    assert!(!task.transferred);
    // name and priority are defaulted from the classification snapshot
    assert_eq!(task.name.as_deref(), Some("manual check"));
    assert_eq!(task.priority, 2);
    assert_eq!(task.classification_summary.key, CLASSIFICATION_KEY);
}

#[tokio::test]
async fn create_rejects_duplicate_external_id() {
    let harness = TestHarness::new();
    let mut first = new_task();
    first.external_id = "ETI:fixed".to_string();
    harness.service.create_task(&user("alice"), first).await.unwrap();

    let mut second = new_task();
    second.external_id = "ETI:fixed".to_string();
    let err = harness
        .service
        .create_task(&user("alice"), second)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn create_requires_workbasket_classification_and_object_reference() {
    let harness = TestHarness::new();

    let mut no_basket = new_task();
    no_basket.workbasket_summary = Default::default();
    let err = harness
        .service
        .create_task(&user("alice"), no_basket)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::InvalidArgument { .. }), "{err:?}");

    let mut no_classification = new_task();
    no_classification.classification_summary.key = String::new();
    let err = harness
        .service
        .create_task(&user("alice"), no_classification)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::InvalidArgument { .. }), "{err:?}");

    let mut no_obj_ref = new_task();
    no_obj_ref.primary_obj_ref = None;
    let err = harness
        .service
        .create_task(&user("alice"), no_obj_ref)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::InvalidArgument { .. }), "{err:?}");
}

#[tokio::test]
async fn create_requires_append_permission() {
    let harness = TestHarness::new();
    let err = harness
        .service
        .create_task(&user("mallory"), new_task())
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::NotAuthorized { .. }), "{err:?}");
}

#[tokio::test]
async fn create_seeds_callback_state_from_callback_info() {
    let harness = TestHarness::new();
    let mut task = new_task();
    task.callback_info.insert(
        CALLBACK_STATE_KEY.to_string(),
        "callback_processing_required".to_string(),
    );
    let task = harness.service.create_task(&user("alice"), task).await.unwrap();
    assert_eq!(task.callback_state, CallbackState::CallbackProcessingRequired);

    let mut unparsable = new_task();
    unparsable
        .callback_info
        .insert(CALLBACK_STATE_KEY.to_string(), "later".to_string());
    let err = harness
        .service
        .create_task(&user("alice"), unparsable)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::InvalidArgument { .. }), "{err:?}");
}

#[tokio::test]
async fn update_with_stale_modified_fails_and_writes_nothing() {
    let harness = TestHarness::new();
    let task = harness.create_ready_task().await;

    let mut stale = task.clone();
    stale.modified = Some(task.modified.unwrap() - chrono::Duration::seconds(10));
    stale.note = Some("late edit".to_string());

    let err = harness.service.update_task(&user("alice"), stale).await.unwrap_err();
    assert!(matches!(err, TaskError::Concurrency { .. }), "{err:?}");

    let stored = harness.backend.task(&task.id).unwrap();
    assert_eq!(stored.note, None);
    assert_eq!(stored.modified, task.modified);
}

#[tokio::test]
async fn update_accepts_a_fresh_snapshot_and_stamps_modified() {
    let harness = TestHarness::new();
    let task = harness.create_ready_task().await;

    let mut edited = task.clone();
    edited.note = Some("checked twice".to_string());
    let updated = harness.service.update_task(&user("alice"), edited).await.unwrap();

    assert_eq!(updated.note.as_deref(), Some("checked twice"));
    assert!(updated.modified > task.modified);
    assert_eq!(
        harness.backend.task(&task.id).unwrap().note.as_deref(),
        Some("checked twice")
    );
}

#[tokio::test]
async fn update_rejects_external_id_changes() {
    let harness = TestHarness::new();
    let task = harness.create_ready_task().await;

    let mut edited = task.clone();
    edited.external_id = "ETI:other".to_string();
    let err = harness.service.update_task(&user("alice"), edited).await.unwrap_err();
    assert!(matches!(err, TaskError::InvalidArgument { .. }), "{err:?}");
}

#[tokio::test]
async fn update_rejects_workbasket_changes() {
    let harness = TestHarness::new();
    let task = harness.create_ready_task().await;

    let mut edited = task.clone();
    edited.workbasket_summary.key = "another-basket".to_string();
    let err = harness.service.update_task(&user("alice"), edited).await.unwrap_err();
    assert!(matches!(err, TaskError::InvalidArgument { .. }), "{err:?}");
}

#[tokio::test]
async fn update_allows_owner_changes_only_while_ready() {
    let harness = TestHarness::new();
    let ready = harness.create_ready_task().await;

    let mut edited = ready.clone();
    edited.owner = Some("bob".to_string());
    assert!(harness.service.update_task(&user("alice"), edited).await.is_ok());

    let claimed = harness.create_claimed_task("alice").await;
    let mut edited = claimed.clone();
    edited.owner = Some("bob".to_string());
    let err = harness.service.update_task(&user("alice"), edited).await.unwrap_err();
    assert!(matches!(err, TaskError::InvalidState { .. }), "{err:?}");
}

#[tokio::test]
async fn update_events_carry_the_attribute_diff() {
    let harness = TestHarness::new();
    let task = harness.create_ready_task().await;
    let mut events = harness.service.event_publisher().subscribe();

    let mut edited = task.clone();
    edited.note = Some("diffable".to_string());
    harness.service.update_task(&user("alice"), edited).await.unwrap();

    let event = events.recv().await.unwrap();
    assert!(event.details.iter().any(|change| change.field == "note"));
}

#[tokio::test]
async fn delete_requires_admin_and_an_end_state() {
    let harness = TestHarness::new();
    let ready = harness.create_ready_task().await;

    let err = harness
        .service
        .delete_task(&user("alice"), &ready.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::NotAuthorized { .. }), "{err:?}");

    let err = harness
        .service
        .delete_task(&admin("root"), &ready.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::InvalidState { .. }), "{err:?}");

    harness
        .service
        .force_delete_task(&admin("root"), &ready.id)
        .await
        .unwrap();
    assert!(harness.backend.task(&ready.id).is_none());
}

#[tokio::test]
async fn delete_blocks_on_unprocessed_callback_until_cancelled() {
    let harness = TestHarness::new();
    let task = harness.create_claimed_task("alice").await;
    harness
        .service
        .set_callback_state_for_tasks(
            &user("alice"),
            &[task.external_id.clone()],
            CallbackState::CallbackProcessingRequired,
        )
        .await
        .unwrap();
    let completed = harness
        .service
        .complete_task(&user("alice"), &task.id)
        .await
        .unwrap();

    // COMPLETED with a pending callback is not deletable, forced or not
    for forced in [false, true] {
        let result = if forced {
            harness.service.force_delete_task(&admin("root"), &completed.id).await
        } else {
            harness.service.delete_task(&admin("root"), &completed.id).await
        };
        assert!(
            matches!(result, Err(TaskError::InvalidState { .. })),
            "forced {forced}"
        );
    }

    // once CANCELLED, the pending callback no longer blocks deletion
    let other = harness.create_ready_task().await;
    harness
        .service
        .set_callback_state_for_tasks(
            &user("alice"),
            &[other.external_id.clone()],
            CallbackState::CallbackProcessingRequired,
        )
        .await
        .unwrap();
    harness.service.cancel_task(&user("alice"), &other.id).await.unwrap();
    harness.service.delete_task(&admin("root"), &other.id).await.unwrap();
    assert!(harness.backend.task(&other.id).is_none());
}

#[tokio::test]
async fn create_with_workbasket_key_and_domain_resolves_the_basket() {
    let harness = TestHarness::new();
    let mut task = taskdesk_core::models::Task::new_with_key("inbox", common::DOMAIN);
    task.classification_summary.key = CLASSIFICATION_KEY.to_string();
    task.primary_obj_ref = Some(common::object_reference());

    let created = harness.service.create_task(&user("alice"), task).await.unwrap();
    assert_eq!(created.workbasket_summary.id, WORKBASKET_ID);
}
