//! Shared test harness: an in-memory backed service with seeded workbaskets,
//! classifications and permissions, plus task builders.

#![allow(dead_code)] // not every suite uses every helper

use std::sync::Arc;

use taskdesk_core::config::TaskdeskConfig;
use taskdesk_core::context::{RequestContext, Role};
use taskdesk_core::models::{
    ClassificationSummary, ObjectReference, Task, WorkbasketPermission, WorkbasketSummary,
};
use taskdesk_core::service::TaskService;
use taskdesk_core::storage::InMemoryBackend;

pub const WORKBASKET_ID: &str = "WBI:000000000000000000000000000000000001";
pub const CLASSIFICATION_ID: &str = "CLI:000000000000000000000000000000000001";
pub const CLASSIFICATION_KEY: &str = "L10000";
pub const DOMAIN: &str = "DOMAIN_A";

pub struct TestHarness {
    pub backend: InMemoryBackend,
    pub service: TaskService,
}

impl TestHarness {
    /// Backend with one workbasket and one classification; `alice` and `bob`
    /// hold read+append on the workbasket.
    pub fn new() -> Self {
        Self::with_config(TaskdeskConfig::default())
    }

    pub fn with_config(config: TaskdeskConfig) -> Self {
        let backend = InMemoryBackend::new();
        backend.add_workbasket(WorkbasketSummary::new(WORKBASKET_ID, "inbox", DOMAIN));
        backend.add_classification(ClassificationSummary {
            id: CLASSIFICATION_ID.to_string(),
            key: CLASSIFICATION_KEY.to_string(),
            domain: DOMAIN.to_string(),
            name: Some("manual check".to_string()),
            priority: 2,
            ..ClassificationSummary::default()
        });
        for user in ["alice", "bob"] {
            backend.grant(
                WORKBASKET_ID,
                user,
                [WorkbasketPermission::Read, WorkbasketPermission::Append],
            );
        }

        let service = TaskService::new(
            Arc::new(backend.store()),
            Arc::new(backend.workbasket_service()),
            Arc::new(backend.classification_service()),
            config,
        );
        Self { backend, service }
    }

    /// Create a READY task through the service, as `alice`.
    pub async fn create_ready_task(&self) -> Task {
        self.service
            .create_task(&user("alice"), new_task())
            .await
            .expect("task creation failed")
    }

    /// Create a task and claim it for the given user.
    pub async fn create_claimed_task(&self, owner: &str) -> Task {
        let task = self.create_ready_task().await;
        self.service
            .claim(&user(owner), &task.id)
            .await
            .expect("claim failed")
    }

    /// Create a task and drive it into the given end state.
    pub async fn create_completed_task(&self, owner: &str) -> Task {
        let task = self.create_claimed_task(owner).await;
        self.service
            .complete_task(&user(owner), &task.id)
            .await
            .expect("complete failed")
    }

    pub async fn create_cancelled_task(&self) -> Task {
        let task = self.create_ready_task().await;
        self.service
            .cancel_task(&user("alice"), &task.id)
            .await
            .expect("cancel failed")
    }

    pub async fn create_terminated_task(&self) -> Task {
        let task = self.create_ready_task().await;
        self.service
            .terminate_task(&admin("root"), &task.id)
            .await
            .expect("terminate failed")
    }
}

/// Unsaved task pointed at the seeded workbasket and classification.
pub fn new_task() -> Task {
    let mut task = Task::new(WORKBASKET_ID);
    task.classification_summary.key = CLASSIFICATION_KEY.to_string();
    task.primary_obj_ref = Some(object_reference());
    task
}

pub fn object_reference() -> ObjectReference {
    ObjectReference {
        company: "acme".to_string(),
        system: "erp".to_string(),
        system_instance: "erp-1".to_string(),
        object_type: "invoice".to_string(),
        value: "INV-42".to_string(),
    }
}

pub fn user(user_id: &str) -> RequestContext {
    RequestContext::for_user(user_id)
}

pub fn admin(user_id: &str) -> RequestContext {
    RequestContext::for_user(user_id).with_role(Role::Admin)
}

pub fn task_admin(user_id: &str) -> RequestContext {
    RequestContext::for_user(user_id).with_role(Role::TaskAdmin)
}
