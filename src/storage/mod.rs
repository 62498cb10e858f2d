//! External collaborator interfaces.
//!
//! The lifecycle core does not decide how tasks are persisted: it talks to a
//! [`TaskStore`] plus workbasket and classification lookup services through
//! these traits. A batch of N ids must cost O(few queries), not O(N) round
//! trips, so the store exposes bulk primitives (existence lookup,
//! authorization filter, update by id list).

pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::context::RequestContext;
use crate::error::StoreResult;
use crate::models::{
    Attachment, AttachmentSummary, ClassificationSummary, CustomField, MinimalTaskSummary, Task,
    TaskSummary, WorkbasketPermission, WorkbasketSummary,
};
use crate::state_machine::CallbackState;

pub use memory::{
    InMemoryBackend, InMemoryClassificationService, InMemoryStore, InMemoryWorkbasketService,
};

/// Persistent task store. All mutations are by-value: the store writes the
/// submitted entity/fields and never applies business rules itself.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: &Task) -> StoreResult<()>;

    async fn update(&self, task: &Task) -> StoreResult<()>;

    async fn delete(&self, task_id: &str) -> StoreResult<()>;

    async fn delete_multiple(&self, task_ids: &[String]) -> StoreResult<()>;

    async fn find_by_id(&self, task_id: &str) -> StoreResult<Option<Task>>;

    /// Bulk existence lookup by task ids or external ids (exactly one of the
    /// two is expected to be non-empty).
    async fn find_existing_tasks(
        &self,
        task_ids: &[String],
        external_ids: &[String],
    ) -> StoreResult<Vec<MinimalTaskSummary>>;

    /// Summaries for the given ids, unaugmented.
    async fn find_summaries_by_ids(&self, task_ids: &[String]) -> StoreResult<Vec<TaskSummary>>;

    /// Of the given ids, those the access ids have no read permission for.
    async fn filter_task_ids_not_authorized_for(
        &self,
        task_ids: &[String],
        access_ids: &[String],
    ) -> StoreResult<Vec<String>>;

    /// Bulk write of the completed-state fields (state, owner, completed,
    /// modified) taken from `reference` to every id in the list.
    async fn update_completed(
        &self,
        task_ids: &[String],
        reference: &TaskSummary,
    ) -> StoreResult<u64>;

    /// Bulk write of the claim fields (claimed, read) taken from `reference`,
    /// restricted to ids whose claim was set as part of the same operation.
    async fn update_claimed(
        &self,
        task_ids: &[String],
        reference: &TaskSummary,
    ) -> StoreResult<u64>;

    /// Set owner and modified on tasks currently in state READY; returns the
    /// number of rows actually changed.
    async fn set_owner_of_tasks(
        &self,
        owner: &str,
        task_ids: &[String],
        modified: DateTime<Utc>,
    ) -> StoreResult<u64>;

    /// Bulk callback-state write keyed by external id.
    async fn set_callback_state_multiple(
        &self,
        external_ids: &[String],
        state: CallbackState,
    ) -> StoreResult<u64>;

    /// Bulk custom-field write; only the submitted fields change.
    async fn update_custom_fields(
        &self,
        task_ids: &[String],
        fields: &BTreeMap<CustomField, String>,
        modified: DateTime<Utc>,
    ) -> StoreResult<u64>;

    async fn attachments_by_task_id(&self, task_id: &str) -> StoreResult<Vec<Attachment>>;

    async fn attachment_summaries_by_task_ids(
        &self,
        task_ids: &[String],
    ) -> StoreResult<Vec<AttachmentSummary>>;

    async fn delete_attachments_by_task_ids(&self, task_ids: &[String]) -> StoreResult<()>;

    /// Drop stored history events for the given tasks. No-op for stores
    /// without a history table.
    async fn delete_history_events(&self, task_ids: &[String]) -> StoreResult<()>;
}

/// Workbasket lookup and authorization collaborator.
#[async_trait]
pub trait WorkbasketService: Send + Sync {
    async fn workbasket_by_id(&self, workbasket_id: &str) -> StoreResult<Option<WorkbasketSummary>>;

    async fn workbasket_by_key(
        &self,
        key: &str,
        domain: &str,
    ) -> StoreResult<Option<WorkbasketSummary>>;

    /// True if the caller holds the permission on the workbasket. Admin and
    /// task-admin roles pass unconditionally.
    async fn is_authorized(
        &self,
        workbasket_id: &str,
        permission: WorkbasketPermission,
        ctx: &RequestContext,
    ) -> StoreResult<bool>;

    /// Of the given workbasket ids, the summaries the caller may read. Used
    /// to augment task summaries in bulk.
    async fn visible_workbaskets(
        &self,
        workbasket_ids: &[String],
        ctx: &RequestContext,
    ) -> StoreResult<Vec<WorkbasketSummary>>;
}

/// Classification lookup collaborator.
#[async_trait]
pub trait ClassificationService: Send + Sync {
    async fn classification_by_key(
        &self,
        key: &str,
        domain: &str,
    ) -> StoreResult<Option<ClassificationSummary>>;

    async fn classifications_by_ids(
        &self,
        classification_ids: &[String],
    ) -> StoreResult<Vec<ClassificationSummary>>;
}
