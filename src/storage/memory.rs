//! In-process collaborator implementations backed by `parking_lot` maps.
//!
//! Used by the test suites and by embedders that want the lifecycle rules
//! without a persistent backend. One [`InMemoryBackend`] hands out store,
//! workbasket and classification handles sharing the same state.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{ClassificationService, TaskStore, WorkbasketService};
use crate::context::{RequestContext, Role};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Attachment, AttachmentSummary, ClassificationSummary, CustomField, MinimalTaskSummary, Task,
    TaskSummary, WorkbasketPermission, WorkbasketSummary,
};
use crate::state_machine::{CallbackState, TaskState};

#[derive(Default)]
struct Inner {
    tasks: HashMap<String, Task>,
    workbaskets: HashMap<String, WorkbasketSummary>,
    classifications: HashMap<String, ClassificationSummary>,
    // (workbasket id, access id) -> granted permissions
    acl: HashMap<(String, String), HashSet<WorkbasketPermission>>,
}

impl Inner {
    fn minimal(task: &Task) -> MinimalTaskSummary {
        MinimalTaskSummary {
            id: task.id.clone(),
            external_id: task.external_id.clone(),
            workbasket_id: task.workbasket_summary.id.clone(),
            state: task.state,
            owner: task.owner.clone(),
            callback_state: task.callback_state,
        }
    }

    fn has_permission(
        &self,
        workbasket_id: &str,
        access_ids: &[String],
        permission: WorkbasketPermission,
    ) -> bool {
        access_ids.iter().any(|access_id| {
            self.acl
                .get(&(workbasket_id.to_string(), access_id.clone()))
                .is_some_and(|perms| perms.contains(&permission))
        })
    }
}

/// Shared in-memory state behind the three collaborator handles.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> InMemoryStore {
        InMemoryStore {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn workbasket_service(&self) -> InMemoryWorkbasketService {
        InMemoryWorkbasketService {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn classification_service(&self) -> InMemoryClassificationService {
        InMemoryClassificationService {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn add_workbasket(&self, workbasket: WorkbasketSummary) {
        self.inner
            .write()
            .workbaskets
            .insert(workbasket.id.clone(), workbasket);
    }

    pub fn add_classification(&self, classification: ClassificationSummary) {
        self.inner
            .write()
            .classifications
            .insert(classification.id.clone(), classification);
    }

    /// Grant permissions on a workbasket to an access id.
    pub fn grant(
        &self,
        workbasket_id: impl Into<String>,
        access_id: impl Into<String>,
        permissions: impl IntoIterator<Item = WorkbasketPermission>,
    ) {
        self.inner
            .write()
            .acl
            .entry((workbasket_id.into(), access_id.into()))
            .or_default()
            .extend(permissions);
    }

    /// Direct read access for test assertions.
    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.inner.read().tasks.get(task_id).cloned()
    }
}

/// [`TaskStore`] handle of an [`InMemoryBackend`].
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn insert(&self, task: &Task) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if inner
            .tasks
            .values()
            .any(|t| t.external_id == task.external_id)
        {
            return Err(StoreError::DuplicateExternalId {
                external_id: task.external_id.clone(),
            });
        }
        if inner.tasks.contains_key(&task.id) {
            return Err(StoreError::Backend(format!(
                "task {} already exists",
                task.id
            )));
        }
        inner.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if !inner.tasks.contains_key(&task.id) {
            return Err(StoreError::Backend(format!("task {} not found", task.id)));
        }
        inner.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn delete(&self, task_id: &str) -> StoreResult<()> {
        self.inner.write().tasks.remove(task_id);
        Ok(())
    }

    async fn delete_multiple(&self, task_ids: &[String]) -> StoreResult<()> {
        let mut inner = self.inner.write();
        for task_id in task_ids {
            inner.tasks.remove(task_id);
        }
        Ok(())
    }

    async fn find_by_id(&self, task_id: &str) -> StoreResult<Option<Task>> {
        Ok(self.inner.read().tasks.get(task_id).cloned())
    }

    async fn find_existing_tasks(
        &self,
        task_ids: &[String],
        external_ids: &[String],
    ) -> StoreResult<Vec<MinimalTaskSummary>> {
        let inner = self.inner.read();
        let summaries = inner
            .tasks
            .values()
            .filter(|t| {
                task_ids.contains(&t.id) || external_ids.contains(&t.external_id)
            })
            .map(Inner::minimal)
            .collect();
        Ok(summaries)
    }

    async fn find_summaries_by_ids(&self, task_ids: &[String]) -> StoreResult<Vec<TaskSummary>> {
        let inner = self.inner.read();
        Ok(inner
            .tasks
            .values()
            .filter(|t| task_ids.contains(&t.id))
            .map(Task::as_summary)
            .collect())
    }

    async fn filter_task_ids_not_authorized_for(
        &self,
        task_ids: &[String],
        access_ids: &[String],
    ) -> StoreResult<Vec<String>> {
        let inner = self.inner.read();
        let unauthorized = task_ids
            .iter()
            .filter(|task_id| {
                inner.tasks.get(*task_id).is_some_and(|task| {
                    !inner.has_permission(
                        &task.workbasket_summary.id,
                        access_ids,
                        WorkbasketPermission::Read,
                    )
                })
            })
            .cloned()
            .collect();
        Ok(unauthorized)
    }

    async fn update_completed(
        &self,
        task_ids: &[String],
        reference: &TaskSummary,
    ) -> StoreResult<u64> {
        let mut inner = self.inner.write();
        let mut affected = 0;
        for task_id in task_ids {
            if let Some(task) = inner.tasks.get_mut(task_id) {
                task.state = reference.state;
                task.owner = reference.owner.clone();
                task.completed = reference.completed;
                task.modified = reference.modified;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn update_claimed(
        &self,
        task_ids: &[String],
        reference: &TaskSummary,
    ) -> StoreResult<u64> {
        let mut inner = self.inner.write();
        let mut affected = 0;
        for task_id in task_ids {
            if let Some(task) = inner.tasks.get_mut(task_id) {
                task.claimed = reference.claimed;
                task.read = reference.read;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn set_owner_of_tasks(
        &self,
        owner: &str,
        task_ids: &[String],
        modified: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let mut inner = self.inner.write();
        let mut affected = 0;
        for task_id in task_ids {
            if let Some(task) = inner.tasks.get_mut(task_id) {
                if task.state == TaskState::Ready {
                    task.owner = Some(owner.to_string());
                    task.modified = Some(modified);
                    affected += 1;
                }
            }
        }
        Ok(affected)
    }

    async fn set_callback_state_multiple(
        &self,
        external_ids: &[String],
        state: CallbackState,
    ) -> StoreResult<u64> {
        let mut inner = self.inner.write();
        let mut affected = 0;
        for task in inner.tasks.values_mut() {
            if external_ids.contains(&task.external_id) {
                task.callback_state = state;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn update_custom_fields(
        &self,
        task_ids: &[String],
        fields: &BTreeMap<CustomField, String>,
        modified: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let mut inner = self.inner.write();
        let mut affected = 0;
        for task_id in task_ids {
            if let Some(task) = inner.tasks.get_mut(task_id) {
                for (field, value) in fields {
                    task.custom_fields.insert(*field, value.clone());
                }
                task.modified = Some(modified);
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn attachments_by_task_id(&self, task_id: &str) -> StoreResult<Vec<Attachment>> {
        let inner = self.inner.read();
        Ok(inner
            .tasks
            .get(task_id)
            .map(|t| t.attachments.clone())
            .unwrap_or_default())
    }

    async fn attachment_summaries_by_task_ids(
        &self,
        task_ids: &[String],
    ) -> StoreResult<Vec<AttachmentSummary>> {
        let inner = self.inner.read();
        Ok(inner
            .tasks
            .values()
            .filter(|t| task_ids.contains(&t.id))
            .flat_map(|t| t.attachments.iter().map(Attachment::as_summary))
            .collect())
    }

    async fn delete_attachments_by_task_ids(&self, task_ids: &[String]) -> StoreResult<()> {
        let mut inner = self.inner.write();
        for task_id in task_ids {
            if let Some(task) = inner.tasks.get_mut(task_id) {
                task.attachments.clear();
            }
        }
        Ok(())
    }

    async fn delete_history_events(&self, _task_ids: &[String]) -> StoreResult<()> {
        // events are broadcast only, nothing stored here
        Ok(())
    }
}

/// [`WorkbasketService`] handle of an [`InMemoryBackend`].
#[derive(Clone)]
pub struct InMemoryWorkbasketService {
    inner: Arc<RwLock<Inner>>,
}

#[async_trait]
impl WorkbasketService for InMemoryWorkbasketService {
    async fn workbasket_by_id(
        &self,
        workbasket_id: &str,
    ) -> StoreResult<Option<WorkbasketSummary>> {
        Ok(self.inner.read().workbaskets.get(workbasket_id).cloned())
    }

    async fn workbasket_by_key(
        &self,
        key: &str,
        domain: &str,
    ) -> StoreResult<Option<WorkbasketSummary>> {
        Ok(self
            .inner
            .read()
            .workbaskets
            .values()
            .find(|wb| wb.key == key && wb.domain == domain)
            .cloned())
    }

    async fn is_authorized(
        &self,
        workbasket_id: &str,
        permission: WorkbasketPermission,
        ctx: &RequestContext,
    ) -> StoreResult<bool> {
        if ctx.is_in_any_role(&[Role::Admin, Role::TaskAdmin]) {
            return Ok(true);
        }
        Ok(self
            .inner
            .read()
            .has_permission(workbasket_id, ctx.access_ids(), permission))
    }

    async fn visible_workbaskets(
        &self,
        workbasket_ids: &[String],
        ctx: &RequestContext,
    ) -> StoreResult<Vec<WorkbasketSummary>> {
        let admin = ctx.is_in_any_role(&[Role::Admin, Role::TaskAdmin]);
        let inner = self.inner.read();
        Ok(workbasket_ids
            .iter()
            .filter_map(|id| inner.workbaskets.get(id))
            .filter(|wb| {
                admin || inner.has_permission(&wb.id, ctx.access_ids(), WorkbasketPermission::Read)
            })
            .cloned()
            .collect())
    }
}

/// [`ClassificationService`] handle of an [`InMemoryBackend`].
#[derive(Clone)]
pub struct InMemoryClassificationService {
    inner: Arc<RwLock<Inner>>,
}

#[async_trait]
impl ClassificationService for InMemoryClassificationService {
    async fn classification_by_key(
        &self,
        key: &str,
        domain: &str,
    ) -> StoreResult<Option<ClassificationSummary>> {
        Ok(self
            .inner
            .read()
            .classifications
            .values()
            .find(|c| c.key == key && c.domain == domain)
            .cloned())
    }

    async fn classifications_by_ids(
        &self,
        classification_ids: &[String],
    ) -> StoreResult<Vec<ClassificationSummary>> {
        let inner = self.inner.read();
        Ok(classification_ids
            .iter()
            .filter_map(|id| inner.classifications.get(id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with(id: &str, external_id: &str, state: TaskState) -> Task {
        let mut task = Task::new("WBI:1");
        task.id = id.to_string();
        task.external_id = external_id.to_string();
        task.state = state;
        task
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_external_id() {
        let backend = InMemoryBackend::new();
        let store = backend.store();
        store
            .insert(&task_with("TKI:1", "ETI:1", TaskState::Ready))
            .await
            .unwrap();
        let err = store
            .insert(&task_with("TKI:2", "ETI:1", TaskState::Ready))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateExternalId { .. }));
    }

    #[tokio::test]
    async fn test_set_owner_only_touches_ready_tasks() {
        let backend = InMemoryBackend::new();
        let store = backend.store();
        store
            .insert(&task_with("TKI:1", "ETI:1", TaskState::Ready))
            .await
            .unwrap();
        store
            .insert(&task_with("TKI:2", "ETI:2", TaskState::Claimed))
            .await
            .unwrap();

        let ids = vec!["TKI:1".to_string(), "TKI:2".to_string()];
        let affected = store
            .set_owner_of_tasks("bob", &ids, Utc::now())
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(backend.task("TKI:1").unwrap().owner.as_deref(), Some("bob"));
        assert_eq!(backend.task("TKI:2").unwrap().owner, None);
    }

    #[tokio::test]
    async fn test_acl_filters_unauthorized_task_ids() {
        let backend = InMemoryBackend::new();
        backend.add_workbasket(WorkbasketSummary::new("WBI:1", "wb-one", "DOMAIN_A"));
        backend.grant("WBI:1", "alice", [WorkbasketPermission::Read]);
        let store = backend.store();
        store
            .insert(&task_with("TKI:1", "ETI:1", TaskState::Ready))
            .await
            .unwrap();

        let ids = vec!["TKI:1".to_string()];
        let not_for_alice = store
            .filter_task_ids_not_authorized_for(&ids, &["alice".to_string()])
            .await
            .unwrap();
        assert!(not_for_alice.is_empty());

        let not_for_bob = store
            .filter_task_ids_not_authorized_for(&ids, &["bob".to_string()])
            .await
            .unwrap();
        assert_eq!(not_for_bob, ids);
    }
}
