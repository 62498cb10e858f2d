//! # Task Service
//!
//! Single-item lifecycle operations: create, read, claim, cancel-claim,
//! complete, cancel, terminate, update, delete.
//!
//! Every operation receives an explicit [`RequestContext`] and runs its
//! guards fully before any write; the first applicable error is returned and
//! no partial mutation happens. Bulk counterparts live in
//! [`bulk_ops`](super::bulk_ops).

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::config::TaskdeskConfig;
use crate::context::{RequestContext, Role};
use crate::error::{Result, TaskError};
use crate::events::{
    determine_changes, AttributeChange, EventPublisher, TaskEventKind, TaskHistoryEvent,
};
use crate::ids;
use crate::models::{
    ClassificationSummary, ObjectReference, Task, WorkbasketPermission, CALLBACK_STATE_KEY,
};
use crate::state_machine::{
    cancel_claim_actions_on_task, check_not_in_end_state, check_not_terminated_or_cancelled,
    check_preconditions_for_cancel_claim, check_preconditions_for_claim,
    check_preconditions_for_complete, claim_actions_on_task, close_actions_on_task,
    complete_actions_on_task, task_is_not_claimed, CallbackState, TaskState,
};
use crate::storage::{ClassificationService, TaskStore, WorkbasketService};

/// Lifecycle and bulk-mutation engine for tasks.
///
/// Persistence, workbasket authorization and classification lookup are
/// external collaborators passed in at construction.
pub struct TaskService {
    pub(super) store: Arc<dyn TaskStore>,
    pub(super) workbaskets: Arc<dyn WorkbasketService>,
    pub(super) classifications: Arc<dyn ClassificationService>,
    pub(super) events: EventPublisher,
    pub(super) config: TaskdeskConfig,
}

impl TaskService {
    pub fn new(
        store: Arc<dyn TaskStore>,
        workbaskets: Arc<dyn WorkbasketService>,
        classifications: Arc<dyn ClassificationService>,
        config: TaskdeskConfig,
    ) -> Self {
        let events = EventPublisher::new(config.event_channel_capacity);
        Self {
            store,
            workbaskets,
            classifications,
            events,
            config,
        }
    }

    /// The history event side channel. Subscribe before mutating to observe
    /// lifecycle events.
    pub fn event_publisher(&self) -> &EventPublisher {
        &self.events
    }

    /// Create a task in the workbasket referenced by its summary (id, or key
    /// plus domain). Assigns id and external id, applies creation defaults
    /// and persists.
    pub async fn create_task(&self, ctx: &RequestContext, task: Task) -> Result<Task> {
        debug!(external_id = %task.external_id, "entry to create_task");
        let mut task = task;

        if !task.id.is_empty() {
            return Err(TaskError::AlreadyExists {
                external_id: task.id.clone(),
            });
        }

        let workbasket = if !task.workbasket_summary.id.is_empty() {
            self.workbaskets
                .workbasket_by_id(&task.workbasket_summary.id)
                .await?
        } else if !task.workbasket_summary.key.is_empty() {
            self.workbaskets
                .workbasket_by_key(&task.workbasket_summary.key, &task.workbasket_summary.domain)
                .await?
        } else {
            return Err(TaskError::invalid_argument(
                "cannot create a task outside a workbasket",
            ));
        };
        let workbasket = workbasket.ok_or_else(|| TaskError::WorkbasketNotFound {
            workbasket: task.workbasket_summary.id.clone(),
        })?;
        if workbasket.marked_for_deletion {
            return Err(TaskError::WorkbasketNotFound {
                workbasket: workbasket.id.clone(),
            });
        }
        task.workbasket_summary = workbasket.clone();

        if !self
            .workbaskets
            .is_authorized(&workbasket.id, WorkbasketPermission::Append, ctx)
            .await?
        {
            return Err(TaskError::NotAuthorized {
                user_id: ctx.user_id().map(str::to_string),
                reason: format!("no append permission for workbasket {}", workbasket.id),
            });
        }

        // resolve by key within the workbasket's domain so the snapshot comes
        // from the right domain
        let classification_key = task.classification_summary.key.clone();
        if classification_key.is_empty() {
            return Err(TaskError::invalid_argument(
                "classification key of task must not be empty",
            ));
        }
        let classification = self
            .classifications
            .classification_by_key(&classification_key, &workbasket.domain)
            .await?
            .ok_or_else(|| TaskError::ClassificationNotFound {
                key: classification_key.clone(),
                domain: workbasket.domain.clone(),
            })?;
        task.classification_summary = classification.clone();

        ObjectReference::validate(task.primary_obj_ref.as_ref(), "primary object reference")?;
        self.apply_creation_defaults(&mut task, ctx, &classification)?;
        set_callback_state_on_creation(&mut task)?;

        self.store.insert(&task).await?;
        info!(task_id = %task.id, user_id = ?ctx.user_id(), "task created");

        let details = determine_changes(&Task::default(), &task);
        self.publish_event(TaskEventKind::Created, &task, ctx, details);
        Ok(task)
    }

    /// Load a task with its workbasket, classification and attachment data
    /// attached. Fails with `NotAuthorized` when the caller has no read
    /// permission on the owning workbasket.
    pub async fn get_task(&self, ctx: &RequestContext, task_id: &str) -> Result<Task> {
        let mut task = self
            .store
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| TaskError::not_found(task_id))?;

        let workbasket_ids = vec![task.workbasket_summary.id.clone()];
        let visible = self
            .workbaskets
            .visible_workbaskets(&workbasket_ids, ctx)
            .await?;
        let workbasket = visible.into_iter().next().ok_or_else(|| {
            TaskError::NotAuthorized {
                user_id: ctx.user_id().map(str::to_string),
                reason: format!(
                    "no read permission for workbasket {}",
                    task.workbasket_summary.id
                ),
            }
        })?;
        task.workbasket_summary = workbasket;

        let mut attachments = self.store.attachments_by_task_id(task_id).await?;

        let mut classification_ids = vec![task.classification_summary.id.clone()];
        classification_ids.extend(
            attachments
                .iter()
                .map(|a| a.classification_summary.id.clone()),
        );
        classification_ids.sort();
        classification_ids.dedup();
        let classifications = self
            .classifications
            .classifications_by_ids(&classification_ids)
            .await?;

        task.classification_summary =
            find_classification(&classifications, &task.classification_summary.id)
                .ok_or_else(|| {
                    TaskError::Store(format!("no classification found for task {task_id}"))
                })?
                .clone();
        for attachment in &mut attachments {
            attachment.classification_summary =
                find_classification(&classifications, &attachment.classification_summary.id)
                    .ok_or_else(|| {
                        TaskError::Store(format!(
                            "no classification found for attachment {}",
                            attachment.id
                        ))
                    })?
                    .clone();
        }
        task.attachments = attachments;

        Ok(task)
    }

    /// Take exclusive working ownership of a task in state READY or CLAIMED.
    pub async fn claim(&self, ctx: &RequestContext, task_id: &str) -> Result<Task> {
        self.claim_internal(ctx, task_id, false).await
    }

    /// Claim regardless of a foreign existing claim.
    pub async fn force_claim(&self, ctx: &RequestContext, task_id: &str) -> Result<Task> {
        self.claim_internal(ctx, task_id, true).await
    }

    pub(super) async fn claim_internal(
        &self,
        ctx: &RequestContext,
        task_id: &str,
        forced: bool,
    ) -> Result<Task> {
        let user_id = self.require_user(ctx)?.to_string();
        let mut task = self.get_task(ctx, task_id).await?;
        let now = Utc::now();

        check_preconditions_for_claim(&task, ctx, forced)?;
        claim_actions_on_task(&mut task, &user_id, now);
        self.store.update(&task).await?;
        debug!(task_id = %task_id, user_id = %user_id, forced, "task claimed");

        self.publish_event(TaskEventKind::Claimed, &task, ctx, Vec::new());
        Ok(task)
    }

    /// Give up a claim, returning the task to READY. The dedicated exception
    /// path out of CLAIMED; clears owner and the claimed timestamp.
    pub async fn cancel_claim(&self, ctx: &RequestContext, task_id: &str) -> Result<Task> {
        self.cancel_claim_internal(ctx, task_id, false).await
    }

    /// Release another user's claim.
    pub async fn force_cancel_claim(&self, ctx: &RequestContext, task_id: &str) -> Result<Task> {
        self.cancel_claim_internal(ctx, task_id, true).await
    }

    async fn cancel_claim_internal(
        &self,
        ctx: &RequestContext,
        task_id: &str,
        forced: bool,
    ) -> Result<Task> {
        let mut task = self.get_task(ctx, task_id).await?;
        let now = Utc::now();

        check_preconditions_for_cancel_claim(&task, ctx, forced)?;
        cancel_claim_actions_on_task(&mut task, now);
        self.store.update(&task).await?;
        debug!(task_id = %task_id, user_id = ?ctx.user_id(), "task unclaimed");

        self.publish_event(TaskEventKind::ClaimCancelled, &task, ctx, Vec::new());
        Ok(task)
    }

    /// Complete a claimed task. Completing an already-COMPLETED task is
    /// idempotent and returns the task unchanged.
    pub async fn complete_task(&self, ctx: &RequestContext, task_id: &str) -> Result<Task> {
        self.complete_internal(ctx, task_id, false).await
    }

    /// Complete regardless of claim and ownership; performs an implicit
    /// forced claim when the task is not claimed yet.
    pub async fn force_complete_task(&self, ctx: &RequestContext, task_id: &str) -> Result<Task> {
        self.complete_internal(ctx, task_id, true).await
    }

    async fn complete_internal(
        &self,
        ctx: &RequestContext,
        task_id: &str,
        forced: bool,
    ) -> Result<Task> {
        let user_id = self.require_user(ctx)?.to_string();
        let mut task = self.get_task(ctx, task_id).await?;

        if task.state == TaskState::Completed {
            return Ok(task);
        }
        check_not_terminated_or_cancelled(&task)?;

        if !forced {
            check_preconditions_for_complete(&task, ctx)?;
        } else if task_is_not_claimed(&task) {
            task = self.claim_internal(ctx, task_id, true).await?;
        }

        let now = Utc::now();
        complete_actions_on_task(&mut task, &user_id, now);
        self.store.update(&task).await?;
        debug!(task_id = %task_id, user_id = %user_id, forced, "task completed");

        self.publish_event(TaskEventKind::Completed, &task, ctx, Vec::new());
        Ok(task)
    }

    /// Abandon a task from any non-end state. No role requirement.
    pub async fn cancel_task(&self, ctx: &RequestContext, task_id: &str) -> Result<Task> {
        let task = self
            .close_task(ctx, task_id, TaskState::Cancelled)
            .await?;
        self.publish_event(TaskEventKind::Cancelled, &task, ctx, Vec::new());
        Ok(task)
    }

    /// Forcibly close a task from any non-end state. Requires the Admin or
    /// TaskAdmin role.
    pub async fn terminate_task(&self, ctx: &RequestContext, task_id: &str) -> Result<Task> {
        ctx.check_role_membership(&[Role::Admin, Role::TaskAdmin])?;
        let task = self
            .close_task(ctx, task_id, TaskState::Terminated)
            .await?;
        self.publish_event(TaskEventKind::Terminated, &task, ctx, Vec::new());
        Ok(task)
    }

    async fn close_task(
        &self,
        ctx: &RequestContext,
        task_id: &str,
        target_state: TaskState,
    ) -> Result<Task> {
        let mut task = self.get_task(ctx, task_id).await?;
        check_not_in_end_state(&task)?;

        let now = Utc::now();
        close_actions_on_task(&mut task, target_state, now);
        self.store.update(&task).await?;
        debug!(task_id = %task_id, state = %target_state, user_id = ?ctx.user_id(), "task closed");
        Ok(task)
    }

    /// Full-entity update guarded by the optimistic-concurrency check.
    ///
    /// The check compares `modified`, `claimed` and `state` of the submitted
    /// entity against the stored one by equality at clock resolution; a
    /// mismatch fails with `Concurrency` before any write. Races faster than
    /// the clock resolution can slip through; an accepted limitation of the
    /// timestamp comparison, not a versioning scheme.
    pub async fn update_task(&self, ctx: &RequestContext, task: Task) -> Result<Task> {
        let mut new_task = task;
        let old_task = self.get_task(ctx, &new_task.id).await?;

        check_concurrency(&new_task, &old_task)?;
        new_task.modified = Some(Utc::now());

        ObjectReference::validate(new_task.primary_obj_ref.as_ref(), "primary object reference")?;
        self.apply_standard_update_actions(&old_task, &mut new_task)
            .await?;

        self.store.update(&new_task).await?;
        debug!(task_id = %new_task.id, user_id = ?ctx.user_id(), "task updated");

        let details = determine_changes(&old_task, &new_task);
        self.publish_event(TaskEventKind::Updated, &new_task, ctx, details);
        Ok(new_task)
    }

    /// Flip the read flag. Narrow mutation without a history event.
    pub async fn set_task_read(
        &self,
        ctx: &RequestContext,
        task_id: &str,
        is_read: bool,
    ) -> Result<Task> {
        let mut task = self.get_task(ctx, task_id).await?;
        task.read = is_read;
        task.modified = Some(Utc::now());
        self.store.update(&task).await?;
        debug!(task_id = %task_id, is_read, "task read flag set");
        Ok(task)
    }

    /// Remove a task that reached an end state and whose callback has been
    /// processed. Requires the Admin role.
    pub async fn delete_task(&self, ctx: &RequestContext, task_id: &str) -> Result<()> {
        self.delete_internal(ctx, task_id, false).await
    }

    /// Remove a task regardless of its lifecycle state. The callback rule
    /// still applies: a pending callback blocks deletion unless the task is
    /// CANCELLED or TERMINATED.
    pub async fn force_delete_task(&self, ctx: &RequestContext, task_id: &str) -> Result<()> {
        self.delete_internal(ctx, task_id, true).await
    }

    async fn delete_internal(
        &self,
        ctx: &RequestContext,
        task_id: &str,
        forced: bool,
    ) -> Result<()> {
        ctx.check_role_membership(&[Role::Admin])?;
        let task = self.get_task(ctx, task_id).await?;

        if !task.state.is_end_state() && !forced {
            return Err(TaskError::invalid_state(task_id, task.state));
        }
        if !matches!(task.state, TaskState::Cancelled | TaskState::Terminated)
            && task.callback_state == CallbackState::CallbackProcessingRequired
        {
            return Err(TaskError::invalid_state(task_id, task.state));
        }

        let ids = vec![task_id.to_string()];
        self.store.delete_attachments_by_task_ids(&ids).await?;
        self.store.delete(task_id).await?;
        if self.config.history_enabled && self.config.delete_history_on_task_deletion {
            self.store.delete_history_events(&ids).await?;
        }
        info!(task_id = %task_id, user_id = ?ctx.user_id(), "task deleted");
        Ok(())
    }

    pub(super) fn require_user<'a>(&self, ctx: &'a RequestContext) -> Result<&'a str> {
        ctx.user_id().ok_or_else(|| TaskError::NotAuthorized {
            user_id: None,
            reason: "an authenticated user is required for this operation".to_string(),
        })
    }

    pub(super) fn publish_event(
        &self,
        kind: TaskEventKind,
        task: &Task,
        ctx: &RequestContext,
        details: Vec<AttributeChange>,
    ) {
        if !self.config.history_enabled {
            return;
        }
        let event = TaskHistoryEvent::new(
            kind,
            task.as_summary(),
            ctx.user_id().map(str::to_string),
        )
        .with_details(details);
        self.events.publish(event);
    }

    fn apply_creation_defaults(
        &self,
        task: &mut Task,
        ctx: &RequestContext,
        classification: &ClassificationSummary,
    ) -> Result<()> {
        let now = Utc::now();
        task.id = ids::new_task_id();
        if task.external_id.is_empty() {
            task.external_id = ids::new_external_id();
        }
        task.state = TaskState::Ready;
        task.created = Some(now);
        task.modified = Some(now);
        task.read = false;
        task.transferred = false;

        if self.config.security_enabled && ctx.user_id().is_none() {
            return Err(TaskError::NotAuthorized {
                user_id: None,
                reason: "security is enabled but the request context carries no user id"
                    .to_string(),
            });
        }
        task.creator = ctx.user_id().map(str::to_string);

        if task.business_process_id.is_none() {
            task.business_process_id = Some(ids::new_business_process_id());
        }
        if task.planned.is_none() {
            task.planned = Some(now);
        }
        if task.name.is_none() {
            task.name = classification.name.clone();
        }
        if task.description.is_none() {
            task.description = classification.description.clone();
        }
        if task.priority == 0 {
            task.priority = classification.priority;
        }
        Ok(())
    }

    async fn apply_standard_update_actions(
        &self,
        old_task: &Task,
        new_task: &mut Task,
    ) -> Result<()> {
        if old_task.external_id.is_empty() || old_task.external_id != new_task.external_id {
            return Err(TaskError::invalid_argument(
                "a task's external id cannot be changed via update",
            ));
        }

        let new_workbasket_key = &new_task.workbasket_summary.key;
        if !new_workbasket_key.is_empty() && new_workbasket_key != &old_task.workbasket_summary.key
        {
            return Err(TaskError::invalid_argument(
                "a task's workbasket cannot be changed via update",
            ));
        }
        new_task.workbasket_summary = old_task.workbasket_summary.clone();

        if new_task.classification_summary.key.is_empty() {
            new_task.classification_summary = old_task.classification_summary.clone();
        } else if new_task.classification_summary.key != old_task.classification_summary.key {
            let key = new_task.classification_summary.key.clone();
            let domain = new_task.workbasket_summary.domain.clone();
            let classification = self
                .classifications
                .classification_by_key(&key, &domain)
                .await?
                .ok_or(TaskError::ClassificationNotFound { key, domain })?;
            new_task.classification_summary = classification;
        }

        if new_task.business_process_id.is_none() {
            new_task.business_process_id = old_task.business_process_id.clone();
        }

        // owner edits only while the task still sits unclaimed in its basket
        if new_task.owner != old_task.owner && old_task.state != TaskState::Ready {
            return Err(TaskError::invalid_state(&old_task.id, old_task.state));
        }
        Ok(())
    }
}

/// Field-by-field staleness check of the submitted entity against the stored
/// one. Timestamp equality, not a version counter: concurrent updates below
/// the clock resolution are not detected.
fn check_concurrency(new_task: &Task, old_task: &Task) -> Result<()> {
    let modified_differs = old_task.modified.is_some() && old_task.modified != new_task.modified;
    let claimed_differs = old_task.claimed.is_some() && old_task.claimed != new_task.claimed;
    let state_differs = old_task.state != new_task.state;
    if modified_differs || claimed_differs || state_differs {
        return Err(TaskError::Concurrency {
            task_id: old_task.id.clone(),
        });
    }
    Ok(())
}

fn set_callback_state_on_creation(task: &mut Task) -> Result<()> {
    if let Some(value) = task.callback_info.get(CALLBACK_STATE_KEY) {
        if !value.is_empty() {
            let state: CallbackState = value.parse().map_err(|_| {
                TaskError::invalid_argument(format!(
                    "cannot parse callback state value {value}"
                ))
            })?;
            task.callback_state = state;
        }
    }
    Ok(())
}

fn find_classification<'a>(
    classifications: &'a [ClassificationSummary],
    classification_id: &str,
) -> Option<&'a ClassificationSummary> {
    classifications.iter().find(|c| c.id == classification_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_task() -> Task {
        let mut task = Task::new("WBI:1");
        task.id = "TKI:1".to_string();
        task.external_id = "ETI:1".to_string();
        task.modified = Some(Utc::now());
        task
    }

    #[test]
    fn test_concurrency_detects_stale_modified() {
        let old_task = stored_task();
        let mut submitted = old_task.clone();
        submitted.modified = Some(old_task.modified.unwrap() - chrono::Duration::seconds(5));
        assert!(matches!(
            check_concurrency(&submitted, &old_task),
            Err(TaskError::Concurrency { .. })
        ));
    }

    #[test]
    fn test_concurrency_detects_state_mismatch() {
        let old_task = stored_task();
        let mut submitted = old_task.clone();
        submitted.state = TaskState::Claimed;
        assert!(matches!(
            check_concurrency(&submitted, &old_task),
            Err(TaskError::Concurrency { .. })
        ));
    }

    #[test]
    fn test_concurrency_passes_on_equal_snapshot() {
        let old_task = stored_task();
        let submitted = old_task.clone();
        assert!(check_concurrency(&submitted, &old_task).is_ok());
    }

    #[test]
    fn test_callback_state_seeded_from_callback_info() {
        let mut task = Task::new("WBI:1");
        task.callback_info.insert(
            CALLBACK_STATE_KEY.to_string(),
            "callback_processing_required".to_string(),
        );
        set_callback_state_on_creation(&mut task).unwrap();
        assert_eq!(
            task.callback_state,
            CallbackState::CallbackProcessingRequired
        );
    }

    #[test]
    fn test_unparsable_callback_state_rejected() {
        let mut task = Task::new("WBI:1");
        task.callback_info
            .insert(CALLBACK_STATE_KEY.to_string(), "nonsense".to_string());
        assert!(matches!(
            set_callback_state_on_creation(&mut task),
            Err(TaskError::InvalidArgument { .. })
        ));
    }
}
