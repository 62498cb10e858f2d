//! # Bulk Operations
//!
//! Transition application over many tasks at once with per-identifier
//! partial-failure reporting.
//!
//! Every bulk operation resolves its identifier list through the selector
//! (dedupe → empty-id rejection → existence → authorization), then runs an
//! ordered chain of guards over the surviving batch. Each guard removes
//! failing items and records their typed error in the collector; the batch is
//! never aborted for a per-item reason. Surviving items are mutated in memory
//! with one shared timestamp and persisted in a small number of batched store
//! calls.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

use super::task_service::TaskService;
use crate::bulk::{resolve_authorized_batch, sanitize_identifiers, BulkOperationResults};
use crate::context::{RequestContext, Role};
use crate::error::{Result, TaskError};
use crate::events::{TaskEventKind, TaskHistoryEvent};
use crate::models::{CustomField, MinimalTaskSummary, TaskSummary, TaskView};
use crate::state_machine::{
    check_not_terminated_or_cancelled, check_preconditions_for_claim,
    check_preconditions_for_complete, claim_actions_on_task, complete_actions_on_task,
    task_is_not_claimed, CallbackState, TaskState,
};

/// One guard step over the surviving batch: failing items are removed and
/// their error recorded; the rest continue.
fn apply_guard<T, F>(batch: &mut Vec<T>, results: &mut BulkOperationResults, guard: F)
where
    T: TaskView,
    F: Fn(&T) -> Result<()>,
{
    batch.retain(|item| match guard(item) {
        Ok(()) => true,
        Err(error) => {
            results.add_error(item.id().to_string(), error);
            false
        }
    });
}

/// Like [`apply_guard`] but the guard may mutate the surviving item (used by
/// the forced pre-claim step).
fn apply_guard_mut<T, F>(batch: &mut Vec<T>, results: &mut BulkOperationResults, mut guard: F)
where
    T: TaskView,
    F: FnMut(&mut T) -> Result<()>,
{
    batch.retain_mut(|item| match guard(item) {
        Ok(()) => true,
        Err(error) => {
            results.add_error(item.id().to_string(), error);
            false
        }
    });
}

impl TaskService {
    /// Complete many tasks; each id succeeds or fails on its own.
    pub async fn complete_tasks(
        &self,
        ctx: &RequestContext,
        task_ids: &[String],
    ) -> Result<BulkOperationResults> {
        self.complete_tasks_internal(ctx, task_ids, false).await
    }

    /// Complete many tasks, force-claiming any that are not claimed yet.
    pub async fn force_complete_tasks(
        &self,
        ctx: &RequestContext,
        task_ids: &[String],
    ) -> Result<BulkOperationResults> {
        self.complete_tasks_internal(ctx, task_ids, true).await
    }

    async fn complete_tasks_internal(
        &self,
        ctx: &RequestContext,
        task_ids: &[String],
        forced: bool,
    ) -> Result<BulkOperationResults> {
        debug!(count = task_ids.len(), forced, "entry to complete_tasks");
        let user_id = self.require_user(ctx)?.to_string();

        let resolved = resolve_authorized_batch(
            self.store.as_ref(),
            ctx,
            task_ids,
            self.config.bulk_chunk_size,
        )
        .await?;
        let mut results = resolved.results;

        let authorized_ids: Vec<String> =
            resolved.summaries.iter().map(|s| s.id.clone()).collect();
        let mut batch: Vec<TaskSummary> = Vec::new();
        for chunk in authorized_ids.chunks(self.config.bulk_chunk_size.max(1)) {
            batch.extend(self.store.find_summaries_by_ids(chunk).await?);
        }

        // already-COMPLETED tasks are an idempotent success, not an error
        let mut already_completed = Vec::new();
        batch.retain(|summary| {
            if summary.state == TaskState::Completed {
                already_completed.push(summary.id.clone());
                false
            } else {
                true
            }
        });
        for task_id in already_completed {
            results.add_succeeded(task_id);
        }

        apply_guard(&mut batch, &mut results, |summary| {
            check_not_terminated_or_cancelled(summary)
        });

        let now = Utc::now();
        if forced {
            apply_guard_mut(&mut batch, &mut results, |summary| {
                if task_is_not_claimed(summary) {
                    check_preconditions_for_claim(summary, ctx, true)?;
                    claim_actions_on_task(summary, &user_id, now);
                }
                Ok(())
            });
        } else {
            apply_guard(&mut batch, &mut results, |summary| {
                check_preconditions_for_complete(summary, ctx)
            });
        }

        self.persist_completed_batch(ctx, batch, &user_id, now, &mut results)
            .await?;
        Ok(results)
    }

    /// Mutate the surviving batch with one shared timestamp and persist it in
    /// two grouped store calls: the completed-state fields for every
    /// survivor, and the claim fields for the subset whose claim was set as
    /// part of this same operation.
    async fn persist_completed_batch(
        &self,
        ctx: &RequestContext,
        mut batch: Vec<TaskSummary>,
        user_id: &str,
        now: DateTime<Utc>,
        results: &mut BulkOperationResults,
    ) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut completed_ids = Vec::new();
        let mut freshly_claimed_ids = Vec::new();
        for summary in &mut batch {
            let claimed_in_this_call = summary.claimed == Some(now);
            complete_actions_on_task(summary, user_id, now);
            completed_ids.push(summary.id.clone());
            if claimed_in_this_call {
                freshly_claimed_ids.push(summary.id.clone());
            }
        }

        self.store.update_completed(&completed_ids, &batch[0]).await?;
        if let Some(claimed_reference) = batch
            .iter()
            .find(|summary| freshly_claimed_ids.contains(&summary.id))
        {
            self.store
                .update_claimed(&freshly_claimed_ids, claimed_reference)
                .await?;
        }

        for summary in batch {
            results.add_succeeded(summary.id.clone());
            if self.config.history_enabled {
                self.events.publish(TaskHistoryEvent::new(
                    TaskEventKind::Completed,
                    summary,
                    ctx.user_id().map(str::to_string),
                ));
            }
        }
        Ok(())
    }

    /// Delete many tasks. Requires the Admin role; per-id errors mirror the
    /// single-item delete rules (end state reached, callback processed).
    pub async fn delete_tasks(
        &self,
        ctx: &RequestContext,
        task_ids: &[String],
    ) -> Result<BulkOperationResults> {
        debug!(count = task_ids.len(), "entry to delete_tasks");
        ctx.check_role_membership(&[Role::Admin])?;

        let mut results = BulkOperationResults::new();
        let task_ids = sanitize_identifiers(task_ids, &mut results);
        if task_ids.is_empty() {
            return Ok(results);
        }

        let mut summaries: Vec<MinimalTaskSummary> = Vec::new();
        for chunk in task_ids.chunks(self.config.bulk_chunk_size.max(1)) {
            summaries.extend(self.store.find_existing_tasks(chunk, &[]).await?);
        }

        let mut deletable = Vec::new();
        for task_id in &task_ids {
            let Some(summary) = summaries.iter().find(|s| &s.id == task_id) else {
                results.add_error(task_id.clone(), TaskError::not_found(task_id.clone()));
                continue;
            };
            if !summary.state.is_end_state() {
                results.add_error(
                    task_id.clone(),
                    TaskError::invalid_state(task_id.clone(), summary.state),
                );
                continue;
            }
            if !matches!(
                summary.state,
                TaskState::Cancelled | TaskState::Terminated
            ) && summary.callback_state == CallbackState::CallbackProcessingRequired
            {
                results.add_error(
                    task_id.clone(),
                    TaskError::invalid_state(task_id.clone(), summary.state),
                );
                continue;
            }
            deletable.push(task_id.clone());
        }

        if !deletable.is_empty() {
            for chunk in deletable.chunks(self.config.bulk_chunk_size.max(1)) {
                self.store.delete_attachments_by_task_ids(chunk).await?;
                self.store.delete_multiple(chunk).await?;
                if self.config.history_enabled && self.config.delete_history_on_task_deletion {
                    self.store.delete_history_events(chunk).await?;
                }
            }
            for task_id in deletable {
                results.add_succeeded(task_id);
            }
        }
        Ok(results)
    }

    /// Set the owner on every task of the batch that is currently READY.
    ///
    /// The initial filter cannot predict races against concurrent claims, so
    /// when the store reports fewer affected rows than ids submitted, a
    /// verification re-read classifies each unchanged task as either a state
    /// error (no longer READY) or an unexplained update failure.
    pub async fn set_owner_of_tasks(
        &self,
        ctx: &RequestContext,
        owner: &str,
        task_ids: &[String],
    ) -> Result<BulkOperationResults> {
        debug!(count = task_ids.len(), owner, "entry to set_owner_of_tasks");
        if task_ids.is_empty() {
            return Ok(BulkOperationResults::new());
        }

        let resolved = resolve_authorized_batch(
            self.store.as_ref(),
            ctx,
            task_ids,
            self.config.bulk_chunk_size,
        )
        .await?;
        let mut results = resolved.results;
        let authorized_ids: Vec<String> =
            resolved.summaries.iter().map(|s| s.id.clone()).collect();
        if authorized_ids.is_empty() {
            return Ok(results);
        }

        let now = Utc::now();
        let affected = self
            .store
            .set_owner_of_tasks(owner, &authorized_ids, now)
            .await?;

        if affected as usize == authorized_ids.len() {
            for task_id in authorized_ids {
                results.add_succeeded(task_id);
            }
            return Ok(results);
        }

        // fewer rows changed than requested: re-read and classify
        let summaries = self.store.find_existing_tasks(&authorized_ids, &[]).await?;
        for summary in summaries {
            if summary.owner.as_deref() == Some(owner) {
                results.add_succeeded(summary.id);
            } else if summary.state != TaskState::Ready {
                results.add_error(
                    summary.id.clone(),
                    TaskError::invalid_state(summary.id.clone(), summary.state),
                );
            } else {
                results.add_error(
                    summary.id.clone(),
                    TaskError::UpdateFailed {
                        task_id: summary.id.clone(),
                    },
                );
            }
        }
        debug!(
            requested = task_ids.len(),
            affected,
            failed = results.error_count(),
            "set_owner_of_tasks reconciled"
        );
        Ok(results)
    }

    /// Move the callback sub-lifecycle of many tasks, keyed by external id.
    /// Legality depends jointly on the main state and the current callback
    /// state of each task.
    pub async fn set_callback_state_for_tasks(
        &self,
        ctx: &RequestContext,
        external_ids: &[String],
        desired: CallbackState,
    ) -> Result<BulkOperationResults> {
        debug!(
            count = external_ids.len(),
            user_id = ?ctx.user_id(),
            desired = %desired,
            "entry to set_callback_state_for_tasks"
        );
        let mut results = BulkOperationResults::new();
        let external_ids = sanitize_identifiers(external_ids, &mut results);
        if external_ids.is_empty() {
            return Ok(results);
        }

        let mut summaries: Vec<MinimalTaskSummary> = Vec::new();
        for chunk in external_ids.chunks(self.config.bulk_chunk_size.max(1)) {
            summaries.extend(self.store.find_existing_tasks(&[], chunk).await?);
        }

        let mut eligible = Vec::new();
        for external_id in &external_ids {
            let Some(summary) = summaries.iter().find(|s| &s.external_id == external_id)
            else {
                results.add_error(
                    external_id.clone(),
                    TaskError::not_found(external_id.clone()),
                );
                continue;
            };
            if !summary
                .callback_state
                .can_transition_to(desired, summary.state)
            {
                results.add_error(
                    external_id.clone(),
                    TaskError::invalid_state(external_id.clone(), summary.state),
                );
                continue;
            }
            eligible.push(external_id.clone());
        }

        if !eligible.is_empty() {
            for chunk in eligible.chunks(self.config.bulk_chunk_size.max(1)) {
                self.store.set_callback_state_multiple(chunk, desired).await?;
            }
            for external_id in eligible {
                results.add_succeeded(external_id);
            }
        }
        Ok(results)
    }

    /// Bulk custom-field update over the caller-visible subset of the ids.
    /// Returns the ids actually written. An empty field map is a
    /// request-level error.
    pub async fn update_custom_fields(
        &self,
        ctx: &RequestContext,
        task_ids: &[String],
        fields: &BTreeMap<CustomField, String>,
    ) -> Result<Vec<String>> {
        if fields.is_empty() {
            return Err(TaskError::invalid_argument(
                "the custom fields to update must not be empty",
            ));
        }

        let resolved = resolve_authorized_batch(
            self.store.as_ref(),
            ctx,
            task_ids,
            self.config.bulk_chunk_size,
        )
        .await?;
        let changed_ids: Vec<String> = resolved.summaries.iter().map(|s| s.id.clone()).collect();

        if !changed_ids.is_empty() {
            let now = Utc::now();
            for chunk in changed_ids.chunks(self.config.bulk_chunk_size.max(1)) {
                self.store.update_custom_fields(chunk, fields, now).await?;
            }
            debug!(count = changed_ids.len(), "updated custom fields");
        }
        Ok(changed_ids)
    }
}
