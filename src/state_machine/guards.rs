//! Transition guards: precondition checks applied before any transition
//! mutates state.
//!
//! Two orthogonal checks are kept separate so bulk operations can apply the
//! state check uniformly while the ownership check stays per-actor:
//! *state eligibility* (is the current state a valid source for the
//! transition) and *ownership/role eligibility* (may this actor perform it).
//! Forced variants waive ownership and claim-prerequisite checks only,
//! never the end-state rule.

use crate::context::{RequestContext, Role};
use crate::error::{Result, TaskError};
use crate::models::TaskView;
use crate::state_machine::TaskState;

/// A task counts as claimed only when both the claimed timestamp and the
/// CLAIMED state agree.
pub fn task_is_not_claimed(task: &impl TaskView) -> bool {
    task.claimed().is_none() || task.state() != TaskState::Claimed
}

/// State eligibility for claim: the task must be READY or CLAIMED. When it is
/// already CLAIMED and the claim is not forced, the acting identity must
/// already own it.
pub fn check_preconditions_for_claim(
    task: &impl TaskView,
    ctx: &RequestContext,
    forced: bool,
) -> Result<()> {
    let state = task.state();
    if !state.is_claimable() {
        return Err(TaskError::invalid_state(task.id(), state));
    }
    if !forced && state == TaskState::Claimed && !ctx.owns(task.owner()) {
        return Err(TaskError::InvalidOwner {
            task_id: task.id().to_string(),
            owner: task.owner().map(str::to_string),
            user_id: ctx.user_id().map(str::to_string),
        });
    }
    Ok(())
}

/// Cancel-claim is allowed from any non-end state; on a CLAIMED task that is
/// not forced, only the current owner may release the claim.
pub fn check_preconditions_for_cancel_claim(
    task: &impl TaskView,
    ctx: &RequestContext,
    forced: bool,
) -> Result<()> {
    let state = task.state();
    if state.is_end_state() {
        return Err(TaskError::invalid_state(task.id(), state));
    }
    if state == TaskState::Claimed && !forced && ctx.user_id() != task.owner() {
        return Err(TaskError::InvalidOwner {
            task_id: task.id().to_string(),
            owner: task.owner().map(str::to_string),
            user_id: ctx.user_id().map(str::to_string),
        });
    }
    Ok(())
}

/// CANCELLED and TERMINATED reject completion outright; COMPLETED is handled
/// by the idempotency rule before this guard runs.
pub fn check_not_terminated_or_cancelled(task: &impl TaskView) -> Result<()> {
    let state = task.state();
    if matches!(state, TaskState::Cancelled | TaskState::Terminated) {
        return Err(TaskError::invalid_state(task.id(), state));
    }
    Ok(())
}

/// Ownership/role eligibility for non-forced complete: the task must be
/// claimed, and the actor must own it or hold the Admin role.
pub fn check_preconditions_for_complete(task: &impl TaskView, ctx: &RequestContext) -> Result<()> {
    if task_is_not_claimed(task) {
        return Err(TaskError::invalid_state(task.id(), task.state()));
    }
    if !ctx.owns(task.owner()) && !ctx.is_in_role(Role::Admin) {
        return Err(TaskError::InvalidOwner {
            task_id: task.id().to_string(),
            owner: task.owner().map(str::to_string),
            user_id: ctx.user_id().map(str::to_string),
        });
    }
    Ok(())
}

/// Shared source-state guard for cancel and terminate: any non-end state.
pub fn check_not_in_end_state(task: &impl TaskView) -> Result<()> {
    let state = task.state();
    if state.is_end_state() {
        return Err(TaskError::invalid_state(task.id(), state));
    }
    Ok(())
}
