//! Transition actions: the in-memory field mutations each transition applies.
//!
//! Actions are free functions over [`TaskLifecycle`] so the identical
//! mutation serves the full entity and the bulk summary projection. Bulk
//! operations pass one shared `now` for the whole surviving batch so all
//! affected rows carry consistent timestamps.

use chrono::{DateTime, Utc};

use crate::models::TaskLifecycle;
use crate::state_machine::TaskState;

/// owner=actor, claimed=now, state=CLAIMED, read=true.
pub fn claim_actions_on_task(task: &mut impl TaskLifecycle, user_id: &str, now: DateTime<Utc>) {
    task.set_owner(Some(user_id.to_string()));
    task.set_modified(now);
    task.set_claimed(Some(now));
    task.set_read(true);
    task.set_state(TaskState::Claimed);
}

/// completed=now, state=COMPLETED, owner=actor.
pub fn complete_actions_on_task(task: &mut impl TaskLifecycle, user_id: &str, now: DateTime<Utc>) {
    task.set_completed(Some(now));
    task.set_modified(now);
    task.set_state(TaskState::Completed);
    task.set_owner(Some(user_id.to_string()));
}

/// owner=null, claimed=null, state=READY, read=true. The only path that
/// clears the claimed timestamp.
pub fn cancel_claim_actions_on_task(task: &mut impl TaskLifecycle, now: DateTime<Utc>) {
    task.set_owner(None);
    task.set_modified(now);
    task.set_claimed(None);
    task.set_read(true);
    task.set_state(TaskState::Ready);
}

/// Shared effect of cancel and terminate: completed=now, state=target.
pub fn close_actions_on_task(
    task: &mut impl TaskLifecycle,
    target_state: TaskState,
    now: DateTime<Utc>,
) {
    task.set_modified(now);
    task.set_completed(Some(now));
    task.set_state(target_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, TaskView};

    #[test]
    fn test_claim_then_cancel_claim_restores_ready_shape() {
        let now = Utc::now();
        let mut task = Task::new("WBI:1");
        task.id = "TKI:1".to_string();

        claim_actions_on_task(&mut task, "alice", now);
        assert_eq!(task.state(), TaskState::Claimed);
        assert_eq!(task.owner(), Some("alice"));
        assert_eq!(task.claimed(), Some(now));
        assert!(task.read);

        cancel_claim_actions_on_task(&mut task, now);
        assert_eq!(task.state(), TaskState::Ready);
        assert_eq!(task.owner(), None);
        assert_eq!(task.claimed(), None);
        assert!(task.read);
    }

    #[test]
    fn test_complete_sets_owner_to_actor() {
        let now = Utc::now();
        let mut task = Task::new("WBI:1");
        claim_actions_on_task(&mut task, "alice", now);
        complete_actions_on_task(&mut task, "bob", now);
        assert_eq!(task.state(), TaskState::Completed);
        assert_eq!(task.owner(), Some("bob"));
        assert_eq!(task.completed, Some(now));
    }

    #[test]
    fn test_close_actions_target_state() {
        let now = Utc::now();
        let mut task = Task::new("WBI:1");
        close_actions_on_task(&mut task, TaskState::Terminated, now);
        assert_eq!(task.state(), TaskState::Terminated);
        assert_eq!(task.completed, Some(now));
    }
}
