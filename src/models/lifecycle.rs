//! Shared capability interface over the mutable lifecycle fields.
//!
//! Transition guards and actions operate on these traits so the same logic
//! serves the full [`Task`](super::Task) entity (single-item operations) and
//! the [`TaskSummary`](super::TaskSummary) projection (bulk operations).

use chrono::{DateTime, Utc};

use crate::state_machine::TaskState;

/// Read-only view of the lifecycle fields a transition guard inspects.
pub trait TaskView {
    fn id(&self) -> &str;
    fn state(&self) -> TaskState;
    fn owner(&self) -> Option<&str>;
    fn claimed(&self) -> Option<DateTime<Utc>>;
}

/// Mutable access to the lifecycle fields a transition action writes.
pub trait TaskLifecycle: TaskView {
    fn set_state(&mut self, state: TaskState);
    fn set_owner(&mut self, owner: Option<String>);
    fn set_claimed(&mut self, claimed: Option<DateTime<Utc>>);
    fn set_completed(&mut self, completed: Option<DateTime<Utc>>);
    fn set_modified(&mut self, modified: DateTime<Utc>);
    fn set_read(&mut self, read: bool);
}
