//! Read-only projections of the task entity.
//!
//! Bulk operations never load full task bodies: eligibility checks run on
//! [`MinimalTaskSummary`], in-memory mutation of surviving batches on
//! [`TaskSummary`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::AttachmentSummary;
use super::classification::ClassificationSummary;
use super::lifecycle::{TaskLifecycle, TaskView};
use super::object_reference::ObjectReference;
use super::workbasket::WorkbasketSummary;
use crate::state_machine::{CallbackState, TaskState};

/// Full read-only projection of a task, without attachments' bodies and
/// custom attribute maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: String,
    pub external_id: String,
    pub created: Option<DateTime<Utc>>,
    pub claimed: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub planned: Option<DateTime<Utc>>,
    pub due: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub creator: Option<String>,
    pub note: Option<String>,
    pub priority: i32,
    pub state: TaskState,
    pub classification_summary: ClassificationSummary,
    pub workbasket_summary: WorkbasketSummary,
    pub business_process_id: Option<String>,
    pub parent_business_process_id: Option<String>,
    pub owner: Option<String>,
    pub primary_obj_ref: Option<ObjectReference>,
    pub read: bool,
    pub transferred: bool,
    pub attachment_summaries: Vec<AttachmentSummary>,
}

/// The smallest projection bulk eligibility checks need. Exists so bulk
/// authorization and state filtering never load full task bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalTaskSummary {
    pub id: String,
    pub external_id: String,
    pub workbasket_id: String,
    pub state: TaskState,
    pub owner: Option<String>,
    pub callback_state: CallbackState,
}

impl TaskView for TaskSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> TaskState {
        self.state
    }

    fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    fn claimed(&self) -> Option<DateTime<Utc>> {
        self.claimed
    }
}

impl TaskLifecycle for TaskSummary {
    fn set_state(&mut self, state: TaskState) {
        self.state = state;
    }

    fn set_owner(&mut self, owner: Option<String>) {
        self.owner = owner;
    }

    fn set_claimed(&mut self, claimed: Option<DateTime<Utc>>) {
        self.claimed = claimed;
    }

    fn set_completed(&mut self, completed: Option<DateTime<Utc>>) {
        self.completed = completed;
    }

    fn set_modified(&mut self, modified: DateTime<Utc>) {
        self.modified = Some(modified);
    }

    fn set_read(&mut self, read: bool) {
        self.read = read;
    }
}

impl TaskView for MinimalTaskSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> TaskState {
        self.state
    }

    fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    fn claimed(&self) -> Option<DateTime<Utc>> {
        // the minimal projection does not carry the claimed timestamp
        None
    }
}
