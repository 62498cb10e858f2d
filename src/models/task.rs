//! # Task Model
//!
//! The central entity of the lifecycle core. A task is a unit of work routed
//! into exactly one workbasket at a time and worked on by a human or
//! automated owner.
//!
//! State is mutated exclusively through the transition operations of the
//! [`TaskService`](crate::service::TaskService) or through the bulk
//! custom-field update; `id` and `external_id` are immutable once set.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::Attachment;
use super::classification::ClassificationSummary;
use super::lifecycle::{TaskLifecycle, TaskView};
use super::object_reference::ObjectReference;
use super::summary::TaskSummary;
use super::workbasket::WorkbasketSummary;
use crate::state_machine::{CallbackState, TaskState};

/// Key in the callback-info map that seeds the callback state at creation.
pub const CALLBACK_STATE_KEY: &str = "callbackState";

/// The sixteen named custom string slots carried by every task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CustomField {
    Custom1,
    Custom2,
    Custom3,
    Custom4,
    Custom5,
    Custom6,
    Custom7,
    Custom8,
    Custom9,
    Custom10,
    Custom11,
    Custom12,
    Custom13,
    Custom14,
    Custom15,
    Custom16,
}

impl fmt::Display for CustomField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_value(self).map_err(|_| fmt::Error)?;
        match json {
            serde_json::Value::String(s) => write!(f, "{s}"),
            _ => Err(fmt::Error),
        }
    }
}

/// A work item routed into a workbasket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// System-generated, immutable once set. Empty on an unsaved task.
    pub id: String,
    /// Caller-supplied or generated at creation; unique and immutable after.
    pub external_id: String,
    pub created: Option<DateTime<Utc>>,
    pub claimed: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub planned: Option<DateTime<Utc>>,
    pub due: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub creator: Option<String>,
    pub description: Option<String>,
    pub note: Option<String>,
    pub priority: i32,
    pub state: TaskState,
    pub classification_summary: ClassificationSummary,
    pub workbasket_summary: WorkbasketSummary,
    pub business_process_id: Option<String>,
    pub parent_business_process_id: Option<String>,
    /// Non-null only while the task is CLAIMED or COMPLETED.
    pub owner: Option<String>,
    pub primary_obj_ref: Option<ObjectReference>,
    pub read: bool,
    pub transferred: bool,
    /// Opaque key/value data for the external callback system. The
    /// [`CALLBACK_STATE_KEY`] entry seeds [`Task::callback_state`] at creation.
    pub callback_info: BTreeMap<String, String>,
    pub callback_state: CallbackState,
    pub custom_attributes: BTreeMap<String, String>,
    pub custom_fields: BTreeMap<CustomField, String>,
    pub attachments: Vec<Attachment>,
}

impl Task {
    /// New unsaved task destined for the workbasket with the given id.
    pub fn new(workbasket_id: impl Into<String>) -> Self {
        Self {
            workbasket_summary: WorkbasketSummary::with_id(workbasket_id),
            callback_state: CallbackState::None,
            ..Self::default()
        }
    }

    /// New unsaved task destined for the workbasket with the given key and
    /// domain.
    pub fn new_with_key(key: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            workbasket_summary: WorkbasketSummary::with_key(key, domain),
            callback_state: CallbackState::None,
            ..Self::default()
        }
    }

    pub fn classification_key(&self) -> &str {
        &self.classification_summary.key
    }

    pub fn workbasket_key(&self) -> &str {
        &self.workbasket_summary.key
    }

    pub fn domain(&self) -> &str {
        &self.workbasket_summary.domain
    }

    pub fn custom_field(&self, field: CustomField) -> Option<&str> {
        self.custom_fields.get(&field).map(String::as_str)
    }

    pub fn set_custom_field(&mut self, field: CustomField, value: impl Into<String>) {
        self.custom_fields.insert(field, value.into());
    }

    /// Read-only projection used by bulk operations and event payloads.
    pub fn as_summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            external_id: self.external_id.clone(),
            created: self.created,
            claimed: self.claimed,
            completed: self.completed,
            modified: self.modified,
            planned: self.planned,
            due: self.due,
            name: self.name.clone(),
            creator: self.creator.clone(),
            note: self.note.clone(),
            priority: self.priority,
            state: self.state,
            classification_summary: self.classification_summary.clone(),
            workbasket_summary: self.workbasket_summary.clone(),
            business_process_id: self.business_process_id.clone(),
            parent_business_process_id: self.parent_business_process_id.clone(),
            owner: self.owner.clone(),
            primary_obj_ref: self.primary_obj_ref.clone(),
            read: self.read,
            transferred: self.transferred,
            attachment_summaries: self
                .attachments
                .iter()
                .map(Attachment::as_summary)
                .collect(),
        }
    }
}

impl TaskView for Task {
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

impl TaskLifecycle for Task {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new("WBI:1");
        assert_eq!(task.workbasket_summary.id, "WBI:1");
        assert_eq!(task.state, TaskState::Ready);
        assert_eq!(task.callback_state, CallbackState::None);
        assert!(task.id.is_empty());
        assert!(task.owner.is_none());
    }

    #[test]
    fn test_custom_field_roundtrip() {
        let mut task = Task::new("WBI:1");
        task.set_custom_field(CustomField::Custom7, "seven");
        assert_eq!(task.custom_field(CustomField::Custom7), Some("seven"));
        assert_eq!(task.custom_field(CustomField::Custom8), None);
    }

    #[test]
    fn test_custom_field_display() {
        assert_eq!(CustomField::Custom1.to_string(), "custom1");
        assert_eq!(CustomField::Custom16.to_string(), "custom16");
    }

    #[test]
    fn test_summary_projection_carries_lifecycle_fields() {
        let mut task = Task::new("WBI:1");
        task.id = "TKI:1".to_string();
        task.owner = Some("alice".to_string());
        task.state = TaskState::Claimed;
        let summary = task.as_summary();
        assert_eq!(summary.id, "TKI:1");
        assert_eq!(summary.owner.as_deref(), Some("alice"));
        assert_eq!(summary.state, TaskState::Claimed);
    }
}
