//! History event records emitted once per successful lifecycle transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::change_detector::AttributeChange;
use crate::ids;
use crate::models::TaskSummary;

/// Lifecycle event kinds, one per transition operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventKind {
    Created,
    Claimed,
    ClaimCancelled,
    Completed,
    Cancelled,
    Terminated,
    Updated,
}

/// One audit record: the event kind, the affected task's current projection,
/// the acting identity and, for created/updated events, the attribute diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHistoryEvent {
    pub id: String,
    pub kind: TaskEventKind,
    pub task: TaskSummary,
    pub user_id: Option<String>,
    pub details: Vec<AttributeChange>,
    pub created: DateTime<Utc>,
}

impl TaskHistoryEvent {
    pub fn new(kind: TaskEventKind, task: TaskSummary, user_id: Option<String>) -> Self {
        Self {
            id: ids::new_history_event_id(),
            kind,
            task,
            user_id,
            details: Vec::new(),
            created: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: Vec<AttributeChange>) -> Self {
        self.details = details;
        self
    }
}
