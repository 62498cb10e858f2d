use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classification::ClassificationSummary;
use super::object_reference::ObjectReference;

/// A document attached to a task, carrying its own classification snapshot.
/// Attachment lifetime is bounded by the owning task's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub task_id: String,
    pub classification_summary: ClassificationSummary,
    pub object_reference: Option<ObjectReference>,
    pub channel: Option<String>,
    pub received: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub custom_attributes: serde_json::Map<String, serde_json::Value>,
}

/// Read-only projection of an attachment for bulk augmentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentSummary {
    pub id: String,
    pub task_id: String,
    pub classification_summary: ClassificationSummary,
    pub object_reference: Option<ObjectReference>,
    pub channel: Option<String>,
    pub received: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl Attachment {
    pub fn as_summary(&self) -> AttachmentSummary {
        AttachmentSummary {
            id: self.id.clone(),
            task_id: self.task_id.clone(),
            classification_summary: self.classification_summary.clone(),
            object_reference: self.object_reference.clone(),
            channel: self.channel.clone(),
            received: self.received,
            created: self.created,
            modified: self.modified,
        }
    }
}
