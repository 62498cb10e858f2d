use serde::{Deserialize, Serialize};

/// Denormalized snapshot of a classification, as attached to tasks and
/// attachments at last sync. Owned by the classification collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub id: String,
    pub key: String,
    pub domain: String,
    pub category: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: i32,
    pub service_level: Option<String>,
}

impl ClassificationSummary {
    pub fn new(id: impl Into<String>, key: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }
}
