use serde::{Deserialize, Serialize};

/// Per-workbasket permissions checked by the workbasket collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkbasketPermission {
    Read,
    Open,
    Append,
    Transfer,
    Distribute,
}

/// Denormalized snapshot of the queue owning a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbasketSummary {
    pub id: String,
    pub key: String,
    pub domain: String,
    pub name: Option<String>,
    pub owner: Option<String>,
    pub marked_for_deletion: bool,
}

impl WorkbasketSummary {
    pub fn new(id: impl Into<String>, key: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Placeholder summary carrying only an id, used on unsaved tasks until
    /// the real workbasket is resolved at creation.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Placeholder summary carrying only key and domain.
    pub fn with_key(key: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }
}
