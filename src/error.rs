//! Structured error handling for the task lifecycle core.
//!
//! Single-item operations fail fast with the first applicable [`TaskError`];
//! bulk operations accumulate per-identifier errors in a
//! [`BulkOperationResults`](crate::bulk::BulkOperationResults) instead of
//! raising them.

use crate::state_machine::TaskState;

/// Domain error taxonomy surfaced by every public operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The identifier does not resolve to any existing task.
    #[error("task {task_id} was not found")]
    NotFound { task_id: String },

    /// Creation collided with an existing task (same id or external id).
    #[error("task with external id {external_id} already exists")]
    AlreadyExists { external_id: String },

    /// The requested transition's source-state precondition failed, or a
    /// disallowed callback-state transition was requested.
    #[error("task {task_id} is in state {state} which does not permit this operation")]
    InvalidState { task_id: String, state: TaskState },

    /// Ownership precondition failed for claim/complete.
    #[error("task {task_id} is owned by {owner:?}, but the acting user is {user_id:?}")]
    InvalidOwner {
        task_id: String,
        owner: Option<String>,
        user_id: Option<String>,
    },

    /// Role or per-item permission check failed.
    #[error("user {user_id:?} is not authorized: {reason}")]
    NotAuthorized {
        user_id: Option<String>,
        reason: String,
    },

    /// Optimistic-concurrency mismatch on full update.
    #[error("task {task_id} has already been updated by another user")]
    Concurrency { task_id: String },

    /// Malformed input: empty id, empty custom-field map, invalid object
    /// reference, unparsable callback-state value.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// A bulk mutation affected fewer rows than expected for a reason not
    /// otherwise classifiable.
    #[error("could not update task {task_id}")]
    UpdateFailed { task_id: String },

    /// A required workbasket does not exist or is marked for deletion.
    #[error("workbasket {workbasket} was not found")]
    WorkbasketNotFound { workbasket: String },

    /// A required classification does not exist.
    #[error("classification {key} was not found in domain {domain}")]
    ClassificationNotFound { key: String, domain: String },

    /// The store collaborator reported a failure the core cannot classify.
    #[error("store error: {0}")]
    Store(String),
}

impl TaskError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn not_found(task_id: impl Into<String>) -> Self {
        Self::NotFound {
            task_id: task_id.into(),
        }
    }

    pub fn invalid_state(task_id: impl Into<String>, state: TaskState) -> Self {
        Self::InvalidState {
            task_id: task_id.into(),
            state,
        }
    }
}

/// Error type of the collaborator traits (store, workbasket and
/// classification services). Translated into [`TaskError`] at the service
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Unique-constraint violation on the external id column.
    #[error("duplicate external id {external_id}")]
    DuplicateExternalId { external_id: String },

    /// Anything else the backend reports.
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for TaskError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateExternalId { external_id } => {
                TaskError::AlreadyExists { external_id }
            }
            StoreError::Backend(msg) => TaskError::Store(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
