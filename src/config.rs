use crate::error::{Result, TaskError};

/// Runtime configuration for the lifecycle core.
#[derive(Debug, Clone)]
pub struct TaskdeskConfig {
    /// When enabled, task creation requires an authenticated user id.
    pub security_enabled: bool,
    /// When enabled, one history event is published per successful transition.
    pub history_enabled: bool,
    /// Delete history events together with their task.
    pub delete_history_on_task_deletion: bool,
    /// Ceiling for id-list parameters in a single bulk store call. Larger
    /// batches are chunked; per-item error semantics are unaffected.
    pub bulk_chunk_size: usize,
    /// Capacity of the history event broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for TaskdeskConfig {
    fn default() -> Self {
        Self {
            security_enabled: true,
            history_enabled: true,
            delete_history_on_task_deletion: false,
            bulk_chunk_size: 32_000,
            event_channel_capacity: 1000,
        }
    }
}

impl TaskdeskConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(security) = std::env::var("TASKDESK_SECURITY_ENABLED") {
            config.security_enabled = security.parse().map_err(|e| {
                TaskError::invalid_argument(format!("invalid TASKDESK_SECURITY_ENABLED: {e}"))
            })?;
        }

        if let Ok(history) = std::env::var("TASKDESK_HISTORY_ENABLED") {
            config.history_enabled = history.parse().map_err(|e| {
                TaskError::invalid_argument(format!("invalid TASKDESK_HISTORY_ENABLED: {e}"))
            })?;
        }

        if let Ok(chunk) = std::env::var("TASKDESK_BULK_CHUNK_SIZE") {
            config.bulk_chunk_size = chunk.parse().map_err(|e| {
                TaskError::invalid_argument(format!("invalid TASKDESK_BULK_CHUNK_SIZE: {e}"))
            })?;
        }

        Ok(config)
    }
}
