//! Prefixed id generation for tasks and related records.

use uuid::Uuid;

pub const ID_PREFIX_TASK: &str = "TKI";
pub const ID_PREFIX_EXTERNAL_TASK: &str = "ETI";
pub const ID_PREFIX_BUSINESS_PROCESS: &str = "BPI";
pub const ID_PREFIX_HISTORY_EVENT: &str = "THI";

/// Generate a `PREFIX:uuid` identifier.
pub fn generate_with_prefix(prefix: &str) -> String {
    format!("{prefix}:{}", Uuid::new_v4())
}

pub fn new_task_id() -> String {
    generate_with_prefix(ID_PREFIX_TASK)
}

pub fn new_external_id() -> String {
    generate_with_prefix(ID_PREFIX_EXTERNAL_TASK)
}

pub fn new_business_process_id() -> String {
    generate_with_prefix(ID_PREFIX_BUSINESS_PROCESS)
}

pub fn new_history_event_id() -> String {
    generate_with_prefix(ID_PREFIX_HISTORY_EVENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_uniqueness() {
        let a = new_task_id();
        let b = new_task_id();
        assert!(a.starts_with("TKI:"));
        assert_ne!(a, b);
    }
}
