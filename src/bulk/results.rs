//! Partial-failure collector for bulk operations.

use std::collections::BTreeMap;

use crate::error::TaskError;

/// Per-identifier outcome of a bulk operation.
///
/// A bulk operation never raises for a single item: every rejected identifier
/// is recorded here with its typed error, and processing continues for the
/// rest of the batch. Callers can distinguish "most things happened, here is
/// exactly what didn't and why" from the fail-fast single-item path.
#[derive(Debug, Clone, Default)]
pub struct BulkOperationResults {
    errors: BTreeMap<String, TaskError>,
    succeeded: Vec<String>,
}

impl BulkOperationResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a typed error for one identifier. A later error for the same
    /// identifier replaces the earlier one.
    pub fn add_error(&mut self, identifier: impl Into<String>, error: TaskError) {
        self.errors.insert(identifier.into(), error);
    }

    /// Record one identifier as successfully processed.
    pub fn add_succeeded(&mut self, identifier: impl Into<String>) {
        self.succeeded.push(identifier.into());
    }

    /// Merge another collector into this one (chunked bulk calls resolve
    /// independently and merge their collectors).
    pub fn merge(&mut self, other: BulkOperationResults) {
        self.errors.extend(other.errors);
        self.succeeded.extend(other.succeeded);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.errors.keys().map(String::as_str).collect()
    }

    pub fn succeeded_ids(&self) -> &[String] {
        &self.succeeded
    }

    pub fn error_for(&self, identifier: &str) -> Option<&TaskError> {
        self.errors.get(identifier)
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &TaskError)> {
        self.errors.iter().map(|(id, err)| (id.as_str(), err))
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::TaskState;

    #[test]
    fn test_collects_without_raising() {
        let mut results = BulkOperationResults::new();
        results.add_error("TKI:1", TaskError::not_found("TKI:1"));
        results.add_error(
            "TKI:2",
            TaskError::invalid_state("TKI:2", TaskState::Terminated),
        );
        results.add_succeeded("TKI:3");

        assert!(results.has_errors());
        assert_eq!(results.error_count(), 2);
        assert_eq!(results.failed_ids(), vec!["TKI:1", "TKI:2"]);
        assert_eq!(results.succeeded_ids(), ["TKI:3".to_string()]);
        assert!(matches!(
            results.error_for("TKI:1"),
            Some(TaskError::NotFound { .. })
        ));
    }

    #[test]
    fn test_merge_combines_chunks() {
        let mut first = BulkOperationResults::new();
        first.add_error("TKI:1", TaskError::not_found("TKI:1"));
        first.add_succeeded("TKI:2");

        let mut second = BulkOperationResults::new();
        second.add_error("TKI:3", TaskError::not_found("TKI:3"));

        first.merge(second);
        assert_eq!(first.error_count(), 2);
        assert_eq!(first.succeeded_ids().len(), 1);
    }
}
