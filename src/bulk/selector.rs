//! Bulk selector: resolves a list of requested identifiers into existing,
//! authorized minimal summaries, rejecting every other identifier into the
//! collector with a typed error.
//!
//! The existence filter and the authorization filter run as two separate
//! bulk queries on purpose: the split yields more specific errors (not-found
//! vs. not-authorized), each carrying the identifier that failed.

use tracing::debug;

use super::results::BulkOperationResults;
use crate::context::{RequestContext, Role};
use crate::error::{Result, TaskError};
use crate::models::MinimalTaskSummary;
use crate::storage::TaskStore;

/// The authorized batch plus the per-identifier rejections collected while
/// resolving it.
#[derive(Debug, Default)]
pub struct ResolvedBatch {
    pub summaries: Vec<MinimalTaskSummary>,
    pub results: BulkOperationResults,
}

/// De-duplicate identifiers, preserving first-occurrence order, and split
/// off empty ones into the collector.
///
/// Empty identifiers are recorded under the empty key with an
/// invalid-argument error and take no further part in the batch.
pub fn sanitize_identifiers(
    identifiers: &[String],
    results: &mut BulkOperationResults,
) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut sanitized = Vec::new();
    for identifier in identifiers {
        if identifier.is_empty() {
            results.add_error(
                "",
                TaskError::invalid_argument("identifiers with empty value are not allowed"),
            );
            continue;
        }
        if seen.insert(identifier.clone()) {
            sanitized.push(identifier.clone());
        }
    }
    sanitized
}

/// Resolve task ids into the subset that exists and is authorized for the
/// caller. Never fails for a per-item reason; the collector carries every
/// rejection.
///
/// Batches larger than `chunk_size` are resolved chunk by chunk against the
/// store (store-side parameter limits); the per-item semantics are identical.
pub async fn resolve_authorized_batch(
    store: &dyn TaskStore,
    ctx: &RequestContext,
    task_ids: &[String],
    chunk_size: usize,
) -> Result<ResolvedBatch> {
    let mut results = BulkOperationResults::new();
    let task_ids = sanitize_identifiers(task_ids, &mut results);

    let mut existing: Vec<MinimalTaskSummary> = Vec::new();
    for chunk in task_ids.chunks(chunk_size.max(1)) {
        existing.extend(store.find_existing_tasks(chunk, &[]).await?);
    }

    for task_id in &task_ids {
        if !existing.iter().any(|summary| &summary.id == task_id) {
            results.add_error(task_id.clone(), TaskError::not_found(task_id.clone()));
        }
    }

    let authorized = filter_authorized(store, ctx, existing, &mut results).await?;

    debug!(
        requested = task_ids.len(),
        authorized = authorized.len(),
        rejected = results.error_count(),
        "resolved bulk batch"
    );

    Ok(ResolvedBatch {
        summaries: authorized,
        results,
    })
}

/// Authorization pass over already-existing summaries. Admin and task-admin
/// callers skip the per-workbasket check entirely.
pub async fn filter_authorized(
    store: &dyn TaskStore,
    ctx: &RequestContext,
    existing: Vec<MinimalTaskSummary>,
    results: &mut BulkOperationResults,
) -> Result<Vec<MinimalTaskSummary>> {
    if ctx.is_in_any_role(&[Role::Admin, Role::TaskAdmin]) {
        return Ok(existing);
    }

    let task_ids: Vec<String> = existing.iter().map(|s| s.id.clone()).collect();
    let not_authorized = store
        .filter_task_ids_not_authorized_for(&task_ids, ctx.access_ids())
        .await?;

    for task_id in &not_authorized {
        results.add_error(
            task_id.clone(),
            TaskError::NotAuthorized {
                user_id: ctx.user_id().map(str::to_string),
                reason: format!("no permission for task {task_id}"),
            },
        );
    }

    Ok(existing
        .into_iter()
        .filter(|summary| !not_authorized.contains(&summary.id))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_rejects_empty_and_dedupes() {
        let mut results = BulkOperationResults::new();
        let ids = vec![
            "TKI:1".to_string(),
            String::new(),
            "TKI:2".to_string(),
            "TKI:1".to_string(),
        ];
        let sanitized = sanitize_identifiers(&ids, &mut results);
        assert_eq!(sanitized, vec!["TKI:1".to_string(), "TKI:2".to_string()]);
        assert!(matches!(
            results.error_for(""),
            Some(TaskError::InvalidArgument { .. })
        ));
    }
}
