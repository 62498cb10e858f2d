//! # Summary Augmentation
//!
//! Attaches denormalized workbasket, classification and attachment data to
//! task summaries fetched in bulk. Every transition path re-reads tasks in
//! enriched form, so augmentation is a first-class bulk operation: a batch of
//! N summaries costs a fixed number of collaborator queries, chunked at the
//! store parameter ceiling.

use tracing::warn;

use super::task_service::TaskService;
use crate::context::RequestContext;
use crate::error::{Result, TaskError};
use crate::models::{AttachmentSummary, ClassificationSummary, TaskSummary};

impl TaskService {
    /// Enrich task summaries with their workbasket, classification and
    /// attachment summaries.
    ///
    /// Summaries whose workbasket is not visible to the caller are dropped
    /// from the result. A missing classification is an inconsistency between
    /// the store and the classification collaborator and fails the call.
    pub async fn augment_task_summaries(
        &self,
        ctx: &RequestContext,
        summaries: Vec<TaskSummary>,
    ) -> Result<Vec<TaskSummary>> {
        let chunk_size = self.config.bulk_chunk_size.max(1);
        let mut augmented = Vec::with_capacity(summaries.len());
        let mut remaining = summaries;
        while !remaining.is_empty() {
            let rest = if remaining.len() > chunk_size {
                remaining.split_off(chunk_size)
            } else {
                Vec::new()
            };
            let chunk = std::mem::replace(&mut remaining, rest);
            augmented.extend(self.augment_chunk(ctx, chunk).await?);
        }
        Ok(augmented)
    }

    async fn augment_chunk(
        &self,
        ctx: &RequestContext,
        mut summaries: Vec<TaskSummary>,
    ) -> Result<Vec<TaskSummary>> {
        if summaries.is_empty() {
            return Ok(summaries);
        }

        let mut task_ids: Vec<String> = summaries.iter().map(|s| s.id.clone()).collect();
        task_ids.sort();
        task_ids.dedup();

        let attachment_summaries = self
            .store
            .attachment_summaries_by_task_ids(&task_ids)
            .await?;

        let mut classification_ids: Vec<String> = summaries
            .iter()
            .map(|s| s.classification_summary.id.clone())
            .chain(
                attachment_summaries
                    .iter()
                    .map(|a| a.classification_summary.id.clone()),
            )
            .collect();
        classification_ids.sort();
        classification_ids.dedup();
        let classifications = self
            .classifications
            .classifications_by_ids(&classification_ids)
            .await?;

        for summary in &mut summaries {
            summary.classification_summary =
                lookup_classification(&classifications, &summary.classification_summary.id)
                    .ok_or_else(|| {
                        TaskError::Store(format!(
                            "no classification found for task {}",
                            summary.id
                        ))
                    })?
                    .clone();
        }

        let attachments = attach_classifications(attachment_summaries, &classifications)?;

        let mut workbasket_ids: Vec<String> = summaries
            .iter()
            .map(|s| s.workbasket_summary.id.clone())
            .collect();
        workbasket_ids.sort();
        workbasket_ids.dedup();
        let visible = self
            .workbaskets
            .visible_workbaskets(&workbasket_ids, ctx)
            .await?;

        let mut result = Vec::with_capacity(summaries.len());
        for mut summary in summaries {
            let Some(workbasket) = visible
                .iter()
                .find(|wb| wb.id == summary.workbasket_summary.id)
            else {
                warn!(task_id = %summary.id, "no visible workbasket for task, dropping from result");
                continue;
            };
            summary.workbasket_summary = workbasket.clone();
            summary.attachment_summaries = attachments
                .iter()
                .filter(|a| a.task_id == summary.id)
                .cloned()
                .collect();
            result.push(summary);
        }
        Ok(result)
    }
}

fn lookup_classification<'a>(
    classifications: &'a [ClassificationSummary],
    classification_id: &str,
) -> Option<&'a ClassificationSummary> {
    classifications.iter().find(|c| c.id == classification_id)
}

fn attach_classifications(
    attachment_summaries: Vec<AttachmentSummary>,
    classifications: &[ClassificationSummary],
) -> Result<Vec<AttachmentSummary>> {
    let mut attachments = Vec::with_capacity(attachment_summaries.len());
    for mut attachment in attachment_summaries {
        attachment.classification_summary =
            lookup_classification(classifications, &attachment.classification_summary.id)
                .ok_or_else(|| {
                    TaskError::Store(format!(
                        "no classification found for attachment {}",
                        attachment.id
                    ))
                })?
                .clone();
        attachments.push(attachment);
    }
    Ok(attachments)
}
