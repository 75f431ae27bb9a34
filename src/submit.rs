//! Batch submission: hand the whole job list to the scheduler in one call.

use crate::config::{BackfillConfig, SchedulerMode};
use crate::error::BackfillError;
use crate::job::JobDescriptor;
use crate::scheduler::{BuildRequest, Scheduler};
use crate::summary::RunSummary;
use tracing::info;

/// Submit `jobs` as a single batch and wait for the scheduler to finish.
///
/// Jobs that fail inside the scheduler are reported in the returned
/// [`RunSummary`]; this function does not retry them and does not turn them
/// into an `Err`. `Err` means the scheduler itself was unusable.
pub async fn submit(
    scheduler: &dyn Scheduler,
    jobs: Vec<JobDescriptor>,
    mode: SchedulerMode,
    detailed_summary: bool,
) -> Result<RunSummary, BackfillError> {
    info!("Submitting batch of {} jobs ({} scheduler)", jobs.len(), mode);
    let summary = scheduler
        .build(BuildRequest {
            jobs,
            mode,
            detailed_summary,
        })
        .await?;
    info!(
        "Batch finished: {} succeeded, {} failed, {} skipped in {}ms",
        summary.succeeded(),
        summary.failed(),
        summary.skipped(),
        summary.duration_ms
    );
    Ok(summary)
}

/// [`submit`] with mode and detail taken from `config`.
pub async fn submit_with_config(
    scheduler: &dyn Scheduler,
    jobs: Vec<JobDescriptor>,
    config: &BackfillConfig,
) -> Result<RunSummary, BackfillError> {
    submit(scheduler, jobs, config.scheduler_mode, config.detailed_summary).await
}
