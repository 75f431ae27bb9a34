//! End-to-end entry points: manifest URI → job list → submission → summary.
//!
//! The whole job list is built before anything is submitted; a manifest
//! that fails to load or (under the default policy) contains one bad row
//! never reaches the scheduler.

use crate::config::BackfillConfig;
use crate::error::BackfillError;
use crate::job::{build_jobs, JobDescriptor};
use crate::pipeline::normalize::{normalize_rows, RowRejection};
use crate::pipeline::{input, manifest};
use crate::scheduler::Scheduler;
use crate::submit::submit_with_config;
use crate::summary::RunSummary;
use serde::{Deserialize, Serialize};
use tracing::info;

/// The jobs derived from a manifest, before submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillPlan {
    pub manifest_uri: String,
    /// One job per accepted row, in manifest order.
    pub jobs: Vec<JobDescriptor>,
    /// Rows dropped under [`crate::config::RowErrorPolicy::Skip`].
    pub rejected_rows: Vec<RowRejection>,
}

/// Read, validate, and translate a manifest into jobs. Nothing is submitted.
///
/// # Errors
/// - `ResourceUnavailable` / `DownloadTimeout` if the URI cannot be read
/// - `MalformedManifest` if columns are missing or rows are not tabular
/// - `InvalidDate` / `InvalidPageNumber` for the first bad row, unless the
///   config's row policy is `Skip`
pub async fn plan(
    manifest_uri: impl AsRef<str>,
    config: &BackfillConfig,
) -> Result<BackfillPlan, BackfillError> {
    let uri = manifest_uri.as_ref();
    info!("Reading manifest: {}", uri);

    let source = input::resolve_input(uri, config.download_timeout_secs).await?;
    let rows = manifest::read_manifest(&source)?;
    info!("Manifest has {} rows", rows.len());

    let (normalized, rejected_rows) = normalize_rows(&rows, config.row_policy)?;
    let jobs = build_jobs(&normalized);
    info!("Built {} jobs ({} rows rejected)", jobs.len(), rejected_rows.len());

    Ok(BackfillPlan {
        manifest_uri: uri.to_string(),
        jobs,
        rejected_rows,
    })
}

/// Plan the manifest and submit the resulting batch to `scheduler`.
///
/// # Returns
/// `Ok(RunSummary)` once the scheduler has finished, even if some jobs
/// failed (check `summary.status`).
pub async fn backfill(
    manifest_uri: impl AsRef<str>,
    config: &BackfillConfig,
    scheduler: &dyn Scheduler,
) -> Result<RunSummary, BackfillError> {
    let plan = plan(manifest_uri, config).await?;
    let summary = submit_with_config(scheduler, plan.jobs, config).await?;
    Ok(summary.with_rejected_rows(plan.rejected_rows, config.detailed_summary))
}

/// Synchronous wrapper around [`backfill`].
///
/// Creates a temporary tokio runtime internally.
pub fn backfill_sync(
    manifest_uri: impl AsRef<str>,
    config: &BackfillConfig,
    scheduler: &dyn Scheduler,
) -> Result<RunSummary, BackfillError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BackfillError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(backfill(manifest_uri, config, scheduler))
}
