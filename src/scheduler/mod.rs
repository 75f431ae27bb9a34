//! Scheduler seam: where a finished job list leaves this crate.
//!
//! The [`Scheduler`] trait is the whole contract with the workflow engine:
//! one call taking the ordered jobs, the requested [`SchedulerMode`], and
//! whether a detailed summary is wanted, returning a [`RunSummary`].
//!
//! ```text
//!                        ┌─▶ LocalScheduler  ──▶ JobRunner (per job)
//! WorkflowScheduler ─────┤
//!   (dispatch on mode)   └─▶ RemoteScheduler ──▶ daemon over HTTP
//! ```
//!
//! Individual job failures are part of the summary. `Err` is reserved for a
//! scheduler that cannot take or finish the batch at all.

pub mod local;
pub mod remote;
pub mod runner;

use crate::config::{BackfillConfig, SchedulerMode};
use crate::error::BackfillError;
use crate::job::JobDescriptor;
use crate::summary::RunSummary;
use async_trait::async_trait;
use std::sync::Arc;

pub use local::LocalScheduler;
pub use remote::RemoteScheduler;
pub use runner::{CommandRunner, JobRunner};

/// One batch submission.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Jobs in manifest order.
    pub jobs: Vec<JobDescriptor>,
    pub mode: SchedulerMode,
    pub detailed_summary: bool,
}

/// A workflow engine able to execute a batch of jobs.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Execute the batch and block until every job has finished, failed, or
    /// been skipped.
    async fn build(&self, request: BuildRequest) -> Result<RunSummary, BackfillError>;
}

/// Routes each request to the in-process or daemon scheduler by its mode.
pub struct WorkflowScheduler {
    local: LocalScheduler,
    remote: RemoteScheduler,
}

impl WorkflowScheduler {
    pub fn new(local: LocalScheduler, remote: RemoteScheduler) -> Self {
        Self { local, remote }
    }

    /// Build both schedulers from a config and the runner used in local mode.
    pub fn from_config(config: &BackfillConfig, runner: Arc<dyn JobRunner>) -> Result<Self, BackfillError> {
        let mut local = LocalScheduler::new(runner).workers(config.workers);
        if let Some(ref cb) = config.progress_callback {
            local = local.progress_callback(Arc::clone(cb));
        }
        let remote = RemoteScheduler::new(&config.scheduler_url, config.scheduler_timeout_secs)?;
        Ok(Self::new(local, remote))
    }
}

#[async_trait]
impl Scheduler for WorkflowScheduler {
    async fn build(&self, request: BuildRequest) -> Result<RunSummary, BackfillError> {
        match request.mode {
            SchedulerMode::Local => self.local.build(request).await,
            SchedulerMode::Remote => self.remote.build(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use crate::summary::RunStatus;
    use chrono::NaiveDate;

    struct AlwaysOk;

    #[async_trait]
    impl JobRunner for AlwaysOk {
        async fn run(&self, _job: &JobDescriptor) -> Result<(), JobError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn local_mode_never_touches_the_daemon() {
        // Nothing listens on port 9; a remote call would fail.
        let config = BackfillConfig::builder()
            .scheduler_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let scheduler = WorkflowScheduler::from_config(&config, Arc::new(AlwaysOk)).unwrap();

        let job = JobDescriptor::new(NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(), 9, 5);
        let summary = scheduler
            .build(BuildRequest {
                jobs: vec![job],
                mode: SchedulerMode::Local,
                detailed_summary: true,
            })
            .await
            .unwrap();

        assert_eq!(summary.mode, SchedulerMode::Local);
        assert_eq!(summary.status, RunStatus::Success);
    }

    #[tokio::test]
    async fn remote_mode_goes_to_the_daemon() {
        let config = BackfillConfig::builder()
            .scheduler_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let scheduler = WorkflowScheduler::from_config(&config, Arc::new(AlwaysOk)).unwrap();

        let err = scheduler
            .build(BuildRequest {
                jobs: vec![],
                mode: SchedulerMode::Remote,
                detailed_summary: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BackfillError::SchedulerUnavailable { .. }));
    }
}
