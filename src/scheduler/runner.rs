//! Job runners: how the in-process scheduler executes one job.
//!
//! Table extraction and the spreadsheet write live outside this crate. A
//! [`JobRunner`] is the handle to that collaborator; [`CommandRunner`] drives
//! it as an external program, passing the job's parameters as flags.

use crate::error::JobError;
use crate::job::JobDescriptor;
use async_trait::async_trait;
use std::ffi::OsString;
use tokio::process::Command;
use tracing::debug;

/// Longest stderr excerpt kept in a [`JobError::ExitStatus`].
const STDERR_EXCERPT: usize = 2000;

/// Executes a single extraction job.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job: &JobDescriptor) -> Result<(), JobError>;
}

/// Runs each job as `program [base args] --date … --daily-case-growth-page …
/// --positive-breakdown-index … --states-and-districts <json>`.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: OsString,
    base_args: Vec<OsString>,
}

impl CommandRunner {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    /// Arguments placed before the per-job flags (e.g. a subcommand).
    pub fn base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Per-job command-line flags.
    pub fn job_args(job: &JobDescriptor) -> Vec<String> {
        let overrides = serde_json::to_string(&job.states_and_districts).unwrap_or_else(|_| "{}".into());
        vec![
            "--date".into(),
            job.date.format("%Y-%m-%d").to_string(),
            "--daily-case-growth-page".into(),
            job.daily_case_growth_page.to_string(),
            "--positive-breakdown-index".into(),
            job.positive_breakdown_index.to_string(),
            "--states-and-districts".into(),
            overrides,
        ]
    }
}

#[async_trait]
impl JobRunner for CommandRunner {
    async fn run(&self, job: &JobDescriptor) -> Result<(), JobError> {
        let task_id = job.task_id();
        let args = Self::job_args(job);
        debug!("{}: running {:?} {:?}", task_id, self.program, args);

        let output = Command::new(&self.program)
            .args(&self.base_args)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| JobError::Spawn {
                task_id: task_id.clone(),
                detail: format!("{:?}: {}", self.program, e),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let excerpt = match stderr.char_indices().nth(STDERR_EXCERPT) {
            Some((cut, _)) => format!("{}\u{2026}", &stderr[..cut]),
            None => stderr.to_string(),
        };
        Err(JobError::ExitStatus {
            task_id,
            code: output.status.code(),
            stderr: excerpt,
        })
    }
}
