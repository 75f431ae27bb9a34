//! Run summary: the structured result of one batch submission.
//!
//! A [`RunSummary`] carries per-job outcomes, an aggregate [`RunStatus`], and
//! the rendered execution summary text, so both a human and an automated
//! check can consume it without parsing strings.

use crate::config::SchedulerMode;
use crate::error::JobError;
use crate::job::JobDescriptor;
use crate::pipeline::normalize::RowRejection;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

const BANNER: &str = "===== Backfill Execution Summary =====";

/// What happened to one submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Succeeded,
    Failed,
    /// Not run by the scheduler, e.g. a duplicate of an earlier job.
    Skipped,
}

/// Outcome of a single job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub task_id: String,
    pub job: JobDescriptor,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
    /// Free-form scheduler remark, e.g. why a job was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl JobOutcome {
    pub fn succeeded(job: JobDescriptor, duration_ms: u64) -> Self {
        Self {
            task_id: job.task_id(),
            job,
            status: JobStatus::Succeeded,
            error: None,
            note: None,
            duration_ms,
        }
    }

    pub fn failed(job: JobDescriptor, error: JobError, duration_ms: u64) -> Self {
        Self {
            task_id: job.task_id(),
            job,
            status: JobStatus::Failed,
            error: Some(error),
            note: None,
            duration_ms,
        }
    }

    pub fn skipped(job: JobDescriptor, note: impl Into<String>) -> Self {
        Self {
            task_id: job.task_id(),
            job,
            status: JobStatus::Skipped,
            error: None,
            note: Some(note.into()),
            duration_ms: 0,
        }
    }
}

/// Aggregate status of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No job failed.
    Success,
    /// Some jobs failed, at least one succeeded.
    PartialFailure,
    /// At least one job failed and none succeeded.
    Failed,
    /// Nothing was submitted.
    Empty,
}

impl RunStatus {
    pub fn from_outcomes(outcomes: &[JobOutcome]) -> Self {
        let failed = count(outcomes, JobStatus::Failed);
        let succeeded = count(outcomes, JobStatus::Succeeded);
        if outcomes.is_empty() {
            RunStatus::Empty
        } else if failed == 0 {
            RunStatus::Success
        } else if succeeded == 0 {
            RunStatus::Failed
        } else {
            RunStatus::PartialFailure
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Empty)
    }
}

/// Result of one batch submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: SchedulerMode,
    pub status: RunStatus,
    /// Per-job outcomes in submission order.
    pub outcomes: Vec<JobOutcome>,
    /// Manifest rows dropped before submission under the skip policy.
    #[serde(default)]
    pub rejected_rows: Vec<RowRejection>,
    /// Human-readable execution summary.
    pub summary_text: String,
    #[serde(default)]
    pub duration_ms: u64,
}

impl RunSummary {
    /// Build a summary from job outcomes, rendering the text report.
    ///
    /// With `detailed = false` the text only lists counts, not individual jobs.
    pub fn from_outcomes(
        mode: SchedulerMode,
        outcomes: Vec<JobOutcome>,
        detailed: bool,
        duration_ms: u64,
    ) -> Self {
        let status = RunStatus::from_outcomes(&outcomes);
        let summary_text = render_text(&outcomes, status, detailed);
        Self {
            mode,
            status,
            outcomes,
            rejected_rows: Vec::new(),
            summary_text,
            duration_ms,
        }
    }

    /// Attach rows rejected before submission.
    ///
    /// The scheduler's summary text is kept as is; a rejected-rows section
    /// is appended after it.
    pub fn with_rejected_rows(mut self, rejected: Vec<RowRejection>, detailed: bool) -> Self {
        if rejected.is_empty() {
            return self;
        }
        if !self.summary_text.ends_with('\n') {
            self.summary_text.push('\n');
        }
        self.summary_text.push_str(&render_rejected(&rejected, detailed));
        self.rejected_rows = rejected;
        self
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        count(&self.outcomes, JobStatus::Succeeded)
    }

    pub fn failed(&self) -> usize {
        count(&self.outcomes, JobStatus::Failed)
    }

    pub fn skipped(&self) -> usize {
        count(&self.outcomes, JobStatus::Skipped)
    }
}

fn count(outcomes: &[JobOutcome], status: JobStatus) -> usize {
    outcomes.iter().filter(|o| o.status == status).count()
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Render the execution summary text.
fn render_text(outcomes: &[JobOutcome], status: RunStatus, detailed: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{BANNER}\n");
    let _ = writeln!(out, "Scheduled {} of which:", plural(outcomes.len(), "job", "jobs"));

    let sections = [
        (JobStatus::Succeeded, "ran successfully"),
        (JobStatus::Failed, "failed"),
        (JobStatus::Skipped, "skipped"),
    ];
    for (status, label) in sections {
        let group: Vec<&JobOutcome> = outcomes.iter().filter(|o| o.status == status).collect();
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(out, "* {} {}:", group.len(), label);
        if !detailed {
            continue;
        }
        for o in group {
            let _ = match (&o.error, &o.note) {
                (Some(e), _) => writeln!(out, "    - {} ({})", o.job, e),
                (None, Some(note)) => writeln!(out, "    - {} ({})", o.job, note),
                (None, None) => writeln!(out, "    - {}", o.job),
            };
        }
    }

    let verdict = match status {
        RunStatus::Success => "This progress looks :) because there were no failed jobs",
        RunStatus::Empty => "This progress looks :| because there was nothing to run",
        RunStatus::PartialFailure | RunStatus::Failed => {
            "This progress looks :( because there were failed jobs"
        }
    };
    let _ = writeln!(out, "\n{verdict}\n");
    let _ = write!(out, "{BANNER}");
    out
}

/// Render the section listing manifest rows dropped before submission.
fn render_rejected(rejected: &[RowRejection], detailed: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} rejected before submission:",
        plural(rejected.len(), "manifest row was", "manifest rows were")
    );
    if detailed {
        for r in rejected {
            let _ = writeln!(out, "    - {}", r.reason);
        }
    }
    out
}
