//! Daemon scheduler client: hands the batch to an already running scheduler.
//!
//! The batch is POSTed as JSON to `{base_url}/api/batches`; the daemon runs
//! it under its own dependency, retry, and persistence policy and answers,
//! once the batch is finished, with per-job outcomes. The request blocks for
//! that whole time unless a timeout was configured.

use crate::config::SchedulerMode;
use crate::error::BackfillError;
use crate::job::JobDescriptor;
use crate::scheduler::{BuildRequest, Scheduler};
use crate::summary::{JobOutcome, RunSummary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Path of the batch endpoint below the daemon's base URL.
pub const BATCH_ENDPOINT: &str = "/api/batches";

/// Request body sent to the daemon.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchPayload {
    pub jobs: Vec<BatchJob>,
    pub detailed_summary: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchJob {
    pub task_id: String,
    #[serde(flatten)]
    pub job: JobDescriptor,
}

/// Response body returned by the daemon.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
    /// Daemon-rendered summary; rendered locally when absent.
    #[serde(default)]
    pub summary_text: Option<String>,
}

pub struct RemoteScheduler {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteScheduler {
    pub fn new(base_url: &str, timeout_secs: Option<u64>) -> Result<Self, BackfillError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| BackfillError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), BATCH_ENDPOINT),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn unavailable(&self, reason: impl Into<String>) -> BackfillError {
        BackfillError::SchedulerUnavailable {
            endpoint: self.endpoint.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Scheduler for RemoteScheduler {
    async fn build(&self, request: BuildRequest) -> Result<RunSummary, BackfillError> {
        let start = Instant::now();
        let detailed = request.detailed_summary;
        let payload = BatchPayload {
            jobs: request
                .jobs
                .into_iter()
                .map(|job| BatchJob {
                    task_id: job.task_id(),
                    job,
                })
                .collect(),
            detailed_summary: detailed,
        };
        info!("Submitting {} jobs to scheduler at {}", payload.jobs.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.unavailable(format!("HTTP {status}: {}", body.trim())));
        }

        let report: BatchReport = response
            .json()
            .await
            .map_err(|e| self.unavailable(format!("unreadable batch report: {e}")))?;
        debug!("Scheduler reported {} outcomes", report.outcomes.len());

        let mut summary = RunSummary::from_outcomes(
            SchedulerMode::Remote,
            report.outcomes,
            detailed,
            start.elapsed().as_millis() as u64,
        );
        if let Some(text) = report.summary_text.filter(|t| !t.trim().is_empty()) {
            summary.summary_text = text;
        }
        Ok(summary)
    }
}
