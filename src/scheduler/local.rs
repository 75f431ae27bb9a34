//! In-process scheduler: runs the batch inside this process, no daemon.
//!
//! Jobs are deduplicated by [`JobDescriptor::task_id`]: the first occurrence
//! runs, later identical ones are reported as skipped. Unique jobs run
//! through the [`JobRunner`] with up to `workers` in flight; outcomes come
//! back in submission order regardless of completion order. Failed jobs are
//! not retried.

use crate::config::SchedulerMode;
use crate::error::BackfillError;
use crate::job::JobDescriptor;
use crate::progress::ProgressCallback;
use crate::scheduler::runner::JobRunner;
use crate::scheduler::{BuildRequest, Scheduler};
use crate::summary::{JobOutcome, JobStatus, RunSummary};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub struct LocalScheduler {
    runner: Arc<dyn JobRunner>,
    workers: usize,
    progress: Option<ProgressCallback>,
}

/// A job's place in the batch: run it, or point at the earlier twin.
enum Slot {
    Run(JobDescriptor),
    Duplicate { job: JobDescriptor, first: usize },
}

impl LocalScheduler {
    pub fn new(runner: Arc<dyn JobRunner>) -> Self {
        Self {
            runner,
            workers: 1,
            progress: None,
        }
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.progress = Some(cb);
        self
    }

    fn plan(jobs: Vec<JobDescriptor>) -> Vec<Slot> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        jobs.into_iter()
            .enumerate()
            .map(|(i, job)| {
                let id = job.task_id();
                if let Some(&first) = seen.get(&id) {
                    Slot::Duplicate { job, first }
                } else {
                    seen.insert(id, i);
                    Slot::Run(job)
                }
            })
            .collect()
    }

    async fn run_one(&self, position: usize, total: usize, job: JobDescriptor) -> JobOutcome {
        let task_id = job.task_id();
        if let Some(ref cb) = self.progress {
            cb.on_job_start(position, total, &task_id);
        }

        let start = Instant::now();
        let result = self.runner.run(&job).await;
        let elapsed = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                if let Some(ref cb) = self.progress {
                    cb.on_job_complete(position, total, &task_id);
                }
                JobOutcome::succeeded(job, elapsed)
            }
            Err(e) => {
                warn!("Job {} failed: {}", task_id, e);
                if let Some(ref cb) = self.progress {
                    cb.on_job_error(position, total, &task_id, &e.to_string());
                }
                JobOutcome::failed(job, e, elapsed)
            }
        }
    }
}

#[async_trait]
impl Scheduler for LocalScheduler {
    async fn build(&self, request: BuildRequest) -> Result<RunSummary, BackfillError> {
        let start = Instant::now();
        let total = request.jobs.len();
        info!("Local scheduler: {} jobs, {} worker(s)", total, self.workers);
        if let Some(ref cb) = self.progress {
            cb.on_batch_start(total);
        }

        let outcomes: Vec<JobOutcome> = stream::iter(Self::plan(request.jobs).into_iter().enumerate())
            .map(|(i, slot)| async move {
                match slot {
                    Slot::Run(job) => self.run_one(i + 1, total, job).await,
                    Slot::Duplicate { job, first } => {
                        if let Some(ref cb) = self.progress {
                            cb.on_job_skipped(i + 1, total, &job.task_id());
                        }
                        JobOutcome::skipped(job, format!("duplicate of job {}", first + 1))
                    }
                }
            })
            .buffered(self.workers)
            .collect()
            .await;

        let succeeded = outcomes.iter().filter(|o| o.status == JobStatus::Succeeded).count();
        if let Some(ref cb) = self.progress {
            cb.on_batch_complete(total, succeeded);
        }
        info!("Local scheduler finished: {}/{} jobs succeeded", succeeded, total);

        Ok(RunSummary::from_outcomes(
            SchedulerMode::Local,
            outcomes,
            request.detailed_summary,
            start.elapsed().as_millis() as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use crate::progress::JobProgressCallback;
    use crate::summary::RunStatus;
    use chrono::{Datelike, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn job(d: u32, index: u32) -> JobDescriptor {
        JobDescriptor::new(NaiveDate::from_ymd_opt(2021, 3, d).unwrap(), 9, index)
    }

    fn request(jobs: Vec<JobDescriptor>) -> BuildRequest {
        BuildRequest {
            jobs,
            mode: SchedulerMode::Local,
            detailed_summary: true,
        }
    }

    /// Records run order; fails any job whose breakdown index is 99.
    #[derive(Default)]
    struct RecordingRunner {
        ran: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl JobRunner for RecordingRunner {
        async fn run(&self, job: &JobDescriptor) -> Result<(), JobError> {
            // Later jobs finish first, to exercise ordering under concurrency.
            tokio::time::sleep(Duration::from_millis(40 - u64::from(job.date.day()))).await;
            self.ran.lock().unwrap().push(job.task_id());
            if job.positive_breakdown_index == 99 {
                Err(JobError::Failed {
                    task_id: job.task_id(),
                    detail: "table not found".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn failures_are_reported_not_raised() {
        let runner = Arc::new(RecordingRunner::default());
        let scheduler = LocalScheduler::new(runner.clone());

        let summary = scheduler
            .build(request(vec![job(15, 5), job(16, 99), job(17, 5)]))
            .await
            .unwrap();

        assert_eq!(summary.status, RunStatus::PartialFailure);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.outcomes[1].status, JobStatus::Failed);
        assert_eq!(runner.ran.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn outcomes_keep_submission_order_with_many_workers() {
        let runner = Arc::new(RecordingRunner::default());
        let scheduler = LocalScheduler::new(runner.clone()).workers(4);

        let jobs = vec![job(1, 0), job(2, 0), job(3, 0), job(4, 0)];
        let summary = scheduler.build(request(jobs.clone())).await.unwrap();

        let got: Vec<&JobDescriptor> = summary.outcomes.iter().map(|o| &o.job).collect();
        assert_eq!(got, jobs.iter().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn duplicates_run_once() {
        let runner = Arc::new(RecordingRunner::default());
        let scheduler = LocalScheduler::new(runner.clone());

        let summary = scheduler
            .build(request(vec![job(15, 5), job(16, 5), job(15, 5)]))
            .await
            .unwrap();

        assert_eq!(runner.ran.lock().unwrap().len(), 2);
        assert_eq!(summary.outcomes[2].status, JobStatus::Skipped);
        assert_eq!(summary.outcomes[2].note.as_deref(), Some("duplicate of job 1"));
        assert_eq!(summary.status, RunStatus::Success);
    }

    #[tokio::test]
    async fn same_regions_with_different_values_both_run() {
        let runner = Arc::new(RecordingRunner::default());
        let scheduler = LocalScheduler::new(runner.clone());

        let first = job(15, 5).with_region_override("MH", serde_json::json!({"page": 3}));
        let second = job(15, 5).with_region_override("MH", serde_json::json!({"page": 7}));
        let summary = scheduler.build(request(vec![first, second])).await.unwrap();

        assert_eq!(runner.ran.lock().unwrap().len(), 2);
        assert!(summary
            .outcomes
            .iter()
            .all(|o| o.status == JobStatus::Succeeded && o.note.is_none()));
    }

    #[tokio::test]
    async fn empty_batch_is_empty_summary() {
        let scheduler = LocalScheduler::new(Arc::new(RecordingRunner::default()));
        let summary = scheduler.build(request(vec![])).await.unwrap();
        assert_eq!(summary.status, RunStatus::Empty);
        assert_eq!(summary.total(), 0);
    }

    #[derive(Default)]
    struct Counts {
        started: AtomicUsize,
        done: AtomicUsize,
        errors: AtomicUsize,
        skipped: AtomicUsize,
        batch: AtomicUsize,
    }

    impl JobProgressCallback for Counts {
        fn on_batch_start(&self, total_jobs: usize) {
            self.batch.store(total_jobs, Ordering::SeqCst);
        }
        fn on_job_start(&self, _: usize, _: usize, _: &str) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_job_complete(&self, _: usize, _: usize, _: &str) {
            self.done.fetch_add(1, Ordering::SeqCst);
        }
        fn on_job_error(&self, _: usize, _: usize, _: &str, _: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn on_job_skipped(&self, _: usize, _: usize, _: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn progress_events_fire() {
        let counts = Arc::new(Counts::default());
        let scheduler = LocalScheduler::new(Arc::new(RecordingRunner::default()))
            .progress_callback(counts.clone());

        scheduler
            .build(request(vec![job(15, 5), job(16, 99), job(15, 5)]))
            .await
            .unwrap();

        assert_eq!(counts.batch.load(Ordering::SeqCst), 3);
        assert_eq!(counts.started.load(Ordering::SeqCst), 2);
        assert_eq!(counts.done.load(Ordering::SeqCst), 1);
        assert_eq!(counts.errors.load(Ordering::SeqCst), 1);
        assert_eq!(counts.skipped.load(Ordering::SeqCst), 1);
    }
}
