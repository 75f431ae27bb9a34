//! Progress-callback trait for per-job scheduler events.
//!
//! Inject an [`Arc<dyn JobProgressCallback>`] via
//! [`crate::config::BackfillConfigBuilder::progress_callback`] to receive
//! events as the in-process scheduler works through the batch. The remote
//! scheduler only reports the batch boundaries, since per-job execution
//! happens inside the daemon.
//!
//! # Example
//!
//! ```rust
//! use pdf_backfill::{BackfillConfig, JobProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     finished: Arc<AtomicUsize>,
//! }
//!
//! impl JobProgressCallback for CountingCallback {
//!     fn on_job_complete(&self, position: usize, total_jobs: usize, task_id: &str) {
//!         self.finished.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{position}/{total_jobs} {task_id} done");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     finished: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = BackfillConfig::builder()
//!     .progress_callback(counter as Arc<dyn JobProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the scheduler as it processes each job.
///
/// Implementations must be `Send + Sync`: with more than one worker, the
/// per-job methods may be called concurrently. All methods have default
/// no-op implementations so callers only override what they care about.
///
/// `position` is the job's one-based position in the submitted batch.
pub trait JobProgressCallback: Send + Sync {
    /// Called once before any job starts.
    fn on_batch_start(&self, total_jobs: usize) {
        let _ = total_jobs;
    }

    /// Called just before a job is handed to the runner.
    fn on_job_start(&self, position: usize, total_jobs: usize, task_id: &str) {
        let _ = (position, total_jobs, task_id);
    }

    /// Called when a job finishes successfully.
    fn on_job_complete(&self, position: usize, total_jobs: usize, task_id: &str) {
        let _ = (position, total_jobs, task_id);
    }

    /// Called when a job fails.
    fn on_job_error(&self, position: usize, total_jobs: usize, task_id: &str, error: &str) {
        let _ = (position, total_jobs, task_id, error);
    }

    /// Called when a job is not run (e.g. duplicate of an earlier job).
    fn on_job_skipped(&self, position: usize, total_jobs: usize, task_id: &str) {
        let _ = (position, total_jobs, task_id);
    }

    /// Called once after every job has been attempted.
    fn on_batch_complete(&self, total_jobs: usize, succeeded: usize) {
        let _ = (total_jobs, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl JobProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BackfillConfig`].
pub type ProgressCallback = Arc<dyn JobProgressCallback>;
