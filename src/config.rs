//! Configuration types for a backfill run.
//!
//! All run behaviour is controlled through [`BackfillConfig`], built via its
//! [`BackfillConfigBuilder`]. The execution topology (in-process vs. daemon)
//! is an explicit [`SchedulerMode`] value rather than an ambient assumption,
//! so tests can exercise both modes without a real daemon.

use crate::error::BackfillError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default address of the scheduler daemon.
pub const DEFAULT_SCHEDULER_URL: &str = "http://localhost:8082";

/// Configuration for a backfill run.
///
/// Built via [`BackfillConfig::builder()`] or using
/// [`BackfillConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_backfill::{BackfillConfig, RowErrorPolicy, SchedulerMode};
///
/// let config = BackfillConfig::builder()
///     .scheduler_mode(SchedulerMode::Local)
///     .row_policy(RowErrorPolicy::Skip)
///     .workers(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.workers, 4);
/// ```
#[derive(Clone)]
pub struct BackfillConfig {
    /// Which execution topology the scheduler should use. Default: [`SchedulerMode::Remote`].
    pub scheduler_mode: SchedulerMode,

    /// What to do with a manifest row that fails validation. Default: [`RowErrorPolicy::Abort`].
    pub row_policy: RowErrorPolicy,

    /// Download timeout for URL manifests in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Base URL of the scheduler daemon (remote mode only).
    pub scheduler_url: String,

    /// Upper bound on the blocking wait for the daemon. Default: None (wait forever).
    pub scheduler_timeout_secs: Option<u64>,

    /// Number of jobs the in-process scheduler runs at once. Default: 1.
    pub workers: usize,

    /// Ask the scheduler for per-job outcomes, not just an aggregate. Default: true.
    pub detailed_summary: bool,

    /// Receives per-job events from the in-process scheduler.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            scheduler_mode: SchedulerMode::default(),
            row_policy: RowErrorPolicy::default(),
            download_timeout_secs: 120,
            scheduler_url: DEFAULT_SCHEDULER_URL.to_string(),
            scheduler_timeout_secs: None,
            workers: 1,
            detailed_summary: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BackfillConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackfillConfig")
            .field("scheduler_mode", &self.scheduler_mode)
            .field("row_policy", &self.row_policy)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("scheduler_url", &self.scheduler_url)
            .field("scheduler_timeout_secs", &self.scheduler_timeout_secs)
            .field("workers", &self.workers)
            .field("detailed_summary", &self.detailed_summary)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn JobProgressCallback>"),
            )
            .finish()
    }
}

impl BackfillConfig {
    /// Create a new builder for `BackfillConfig`.
    pub fn builder() -> BackfillConfigBuilder {
        BackfillConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BackfillConfig`].
#[derive(Debug)]
pub struct BackfillConfigBuilder {
    config: BackfillConfig,
}

impl BackfillConfigBuilder {
    pub fn scheduler_mode(mut self, mode: SchedulerMode) -> Self {
        self.config.scheduler_mode = mode;
        self
    }

    /// Shorthand for `scheduler_mode(SchedulerMode::from_local_flag(v))`.
    pub fn local_scheduler(self, v: bool) -> Self {
        self.scheduler_mode(SchedulerMode::from_local_flag(v))
    }

    pub fn row_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.config.row_policy = policy;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn scheduler_url(mut self, url: impl Into<String>) -> Self {
        self.config.scheduler_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn scheduler_timeout_secs(mut self, secs: u64) -> Self {
        self.config.scheduler_timeout_secs = Some(secs);
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = n.max(1);
        self
    }

    pub fn detailed_summary(mut self, v: bool) -> Self {
        self.config.detailed_summary = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BackfillConfig, BackfillError> {
        let c = &self.config;
        if c.scheduler_mode == SchedulerMode::Remote {
            if c.scheduler_url.is_empty() {
                return Err(BackfillError::InvalidConfig(
                    "Scheduler URL must not be empty in remote mode".into(),
                ));
            }
            if !(c.scheduler_url.starts_with("http://") || c.scheduler_url.starts_with("https://")) {
                return Err(BackfillError::InvalidConfig(format!(
                    "Scheduler URL must be http(s), got '{}'",
                    c.scheduler_url
                )));
            }
        }
        if c.workers == 0 {
            return Err(BackfillError::InvalidConfig("Workers must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Execution topology requested from the scheduler for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerMode {
    /// Run the batch in-process; no scheduling daemon is assumed to be running.
    Local,
    /// Hand the batch to an externally running scheduler daemon. (default)
    #[default]
    Remote,
}

impl SchedulerMode {
    /// Map the CLI's `local_scheduler` boolean onto a mode.
    pub fn from_local_flag(use_local_scheduler: bool) -> Self {
        if use_local_scheduler {
            SchedulerMode::Local
        } else {
            SchedulerMode::Remote
        }
    }

    pub fn is_local(self) -> bool {
        self == SchedulerMode::Local
    }
}

impl fmt::Display for SchedulerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerMode::Local => write!(f, "local"),
            SchedulerMode::Remote => write!(f, "remote"),
        }
    }
}

/// What happens when a single manifest row fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorPolicy {
    /// Stop the whole run on the first bad row; nothing is submitted. (default)
    #[default]
    Abort,
    /// Drop the bad row, log it, and submit the remaining rows.
    Skip,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_remote_and_abort() {
        let c = BackfillConfig::default();
        assert_eq!(c.scheduler_mode, SchedulerMode::Remote);
        assert_eq!(c.row_policy, RowErrorPolicy::Abort);
        assert_eq!(c.scheduler_url, DEFAULT_SCHEDULER_URL);
        assert!(c.detailed_summary);
        assert_eq!(c.scheduler_timeout_secs, None);
    }

    #[test]
    fn local_flag_maps_to_mode() {
        assert_eq!(SchedulerMode::from_local_flag(true), SchedulerMode::Local);
        assert_eq!(SchedulerMode::from_local_flag(false), SchedulerMode::Remote);
        let c = BackfillConfig::builder().local_scheduler(true).build().unwrap();
        assert!(c.scheduler_mode.is_local());
    }

    #[test]
    fn workers_clamped_to_one() {
        let c = BackfillConfig::builder().workers(0).build().unwrap();
        assert_eq!(c.workers, 1);
    }

    #[test]
    fn scheduler_url_trailing_slash_trimmed() {
        let c = BackfillConfig::builder()
            .scheduler_url("http://sched:8082/")
            .build()
            .unwrap();
        assert_eq!(c.scheduler_url, "http://sched:8082");
    }

    #[test]
    fn remote_mode_rejects_non_http_url() {
        let err = BackfillConfig::builder()
            .scheduler_url("ftp://sched")
            .build()
            .unwrap_err();
        assert!(matches!(err, BackfillError::InvalidConfig(_)));
    }

    #[test]
    fn local_mode_ignores_scheduler_url() {
        let c = BackfillConfig::builder()
            .scheduler_mode(SchedulerMode::Local)
            .scheduler_url("")
            .build();
        assert!(c.is_ok());
    }
}
