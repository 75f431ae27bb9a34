//! Error types for the pdf-backfill library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BackfillError`] — **Fatal**: the run cannot proceed at all (manifest
//!   unreachable, malformed manifest, a row that fails validation, scheduler
//!   daemon unreachable). Returned as `Err(BackfillError)` from the top-level
//!   entry points, always before or instead of a submission.
//!
//! * [`JobError`] — **Non-fatal**: a single extraction job failed inside the
//!   scheduler. Stored inside [`crate::summary::JobOutcome`] so a partially
//!   failed batch still produces a full summary rather than an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All fatal errors returned by the pdf-backfill library.
///
/// Job-level failures use [`JobError`] and are stored in
/// [`crate::summary::JobOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum BackfillError {
    // ── Manifest input errors ─────────────────────────────────────────────
    /// The manifest URI could not be opened or fetched.
    #[error("Manifest '{uri}' is unavailable: {reason}")]
    ResourceUnavailable { uri: String, reason: String },

    /// Download of a remote manifest exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{uri}'\nIncrease --download-timeout.")]
    DownloadTimeout { uri: String, secs: u64 },

    /// The manifest was read but is not a usable table.
    #[error("Malformed manifest '{uri}': {detail}")]
    MalformedManifest { uri: String, detail: String },

    // ── Row validation errors ─────────────────────────────────────────────
    /// A row's date field does not parse as a calendar date.
    #[error("Row {row}: column '{field}' has invalid date {value:?}")]
    InvalidDate {
        row: usize,
        field: &'static str,
        value: String,
    },

    /// A row's page number is below 1.
    #[error("Row {row}: column '{field}' must be a page number >= 1, got {value}")]
    InvalidPageNumber {
        row: usize,
        field: &'static str,
        value: i64,
    },

    // ── Scheduler errors ──────────────────────────────────────────────────
    /// The scheduler could not accept or finish the batch at all.
    ///
    /// Individual job failures never surface here; they are reported in the
    /// run summary.
    #[error("Scheduler at '{endpoint}' is unavailable: {reason}")]
    SchedulerUnavailable { endpoint: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable discriminant of a [`BackfillError`], for matching without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ResourceUnavailable,
    MalformedManifest,
    InvalidDate,
    InvalidPageNumber,
    SchedulerUnavailable,
    InvalidConfig,
    Internal,
}

impl BackfillError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackfillError::ResourceUnavailable { .. } | BackfillError::DownloadTimeout { .. } => {
                ErrorKind::ResourceUnavailable
            }
            BackfillError::MalformedManifest { .. } => ErrorKind::MalformedManifest,
            BackfillError::InvalidDate { .. } => ErrorKind::InvalidDate,
            BackfillError::InvalidPageNumber { .. } => ErrorKind::InvalidPageNumber,
            BackfillError::SchedulerUnavailable { .. } => ErrorKind::SchedulerUnavailable,
            BackfillError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            BackfillError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The one-based manifest row a validation error refers to, if any.
    pub fn row(&self) -> Option<usize> {
        match self {
            BackfillError::InvalidDate { row, .. } | BackfillError::InvalidPageNumber { row, .. } => {
                Some(*row)
            }
            _ => None,
        }
    }
}

/// A non-fatal error for a single job.
///
/// Stored alongside [`crate::summary::JobOutcome`] when a job fails.
/// The batch continues; the scheduler decides what else to run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobError {
    /// The extraction program could not be started.
    #[error("{task_id}: failed to start extractor: {detail}")]
    Spawn { task_id: String, detail: String },

    /// The extraction program ran but exited unsuccessfully.
    #[error("{task_id}: extractor exited with {code:?}: {stderr}")]
    ExitStatus {
        task_id: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The job raised an error while running.
    #[error("{task_id}: {detail}")]
    Failed { task_id: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_page_number_display_names_row_and_field() {
        let e = BackfillError::InvalidPageNumber {
            row: 2,
            field: "positive-breakdown-page",
            value: 0,
        };
        let msg = e.to_string();
        assert!(msg.contains("Row 2"), "got: {msg}");
        assert!(msg.contains("positive-breakdown-page"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::InvalidPageNumber);
        assert_eq!(e.row(), Some(2));
    }

    #[test]
    fn invalid_date_display_quotes_value() {
        let e = BackfillError::InvalidDate {
            row: 4,
            field: "date-of-pdf",
            value: "not-a-date".into(),
        };
        assert!(e.to_string().contains("\"not-a-date\""));
        assert_eq!(e.kind(), ErrorKind::InvalidDate);
    }

    #[test]
    fn download_timeout_is_resource_unavailable() {
        let e = BackfillError::DownloadTimeout {
            uri: "https://example.com/m.csv".into(),
            secs: 5,
        };
        assert_eq!(e.kind(), ErrorKind::ResourceUnavailable);
        assert!(e.to_string().contains("5s"));
        assert_eq!(e.row(), None);
    }

    #[test]
    fn job_error_serialises_with_kind_tag() {
        let e = JobError::ExitStatus {
            task_id: "t".into(),
            code: Some(3),
            stderr: "boom".into(),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "exit_status");
        assert_eq!(json["code"], 3);
    }
}
