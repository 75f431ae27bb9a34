//! # pdf-backfill
//!
//! Turn a manifest of historical PDF-dashboard page coordinates into a batch
//! of extraction jobs and drive a workflow scheduler to run them.
//!
//! Each manifest row names one dated report and the pages holding its
//! tables. Every row becomes one [`JobDescriptor`]; the full list is handed
//! to a [`Scheduler`] in a single submission, and the scheduler's
//! [`RunSummary`] is reported back.
//!
//! ## Pipeline Overview
//!
//! ```text
//! manifest URI
//!  │
//!  ├─ 1. Input      read local file or download from URL
//!  ├─ 2. Manifest   CSV → rows, columns looked up by name
//!  ├─ 3. Normalize  parse dates, page number → zero-based breakdown index
//!  ├─ 4. Jobs       one immutable JobDescriptor per row, manifest order
//!  ├─ 5. Submit     one batch, local (in-process) or remote (daemon) mode
//!  └─ 6. Report     execution summary text or JSON
//! ```
//!
//! ## Manifest format
//!
//! ```text
//! date-of-pdf,elderly-table-page,positive-breakdown-page,case-growth-page
//! 2021-03-15,4,6,9
//! ```
//!
//! yields `JobDescriptor { date: 2021-03-15, daily_case_growth_page: 9,
//! positive_breakdown_index: 5, states_and_districts: {} }`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_backfill::{backfill, BackfillConfig, CommandRunner, WorkflowScheduler};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BackfillConfig::builder().local_scheduler(true).build()?;
//!     let runner = Arc::new(CommandRunner::new("pdf-dashboard-extract"));
//!     let scheduler = WorkflowScheduler::from_config(&config, runner)?;
//!
//!     let summary = backfill("old_pdfs.csv", &config, &scheduler).await?;
//!     println!("{}", summary.summary_text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-backfill` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backfill;
pub mod config;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod scheduler;
pub mod submit;
pub mod summary;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backfill::{backfill, backfill_sync, plan, BackfillPlan};
pub use config::{BackfillConfig, BackfillConfigBuilder, RowErrorPolicy, SchedulerMode};
pub use error::{BackfillError, ErrorKind, JobError};
pub use job::{build_jobs, JobDescriptor, RegionOverrides};
pub use pipeline::manifest::ManifestRow;
pub use pipeline::normalize::{normalize_row, NormalizedRow, RowRejection};
pub use progress::{JobProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::{render_report, write_report, ReportFormat};
pub use scheduler::{
    BuildRequest, CommandRunner, JobRunner, LocalScheduler, RemoteScheduler, Scheduler,
    WorkflowScheduler,
};
pub use submit::submit;
pub use summary::{JobOutcome, JobStatus, RunStatus, RunSummary};
