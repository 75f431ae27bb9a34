//! CLI binary for pdf-backfill.
//!
//! A thin shim over the library crate that maps CLI arguments to
//! `BackfillConfig`, builds the scheduler, and prints the run summary.

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_backfill::{
    backfill, plan, write_report, BackfillConfig, CommandRunner, JobProgressCallback,
    ProgressCallback, ReportFormat, RowErrorPolicy, RunStatus, WorkflowScheduler,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback for local-scheduler runs.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Reading manifest…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    /// Remove the bar so error output is not drawn over a live spinner.
    fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl JobProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_jobs: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} jobs  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_jobs as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Running");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Running {total_jobs} jobs locally…"))
        ));
    }

    fn on_job_start(&self, _position: usize, _total_jobs: usize, task_id: &str) {
        self.bar.set_message(task_id.to_string());
    }

    fn on_job_complete(&self, position: usize, total_jobs: usize, task_id: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            green("✓"),
            position,
            total_jobs,
            dim(task_id)
        ));
        self.bar.inc(1);
    }

    fn on_job_error(&self, position: usize, total_jobs: usize, task_id: &str, error: &str) {
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            position,
            total_jobs,
            task_id,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_job_skipped(&self, position: usize, total_jobs: usize, task_id: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            dim("–"),
            position,
            total_jobs,
            dim(&format!("{task_id} (duplicate)"))
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total_jobs: usize, _succeeded: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Submit to a running scheduler daemon (default http://localhost:8082)
  pdf-backfill old_pdfs.csv false

  # Run every job in this process instead
  pdf-backfill old_pdfs.csv true

  # Manifest straight from a URL, four jobs at a time
  pdf-backfill https://example.org/old_pdfs.csv true --workers 4

  # Show the jobs a manifest would produce without submitting
  pdf-backfill --dry-run old_pdfs.csv

  # Drop bad rows instead of aborting the whole run
  pdf-backfill --skip-invalid-rows old_pdfs.csv true

MANIFEST COLUMNS (looked up by name):
  date-of-pdf              date printed in the PDF name (2021-03-15, 03/15/2021, …)
  elderly-table-page       page of the elderly table (read by the extractor)
  positive-breakdown-page  page of the positive breakdown table (1-based)
  case-growth-page         page of the daily case growth table (1-based)

ENVIRONMENT VARIABLES:
  PDF_BACKFILL_SCHEDULER_URL     Scheduler daemon base URL
  PDF_BACKFILL_EXTRACT_COMMAND   Extraction program for local runs
  RUST_LOG                       Log filter (overrides --verbose/--quiet)
"#;

/// Submit a manifest of historical PDF reports as a batch of extraction jobs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-backfill",
    version,
    about = "Turn a manifest of historical PDF-dashboard pages into extraction jobs and run them",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local path or HTTP/HTTPS URL of the CSV manifest.
    manifest_uri: String,

    /// Run jobs in-process (true) or submit to the scheduler daemon (false).
    #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new(), default_value_t = false)]
    local_scheduler: bool,

    /// Scheduler daemon base URL (remote mode).
    #[arg(long, env = "PDF_BACKFILL_SCHEDULER_URL", default_value = pdf_backfill::config::DEFAULT_SCHEDULER_URL)]
    scheduler_url: String,

    /// Give up waiting for the daemon after this many seconds (default: wait forever).
    #[arg(long, env = "PDF_BACKFILL_SCHEDULER_TIMEOUT")]
    scheduler_timeout: Option<u64>,

    /// Extraction program (and leading arguments) used in local mode.
    #[arg(long, env = "PDF_BACKFILL_EXTRACT_COMMAND", default_value = "pdf-dashboard-extract")]
    extract_command: String,

    /// Jobs run concurrently in local mode.
    #[arg(short, long, env = "PDF_BACKFILL_WORKERS", default_value_t = 1)]
    workers: usize,

    /// Skip manifest rows that fail validation instead of aborting the run.
    #[arg(long, env = "PDF_BACKFILL_SKIP_INVALID_ROWS")]
    skip_invalid_rows: bool,

    /// HTTP download timeout for URL manifests, in seconds.
    #[arg(long, env = "PDF_BACKFILL_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the planned jobs and exit without submitting.
    #[arg(long)]
    dry_run: bool,

    /// Output structured JSON instead of the text summary.
    #[arg(long, env = "PDF_BACKFILL_JSON")]
    json: bool,

    /// Exit with status 2 when any job failed.
    #[arg(long)]
    fail_on_job_error: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_BACKFILL_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_BACKFILL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the summary.
    #[arg(short, long, env = "PDF_BACKFILL_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs in local mode.
    let show_progress =
        cli.local_scheduler && !cli.dry_run && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if !cli.quiet && !cli.json {
        eprintln!("{} {}", dim("Manifest"), bold(&cli.manifest_uri));
    }

    let runner = Arc::new(build_runner(&cli.extract_command)?);

    let cli_progress = show_progress.then(CliProgressCallback::new);
    let progress_cb: Option<ProgressCallback> = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn JobProgressCallback>);
    let clear_progress = || {
        if let Some(cb) = &cli_progress {
            cb.clear();
        }
    };
    let config = build_config(&cli, progress_cb).map_err(|e| {
        clear_progress();
        e
    })?;

    // ── Dry run ──────────────────────────────────────────────────────────
    if cli.dry_run {
        let plan = plan(&cli.manifest_uri, &config)
            .await
            .context("Failed to read manifest")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&plan).context("Failed to serialise plan")?
            );
        } else {
            for (i, job) in plan.jobs.iter().enumerate() {
                println!("{:>4}  {}", i + 1, job);
            }
            for r in &plan.rejected_rows {
                eprintln!("{} {}", red("skipped"), r.reason);
            }
        }
        return Ok(());
    }

    // ── Submit ───────────────────────────────────────────────────────────
    let scheduler = WorkflowScheduler::from_config(&config, runner)
        .map_err(|e| {
            clear_progress();
            e
        })
        .context("Failed to set up scheduler")?;

    // The batch-complete event never fires when the manifest is rejected.
    let summary = backfill(&cli.manifest_uri, &config, &scheduler)
        .await
        .map_err(|e| {
            clear_progress();
            e
        })
        .context("Backfill failed")?;

    let format = if cli.json {
        ReportFormat::Json
    } else {
        ReportFormat::Text
    };
    write_report(&mut io::stdout().lock(), &summary, format)
        .context("Failed to write summary")?;

    if !cli.quiet && !cli.json {
        let mark = match summary.status {
            RunStatus::Success | RunStatus::Empty => green("✔"),
            RunStatus::PartialFailure => cyan("⚠"),
            RunStatus::Failed => red("✘"),
        };
        eprintln!(
            "{}  {}/{} jobs succeeded  {}ms",
            mark,
            summary.succeeded(),
            summary.total(),
            summary.duration_ms
        );
    }

    if cli.fail_on_job_error && !summary.status.is_success() {
        std::process::exit(2);
    }
    Ok(())
}

/// Map CLI args to `BackfillConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BackfillConfig> {
    let mut builder = BackfillConfig::builder()
        .local_scheduler(cli.local_scheduler)
        .scheduler_url(cli.scheduler_url.as_str())
        .workers(cli.workers)
        .download_timeout_secs(cli.download_timeout)
        .row_policy(if cli.skip_invalid_rows {
            RowErrorPolicy::Skip
        } else {
            RowErrorPolicy::Abort
        });

    if let Some(secs) = cli.scheduler_timeout {
        builder = builder.scheduler_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Split `--extract-command` into program and leading arguments.
fn build_runner(command: &str) -> Result<CommandRunner> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .context("--extract-command must name a program")?;
    Ok(CommandRunner::new(program).base_args(parts))
}
