//! Run reporting: render a [`RunSummary`] for people or for machines.

use crate::summary::RunSummary;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// How [`write_report`] renders a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportFormat {
    /// The scheduler's execution summary text. (default)
    #[default]
    Text,
    /// The whole summary as pretty-printed JSON.
    Json,
}

/// Write the summary to `out` once, followed by a newline.
pub fn write_report<W: Write>(out: &mut W, summary: &RunSummary, format: ReportFormat) -> io::Result<()> {
    match format {
        ReportFormat::Text => {
            out.write_all(summary.summary_text.as_bytes())?;
            if !summary.summary_text.ends_with('\n') {
                out.write_all(b"\n")?;
            }
        }
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, summary)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()
}

/// Render the summary to a `String`.
pub fn render_report(summary: &RunSummary, format: ReportFormat) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_report(&mut buf, summary, format);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerMode;
    use crate::job::JobDescriptor;
    use crate::summary::JobOutcome;
    use chrono::NaiveDate;

    fn summary() -> RunSummary {
        let job = JobDescriptor::new(NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(), 9, 5);
        RunSummary::from_outcomes(SchedulerMode::Local, vec![JobOutcome::succeeded(job, 2)], true, 2)
    }

    #[test]
    fn text_report_prints_summary_text_once() {
        let s = summary();
        let out = render_report(&s, ReportFormat::Text);
        assert_eq!(out, format!("{}\n", s.summary_text));
        assert_eq!(out.matches("Scheduled 1 job of which:").count(), 1);
    }

    #[test]
    fn json_report_is_parseable() {
        let s = summary();
        let out = render_report(&s, ReportFormat::Json);
        let back: RunSummary = serde_json::from_str(&out).unwrap();
        assert_eq!(back, s);
    }
}
