//! Row normalisation: validate a raw manifest row and derive job parameters.
//!
//! The extraction job addresses the positive-breakdown table by zero-based
//! page index, while the manifest author writes the one-based page number
//! printed on the report. This module is the only place that shift happens.
//! The case-growth page stays one-based.

use crate::config::RowErrorPolicy;
use crate::error::BackfillError;
use crate::pipeline::manifest::{ManifestRow, CASE_GROWTH_PAGE, DATE_OF_PDF, POSITIVE_BREAKDOWN_PAGE};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Date-only formats, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

/// Date-time formats, tried in order; the time part is discarded.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Validated parameters for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    /// One-based manifest row this was derived from.
    pub row: usize,
    pub date: NaiveDate,
    /// One-based page number, unchanged from the manifest.
    pub case_growth_page: u32,
    /// Zero-based page index: `positive-breakdown-page - 1`.
    pub breakdown_index: u32,
}

/// A row dropped under [`RowErrorPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRejection {
    pub row: usize,
    pub reason: String,
}

/// Normalise one raw row.
///
/// Pure: the same row always yields the same result.
pub fn normalize_row(raw: &ManifestRow) -> Result<NormalizedRow, BackfillError> {
    let date = parse_date(&raw.date_of_pdf).ok_or_else(|| BackfillError::InvalidDate {
        row: raw.row,
        field: DATE_OF_PDF,
        value: raw.date_of_pdf.clone(),
    })?;

    let breakdown_page = one_based_page(raw.row, POSITIVE_BREAKDOWN_PAGE, raw.positive_breakdown_page)?;
    let case_growth_page = one_based_page(raw.row, CASE_GROWTH_PAGE, raw.case_growth_page)?;

    Ok(NormalizedRow {
        row: raw.row,
        date,
        case_growth_page,
        breakdown_index: breakdown_page - 1,
    })
}

/// Normalise every row, applying `policy` to rows that fail validation.
///
/// Under [`RowErrorPolicy::Abort`] the first failure is returned and no rows
/// survive. Under [`RowErrorPolicy::Skip`] failures are collected as
/// [`RowRejection`]s and the remaining rows keep their manifest order.
pub fn normalize_rows(
    rows: &[ManifestRow],
    policy: RowErrorPolicy,
) -> Result<(Vec<NormalizedRow>, Vec<RowRejection>), BackfillError> {
    let mut normalized = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for raw in rows {
        match normalize_row(raw) {
            Ok(n) => {
                debug!(
                    "Row {}: date={} case_growth_page={} breakdown_index={}",
                    n.row, n.date, n.case_growth_page, n.breakdown_index
                );
                normalized.push(n);
            }
            Err(e) => match policy {
                RowErrorPolicy::Abort => return Err(e),
                RowErrorPolicy::Skip => {
                    warn!("Skipping manifest row {}: {}", raw.row, e);
                    rejected.push(RowRejection {
                        row: raw.row,
                        reason: e.to_string(),
                    });
                }
            },
        }
    }

    Ok((normalized, rejected))
}

/// Parse a manifest date cell.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

fn one_based_page(row: usize, field: &'static str, value: i64) -> Result<u32, BackfillError> {
    match u32::try_from(value) {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(BackfillError::InvalidPageNumber { row, field, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn raw(row: usize, date: &str, breakdown: i64, growth: i64) -> ManifestRow {
        ManifestRow {
            row,
            date_of_pdf: date.into(),
            elderly_table_page: 4,
            positive_breakdown_page: breakdown,
            case_growth_page: growth,
        }
    }

    #[test]
    fn breakdown_page_becomes_zero_based_index() {
        let n = normalize_row(&raw(1, "2021-03-15", 6, 9)).unwrap();
        assert_eq!(n.date, NaiveDate::from_ymd_opt(2021, 3, 15).unwrap());
        assert_eq!(n.breakdown_index, 5);
        assert_eq!(n.case_growth_page, 9);
    }

    #[test]
    fn breakdown_page_one_is_index_zero() {
        let n = normalize_row(&raw(1, "2021-03-15", 1, 1)).unwrap();
        assert_eq!(n.breakdown_index, 0);
        assert_eq!(n.case_growth_page, 1);
    }

    #[test]
    fn breakdown_page_below_one_is_rejected() {
        for bad in [0, -3] {
            let err = normalize_row(&raw(2, "2021-03-15", bad, 9)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidPageNumber);
            assert_eq!(err.row(), Some(2));
            assert!(err.to_string().contains(POSITIVE_BREAKDOWN_PAGE));
        }
    }

    #[test]
    fn case_growth_page_below_one_is_rejected() {
        let err = normalize_row(&raw(3, "2021-03-15", 6, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPageNumber);
        assert!(err.to_string().contains(CASE_GROWTH_PAGE));
    }

    #[test]
    fn oversized_page_is_rejected() {
        let err = normalize_row(&raw(1, "2021-03-15", i64::MAX, 9)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPageNumber);
    }

    #[test]
    fn unparseable_date_is_rejected() {
        let err = normalize_row(&raw(1, "not-a-date", 6, 9)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDate);
        assert!(err.to_string().contains("not-a-date"));
    }

    #[test]
    fn normalisation_is_repeatable() {
        let r = raw(1, "2021-03-15", 6, 9);
        assert_eq!(normalize_row(&r).unwrap(), normalize_row(&r).unwrap());
    }

    #[test]
    fn accepted_date_forms() {
        let want = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
        for s in [
            "2021-03-15",
            " 2021-03-15 ",
            "2021/03/15",
            "2021.03.15",
            "20210315",
            "03/15/2021",
            "15-Mar-2021",
            "15 March 2021",
            "March 15, 2021",
            "Mar 15, 2021",
            "2021-03-15 00:00:00",
            "2021-03-15T08:30:00",
            "2021-03-15T08:30:00+05:30",
        ] {
            assert_eq!(parse_date(s), Some(want), "input {s:?}");
        }
    }

    #[test]
    fn rejected_date_forms() {
        for s in ["", "   ", "not-a-date", "2021-13-01", "2021-02-30", "15/03/2021"] {
            assert_eq!(parse_date(s), None, "input {s:?}");
        }
    }

    #[test]
    fn abort_policy_stops_at_first_bad_row() {
        let rows = vec![
            raw(1, "2021-03-15", 6, 9),
            raw(2, "2021-03-16", 0, 9),
            raw(3, "bad", 6, 9),
        ];
        let err = normalize_rows(&rows, RowErrorPolicy::Abort).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPageNumber);
        assert_eq!(err.row(), Some(2));
    }

    #[test]
    fn skip_policy_keeps_good_rows_in_order() {
        let rows = vec![
            raw(1, "2021-03-15", 6, 9),
            raw(2, "2021-03-16", 0, 9),
            raw(3, "bad", 6, 9),
            raw(4, "2021-03-18", 2, 3),
        ];
        let (ok, rejected) = normalize_rows(&rows, RowErrorPolicy::Skip).unwrap();
        assert_eq!(ok.iter().map(|n| n.row).collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(rejected.iter().map(|r| r.row).collect::<Vec<_>>(), vec![2, 3]);
        assert!(rejected[1].reason.contains("bad"));
    }
}
