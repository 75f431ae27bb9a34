//! Manifest parsing: CSV bytes → ordered [`ManifestRow`]s.
//!
//! Columns are looked up by header name, so their order in the file does not
//! matter; only their presence does. Extra columns are ignored. Rows must be
//! rectangular, and page columns must hold integers. No business rules are
//! applied here; see [`crate::pipeline::normalize`].

use crate::error::BackfillError;
use crate::pipeline::input::ManifestSource;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DATE_OF_PDF: &str = "date-of-pdf";
pub const ELDERLY_TABLE_PAGE: &str = "elderly-table-page";
pub const POSITIVE_BREAKDOWN_PAGE: &str = "positive-breakdown-page";
pub const CASE_GROWTH_PAGE: &str = "case-growth-page";

/// Required manifest columns, in their conventional order.
pub const REQUIRED_COLUMNS: [&str; 4] = [
    DATE_OF_PDF,
    ELDERLY_TABLE_PAGE,
    POSITIVE_BREAKDOWN_PAGE,
    CASE_GROWTH_PAGE,
];

/// One raw manifest row, as read.
///
/// Page numbers are one-based and unvalidated. `elderly_table_page` is
/// carried for completeness; the extraction job reads that table itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRow {
    /// One-based data row number (the header is not counted).
    pub row: usize,
    pub date_of_pdf: String,
    pub elderly_table_page: i64,
    pub positive_breakdown_page: i64,
    pub case_growth_page: i64,
}

/// Column positions of the required fields within a header record.
struct ColumnIndex {
    date_of_pdf: usize,
    elderly_table_page: usize,
    positive_breakdown_page: usize,
    case_growth_page: usize,
}

impl ColumnIndex {
    fn from_headers(uri: &str, headers: &StringRecord) -> Result<Self, BackfillError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| find(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(BackfillError::MalformedManifest {
                uri: uri.to_string(),
                detail: format!("missing required column(s): {}", missing.join(", ")),
            });
        }

        // All present, checked above.
        let idx = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            date_of_pdf: idx(DATE_OF_PDF),
            elderly_table_page: idx(ELDERLY_TABLE_PAGE),
            positive_breakdown_page: idx(POSITIVE_BREAKDOWN_PAGE),
            case_growth_page: idx(CASE_GROWTH_PAGE),
        })
    }
}

/// Parse manifest bytes into rows, preserving file order.
pub fn read_manifest(source: &ManifestSource) -> Result<Vec<ManifestRow>, BackfillError> {
    let uri = source.uri.as_str();
    let malformed = |detail: String| BackfillError::MalformedManifest {
        uri: uri.to_string(),
        detail,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(source.bytes.as_slice());

    let headers = reader
        .headers()
        .map_err(|e| malformed(format!("unreadable header: {e}")))?
        .clone();
    let columns = ColumnIndex::from_headers(uri, &headers)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let row = i + 1;
        let record = record.map_err(|e| malformed(format!("row {row}: {e}")))?;

        let field = |idx: usize| record.get(idx).unwrap_or("");
        let page = |idx: usize, name: &str| {
            parse_page(field(idx)).ok_or_else(|| {
                malformed(format!(
                    "row {row}: column '{name}' is not an integer page number: {:?}",
                    field(idx)
                ))
            })
        };

        rows.push(ManifestRow {
            row,
            date_of_pdf: field(columns.date_of_pdf).to_string(),
            elderly_table_page: page(columns.elderly_table_page, ELDERLY_TABLE_PAGE)?,
            positive_breakdown_page: page(columns.positive_breakdown_page, POSITIVE_BREAKDOWN_PAGE)?,
            case_growth_page: page(columns.case_growth_page, CASE_GROWTH_PAGE)?,
        });
    }

    debug!("Parsed {} manifest rows from {}", rows.len(), uri);
    Ok(rows)
}

/// Parse a page cell as an integer. Whole-valued floats (`"6.0"`) are accepted.
fn parse_page(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if let Ok(n) = cell.parse::<i64>() {
        return Some(n);
    }
    let f = cell.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn source(text: &str) -> ManifestSource {
        ManifestSource {
            uri: "test.csv".into(),
            bytes: text.as_bytes().to_vec(),
        }
    }

    #[test]
    fn reads_rows_in_order() {
        let rows = read_manifest(&source(
            "date-of-pdf,elderly-table-page,positive-breakdown-page,case-growth-page\n\
             2021-03-15,4,6,9\n\
             2021-03-16,5,7,10\n",
        ))
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            ManifestRow {
                row: 1,
                date_of_pdf: "2021-03-15".into(),
                elderly_table_page: 4,
                positive_breakdown_page: 6,
                case_growth_page: 9,
            }
        );
        assert_eq!(rows[1].row, 2);
        assert_eq!(rows[1].date_of_pdf, "2021-03-16");
    }

    #[test]
    fn column_order_is_not_significant() {
        let rows = read_manifest(&source(
            "case-growth-page,date-of-pdf,positive-breakdown-page,elderly-table-page,notes\n\
             9, 2021-03-15 ,6,4,first\n",
        ))
        .unwrap();
        assert_eq!(rows[0].case_growth_page, 9);
        assert_eq!(rows[0].positive_breakdown_page, 6);
        assert_eq!(rows[0].elderly_table_page, 4);
        assert_eq!(rows[0].date_of_pdf, "2021-03-15");
    }

    #[test]
    fn missing_column_is_malformed() {
        let err = read_manifest(&source(
            "date-of-pdf,elderly-table-page,case-growth-page\n2021-03-15,4,9\n",
        ))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedManifest);
        assert!(err.to_string().contains("positive-breakdown-page"), "got: {err}");
    }

    #[test]
    fn ragged_row_is_malformed() {
        let err = read_manifest(&source(
            "date-of-pdf,elderly-table-page,positive-breakdown-page,case-growth-page\n\
             2021-03-15,4,6\n",
        ))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedManifest);
    }

    #[test]
    fn non_integer_page_is_malformed_with_row() {
        let err = read_manifest(&source(
            "date-of-pdf,elderly-table-page,positive-breakdown-page,case-growth-page\n\
             2021-03-15,4,6,9\n\
             2021-03-16,4,six,9\n",
        ))
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 2"), "got: {msg}");
        assert!(msg.contains("positive-breakdown-page"), "got: {msg}");
    }

    #[test]
    fn header_only_manifest_has_no_rows() {
        let rows = read_manifest(&source(
            "date-of-pdf,elderly-table-page,positive-breakdown-page,case-growth-page\n",
        ))
        .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn parse_page_accepts_whole_floats() {
        assert_eq!(parse_page("6"), Some(6));
        assert_eq!(parse_page(" 6.0 "), Some(6));
        assert_eq!(parse_page("0"), Some(0));
        assert_eq!(parse_page("-1"), Some(-1));
        assert_eq!(parse_page("6.5"), None);
        assert_eq!(parse_page(""), None);
        assert_eq!(parse_page("NaN"), None);
    }
}
