//! Job descriptors: one immutable extraction job per manifest row.

use crate::pipeline::normalize::NormalizedRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Per-region parameter overrides, keyed by state or district identifier.
///
/// Nothing in this crate populates it; callers that know about per-region
/// quirks can attach overrides before submission.
pub type RegionOverrides = BTreeMap<String, serde_json::Value>;

/// Parameters of one extraction job, as handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Report date the job targets.
    pub date: NaiveDate,
    /// One-based page number of the daily case-growth table.
    pub daily_case_growth_page: u32,
    /// Zero-based page index of the positive-breakdown table.
    pub positive_breakdown_index: u32,
    #[serde(default)]
    pub states_and_districts: RegionOverrides,
}

impl JobDescriptor {
    pub fn new(date: NaiveDate, daily_case_growth_page: u32, positive_breakdown_index: u32) -> Self {
        Self {
            date,
            daily_case_growth_page,
            positive_breakdown_index,
            states_and_districts: RegionOverrides::new(),
        }
    }

    /// Return a copy carrying an override for `region`.
    pub fn with_region_override(mut self, region: impl Into<String>, value: serde_json::Value) -> Self {
        self.states_and_districts.insert(region.into(), value);
        self
    }

    /// Stable identifier derived from every parameter.
    ///
    /// Two descriptors with equal parameters share a task id, which is what
    /// schedulers use to recognise the same job submitted twice.
    pub fn task_id(&self) -> String {
        let mut id = format!(
            "AllDataSheet_{}_{}_{}",
            self.date.format("%Y-%m-%d"),
            self.daily_case_growth_page,
            self.positive_breakdown_index
        );
        if !self.states_and_districts.is_empty() {
            let regions: Vec<&str> = self.states_and_districts.keys().map(String::as_str).collect();
            id.push('_');
            id.push_str(&regions.join("+"));
            id.push('_');
            id.push_str(&self.overrides_digest());
        }
        id
    }

    /// Short sha256 of the serialized overrides. `BTreeMap` keeps the key
    /// order, and so the digest, stable.
    fn overrides_digest(&self) -> String {
        let json = serde_json::to_string(&self.states_and_districts).unwrap_or_default();
        let digest = format!("{:x}", Sha256::digest(json.as_bytes()));
        digest[..12].to_string()
    }
}

impl From<&NormalizedRow> for JobDescriptor {
    fn from(row: &NormalizedRow) -> Self {
        JobDescriptor::new(row.date, row.case_growth_page, row.breakdown_index)
    }
}

impl fmt::Display for JobDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AllDataSheet(date={}, daily_case_growth_page={}, positive_breakdown_index={}",
            self.date.format("%Y-%m-%d"),
            self.daily_case_growth_page,
            self.positive_breakdown_index
        )?;
        if !self.states_and_districts.is_empty() {
            write!(f, ", states_and_districts={}", self.states_and_districts.len())?;
        }
        write!(f, ")")
    }
}

/// Map normalised rows to job descriptors one-to-one, in order.
pub fn build_jobs(rows: &[NormalizedRow]) -> Vec<JobDescriptor> {
    rows.iter().map(JobDescriptor::from).collect()
}
