//! Pipeline stages from manifest URI to validated job parameters.
//!
//! Each submodule implements exactly one transformation step and is
//! independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ manifest ──▶ normalize ──▶ (crate::job::build_jobs)
//! (URI)     (CSV rows)   (validated)
//! ```
//!
//! 1. [`input`]     — read a local path or download an HTTP(S) URL
//! 2. [`manifest`]  — parse CSV by column name into ordered raw rows
//! 3. [`normalize`] — parse dates, check page numbers, derive the zero-based
//!    breakdown index

pub mod input;
pub mod manifest;
pub mod normalize;
