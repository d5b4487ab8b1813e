//! # I/O Module
//!
//! Tabular and summary output for design and scoring runs.
//!
//! Stage tables and the mutation matrix are written as CSV; the run summary
//! (variants, per-stage counts, search settings and skip diagnostics) as TOML.
//! Every writer takes an `impl Write`; [`report::write_design_report`] lays a
//! whole run out in one directory.

pub mod report;

pub use report::{ReportError, RunSummary, write_design_report, write_scored_table};
