//! # AFI Design Core Library
//!
//! Computational optimisation of short antifungal peptides against the
//! Antifungal Index (AFI), a composite of predicted per-species MICs and
//! predicted toxicity. Lower AFI is better.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict layered layout:
//!
//! - **[`core`]: The Foundation.** Stateless value types (`Sequence`, `Candidate`), the
//!   `Predictor` capability interface with its adapters, and the pure AFI scorer.
//!
//! - **[`engine`]: The Logic Core.** Configuration, parallel batch evaluation and the three
//!   stage tasks: segmentation enumeration, single-point mutation scanning and a bounded,
//!   seeded population search over multi-position substitutions.
//!
//! - **[`workflows`]: The Public API.** The design pipeline (initial, segmented, mutated and
//!   optimised variants), single-stage runners and batch scoring.
//!
//! - **[`io`]: Reporting.** CSV score tables, the mutation matrix and a TOML run summary for
//!   downstream plotting.

pub mod core;
pub mod engine;
pub mod io;
pub mod workflows;

#[cfg(test)]
pub(crate) mod testing;
