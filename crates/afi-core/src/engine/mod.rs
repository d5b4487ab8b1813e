//! # Engine Module
//!
//! The stateful layer that turns a parent sequence into scored candidates and
//! picks a winner.
//!
//! - **Configuration** ([`config`]) - Stage parameters, builders and validation
//! - **Evaluation** ([`evaluation`]) - Predictor + scorer calls over independent batches,
//!   in parallel when the `parallel` feature is enabled
//! - **Stage Tasks** ([`tasks`]) - Segmentation, single-point mutation scan and the
//!   bounded global search
//! - **State Tracking** ([`state`]) - Stage results and the explicit global-search context
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Stage-level failures
//!
//! Candidate-level failures never abort a stage; they are collected as skipped
//! candidates and surfaced with the stage result.

pub mod config;
pub mod context;
pub mod error;
pub mod evaluation;
pub mod progress;
pub mod state;
pub mod tasks;
pub mod utils;
