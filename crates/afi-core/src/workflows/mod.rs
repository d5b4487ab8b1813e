//! # Workflows Module
//!
//! High-level entry points that tie [`core`](crate::core) and
//! [`engine`](crate::engine) together.
//!
//! - **Design Pipeline** ([`design`]) - Segmentation, then single-point mutation scan, then
//!   global search, each seeded with the previous stage's winner. Single-stage runners are
//!   exposed alongside the full pipeline.
//! - **Batch Scoring** ([`score`]) - AFI for an arbitrary list of raw sequence strings.
//!
//! Every workflow validates its configuration before the first predictor call and runs
//! inside an optional dedicated worker pool.

pub mod design;
pub mod score;
