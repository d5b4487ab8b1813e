//! Stage tasks of the design pipeline.
//!
//! Each task takes a parent sequence and the shared [`DesignContext`](super::context::DesignContext),
//! enumerates or samples candidates, evaluates them as independent batches and returns the
//! resulting [`StageResult`](super::state::StageResult).

pub mod global_search;
pub mod mutation_scan;
pub mod segmentation;
