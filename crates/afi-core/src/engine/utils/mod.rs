//! Utility functions for the engine module.
//!
//! Helpers shared by the stage tasks: Boltzmann parent selection for the global
//! search and the optional dedicated worker pool a run executes inside.

pub mod pool;
pub mod sampling;
