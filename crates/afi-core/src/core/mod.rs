//! # Core Module
//!
//! Stateless building blocks of the design pipeline.
//!
//! - **Sequence Representation** ([`models`]) - Amino-acid alphabet, immutable sequences and
//!   candidates tagged with their provenance
//! - **Prediction Boundary** ([`predictor`]) - The capability interface to external MIC and
//!   toxicity models, plus concrete adapters (lookup table, descriptor model, cache)
//! - **Fitness** ([`scoring`]) - Aggregation of predictions into the Antifungal Index
//!
//! Nothing in this module holds mutable state across calls; the engine layer builds on
//! these types to run the actual search.

pub mod models;
pub mod predictor;
pub mod scoring;
