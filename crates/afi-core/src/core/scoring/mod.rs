//! # Scoring Module
//!
//! Collapses a [`Prediction`](crate::core::predictor::Prediction) into the
//! Antifungal Index (AFI), the single scalar every stage minimises.
//!
//! The aggregation is driven entirely by a versioned [`AfiWeights`]
//! configuration:
//!
//! - a weighted central tendency over per-species MICs (the peptide must be
//!   broadly active, not just against one species), and
//! - a toxicity penalty, a weighted sum of assay scores applied either
//!   multiplicatively (`potency * exp(penalty)`) or additively.
//!
//! Lower AFI is better throughout the crate.

pub mod afi;
pub mod weights;

pub use afi::{AfiScore, AfiScorer, ScoringError};
pub use weights::{AfiWeights, CentralTendency, PenaltyForm, WeightsError};
