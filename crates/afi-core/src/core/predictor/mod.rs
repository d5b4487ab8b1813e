//! # Predictor Module
//!
//! The capability boundary between the design engine and externally trained
//! MIC / toxicity models.
//!
//! A [`Predictor`] maps a [`Sequence`] to a [`Prediction`]: one MIC value per
//! configured fungal species and one score per configured toxicity assay.
//! Implementations must be deterministic for a fixed model version and safe to
//! call from several worker threads at once.
//!
//! - [`cache`] - Memoising wrapper for any predictor
//! - [`table`] - Lookup table of precomputed predictions loaded from CSV
//! - [`descriptor`] - In-process log-linear model over physicochemical descriptors
//!
//! Callers in the engine always go through [`predict_checked`], which enforces
//! the adapter contract regardless of the concrete implementation.

pub mod cache;
pub mod descriptor;
pub mod table;

use crate::core::models::sequence::{Sequence, SequenceError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("Malformed sequence '{input}': {source}")]
    MalformedSequence {
        input: String,
        #[source]
        source: SequenceError,
    },
    #[error("Model returned no {kind} value for '{id}' (sequence {sequence})")]
    MissingOutput {
        kind: &'static str,
        id: String,
        sequence: String,
    },
    #[error("Model returned non-numeric {kind} value {value} for '{id}' (sequence {sequence})")]
    NonNumeric {
        kind: &'static str,
        id: String,
        value: f64,
        sequence: String,
    },
    #[error("Model failed on sequence {sequence}: {message}")]
    ModelFailure { sequence: String, message: String },
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid table header: {0}")]
    InvalidHeader(String),
    #[error("Invalid record on line {line}: {message}")]
    InvalidRecord { line: u64, message: String },
    #[error("Invalid model definition: {0}")]
    InvalidModel(String),
}

/// Predicted MIC per fungal species (positive, lower is more potent).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SpeciesMic(BTreeMap<String, f64>);

/// Predicted toxicity per assay (higher is more toxic).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ToxicityProfile(BTreeMap<String, f64>);

macro_rules! keyed_values {
    ($name:ident) => {
        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn insert(&mut self, id: impl Into<String>, value: f64) {
                self.0.insert(id.into(), value);
            }

            pub fn get(&self, id: &str) -> Option<f64> {
                self.0.get(id).copied()
            }

            pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
                self.0.iter().map(|(k, v)| (k.as_str(), *v))
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl<K: Into<String>> FromIterator<(K, f64)> for $name {
            fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
                Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
            }
        }
    };
}

keyed_values!(SpeciesMic);
keyed_values!(ToxicityProfile);

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Prediction {
    pub mic: SpeciesMic,
    pub toxicity: ToxicityProfile,
}

pub trait Predictor: Send + Sync {
    /// Species identifiers this predictor reports MICs for.
    fn species(&self) -> &[String];

    /// Toxicity assay identifiers this predictor reports scores for.
    fn assays(&self) -> &[String];

    /// Identifier of the underlying model, when it carries one.
    fn model_version(&self) -> Option<&str> {
        None
    }

    fn predict(&self, sequence: &Sequence) -> Result<Prediction, PredictionError>;
}

impl<P: Predictor + ?Sized> Predictor for &P {
    fn species(&self) -> &[String] {
        (**self).species()
    }
    fn assays(&self) -> &[String] {
        (**self).assays()
    }
    fn model_version(&self) -> Option<&str> {
        (**self).model_version()
    }
    fn predict(&self, sequence: &Sequence) -> Result<Prediction, PredictionError> {
        (**self).predict(sequence)
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn species(&self) -> &[String] {
        (**self).species()
    }
    fn assays(&self) -> &[String] {
        (**self).assays()
    }
    fn model_version(&self) -> Option<&str> {
        (**self).model_version()
    }
    fn predict(&self, sequence: &Sequence) -> Result<Prediction, PredictionError> {
        (**self).predict(sequence)
    }
}

impl<P: Predictor + ?Sized> Predictor for Arc<P> {
    fn species(&self) -> &[String] {
        (**self).species()
    }
    fn assays(&self) -> &[String] {
        (**self).assays()
    }
    fn model_version(&self) -> Option<&str> {
        (**self).model_version()
    }
    fn predict(&self, sequence: &Sequence) -> Result<Prediction, PredictionError> {
        (**self).predict(sequence)
    }
}

/// Runs `predictor` and rejects output that is incomplete for its declared
/// species/assays, non-finite, or carries a non-positive MIC.
pub fn predict_checked<P: Predictor + ?Sized>(
    predictor: &P,
    sequence: &Sequence,
) -> Result<Prediction, PredictionError> {
    let prediction = predictor.predict(sequence)?;

    for species in predictor.species() {
        let value = prediction
            .mic
            .get(species)
            .ok_or_else(|| PredictionError::MissingOutput {
                kind: "MIC",
                id: species.clone(),
                sequence: sequence.to_string(),
            })?;
        if !value.is_finite() || value <= 0.0 {
            return Err(PredictionError::NonNumeric {
                kind: "MIC",
                id: species.clone(),
                value,
                sequence: sequence.to_string(),
            });
        }
    }

    for assay in predictor.assays() {
        let value =
            prediction
                .toxicity
                .get(assay)
                .ok_or_else(|| PredictionError::MissingOutput {
                    kind: "toxicity",
                    id: assay.clone(),
                    sequence: sequence.to_string(),
                })?;
        if !value.is_finite() {
            return Err(PredictionError::NonNumeric {
                kind: "toxicity",
                id: assay.clone(),
                value,
                sequence: sequence.to_string(),
            });
        }
    }

    Ok(prediction)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPredictor {
        species: Vec<String>,
        assays: Vec<String>,
        prediction: Prediction,
    }

    impl Predictor for FixedPredictor {
        fn species(&self) -> &[String] {
            &self.species
        }
        fn assays(&self) -> &[String] {
            &self.assays
        }
        fn predict(&self, _sequence: &Sequence) -> Result<Prediction, PredictionError> {
            Ok(self.prediction.clone())
        }
    }

    fn fixed(mic: &[(&str, f64)], tox: &[(&str, f64)]) -> FixedPredictor {
        FixedPredictor {
            species: vec!["C_albicans".to_string(), "C_neoformans".to_string()],
            assays: vec!["hemolysis".to_string()],
            prediction: Prediction {
                mic: mic.iter().map(|&(k, v)| (k, v)).collect(),
                toxicity: tox.iter().map(|&(k, v)| (k, v)).collect(),
            },
        }
    }

    fn peptide() -> Sequence {
        Sequence::parse("YCRTYWRYGRLRRRCYRRR").unwrap()
    }

    #[test]
    fn complete_finite_prediction_passes_checks() {
        let predictor = fixed(
            &[("C_albicans", 4.0), ("C_neoformans", 8.0)],
            &[("hemolysis", 0.2)],
        );
        let prediction = predict_checked(&predictor, &peptide()).unwrap();
        assert_eq!(prediction.mic.get("C_albicans"), Some(4.0));
        assert_eq!(prediction.toxicity.get("hemolysis"), Some(0.2));
    }

    #[test]
    fn missing_species_is_reported() {
        let predictor = fixed(&[("C_albicans", 4.0)], &[("hemolysis", 0.2)]);
        let err = predict_checked(&predictor, &peptide()).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::MissingOutput { kind: "MIC", ref id, .. } if id == "C_neoformans"
        ));
    }

    #[test]
    fn nan_mic_is_rejected_as_non_numeric() {
        let predictor = fixed(
            &[("C_albicans", f64::NAN), ("C_neoformans", 8.0)],
            &[("hemolysis", 0.2)],
        );
        let err = predict_checked(&predictor, &peptide()).unwrap_err();
        assert!(matches!(err, PredictionError::NonNumeric { kind: "MIC", .. }));
    }

    #[test]
    fn non_positive_mic_is_rejected() {
        let predictor = fixed(
            &[("C_albicans", 0.0), ("C_neoformans", 8.0)],
            &[("hemolysis", 0.2)],
        );
        assert!(predict_checked(&predictor, &peptide()).is_err());
    }

    #[test]
    fn infinite_toxicity_is_rejected() {
        let predictor = fixed(
            &[("C_albicans", 4.0), ("C_neoformans", 8.0)],
            &[("hemolysis", f64::INFINITY)],
        );
        let err = predict_checked(&predictor, &peptide()).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::NonNumeric {
                kind: "toxicity",
                ..
            }
        ));
    }

    #[test]
    fn boxed_and_shared_predictors_forward_calls() {
        let predictor = fixed(
            &[("C_albicans", 4.0), ("C_neoformans", 8.0)],
            &[("hemolysis", 0.2)],
        );
        let shared: Arc<dyn Predictor> = Arc::new(predictor);
        assert_eq!(shared.species().len(), 2);
        let boxed: Box<dyn Predictor> = Box::new(shared.clone());
        assert!(predict_checked(&boxed, &peptide()).is_ok());
    }
}
