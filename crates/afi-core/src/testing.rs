//! Deterministic predictors for unit tests.

use crate::core::models::amino_acid::AminoAcid;
use crate::core::models::sequence::Sequence;
use crate::core::predictor::{Prediction, PredictionError, Predictor};
use crate::core::scoring::weights::AfiWeights;

pub(crate) const SPECIES: [&str; 2] = ["C_albicans", "C_neoformans"];
pub(crate) const ASSAY: &str = "hemolysis";

/// Uniform species weights with a unit hemolysis weight.
pub(crate) fn test_weights() -> AfiWeights {
    AfiWeights::uniform("test-1", SPECIES).with_toxicity_weight(ASSAY, 1.0)
}

/// Scores sequences by their distance to a target: every species gets
/// `MIC = 1 + d` and hemolysis is zero, so the target itself has AFI 1.
///
/// `d` is the Hamming distance over the common prefix plus twice the length
/// difference.
pub(crate) struct TargetPredictor {
    target: Sequence,
    species: Vec<String>,
    assays: Vec<String>,
    fail_on: Option<AminoAcid>,
    min_length: usize,
}

impl TargetPredictor {
    pub(crate) fn new(target: &str) -> Self {
        Self {
            target: Sequence::parse(target).expect("valid target"),
            species: SPECIES.iter().map(|s| s.to_string()).collect(),
            assays: vec![ASSAY.to_string()],
            fail_on: None,
            min_length: 0,
        }
    }

    /// Fails with a model error on any sequence containing `code`.
    pub(crate) fn failing_on(mut self, code: char) -> Self {
        self.fail_on = AminoAcid::from_code(code);
        self
    }

    /// Fails with a model error on any sequence shorter than `length`.
    pub(crate) fn rejecting_shorter_than(mut self, length: usize) -> Self {
        self.min_length = length;
        self
    }

    pub(crate) fn distance(&self, sequence: &Sequence) -> usize {
        let mismatches = self
            .target
            .residues()
            .iter()
            .zip(sequence.residues())
            .filter(|(a, b)| a != b)
            .count();
        mismatches + 2 * self.target.len().abs_diff(sequence.len())
    }
}

impl Predictor for TargetPredictor {
    fn species(&self) -> &[String] {
        &self.species
    }

    fn assays(&self) -> &[String] {
        &self.assays
    }

    fn model_version(&self) -> Option<&str> {
        Some("target-distance")
    }

    fn predict(&self, sequence: &Sequence) -> Result<Prediction, PredictionError> {
        if let Some(residue) = self.fail_on {
            if sequence.count(residue) > 0 {
                return Err(PredictionError::ModelFailure {
                    sequence: sequence.to_string(),
                    message: format!("model rejects residue {}", residue),
                });
            }
        }
        if sequence.len() < self.min_length {
            return Err(PredictionError::ModelFailure {
                sequence: sequence.to_string(),
                message: format!("model needs at least {} residues", self.min_length),
            });
        }
        let mic = 1.0 + self.distance(sequence) as f64;
        Ok(Prediction {
            mic: self.species.iter().map(|s| (s.as_str(), mic)).collect(),
            toxicity: [(ASSAY, 0.0)].into_iter().collect(),
        })
    }
}
