use super::weights::{AfiWeights, CentralTendency, PenaltyForm, WeightsError};
use crate::core::predictor::{SpeciesMic, ToxicityProfile};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("No MIC value for species '{0}'")]
    MissingSpecies(String),
    #[error("MIC for species '{species}' must be positive and finite, got {value}")]
    InvalidMic { species: String, value: f64 },
    #[error("No toxicity value for assay '{0}'")]
    MissingAssay(String),
    #[error("Toxicity for assay '{assay}' must be finite, got {value}")]
    InvalidToxicity { assay: String, value: f64 },
    #[error("Aggregated AFI is not finite ({0})")]
    NonFinite(f64),
}

/// Antifungal Index of one sequence. Lower is better.
///
/// Always finite, hence totally ordered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AfiScore(f64);

impl AfiScore {
    pub fn new(value: f64) -> Result<Self, ScoringError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(ScoringError::NonFinite(value))
        }
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Percent decrease of this score relative to `reference`
    /// (positive means this score is better).
    pub fn relative_decrease(self, reference: AfiScore) -> f64 {
        (reference.0 - self.0) / (reference.0 + 1e-12) * 100.0
    }
}

impl Eq for AfiScore {}

impl PartialOrd for AfiScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AfiScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for AfiScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

impl Serialize for AfiScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

/// Pure aggregation of MIC and toxicity predictions into an [`AfiScore`].
#[derive(Debug, Clone, PartialEq)]
pub struct AfiScorer {
    weights: AfiWeights,
}

impl AfiScorer {
    pub fn new(weights: AfiWeights) -> Result<Self, WeightsError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &AfiWeights {
        &self.weights
    }

    pub fn score(
        &self,
        mic: &SpeciesMic,
        toxicity: &ToxicityProfile,
    ) -> Result<AfiScore, ScoringError> {
        let potency = self.potency(mic)?;
        let penalty = self.penalty(toxicity)?;

        let afi = match self.weights.penalty {
            PenaltyForm::Multiplicative => potency * penalty.exp(),
            PenaltyForm::Additive => potency + penalty,
        };
        AfiScore::new(afi)
    }

    fn potency(&self, mic: &SpeciesMic) -> Result<f64, ScoringError> {
        let mut values = Vec::with_capacity(self.weights.species_weights.len());
        for (species, &weight) in &self.weights.species_weights {
            let value = mic
                .get(species)
                .ok_or_else(|| ScoringError::MissingSpecies(species.clone()))?;
            if !value.is_finite() || value <= 0.0 {
                return Err(ScoringError::InvalidMic {
                    species: species.clone(),
                    value,
                });
            }
            values.push((value, weight));
        }

        let total_weight: f64 = values.iter().map(|&(_, w)| w).sum();
        let potency = match self.weights.mic_statistic {
            CentralTendency::GeometricMean => {
                let log_sum: f64 = values.iter().map(|&(v, w)| w * v.ln()).sum();
                (log_sum / total_weight).exp()
            }
            CentralTendency::ArithmeticMean => {
                values.iter().map(|&(v, w)| w * v).sum::<f64>() / total_weight
            }
            CentralTendency::Median => weighted_lower_median(&mut values, total_weight),
            CentralTendency::Max => values
                .iter()
                .filter(|&&(_, w)| w > 0.0)
                .map(|&(v, _)| v)
                .fold(f64::NEG_INFINITY, f64::max),
        };
        Ok(potency)
    }

    fn penalty(&self, toxicity: &ToxicityProfile) -> Result<f64, ScoringError> {
        let mut penalty = 0.0;
        for (assay, &weight) in &self.weights.toxicity_weights {
            let value = toxicity
                .get(assay)
                .ok_or_else(|| ScoringError::MissingAssay(assay.clone()))?;
            if !value.is_finite() {
                return Err(ScoringError::InvalidToxicity {
                    assay: assay.clone(),
                    value,
                });
            }
            penalty += weight * value;
        }
        Ok(penalty)
    }
}

fn weighted_lower_median(values: &mut [(f64, f64)], total_weight: f64) -> f64 {
    values.sort_by(|a, b| a.0.total_cmp(&b.0));
    let half = total_weight / 2.0;
    let mut cumulative = 0.0;
    for &(value, weight) in values.iter() {
        cumulative += weight;
        if cumulative >= half && weight > 0.0 {
            return value;
        }
    }
    values.last().map(|&(v, _)| v).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mic(values: &[(&str, f64)]) -> SpeciesMic {
        values.iter().map(|&(k, v)| (k, v)).collect()
    }

    fn tox(values: &[(&str, f64)]) -> ToxicityProfile {
        values.iter().map(|&(k, v)| (k, v)).collect()
    }

    fn weights(statistic: CentralTendency, penalty: PenaltyForm) -> AfiWeights {
        let mut w = AfiWeights::uniform("test", ["C_albicans", "C_neoformans", "C_auris"])
            .with_toxicity_weight("hemolysis", 1.0);
        w.mic_statistic = statistic;
        w.penalty = penalty;
        w
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    const MICS: [(&str, f64); 3] = [("C_albicans", 2.0), ("C_neoformans", 8.0), ("C_auris", 4.0)];

    #[test]
    fn geometric_mean_with_zero_toxicity_is_plain_mean() {
        let scorer =
            AfiScorer::new(weights(CentralTendency::GeometricMean, PenaltyForm::Multiplicative))
                .unwrap();
        let score = scorer
            .score(&mic(&MICS), &tox(&[("hemolysis", 0.0)]))
            .unwrap();
        assert!(approx(score.value(), 4.0));
    }

    #[test]
    fn arithmetic_median_and_max_statistics() {
        let t = tox(&[("hemolysis", 0.0)]);
        let score = |s| {
            AfiScorer::new(weights(s, PenaltyForm::Additive))
                .unwrap()
                .score(&mic(&MICS), &t)
                .unwrap()
                .value()
        };
        assert!(approx(score(CentralTendency::ArithmeticMean), 14.0 / 3.0));
        assert!(approx(score(CentralTendency::Median), 4.0));
        assert!(approx(score(CentralTendency::Max), 8.0));
    }

    #[test]
    fn species_weights_shift_the_geometric_mean() {
        let mut w = weights(CentralTendency::GeometricMean, PenaltyForm::Multiplicative);
        w.species_weights.insert("C_neoformans".to_string(), 0.0);
        w.species_weights.insert("C_auris".to_string(), 0.0);
        let scorer = AfiScorer::new(w).unwrap();
        let score = scorer
            .score(&mic(&MICS), &tox(&[("hemolysis", 0.0)]))
            .unwrap();
        assert!(approx(score.value(), 2.0));
    }

    #[test]
    fn higher_toxicity_increases_afi() {
        for penalty in [PenaltyForm::Multiplicative, PenaltyForm::Additive] {
            let scorer = AfiScorer::new(weights(CentralTendency::GeometricMean, penalty)).unwrap();
            let low = scorer.score(&mic(&MICS), &tox(&[("hemolysis", 0.1)])).unwrap();
            let high = scorer.score(&mic(&MICS), &tox(&[("hemolysis", 0.9)])).unwrap();
            assert!(high > low);
        }
    }

    #[test]
    fn more_potent_prediction_scores_lower() {
        let scorer =
            AfiScorer::new(weights(CentralTendency::GeometricMean, PenaltyForm::Multiplicative))
                .unwrap();
        let t = tox(&[("hemolysis", 0.2)]);
        let weak = scorer.score(&mic(&MICS), &t).unwrap();
        let strong = scorer
            .score(
                &mic(&[("C_albicans", 1.0), ("C_neoformans", 2.0), ("C_auris", 1.0)]),
                &t,
            )
            .unwrap();
        assert!(strong < weak);
    }

    #[test]
    fn scoring_is_deterministic() {
        let scorer =
            AfiScorer::new(weights(CentralTendency::GeometricMean, PenaltyForm::Multiplicative))
                .unwrap();
        let m = mic(&MICS);
        let t = tox(&[("hemolysis", 0.37)]);
        assert_eq!(scorer.score(&m, &t).unwrap(), scorer.score(&m, &t).unwrap());
    }

    #[test]
    fn unconfigured_species_and_assays_are_ignored() {
        let scorer =
            AfiScorer::new(weights(CentralTendency::GeometricMean, PenaltyForm::Multiplicative))
                .unwrap();
        let mut m = mic(&MICS);
        m.insert("A_fumigatus", 1000.0);
        let mut t = tox(&[("hemolysis", 0.0)]);
        t.insert("cytotoxicity", 50.0);
        assert!(approx(scorer.score(&m, &t).unwrap().value(), 4.0));
    }

    #[test]
    fn malformed_input_is_rejected() {
        let scorer =
            AfiScorer::new(weights(CentralTendency::GeometricMean, PenaltyForm::Multiplicative))
                .unwrap();
        let t = tox(&[("hemolysis", 0.0)]);

        let missing = mic(&[("C_albicans", 2.0), ("C_neoformans", 8.0)]);
        assert_eq!(
            scorer.score(&missing, &t),
            Err(ScoringError::MissingSpecies("C_auris".to_string()))
        );

        let negative = mic(&[("C_albicans", -2.0), ("C_neoformans", 8.0), ("C_auris", 4.0)]);
        assert!(matches!(
            scorer.score(&negative, &t),
            Err(ScoringError::InvalidMic { .. })
        ));

        assert_eq!(
            scorer.score(&mic(&MICS), &ToxicityProfile::new()),
            Err(ScoringError::MissingAssay("hemolysis".to_string()))
        );

        assert!(matches!(
            scorer.score(&mic(&MICS), &tox(&[("hemolysis", f64::NAN)])),
            Err(ScoringError::InvalidToxicity { .. })
        ));
    }

    #[test]
    fn overflowing_penalty_is_reported_as_non_finite() {
        let scorer =
            AfiScorer::new(weights(CentralTendency::GeometricMean, PenaltyForm::Multiplicative))
                .unwrap();
        let result = scorer.score(&mic(&MICS), &tox(&[("hemolysis", 1e6)]));
        assert!(matches!(result, Err(ScoringError::NonFinite(_))));
    }

    #[test]
    fn scores_are_totally_ordered_and_relative_decrease_is_signed() {
        let a = AfiScore::new(2.0).unwrap();
        let b = AfiScore::new(4.0).unwrap();
        assert!(a < b);
        assert_eq!(a.max(b), b);
        assert!(approx(a.relative_decrease(b), 50.0));
        assert!(b.relative_decrease(a) < 0.0);
        assert!(AfiScore::new(f64::NAN).is_err());
    }
}
