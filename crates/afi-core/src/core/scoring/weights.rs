use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeightsError {
    #[error("At least one species weight is required")]
    NoSpecies,
    #[error("Weight for {kind} '{id}' must be finite and non-negative, got {value}")]
    InvalidWeight {
        kind: &'static str,
        id: String,
        value: f64,
    },
    #[error("Species weights must not all be zero")]
    ZeroTotalWeight,
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Statistic used to collapse per-species MICs into one potency value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CentralTendency {
    #[default]
    GeometricMean,
    ArithmeticMean,
    /// Weighted lower median.
    Median,
    /// Worst (highest) MIC over species with non-zero weight.
    Max,
}

/// How the weighted toxicity sum enters the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PenaltyForm {
    /// `afi = potency * exp(penalty)`
    #[default]
    Multiplicative,
    /// `afi = potency + penalty`
    Additive,
}

/// Versioned AFI aggregation parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AfiWeights {
    pub version: String,
    #[serde(default)]
    pub mic_statistic: CentralTendency,
    #[serde(default)]
    pub penalty: PenaltyForm,
    pub species_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub toxicity_weights: BTreeMap<String, f64>,
}

impl AfiWeights {
    /// Equal species weights and no toxicity penalty.
    pub fn uniform<I, S>(version: &str, species: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            version: version.to_string(),
            mic_statistic: CentralTendency::default(),
            penalty: PenaltyForm::default(),
            species_weights: species.into_iter().map(|s| (s.into(), 1.0)).collect(),
            toxicity_weights: BTreeMap::new(),
        }
    }

    pub fn with_toxicity_weight(mut self, assay: &str, weight: f64) -> Self {
        self.toxicity_weights.insert(assay.to_string(), weight);
        self
    }

    pub fn load(path: &Path) -> Result<Self, WeightsError> {
        let content = std::fs::read_to_string(path).map_err(|e| WeightsError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let weights: Self = toml::from_str(&content).map_err(|e| WeightsError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), WeightsError> {
        if self.species_weights.is_empty() {
            return Err(WeightsError::NoSpecies);
        }
        let check = |kind: &'static str, (id, &value): (&String, &f64)| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(WeightsError::InvalidWeight {
                    kind,
                    id: id.clone(),
                    value,
                })
            }
        };
        for entry in &self.species_weights {
            check("species", entry)?;
        }
        for entry in &self.toxicity_weights {
            check("toxicity assay", entry)?;
        }
        if self.species_weights.values().sum::<f64>() <= 0.0 {
            return Err(WeightsError::ZeroTotalWeight);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn deserializes_kebab_case_toml_with_defaults() {
        let weights: AfiWeights = toml::from_str(
            r#"
            version = "afi-2024.1"

            [species-weights]
            C_albicans = 1.0
            C_neoformans = 2.0

            [toxicity-weights]
            hemolysis = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(weights.mic_statistic, CentralTendency::GeometricMean);
        assert_eq!(weights.penalty, PenaltyForm::Multiplicative);
        assert_eq!(weights.species_weights["C_neoformans"], 2.0);
        assert_eq!(weights.toxicity_weights["hemolysis"], 0.5);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn explicit_statistic_and_penalty_are_read() {
        let weights: AfiWeights = toml::from_str(
            r#"
            version = "v"
            mic-statistic = "median"
            penalty = "additive"
            species-weights = { C_albicans = 1.0 }
            "#,
        )
        .unwrap();
        assert_eq!(weights.mic_statistic, CentralTendency::Median);
        assert_eq!(weights.penalty, PenaltyForm::Additive);
    }

    #[test]
    fn validate_rejects_empty_species() {
        let weights = AfiWeights::uniform("v", Vec::<String>::new());
        assert!(matches!(weights.validate(), Err(WeightsError::NoSpecies)));
    }

    #[test]
    fn validate_rejects_negative_and_nan_weights() {
        let negative = AfiWeights::uniform("v", ["C_albicans"]).with_toxicity_weight("hemolysis", -1.0);
        assert!(matches!(
            negative.validate(),
            Err(WeightsError::InvalidWeight { .. })
        ));

        let mut nan = AfiWeights::uniform("v", ["C_albicans"]);
        nan.species_weights.insert("C_auris".to_string(), f64::NAN);
        assert!(matches!(nan.validate(), Err(WeightsError::InvalidWeight { .. })));
    }

    #[test]
    fn validate_rejects_all_zero_species_weights() {
        let mut weights = AfiWeights::uniform("v", ["C_albicans"]);
        weights.species_weights.insert("C_albicans".to_string(), 0.0);
        assert!(matches!(weights.validate(), Err(WeightsError::ZeroTotalWeight)));
    }

    #[test]
    fn load_validates_file_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weights.toml");
        fs::write(&path, "version = \"v\"\n[species-weights]\n").unwrap();
        assert!(matches!(AfiWeights::load(&path), Err(WeightsError::NoSpecies)));

        fs::write(&path, "version = \"v\"\nunknown = 1\n").unwrap();
        assert!(matches!(AfiWeights::load(&path), Err(WeightsError::Toml { .. })));
    }
}
