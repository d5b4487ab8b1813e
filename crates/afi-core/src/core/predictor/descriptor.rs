use super::{ModelLoadError, Prediction, PredictionError, Predictor};
use crate::core::models::amino_acid::{AminoAcid, CANONICAL_ORDER};
use crate::core::models::sequence::Sequence;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

const PH: f64 = 7.4;

// EMBOSS pKa values.
const PKA_NTERM: f64 = 9.69;
const PKA_CTERM: f64 = 2.34;
const PKA_D: f64 = 3.65;
const PKA_E: f64 = 4.25;
const PKA_C: f64 = 8.18;
const PKA_Y: f64 = 10.07;
const PKA_H: f64 = 6.00;
const PKA_K: f64 = 10.53;
const PKA_R: f64 = 12.48;

/// Kyte-Doolittle hydropathy, indexed by canonical order.
const KYTE_DOOLITTLE: [f64; 20] = [
    1.8, 2.5, -3.5, -3.5, 2.8, -0.4, -3.2, 4.5, -3.9, 3.8, 1.9, -3.5, -1.6, -3.5, -4.5, -0.8,
    -0.7, 4.2, -0.9, -1.3,
];

/// Hopp-Woods hydrophilicity, indexed by canonical order.
const HOPP_WOODS: [f64; 20] = [
    -0.5, -1.0, 3.0, 3.0, -2.5, 0.0, -0.5, -1.8, 3.0, -1.8, -1.3, 0.2, 0.0, 0.2, 3.0, 0.3, -0.4,
    -1.5, -3.4, -2.3,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    Length,
    NetCharge,
    Gravy,
    Hydrophilicity,
    AromaticFraction,
    Fraction(AminoAcid),
}

impl FromStr for Descriptor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "length" => Ok(Descriptor::Length),
            "net_charge" => Ok(Descriptor::NetCharge),
            "gravy" => Ok(Descriptor::Gravy),
            "hydrophilicity" => Ok(Descriptor::Hydrophilicity),
            "aromatic_fraction" => Ok(Descriptor::AromaticFraction),
            other => other
                .strip_prefix("frac_")
                .and_then(|code| code.parse::<AminoAcid>().ok())
                .map(Descriptor::Fraction)
                .ok_or_else(|| format!("unknown descriptor '{}'", other)),
        }
    }
}

/// Physicochemical descriptors of one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorSet {
    pub length: f64,
    pub net_charge: f64,
    pub gravy: f64,
    pub hydrophilicity: f64,
    pub aromatic_fraction: f64,
    pub fractions: [f64; 20],
}

impl DescriptorSet {
    pub fn compute(sequence: &Sequence) -> Self {
        let length = sequence.len() as f64;
        let mut counts = [0usize; 20];
        for residue in sequence.residues() {
            counts[residue.index()] += 1;
        }

        let mut fractions = [0.0; 20];
        let mut gravy = 0.0;
        let mut hydrophilicity = 0.0;
        let mut aromatic = 0.0;
        for aa in CANONICAL_ORDER {
            let n = counts[aa.index()] as f64;
            fractions[aa.index()] = n / length;
            gravy += n * KYTE_DOOLITTLE[aa.index()];
            hydrophilicity += n * HOPP_WOODS[aa.index()];
            if aa.is_aromatic() {
                aromatic += n;
            }
        }

        Self {
            length,
            net_charge: net_charge(&counts, PH),
            gravy: gravy / length,
            hydrophilicity: hydrophilicity / length,
            aromatic_fraction: aromatic / length,
            fractions,
        }
    }

    pub fn value(&self, descriptor: Descriptor) -> f64 {
        match descriptor {
            Descriptor::Length => self.length,
            Descriptor::NetCharge => self.net_charge,
            Descriptor::Gravy => self.gravy,
            Descriptor::Hydrophilicity => self.hydrophilicity,
            Descriptor::AromaticFraction => self.aromatic_fraction,
            Descriptor::Fraction(aa) => self.fractions[aa.index()],
        }
    }
}

fn net_charge(counts: &[usize; 20], ph: f64) -> f64 {
    let positive = |pka: f64| 1.0 / (1.0 + 10_f64.powf(ph - pka));
    let negative = |pka: f64| 1.0 / (1.0 + 10_f64.powf(pka - ph));
    let n = |aa: AminoAcid| counts[aa.index()] as f64;

    positive(PKA_NTERM) - negative(PKA_CTERM)
        + n(AminoAcid::Histidine) * positive(PKA_H)
        + n(AminoAcid::Lysine) * positive(PKA_K)
        + n(AminoAcid::Arginine) * positive(PKA_R)
        - n(AminoAcid::AsparticAcid) * negative(PKA_D)
        - n(AminoAcid::GlutamicAcid) * negative(PKA_E)
        - n(AminoAcid::Cysteine) * negative(PKA_C)
        - n(AminoAcid::Tyrosine) * negative(PKA_Y)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LinearTermFile {
    intercept: f64,
    #[serde(default)]
    coefficients: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelFile {
    version: String,
    species: BTreeMap<String, LinearTermFile>,
    #[serde(default)]
    assays: BTreeMap<String, LinearTermFile>,
}

#[derive(Debug, Clone, PartialEq)]
struct LinearModel {
    intercept: f64,
    terms: Vec<(Descriptor, f64)>,
}

impl LinearModel {
    fn from_file(owner: &str, file: LinearTermFile) -> Result<Self, ModelLoadError> {
        if !file.intercept.is_finite() {
            return Err(ModelLoadError::InvalidModel(format!(
                "intercept of '{}' must be finite",
                owner
            )));
        }
        let terms = file
            .coefficients
            .into_iter()
            .map(|(name, coef)| {
                let descriptor = name
                    .parse::<Descriptor>()
                    .map_err(|e| ModelLoadError::InvalidModel(format!("{}: {}", owner, e)))?;
                if !coef.is_finite() {
                    return Err(ModelLoadError::InvalidModel(format!(
                        "{}: coefficient '{}' must be finite",
                        owner, name
                    )));
                }
                Ok((descriptor, coef))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            intercept: file.intercept,
            terms,
        })
    }

    fn evaluate(&self, descriptors: &DescriptorSet) -> f64 {
        self.terms
            .iter()
            .fold(self.intercept, |acc, &(d, coef)| acc + coef * descriptors.value(d))
    }
}

/// Log-linear surrogate model over sequence descriptors.
///
/// For every species `log2(MIC) = intercept + Σ coef · descriptor`; for every
/// assay `score = intercept + Σ coef · descriptor`.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorModel {
    version: String,
    species: Vec<String>,
    assays: Vec<String>,
    mic_models: Vec<LinearModel>,
    toxicity_models: Vec<LinearModel>,
}

impl DescriptorModel {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: ModelFile = toml::from_str(&content).map_err(|e| ModelLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_model_file(file)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ModelLoadError> {
        let file: ModelFile = toml::from_str(content).map_err(|e| ModelLoadError::Toml {
            path: "<string>".to_string(),
            source: e,
        })?;
        Self::from_model_file(file)
    }

    fn from_model_file(file: ModelFile) -> Result<Self, ModelLoadError> {
        if file.species.is_empty() {
            return Err(ModelLoadError::InvalidModel(
                "at least one species model is required".to_string(),
            ));
        }

        let mut species = Vec::with_capacity(file.species.len());
        let mut mic_models = Vec::with_capacity(file.species.len());
        for (id, term) in file.species {
            mic_models.push(LinearModel::from_file(&id, term)?);
            species.push(id);
        }

        let mut assays = Vec::with_capacity(file.assays.len());
        let mut toxicity_models = Vec::with_capacity(file.assays.len());
        for (id, term) in file.assays {
            toxicity_models.push(LinearModel::from_file(&id, term)?);
            assays.push(id);
        }

        Ok(Self {
            version: file.version,
            species,
            assays,
            mic_models,
            toxicity_models,
        })
    }
}

impl Predictor for DescriptorModel {
    fn species(&self) -> &[String] {
        &self.species
    }

    fn assays(&self) -> &[String] {
        &self.assays
    }

    fn model_version(&self) -> Option<&str> {
        Some(&self.version)
    }

    fn predict(&self, sequence: &Sequence) -> Result<Prediction, PredictionError> {
        let descriptors = DescriptorSet::compute(sequence);

        let mic = self
            .species
            .iter()
            .zip(&self.mic_models)
            .map(|(id, model)| (id.as_str(), 2_f64.powf(model.evaluate(&descriptors))))
            .collect();
        let toxicity = self
            .assays
            .iter()
            .zip(&self.toxicity_models)
            .map(|(id, model)| (id.as_str(), model.evaluate(&descriptors)))
            .collect();

        Ok(Prediction { mic, toxicity })
    }
}
