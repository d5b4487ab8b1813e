use crate::core::models::amino_acid::{AminoAcid, CANONICAL_ORDER};
use crate::core::predictor::Predictor;
use crate::core::scoring::weights::{AfiWeights, WeightsError};
use std::collections::BTreeSet;
use thiserror::Error;

/// Shortest segment the enumerator may produce; shorter fragments are biologically trivial.
pub const MIN_SEGMENT_LENGTH: usize = 6;

pub const DEFAULT_POPULATION_SIZE: usize = 8;
pub const DEFAULT_OFFSPRING_PER_GENERATION: usize = 16;
pub const DEFAULT_SELECTION_TEMPERATURE: f64 = 1.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid AFI weights: {0}")]
    Weights(#[from] WeightsError),

    #[error("Minimum segment length {min_length} is below the floor of {MIN_SEGMENT_LENGTH}")]
    SegmentTooShort { min_length: usize },

    #[error("Maximum segment length {max_length} is smaller than the minimum {min_length}")]
    InvalidSegmentBounds { min_length: usize, max_length: usize },

    #[error("Sequence of length {length} is shorter than the minimum segment length {min_length}")]
    SequenceTooShort { length: usize, min_length: usize },

    #[error("Substitution alphabet is empty")]
    EmptyAlphabet,

    #[error("Residue '{0}' appears more than once in the substitution alphabet")]
    DuplicateResidue(AminoAcid),

    #[error("Evaluation budget must be at least 1")]
    ZeroBudget,

    #[error("Population size must be at least 1")]
    ZeroPopulation,

    #[error("Offspring per generation must be at least 1")]
    ZeroOffspring,

    #[error("Positions per move must be at least 1")]
    ZeroPositionsPerMove,

    #[error("Selection temperature must be positive and finite, got {0}")]
    InvalidTemperature(f64),

    #[error("Frozen position {position} is out of bounds for a sequence of length {length}")]
    FrozenPositionOutOfBounds { position: usize, length: usize },

    #[error("Every position of the length-{length} sequence is frozen")]
    NoMutablePositions { length: usize },

    #[error("Worker count must be at least 1")]
    ZeroWorkers,

    #[error("Weighted species '{0}' is not reported by the predictor")]
    UnknownSpecies(String),

    #[error("Weighted toxicity assay '{0}' is not reported by the predictor")]
    UnknownAssay(String),
}

/// Checks that `predictor` declares every species and assay `weights` refers to.
pub fn check_predictor_outputs(
    weights: &AfiWeights,
    predictor: &dyn Predictor,
) -> Result<(), ConfigError> {
    let species = predictor.species();
    if let Some(missing) = weights.species_weights.keys().find(|id| !species.contains(*id)) {
        return Err(ConfigError::UnknownSpecies(missing.clone()));
    }
    let assays = predictor.assays();
    if let Some(missing) = weights.toxicity_weights.keys().find(|id| !assays.contains(*id)) {
        return Err(ConfigError::UnknownAssay(missing.clone()));
    }
    Ok(())
}

fn validate_alphabet(alphabet: &[AminoAcid]) -> Result<(), ConfigError> {
    if alphabet.is_empty() {
        return Err(ConfigError::EmptyAlphabet);
    }
    let mut seen = BTreeSet::new();
    for &residue in alphabet {
        if !seen.insert(residue) {
            return Err(ConfigError::DuplicateResidue(residue));
        }
    }
    Ok(())
}

fn canonical_alphabet(alphabet: &[AminoAcid]) -> Vec<AminoAcid> {
    let mut sorted = alphabet.to_vec();
    sorted.sort_unstable();
    sorted
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationConfig {
    pub min_length: usize,
    /// Defaults to the parent length when unset.
    pub max_length: Option<usize>,
}

impl SegmentationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_length < MIN_SEGMENT_LENGTH {
            return Err(ConfigError::SegmentTooShort {
                min_length: self.min_length,
            });
        }
        if let Some(max_length) = self.max_length {
            if max_length < self.min_length {
                return Err(ConfigError::InvalidSegmentBounds {
                    min_length: self.min_length,
                    max_length,
                });
            }
        }
        Ok(())
    }

    pub fn check_sequence(&self, length: usize) -> Result<(), ConfigError> {
        if length < self.min_length {
            return Err(ConfigError::SequenceTooShort {
                length,
                min_length: self.min_length,
            });
        }
        Ok(())
    }

    /// Upper length bound actually used for a parent of `length` residues.
    pub fn max_length_for(&self, length: usize) -> usize {
        self.max_length.map_or(length, |max| max.min(length))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationConfig {
    pub alphabet: Vec<AminoAcid>,
    pub exclude_wild_type: bool,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            alphabet: CANONICAL_ORDER.to_vec(),
            exclude_wild_type: true,
        }
    }
}

impl MutationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_alphabet(&self.alphabet)
    }

    /// The alphabet in canonical enumeration order.
    pub fn canonical_alphabet(&self) -> Vec<AminoAcid> {
        canonical_alphabet(&self.alphabet)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSearchConfig {
    /// Maximum number of predictor calls, including the seed.
    pub evaluation_budget: usize,
    pub positions_per_move: usize,
    pub random_seed: u64,
    pub population_size: usize,
    pub offspring_per_generation: usize,
    /// Boltzmann temperature (in AFI units) for parent selection.
    pub selection_temperature: f64,
    /// Generations without strict improvement before stopping early.
    pub patience: Option<usize>,
    pub alphabet: Vec<AminoAcid>,
    pub frozen_positions: BTreeSet<usize>,
}

impl GlobalSearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.evaluation_budget == 0 {
            return Err(ConfigError::ZeroBudget);
        }
        if self.positions_per_move == 0 {
            return Err(ConfigError::ZeroPositionsPerMove);
        }
        if self.population_size == 0 {
            return Err(ConfigError::ZeroPopulation);
        }
        if self.offspring_per_generation == 0 {
            return Err(ConfigError::ZeroOffspring);
        }
        if !(self.selection_temperature.is_finite() && self.selection_temperature > 0.0) {
            return Err(ConfigError::InvalidTemperature(self.selection_temperature));
        }
        validate_alphabet(&self.alphabet)
    }

    pub fn canonical_alphabet(&self) -> Vec<AminoAcid> {
        canonical_alphabet(&self.alphabet)
    }

    /// Positions of a length-`length` seed that moves may touch, in increasing order.
    pub fn mutable_positions(&self, length: usize) -> Result<Vec<usize>, ConfigError> {
        if let Some(&position) = self.frozen_positions.iter().find(|&&p| p >= length) {
            return Err(ConfigError::FrozenPositionOutOfBounds { position, length });
        }
        let positions: Vec<usize> = (0..length)
            .filter(|p| !self.frozen_positions.contains(p))
            .collect();
        if positions.is_empty() {
            return Err(ConfigError::NoMutablePositions { length });
        }
        Ok(positions)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignConfig {
    pub scoring: AfiWeights,
    pub segmentation: SegmentationConfig,
    pub mutation: MutationConfig,
    pub global_search: GlobalSearchConfig,
    /// Size of the dedicated worker pool; `None` uses the ambient rayon pool.
    pub max_workers: Option<usize>,
}

impl DesignConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        self.segmentation.validate()?;
        self.mutation.validate()?;
        self.global_search.validate()?;
        if self.max_workers == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct DesignConfigBuilder {
    scoring: Option<AfiWeights>,
    min_segment_length: Option<usize>,
    max_segment_length: Option<usize>,
    mutation_alphabet: Option<Vec<AminoAcid>>,
    exclude_wild_type: Option<bool>,
    evaluation_budget: Option<usize>,
    positions_per_move: Option<usize>,
    random_seed: Option<u64>,
    population_size: Option<usize>,
    offspring_per_generation: Option<usize>,
    selection_temperature: Option<f64>,
    patience: Option<usize>,
    search_alphabet: Option<Vec<AminoAcid>>,
    frozen_positions: BTreeSet<usize>,
    max_workers: Option<usize>,
}

impl DesignConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scoring(mut self, weights: AfiWeights) -> Self {
        self.scoring = Some(weights);
        self
    }
    pub fn min_segment_length(mut self, length: usize) -> Self {
        self.min_segment_length = Some(length);
        self
    }
    pub fn max_segment_length(mut self, length: usize) -> Self {
        self.max_segment_length = Some(length);
        self
    }
    pub fn mutation_alphabet(mut self, alphabet: Vec<AminoAcid>) -> Self {
        self.mutation_alphabet = Some(alphabet);
        self
    }
    pub fn exclude_wild_type(mut self, exclude: bool) -> Self {
        self.exclude_wild_type = Some(exclude);
        self
    }
    pub fn evaluation_budget(mut self, budget: usize) -> Self {
        self.evaluation_budget = Some(budget);
        self
    }
    pub fn positions_per_move(mut self, positions: usize) -> Self {
        self.positions_per_move = Some(positions);
        self
    }
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
    pub fn population_size(mut self, size: usize) -> Self {
        self.population_size = Some(size);
        self
    }
    pub fn offspring_per_generation(mut self, count: usize) -> Self {
        self.offspring_per_generation = Some(count);
        self
    }
    pub fn selection_temperature(mut self, temperature: f64) -> Self {
        self.selection_temperature = Some(temperature);
        self
    }
    pub fn patience(mut self, generations: usize) -> Self {
        self.patience = Some(generations);
        self
    }
    pub fn search_alphabet(mut self, alphabet: Vec<AminoAcid>) -> Self {
        self.search_alphabet = Some(alphabet);
        self
    }
    pub fn freeze_position(mut self, position: usize) -> Self {
        self.frozen_positions.insert(position);
        self
    }
    pub fn max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    /// Assembles and validates the configuration.
    pub fn build(self) -> Result<DesignConfig, ConfigError> {
        let segmentation = SegmentationConfig {
            min_length: self
                .min_segment_length
                .ok_or(ConfigError::MissingParameter("min_segment_length"))?,
            max_length: self.max_segment_length,
        };
        let mutation = MutationConfig {
            alphabet: self
                .mutation_alphabet
                .unwrap_or_else(|| CANONICAL_ORDER.to_vec()),
            exclude_wild_type: self.exclude_wild_type.unwrap_or(true),
        };
        let global_search = GlobalSearchConfig {
            evaluation_budget: self
                .evaluation_budget
                .ok_or(ConfigError::MissingParameter("evaluation_budget"))?,
            positions_per_move: self
                .positions_per_move
                .ok_or(ConfigError::MissingParameter("positions_per_move"))?,
            random_seed: self
                .random_seed
                .ok_or(ConfigError::MissingParameter("random_seed"))?,
            population_size: self.population_size.unwrap_or(DEFAULT_POPULATION_SIZE),
            offspring_per_generation: self
                .offspring_per_generation
                .unwrap_or(DEFAULT_OFFSPRING_PER_GENERATION),
            selection_temperature: self
                .selection_temperature
                .unwrap_or(DEFAULT_SELECTION_TEMPERATURE),
            patience: self.patience,
            alphabet: self
                .search_alphabet
                .unwrap_or_else(|| CANONICAL_ORDER.to_vec()),
            frozen_positions: self.frozen_positions,
        };
        let config = DesignConfig {
            scoring: self
                .scoring
                .ok_or(ConfigError::MissingParameter("scoring"))?,
            segmentation,
            mutation,
            global_search,
            max_workers: self.max_workers,
        };
        config.validate()?;
        Ok(config)
    }
}
