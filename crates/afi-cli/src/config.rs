pub mod defaults;
pub mod models;

use crate::cli::{DesignArgs, ScoreArgs};
use crate::error::{CliError, Result};
use afidesign::core::models::amino_acid::{self, AminoAcid};
use afidesign::core::scoring::weights::AfiWeights;
use afidesign::engine::config as core_config;
use defaults::DefaultsConfig;
use models::{DesignRunConfig, PredictorKind, PredictorSpec, ScoreRunConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialPredictorConfig {
    #[serde(rename = "type")]
    kind: Option<PredictorKind>,
    path: Option<PathBuf>,
    cache: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialScoringConfig {
    #[serde(rename = "weights-path")]
    weights_path: Option<PathBuf>,
    weights: Option<AfiWeights>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSegmentationConfig {
    #[serde(rename = "min-length")]
    min_length: Option<usize>,
    #[serde(rename = "max-length")]
    max_length: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialMutationConfig {
    alphabet: Option<String>,
    #[serde(rename = "exclude-wild-type")]
    exclude_wild_type: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialGlobalSearchConfig {
    #[serde(rename = "evaluation-budget")]
    evaluation_budget: Option<usize>,
    #[serde(rename = "positions-per-move")]
    positions_per_move: Option<usize>,
    #[serde(rename = "random-seed")]
    random_seed: Option<u64>,
    #[serde(rename = "population-size")]
    population_size: Option<usize>,
    #[serde(rename = "offspring-per-generation")]
    offspring_per_generation: Option<usize>,
    #[serde(rename = "selection-temperature")]
    selection_temperature: Option<f64>,
    patience: Option<usize>,
    alphabet: Option<String>,
    /// 1-based.
    #[serde(rename = "frozen-positions")]
    frozen_positions: Option<Vec<usize>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialExecutionConfig {
    #[serde(rename = "max-workers")]
    max_workers: Option<usize>,
}

/// A run file as written by the user; every section is optional until merged.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    predictor: Option<PartialPredictorConfig>,
    scoring: Option<PartialScoringConfig>,
    segmentation: Option<PartialSegmentationConfig>,
    mutation: Option<PartialMutationConfig>,
    #[serde(rename = "global-search")]
    global_search: Option<PartialGlobalSearchConfig>,
    execution: Option<PartialExecutionConfig>,
    /// Relative paths in the file are resolved against this directory.
    #[serde(skip)]
    base_dir: PathBuf,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    pub fn into_design_config(mut self, args: &DesignArgs) -> Result<DesignRunConfig> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();

        let predictor = self.predictor_spec(&defaults)?;
        let weights = self.weights()?;
        let seg = self.segmentation.take().unwrap_or_default();
        let mutation = self.mutation.take().unwrap_or_default();
        let search = self.global_search.take().unwrap_or_default();
        let execution = self.execution.take().unwrap_or_default();

        let mut builder = core_config::DesignConfigBuilder::new()
            .scoring(weights)
            .min_segment_length(
                args.min_segment_length
                    .or(seg.min_length)
                    .unwrap_or(defaults.min_segment_length),
            )
            .exclude_wild_type(
                mutation
                    .exclude_wild_type
                    .unwrap_or(defaults.exclude_wild_type),
            )
            .evaluation_budget(
                args.evaluation_budget
                    .or(search.evaluation_budget)
                    .unwrap_or(defaults.evaluation_budget),
            )
            .positions_per_move(
                args.positions_per_move
                    .or(search.positions_per_move)
                    .unwrap_or(defaults.positions_per_move),
            )
            .random_seed(
                args.seed
                    .or(search.random_seed)
                    .unwrap_or(defaults.random_seed),
            );

        if let Some(max_length) = args.max_segment_length.or(seg.max_length) {
            builder = builder.max_segment_length(max_length);
        }
        if let Some(alphabet) = mutation.alphabet {
            builder = builder.mutation_alphabet(parse_alphabet("mutation.alphabet", &alphabet)?);
        }
        if let Some(alphabet) = search.alphabet {
            builder = builder.search_alphabet(parse_alphabet("global-search.alphabet", &alphabet)?);
        }
        if let Some(size) = search.population_size {
            builder = builder.population_size(size);
        }
        if let Some(count) = search.offspring_per_generation {
            builder = builder.offspring_per_generation(count);
        }
        if let Some(temperature) = search.selection_temperature {
            builder = builder.selection_temperature(temperature);
        }
        if let Some(patience) = search.patience {
            builder = builder.patience(patience);
        }
        for position in search
            .frozen_positions
            .unwrap_or_default()
            .into_iter()
            .chain(args.frozen_positions.iter().copied())
        {
            if position == 0 {
                return Err(CliError::Config(
                    "Frozen positions are 1-based; 0 is not a valid position.".to_string(),
                ));
            }
            builder = builder.freeze_position(position - 1);
        }
        if let Some(workers) = args.max_workers.or(execution.max_workers) {
            builder = builder.max_workers(workers);
        }

        let design = builder.build().map_err(|e| CliError::Config(e.to_string()))?;
        Ok(DesignRunConfig { predictor, design })
    }

    pub fn into_score_config(mut self, args: &ScoreArgs) -> Result<ScoreRunConfig> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();

        let predictor = self.predictor_spec(&defaults)?;
        let weights = self.weights()?;
        let max_workers = args
            .max_workers
            .or(self.execution.as_ref().and_then(|e| e.max_workers));
        if max_workers == Some(0) {
            return Err(CliError::Config(
                core_config::ConfigError::ZeroWorkers.to_string(),
            ));
        }

        Ok(ScoreRunConfig {
            predictor,
            weights,
            max_workers,
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn predictor_spec(&self, defaults: &DefaultsConfig) -> Result<PredictorSpec> {
        let partial = self.predictor.as_ref().ok_or_else(|| {
            CliError::Config("`[predictor]` section is required.".to_string())
        })?;
        let kind = partial
            .kind
            .ok_or_else(|| CliError::Config("`predictor.type` is required.".to_string()))?;
        let path = partial
            .path
            .as_ref()
            .ok_or_else(|| CliError::Config("`predictor.path` is required.".to_string()))?;
        Ok(PredictorSpec {
            kind,
            path: self.resolve(path),
            cache: partial.cache.unwrap_or(defaults.cache_predictions),
        })
    }

    fn weights(&self) -> Result<AfiWeights> {
        let scoring = self
            .scoring
            .as_ref()
            .ok_or_else(|| CliError::Config("`[scoring]` section is required.".to_string()))?;
        match (&scoring.weights_path, &scoring.weights) {
            (Some(_), Some(_)) => Err(CliError::Config(
                "Specify either `scoring.weights-path` or `[scoring.weights]`, not both."
                    .to_string(),
            )),
            (Some(path), None) => {
                let path = self.resolve(path);
                debug!("Loading AFI weights from {:?}", path);
                AfiWeights::load(&path).map_err(|e| CliError::Config(e.to_string()))
            }
            (None, Some(weights)) => {
                weights
                    .validate()
                    .map_err(|e| CliError::Config(e.to_string()))?;
                Ok(weights.clone())
            }
            (None, None) => Err(CliError::Config(
                "AFI weights are required: set `scoring.weights-path` or `[scoring.weights]`."
                    .to_string(),
            )),
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();
            let value_str = value_str.trim();

            match key {
                "predictor.type" => {
                    self.predictor
                        .get_or_insert_with(Default::default)
                        .kind = Some(match value_str {
                        "table" => PredictorKind::Table,
                        "descriptor" => PredictorKind::Descriptor,
                        _ => {
                            return Err(CliError::Config(format!(
                                "Invalid value for {}: {} (expected 'table' or 'descriptor')",
                                key, value_str
                            )));
                        }
                    });
                }
                "predictor.path" => {
                    self.predictor.get_or_insert_with(Default::default).path =
                        Some(command_line_path(value_str)?);
                }
                "predictor.cache" => {
                    self.predictor.get_or_insert_with(Default::default).cache =
                        Some(parse_value(key, value_str)?);
                }
                "scoring.weights-path" => {
                    self.scoring.get_or_insert_with(Default::default).weights_path =
                        Some(command_line_path(value_str)?);
                }
                "segmentation.min-length" => {
                    self.segmentation
                        .get_or_insert_with(Default::default)
                        .min_length = Some(parse_value(key, value_str)?);
                }
                "segmentation.max-length" => {
                    self.segmentation
                        .get_or_insert_with(Default::default)
                        .max_length = Some(parse_value(key, value_str)?);
                }
                "mutation.alphabet" => {
                    self.mutation.get_or_insert_with(Default::default).alphabet =
                        Some(value_str.to_string());
                }
                "mutation.exclude-wild-type" => {
                    self.mutation
                        .get_or_insert_with(Default::default)
                        .exclude_wild_type = Some(parse_value(key, value_str)?);
                }
                "global-search.evaluation-budget" => {
                    self.global_search
                        .get_or_insert_with(Default::default)
                        .evaluation_budget = Some(parse_value(key, value_str)?);
                }
                "global-search.positions-per-move" => {
                    self.global_search
                        .get_or_insert_with(Default::default)
                        .positions_per_move = Some(parse_value(key, value_str)?);
                }
                "global-search.random-seed" => {
                    self.global_search
                        .get_or_insert_with(Default::default)
                        .random_seed = Some(parse_value(key, value_str)?);
                }
                "global-search.population-size" => {
                    self.global_search
                        .get_or_insert_with(Default::default)
                        .population_size = Some(parse_value(key, value_str)?);
                }
                "global-search.offspring-per-generation" => {
                    self.global_search
                        .get_or_insert_with(Default::default)
                        .offspring_per_generation = Some(parse_value(key, value_str)?);
                }
                "global-search.selection-temperature" => {
                    self.global_search
                        .get_or_insert_with(Default::default)
                        .selection_temperature = Some(parse_value(key, value_str)?);
                }
                "global-search.patience" => {
                    self.global_search
                        .get_or_insert_with(Default::default)
                        .patience = Some(parse_value(key, value_str)?);
                }
                "global-search.alphabet" => {
                    self.global_search
                        .get_or_insert_with(Default::default)
                        .alphabet = Some(value_str.to_string());
                }
                "execution.max-workers" => {
                    self.execution
                        .get_or_insert_with(Default::default)
                        .max_workers = Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

/// Paths given on the command line are relative to the working directory, not the run file.
fn command_line_path(value: &str) -> Result<PathBuf> {
    Ok(std::path::absolute(value)?)
}

fn parse_alphabet(key: &str, value: &str) -> Result<Vec<AminoAcid>> {
    amino_acid::parse_alphabet(value)
        .map_err(|e| CliError::Config(format!("Invalid {}: {} ({})", key, value, e)))
}
