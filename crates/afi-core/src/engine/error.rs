use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::config::ConfigError;
use super::evaluation::CandidateError;
use super::utils::sampling::SamplingError;
use crate::core::models::sequence::SequenceError;

/// Pipeline stage a result or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Initial,
    Segmentation,
    MutationScan,
    GlobalSearch,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Initial => "initial",
            Stage::Segmentation => "segmentation",
            Stage::MutationScan => "mutation-scan",
            Stage::GlobalSearch => "global-search",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Stage '{stage}' produced no valid candidates ({skipped} of {attempted} skipped)")]
    NoValidCandidates {
        stage: Stage,
        attempted: usize,
        skipped: usize,
    },

    #[error("Could not evaluate the seed of stage '{stage}': {source}")]
    SeedEvaluation {
        stage: Stage,
        #[source]
        source: CandidateError,
    },

    #[error("Parent selection failed: {0}")]
    Sampling(#[from] SamplingError),

    #[error("Sequence edit failed: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}
