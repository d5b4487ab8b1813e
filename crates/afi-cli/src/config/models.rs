use crate::error::Result;
use afidesign::core::predictor::{
    Predictor, cache::CachingPredictor, descriptor::DescriptorModel, table::TablePredictor,
};
use afidesign::core::scoring::weights::AfiWeights;
use afidesign::engine::config::DesignConfig;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PredictorKind {
    /// CSV table of precomputed predictions.
    Table,
    /// TOML log-linear descriptor model.
    Descriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictorSpec {
    pub kind: PredictorKind,
    pub path: PathBuf,
    pub cache: bool,
}

impl PredictorSpec {
    pub fn load(&self) -> Result<Box<dyn Predictor>> {
        info!(kind = ?self.kind, path = %self.path.display(), "Loading predictor model.");
        let model: Box<dyn Predictor> = match self.kind {
            PredictorKind::Table => Box::new(TablePredictor::load(&self.path)?),
            PredictorKind::Descriptor => Box::new(DescriptorModel::load(&self.path)?),
        };
        if self.cache {
            Ok(Box::new(CachingPredictor::new(model)))
        } else {
            Ok(model)
        }
    }
}

pub struct DesignRunConfig {
    pub predictor: PredictorSpec,
    pub design: DesignConfig,
}

pub struct ScoreRunConfig {
    pub predictor: PredictorSpec,
    pub weights: AfiWeights,
    pub max_workers: Option<usize>,
}
