use super::design::PipelineError;
use crate::core::models::candidate::{Candidate, Provenance};
use crate::core::models::sequence::Sequence;
use crate::core::predictor::{PredictionError, Predictor};
use crate::core::scoring::afi::AfiScorer;
use crate::core::scoring::weights::AfiWeights;
use crate::engine::config::{ConfigError, check_predictor_outputs};
use crate::engine::context::DesignContext;
use crate::engine::error::Stage;
use crate::engine::evaluation::{CandidateError, ScoredCandidate, SkippedCandidate, evaluate_batch};
use crate::engine::utils::pool::run_with_workers;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct ScoreReport {
    /// Scored inputs in input order.
    pub scored: Vec<ScoredCandidate>,
    pub skipped: Vec<SkippedCandidate>,
}

/// Scores raw sequence strings. Unparseable inputs are reported as
/// [`PredictionError::MalformedSequence`] skips; the rest are evaluated as
/// one batch.
#[instrument(skip_all, name = "score_workflow", fields(inputs = inputs.len()))]
pub fn run<S: AsRef<str>>(
    inputs: &[S],
    weights: &AfiWeights,
    predictor: &dyn Predictor,
    reporter: &crate::engine::progress::ProgressReporter,
    max_workers: Option<usize>,
) -> Result<ScoreReport, PipelineError> {
    let scorer = AfiScorer::new(weights.clone()).map_err(ConfigError::from)?;
    check_predictor_outputs(weights, predictor)?;
    if max_workers == Some(0) {
        return Err(ConfigError::ZeroWorkers.into());
    }

    let mut candidates = Vec::with_capacity(inputs.len());
    let mut malformed = Vec::new();
    for (index, raw) in inputs.iter().enumerate() {
        let raw = raw.as_ref();
        match Sequence::parse(raw) {
            Ok(sequence) => candidates.push(Candidate::new(sequence, Provenance::Input { index })),
            Err(source) => {
                let skipped = SkippedCandidate {
                    label: Provenance::Input { index }.label(),
                    input: raw.to_string(),
                    error: CandidateError::Prediction(PredictionError::MalformedSequence {
                        input: raw.to_string(),
                        source,
                    }),
                };
                warn!(
                    label = %skipped.label,
                    input = %skipped.input,
                    error = %skipped.error,
                    "Skipping malformed input."
                );
                malformed.push(skipped);
            }
        }
    }

    let outcome = run_with_workers(max_workers, || {
        evaluate_batch(&DesignContext::new(predictor, &scorer, reporter), candidates)
    })
    .map_err(|source| PipelineError::StageFailed {
        stage: Stage::Initial,
        source,
    })?;

    let mut skipped = malformed;
    skipped.extend(outcome.skipped);
    skipped.sort_by_key(|s| input_index(&s.label));

    info!(
        scored = outcome.scored.len(),
        skipped = skipped.len(),
        "Batch scoring finished."
    );
    Ok(ScoreReport {
        scored: outcome.scored,
        skipped,
    })
}

fn input_index(label: &str) -> usize {
    label
        .strip_prefix("input_")
        .and_then(|i| i.parse().ok())
        .unwrap_or(usize::MAX)
}
