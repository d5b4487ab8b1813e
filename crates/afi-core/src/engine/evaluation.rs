use super::context::DesignContext;
use super::progress::Progress;
use crate::core::models::candidate::Candidate;
use crate::core::predictor::{Prediction, PredictionError, predict_checked};
use crate::core::scoring::afi::{AfiScore, ScoringError};
use thiserror::Error;
use tracing::{instrument, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Failure confined to a single candidate; the candidate is dropped, the stage continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandidateError {
    #[error(transparent)]
    Prediction(#[from] PredictionError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl CandidateError {
    /// Short stable name used to aggregate skip counts.
    pub fn kind(&self) -> &'static str {
        match self {
            CandidateError::Prediction(e) => match e {
                PredictionError::MalformedSequence { .. } => "malformed-sequence",
                PredictionError::MissingOutput { .. } => "missing-output",
                PredictionError::NonNumeric { .. } => "non-numeric-output",
                PredictionError::ModelFailure { .. } => "model-failure",
            },
            CandidateError::Scoring(e) => match e {
                ScoringError::MissingSpecies(_) => "missing-species",
                ScoringError::InvalidMic { .. } => "invalid-mic",
                ScoringError::MissingAssay(_) => "missing-assay",
                ScoringError::InvalidToxicity { .. } => "invalid-toxicity",
                ScoringError::NonFinite(_) => "non-finite-afi",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub afi: AfiScore,
    pub prediction: Prediction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCandidate {
    pub label: String,
    /// The sequence text that failed, as supplied or generated.
    pub input: String,
    pub error: CandidateError,
}

/// Scored and skipped candidates of one batch, each in enumeration order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub scored: Vec<ScoredCandidate>,
    pub skipped: Vec<SkippedCandidate>,
}

pub fn evaluate_candidate(
    context: &DesignContext,
    candidate: Candidate,
) -> Result<ScoredCandidate, CandidateError> {
    let prediction = predict_checked(context.predictor, &candidate.sequence)?;
    let afi = context
        .scorer
        .score(&prediction.mic, &prediction.toxicity)?;
    trace!(label = %candidate.label(), afi = afi.value(), "Candidate scored.");
    Ok(ScoredCandidate {
        candidate,
        afi,
        prediction,
    })
}

/// Evaluates independent candidates, in parallel when enabled. Output order
/// follows input order regardless of completion order.
#[instrument(skip_all, fields(candidates = candidates.len()))]
pub fn evaluate_batch(context: &DesignContext, candidates: Vec<Candidate>) -> BatchOutcome {
    context.reporter.report(Progress::BatchStart {
        candidates: candidates.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = candidates.into_iter();

    #[cfg(feature = "parallel")]
    let iterator = candidates.into_par_iter();

    let results: Vec<Result<ScoredCandidate, SkippedCandidate>> = iterator
        .map(|candidate| {
            let label = candidate.label();
            let input = candidate.sequence.to_string();
            let outcome = evaluate_candidate(context, candidate)
                .map_err(|error| SkippedCandidate { label, input, error });
            context.reporter.report(Progress::CandidateEvaluated);
            outcome
        })
        .collect();

    context.reporter.report(Progress::BatchFinish);

    let mut outcome = BatchOutcome::default();
    for result in results {
        match result {
            Ok(scored) => outcome.scored.push(scored),
            Err(skipped) => {
                warn!(
                    label = %skipped.label,
                    sequence = %skipped.input,
                    error = %skipped.error,
                    "Skipping candidate."
                );
                outcome.skipped.push(skipped);
            }
        }
    }
    outcome
}

/// Index of the lowest AFI; ties go to the earliest candidate.
pub fn select_best(scored: &[ScoredCandidate]) -> Option<usize> {
    scored
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.afi.cmp(&b.afi))
        .map(|(index, _)| index)
}
