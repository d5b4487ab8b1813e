use super::progress::ProgressReporter;
use crate::core::predictor::Predictor;
use crate::core::scoring::afi::AfiScorer;

/// Shared, read-only collaborators every stage task evaluates candidates with.
#[derive(Clone, Copy)]
pub struct DesignContext<'a> {
    pub predictor: &'a dyn Predictor,
    pub scorer: &'a AfiScorer,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> DesignContext<'a> {
    pub fn new(
        predictor: &'a dyn Predictor,
        scorer: &'a AfiScorer,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            predictor,
            scorer,
            reporter,
        }
    }
}
