use super::error::{EngineError, Stage};
use super::evaluation::{BatchOutcome, ScoredCandidate, SkippedCandidate, select_best};
use crate::core::models::sequence::Sequence;
use crate::core::scoring::afi::AfiScore;
use std::collections::{BTreeMap, HashSet};

/// Everything one stage evaluated, and the candidate it selected.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: Stage,
    /// Successfully scored candidates in enumeration order.
    pub evaluated: Vec<ScoredCandidate>,
    pub skipped: Vec<SkippedCandidate>,
    best_index: usize,
}

impl StageResult {
    /// Fails with [`EngineError::NoValidCandidates`] when nothing could be scored.
    pub fn new(
        stage: Stage,
        evaluated: Vec<ScoredCandidate>,
        skipped: Vec<SkippedCandidate>,
    ) -> Result<Self, EngineError> {
        let best_index = select_best(&evaluated).ok_or(EngineError::NoValidCandidates {
            stage,
            attempted: evaluated.len() + skipped.len(),
            skipped: skipped.len(),
        })?;
        Ok(Self {
            stage,
            evaluated,
            skipped,
            best_index,
        })
    }

    pub fn from_outcome(stage: Stage, outcome: BatchOutcome) -> Result<Self, EngineError> {
        Self::new(stage, outcome.scored, outcome.skipped)
    }

    pub fn best(&self) -> &ScoredCandidate {
        &self.evaluated[self.best_index]
    }

    pub fn best_afi(&self) -> AfiScore {
        self.best().afi
    }

    /// Number of candidates handed to the predictor, scored or not.
    pub fn attempted(&self) -> usize {
        self.evaluated.len() + self.skipped.len()
    }

    /// Skip counts keyed by error kind.
    pub fn skip_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for skipped in &self.skipped {
            *counts.entry(skipped.error.kind()).or_insert(0) += 1;
        }
        counts
    }
}

/// Explicit search context of the global optimizer: the incumbent, the
/// retained population and the set of sequences already spent budget on.
#[derive(Debug, Clone)]
pub struct SearchState {
    best: ScoredCandidate,
    population: Vec<ScoredCandidate>,
    capacity: usize,
    visited: HashSet<Sequence>,
    pub generation: usize,
    pub evaluations: usize,
    pub stale_generations: usize,
}

impl SearchState {
    /// Starts from an already evaluated seed, which counts as one evaluation.
    pub fn new(seed: ScoredCandidate, capacity: usize) -> Self {
        let mut visited = HashSet::new();
        visited.insert(seed.candidate.sequence.clone());
        Self {
            best: seed.clone(),
            population: vec![seed],
            capacity,
            visited,
            generation: 0,
            evaluations: 1,
            stale_generations: 0,
        }
    }

    pub fn best(&self) -> &ScoredCandidate {
        &self.best
    }

    pub fn population(&self) -> &[ScoredCandidate] {
        &self.population
    }

    /// Records `sequence` as visited; returns false if it was seen before.
    pub fn mark_visited(&mut self, sequence: &Sequence) -> bool {
        self.visited.insert(sequence.clone())
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Merges a scored generation into the population, keeping the top
    /// `capacity` members by (AFI, arrival order). Returns true when the
    /// incumbent was strictly improved.
    pub fn absorb(&mut self, offspring: &[ScoredCandidate]) -> bool {
        let mut improved = false;
        for child in offspring {
            if child.afi < self.best.afi {
                self.best = child.clone();
                improved = true;
            }
        }
        self.population.extend(offspring.iter().cloned());
        self.population.sort_by(|a, b| a.afi.cmp(&b.afi));
        self.population.truncate(self.capacity);

        if improved {
            self.stale_generations = 0;
        } else {
            self.stale_generations += 1;
        }
        improved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::candidate::{Candidate, Provenance};
    use crate::core::predictor::Prediction;

    fn scored(text: &str, index: usize, afi: f64) -> ScoredCandidate {
        ScoredCandidate {
            candidate: Candidate::new(
                Sequence::parse(text).unwrap(),
                Provenance::Input { index },
            ),
            afi: AfiScore::new(afi).unwrap(),
            prediction: Prediction::default(),
        }
    }

    #[test]
    fn stage_result_selects_minimum_with_earliest_tie() {
        let result = StageResult::new(
            Stage::Segmentation,
            vec![
                scored("KKKKKK", 0, 3.0),
                scored("KKKKKA", 1, 1.5),
                scored("KKKKAA", 2, 1.5),
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(result.best().candidate.label(), "input_1");
        assert_eq!(result.best_afi().value(), 1.5);
        assert!(result.evaluated.iter().all(|s| result.best_afi() <= s.afi));
    }

    #[test]
    fn empty_stage_is_an_error() {
        let result = StageResult::new(Stage::MutationScan, vec![], vec![]);
        assert!(matches!(
            result,
            Err(EngineError::NoValidCandidates {
                stage: Stage::MutationScan,
                attempted: 0,
                ..
            })
        ));
    }

    #[test]
    fn absorb_keeps_top_k_and_tracks_improvement() {
        let mut state = SearchState::new(scored("KKKKKK", 0, 5.0), 2);

        assert!(!state.absorb(&[scored("AKKKKK", 1, 6.0), scored("CKKKKK", 2, 7.0)]));
        assert_eq!(state.stale_generations, 1);
        let afis: Vec<_> = state.population().iter().map(|s| s.afi.value()).collect();
        assert_eq!(afis, vec![5.0, 6.0]);

        assert!(state.absorb(&[scored("DKKKKK", 3, 4.0), scored("EKKKKK", 4, 4.0)]));
        assert_eq!(state.stale_generations, 0);
        assert_eq!(state.best().candidate.label(), "input_3");
        let labels: Vec<_> = state.population().iter().map(|s| s.candidate.label()).collect();
        assert_eq!(labels, vec!["input_3", "input_4"]);
    }

    #[test]
    fn equal_score_does_not_replace_incumbent() {
        let mut state = SearchState::new(scored("KKKKKK", 0, 5.0), 4);
        assert!(!state.absorb(&[scored("AKKKKK", 1, 5.0)]));
        assert_eq!(state.best().candidate.label(), "input_0");
    }

    #[test]
    fn visited_sequences_are_tracked() {
        let mut state = SearchState::new(scored("KKKKKK", 0, 5.0), 4);
        assert!(!state.mark_visited(&Sequence::parse("KKKKKK").unwrap()));
        assert!(state.mark_visited(&Sequence::parse("AKKKKK").unwrap()));
        assert_eq!(state.visited_count(), 2);
    }
}
