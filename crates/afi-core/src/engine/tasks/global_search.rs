use crate::core::models::amino_acid::AminoAcid;
use crate::core::models::candidate::{Candidate, Provenance};
use crate::core::models::sequence::Sequence;
use crate::engine::config::GlobalSearchConfig;
use crate::engine::context::DesignContext;
use crate::engine::error::{EngineError, Stage};
use crate::engine::evaluation::{evaluate_batch, evaluate_candidate};
use crate::engine::progress::Progress;
use crate::engine::state::{SearchState, StageResult};
use crate::engine::utils::sampling::boltzmann_select;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

/// Breeding attempts allowed per requested child before a generation is cut short.
const MAX_ATTEMPTS_PER_CHILD: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    BudgetExhausted,
    Converged,
    /// No unvisited neighbour of the current population could be drawn.
    /// Unvisited sequences may remain elsewhere in the search space.
    NeighbourhoodExhausted,
}

impl StopReason {
    pub fn name(self) -> &'static str {
        match self {
            StopReason::BudgetExhausted => "budget-exhausted",
            StopReason::Converged => "converged",
            StopReason::NeighbourhoodExhausted => "neighbourhood-exhausted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlobalSearchOutcome {
    /// Includes the seed, so the selected candidate is never worse than it.
    pub result: StageResult,
    pub generations: usize,
    pub evaluations: usize,
    pub stop_reason: StopReason,
}

#[instrument(skip_all, name = "global_search_task")]
pub fn run(
    context: &DesignContext,
    seed: &Sequence,
    config: &GlobalSearchConfig,
) -> Result<GlobalSearchOutcome, EngineError> {
    config.validate()?;
    let mutable_positions = config.mutable_positions(seed.len())?;
    let alphabet = config.canonical_alphabet();

    context.reporter.report(Progress::StageStart {
        stage: Stage::GlobalSearch,
    });
    info!(
        seed = %seed,
        budget = config.evaluation_budget,
        positions_per_move = config.positions_per_move,
        random_seed = config.random_seed,
        mutable_positions = mutable_positions.len(),
        "Starting global search."
    );

    let seed_scored = evaluate_candidate(context, Candidate::new(seed.clone(), Provenance::Seed))
        .map_err(|source| EngineError::SeedEvaluation {
            stage: Stage::GlobalSearch,
            source,
        })?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.random_seed);
    let mut state = SearchState::new(seed_scored.clone(), config.population_size);
    let mut evaluated = vec![seed_scored];
    let mut skipped = Vec::new();

    let stop_reason = loop {
        if state.evaluations >= config.evaluation_budget {
            break StopReason::BudgetExhausted;
        }
        state.generation += 1;
        let batch_size = config
            .offspring_per_generation
            .min(config.evaluation_budget - state.evaluations);

        let offspring = breed(
            &mut state,
            seed,
            &mutable_positions,
            &alphabet,
            config,
            batch_size,
            &mut rng,
        )?;
        if offspring.is_empty() {
            break StopReason::NeighbourhoodExhausted;
        }
        state.evaluations += offspring.len();

        let outcome = evaluate_batch(context, offspring);
        let improved = state.absorb(&outcome.scored);
        evaluated.extend(outcome.scored);
        skipped.extend(outcome.skipped);

        if improved {
            let best = state.best();
            debug!(
                generation = state.generation,
                afi = best.afi.value(),
                sequence = %best.candidate.sequence,
                "New best sequence."
            );
            context.reporter.report(Progress::Improvement {
                generation: state.generation,
                afi: best.afi,
            });
        } else if config
            .patience
            .is_some_and(|patience| state.stale_generations >= patience)
        {
            break StopReason::Converged;
        }
    };

    let result = StageResult::new(Stage::GlobalSearch, evaluated, skipped)?;
    info!(
        best = %result.best().candidate.sequence,
        afi = result.best_afi().value(),
        generations = state.generation,
        evaluations = state.evaluations,
        reason = ?stop_reason,
        "Global search finished."
    );
    context.reporter.report(Progress::StageFinish {
        stage: Stage::GlobalSearch,
        best_afi: result.best_afi(),
    });

    Ok(GlobalSearchOutcome {
        result,
        generations: state.generation,
        evaluations: state.evaluations,
        stop_reason,
    })
}

/// Draws up to `batch_size` unvisited children. All randomness is consumed
/// here, on the calling thread, before any evaluation starts.
fn breed(
    state: &mut SearchState,
    seed: &Sequence,
    mutable_positions: &[usize],
    alphabet: &[AminoAcid],
    config: &GlobalSearchConfig,
    batch_size: usize,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<Candidate>, EngineError> {
    let scores: Vec<f64> = state.population().iter().map(|s| s.afi.value()).collect();
    let move_size = config.positions_per_move.min(mutable_positions.len());

    let mut children = Vec::with_capacity(batch_size);
    let mut attempts = 0;
    while children.len() < batch_size && attempts < batch_size * MAX_ATTEMPTS_PER_CHILD {
        attempts += 1;

        let parent_index = boltzmann_select(&scores, config.selection_temperature, rng)?;
        let parent = &state.population()[parent_index].candidate.sequence;

        let mut moves = Vec::with_capacity(move_size);
        for &position in mutable_positions.choose_multiple(rng, move_size) {
            let current = parent.residue(position);
            let options: Vec<AminoAcid> = alphabet
                .iter()
                .copied()
                .filter(|&a| Some(a) != current)
                .collect();
            if let Some(&substitute) = options.choose(rng) {
                moves.push((position, substitute));
            }
        }
        if moves.is_empty() {
            continue;
        }

        let child = parent.with_substitutions(&moves)?;
        if !state.mark_visited(&child) {
            continue;
        }

        let substitutions = seed
            .residues()
            .iter()
            .zip(child.residues())
            .enumerate()
            .filter(|(_, (s, c))| s != c)
            .map(|(position, (_, &c))| (position, c))
            .collect();
        children.push(Candidate::new(
            child,
            Provenance::GlobalSearch {
                generation: state.generation,
                index: children.len(),
                substitutions,
            },
        ));
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scoring::afi::AfiScorer;
    use crate::engine::config::ConfigError;
    use crate::engine::progress::ProgressReporter;
    use crate::testing::{TargetPredictor, test_weights};
    use std::collections::BTreeSet;

    fn config(budget: usize, seed: u64) -> GlobalSearchConfig {
        GlobalSearchConfig {
            evaluation_budget: budget,
            positions_per_move: 2,
            random_seed: seed,
            population_size: 6,
            offspring_per_generation: 12,
            selection_temperature: 0.5,
            patience: None,
            alphabet: crate::core::models::amino_acid::CANONICAL_ORDER.to_vec(),
            frozen_positions: BTreeSet::new(),
        }
    }

    fn search(
        predictor: &TargetPredictor,
        seed: &str,
        config: &GlobalSearchConfig,
    ) -> GlobalSearchOutcome {
        let scorer = AfiScorer::new(test_weights()).unwrap();
        let reporter = ProgressReporter::new();
        let context = DesignContext::new(predictor, &scorer, &reporter);
        run(&context, &Sequence::parse(seed).unwrap(), config).unwrap()
    }

    #[test]
    fn result_is_never_worse_than_the_seed() {
        let predictor = TargetPredictor::new("KRWKRWKRWK");
        let outcome = search(&predictor, "AAAAAAAAAA", &config(300, 1));
        let seed = &outcome.result.evaluated[0];
        assert_eq!(seed.candidate.provenance, Provenance::Seed);
        assert!(outcome.result.best_afi() <= seed.afi);
        assert!(outcome.result.best_afi() < seed.afi);
    }

    #[test]
    fn budget_bounds_predictor_calls() {
        let predictor = TargetPredictor::new("KRWKRWKRWK");
        let outcome = search(&predictor, "AAAAAAAAAA", &config(50, 9));
        assert_eq!(outcome.evaluations, 50);
        assert_eq!(outcome.result.attempted(), 50);
        assert_eq!(outcome.stop_reason, StopReason::BudgetExhausted);
    }

    #[test]
    fn same_seed_is_bit_reproducible() {
        let predictor = TargetPredictor::new("KRWKRWKRWK");
        let first = search(&predictor, "AAAAAAAAAA", &config(120, 42));
        let second = search(&predictor, "AAAAAAAAAA", &config(120, 42));

        let sequences = |o: &GlobalSearchOutcome| {
            o.result
                .evaluated
                .iter()
                .map(|s| (s.candidate.label(), s.candidate.sequence.to_string(), s.afi))
                .collect::<Vec<_>>()
        };
        assert_eq!(sequences(&first), sequences(&second));
        assert_eq!(first.result.best(), second.result.best());
    }

    #[test]
    fn length_is_preserved_and_sequences_are_unique() {
        let predictor = TargetPredictor::new("KRWKRWKRWK");
        let outcome = search(&predictor, "AAAAAAAAAA", &config(200, 3));
        assert!(outcome.result.evaluated.iter().all(|s| s.candidate.sequence.len() == 10));

        let unique: std::collections::HashSet<_> = outcome
            .result
            .evaluated
            .iter()
            .map(|s| s.candidate.sequence.clone())
            .collect();
        assert_eq!(unique.len(), outcome.result.evaluated.len());
    }

    #[test]
    fn moves_touch_at_most_positions_per_move_sites_of_the_parent() {
        let predictor = TargetPredictor::new("KRWKRWKRWK");
        let mut cfg = config(13, 5);
        cfg.positions_per_move = 3;
        let outcome = search(&predictor, "AAAAAAAAAA", &cfg);
        // First generation children all descend from the seed.
        for scored in &outcome.result.evaluated[1..] {
            if let Provenance::GlobalSearch {
                generation: 1,
                substitutions,
                ..
            } = &scored.candidate.provenance
            {
                assert!(!substitutions.is_empty() && substitutions.len() <= 3);
            }
        }
    }

    #[test]
    fn frozen_positions_are_never_changed() {
        let predictor = TargetPredictor::new("KRWKRWKRWK");
        let mut cfg = config(200, 8);
        cfg.frozen_positions = [0, 9].into_iter().collect();
        let outcome = search(&predictor, "AAAAAAAAAA", &cfg);
        for scored in &outcome.result.evaluated {
            let seq = &scored.candidate.sequence;
            assert_eq!(seq.residue(0), Some(AminoAcid::Alanine));
            assert_eq!(seq.residue(9), Some(AminoAcid::Alanine));
        }
    }

    #[test]
    fn search_stops_when_no_unvisited_neighbour_remains() {
        let predictor = TargetPredictor::new("KKKKKK");
        let mut cfg = config(1000, 2);
        cfg.positions_per_move = 1;
        cfg.alphabet = vec![AminoAcid::Alanine, AminoAcid::Lysine];
        cfg.frozen_positions = [0, 1, 2, 3].into_iter().collect();
        let outcome = search(&predictor, "AAAAAA", &cfg);
        // Two free binary positions give four sequences in total.
        assert_eq!(outcome.result.attempted(), 4);
        assert_eq!(outcome.stop_reason, StopReason::NeighbourhoodExhausted);
        assert_eq!(outcome.stop_reason.name(), "neighbourhood-exhausted");
        assert!(outcome.evaluations < cfg.evaluation_budget);
        assert_eq!(outcome.result.best().candidate.sequence.to_string(), "AAAAKK");
    }

    #[test]
    fn patience_stops_a_stalled_search() {
        let predictor = TargetPredictor::new("KKKKKK");
        let mut cfg = config(1000, 4);
        cfg.patience = Some(3);
        let outcome = search(&predictor, "KKKKKK", &cfg);
        assert_eq!(outcome.stop_reason, StopReason::Converged);
        assert_eq!(outcome.generations, 3);
        assert_eq!(outcome.result.best().candidate.provenance, Provenance::Seed);
    }

    #[test]
    fn frozen_position_outside_seed_is_rejected() {
        let predictor = TargetPredictor::new("KKKKKK");
        let scorer = AfiScorer::new(test_weights()).unwrap();
        let reporter = ProgressReporter::new();
        let context = DesignContext::new(&predictor, &scorer, &reporter);
        let mut cfg = config(10, 0);
        cfg.frozen_positions = [6].into_iter().collect();
        let result = run(&context, &Sequence::parse("KKKKKK").unwrap(), &cfg);
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::FrozenPositionOutOfBounds { .. }))
        ));
    }

    #[test]
    fn failing_seed_aborts_the_stage() {
        let predictor = TargetPredictor::new("KKKKKK").failing_on('P');
        let scorer = AfiScorer::new(test_weights()).unwrap();
        let reporter = ProgressReporter::new();
        let context = DesignContext::new(&predictor, &scorer, &reporter);
        let result = run(&context, &Sequence::parse("PKKKKK").unwrap(), &config(10, 0));
        assert!(matches!(result, Err(EngineError::SeedEvaluation { .. })));
    }
}
