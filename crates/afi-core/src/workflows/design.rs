use crate::core::models::candidate::{Candidate, Provenance};
use crate::core::models::sequence::Sequence;
use crate::core::predictor::Predictor;
use crate::core::scoring::afi::{AfiScore, AfiScorer};
use crate::engine::config::{ConfigError, DesignConfig, check_predictor_outputs};
use crate::engine::context::DesignContext;
use crate::engine::error::{EngineError, Stage};
use crate::engine::evaluation::{ScoredCandidate, evaluate_candidate};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::StageResult;
use crate::engine::tasks::global_search::{self, GlobalSearchOutcome};
use crate::engine::tasks::mutation_scan::{self, MutationScan};
use crate::engine::tasks::segmentation;
use crate::engine::utils::pool::run_with_workers;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: EngineError,
    },
}

impl PipelineError {
    fn stage(stage: Stage) -> impl FnOnce(EngineError) -> Self {
        move |source| match source {
            EngineError::Config(e) if stage == Stage::Initial => PipelineError::Configuration(e),
            source => PipelineError::StageFailed { stage, source },
        }
    }
}

/// One of the four named outputs of a design run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub name: &'static str,
    pub sequence: Sequence,
    pub afi: AfiScore,
}

/// Skipped-candidate counts per stage and error kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub skipped: BTreeMap<Stage, BTreeMap<&'static str, usize>>,
}

impl Diagnostics {
    fn record(&mut self, result: &StageResult) {
        let counts = result.skip_counts();
        if !counts.is_empty() {
            self.skipped.insert(result.stage, counts);
        }
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped.values().flat_map(|kinds| kinds.values()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct DesignReport {
    pub initial: ScoredCandidate,
    pub segmentation: StageResult,
    pub mutation_scan: MutationScan,
    pub global_search: GlobalSearchOutcome,
    pub diagnostics: Diagnostics,
    pub weights_version: String,
    pub model_version: Option<String>,
}

impl DesignReport {
    /// Initial, segmented, mutated and globally optimised variants, in pipeline order.
    pub fn variants(&self) -> [Variant; 4] {
        let variant = |name, scored: &ScoredCandidate| Variant {
            name,
            sequence: scored.candidate.sequence.clone(),
            afi: scored.afi,
        };
        [
            variant("initial", &self.initial),
            variant("segmented", self.segmentation.best()),
            variant("mutated", self.mutation_scan.result.best()),
            variant("optimized", self.global_search.result.best()),
        ]
    }

    pub fn optimized(&self) -> &ScoredCandidate {
        self.global_search.result.best()
    }
}

fn prepare(config: &DesignConfig, predictor: &dyn Predictor) -> Result<AfiScorer, PipelineError> {
    config.validate()?;
    check_predictor_outputs(&config.scoring, predictor)?;
    AfiScorer::new(config.scoring.clone())
        .map_err(|e| PipelineError::Configuration(ConfigError::Weights(e)))
}

/// Runs segmentation, mutation scan and global search, each seeded with the
/// previous stage's winner. Fails fast on the first stage failure.
#[instrument(skip_all, name = "design_workflow")]
pub fn run(
    initial: &Sequence,
    config: &DesignConfig,
    predictor: &dyn Predictor,
    reporter: &ProgressReporter,
) -> Result<DesignReport, PipelineError> {
    let scorer = prepare(config, predictor)?;
    config.segmentation.check_sequence(initial.len())?;

    info!(
        initial = %initial,
        length = initial.len(),
        weights = %config.scoring.version,
        model = predictor.model_version().unwrap_or("unversioned"),
        "Starting design pipeline."
    );

    let run_stages = || -> Result<DesignReport, PipelineError> {
        let context = DesignContext::new(predictor, &scorer, reporter);

        // === Stage 0: Score the starting peptide ===
        reporter.report(Progress::StageStart {
            stage: Stage::Initial,
        });
        let initial_scored =
            evaluate_candidate(&context, Candidate::new(initial.clone(), Provenance::Initial))
                .map_err(|source| PipelineError::StageFailed {
                    stage: Stage::Initial,
                    source: EngineError::SeedEvaluation {
                        stage: Stage::Initial,
                        source,
                    },
                })?;
        info!(afi = initial_scored.afi.value(), "Initial sequence scored.");
        reporter.report(Progress::StageFinish {
            stage: Stage::Initial,
            best_afi: initial_scored.afi,
        });

        // === Stage 1: Segmentation ===
        let segmentation = segmentation::run(&context, initial, &config.segmentation)
            .map_err(PipelineError::stage(Stage::Segmentation))?;
        let segmented = segmentation.best().candidate.sequence.clone();

        // === Stage 2: Single-point mutation scan ===
        let mutation_scan = mutation_scan::run(&context, &segmented, &config.mutation)
            .map_err(PipelineError::stage(Stage::MutationScan))?;
        let mutated = mutation_scan.result.best().candidate.sequence.clone();

        // === Stage 3: Global search ===
        let global_search = global_search::run(&context, &mutated, &config.global_search)
            .map_err(PipelineError::stage(Stage::GlobalSearch))?;

        let mut diagnostics = Diagnostics::default();
        diagnostics.record(&segmentation);
        diagnostics.record(&mutation_scan.result);
        diagnostics.record(&global_search.result);

        Ok(DesignReport {
            initial: initial_scored,
            segmentation,
            mutation_scan,
            global_search,
            diagnostics,
            weights_version: config.scoring.version.clone(),
            model_version: predictor.model_version().map(str::to_string),
        })
    };

    let report = run_with_workers(config.max_workers, run_stages)
        .map_err(PipelineError::stage(Stage::Initial))??;

    for variant in report.variants() {
        info!(
            variant = variant.name,
            sequence = %variant.sequence,
            afi = variant.afi.value(),
            "Design variant."
        );
    }
    if report.diagnostics.total_skipped() > 0 {
        info!(
            skipped = report.diagnostics.total_skipped(),
            "Some candidates were skipped; see diagnostics."
        );
    }
    Ok(report)
}

/// Runs segmentation alone on `parent`.
pub fn run_segmentation(
    parent: &Sequence,
    config: &DesignConfig,
    predictor: &dyn Predictor,
    reporter: &ProgressReporter,
) -> Result<StageResult, PipelineError> {
    let scorer = prepare(config, predictor)?;
    config.segmentation.check_sequence(parent.len())?;
    run_with_workers(config.max_workers, || {
        segmentation::run(
            &DesignContext::new(predictor, &scorer, reporter),
            parent,
            &config.segmentation,
        )
    })
    .and_then(|r| r)
    .map_err(PipelineError::stage(Stage::Segmentation))
}

/// Runs the single-point mutation scan alone on `parent`.
pub fn run_mutation_scan(
    parent: &Sequence,
    config: &DesignConfig,
    predictor: &dyn Predictor,
    reporter: &ProgressReporter,
) -> Result<MutationScan, PipelineError> {
    let scorer = prepare(config, predictor)?;
    run_with_workers(config.max_workers, || {
        mutation_scan::run(
            &DesignContext::new(predictor, &scorer, reporter),
            parent,
            &config.mutation,
        )
    })
    .and_then(|r| r)
    .map_err(PipelineError::stage(Stage::MutationScan))
}

/// Runs the global search alone, seeded with `seed`.
pub fn run_global_search(
    seed: &Sequence,
    config: &DesignConfig,
    predictor: &dyn Predictor,
    reporter: &ProgressReporter,
) -> Result<GlobalSearchOutcome, PipelineError> {
    let scorer = prepare(config, predictor)?;
    config.global_search.mutable_positions(seed.len())?;
    run_with_workers(config.max_workers, || {
        global_search::run(
            &DesignContext::new(predictor, &scorer, reporter),
            seed,
            &config.global_search,
        )
    })
    .and_then(|r| r)
    .map_err(PipelineError::stage(Stage::GlobalSearch))
}
