use crate::core::models::candidate::{Candidate, Provenance};
use crate::core::models::sequence::Sequence;
use crate::engine::config::SegmentationConfig;
use crate::engine::context::DesignContext;
use crate::engine::error::{EngineError, Stage};
use crate::engine::evaluation::evaluate_batch;
use crate::engine::progress::Progress;
use crate::engine::state::StageResult;
use tracing::{info, instrument};

/// Every contiguous segment with length in `[min_length, max_length]`, ordered
/// by start index, then length.
pub fn enumerate(
    parent: &Sequence,
    config: &SegmentationConfig,
) -> Result<Vec<Candidate>, EngineError> {
    config.validate()?;
    config.check_sequence(parent.len())?;

    let n = parent.len();
    let max_length = config.max_length_for(n);
    let mut candidates = Vec::new();
    for start in 0..=(n - config.min_length) {
        for length in config.min_length..=max_length {
            let end = start + length;
            if end > n {
                break;
            }
            candidates.push(Candidate::new(
                parent.segment(start, end)?,
                Provenance::Segment { start, end },
            ));
        }
    }
    Ok(candidates)
}

#[instrument(skip_all, name = "segmentation_task")]
pub fn run(
    context: &DesignContext,
    parent: &Sequence,
    config: &SegmentationConfig,
) -> Result<StageResult, EngineError> {
    context.reporter.report(Progress::StageStart {
        stage: Stage::Segmentation,
    });

    let candidates = enumerate(parent, config)?;
    info!(
        parent = %parent,
        min_length = config.min_length,
        max_length = config.max_length_for(parent.len()),
        candidates = candidates.len(),
        "Enumerated segments."
    );

    let outcome = evaluate_batch(context, candidates);
    let result = StageResult::from_outcome(Stage::Segmentation, outcome)?;

    info!(
        best = %result.best().candidate.sequence,
        label = %result.best().candidate.label(),
        afi = result.best_afi().value(),
        skipped = result.skipped.len(),
        "Segmentation finished."
    );
    context.reporter.report(Progress::StageFinish {
        stage: Stage::Segmentation,
        best_afi: result.best_afi(),
    });
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scoring::afi::AfiScorer;
    use crate::engine::config::ConfigError;
    use crate::engine::progress::ProgressReporter;
    use crate::testing::{TargetPredictor, test_weights};

    const MESORICIN1: &str = "RRYCRTYWRYGRLRRRCYRRRVWIWFRL";

    fn config(min_length: usize, max_length: Option<usize>) -> SegmentationConfig {
        SegmentationConfig {
            min_length,
            max_length,
        }
    }

    #[test]
    fn full_length_window_yields_only_the_parent() {
        let parent = Sequence::parse("YCRTYWRYGRLRRRCYRRR").unwrap();
        let candidates = enumerate(&parent, &config(19, Some(19))).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].sequence, parent);
        assert_eq!(candidates[0].label(), "segment_0_19");
    }

    #[test]
    fn enumeration_orders_by_start_then_length() {
        let parent = Sequence::parse("ACDEFGHI").unwrap();
        let labels: Vec<_> = enumerate(&parent, &config(6, None))
            .unwrap()
            .iter()
            .map(Candidate::label)
            .collect();
        assert_eq!(
            labels,
            vec![
                "segment_0_6",
                "segment_0_7",
                "segment_0_8",
                "segment_1_7",
                "segment_1_8",
                "segment_2_8",
            ]
        );
    }

    #[test]
    fn fixed_length_window_contains_the_known_segment() {
        let parent = Sequence::parse(MESORICIN1).unwrap();
        let candidates = enumerate(&parent, &config(19, Some(19))).unwrap();
        assert_eq!(candidates.len(), MESORICIN1.len() - 19 + 1);
        assert!(
            candidates
                .iter()
                .any(|c| c.sequence.to_string() == "YCRTYWRYGRLRRRCYRRR")
        );
    }

    #[test]
    fn parent_shorter_than_minimum_is_a_configuration_error() {
        let parent = Sequence::parse("KRWKRWKR").unwrap();
        let result = enumerate(&parent, &config(10, None));
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::SequenceTooShort { .. }))
        ));
    }

    #[test]
    fn run_selects_lowest_afi_segment() {
        let predictor = TargetPredictor::new("YCRTYWRYGRLRRRCYRRR");
        let scorer = AfiScorer::new(test_weights()).unwrap();
        let reporter = ProgressReporter::new();
        let context = DesignContext::new(&predictor, &scorer, &reporter);
        let parent = Sequence::parse(MESORICIN1).unwrap();

        let result = run(&context, &parent, &config(19, Some(19))).unwrap();
        assert_eq!(result.stage, Stage::Segmentation);
        assert_eq!(result.attempted(), 10);
        assert_eq!(result.best().candidate.label(), "segment_2_21");
        assert_eq!(
            result.best().candidate.sequence.to_string(),
            "YCRTYWRYGRLRRRCYRRR"
        );
    }
}
