use crate::core::models::candidate::Provenance;
use crate::core::scoring::afi::AfiScore;
use crate::engine::config::GlobalSearchConfig;
use crate::engine::evaluation::{ScoredCandidate, SkippedCandidate};
use crate::engine::state::StageResult;
use crate::engine::tasks::mutation_scan::MutationMatrix;
use crate::workflows::design::DesignReport;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const SEGMENTATION_TABLE: &str = "segmentation.csv";
pub const SEGMENTATION_HEATMAP: &str = "segmentation_heatmap.csv";
pub const MUTATION_TABLE: &str = "mutation_scan.csv";
pub const MUTATION_MATRIX: &str = "mutation_matrix.csv";
pub const GLOBAL_SEARCH_TABLE: &str = "global_search.csv";
pub const SKIPPED_TABLE: &str = "skipped.csv";
pub const SUMMARY_FILE: &str = "summary.toml";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),
    #[error("Write error: {0}")]
    Write(#[from] std::io::Error),
}

/// Scored candidates with per-species MIC and per-assay toxicity columns.
///
/// Columns: `label,sequence,afi,relative_decrease_pct,mic:<species>...,tox:<assay>...`.
/// The relative decrease is measured against `reference` and the column is
/// left out when there is none.
pub fn write_scored_table<W: Write>(
    scored: &[ScoredCandidate],
    reference: Option<AfiScore>,
    writer: W,
) -> Result<(), ReportError> {
    let species: BTreeSet<&str> = scored
        .iter()
        .flat_map(|s| s.prediction.mic.iter().map(|(id, _)| id))
        .collect();
    let assays: BTreeSet<&str> = scored
        .iter()
        .flat_map(|s| s.prediction.toxicity.iter().map(|(id, _)| id))
        .collect();

    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec!["label".to_string(), "sequence".to_string(), "afi".to_string()];
    if reference.is_some() {
        header.push("relative_decrease_pct".to_string());
    }
    header.extend(species.iter().map(|s| format!("mic:{}", s)));
    header.extend(assays.iter().map(|a| format!("tox:{}", a)));
    csv.write_record(&header)?;

    let optional = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    for row in scored {
        let mut record = vec![
            row.candidate.label(),
            row.candidate.sequence.to_string(),
            row.afi.value().to_string(),
        ];
        if let Some(reference) = reference {
            record.push(row.afi.relative_decrease(reference).to_string());
        }
        record.extend(species.iter().map(|s| optional(row.prediction.mic.get(s))));
        record.extend(assays.iter().map(|a| optional(row.prediction.toxicity.get(a))));
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct HeatmapRow {
    start: usize,
    end: usize,
    length: usize,
    afi: f64,
    relative_decrease_pct: f64,
}

/// Segment bounds (zero-based, half-open) against AFI, for start/length heat maps.
pub fn write_segmentation_heatmap<W: Write>(
    result: &StageResult,
    reference: AfiScore,
    writer: W,
) -> Result<(), ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for scored in &result.evaluated {
        if let Provenance::Segment { start, end } = scored.candidate.provenance {
            csv.serialize(HeatmapRow {
                start,
                end,
                length: end - start,
                afi: scored.afi.value(),
                relative_decrease_pct: scored.afi.relative_decrease(reference),
            })?;
        }
    }
    csv.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct MatrixRow {
    position: usize,
    wild_type: char,
    substitute: char,
    afi: Option<f64>,
    relative_decrease_pct: Option<f64>,
}

/// Long-format mutation matrix with 1-based positions; unevaluated cells are empty.
pub fn write_mutation_matrix<W: Write>(
    matrix: &MutationMatrix,
    reference: AfiScore,
    writer: W,
) -> Result<(), ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for (position, wild_type, substitute, afi) in matrix.iter() {
        csv.serialize(MatrixRow {
            position: position + 1,
            wild_type: wild_type.code(),
            substitute: substitute.code(),
            afi: afi.map(AfiScore::value),
            relative_decrease_pct: afi.map(|a| a.relative_decrease(reference)),
        })?;
    }
    csv.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct SkippedRow<'a> {
    stage: &'a str,
    label: &'a str,
    input: &'a str,
    kind: &'a str,
    error: String,
}

pub fn write_skipped_table<'a, W: Write>(
    skipped: impl IntoIterator<Item = (&'a str, &'a SkippedCandidate)>,
    writer: W,
) -> Result<(), ReportError> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(["stage", "label", "input", "kind", "error"])?;
    for (stage, s) in skipped {
        csv.serialize(SkippedRow {
            stage,
            label: &s.label,
            input: &s.input,
            kind: s.error.kind(),
            error: s.error.to_string(),
        })?;
    }
    csv.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantSummary {
    pub name: String,
    pub sequence: String,
    pub length: usize,
    pub afi: f64,
    /// Relative to the initial sequence.
    pub relative_decrease_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage: String,
    pub attempted: usize,
    pub scored: usize,
    pub skipped: usize,
    pub best_label: String,
    pub best_afi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSummary {
    pub random_seed: u64,
    pub evaluation_budget: usize,
    pub evaluations: usize,
    pub generations: usize,
    pub stop_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub weights_version: String,
    /// Absent when the predictor carries no version.
    pub model_version: Option<String>,
    pub variants: Vec<VariantSummary>,
    pub stages: Vec<StageSummary>,
    pub search: SearchSummary,
    /// Skip counts per stage, then per error kind.
    pub skipped: BTreeMap<String, BTreeMap<String, usize>>,
}

impl RunSummary {
    pub fn from_report(report: &DesignReport, search: &GlobalSearchConfig) -> Self {
        let reference = report.initial.afi;
        let variants = report
            .variants()
            .iter()
            .map(|v| VariantSummary {
                name: v.name.to_string(),
                sequence: v.sequence.to_string(),
                length: v.sequence.len(),
                afi: v.afi.value(),
                relative_decrease_pct: v.afi.relative_decrease(reference),
            })
            .collect();

        let stages = [
            &report.segmentation,
            &report.mutation_scan.result,
            &report.global_search.result,
        ]
        .iter()
        .map(|r| StageSummary {
            stage: r.stage.to_string(),
            attempted: r.attempted(),
            scored: r.evaluated.len(),
            skipped: r.skipped.len(),
            best_label: r.best().candidate.label(),
            best_afi: r.best_afi().value(),
        })
        .collect();

        let skipped = report
            .diagnostics
            .skipped
            .iter()
            .map(|(stage, kinds)| {
                (
                    stage.to_string(),
                    kinds.iter().map(|(k, &n)| (k.to_string(), n)).collect(),
                )
            })
            .collect();

        Self {
            weights_version: report.weights_version.clone(),
            model_version: report.model_version.clone(),
            variants,
            stages,
            search: SearchSummary {
                random_seed: search.random_seed,
                evaluation_budget: search.evaluation_budget,
                evaluations: report.global_search.evaluations,
                generations: report.global_search.generations,
                stop_reason: report.global_search.stop_reason.name().to_string(),
            },
            skipped,
        }
    }

    pub fn to_toml(&self) -> Result<String, ReportError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, ReportError> {
    let file = File::create(path).map_err(|e| ReportError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

/// Writes every table of a design run plus `summary.toml` into `dir`,
/// creating it if needed. Returns the written paths.
pub fn write_design_report(
    report: &DesignReport,
    search: &GlobalSearchConfig,
    dir: &Path,
) -> Result<Vec<PathBuf>, ReportError> {
    std::fs::create_dir_all(dir).map_err(|e| ReportError::Io {
        path: dir.to_string_lossy().to_string(),
        source: e,
    })?;
    let reference = report.initial.afi;
    let mut written = Vec::new();

    let path = dir.join(SEGMENTATION_TABLE);
    write_scored_table(&report.segmentation.evaluated, Some(reference), create(&path)?)?;
    written.push(path);

    let path = dir.join(SEGMENTATION_HEATMAP);
    write_segmentation_heatmap(&report.segmentation, reference, create(&path)?)?;
    written.push(path);

    // Mutants are compared against their own parent, the segmentation winner.
    let segmented = report.segmentation.best_afi();
    let path = dir.join(MUTATION_TABLE);
    write_scored_table(
        &report.mutation_scan.result.evaluated,
        Some(segmented),
        create(&path)?,
    )?;
    written.push(path);

    let path = dir.join(MUTATION_MATRIX);
    write_mutation_matrix(&report.mutation_scan.matrix, segmented, create(&path)?)?;
    written.push(path);

    let mutated = report.mutation_scan.result.best_afi();
    let path = dir.join(GLOBAL_SEARCH_TABLE);
    write_scored_table(
        &report.global_search.result.evaluated,
        Some(mutated),
        create(&path)?,
    )?;
    written.push(path);

    let skipped: Vec<(&str, &SkippedCandidate)> = [
        &report.segmentation,
        &report.mutation_scan.result,
        &report.global_search.result,
    ]
    .into_iter()
    .flat_map(|r| r.skipped.iter().map(move |s| (r.stage.name(), s)))
    .collect();
    if !skipped.is_empty() {
        let path = dir.join(SKIPPED_TABLE);
        write_skipped_table(skipped, create(&path)?)?;
        written.push(path);
    }

    let path = dir.join(SUMMARY_FILE);
    let mut summary_file = create(&path)?;
    summary_file.write_all(RunSummary::from_report(report, search).to_toml()?.as_bytes())?;
    summary_file.flush()?;
    written.push(path);

    info!(dir = %dir.display(), files = written.len(), "Design report written.");
    Ok(written)
}
