use crate::core::models::amino_acid::AminoAcid;
use crate::core::models::candidate::{Candidate, Provenance};
use crate::core::models::sequence::Sequence;
use crate::core::scoring::afi::AfiScore;
use crate::engine::config::MutationConfig;
use crate::engine::context::DesignContext;
use crate::engine::error::{EngineError, Stage};
use crate::engine::evaluation::evaluate_batch;
use crate::engine::progress::Progress;
use crate::engine::state::StageResult;
use tracing::{info, instrument};

/// AFI of every single-point substitution, indexed by position and
/// substitute. Cells that were not evaluated, or whose candidate was skipped,
/// are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationMatrix {
    wild_type: Vec<AminoAcid>,
    alphabet: Vec<AminoAcid>,
    cells: Vec<Option<AfiScore>>,
}

impl MutationMatrix {
    fn new(parent: &Sequence, alphabet: Vec<AminoAcid>) -> Self {
        Self {
            wild_type: parent.residues().to_vec(),
            cells: vec![None; parent.len() * alphabet.len()],
            alphabet,
        }
    }

    fn set(&mut self, position: usize, substitute: AminoAcid, afi: AfiScore) {
        if let Some(column) = self.column(substitute) {
            let width = self.alphabet.len();
            if let Some(cell) = self.cells.get_mut(position * width + column) {
                *cell = Some(afi);
            }
        }
    }

    fn column(&self, residue: AminoAcid) -> Option<usize> {
        self.alphabet.binary_search(&residue).ok()
    }

    pub fn positions(&self) -> usize {
        self.wild_type.len()
    }

    /// Substitution alphabet in canonical order; the matrix columns.
    pub fn alphabet(&self) -> &[AminoAcid] {
        &self.alphabet
    }

    pub fn wild_type(&self, position: usize) -> Option<AminoAcid> {
        self.wild_type.get(position).copied()
    }

    pub fn get(&self, position: usize, substitute: AminoAcid) -> Option<AfiScore> {
        if position >= self.positions() {
            return None;
        }
        let column = self.column(substitute)?;
        self.cells[position * self.alphabet.len() + column]
    }

    /// Row-major view: `(position, wild type, substitute, AFI)`.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (usize, AminoAcid, AminoAcid, Option<AfiScore>)> + '_ {
        let width = self.alphabet.len();
        self.cells.iter().enumerate().map(move |(i, &afi)| {
            let position = i / width;
            (position, self.wild_type[position], self.alphabet[i % width], afi)
        })
    }
}

#[derive(Debug, Clone)]
pub struct MutationScan {
    pub result: StageResult,
    pub matrix: MutationMatrix,
}

/// Single-point substitutions ordered by position, then canonical residue order.
pub fn enumerate(
    parent: &Sequence,
    config: &MutationConfig,
) -> Result<Vec<Candidate>, EngineError> {
    config.validate()?;
    let alphabet = config.canonical_alphabet();

    let mut candidates = Vec::with_capacity(parent.len() * alphabet.len());
    for (position, &wild_type) in parent.residues().iter().enumerate() {
        for &substitute in &alphabet {
            if config.exclude_wild_type && substitute == wild_type {
                continue;
            }
            candidates.push(Candidate::new(
                parent.with_substitution(position, substitute)?,
                Provenance::Mutation {
                    position,
                    wild_type,
                    substitute,
                },
            ));
        }
    }
    Ok(candidates)
}

#[instrument(skip_all, name = "mutation_scan_task")]
pub fn run(
    context: &DesignContext,
    parent: &Sequence,
    config: &MutationConfig,
) -> Result<MutationScan, EngineError> {
    context.reporter.report(Progress::StageStart {
        stage: Stage::MutationScan,
    });

    let candidates = enumerate(parent, config)?;
    info!(
        parent = %parent,
        alphabet_size = config.alphabet.len(),
        candidates = candidates.len(),
        "Enumerated single-point mutants."
    );

    let outcome = evaluate_batch(context, candidates);

    let mut matrix = MutationMatrix::new(parent, config.canonical_alphabet());
    for scored in &outcome.scored {
        if let Provenance::Mutation {
            position,
            substitute,
            ..
        } = scored.candidate.provenance
        {
            matrix.set(position, substitute, scored.afi);
        }
    }

    let result = StageResult::from_outcome(Stage::MutationScan, outcome)?;
    info!(
        best = %result.best().candidate.sequence,
        label = %result.best().candidate.label(),
        afi = result.best_afi().value(),
        skipped = result.skipped.len(),
        "Mutation scan finished."
    );
    context.reporter.report(Progress::StageFinish {
        stage: Stage::MutationScan,
        best_afi: result.best_afi(),
    });
    Ok(MutationScan { result, matrix })
}
