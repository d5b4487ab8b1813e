use super::amino_acid::AminoAcid;
use super::sequence::Sequence;
use std::fmt;

/// Records which stage and operation produced a candidate. Never affects scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Initial,
    Segment {
        start: usize,
        end: usize,
    },
    Mutation {
        position: usize,
        wild_type: AminoAcid,
        substitute: AminoAcid,
    },
    Seed,
    /// `substitutions` lists every position where the child differs from the
    /// search seed, in increasing position order.
    GlobalSearch {
        generation: usize,
        index: usize,
        substitutions: Vec<(usize, AminoAcid)>,
    },
    /// A sequence supplied directly for batch scoring.
    Input {
        index: usize,
    },
}

impl Provenance {
    /// Stable identifier used as the key of score tables.
    ///
    /// Segment bounds are zero-based and half-open; mutation positions are 1-based.
    pub fn label(&self) -> String {
        match self {
            Provenance::Initial => "initial".to_string(),
            Provenance::Segment { start, end } => format!("segment_{}_{}", start, end),
            Provenance::Mutation {
                position,
                wild_type,
                substitute,
            } => format!("mutate_{}_{}_{}", wild_type, position + 1, substitute),
            Provenance::Seed => "seed".to_string(),
            Provenance::GlobalSearch {
                generation, index, ..
            } => format!("global_{}_{}", generation, index),
            Provenance::Input { index } => format!("input_{}", index),
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub sequence: Sequence,
    pub provenance: Provenance,
}

impl Candidate {
    pub fn new(sequence: Sequence, provenance: Provenance) -> Self {
        Self {
            sequence,
            provenance,
        }
    }

    pub fn label(&self) -> String {
        self.provenance.label()
    }
}
