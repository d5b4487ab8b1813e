use super::amino_acid::AminoAcid;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("Sequence is empty")]
    Empty,
    #[error("Unrecognized residue '{symbol}' at position {position}")]
    InvalidResidue { symbol: char, position: usize },
    #[error("Range [{start}, {end}) is invalid for a sequence of length {length}")]
    InvalidRange {
        start: usize,
        end: usize,
        length: usize,
    },
    #[error("Position {position} is out of bounds for a sequence of length {length}")]
    PositionOutOfBounds { position: usize, length: usize },
}

/// An immutable, non-empty peptide over the 20-residue alphabet.
///
/// Residues are shared behind an `Arc`, so clones are cheap; every edit
/// returns a new `Sequence`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sequence {
    residues: Arc<[AminoAcid]>,
}

impl Sequence {
    pub fn new(residues: Vec<AminoAcid>) -> Result<Self, SequenceError> {
        if residues.is_empty() {
            return Err(SequenceError::Empty);
        }
        Ok(Self {
            residues: residues.into(),
        })
    }

    /// Parses one-letter codes. Surrounding whitespace is ignored and codes are
    /// case-insensitive; any other symbol is rejected with its position.
    pub fn parse(text: &str) -> Result<Self, SequenceError> {
        let residues = text
            .trim()
            .chars()
            .enumerate()
            .map(|(position, symbol)| {
                AminoAcid::from_code(symbol)
                    .ok_or(SequenceError::InvalidResidue { symbol, position })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(residues)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    /// Always false; kept for API symmetry with slices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    #[inline]
    pub fn residues(&self) -> &[AminoAcid] {
        &self.residues
    }

    pub fn residue(&self, position: usize) -> Option<AminoAcid> {
        self.residues.get(position).copied()
    }

    /// Contiguous sub-sequence covering the half-open range `[start, end)`.
    pub fn segment(&self, start: usize, end: usize) -> Result<Self, SequenceError> {
        if start >= end || end > self.len() {
            return Err(SequenceError::InvalidRange {
                start,
                end,
                length: self.len(),
            });
        }
        Self::new(self.residues[start..end].to_vec())
    }

    pub fn with_substitution(
        &self,
        position: usize,
        residue: AminoAcid,
    ) -> Result<Self, SequenceError> {
        self.with_substitutions(&[(position, residue)])
    }

    pub fn with_substitutions(
        &self,
        substitutions: &[(usize, AminoAcid)],
    ) -> Result<Self, SequenceError> {
        let mut residues = self.residues.to_vec();
        for &(position, residue) in substitutions {
            let slot = residues
                .get_mut(position)
                .ok_or(SequenceError::PositionOutOfBounds {
                    position,
                    length: self.len(),
                })?;
            *slot = residue;
        }
        Self::new(residues)
    }

    /// Number of positions at which two equal-length sequences differ.
    /// Returns `None` when the lengths differ.
    pub fn hamming_distance(&self, other: &Sequence) -> Option<usize> {
        if self.len() != other.len() {
            return None;
        }
        Some(
            self.residues
                .iter()
                .zip(other.residues.iter())
                .filter(|(a, b)| a != b)
                .count(),
        )
    }

    pub fn count(&self, residue: AminoAcid) -> usize {
        self.residues.iter().filter(|&&r| r == residue).count()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for residue in self.residues.iter() {
            write!(f, "{}", residue.code())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence({})", self)
    }
}

impl FromStr for Sequence {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Sequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
