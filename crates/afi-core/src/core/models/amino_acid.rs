use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AminoAcid {
    Alanine,       // A
    Cysteine,      // C
    AsparticAcid,  // D
    GlutamicAcid,  // E
    Phenylalanine, // F
    Glycine,       // G
    Histidine,     // H
    Isoleucine,    // I
    Lysine,        // K
    Leucine,       // L
    Methionine,    // M
    Asparagine,    // N
    Proline,       // P
    Glutamine,     // Q
    Arginine,      // R
    Serine,        // S
    Threonine,     // T
    Valine,        // V
    Tryptophan,    // W
    Tyrosine,      // Y
}

/// The 20 proteinogenic residues in one-letter alphabetical order.
///
/// This ordering is the canonical enumeration order for substitutions and
/// matches the derived `Ord` of [`AminoAcid`].
pub const CANONICAL_ORDER: [AminoAcid; 20] = [
    AminoAcid::Alanine,
    AminoAcid::Cysteine,
    AminoAcid::AsparticAcid,
    AminoAcid::GlutamicAcid,
    AminoAcid::Phenylalanine,
    AminoAcid::Glycine,
    AminoAcid::Histidine,
    AminoAcid::Isoleucine,
    AminoAcid::Lysine,
    AminoAcid::Leucine,
    AminoAcid::Methionine,
    AminoAcid::Asparagine,
    AminoAcid::Proline,
    AminoAcid::Glutamine,
    AminoAcid::Arginine,
    AminoAcid::Serine,
    AminoAcid::Threonine,
    AminoAcid::Valine,
    AminoAcid::Tryptophan,
    AminoAcid::Tyrosine,
];

static ONE_LETTER_CODES: Map<char, AminoAcid> = phf_map! {
    'A' => AminoAcid::Alanine,
    'C' => AminoAcid::Cysteine,
    'D' => AminoAcid::AsparticAcid,
    'E' => AminoAcid::GlutamicAcid,
    'F' => AminoAcid::Phenylalanine,
    'G' => AminoAcid::Glycine,
    'H' => AminoAcid::Histidine,
    'I' => AminoAcid::Isoleucine,
    'K' => AminoAcid::Lysine,
    'L' => AminoAcid::Leucine,
    'M' => AminoAcid::Methionine,
    'N' => AminoAcid::Asparagine,
    'P' => AminoAcid::Proline,
    'Q' => AminoAcid::Glutamine,
    'R' => AminoAcid::Arginine,
    'S' => AminoAcid::Serine,
    'T' => AminoAcid::Threonine,
    'V' => AminoAcid::Valine,
    'W' => AminoAcid::Tryptophan,
    'Y' => AminoAcid::Tyrosine,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not one of the 20 proteinogenic amino-acid codes")]
pub struct UnknownResidueError(pub char);

impl AminoAcid {
    pub fn from_code(code: char) -> Option<Self> {
        ONE_LETTER_CODES
            .get(&code.to_ascii_uppercase())
            .copied()
    }

    pub fn code(self) -> char {
        match self {
            AminoAcid::Alanine => 'A',
            AminoAcid::Cysteine => 'C',
            AminoAcid::AsparticAcid => 'D',
            AminoAcid::GlutamicAcid => 'E',
            AminoAcid::Phenylalanine => 'F',
            AminoAcid::Glycine => 'G',
            AminoAcid::Histidine => 'H',
            AminoAcid::Isoleucine => 'I',
            AminoAcid::Lysine => 'K',
            AminoAcid::Leucine => 'L',
            AminoAcid::Methionine => 'M',
            AminoAcid::Asparagine => 'N',
            AminoAcid::Proline => 'P',
            AminoAcid::Glutamine => 'Q',
            AminoAcid::Arginine => 'R',
            AminoAcid::Serine => 'S',
            AminoAcid::Threonine => 'T',
            AminoAcid::Valine => 'V',
            AminoAcid::Tryptophan => 'W',
            AminoAcid::Tyrosine => 'Y',
        }
    }

    /// Zero-based index into [`CANONICAL_ORDER`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_aromatic(self) -> bool {
        matches!(
            self,
            AminoAcid::Phenylalanine | AminoAcid::Tryptophan | AminoAcid::Tyrosine
        )
    }
}

impl fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for AminoAcid {
    type Err = UnknownResidueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_code(c).ok_or(UnknownResidueError(c)),
            (Some(c), Some(_)) => Err(UnknownResidueError(c)),
            (None, _) => Err(UnknownResidueError(' ')),
        }
    }
}

/// Parses an alphabet string such as `"ACDEFGHIKLMNPQRSTVWY"` into residues,
/// preserving the given order.
pub fn parse_alphabet(text: &str) -> Result<Vec<AminoAcid>, UnknownResidueError> {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| AminoAcid::from_code(c).ok_or(UnknownResidueError(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_matches_declaration_order() {
        for (i, aa) in CANONICAL_ORDER.iter().enumerate() {
            assert_eq!(aa.index(), i);
        }
        let codes: String = CANONICAL_ORDER.iter().map(|aa| aa.code()).collect();
        assert_eq!(codes, "ACDEFGHIKLMNPQRSTVWY");
    }

    #[test]
    fn from_code_accepts_lowercase_and_rejects_unknown_symbols() {
        assert_eq!(AminoAcid::from_code('k'), Some(AminoAcid::Lysine));
        assert_eq!(AminoAcid::from_code('W'), Some(AminoAcid::Tryptophan));
        assert_eq!(AminoAcid::from_code('X'), None);
        assert_eq!(AminoAcid::from_code('B'), None);
    }

    #[test]
    fn code_round_trips_through_from_code_for_every_residue() {
        for aa in CANONICAL_ORDER {
            assert_eq!(AminoAcid::from_code(aa.code()), Some(aa));
        }
    }

    #[test]
    fn from_str_requires_exactly_one_symbol() {
        assert_eq!("R".parse::<AminoAcid>(), Ok(AminoAcid::Arginine));
        assert_eq!(" y ".parse::<AminoAcid>(), Ok(AminoAcid::Tyrosine));
        assert!("RK".parse::<AminoAcid>().is_err());
        assert!("".parse::<AminoAcid>().is_err());
    }

    #[test]
    fn parse_alphabet_ignores_separators_and_reports_bad_symbols() {
        let alphabet = parse_alphabet("K, R, W").unwrap();
        assert_eq!(
            alphabet,
            vec![AminoAcid::Lysine, AminoAcid::Arginine, AminoAcid::Tryptophan]
        );
        assert_eq!(parse_alphabet("KRZ"), Err(UnknownResidueError('Z')));
    }

    #[test]
    fn aromatic_residues_are_flagged() {
        assert!(AminoAcid::Tryptophan.is_aromatic());
        assert!(AminoAcid::Tyrosine.is_aromatic());
        assert!(!AminoAcid::Arginine.is_aromatic());
    }
}
