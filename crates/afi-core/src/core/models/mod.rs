//! # Core Models Module
//!
//! Value types shared by every stage of the design pipeline.
//!
//! - [`amino_acid`] - The 20-residue alphabet and its canonical ordering
//! - [`sequence`] - Immutable peptide sequences and the edits that derive new ones
//! - [`candidate`] - A sequence paired with the provenance of the operation that produced it
//!
//! ```ignore
//! use afidesign::core::models::{amino_acid::AminoAcid, sequence::Sequence};
//!
//! let parent = Sequence::parse("YCRTYWRYGRLRRRCYRRR")?;
//! let child = parent.with_substitution(11, AminoAcid::Lysine)?;
//! assert_eq!(child.to_string(), "YCRTYWRYGRLKRRCYRRR");
//! ```

pub mod amino_acid;
pub mod candidate;
pub mod sequence;
