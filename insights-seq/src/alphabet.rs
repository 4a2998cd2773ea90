//! Nucleotide alphabet accepted by the loader.
//!
//! Sequences are stored uppercase, so every check here assumes the byte has
//! already been uppercased.

/// Unambiguous DNA bases plus `N` for unknown positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DnaAlphabet;

impl DnaAlphabet {
    /// Human-readable name used in error messages.
    pub const NAME: &'static str = "DNA";

    /// The set of valid uppercase bytes.
    pub const VALID_BYTES: &'static [u8] = b"ACGTN";

    /// The four concrete bases, in the lexicographic order used for k-mer
    /// profile indexing.
    pub const BASES: &'static [u8] = b"ACGT";

    /// Check whether a byte (assumed already uppercased) is valid.
    pub fn is_valid(b: u8) -> bool {
        Self::VALID_BYTES.contains(&b)
    }

    /// Watson-Crick complement. `N` maps to itself.
    pub fn complement(b: u8) -> u8 {
        match b {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            other => other,
        }
    }

    /// Index of a concrete base within [`Self::BASES`].
    pub fn base_index(b: u8) -> Option<usize> {
        match b {
            b'A' => Some(0),
            b'C' => Some(1),
            b'G' => Some(2),
            b'T' => Some(3),
            _ => None,
        }
    }
}
