//! Composition metrics and strand operations on DNA.
//!
//! - [`gc_content`] / [`at_content`]: percentage of G+C or A+T bases
//! - [`BaseCounts`]: per-base tallies
//! - [`DnaSequence::reverse_complement`]: opposite strand, read 5' to 3'

use insights_core::{InsightsError, Result, Summarizable};

use crate::alphabet::DnaAlphabet;
use crate::kmer::{self, KmerCounts, KmerIter};
use crate::seq::DnaSequence;

/// Per-base counts of a sequence. Lowercase bytes count as their uppercase
/// base; anything outside `ACGT` lands in `other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseCounts {
    pub a: usize,
    pub c: usize,
    pub g: usize,
    pub t: usize,
    pub other: usize,
}

impl BaseCounts {
    /// Tally every byte of `seq`.
    pub fn from_bytes(seq: &[u8]) -> Self {
        let mut counts = Self::default();
        for &b in seq {
            match b.to_ascii_uppercase() {
                b'A' => counts.a += 1,
                b'C' => counts.c += 1,
                b'G' => counts.g += 1,
                b'T' => counts.t += 1,
                _ => counts.other += 1,
            }
        }
        counts
    }

    /// Total number of bytes counted.
    pub fn total(&self) -> usize {
        self.a + self.c + self.g + self.t + self.other
    }

    pub fn gc(&self) -> usize {
        self.g + self.c
    }

    pub fn at(&self) -> usize {
        self.a + self.t
    }
}

impl Summarizable for BaseCounts {
    fn summary(&self) -> String {
        format!(
            "A={} C={} G={} T={} other={}",
            self.a, self.c, self.g, self.t, self.other
        )
    }
}

/// GC content of `seq` as a percentage in `[0, 100]`.
///
/// `N` and other non-GC bytes count toward the length. An empty sequence is
/// an error rather than 0%.
pub fn gc_content(seq: &[u8]) -> Result<f64> {
    percent_of(seq, BaseCounts::gc, "GC")
}

/// AT content of `seq` as a percentage in `[0, 100]`. Errors on empty input.
pub fn at_content(seq: &[u8]) -> Result<f64> {
    percent_of(seq, BaseCounts::at, "AT")
}

fn percent_of(seq: &[u8], part: fn(&BaseCounts) -> usize, what: &str) -> Result<f64> {
    if seq.is_empty() {
        return Err(InsightsError::InvalidInput(format!(
            "cannot compute {} content of an empty sequence",
            what
        )));
    }
    let counts = BaseCounts::from_bytes(seq);
    Ok(part(&counts) as f64 / seq.len() as f64 * 100.0)
}

impl DnaSequence {
    /// Return the reverse complement.
    pub fn reverse_complement(&self) -> DnaSequence {
        let rc: Vec<u8> = self.iter().rev().map(|&b| DnaAlphabet::complement(b)).collect();
        DnaSequence::from_validated(rc)
    }

    /// GC content as a percentage. See [`gc_content`].
    pub fn gc_content(&self) -> Result<f64> {
        gc_content(self)
    }

    /// AT content as a percentage. See [`at_content`].
    pub fn at_content(&self) -> Result<f64> {
        at_content(self)
    }

    pub fn base_counts(&self) -> BaseCounts {
        BaseCounts::from_bytes(self)
    }

    /// Iterate over k-mers of length `k`.
    pub fn kmers(&self, k: usize) -> Result<KmerIter<'_>> {
        KmerIter::new(self, k)
    }

    /// Count every k-mer of length `k`. See [`kmer::kmer_frequencies`].
    pub fn kmer_frequencies(&self, k: usize) -> Result<KmerCounts> {
        kmer::kmer_frequencies(self, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gc_content_basic() {
        assert_eq!(gc_content(b"ATGC").unwrap(), 50.0);
        assert_eq!(gc_content(b"GGCC").unwrap(), 100.0);
        assert_eq!(gc_content(b"AATT").unwrap(), 0.0);
    }

    #[test]
    fn gc_content_lowercase_counts() {
        assert_eq!(gc_content(b"gcat").unwrap(), 50.0);
    }

    #[test]
    fn gc_content_n_counts_toward_length() {
        assert_eq!(gc_content(b"GCNN").unwrap(), 50.0);
    }

    #[test]
    fn gc_content_empty_is_error() {
        let err = gc_content(b"").unwrap_err();
        assert!(matches!(err, InsightsError::InvalidInput(_)));
    }

    #[test]
    fn at_content_complements_gc_without_n() {
        let seq = b"ATGCGGTA";
        let gc = gc_content(seq).unwrap();
        let at = at_content(seq).unwrap();
        assert!((gc + at - 100.0).abs() < 1e-12);
    }

    #[test]
    fn reverse_complement_basic() {
        let seq = DnaSequence::new(b"ATGCN").unwrap();
        assert_eq!(seq.reverse_complement().as_str(), "NGCAT");
    }

    #[test]
    fn base_counts_tally() {
        let c = BaseCounts::from_bytes(b"AACGTNx");
        assert_eq!((c.a, c.c, c.g, c.t, c.other), (2, 1, 1, 1, 2));
        assert_eq!(c.total(), 7);
        assert_eq!(c.summary(), "A=2 C=1 G=1 T=1 other=2");
    }

    #[test]
    fn sequence_methods_delegate() {
        let seq = DnaSequence::new(b"GGGG").unwrap();
        assert_eq!(seq.gc_content().unwrap(), 100.0);
        assert_eq!(seq.at_content().unwrap(), 0.0);
        assert_eq!(seq.kmers(2).unwrap().count(), 3);
        assert_eq!(seq.kmer_frequencies(2).unwrap().get(b"GG"), 3);
    }
}
