//! Literal motif search.
//!
//! A naive left-to-right scan that reports every start offset, overlapping
//! occurrences included. Both pattern and text are compared uppercase.

use insights_core::Summarizable;
use tracing::debug;

use crate::fasta::SequenceSet;

/// One occurrence of a motif within a named sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotifHit {
    pub seq_id: String,
    /// 0-based start offset.
    pub start: usize,
    /// The matched text as it appears in the sequence.
    pub matched: String,
}

impl Summarizable for MotifHit {
    fn summary(&self) -> String {
        format!("{}:{} {}", self.seq_id, self.start, self.matched)
    }
}

/// Start offsets of every occurrence of `pattern` in `seq`, in increasing
/// order. Matching is case-insensitive and includes overlaps.
///
/// An empty pattern, a pattern longer than the sequence, or no match all
/// give an empty vector.
pub fn find_motif(seq: &[u8], pattern: &[u8]) -> Vec<usize> {
    let m = pattern.len();
    if m == 0 || m > seq.len() {
        return vec![];
    }
    seq.windows(m)
        .enumerate()
        .filter(|(_, window)| window.eq_ignore_ascii_case(pattern))
        .map(|(i, _)| i)
        .collect()
}

/// Run [`find_motif`] over every record of `set`, in file order.
pub fn scan_motif(set: &SequenceSet, pattern: &[u8]) -> Vec<MotifHit> {
    let m = pattern.len();
    let mut hits = Vec::new();
    for record in set {
        let starts = find_motif(&record.seq, pattern);
        debug!(
            id = %record.id,
            motif = %String::from_utf8_lossy(pattern),
            occurrences = starts.len(),
            "scanned record for motif"
        );
        hits.extend(starts.into_iter().map(|start| MotifHit {
            seq_id: record.id.clone(),
            start,
            matched: String::from_utf8_lossy(&record.seq[start..start + m]).into_owned(),
        }));
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::parse_fasta_str;

    #[test]
    fn overlapping_matches() {
        assert_eq!(find_motif(b"ATATAT", b"ATA"), vec![0, 2]);
    }

    #[test]
    fn non_overlapping_repeat() {
        assert_eq!(find_motif(b"ATAGCATAGC", b"ATAGC"), vec![0, 5]);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(find_motif(b"aaGcTT", b"gct"), vec![2]);
        assert_eq!(find_motif(b"ACGT", b"acgt"), vec![0]);
    }

    #[test]
    fn homopolymer_run() {
        assert_eq!(find_motif(b"AAAA", b"AA"), vec![0, 1, 2]);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(find_motif(b"ACGT", b"TTT").is_empty());
    }

    #[test]
    fn empty_or_long_pattern_is_empty() {
        assert!(find_motif(b"ACGT", b"").is_empty());
        assert!(find_motif(b"AC", b"ACG").is_empty());
        assert!(find_motif(b"", b"A").is_empty());
    }

    #[test]
    fn scan_reports_hits_per_record() {
        let set = parse_fasta_str(">s1\nATAGCTT\n>s2\nGGGG\n>s3\nttatagcatagc\n").unwrap();
        let hits = scan_motif(&set, b"atagc");
        let summaries: Vec<String> = hits.iter().map(|h| h.summary()).collect();
        assert_eq!(summaries, vec!["s1:0 ATAGC", "s3:2 ATAGC", "s3:7 ATAGC"]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dna_seq(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(
            prop_oneof![Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T')],
            0..=max_len,
        )
    }

    proptest! {
        #[test]
        fn every_offset_is_a_real_match(seq in dna_seq(80), pat in dna_seq(4)) {
            for start in find_motif(&seq, &pat) {
                prop_assert_eq!(&seq[start..start + pat.len()], pat.as_slice());
            }
        }

        #[test]
        fn offsets_strictly_increasing(seq in dna_seq(80), pat in dna_seq(3)) {
            let hits = find_motif(&seq, &pat);
            prop_assert!(hits.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
