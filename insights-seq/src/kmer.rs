//! K-mer iteration and counting.
//!
//! [`KmerIter`] wraps [`std::slice::Windows`] so callers can walk k-mers
//! without allocating. [`kmer_frequencies`] tallies every window (overlaps
//! included) into a [`KmerCounts`] table.

use std::collections::HashMap;

use insights_core::{InsightsError, Result, Summarizable};

use crate::alphabet::DnaAlphabet;

/// Largest k for which a dense [`KmerCounts::frequency_profile`] is built
/// (4^8 = 65536 entries).
pub const MAX_PROFILE_K: usize = 8;

/// Iterator over k-mer windows of a byte slice.
///
/// Yields `&[u8]` slices of length `k` with stride 1. A sequence shorter
/// than `k` yields nothing.
pub struct KmerIter<'a> {
    inner: std::slice::Windows<'a, u8>,
    remaining: usize,
}

impl<'a> KmerIter<'a> {
    /// Create a new k-mer iterator. `k` must be at least 1.
    pub fn new(seq: &'a [u8], k: usize) -> Result<Self> {
        if k == 0 {
            return Err(InsightsError::InvalidInput(
                "k-mer size must be at least 1".into(),
            ));
        }
        let remaining = (seq.len() + 1).saturating_sub(k);
        Ok(Self {
            inner: seq.windows(k),
            remaining,
        })
    }
}

impl<'a> Iterator for KmerIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> ExactSizeIterator for KmerIter<'a> {}

impl<'a> DoubleEndedIterator for KmerIter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.inner.next_back()?;
        self.remaining -= 1;
        Some(item)
    }
}

/// Count every k-mer of `seq`, including overlapping occurrences.
///
/// Input is uppercased before counting. `k == 0` is an error; `k` longer
/// than the sequence gives an empty table.
pub fn kmer_frequencies(seq: &[u8], k: usize) -> Result<KmerCounts> {
    let mut counts = HashMap::new();
    for window in KmerIter::new(seq, k)? {
        let kmer: Vec<u8> = window.iter().map(|b| b.to_ascii_uppercase()).collect();
        *counts.entry(kmer).or_insert(0usize) += 1;
    }
    Ok(KmerCounts { counts, k })
}

/// K-mer occurrence counts for one sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerCounts {
    counts: HashMap<Vec<u8>, usize>,
    k: usize,
}

impl KmerCounts {
    /// Count for a specific k-mer (case-insensitive); 0 when unseen.
    pub fn get(&self, kmer: &[u8]) -> usize {
        let upper: Vec<u8> = kmer.iter().map(|b| b.to_ascii_uppercase()).collect();
        self.counts.get(&upper).copied().unwrap_or(0)
    }

    /// Total number of k-mer occurrences.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Number of distinct k-mers observed.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The k-mer size.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Relative frequency of `kmer` among all occurrences; 0.0 for an empty
    /// table.
    pub fn frequency(&self, kmer: &[u8]) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.get(kmer) as f64 / total as f64
    }

    /// Add the counts of `other` into `self`. Both tables must use the
    /// same k.
    pub fn merge(&mut self, other: &KmerCounts) -> Result<()> {
        if other.k != self.k {
            return Err(InsightsError::InvalidInput(format!(
                "cannot merge {}-mer counts into {}-mer counts",
                other.k, self.k
            )));
        }
        for (kmer, &count) in &other.counts {
            *self.counts.entry(kmer.clone()).or_insert(0) += count;
        }
        Ok(())
    }

    /// An empty table for k-mers of size `k`.
    pub fn empty(k: usize) -> Self {
        Self {
            counts: HashMap::new(),
            k,
        }
    }

    /// Iterate over observed (k-mer, count) pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], usize)> {
        self.counts.iter().map(|(k, &v)| (k.as_slice(), v))
    }

    /// All (k-mer, count) pairs sorted by count descending, then k-mer
    /// ascending.
    pub fn sorted(&self) -> Vec<(String, usize)> {
        let mut pairs: Vec<(String, usize)> = self
            .counts
            .iter()
            .map(|(k, &v)| (String::from_utf8_lossy(k).into_owned(), v))
            .collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs
    }

    /// The `n` most frequent k-mers. Ties are broken lexicographically so the
    /// result is stable across runs.
    pub fn most_common(&self, n: usize) -> Vec<(String, usize)> {
        let mut pairs = self.sorted();
        pairs.truncate(n);
        pairs
    }

    /// Dense frequency vector over all `4^k` ACGT k-mers in lexicographic
    /// order (`AA..A` first, `TT..T` last), normalized to sum to 1.
    ///
    /// K-mers containing `N` are left out of both the vector and the
    /// normalizing total. A table with no ACGT-only k-mers yields all zeros.
    pub fn frequency_profile(&self) -> Result<Vec<f64>> {
        if self.k > MAX_PROFILE_K {
            return Err(InsightsError::InvalidInput(format!(
                "k-mer profile size must be at most {}, got {}",
                MAX_PROFILE_K, self.k
            )));
        }
        let len = DnaAlphabet::BASES.len().pow(self.k as u32);
        let mut profile = vec![0.0; len];
        let mut total = 0usize;
        for (kmer, &count) in &self.counts {
            if let Some(idx) = kmer_to_index(kmer) {
                profile[idx] = count as f64;
                total += count;
            }
        }
        if total > 0 {
            let t = total as f64;
            profile.iter_mut().for_each(|v| *v /= t);
        }
        Ok(profile)
    }
}

impl Summarizable for KmerCounts {
    fn summary(&self) -> String {
        format!(
            "KmerCounts: k={}, {} distinct k-mers, {} total",
            self.k,
            self.distinct(),
            self.total(),
        )
    }
}

/// Map an ACGT k-mer to its lexicographic index. `None` if any byte is not
/// a concrete base.
fn kmer_to_index(kmer: &[u8]) -> Option<usize> {
    let base = DnaAlphabet::BASES.len();
    kmer.iter()
        .try_fold(0usize, |acc, &b| Some(acc * base + DnaAlphabet::base_index(b)?))
}

/// Inverse of the profile indexing: the k-mer at position `index` of a
/// profile built with size `k`.
pub fn index_to_kmer(mut index: usize, k: usize) -> String {
    let base = DnaAlphabet::BASES.len();
    let mut kmer = vec![b'A'; k];
    for slot in kmer.iter_mut().rev() {
        *slot = DnaAlphabet::BASES[index % base];
        index /= base;
    }
    String::from_utf8_lossy(&kmer).into_owned()
}
