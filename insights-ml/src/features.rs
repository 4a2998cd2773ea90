//! Per-sequence feature vectors for clustering.
//!
//! Extraction is a pure function of each record, so with the `parallel`
//! feature the records of a set are processed on the rayon pool without any
//! synchronization.

use insights_core::{InsightsError, Result, Summarizable};
use insights_seq::{SequenceRecord, SequenceSet};
use tracing::debug;

/// Which features to compute for each sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureOptions {
    /// When set, append a normalized k-mer profile of this size to each
    /// vector.
    pub kmer_size: Option<usize>,
}

/// GC content, length and an optional k-mer profile for one sequence.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureVector {
    pub id: String,
    /// Percentage in `[0, 100]`.
    pub gc_content: f64,
    pub length: usize,
    /// Normalized frequencies over all `4^k` ACGT k-mers, lexicographic.
    pub kmer_profile: Option<Vec<f64>>,
}

impl FeatureVector {
    /// Compute the features of a single record.
    pub fn extract(record: &SequenceRecord, options: &FeatureOptions) -> Result<Self> {
        let gc_content = record.seq.gc_content().map_err(|e| {
            InsightsError::InvalidInput(format!("sequence '{}': {}", record.id, e))
        })?;
        let kmer_profile = match options.kmer_size {
            Some(k) => Some(record.seq.kmer_frequencies(k)?.frequency_profile()?),
            None => None,
        };
        debug!(id = %record.id, gc_content, length = record.len(), "extracted features");
        Ok(Self {
            id: record.id.clone(),
            gc_content,
            length: record.len(),
            kmer_profile,
        })
    }

    /// Number of numeric columns this vector contributes.
    pub fn dim(&self) -> usize {
        2 + self.kmer_profile.as_ref().map_or(0, Vec::len)
    }

    /// Flatten into `[gc_content, length, profile...]`.
    pub fn to_row(&self) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.dim());
        row.push(self.gc_content);
        row.push(self.length as f64);
        if let Some(profile) = &self.kmer_profile {
            row.extend_from_slice(profile);
        }
        row
    }
}

impl Summarizable for FeatureVector {
    fn summary(&self) -> String {
        format!(
            "{}: GC {:.2}%, {} bp{}",
            self.id,
            self.gc_content,
            self.length,
            match &self.kmer_profile {
                Some(p) => format!(", {}-dim k-mer profile", p.len()),
                None => String::new(),
            }
        )
    }
}

/// Extract features for every record of `set`, in file order.
pub fn extract_features(set: &SequenceSet, options: &FeatureOptions) -> Result<Vec<FeatureVector>> {
    if options.kmer_size == Some(0) {
        return Err(InsightsError::InvalidInput(
            "k-mer size must be at least 1".into(),
        ));
    }

    #[cfg(feature = "parallel")]
    let features = {
        use rayon::prelude::*;
        set.records()
            .par_iter()
            .map(|record| FeatureVector::extract(record, options))
            .collect::<Result<Vec<_>>>()?
    };
    #[cfg(not(feature = "parallel"))]
    let features = set
        .iter()
        .map(|record| FeatureVector::extract(record, options))
        .collect::<Result<Vec<_>>>()?;

    Ok(features)
}

/// Stack feature vectors into a flat row-major matrix.
///
/// Returns `(data, n_cols)`. Every vector must have the same dimension.
pub fn feature_matrix(features: &[FeatureVector]) -> Result<(Vec<f64>, usize)> {
    let first = features
        .first()
        .ok_or_else(|| InsightsError::InvalidInput("no feature vectors".into()))?;
    let n_cols = first.dim();
    let mut data = Vec::with_capacity(features.len() * n_cols);
    for fv in features {
        if fv.dim() != n_cols {
            return Err(InsightsError::InvalidInput(format!(
                "feature vector '{}' has dimension {}, expected {}",
                fv.id,
                fv.dim(),
                n_cols
            )));
        }
        data.extend(fv.to_row());
    }
    Ok((data, n_cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_seq::parse_fasta_str;

    #[test]
    fn gc_and_length_only() {
        let set = parse_fasta_str(">a\nGGCC\n>b\nATGCAT\n").unwrap();
        let fv = extract_features(&set, &FeatureOptions::default()).unwrap();
        assert_eq!(fv.len(), 2);
        assert_eq!(fv[0].id, "a");
        assert_eq!(fv[0].gc_content, 100.0);
        assert_eq!(fv[0].length, 4);
        assert!(fv[0].kmer_profile.is_none());
        assert_eq!(fv[1].to_row(), vec![fv[1].gc_content, 6.0]);
    }

    #[test]
    fn with_kmer_profile() {
        let set = parse_fasta_str(">a\nAACG\n").unwrap();
        let opts = FeatureOptions { kmer_size: Some(1) };
        let fv = extract_features(&set, &opts).unwrap();
        assert_eq!(fv[0].dim(), 6);
        assert_eq!(fv[0].to_row(), vec![50.0, 4.0, 0.5, 0.25, 0.25, 0.0]);
        assert!(fv[0].summary().contains("4-dim k-mer profile"));
    }

    #[test]
    fn k_longer_than_sequence_gives_zero_profile() {
        let set = parse_fasta_str(">a\nAC\n").unwrap();
        let opts = FeatureOptions { kmer_size: Some(3) };
        let fv = extract_features(&set, &opts).unwrap();
        let profile = fv[0].kmer_profile.as_ref().unwrap();
        assert_eq!(profile.len(), 64);
        assert!(profile.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_k_rejected() {
        let set = parse_fasta_str(">a\nACGT\n").unwrap();
        let opts = FeatureOptions { kmer_size: Some(0) };
        assert!(extract_features(&set, &opts).is_err());
    }

    #[test]
    fn matrix_layout() {
        let set = parse_fasta_str(">a\nGG\n>b\nAAAA\n").unwrap();
        let fv = extract_features(&set, &FeatureOptions::default()).unwrap();
        let (data, n_cols) = feature_matrix(&fv).unwrap();
        assert_eq!(n_cols, 2);
        assert_eq!(data, vec![100.0, 2.0, 0.0, 4.0]);
    }

    #[test]
    fn matrix_rejects_mixed_dimensions() {
        let a = FeatureVector {
            id: "a".into(),
            gc_content: 50.0,
            length: 4,
            kmer_profile: None,
        };
        let b = FeatureVector {
            kmer_profile: Some(vec![0.25; 4]),
            ..a.clone()
        };
        assert!(feature_matrix(&[a, b]).is_err());
        assert!(feature_matrix(&[]).is_err());
    }
}
