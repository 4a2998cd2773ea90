//! Cluster quality metrics.

use insights_core::{InsightsError, Result};

use crate::distance::euclidean;

/// Silhouette coefficient of every sample.
///
/// For sample `i`, `a` is the mean distance to the other members of its
/// cluster and `b` the smallest mean distance to another cluster; the value
/// is `(b - a) / max(a, b)`. Members of singleton clusters score 0.0.
/// Requires at least two distinct labels.
pub fn silhouette_samples(data: &[&[f64]], labels: &[usize]) -> Result<Vec<f64>> {
    let n = data.len();
    if n != labels.len() {
        return Err(InsightsError::InvalidInput(
            "data and labels length mismatch".into(),
        ));
    }
    if n < 2 {
        return Err(InsightsError::InvalidInput("need at least 2 samples".into()));
    }

    let mut unique_labels = labels.to_vec();
    unique_labels.sort_unstable();
    unique_labels.dedup();
    if unique_labels.len() < 2 {
        return Err(InsightsError::InvalidInput("need at least 2 clusters".into()));
    }

    // Dense cluster slot per sample. Every label is present in the sorted,
    // deduplicated list, so the partition point is its exact position.
    let slots: Vec<usize> = labels
        .iter()
        .map(|l| unique_labels.partition_point(|u| u < l))
        .collect();

    let score = |i: usize| -> Result<f64> {
        let mut sums = vec![0.0; unique_labels.len()];
        let mut counts = vec![0usize; unique_labels.len()];
        for j in 0..n {
            if j == i {
                continue;
            }
            sums[slots[j]] += euclidean(data[i], data[j])?;
            counts[slots[j]] += 1;
        }
        let own = slots[i];
        if counts[own] == 0 {
            return Ok(0.0);
        }
        let a = sums[own] / counts[own] as f64;
        let b = (0..unique_labels.len())
            .filter(|&s| s != own && counts[s] > 0)
            .map(|s| sums[s] / counts[s] as f64)
            .fold(f64::INFINITY, f64::min);
        let max_ab = a.max(b);
        Ok(if max_ab == 0.0 { 0.0 } else { (b - a) / max_ab })
    };

    #[cfg(feature = "parallel")]
    let scores = {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(score).collect::<Result<Vec<f64>>>()?
    };
    #[cfg(not(feature = "parallel"))]
    let scores = (0..n).map(score).collect::<Result<Vec<f64>>>()?;

    Ok(scores)
}

/// Mean silhouette score across all samples. See [`silhouette_samples`].
pub fn silhouette_score(data: &[&[f64]], labels: &[usize]) -> Result<f64> {
    let samples = silhouette_samples(data, labels)?;
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}
