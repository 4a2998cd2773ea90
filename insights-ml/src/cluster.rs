//! K-means clustering of sequence feature vectors.
//!
//! [`kmeans`] is k-means++ seeding followed by Lloyd iterations, repeated
//! `n_init` times with the lowest-inertia run kept. [`cluster_sequences`]
//! wraps it for [`FeatureVector`]s: stack, scale, cluster, label by id.
//!
//! Runs are reproducible only when [`KMeansConfig::seed`] is set. With
//! `seed: None` a fresh seed is drawn per call and label numbering (and, for
//! ambiguous data, the partition itself) may change between runs. The seed
//! that was used is always reported back.

use insights_core::{InsightsError, Result, Summarizable};
use tracing::{debug, info, warn};

use crate::distance::sq_euclidean;
use crate::evaluate::silhouette_score;
use crate::features::{feature_matrix, FeatureVector};
use crate::normalize::Scaling;
use crate::rng::Xorshift64;

/// Configuration for k-means clustering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KMeansConfig {
    pub n_clusters: usize,
    pub max_iter: usize,
    /// Stop once no centroid moves farther than this.
    pub tolerance: f64,
    /// Independent k-means++ restarts; the best by inertia wins.
    pub n_init: usize,
    /// Fixed seed for reproducible runs; `None` draws one per call.
    pub seed: Option<u64>,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            max_iter: 300,
            tolerance: 1e-4,
            n_init: 10,
            seed: Some(42),
        }
    }
}

/// Result of k-means clustering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KMeansResult {
    /// Flat centroid data: `n_clusters * n_features` values.
    pub centroids: Vec<f64>,
    /// Cluster label for each data point.
    pub labels: Vec<usize>,
    /// Sum of squared distances to nearest centroid.
    pub inertia: f64,
    /// Lloyd iterations of the winning run.
    pub n_iter: usize,
    /// Dimensionality of the data.
    pub n_features: usize,
    /// Seed the run was started from.
    pub seed: u64,
}

impl KMeansResult {
    pub fn n_clusters(&self) -> usize {
        if self.n_features == 0 {
            0
        } else {
            self.centroids.len() / self.n_features
        }
    }

    /// Centroid of cluster `c`.
    pub fn centroid(&self, c: usize) -> &[f64] {
        &self.centroids[c * self.n_features..(c + 1) * self.n_features]
    }
}

impl Summarizable for KMeansResult {
    fn summary(&self) -> String {
        format!(
            "KMeans: k={}, inertia={:.4}, iterations={}, seed={}",
            self.n_clusters(),
            self.inertia,
            self.n_iter,
            self.seed,
        )
    }
}

/// Run k-means clustering on the given data points.
///
/// Fails with [`InsightsError::Configuration`] when more clusters are
/// requested than there are points.
pub fn kmeans(data: &[&[f64]], config: &KMeansConfig) -> Result<KMeansResult> {
    let n = data.len();
    let k = config.n_clusters;

    if n == 0 {
        return Err(InsightsError::InvalidInput("empty data".into()));
    }
    if k == 0 {
        return Err(InsightsError::InvalidInput("n_clusters must be > 0".into()));
    }
    if k > n {
        return Err(InsightsError::Configuration(format!(
            "n_clusters ({}) > n_samples ({})",
            k, n
        )));
    }
    if config.n_init == 0 {
        return Err(InsightsError::InvalidInput("n_init must be > 0".into()));
    }

    let dim = data[0].len();
    if dim == 0 {
        return Err(InsightsError::InvalidInput("zero-dimensional data".into()));
    }
    for (i, row) in data.iter().enumerate() {
        if row.len() != dim {
            return Err(InsightsError::InvalidInput(format!(
                "point {} has dimension {}, expected {}",
                i,
                row.len(),
                dim
            )));
        }
    }

    let seed = config.seed.unwrap_or_else(fresh_seed);
    let mut rng = Xorshift64::new(seed);

    let mut best: Option<Run> = None;
    for init in 0..config.n_init {
        let run = lloyd(data, k, dim, config, &mut rng);
        debug!(init, inertia = run.inertia, n_iter = run.n_iter, "k-means restart");
        if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }
    let best = best.ok_or_else(|| InsightsError::Other("k-means produced no run".into()))?;

    Ok(KMeansResult {
        centroids: best.centroids,
        labels: best.labels,
        inertia: best.inertia,
        n_iter: best.n_iter,
        n_features: dim,
        seed,
    })
}

struct Run {
    centroids: Vec<f64>,
    labels: Vec<usize>,
    inertia: f64,
    n_iter: usize,
}

/// One k-means++ initialization plus Lloyd iterations.
fn lloyd(data: &[&[f64]], k: usize, dim: usize, config: &KMeansConfig, rng: &mut Xorshift64) -> Run {
    let n = data.len();
    let mut centroids = init_plus_plus(data, k, dim, rng);
    let mut labels = vec![0usize; n];
    let mut n_iter = 0;

    for _ in 0..config.max_iter {
        n_iter += 1;

        for (label, point) in labels.iter_mut().zip(data) {
            *label = nearest(point, &centroids, dim).0;
        }

        let mut new_centroids = vec![0.0; k * dim];
        let mut counts = vec![0usize; k];
        for (&c, point) in labels.iter().zip(data) {
            counts[c] += 1;
            for (acc, &v) in new_centroids[c * dim..(c + 1) * dim].iter_mut().zip(point.iter()) {
                *acc += v;
            }
        }
        for c in 0..k {
            let slot = c * dim..(c + 1) * dim;
            if counts[c] > 0 {
                let cnt = counts[c] as f64;
                new_centroids[slot].iter_mut().for_each(|v| *v /= cnt);
            } else {
                warn!(cluster = c, "empty cluster, keeping previous centroid");
                new_centroids[slot.clone()].copy_from_slice(&centroids[slot]);
            }
        }

        let max_shift = (0..k)
            .map(|c| {
                let slot = c * dim..(c + 1) * dim;
                sq_euclidean(&centroids[slot.clone()], &new_centroids[slot]).sqrt()
            })
            .fold(0.0_f64, f64::max);

        centroids = new_centroids;

        if max_shift < config.tolerance {
            break;
        }
    }

    // Final assignment against the converged centroids.
    let mut inertia = 0.0;
    for (label, point) in labels.iter_mut().zip(data) {
        let (c, d) = nearest(point, &centroids, dim);
        *label = c;
        inertia += d;
    }

    Run {
        centroids,
        labels,
        inertia,
        n_iter,
    }
}

/// k-means++ seeding: first centroid uniform, the rest proportional to the
/// squared distance from the nearest chosen centroid.
fn init_plus_plus(data: &[&[f64]], k: usize, dim: usize, rng: &mut Xorshift64) -> Vec<f64> {
    let n = data.len();
    let mut centroids = vec![0.0; k * dim];
    let first = rng.next_bounded(n as u64) as usize;
    centroids[..dim].copy_from_slice(data[first]);

    for c in 1..k {
        let dists: Vec<f64> = data
            .iter()
            .map(|point| nearest(point, &centroids[..c * dim], dim).1)
            .collect();
        let total: f64 = dists.iter().sum();
        let chosen = if total == 0.0 {
            // Every point coincides with a chosen centroid.
            c % n
        } else {
            let threshold = rng.next_f64() * total;
            let mut cumulative = 0.0;
            dists
                .iter()
                .position(|&d| {
                    cumulative += d;
                    cumulative >= threshold && d > 0.0
                })
                .unwrap_or(n - 1)
        };
        centroids[c * dim..(c + 1) * dim].copy_from_slice(data[chosen]);
    }
    centroids
}

/// Index of and squared distance to the closest centroid.
fn nearest(point: &[f64], centroids: &[f64], dim: usize) -> (usize, f64) {
    centroids
        .chunks_exact(dim)
        .enumerate()
        .map(|(c, cent)| (c, sq_euclidean(point, cent)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// Seed for an unseeded run, drawn from the thread-local OS-seeded RNG.
fn fresh_seed() -> u64 {
    rand::random::<u64>()
}

// ---------------------------------------------------------------------------
// Sequence clustering
// ---------------------------------------------------------------------------

/// Configuration for [`cluster_sequences`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterConfig {
    pub kmeans: KMeansConfig,
    pub scaling: Scaling,
}

/// Cluster labels for a set of sequences.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterAssignment {
    /// `(sequence id, label)` in input order.
    pub labels: Vec<(String, usize)>,
    pub n_clusters: usize,
    /// Centroids in the scaled feature space, row-major.
    pub centroids: Vec<f64>,
    pub n_features: usize,
    pub inertia: f64,
    pub n_iter: usize,
    pub seed: u64,
    /// Mean silhouette over the scaled features, when at least two clusters
    /// are populated.
    pub silhouette: Option<f64>,
}

impl ClusterAssignment {
    /// Label assigned to `id`.
    pub fn label_of(&self, id: &str) -> Option<usize> {
        self.labels.iter().find(|(s, _)| s == id).map(|&(_, l)| l)
    }

    /// Identifiers assigned to `label`, in input order.
    pub fn members(&self, label: usize) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|&&(_, l)| l == label)
            .map(|(s, _)| s.as_str())
            .collect()
    }

    /// Number of sequences per label, indexed by label.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &(_, l) in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }
}

impl Summarizable for ClusterAssignment {
    fn summary(&self) -> String {
        let silhouette = self
            .silhouette
            .map_or_else(|| "n/a".to_string(), |s| format!("{:.3}", s));
        format!(
            "{} sequences in {} clusters (sizes {:?}), inertia={:.4}, silhouette={}, seed={}",
            self.labels.len(),
            self.n_clusters,
            self.sizes(),
            self.inertia,
            silhouette,
            self.seed,
        )
    }
}

/// Cluster sequences by their feature vectors.
///
/// Columns are rescaled with `config.scaling` before k-means so GC
/// percentage and length in base pairs weigh comparably.
pub fn cluster_sequences(features: &[FeatureVector], config: &ClusterConfig) -> Result<ClusterAssignment> {
    if features.is_empty() {
        return Err(InsightsError::InvalidInput("no sequences to cluster".into()));
    }
    if config.kmeans.n_clusters > features.len() {
        return Err(InsightsError::Configuration(format!(
            "requested {} clusters but only {} sequences were loaded",
            config.kmeans.n_clusters,
            features.len()
        )));
    }

    let (mut data, n_cols) = feature_matrix(features)?;
    config.scaling.apply(&mut data, n_cols)?;
    let rows: Vec<&[f64]> = data.chunks_exact(n_cols).collect();

    let result = kmeans(&rows, &config.kmeans)?;

    let populated = {
        let mut seen = result.labels.clone();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    };
    let silhouette = if populated >= 2 && rows.len() > populated {
        Some(silhouette_score(&rows, &result.labels)?)
    } else {
        None
    };

    let assignment = ClusterAssignment {
        labels: features
            .iter()
            .zip(&result.labels)
            .map(|(fv, &l)| (fv.id.clone(), l))
            .collect(),
        n_clusters: result.n_clusters(),
        centroids: result.centroids,
        n_features: n_cols,
        inertia: result.inertia,
        n_iter: result.n_iter,
        seed: result.seed,
        silhouette,
    };
    info!(
        sequences = features.len(),
        clusters = assignment.n_clusters,
        seed = assignment.seed,
        "clustered sequences"
    );
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_refs(data: &[Vec<f64>]) -> Vec<&[f64]> {
        data.iter().map(|v| v.as_slice()).collect()
    }

    fn fv(id: &str, gc: f64, len: usize) -> FeatureVector {
        FeatureVector {
            id: id.into(),
            gc_content: gc,
            length: len,
            kmer_profile: None,
        }
    }

    // --- K-Means ---

    #[test]
    fn kmeans_two_clusters() {
        let data = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![0.2, 0.0],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
            vec![10.2, 10.0],
        ];
        let refs = make_refs(&data);
        let config = KMeansConfig {
            n_clusters: 2,
            ..Default::default()
        };
        let result = kmeans(&refs, &config).unwrap();
        assert_eq!(result.labels.len(), 6);
        assert_eq!(result.labels[0], result.labels[1]);
        assert_eq!(result.labels[0], result.labels[2]);
        assert_eq!(result.labels[3], result.labels[4]);
        assert_eq!(result.labels[3], result.labels[5]);
        assert_ne!(result.labels[0], result.labels[3]);
        assert_eq!(result.n_clusters(), 2);
    }

    #[test]
    fn kmeans_single_cluster() {
        let data = vec![vec![1.0, 2.0], vec![1.1, 2.1], vec![0.9, 1.9]];
        let refs = make_refs(&data);
        let config = KMeansConfig {
            n_clusters: 1,
            ..Default::default()
        };
        let result = kmeans(&refs, &config).unwrap();
        assert!(result.labels.iter().all(|&l| l == 0));
        let c = result.centroid(0);
        assert!((c[0] - 1.0).abs() < 1e-9 && (c[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn kmeans_too_many_clusters_is_configuration_error() {
        let data = vec![vec![1.0], vec![2.0]];
        let refs = make_refs(&data);
        let config = KMeansConfig {
            n_clusters: 3,
            ..Default::default()
        };
        let err = kmeans(&refs, &config).unwrap_err();
        assert!(matches!(err, InsightsError::Configuration(_)), "{err}");
    }

    #[test]
    fn kmeans_invalid_inputs() {
        let refs: Vec<&[f64]> = vec![];
        assert!(kmeans(&refs, &KMeansConfig::default()).is_err());

        let data = vec![vec![1.0], vec![2.0]];
        let refs = make_refs(&data);
        let zero_k = KMeansConfig {
            n_clusters: 0,
            ..Default::default()
        };
        assert!(matches!(
            kmeans(&refs, &zero_k).unwrap_err(),
            InsightsError::InvalidInput(_)
        ));

        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        let refs = make_refs(&ragged);
        let config = KMeansConfig {
            n_clusters: 1,
            ..Default::default()
        };
        assert!(kmeans(&refs, &config).is_err());
    }

    #[test]
    fn kmeans_identical_points() {
        let data = vec![vec![5.0, 5.0]; 4];
        let refs = make_refs(&data);
        let config = KMeansConfig {
            n_clusters: 2,
            ..Default::default()
        };
        let result = kmeans(&refs, &config).unwrap();
        assert_eq!(result.inertia, 0.0);
    }

    #[test]
    fn kmeans_same_seed_same_labels() {
        let data: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![(i % 7) as f64, (i * 3 % 11) as f64])
            .collect();
        let refs = make_refs(&data);
        let config = KMeansConfig {
            n_clusters: 4,
            seed: Some(7),
            ..Default::default()
        };
        let a = kmeans(&refs, &config).unwrap();
        let b = kmeans(&refs, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.seed, 7);
    }

    #[test]
    fn kmeans_unseeded_reports_seed() {
        let data = vec![vec![0.0], vec![1.0], vec![10.0], vec![11.0]];
        let refs = make_refs(&data);
        let config = KMeansConfig {
            n_clusters: 2,
            seed: None,
            ..Default::default()
        };
        let first = kmeans(&refs, &config).unwrap();
        let replay = kmeans(
            &refs,
            &KMeansConfig {
                seed: Some(first.seed),
                ..config
            },
        )
        .unwrap();
        assert_eq!(first.labels, replay.labels);
    }

    #[test]
    fn kmeans_summary() {
        let data = vec![vec![0.0], vec![1.0], vec![10.0], vec![11.0]];
        let refs = make_refs(&data);
        let config = KMeansConfig {
            n_clusters: 2,
            ..Default::default()
        };
        let result = kmeans(&refs, &config).unwrap();
        assert!(result.summary().contains("k=2"));
        assert!((result.inertia - 1.0).abs() < 1e-9);
    }

    #[test]
    fn kmeans_restarts_never_worse_than_single() {
        let data: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![((i * 37) % 17) as f64, ((i * 13) % 23) as f64])
            .collect();
        let refs = make_refs(&data);
        let single = KMeansConfig {
            n_clusters: 5,
            n_init: 1,
            seed: Some(3),
            ..Default::default()
        };
        let many = KMeansConfig {
            n_init: 10,
            ..single.clone()
        };
        let a = kmeans(&refs, &single).unwrap();
        let b = kmeans(&refs, &many).unwrap();
        assert!(b.inertia <= a.inertia + 1e-9);
    }

    // --- Sequence clustering ---

    #[test]
    fn gc_rich_short_vs_at_rich_long() {
        let features = vec![
            fv("gc1", 92.0, 40),
            fv("at1", 12.0, 900),
            fv("gc2", 88.0, 55),
            fv("at2", 8.0, 1000),
            fv("gc3", 95.0, 35),
            fv("at3", 15.0, 950),
        ];
        let config = ClusterConfig {
            kmeans: KMeansConfig {
                n_clusters: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = cluster_sequences(&features, &config).unwrap();
        let gc = result.label_of("gc1").unwrap();
        let at = result.label_of("at1").unwrap();
        assert_ne!(gc, at);
        assert_eq!(result.members(gc), vec!["gc1", "gc2", "gc3"]);
        assert_eq!(result.members(at), vec!["at1", "at2", "at3"]);
        assert_eq!(result.sizes(), vec![3, 3]);
        assert!(result.silhouette.unwrap() > 0.8);
    }

    #[test]
    fn kmer_profiles_separate_equal_gc_and_length() {
        let with_profile = |id: &str, profile: [f64; 4]| FeatureVector {
            kmer_profile: Some(profile.to_vec()),
            ..fv(id, 50.0, 120)
        };
        let features = vec![
            with_profile("ac1", [0.48, 0.02, 0.02, 0.48]),
            with_profile("gt1", [0.02, 0.48, 0.48, 0.02]),
            with_profile("ac2", [0.45, 0.05, 0.05, 0.45]),
            with_profile("gt2", [0.05, 0.45, 0.45, 0.05]),
            with_profile("ac3", [0.50, 0.00, 0.00, 0.50]),
            with_profile("gt3", [0.00, 0.50, 0.50, 0.00]),
        ];
        let config = ClusterConfig {
            kmeans: KMeansConfig {
                n_clusters: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = cluster_sequences(&features, &config).unwrap();
        assert_eq!(result.n_features, 6);
        let ac = result.label_of("ac1").unwrap();
        assert_ne!(ac, result.label_of("gt1").unwrap());
        assert_eq!(result.members(ac), vec!["ac1", "ac2", "ac3"]);
        assert_eq!(result.sizes(), vec![3, 3]);
    }

    #[test]
    fn consistent_across_unseeded_runs() {
        let features = vec![
            fv("gc1", 90.0, 30),
            fv("gc2", 91.0, 32),
            fv("at1", 10.0, 800),
            fv("at2", 11.0, 820),
        ];
        for _ in 0..5 {
            let config = ClusterConfig {
                kmeans: KMeansConfig {
                    n_clusters: 2,
                    seed: None,
                    ..Default::default()
                },
                scaling: Scaling::MinMax,
            };
            let r = cluster_sequences(&features, &config).unwrap();
            assert_eq!(r.label_of("gc1"), r.label_of("gc2"));
            assert_eq!(r.label_of("at1"), r.label_of("at2"));
            assert_ne!(r.label_of("gc1"), r.label_of("at1"));
        }
    }

    #[test]
    fn too_many_clusters_for_sequences() {
        let features = vec![fv("a", 50.0, 10), fv("b", 60.0, 12)];
        let config = ClusterConfig {
            kmeans: KMeansConfig {
                n_clusters: 3,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = cluster_sequences(&features, &config).unwrap_err();
        assert!(matches!(err, InsightsError::Configuration(_)), "{err}");
    }

    #[test]
    fn empty_features_rejected() {
        let err = cluster_sequences(&[], &ClusterConfig::default()).unwrap_err();
        assert!(matches!(err, InsightsError::InvalidInput(_)));
    }

    #[test]
    fn one_cluster_has_no_silhouette() {
        let features = vec![fv("a", 50.0, 10), fv("b", 60.0, 12)];
        let config = ClusterConfig {
            kmeans: KMeansConfig {
                n_clusters: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let r = cluster_sequences(&features, &config).unwrap();
        assert_eq!(r.silhouette, None);
        assert!(r.summary().contains("silhouette=n/a"));
    }
}
