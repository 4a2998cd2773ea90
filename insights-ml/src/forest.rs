//! Random forest classifier.
//!
//! Each tree is grown on a bootstrap sample of the rows and may only split on
//! a random subset of the columns. Splits minimize weighted Gini impurity,
//! with thresholds halfway between adjacent distinct values. Prediction is a
//! majority vote over the trees; ties go to the lower class index.
//!
//! Data is flat row-major `&[f64]` with an `n_features` parameter, the same
//! layout [`crate::normalize`] and [`crate::cluster`] use.

use insights_core::{InsightsError, Result};
use tracing::debug;

use crate::rng::Xorshift64;

/// Configuration for random forest training.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForestConfig {
    pub n_trees: usize,
    /// Maximum depth per tree. Depth 0 is a single leaf.
    pub max_depth: usize,
    /// Columns each tree may split on. `None` means `sqrt(n_features)`.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: usize,
    },
}

/// One decision tree, stored as an arena with the root at index 0.
#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, row: &[f64]) -> usize {
        let mut at = 0;
        loop {
            match self.nodes[at] {
                Node::Leaf { class } => return class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => at = if row[feature] <= threshold { left } else { right },
            }
        }
    }
}

/// A bagged ensemble of decision trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<Tree>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForest {
    /// Fit a forest on `data` (`n_samples x n_features`, row-major) with one
    /// class index per row.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for empty or ragged data and a label count that does
    /// not match the rows; `Configuration` when `n_trees` is 0.
    pub fn fit(data: &[f64], n_features: usize, labels: &[usize], config: &ForestConfig) -> Result<Self> {
        if data.is_empty() {
            return Err(InsightsError::InvalidInput("empty data".into()));
        }
        if n_features == 0 {
            return Err(InsightsError::InvalidInput("n_features must be > 0".into()));
        }
        if data.len() % n_features != 0 {
            return Err(InsightsError::InvalidInput(format!(
                "data length {} not divisible by n_features {}",
                data.len(),
                n_features
            )));
        }
        let n_samples = data.len() / n_features;
        if labels.len() != n_samples {
            return Err(InsightsError::InvalidInput(format!(
                "{} labels for {} samples",
                labels.len(),
                n_samples
            )));
        }
        if config.n_trees == 0 {
            return Err(InsightsError::Configuration("n_trees must be > 0".into()));
        }

        let n_classes = labels.iter().copied().max().map_or(0, |m| m + 1);
        let max_features = config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt() as usize)
            .clamp(1, n_features);

        let mut rng = Xorshift64::new(config.seed);
        let mut trees = Vec::with_capacity(config.n_trees);
        for _ in 0..config.n_trees {
            let mut samples: Vec<usize> = (0..n_samples)
                .map(|_| rng.next_bounded(n_samples as u64) as usize)
                .collect();
            let features = rng.choose_indices(n_features, max_features);
            let mut grower = Grower {
                data,
                n_features,
                labels,
                n_classes,
                features: &features,
                max_depth: config.max_depth,
                nodes: Vec::new(),
            };
            grower.grow(&mut samples, 0);
            trees.push(Tree { nodes: grower.nodes });
        }
        debug!(
            trees = trees.len(),
            samples = n_samples,
            features = n_features,
            classes = n_classes,
            "fitted random forest"
        );

        Ok(Self {
            trees,
            n_features,
            n_classes,
        })
    }

    /// Majority-vote class for one row.
    pub fn predict(&self, row: &[f64]) -> Result<usize> {
        if row.len() != self.n_features {
            return Err(InsightsError::InvalidInput(format!(
                "row has {} features, forest was fitted on {}",
                row.len(),
                self.n_features
            )));
        }
        let mut votes = vec![0usize; self.n_classes.max(1)];
        for tree in &self.trees {
            votes[tree.predict(row)] += 1;
        }
        let (class, _) = votes
            .iter()
            .enumerate()
            .fold((0, 0), |best, (c, &v)| if v > best.1 { (c, v) } else { best });
        Ok(class)
    }

    /// Predict every row of a flat row-major matrix.
    pub fn predict_batch(&self, data: &[f64]) -> Result<Vec<usize>> {
        if data.len() % self.n_features != 0 {
            return Err(InsightsError::InvalidInput(format!(
                "data length {} not divisible by n_features {}",
                data.len(),
                self.n_features
            )));
        }
        data.chunks_exact(self.n_features).map(|row| self.predict(row)).collect()
    }

    /// Share of all splits that use each column. Sums to 1 unless no tree
    /// ever split, in which case every entry is 0.
    pub fn feature_importance(&self) -> Vec<f64> {
        let mut counts = vec![0usize; self.n_features];
        for node in self.trees.iter().flat_map(|t| &t.nodes) {
            if let Node::Split { feature, .. } = node {
                counts[*feature] += 1;
            }
        }
        let total: usize = counts.iter().sum();
        if total == 0 {
            return vec![0.0; self.n_features];
        }
        counts.iter().map(|&c| c as f64 / total as f64).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// One more than the largest class index seen while fitting.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

/// State for growing one tree.
struct Grower<'a> {
    data: &'a [f64],
    n_features: usize,
    labels: &'a [usize],
    n_classes: usize,
    features: &'a [usize],
    max_depth: usize,
    nodes: Vec<Node>,
}

impl Grower<'_> {
    /// Grow the subtree for `samples` and return its arena index. `samples`
    /// is reordered in place.
    fn grow(&mut self, samples: &mut [usize], depth: usize) -> usize {
        let counts = self.class_counts(samples);
        let leaf = Node::Leaf {
            class: majority(&counts),
        };
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if depth >= self.max_depth || samples.len() < 2 || pure {
            return self.push(leaf);
        }
        let Some((feature, threshold)) = self.best_split(samples, &counts) else {
            return self.push(leaf);
        };

        let mut mid = 0;
        for i in 0..samples.len() {
            if self.value(samples[i], feature) <= threshold {
                samples.swap(i, mid);
                mid += 1;
            }
        }
        // Midpoints of neighboring floats can round onto the upper value.
        if mid == 0 || mid == samples.len() {
            return self.push(leaf);
        }

        let at = self.push(leaf);
        let (lo, hi) = samples.split_at_mut(mid);
        let left = self.grow(lo, depth + 1);
        let right = self.grow(hi, depth + 1);
        self.nodes[at] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        at
    }

    /// Column and threshold with the largest Gini gain, if any split gains.
    fn best_split(&self, samples: &[usize], counts: &[usize]) -> Option<(usize, f64)> {
        let n = samples.len();
        let parent = gini(counts, n);
        let mut best = None;
        let mut best_gain = 0.0;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);

        for &feature in self.features {
            sorted.clear();
            sorted.extend(samples.iter().map(|&s| (self.value(s, feature), self.labels[s])));
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = vec![0usize; self.n_classes];
            let mut right = counts.to_vec();
            for i in 0..n - 1 {
                let (value, class) = sorted[i];
                left[class] += 1;
                right[class] -= 1;
                let next = sorted[i + 1].0;
                if value == next {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                let weighted = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;
                let gain = parent - weighted;
                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature, (value + next) / 2.0));
                }
            }
        }
        best
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &s in samples {
            counts[self.labels[s]] += 1;
        }
        counts
    }

    fn value(&self, sample: usize, feature: usize) -> f64 {
        self.data[sample * self.n_features + feature]
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let t = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / t).powi(2)).sum::<f64>()
}

/// Most frequent class; the lowest index wins ties.
fn majority(counts: &[usize]) -> usize {
    counts
        .iter()
        .enumerate()
        .fold((0, 0), |best, (c, &n)| if n > best.1 { (c, n) } else { best })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two classes along column 0; column 1 is constant.
    fn two_groups() -> (Vec<f64>, Vec<usize>) {
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let x = i as f64;
            data.extend_from_slice(&[x, 0.0]);
            labels.push(usize::from(x >= 10.0));
        }
        (data, labels)
    }

    #[test]
    fn separates_two_groups() {
        let (data, labels) = two_groups();
        let config = ForestConfig {
            n_trees: 31,
            max_depth: 5,
            max_features: Some(2),
            ..Default::default()
        };
        let forest = RandomForest::fit(&data, 2, &labels, &config).unwrap();
        assert_eq!(forest.predict_batch(&data).unwrap(), labels);
        assert_eq!(forest.predict(&[0.5, 0.0]).unwrap(), 0);
        assert_eq!(forest.predict(&[18.5, 0.0]).unwrap(), 1);
        assert_eq!(forest.n_trees(), 31);
        assert_eq!(forest.n_classes(), 2);
    }

    #[test]
    fn same_seed_same_forest() {
        let (data, labels) = two_groups();
        let config = ForestConfig {
            n_trees: 10,
            max_features: Some(1),
            seed: 9,
            ..Default::default()
        };
        let a = RandomForest::fit(&data, 2, &labels, &config).unwrap();
        let b = RandomForest::fit(&data, 2, &labels, &config).unwrap();
        let grid: Vec<f64> = (0..40).flat_map(|i| [i as f64 * 0.5, 0.0]).collect();
        assert_eq!(a.predict_batch(&grid).unwrap(), b.predict_batch(&grid).unwrap());
        assert_eq!(a.feature_importance(), b.feature_importance());
    }

    #[test]
    fn constant_column_never_splits() {
        let (data, labels) = two_groups();
        let config = ForestConfig {
            n_trees: 20,
            max_features: Some(2),
            ..Default::default()
        };
        let forest = RandomForest::fit(&data, 2, &labels, &config).unwrap();
        let importance = forest.feature_importance();
        assert_eq!(importance[1], 0.0);
        assert!((importance.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn depth_zero_votes_the_majority() {
        let data = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let labels = vec![1, 1, 1, 0, 1];
        let config = ForestConfig {
            n_trees: 5,
            max_depth: 0,
            ..Default::default()
        };
        let forest = RandomForest::fit(&data, 1, &labels, &config).unwrap();
        assert_eq!(forest.predict(&[3.0]).unwrap(), 1);
        assert!(forest.feature_importance().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn three_classes() {
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for (class, base) in [(0usize, 1.0), (1, 5.0), (2, 9.0)] {
            for i in 0..8 {
                let off = i as f64 * 0.1;
                data.extend_from_slice(&[base + off, base * 2.0 - off]);
                labels.push(class);
            }
        }
        let config = ForestConfig {
            n_trees: 25,
            max_depth: 5,
            ..Default::default()
        };
        let forest = RandomForest::fit(&data, 2, &labels, &config).unwrap();
        let correct = forest
            .predict_batch(&data)
            .unwrap()
            .iter()
            .zip(&labels)
            .filter(|(p, l)| p == l)
            .count();
        assert!(correct as f64 / labels.len() as f64 > 0.9, "{} correct", correct);
    }

    #[test]
    fn rejects_bad_input() {
        let config = ForestConfig::default();
        assert!(RandomForest::fit(&[], 2, &[], &config).is_err());
        assert!(RandomForest::fit(&[1.0, 2.0, 3.0], 2, &[0], &config).is_err());
        assert!(RandomForest::fit(&[1.0, 2.0], 2, &[0, 1], &config).is_err());
        let err = RandomForest::fit(
            &[1.0, 2.0],
            2,
            &[0],
            &ForestConfig {
                n_trees: 0,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, InsightsError::Configuration(_)));
    }

    #[test]
    fn predict_checks_row_width() {
        let (data, labels) = two_groups();
        let forest = RandomForest::fit(&data, 2, &labels, &ForestConfig::default()).unwrap();
        assert!(forest.predict(&[1.0]).is_err());
        assert!(forest.predict_batch(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn gini_of_pure_and_even_sets() {
        assert_eq!(gini(&[4, 0], 4), 0.0);
        assert!((gini(&[2, 2], 4) - 0.5).abs() < 1e-12);
        assert_eq!(majority(&[3, 3, 1]), 0);
    }
}
