//! Supervised classification of sequences by composition.
//!
//! Every record becomes the row `[GC %, AT %, normalized k-mer profile]`
//! (k = 3 by default). [`SequenceClassifier::train`] holds out a seeded
//! share of the records, standardizes columns with statistics from the
//! training rows only, fits a [`RandomForest`] and reports accuracy on both
//! parts. Labels are arbitrary strings.

use insights_core::{InsightsError, Result, Summarizable};
use insights_seq::SequenceRecord;
use tracing::{debug, info};

use crate::features::{FeatureOptions, FeatureVector};
use crate::forest::{ForestConfig, RandomForest};
use crate::normalize::StandardScaler;
use crate::rng::Xorshift64;

/// Configuration for [`SequenceClassifier::train`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassifierConfig {
    pub forest: ForestConfig,
    /// K-mer length of the profile columns.
    pub kmer_size: usize,
    /// Share of records held out for testing, in `[0, 1)`. At least one
    /// record is always kept for training.
    pub test_fraction: f64,
    /// Seed of the train/test shuffle.
    pub split_seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            kmer_size: 3,
            test_fraction: 0.2,
            split_seed: 42,
        }
    }
}

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainingReport {
    pub n_train: usize,
    pub n_test: usize,
    pub train_accuracy: f64,
    /// `None` when nothing was held out.
    pub test_accuracy: Option<f64>,
}

impl Summarizable for TrainingReport {
    fn summary(&self) -> String {
        let test = self
            .test_accuracy
            .map_or_else(|| "n/a".to_string(), |a| format!("{:.3}", a));
        format!(
            "trained on {} sequences, tested on {}: train accuracy {:.3}, test accuracy {}",
            self.n_train, self.n_test, self.train_accuracy, test
        )
    }
}

/// A trained random-forest classifier over sequence composition.
#[derive(Debug, Clone)]
pub struct SequenceClassifier {
    config: ClassifierConfig,
    /// Sorted distinct labels; forest class `i` is `classes[i]`.
    classes: Vec<String>,
    scaler: StandardScaler,
    forest: RandomForest,
}

impl SequenceClassifier {
    /// Train on `records` with one label per record.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for no records, a label count that does not match, or
    /// an unusable k-mer size; `Configuration` for a test fraction outside
    /// `[0, 1)` or zero trees.
    pub fn train<S: AsRef<str>>(
        records: &[SequenceRecord],
        labels: &[S],
        config: &ClassifierConfig,
    ) -> Result<(Self, TrainingReport)> {
        if records.is_empty() {
            return Err(InsightsError::InvalidInput("no sequences to train on".into()));
        }
        if labels.len() != records.len() {
            return Err(InsightsError::InvalidInput(format!(
                "{} labels for {} sequences",
                labels.len(),
                records.len()
            )));
        }
        if !(0.0..1.0).contains(&config.test_fraction) {
            return Err(InsightsError::Configuration(format!(
                "test fraction must be in [0, 1), got {}",
                config.test_fraction
            )));
        }

        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort_unstable();
        classes.dedup();
        let targets: Vec<usize> = labels
            .iter()
            .map(|l| classes.partition_point(|c| c.as_str() < l.as_ref()))
            .collect();

        let (data, n_cols) = composition_matrix(records, config.kmer_size)?;
        let (train_idx, test_idx) = split_indices(records.len(), config.test_fraction, config.split_seed);
        debug!(train = train_idx.len(), test = test_idx.len(), "split sequences");

        let (mut train, train_y) = gather(&data, n_cols, &targets, &train_idx);
        let scaler = StandardScaler::fit(&train, n_cols)?;
        scaler.transform(&mut train)?;
        let forest = RandomForest::fit(&train, n_cols, &train_y, &config.forest)?;
        let train_accuracy = accuracy(&forest.predict_batch(&train)?, &train_y);

        let test_accuracy = if test_idx.is_empty() {
            None
        } else {
            let (mut test, test_y) = gather(&data, n_cols, &targets, &test_idx);
            scaler.transform(&mut test)?;
            Some(accuracy(&forest.predict_batch(&test)?, &test_y))
        };

        let report = TrainingReport {
            n_train: train_idx.len(),
            n_test: test_idx.len(),
            train_accuracy,
            test_accuracy,
        };
        info!(
            train_accuracy = report.train_accuracy,
            test_accuracy = ?report.test_accuracy,
            classes = classes.len(),
            "trained sequence classifier"
        );

        let classifier = Self {
            config: config.clone(),
            classes,
            scaler,
            forest,
        };
        Ok((classifier, report))
    }

    /// Predicted label for each record, in input order.
    pub fn predict(&self, records: &[SequenceRecord]) -> Result<Vec<String>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let (mut data, _) = composition_matrix(records, self.config.kmer_size)?;
        self.scaler.transform(&mut data)?;
        Ok(self
            .forest
            .predict_batch(&data)?
            .into_iter()
            .map(|c| self.classes[c].clone())
            .collect())
    }

    /// Distinct training labels, sorted.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Split frequency per column: GC, AT, then each k-mer in lexicographic
    /// order.
    pub fn feature_importance(&self) -> Vec<f64> {
        self.forest.feature_importance()
    }
}

/// `[GC %, AT %, k-mer profile...]` for one record.
pub fn composition_features(record: &SequenceRecord, kmer_size: usize) -> Result<Vec<f64>> {
    if kmer_size == 0 {
        return Err(InsightsError::InvalidInput("k-mer size must be at least 1".into()));
    }
    let fv = FeatureVector::extract(
        record,
        &FeatureOptions {
            kmer_size: Some(kmer_size),
        },
    )?;
    let at = record
        .seq
        .at_content()
        .map_err(|e| InsightsError::InvalidInput(format!("sequence '{}': {}", record.id, e)))?;
    let profile = fv.kmer_profile.unwrap_or_default();
    let mut row = Vec::with_capacity(2 + profile.len());
    row.push(fv.gc_content);
    row.push(at);
    row.extend(profile);
    Ok(row)
}

fn composition_matrix(records: &[SequenceRecord], kmer_size: usize) -> Result<(Vec<f64>, usize)> {
    #[cfg(feature = "parallel")]
    let rows = {
        use rayon::prelude::*;
        records
            .par_iter()
            .map(|r| composition_features(r, kmer_size))
            .collect::<Result<Vec<_>>>()?
    };
    #[cfg(not(feature = "parallel"))]
    let rows = records
        .iter()
        .map(|r| composition_features(r, kmer_size))
        .collect::<Result<Vec<_>>>()?;

    let n_cols = rows.first().map_or(0, Vec::len);
    Ok((rows.concat(), n_cols))
}

/// Seeded shuffle split into `(train, test)` index lists, each in input
/// order. The test part has `ceil(n * test_fraction)` rows, capped so at
/// least one row trains.
fn split_indices(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n_test = ((n as f64 * test_fraction).ceil() as usize).min(n.saturating_sub(1));
    let mut order: Vec<usize> = (0..n).collect();
    Xorshift64::new(seed).shuffle(&mut order);
    let mut train = order.split_off(n_test);
    let mut test = order;
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

fn gather(data: &[f64], n_cols: usize, targets: &[usize], rows: &[usize]) -> (Vec<f64>, Vec<usize>) {
    let mut out = Vec::with_capacity(rows.len() * n_cols);
    for &r in rows {
        out.extend_from_slice(&data[r * n_cols..(r + 1) * n_cols]);
    }
    (out, rows.iter().map(|&r| targets[r]).collect())
}

fn accuracy(predicted: &[usize], expected: &[usize]) -> f64 {
    let correct = predicted.iter().zip(expected).filter(|(p, e)| p == e).count();
    correct as f64 / expected.len() as f64
}
