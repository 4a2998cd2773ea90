//! Column scaling for feature matrices.
//!
//! Matrices are flat row-major `Vec<f64>` with `n_cols` values per row, the
//! layout [`crate::cluster::kmeans`] consumes.

use insights_core::{InsightsError, Result};

/// How feature columns are rescaled before clustering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Scaling {
    /// Zero mean, unit variance per column.
    #[default]
    Standard,
    /// Rescale each column to `[0, 1]`.
    MinMax,
    /// Use raw values.
    None,
}

impl Scaling {
    /// Apply this scaling to every column of `data` in place.
    pub fn apply(self, data: &mut [f64], n_cols: usize) -> Result<()> {
        match self {
            Scaling::Standard => z_score_columns(data, n_cols),
            Scaling::MinMax => min_max_columns(data, n_cols),
            Scaling::None => validate_matrix(data, n_cols),
        }
    }
}

impl std::str::FromStr for Scaling {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standard" | "z-score" | "zscore" => Ok(Scaling::Standard),
            "min-max" | "minmax" => Ok(Scaling::MinMax),
            "none" | "raw" => Ok(Scaling::None),
            other => Err(InsightsError::InvalidInput(format!(
                "unknown scaling '{}' (expected standard, min-max or none)",
                other
            ))),
        }
    }
}

fn validate_matrix(data: &[f64], n_cols: usize) -> Result<()> {
    if n_cols == 0 {
        return Err(InsightsError::InvalidInput("n_cols must be > 0".into()));
    }
    if data.is_empty() {
        return Err(InsightsError::InvalidInput("empty data".into()));
    }
    if data.len() % n_cols != 0 {
        return Err(InsightsError::InvalidInput(format!(
            "data length {} not divisible by n_cols {}",
            data.len(),
            n_cols
        )));
    }
    Ok(())
}

/// Min-max normalize each column in place. Constant columns become 0.0.
pub fn min_max_columns(data: &mut [f64], n_cols: usize) -> Result<()> {
    validate_matrix(data, n_cols)?;
    for col in 0..n_cols {
        let (min, max) = data
            .iter()
            .skip(col)
            .step_by(n_cols)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;
        for v in data.iter_mut().skip(col).step_by(n_cols) {
            *v = if range == 0.0 { 0.0 } else { (*v - min) / range };
        }
    }
    Ok(())
}

/// Z-score each column in place (population variance). Constant columns
/// become 0.0.
pub fn z_score_columns(data: &mut [f64], n_cols: usize) -> Result<()> {
    validate_matrix(data, n_cols)?;
    let n_rows = (data.len() / n_cols) as f64;
    for col in 0..n_cols {
        let mean = data.iter().skip(col).step_by(n_cols).sum::<f64>() / n_rows;
        let var = data
            .iter()
            .skip(col)
            .step_by(n_cols)
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n_rows;
        let std = var.sqrt();
        for v in data.iter_mut().skip(col).step_by(n_cols) {
            *v = if std == 0.0 { 0.0 } else { (*v - mean) / std };
        }
    }
    Ok(())
}

/// Column means and standard deviations learned from one matrix and applied
/// to others, so held-out and new rows are scaled with training statistics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Learn per-column mean and population standard deviation.
    pub fn fit(data: &[f64], n_cols: usize) -> Result<Self> {
        validate_matrix(data, n_cols)?;
        let n_rows = (data.len() / n_cols) as f64;
        let mut means = Vec::with_capacity(n_cols);
        let mut stds = Vec::with_capacity(n_cols);
        for col in 0..n_cols {
            let mean = data.iter().skip(col).step_by(n_cols).sum::<f64>() / n_rows;
            let var = data
                .iter()
                .skip(col)
                .step_by(n_cols)
                .map(|v| (v - mean).powi(2))
                .sum::<f64>()
                / n_rows;
            means.push(mean);
            stds.push(var.sqrt());
        }
        Ok(Self { means, stds })
    }

    /// Scale `data` in place. Zero-variance columns are only centered.
    pub fn transform(&self, data: &mut [f64]) -> Result<()> {
        let n_cols = self.n_cols();
        validate_matrix(data, n_cols)?;
        for row in data.chunks_exact_mut(n_cols) {
            for ((v, &mean), &std) in row.iter_mut().zip(&self.means).zip(&self.stds) {
                *v -= mean;
                if std > 0.0 {
                    *v /= std;
                }
            }
        }
        Ok(())
    }

    pub fn n_cols(&self) -> usize {
        self.means.len()
    }
}
