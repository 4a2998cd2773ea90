//! Distance metrics between feature vectors.

use insights_core::{InsightsError, Result};

/// Euclidean (L2) distance between two vectors.
pub fn euclidean(a: &[f64], b: &[f64]) -> Result<f64> {
    validate_pair(a, b)?;
    Ok(sq_euclidean(a, b).sqrt())
}

/// Squared Euclidean distance without shape checks. Callers guarantee equal
/// lengths; extra trailing values of the longer slice are ignored.
pub(crate) fn sq_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn validate_pair(a: &[f64], b: &[f64]) -> Result<()> {
    if a.is_empty() {
        return Err(InsightsError::InvalidInput("empty vectors".into()));
    }
    if a.len() != b.len() {
        return Err(InsightsError::InvalidInput(format!(
            "length mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_known() {
        let d = euclidean(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn euclidean_identical() {
        let d = euclidean(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(d, 0.0);
    }

    #[test]
    fn euclidean_shape_errors() {
        assert!(euclidean(&[], &[]).is_err());
        assert!(euclidean(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn squared_matches_euclidean() {
        let a = [1.0, -2.0, 0.5];
        let b = [0.0, 2.0, 2.5];
        let d = euclidean(&a, &b).unwrap();
        assert!((sq_euclidean(&a, &b) - d * d).abs() < 1e-12);
    }
}
