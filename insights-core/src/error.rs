//! Structured error types for the toolkit.

use thiserror::Error;

/// Unified error type for every analysis stage.
#[derive(Debug, Error)]
pub enum InsightsError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (malformed FASTA input)
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid input (empty sequence, bad k, out-of-range values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Parameters that cannot be satisfied by the data, such as asking for
    /// more clusters than there are sequences.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, InsightsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        let e = InsightsError::Configuration("n_clusters (5) > n_samples (2)".into());
        assert_eq!(
            e.to_string(),
            "configuration error: n_clusters (5) > n_samples (2)"
        );
    }

    #[test]
    fn io_converts_from_std() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: InsightsError = io.into();
        assert!(matches!(e, InsightsError::Io(_)));
        assert!(e.to_string().starts_with("I/O error: "));
    }
}
