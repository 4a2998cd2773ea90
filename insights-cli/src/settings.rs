//! Effective configuration of one pipeline run.

use std::path::PathBuf;

use insights_core::{InsightsError, Result};
use insights_ml::{ClusterConfig, FeatureOptions, KMeansConfig};
use insights_plot::ChartStyle;
use insights_seq::DnaSequence;
use serde::{Deserialize, Serialize};

use crate::args::Args;

/// Everything the pipeline needs, validated. Echoed into `report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub kmer_size: usize,
    /// Uppercased motif.
    pub motif: String,
    pub top_kmers: usize,
    pub features: FeatureOptions,
    pub cluster: ClusterConfig,
    pub chart: ChartStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/sequences.fasta"),
            output_dir: PathBuf::from("results"),
            kmer_size: 3,
            motif: "ATAGC".to_string(),
            top_kmers: 10,
            features: FeatureOptions::default(),
            cluster: ClusterConfig::default(),
            chart: ChartStyle::default(),
        }
    }
}

impl Settings {
    /// Build settings from parsed arguments.
    pub fn from_args(args: &Args) -> Result<Self> {
        let settings = Self {
            input: args.input.clone(),
            output_dir: args.output_dir.clone(),
            kmer_size: args.kmer_size,
            motif: args.motif.to_ascii_uppercase(),
            top_kmers: args.top_kmers,
            features: FeatureOptions {
                kmer_size: args.kmer_features.then_some(args.kmer_size),
            },
            cluster: ClusterConfig {
                kmeans: KMeansConfig {
                    n_clusters: args.clusters,
                    seed: Some(args.seed),
                    ..Default::default()
                },
                scaling: args.scaling,
            },
            chart: ChartStyle::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check parameter combinations clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.kmer_size == 0 {
            return Err(InsightsError::Configuration("k-mer size must be at least 1".into()));
        }
        if self.top_kmers == 0 {
            return Err(InsightsError::Configuration("--top-kmers must be at least 1".into()));
        }
        if self.cluster.kmeans.n_clusters == 0 {
            return Err(InsightsError::Configuration("cluster count must be at least 1".into()));
        }
        if self.motif.is_empty() {
            return Err(InsightsError::Configuration("motif must not be empty".into()));
        }
        DnaSequence::new(self.motif.as_bytes())
            .map_err(|e| InsightsError::Configuration(format!("motif '{}': {}", self.motif, e)))?;
        if let Some(k) = self.features.kmer_size {
            if k > insights_seq::MAX_PROFILE_K {
                return Err(InsightsError::Configuration(format!(
                    "k-mer profiles support k <= {}, got {}",
                    insights_seq::MAX_PROFILE_K,
                    k
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["genomic-insights"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn defaults_match_cli_defaults() {
        let settings = Settings::from_args(&parse(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.cluster.kmeans.seed, Some(42));
    }

    #[test]
    fn motif_is_uppercased() {
        let settings = Settings::from_args(&parse(&["-m", "atagc"])).unwrap();
        assert_eq!(settings.motif, "ATAGC");
    }

    #[test]
    fn invalid_motif_is_configuration_error() {
        let err = Settings::from_args(&parse(&["-m", "AXG"])).unwrap_err();
        assert!(matches!(err, InsightsError::Configuration(_)));
    }

    #[test]
    fn kmer_features_use_kmer_size() {
        let settings = Settings::from_args(&parse(&["--kmer-features", "-k", "2"])).unwrap();
        assert_eq!(settings.features.kmer_size, Some(2));
        let settings = Settings::from_args(&parse(&["-k", "2"])).unwrap();
        assert_eq!(settings.features.kmer_size, None);
    }

    #[test]
    fn oversized_profile_is_rejected() {
        let err = Settings::from_args(&parse(&["--kmer-features", "-k", "12"])).unwrap_err();
        assert!(matches!(err, InsightsError::Configuration(_)));
        // plain counting has no upper bound
        assert!(Settings::from_args(&parse(&["-k", "12"])).is_ok());
    }

    #[test]
    fn round_trips_through_json() {
        let settings = Settings::from_args(&parse(&["--scaling", "none", "-c", "2"])).unwrap();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"scaling\":\"none\""));
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
