//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use insights_ml::Scaling;

fn parse_positive(s: &str) -> Result<usize, String> {
    let val: usize = s.parse().map_err(|_| format!("invalid number: {}", s))?;
    if val == 0 {
        Err("value must be at least 1".to_string())
    } else {
        Ok(val)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "genomic-insights")]
#[command(version)]
#[command(about = "GC content, motif, k-mer and clustering analysis of DNA sequences")]
#[command(long_about = r#"
genomic-insights - exploratory analysis of a FASTA file

Loads every record of the input file, then:
  1. Computes GC content per sequence
  2. Finds all (overlapping) occurrences of a motif
  3. Counts k-mers per sequence and pooled over the file
  4. Clusters sequences by GC content and length with k-means

OUTPUT FILES (in --output-dir):
  gc_content.svg         GC percentage per sequence
  kmer_frequency.svg     Most common k-mers over all sequences
  sequence_clusters.svg  GC content vs length, colored by cluster
  summary.txt            Human-readable report
  report.json            Machine-readable report

Set RUST_LOG to override the log level chosen by -v/-q.
"#)]
pub struct Args {
    /// FASTA file to analyze (optionally gzip-compressed)
    #[arg(short, long, value_name = "FILE", default_value = "data/sequences.fasta", help_heading = "Input")]
    pub input: PathBuf,

    /// Directory receiving charts and reports
    #[arg(short, long = "output-dir", value_name = "DIR", default_value = "results", help_heading = "Output")]
    pub output_dir: PathBuf,

    /// k-mer length for counting and profiles
    #[arg(short, long = "kmer-size", value_name = "K", default_value_t = 3, value_parser = parse_positive, help_heading = "Analysis")]
    pub kmer_size: usize,

    /// Number of k-means clusters
    #[arg(short, long, value_name = "K", default_value_t = 3, value_parser = parse_positive, help_heading = "Clustering")]
    pub clusters: usize,

    /// Motif to search for (case-insensitive)
    #[arg(short, long, value_name = "PATTERN", default_value = "ATAGC", help_heading = "Analysis")]
    pub motif: String,

    /// Number of k-mers shown in the frequency chart
    #[arg(long = "top-kmers", value_name = "N", default_value_t = 10, value_parser = parse_positive, help_heading = "Output")]
    pub top_kmers: usize,

    /// Seed for k-means initialization
    #[arg(long, value_name = "SEED", default_value_t = 42, help_heading = "Clustering")]
    pub seed: u64,

    /// Append normalized k-mer profiles to the clustering features
    #[arg(long = "kmer-features", help_heading = "Clustering")]
    pub kmer_features: bool,

    /// Column scaling before clustering: standard, min-max or none
    #[arg(long, value_name = "METHOD", default_value = "standard", help_heading = "Clustering")]
    pub scaling: Scaling,

    /// Debug-level logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["genomic-insights"]).unwrap();
        assert_eq!(args.input, PathBuf::from("data/sequences.fasta"));
        assert_eq!(args.output_dir, PathBuf::from("results"));
        assert_eq!(args.kmer_size, 3);
        assert_eq!(args.clusters, 3);
        assert_eq!(args.motif, "ATAGC");
        assert_eq!(args.top_kmers, 10);
        assert_eq!(args.seed, 42);
        assert_eq!(args.scaling, Scaling::Standard);
        assert!(!args.kmer_features);
    }

    #[test]
    fn rejects_zero_k() {
        assert!(Args::try_parse_from(["genomic-insights", "-k", "0"]).is_err());
        assert!(Args::try_parse_from(["genomic-insights", "--clusters", "0"]).is_err());
    }

    #[test]
    fn parses_scaling() {
        let args = Args::try_parse_from(["genomic-insights", "--scaling", "min-max"]).unwrap();
        assert_eq!(args.scaling, Scaling::MinMax);
        assert!(Args::try_parse_from(["genomic-insights", "--scaling", "log"]).is_err());
    }

    #[test]
    fn verbose_conflicts_with_quiet() {
        assert!(Args::try_parse_from(["genomic-insights", "-v", "-q"]).is_err());
    }
}
