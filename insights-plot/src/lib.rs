//! Chart rendering for Genomic Insights results.
//!
//! Produces standalone SVG documents:
//!
//! - [`gc_content_chart`]: GC percentage per sequence
//! - [`kmer_frequency_chart`]: the most common k-mers
//! - [`cluster_scatter`]: GC content vs length, colored by cluster

pub mod charts;
pub mod svg;

pub use charts::{cluster_scatter, gc_content_chart, kmer_frequency_chart, write_chart, ChartStyle, PALETTE};
pub use svg::SvgDocument;
