//! Feature extraction and clustering for the Genomic Insights toolkit.
//!
//! - **Features**: [`FeatureVector`]: GC content, length, optional k-mer profile
//! - **Scaling**: z-score or min-max per column ([`Scaling`])
//! - **Clustering**: seeded k-means++ / Lloyd ([`kmeans`], [`cluster_sequences`])
//! - **Evaluation**: silhouette coefficient
//! - **Classification**: random forest over GC, AT and k-mer profile
//!   ([`SequenceClassifier`], [`RandomForest`])
//!
//! # Example
//!
//! ```
//! use insights_ml::{cluster_sequences, extract_features, ClusterConfig, FeatureOptions, KMeansConfig};
//! use insights_seq::parse_fasta_str;
//!
//! let set = parse_fasta_str(">g1\nGGCCGC\n>g2\nGCGCGG\n>a1\nATATTAATATTA\n>a2\nTTATAATATAAT\n").unwrap();
//! let features = extract_features(&set, &FeatureOptions::default()).unwrap();
//! let config = ClusterConfig {
//!     kmeans: KMeansConfig { n_clusters: 2, seed: Some(42), ..Default::default() },
//!     ..Default::default()
//! };
//! let clusters = cluster_sequences(&features, &config).unwrap();
//! assert_eq!(clusters.label_of("g1"), clusters.label_of("g2"));
//! assert_ne!(clusters.label_of("g1"), clusters.label_of("a1"));
//! ```

pub mod classify;
pub mod cluster;
pub mod distance;
pub mod evaluate;
pub mod features;
pub mod forest;
pub mod normalize;
mod rng;

pub use classify::{composition_features, ClassifierConfig, SequenceClassifier, TrainingReport};
pub use cluster::{cluster_sequences, kmeans, ClusterAssignment, ClusterConfig, KMeansConfig, KMeansResult};
pub use distance::euclidean;
pub use evaluate::{silhouette_samples, silhouette_score};
pub use features::{extract_features, feature_matrix, FeatureOptions, FeatureVector};
pub use forest::{ForestConfig, RandomForest};
pub use normalize::{min_max_columns, z_score_columns, Scaling, StandardScaler};
