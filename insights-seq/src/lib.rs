//! Sequence loading and per-sequence feature extraction for Genomic Insights.
//!
//! - **Loader**: [`read_fasta`] into an ordered [`SequenceSet`]
//! - **Sequences**: validated uppercase [`DnaSequence`]
//! - **Composition**: [`gc_content`], [`at_content`], [`BaseCounts`]
//! - **K-mers**: zero-allocation [`KmerIter`] and [`kmer_frequencies`]
//! - **Motifs**: overlapping literal search via [`find_motif`] / [`scan_motif`]
//!
//! # Example
//!
//! ```
//! use insights_seq::{find_motif, parse_fasta_str};
//!
//! let set = parse_fasta_str(">A\nGGGG\n>B\nAAAA\n").unwrap();
//! assert_eq!(set.get("A").unwrap().seq.gc_content().unwrap(), 100.0);
//! assert_eq!(set.get("B").unwrap().seq.gc_content().unwrap(), 0.0);
//!
//! assert_eq!(find_motif(b"ATATAT", b"ATA"), vec![0, 2]);
//! ```

pub mod alphabet;
pub mod fasta;
pub mod kmer;
pub mod motif;
pub mod seq;
pub mod types;

pub use alphabet::DnaAlphabet;
pub use fasta::{
    parse_fasta_stats, parse_fasta_str, read_fasta, read_fasta_from_reader, FastaStats,
    SequenceRecord, SequenceSet,
};
pub use kmer::{index_to_kmer, kmer_frequencies, KmerCounts, KmerIter, MAX_PROFILE_K};
pub use motif::{find_motif, scan_motif, MotifHit};
pub use seq::DnaSequence;
pub use types::{at_content, gc_content, BaseCounts};
