//! The analysis pipeline: load, extract, search, cluster, render.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use insights_core::Summarizable;
use insights_ml::{cluster_sequences, extract_features, ClusterAssignment, FeatureVector};
use insights_plot::{cluster_scatter, gc_content_chart, kmer_frequency_chart, write_chart};
use insights_seq::{read_fasta, scan_motif, FastaStats, KmerCounts, MotifHit, SequenceSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::report;
use crate::settings::Settings;

pub const GC_CHART: &str = "gc_content.svg";
pub const KMER_CHART: &str = "kmer_frequency.svg";
pub const CLUSTER_CHART: &str = "sequence_clusters.svg";

/// One k-mer and its count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmerEntry {
    pub kmer: String,
    pub count: usize,
}

fn entries(top: Vec<(String, usize)>) -> Vec<KmerEntry> {
    top.into_iter()
        .map(|(kmer, count)| KmerEntry { kmer, count })
        .collect()
}

/// Per-sequence results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceSummary {
    pub id: String,
    pub description: Option<String>,
    pub length: usize,
    pub gc_content: f64,
    pub at_content: f64,
    pub motif_starts: Vec<usize>,
    pub top_kmers: Vec<KmerEntry>,
    pub cluster: usize,
}

/// K-mer counts pooled over every sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmerSummary {
    pub k: usize,
    pub total: usize,
    pub distinct: usize,
    pub top: Vec<KmerEntry>,
}

/// Motif search results over the whole file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifSummary {
    pub pattern: String,
    pub hits: Vec<MotifHit>,
}

/// Everything computed from one sequence set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub stats: FastaStats,
    pub sequences: Vec<SequenceSummary>,
    pub motif: MotifSummary,
    pub kmers: KmerSummary,
    pub clusters: ClusterAssignment,
    #[serde(skip)]
    pub features: Vec<FeatureVector>,
}

/// Run every analysis stage over an already loaded set. No I/O.
pub fn analyze(set: &SequenceSet, settings: &Settings) -> Result<Analysis> {
    let stats = set.stats();
    info!("{}", stats.summary());

    let features = extract_features(set, &settings.features).context("feature extraction failed")?;

    let hits = scan_motif(set, settings.motif.as_bytes());
    info!(motif = %settings.motif, hits = hits.len(), "motif search done");

    let k = settings.kmer_size;
    let mut pooled = KmerCounts::empty(k);
    let mut per_sequence = Vec::with_capacity(set.len());
    for record in set {
        let counts = record
            .seq
            .kmer_frequencies(k)
            .with_context(|| format!("counting {}-mers of '{}'", k, record.id))?;
        pooled.merge(&counts)?;
        per_sequence.push(counts);
    }
    debug!(k, distinct = pooled.distinct(), total = pooled.total(), "pooled k-mer counts");

    let clusters = cluster_sequences(&features, &settings.cluster).context("clustering failed")?;
    info!("{}", clusters.summary());

    let sequences = set
        .iter()
        .zip(&features)
        .zip(per_sequence)
        .zip(&clusters.labels)
        .map(|(((record, fv), counts), (_, label))| -> insights_core::Result<SequenceSummary> {
            let at_content = record.seq.at_content()?;
            Ok(SequenceSummary {
                id: record.id.clone(),
                description: record.description.clone(),
                length: fv.length,
                gc_content: fv.gc_content,
                at_content,
                motif_starts: hits
                    .iter()
                    .filter(|h| h.seq_id == record.id)
                    .map(|h| h.start)
                    .collect(),
                top_kmers: entries(counts.most_common(settings.top_kmers)),
                cluster: *label,
            })
        })
        .collect::<insights_core::Result<Vec<_>>>()?;

    Ok(Analysis {
        stats,
        sequences,
        motif: MotifSummary {
            pattern: settings.motif.clone(),
            hits,
        },
        kmers: KmerSummary {
            k,
            total: pooled.total(),
            distinct: pooled.distinct(),
            top: entries(pooled.most_common(settings.top_kmers)),
        },
        clusters,
        features,
    })
}

/// Render the three charts into the output directory. Returns the paths
/// written. The k-mer chart is skipped when no sequence is at least k long.
pub fn render_charts(analysis: &Analysis, settings: &Settings) -> Result<Vec<PathBuf>> {
    let dir = &settings.output_dir;
    let mut written = Vec::new();

    let ids: Vec<&str> = analysis.sequences.iter().map(|s| s.id.as_str()).collect();
    let gc: Vec<f64> = analysis.sequences.iter().map(|s| s.gc_content).collect();
    let path = dir.join(GC_CHART);
    write_chart(&path, &gc_content_chart(&ids, &gc, &settings.chart)?)
        .with_context(|| format!("writing {}", path.display()))?;
    written.push(path);

    if analysis.kmers.top.is_empty() {
        warn!(k = analysis.kmers.k, "no sequence is long enough for k-mer counting, skipping {}", KMER_CHART);
    } else {
        let top: Vec<(String, usize)> = analysis
            .kmers
            .top
            .iter()
            .map(|e| (e.kmer.clone(), e.count))
            .collect();
        let path = dir.join(KMER_CHART);
        write_chart(&path, &kmer_frequency_chart(&top, analysis.kmers.k, &settings.chart)?)
            .with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }

    let points: Vec<(f64, f64)> = analysis
        .features
        .iter()
        .map(|fv| (fv.gc_content, fv.length as f64))
        .collect();
    let labels: Vec<usize> = analysis.clusters.labels.iter().map(|&(_, l)| l).collect();
    let path = dir.join(CLUSTER_CHART);
    write_chart(&path, &cluster_scatter(&points, &labels, &settings.chart)?)
        .with_context(|| format!("writing {}", path.display()))?;
    written.push(path);

    Ok(written)
}

/// Load the input file and run the whole pipeline, writing charts and
/// reports into `settings.output_dir`.
pub fn run(settings: &Settings) -> Result<Analysis> {
    info!(input = %settings.input.display(), "loading sequences");
    let set = read_fasta(&settings.input)
        .with_context(|| format!("failed to load {}", settings.input.display()))?;

    let analysis = analyze(&set, settings)?;

    fs::create_dir_all(&settings.output_dir)
        .with_context(|| format!("creating output directory {}", settings.output_dir.display()))?;
    let mut written = render_charts(&analysis, settings)?;
    written.extend(report::write_reports(&analysis, settings, &written)?);

    for path in &written {
        info!(path = %path.display(), "wrote");
    }
    Ok(analysis)
}
