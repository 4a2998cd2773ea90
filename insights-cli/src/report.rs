//! `summary.txt` and `report.json`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use insights_core::Summarizable;
use serde::Serialize;

use crate::pipeline::Analysis;
use crate::settings::Settings;

pub const SUMMARY_FILE: &str = "summary.txt";
pub const JSON_FILE: &str = "report.json";

/// Machine-readable report: effective settings plus every result.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub version: &'static str,
    pub settings: &'a Settings,
    #[serde(flatten)]
    pub analysis: &'a Analysis,
    /// Chart files written alongside the report.
    pub charts: Vec<String>,
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

/// Render the human-readable summary.
pub fn render_summary(analysis: &Analysis, settings: &Settings) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = write_summary(&mut out, analysis, settings);
    out
}

fn write_summary(out: &mut String, analysis: &Analysis, settings: &Settings) -> std::fmt::Result {
    writeln!(out, "Genomic Insights summary")?;
    writeln!(out, "========================")?;
    writeln!(out, "Input: {}", settings.input.display())?;
    writeln!(out, "{}", analysis.stats.summary())?;
    writeln!(out)?;

    let width = analysis.sequences.iter().map(|s| s.id.len()).max().unwrap_or(0);
    writeln!(out, "GC content")?;
    for s in &analysis.sequences {
        writeln!(out, "  {:<width$}  {:>6.2}%  ({} bp)", s.id, s.gc_content, s.length)?;
    }
    writeln!(out)?;

    writeln!(out, "Motif {} ({} hits)", analysis.motif.pattern, analysis.motif.hits.len())?;
    for s in &analysis.sequences {
        if s.motif_starts.is_empty() {
            writeln!(out, "  {:<width$}  none", s.id)?;
        } else {
            let starts: Vec<String> = s.motif_starts.iter().map(usize::to_string).collect();
            writeln!(out, "  {:<width$}  {}", s.id, starts.join(", "))?;
        }
    }
    writeln!(out)?;

    let kmers = &analysis.kmers;
    writeln!(
        out,
        "Top {} {}-mers ({} total, {} distinct)",
        kmers.top.len(),
        kmers.k,
        kmers.total,
        kmers.distinct
    )?;
    for e in &kmers.top {
        writeln!(out, "  {}  {}", e.kmer, e.count)?;
    }
    writeln!(out)?;

    writeln!(out, "Clustering ({:?} scaling)", settings.cluster.scaling)?;
    writeln!(out, "  {}", analysis.clusters.summary())?;
    for label in 0..analysis.clusters.n_clusters {
        writeln!(out, "  cluster {}: {}", label, analysis.clusters.members(label).join(", "))?;
    }
    Ok(())
}

/// Write both report files into the output directory.
pub fn write_reports(analysis: &Analysis, settings: &Settings, charts: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let dir: &Path = &settings.output_dir;

    let summary_path = dir.join(SUMMARY_FILE);
    fs::write(&summary_path, render_summary(analysis, settings))
        .with_context(|| format!("writing {}", summary_path.display()))?;

    let report = Report {
        version: env!("CARGO_PKG_VERSION"),
        settings,
        analysis,
        charts: file_names(charts),
    };
    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    let json_path = dir.join(JSON_FILE);
    fs::write(&json_path, json).with_context(|| format!("writing {}", json_path.display()))?;

    Ok(vec![summary_path, json_path])
}
