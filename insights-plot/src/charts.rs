//! Bar and scatter charts rendered to SVG text.

use std::fs;
use std::path::Path;

use insights_core::{InsightsError, Result};
use tracing::info;

use crate::svg::SvgDocument;

/// Cluster colors, cycled when there are more clusters than entries.
pub const PALETTE: &[&str] = &[
    "#440154", "#3b528b", "#21918c", "#5ec962", "#fde725", "#e76f51", "#8d99ae", "#d62828",
];

const BAR_FILL: &str = "#4c72b0";
const AXIS: &str = "#333333";
const GRID: &str = "#dddddd";

/// Canvas size and margins shared by every chart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartStyle {
    pub width: f64,
    pub height: f64,
    /// Space reserved for the title and axis labels.
    pub margin: f64,
    pub font_size: f64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 480.0,
            margin: 70.0,
            font_size: 12.0,
        }
    }
}

impl ChartStyle {
    fn plot_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    fn plot_height(&self) -> f64 {
        self.height - 2.0 * self.margin
    }
}

/// Bar chart of GC content (percent) per sequence.
pub fn gc_content_chart(ids: &[&str], gc: &[f64], style: &ChartStyle) -> Result<String> {
    if ids.len() != gc.len() {
        return Err(InsightsError::InvalidInput(format!(
            "{} sequence ids but {} GC values",
            ids.len(),
            gc.len()
        )));
    }
    bar_chart(
        "GC Content in Sequences",
        "Sequence ID",
        "GC Content (%)",
        ids,
        gc,
        Some(100.0),
        style,
    )
}

/// Bar chart of the most common k-mers, in the order given.
pub fn kmer_frequency_chart(top: &[(String, usize)], k: usize, style: &ChartStyle) -> Result<String> {
    let labels: Vec<&str> = top.iter().map(|(kmer, _)| kmer.as_str()).collect();
    let counts: Vec<f64> = top.iter().map(|&(_, c)| c as f64).collect();
    bar_chart(
        &format!("Top {} Most Common {}-mers", top.len(), k),
        "k-mer",
        "Frequency",
        &labels,
        &counts,
        None,
        style,
    )
}

/// Scatter of GC content against length, colored by cluster label.
pub fn cluster_scatter(points: &[(f64, f64)], labels: &[usize], style: &ChartStyle) -> Result<String> {
    if points.is_empty() {
        return Err(InsightsError::InvalidInput("no points to plot".into()));
    }
    if points.len() != labels.len() {
        return Err(InsightsError::InvalidInput(format!(
            "{} points but {} labels",
            points.len(),
            labels.len()
        )));
    }

    let (x_min, x_max) = padded_range(points.iter().map(|p| p.0));
    let (y_min, y_max) = padded_range(points.iter().map(|p| p.1));
    let (pw, ph, m) = (style.plot_width(), style.plot_height(), style.margin);
    let sx = |x: f64| m + (x - x_min) / (x_max - x_min) * pw;
    let sy = |y: f64| m + ph - (y - y_min) / (y_max - y_min) * ph;

    let mut doc = SvgDocument::new(style.width, style.height);
    frame(&mut doc, "Sequence Clusters", "GC Content (%)", "Sequence Length", style);
    y_ticks(&mut doc, y_min, y_max, style);
    for i in 0..=4 {
        let v = x_min + (x_max - x_min) * i as f64 / 4.0;
        let x = sx(v);
        doc.line(x, m + ph, x, m + ph + 5.0, AXIS);
        doc.text(x, m + ph + 18.0, style.font_size, "middle", 0.0, &format_tick(v));
    }

    for (&(x, y), &label) in points.iter().zip(labels) {
        doc.circle(sx(x), sy(y), 5.0, PALETTE[label % PALETTE.len()]);
    }

    let mut distinct: Vec<usize> = labels.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    for (row, label) in distinct.iter().enumerate() {
        let y = m + 14.0 + row as f64 * 16.0;
        let x = m + pw - 90.0;
        doc.circle(x, y - 4.0, 5.0, PALETTE[label % PALETTE.len()]);
        doc.text(x + 10.0, y, style.font_size, "start", 0.0, &format!("cluster {}", label));
    }

    Ok(doc.finish())
}

/// Write an SVG document to `path`, creating parent directories.
pub fn write_chart(path: impl AsRef<Path>, svg: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, svg)?;
    info!(path = %path.display(), "wrote chart");
    Ok(())
}

fn bar_chart(
    title: &str,
    x_label: &str,
    y_label: &str,
    labels: &[&str],
    values: &[f64],
    y_max: Option<f64>,
    style: &ChartStyle,
) -> Result<String> {
    if values.is_empty() {
        return Err(InsightsError::InvalidInput("no values to plot".into()));
    }
    if let Some(v) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(InsightsError::InvalidInput(format!(
            "bar values must be finite and non-negative, got {}",
            v
        )));
    }

    let top = y_max.unwrap_or_else(|| values.iter().copied().fold(0.0, f64::max));
    let top = if top <= 0.0 { 1.0 } else { top };
    let (pw, ph, m) = (style.plot_width(), style.plot_height(), style.margin);

    let mut doc = SvgDocument::new(style.width, style.height);
    frame(&mut doc, title, x_label, y_label, style);
    y_ticks(&mut doc, 0.0, top, style);

    let slot = pw / values.len() as f64;
    let bar = slot * 0.8;
    for (i, (&label, &v)) in labels.iter().zip(values).enumerate() {
        let h = v / top * ph;
        let x = m + i as f64 * slot + (slot - bar) / 2.0;
        doc.rect(x, m + ph - h, bar, h, BAR_FILL);
        let cx = x + bar / 2.0;
        doc.text(cx, m + ph + 14.0, style.font_size * 0.9, "end", -45.0, label);
    }
    Ok(doc.finish())
}

/// Title, axis lines and axis labels.
fn frame(doc: &mut SvgDocument, title: &str, x_label: &str, y_label: &str, style: &ChartStyle) {
    let (pw, ph, m) = (style.plot_width(), style.plot_height(), style.margin);
    doc.text(style.width / 2.0, m / 2.0, style.font_size * 1.4, "middle", 0.0, title);
    doc.line(m, m + ph, m + pw, m + ph, AXIS);
    doc.line(m, m, m, m + ph, AXIS);
    doc.text(m + pw / 2.0, style.height - 8.0, style.font_size, "middle", 0.0, x_label);
    doc.text(16.0, m + ph / 2.0, style.font_size, "middle", -90.0, y_label);
}

fn y_ticks(doc: &mut SvgDocument, lo: f64, hi: f64, style: &ChartStyle) {
    let (pw, ph, m) = (style.plot_width(), style.plot_height(), style.margin);
    for i in 0..=4 {
        let v = lo + (hi - lo) * i as f64 / 4.0;
        let y = m + ph - ph * i as f64 / 4.0;
        if i > 0 {
            doc.line(m, y, m + pw, y, GRID);
        }
        doc.text(m - 6.0, y + 4.0, style.font_size, "end", 0.0, &format_tick(v));
    }
}

/// Min/max of the values widened by 5% so edge points are not clipped.
/// A constant series gets a unit-wide window around it.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if hi - lo == 0.0 {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

fn format_tick(v: f64) -> String {
    if v.abs() >= 100.0 || v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}
