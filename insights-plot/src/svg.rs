//! Minimal SVG document builder.
//!
//! Elements are appended as text in drawing order; nothing is retained
//! besides the output buffer.

use std::fmt::Write;

/// An SVG document under construction.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    buf: String,
}

impl SvgDocument {
    /// Start a document with the given pixel size and a white background.
    pub fn new(width: f64, height: f64) -> Self {
        let mut buf = String::new();
        buf.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            buf,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {w} {h}\" width=\"{w}\" height=\"{h}\" font-family=\"sans-serif\">",
            w = width,
            h = height
        );
        let _ = writeln!(buf, "<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>");
        Self { buf }
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &str) {
        let _ = writeln!(
            self.buf,
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
            x, y, width, height, fill
        );
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str) {
        let _ = writeln!(
            self.buf,
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"1\"/>",
            x1, y1, x2, y2, stroke
        );
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) {
        let _ = writeln!(
            self.buf,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\" fill-opacity=\"0.85\" stroke=\"#333333\" stroke-width=\"0.5\"/>",
            cx, cy, r, fill
        );
    }

    /// Text anchored at `(x, y)`. `anchor` is `start`, `middle` or `end`.
    /// A non-zero `rotate` turns the label around its anchor point.
    pub fn text(&mut self, x: f64, y: f64, size: f64, anchor: &str, rotate: f64, content: &str) {
        let transform = if rotate != 0.0 {
            format!(" transform=\"rotate({:.1} {:.2} {:.2})\"", rotate, x, y)
        } else {
            String::new()
        };
        let _ = writeln!(
            self.buf,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{:.1}\" text-anchor=\"{}\"{}>{}</text>",
            x,
            y,
            size,
            anchor,
            transform,
            escape(content)
        );
    }

    /// Close the root element and return the document text.
    pub fn finish(mut self) -> String {
        self.buf.push_str("</svg>\n");
        self.buf
    }
}

/// Escape XML special characters in text content.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
