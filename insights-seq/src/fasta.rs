//! FASTA loading and file-level statistics.
//!
//! Records are read with `needletail` (gzip/bzip2/xz input is decoded
//! transparently) and validated into a [`SequenceSet`]. Loading is
//! all-or-nothing: the first malformed record aborts the whole load.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use insights_core::{Annotated, InsightsError, Result, Sequence, Summarizable};
use needletail::parse_fastx_reader;
use tracing::{debug, info};

use crate::seq::DnaSequence;
use crate::types::BaseCounts;

/// One FASTA record: header-derived identifier plus validated sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceRecord {
    /// First whitespace-delimited token of the header line.
    pub id: String,
    /// Remainder of the header line, if any.
    pub description: Option<String>,
    pub seq: DnaSequence,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, seq: DnaSequence) -> Self {
        Self {
            id: id.into(),
            description: None,
            seq,
        }
    }

    /// Build a record from a raw header (without the leading `>`) and
    /// sequence bytes.
    pub fn from_header(header: &[u8], seq: &[u8]) -> Result<Self> {
        let header = String::from_utf8_lossy(header);
        let header = header.trim();
        let (id, description) = match header.split_once(char::is_whitespace) {
            Some((id, rest)) => {
                let rest = rest.trim();
                (id, (!rest.is_empty()).then(|| rest.to_string()))
            }
            None => (header, None),
        };
        if id.is_empty() {
            return Err(InsightsError::Parse("record with empty header".into()));
        }
        if seq.is_empty() {
            return Err(InsightsError::Parse(format!(
                "record '{}' has no sequence",
                id
            )));
        }
        let seq = DnaSequence::new(seq)
            .map_err(|e| InsightsError::Parse(format!("record '{}': {}", id, e)))?;
        Ok(Self {
            id: id.to_string(),
            description,
            seq,
        })
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

impl Annotated for SequenceRecord {
    fn name(&self) -> &str {
        &self.id
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Sequence for SequenceRecord {
    fn as_bytes(&self) -> &[u8] {
        self.seq.as_bytes()
    }
}

/// Ordered identifier → record mapping. Iteration follows file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceSet {
    records: Vec<SequenceRecord>,
    index: HashMap<String, usize>,
}

impl SequenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Identifiers must be unique within the set.
    pub fn insert(&mut self, record: SequenceRecord) -> Result<()> {
        if self.index.contains_key(&record.id) {
            return Err(InsightsError::Parse(format!(
                "duplicate sequence identifier '{}'",
                record.id
            )));
        }
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Look up a record by identifier.
    pub fn get(&self, id: &str) -> Option<&SequenceRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SequenceRecord> {
        self.records.iter()
    }

    /// Identifiers in file order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    pub fn records(&self) -> &[SequenceRecord] {
        &self.records
    }

    /// Aggregate statistics over every record.
    pub fn stats(&self) -> FastaStats {
        let mut stats = FastaStats::default();
        let mut gc_count = 0u64;
        for record in &self.records {
            let len = record.len() as u64;
            stats.sequence_count += 1;
            stats.total_bases += len;
            gc_count += BaseCounts::from_bytes(&record.seq).gc() as u64;
            stats.min_length = if stats.sequence_count == 1 {
                len
            } else {
                stats.min_length.min(len)
            };
            stats.max_length = stats.max_length.max(len);
        }
        if stats.total_bases > 0 {
            stats.gc_content = gc_count as f64 / stats.total_bases as f64 * 100.0;
        }
        if stats.sequence_count > 0 {
            stats.avg_length = stats.total_bases as f64 / stats.sequence_count as f64;
        }
        stats
    }
}

impl<'a> IntoIterator for &'a SequenceSet {
    type Item = &'a SequenceRecord;
    type IntoIter = std::slice::Iter<'a, SequenceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Summary statistics for a loaded FASTA file.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FastaStats {
    pub sequence_count: u64,
    pub total_bases: u64,
    /// Pooled GC percentage over all bases.
    pub gc_content: f64,
    pub avg_length: f64,
    pub min_length: u64,
    pub max_length: u64,
}

impl Summarizable for FastaStats {
    fn summary(&self) -> String {
        format!(
            "{} sequences, {} bp total, GC {:.2}%, length mean {:.1} (min {}, max {})",
            self.sequence_count,
            self.total_bases,
            self.gc_content,
            self.avg_length,
            self.min_length,
            self.max_length,
        )
    }
}

/// Load a FASTA file into a [`SequenceSet`].
///
/// Missing or unreadable paths surface as [`InsightsError::Io`]; malformed
/// content (empty file, no `>` headers, FASTQ input, empty records, bytes
/// outside `ACGTN`, duplicate identifiers) as [`InsightsError::Parse`].
pub fn read_fasta(path: impl AsRef<Path>) -> Result<SequenceSet> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let set = read_fasta_from_reader(file)?;
    info!(
        path = %path.display(),
        sequences = set.len(),
        "read sequences from FASTA file"
    );
    Ok(set)
}

/// Parse FASTA records from any reader. Same contract as [`read_fasta`].
///
/// Blank lines before the first header are skipped and whitespace inside
/// sequence lines is dropped.
pub fn read_fasta_from_reader<R: Read + Send>(reader: R) -> Result<SequenceSet> {
    let mut reader = BufReader::new(reader);
    skip_leading_whitespace(&mut reader)?;
    let mut fastx = parse_fastx_reader(reader).map_err(|e| InsightsError::Parse(e.to_string()))?;
    let mut set = SequenceSet::new();

    while let Some(record) = fastx.next() {
        let record = record.map_err(|e| InsightsError::Parse(e.to_string()))?;
        if record.qual().is_some() {
            return Err(InsightsError::Parse(
                "expected FASTA input, found a FASTQ record".into(),
            ));
        }
        let seq: Vec<u8> = record
            .seq()
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        let parsed = SequenceRecord::from_header(record.id(), &seq)?;
        debug!(id = %parsed.id, length = parsed.len(), "parsed record");
        set.insert(parsed)?;
    }

    if set.is_empty() {
        return Err(InsightsError::Parse("no FASTA records found".into()));
    }
    Ok(set)
}

fn skip_leading_whitespace<R: BufRead>(reader: &mut R) -> Result<()> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(());
        }
        let n = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
        let reached_content = n < buf.len();
        reader.consume(n);
        if reached_content {
            return Ok(());
        }
    }
}

/// Parse FASTA text held in memory.
pub fn parse_fasta_str(text: &str) -> Result<SequenceSet> {
    read_fasta_from_reader(text.as_bytes())
}

/// Load a FASTA file and compute summary statistics.
pub fn parse_fasta_stats(path: impl AsRef<Path>) -> Result<FastaStats> {
    Ok(read_fasta(path)?.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_fasta(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn two_records_gc() {
        let file = write_fasta(">A\nGGGG\n>B\nAAAA\n");
        let set = read_fasta(file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("A").unwrap().seq.gc_content().unwrap(), 100.0);
        assert_eq!(set.get("B").unwrap().seq.gc_content().unwrap(), 0.0);
    }

    #[test]
    fn multiline_records_are_joined_and_uppercased() {
        let set = parse_fasta_str(">seq1 first record\nacgt\nACGT\n\n>seq2\nGG\nCC\n").unwrap();
        let rec = set.get("seq1").unwrap();
        assert_eq!(rec.seq.as_str(), "ACGTACGT");
        assert_eq!(rec.description(), Some("first record"));
        assert_eq!(set.get("seq2").unwrap().seq.as_str(), "GGCC");
    }

    #[test]
    fn preserves_file_order() {
        let set = parse_fasta_str(">z\nA\n>a\nC\n>m\nG\n").unwrap();
        let ids: Vec<_> = set.ids().collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn crlf_line_endings() {
        let set = parse_fasta_str(">x\r\nAC\r\nGT\r\n").unwrap();
        assert_eq!(set.get("x").unwrap().seq.as_str(), "ACGT");
    }

    #[test]
    fn blank_lines_before_first_header_are_skipped() {
        let set = parse_fasta_str("\n\n  \r\n>a\nACGT\n").unwrap();
        assert_eq!(set.get("a").unwrap().seq.as_str(), "ACGT");
    }

    #[test]
    fn spaces_inside_sequence_lines_are_dropped() {
        let set = parse_fasta_str(">a\nACGT \nGG\tCC\n").unwrap();
        assert_eq!(set.get("a").unwrap().seq.as_str(), "ACGTGGCC");
    }

    #[test]
    fn whitespace_only_input_is_parse_error() {
        let err = parse_fasta_str("\n   \n").unwrap_err();
        assert!(matches!(err, InsightsError::Parse(_)), "{err}");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_fasta("/nonexistent/file.fasta").unwrap_err();
        assert!(matches!(err, InsightsError::Io(_)), "{err}");
    }

    #[test]
    fn empty_file_is_parse_error() {
        let file = write_fasta("");
        let err = read_fasta(file.path()).unwrap_err();
        assert!(matches!(err, InsightsError::Parse(_)), "{err}");
    }

    #[test]
    fn no_header_is_parse_error() {
        let err = parse_fasta_str("ACGTACGT\n").unwrap_err();
        assert!(matches!(err, InsightsError::Parse(_)), "{err}");
    }

    #[test]
    fn fastq_is_rejected() {
        let err = parse_fasta_str("@r1\nACGT\n+\nIIII\n").unwrap_err();
        assert!(matches!(err, InsightsError::Parse(_)), "{err}");
    }

    #[test]
    fn empty_sequence_is_parse_error() {
        let err = parse_fasta_str(">a\n>b\nACGT\n").unwrap_err();
        assert!(err.to_string().contains("'a'"), "{err}");
    }

    #[test]
    fn invalid_base_aborts_whole_load() {
        let err = parse_fasta_str(">good\nACGT\n>bad\nACXT\n").unwrap_err();
        match err {
            InsightsError::Parse(msg) => assert!(msg.contains("bad"), "{msg}"),
            other => panic!("expected parse error, got {other}"),
        }
    }

    #[test]
    fn duplicate_identifier_is_parse_error() {
        let err = parse_fasta_str(">a\nACGT\n>a\nGGGG\n").unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{err}");
    }

    #[test]
    fn header_parsing() {
        let rec = SequenceRecord::from_header(b"chr1  assembled\tcontig ", b"acg").unwrap();
        assert_eq!(rec.id, "chr1");
        assert_eq!(rec.description.as_deref(), Some("assembled\tcontig"));
        assert_eq!(rec.name(), "chr1");
        assert!(SequenceRecord::from_header(b"   ", b"ACG").is_err());
    }

    #[test]
    fn stats_over_records() {
        let file = write_fasta(">seq1\nATCGATCG\n>seq2\nGCGCGCGC\n>seq3\nAT\n");
        let stats = parse_fasta_stats(file.path()).unwrap();
        assert_eq!(stats.sequence_count, 3);
        assert_eq!(stats.total_bases, 18);
        assert!((stats.gc_content - 12.0 / 18.0 * 100.0).abs() < 1e-9);
        assert!((stats.avg_length - 6.0).abs() < 1e-9);
        assert_eq!((stats.min_length, stats.max_length), (2, 8));
        assert!(stats.summary().starts_with("3 sequences, 18 bp total"));
    }

    #[test]
    fn empty_set_stats_are_zero() {
        let stats = SequenceSet::new().stats();
        assert_eq!(stats, FastaStats::default());
    }
}
