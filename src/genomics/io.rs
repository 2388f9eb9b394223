//! Input adapters: the reference FASTA and the variant table.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines, Read};
use std::path::Path;

use bio::io::fasta;
use thiserror::Error;

use super::{ChainError, VariantRow};

/// Header lines preceding the data rows of a variant table.
pub const N_HEADER: usize = 2;

const ID_COLUMN: usize = 0;
const COUNT_COLUMN: usize = 2;
const CHAIN_COLUMN: usize = 5;

/// Failure to obtain the reference sequence.
#[derive(Debug, Error)]
pub enum ReferenceLoadError {
    /// Underlying I/O failure.
    #[error("failed to read reference: {0}")]
    Io(#[from] io::Error),

    /// Input held no FASTA record.
    #[error("reference contains no FASTA record")]
    Empty,

    /// First record has no bases.
    #[error("reference record '{0}' has an empty sequence")]
    EmptySequence(String),

    /// Sequence bytes are not valid text.
    #[error("reference record '{0}' is not valid ASCII")]
    NotAscii(String),
}

/// Contig name and upper-cased sequence of a single-record reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSequence {
    /// Record identifier (header text up to the first whitespace).
    pub contig: String,
    /// Sequence with line breaks removed.
    pub sequence: String,
}

/// Read the first FASTA record from `reader`.
pub fn read_reference<R: Read>(reader: R) -> Result<ReferenceSequence, ReferenceLoadError> {
    let mut records = fasta::Reader::new(reader).records();
    let record = records.next().ok_or(ReferenceLoadError::Empty)??;

    let contig = record.id().to_string();
    if record.seq().is_empty() {
        return Err(ReferenceLoadError::EmptySequence(contig));
    }
    if !record.seq().is_ascii() {
        return Err(ReferenceLoadError::NotAscii(contig));
    }
    let sequence = String::from_utf8_lossy(record.seq()).to_ascii_uppercase();
    Ok(ReferenceSequence { contig, sequence })
}

/// Open and read the first FASTA record of the file at `path`.
pub fn load_reference(path: impl AsRef<Path>) -> Result<ReferenceSequence, ReferenceLoadError> {
    let file = File::open(path.as_ref())?;
    read_reference(BufReader::new(file))
}

/// A variant-table line that could not be turned into a [`VariantRow`].
#[derive(Debug, Error)]
pub enum RowError {
    /// Underlying I/O failure.
    #[error("line {line}: read failed: {source}")]
    Io {
        /// 1-based line number.
        line: usize,
        /// I/O error.
        #[source]
        source: io::Error,
    },

    /// Line has fewer columns than the two anchors require.
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    TooFewFields {
        /// 1-based line number.
        line: usize,
        /// Minimum column count.
        expected: usize,
        /// Columns present.
        found: usize,
    },

    /// Count column is not a non-negative integer.
    #[error("line {line}: count '{value}' is not numeric")]
    InvalidCount {
        /// 1-based line number.
        line: usize,
        /// Offending text.
        value: String,
    },

    /// K-mer chain breaks the walk invariants.
    #[error("line {line}: {source}")]
    Chain {
        /// 1-based line number.
        line: usize,
        /// Invariant violated.
        #[source]
        source: ChainError,
    },
}

impl RowError {
    /// Line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            RowError::Io { line, .. }
            | RowError::TooFewFields { line, .. }
            | RowError::InvalidCount { line, .. }
            | RowError::Chain { line, .. } => *line,
        }
    }
}

/// Parse one whitespace-delimited data line.
///
/// Columns: 0 = id, 2 = count, 5.. = pre-anchor, deviants, post-anchor.
pub fn parse_variant_row(line: &str, line_no: usize, k: usize) -> Result<VariantRow, RowError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let expected = CHAIN_COLUMN + 2;
    if fields.len() < expected {
        return Err(RowError::TooFewFields {
            line: line_no,
            expected,
            found: fields.len(),
        });
    }

    let count = fields[COUNT_COLUMN]
        .parse::<u64>()
        .map_err(|_| RowError::InvalidCount {
            line: line_no,
            value: fields[COUNT_COLUMN].to_string(),
        })?;
    let kmer_chain = fields[CHAIN_COLUMN..].iter().map(|s| s.to_string()).collect();

    VariantRow::new(fields[ID_COLUMN], count, kmer_chain, k).map_err(|source| RowError::Chain {
        line: line_no,
        source,
    })
}

/// Streaming reader over the data rows of a variant table.
///
/// Header lines are skipped up front, blank lines are ignored, and every
/// other line yields either a row or the reason it was rejected.
#[derive(Debug)]
pub struct VariantTableReader<R> {
    lines: Lines<R>,
    k: usize,
    line_no: usize,
    header_lines: usize,
}

impl VariantTableReader<BufReader<File>> {
    /// Open the table at `path`.
    pub fn from_path(path: impl AsRef<Path>, k: usize, header_lines: usize) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file), k, header_lines))
    }
}

impl<R: BufRead> VariantTableReader<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R, k: usize, header_lines: usize) -> Self {
        Self {
            lines: reader.lines(),
            k,
            line_no: 0,
            header_lines,
        }
    }
}

impl<R: BufRead> Iterator for VariantTableReader<R> {
    type Item = Result<VariantRow, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(RowError::Io {
                        line: self.line_no,
                        source,
                    }))
                }
            };
            if self.line_no <= self.header_lines || line.trim().is_empty() {
                continue;
            }
            return Some(parse_variant_row(&line, self.line_no, self.k));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_first_record_and_uppercases() {
        let fasta = ">CONTIG_NAME some description\natcgaa\nTTTGAATGTA\n>second\nGGGG\n";
        let reference = read_reference(Cursor::new(fasta)).unwrap();
        assert_eq!(reference.contig, "CONTIG_NAME");
        assert_eq!(reference.sequence, "ATCGAATTTGAATGTA");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            read_reference(Cursor::new("")),
            Err(ReferenceLoadError::Empty)
        ));
    }

    #[test]
    fn parses_table_columns() {
        let row = parse_variant_row("v1\tx\t33\tname\t4\tAAA\tAAC\tACC\tCCC", 3, 3).unwrap();
        assert_eq!(row.id, "v1");
        assert_eq!(row.count, 33);
        assert_eq!(row.kmer_chain, vec!["AAA", "AAC", "ACC", "CCC"]);
    }

    #[test]
    fn short_line_is_rejected() {
        let err = parse_variant_row("v1\tx\t33\tname\t4\tAAA", 7, 3).unwrap_err();
        assert!(matches!(
            err,
            RowError::TooFewFields {
                line: 7,
                expected: 7,
                found: 6
            }
        ));
    }

    #[test]
    fn non_numeric_count_is_rejected() {
        let err = parse_variant_row("v1\tx\tmany\tname\t4\tAAA\tAAC", 4, 3).unwrap_err();
        assert!(matches!(err, RowError::InvalidCount { line: 4, .. }));
        assert_eq!(err.line(), 4);
    }

    #[test]
    fn reader_skips_header_and_blank_lines() {
        let table = "header one\nheader two\n\
                     a\t.\t1\t.\t.\tAAA\tAAC\tACC\n\
                     \n\
                     b\t.\tx\t.\t.\tAAA\tAAC\n\
                     c\t.\t2\t.\t.\tCCC\tCCG\n";
        let rows: Vec<_> = VariantTableReader::new(Cursor::new(table), 3, N_HEADER).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].as_ref().unwrap().id, "a");
        assert!(matches!(rows[1], Err(RowError::InvalidCount { line: 5, .. })));
        assert_eq!(rows[2].as_ref().unwrap().count, 2);
    }
}
