//! Query structures over a single-contig reference genome.
//!
//! Two views are kept over the same sequence: a windowed table answering
//! "where does this k-mer occur" and a contiguous accessor answering "what
//! bases lie in this interval". Both are built once and are read-only
//! afterwards, so they can be shared across worker threads without locking.

use std::sync::Arc;

use fxhash::FxHashMap;
use thiserror::Error;

use crate::genomics::Interval;

/// Errors raised while building or querying the reference.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    /// K-mer length is zero or longer than the sequence.
    #[error("invalid k-mer length {k} for reference of length {len}")]
    InvalidK {
        /// Requested k-mer length.
        k: usize,
        /// Reference length.
        len: usize,
    },

    /// Requested coordinates fall outside `[1, len]`.
    #[error("interval {start}-{end} is outside the reference (length {len})")]
    OutOfRange {
        /// Requested start (1-based).
        start: usize,
        /// Requested end (1-based, closed).
        end: usize,
        /// Reference length.
        len: usize,
    },

    /// Start lies after end.
    #[error("interval start {start} is greater than end {end}")]
    InvalidRange {
        /// Requested start.
        start: usize,
        /// Requested end.
        end: usize,
    },
}

/// K-mer to occurrence table.
#[derive(Debug, Clone)]
pub struct WindowedReference {
    contig: Arc<str>,
    k: usize,
    kmer_to_intervals: FxHashMap<String, Vec<Interval>>,
}

impl WindowedReference {
    /// Slide a window of width `k` across `sequence` and record where each
    /// k-mer occurs. Occurrence lists are in order of first to last hit.
    pub fn build(
        contig: impl Into<Arc<str>>,
        sequence: &str,
        k: usize,
    ) -> Result<Self, ReferenceError> {
        let len = sequence.len();
        if k == 0 || k > len {
            return Err(ReferenceError::InvalidK { k, len });
        }

        let mut kmer_to_intervals: FxHashMap<String, Vec<Interval>> = FxHashMap::default();
        // 0-based half-open slices map to 1-based closed intervals.
        for i in 0..len - k {
            let Some(window) = sequence.get(i..i + k) else {
                continue;
            };
            kmer_to_intervals
                .entry(window.to_string())
                .or_default()
                .push(Interval::new(i + 1, i + k));
        }

        Ok(Self {
            contig: contig.into(),
            k,
            kmer_to_intervals,
        })
    }

    /// Every recorded occurrence of `kmer`; empty when absent. No case
    /// folding is applied.
    pub fn query(&self, kmer: &str) -> &[Interval] {
        self.kmer_to_intervals
            .get(kmer)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Window width.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Contig name.
    pub fn contig(&self) -> &str {
        &self.contig
    }

    /// Number of distinct k-mers recorded.
    pub fn distinct_kmers(&self) -> usize {
        self.kmer_to_intervals.len()
    }
}

/// Random access to the reference by 1-based closed coordinates.
#[derive(Debug, Clone)]
pub struct ContiguousReference {
    contig: Arc<str>,
    sequence: Arc<str>,
}

impl ContiguousReference {
    /// Wrap a contig name and its sequence.
    pub fn new(contig: impl Into<Arc<str>>, sequence: impl Into<Arc<str>>) -> Self {
        Self {
            contig: contig.into(),
            sequence: sequence.into(),
        }
    }

    /// Bases in `[start, end]`.
    pub fn query(&self, start: usize, end: usize) -> Result<&str, ReferenceError> {
        let len = self.sequence.len();
        if start < 1 || end > len {
            return Err(ReferenceError::OutOfRange { start, end, len });
        }
        if start > end {
            return Err(ReferenceError::InvalidRange { start, end });
        }
        self.sequence
            .get(start - 1..end)
            .ok_or(ReferenceError::OutOfRange { start, end, len })
    }

    /// Contig name.
    pub fn contig(&self) -> &str {
        &self.contig
    }

    /// Full sequence.
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Reference length in bases.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Both reference views, built together from one sequence.
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    windows: WindowedReference,
    contiguous: ContiguousReference,
}

impl ReferenceIndex {
    /// Build the windowed and contiguous views for `sequence`.
    pub fn build(
        contig: impl Into<Arc<str>>,
        sequence: impl Into<Arc<str>>,
        k: usize,
    ) -> Result<Self, ReferenceError> {
        let contig = contig.into();
        let sequence = sequence.into();
        let windows = WindowedReference::build(Arc::clone(&contig), &sequence, k)?;
        let contiguous = ContiguousReference::new(contig, sequence);
        Ok(Self {
            windows,
            contiguous,
        })
    }

    /// Occurrences of `kmer`.
    pub fn query(&self, kmer: &str) -> &[Interval] {
        self.windows.query(kmer)
    }

    /// Bases in `[start, end]`.
    pub fn query_range(&self, start: usize, end: usize) -> Result<&str, ReferenceError> {
        self.contiguous.query(start, end)
    }

    /// Windowed view.
    pub fn windows(&self) -> &WindowedReference {
        &self.windows
    }

    /// Contiguous view.
    pub fn contiguous(&self) -> &ContiguousReference {
        &self.contiguous
    }

    /// K-mer length the index was built with.
    pub fn k(&self) -> usize {
        self.windows.k()
    }

    /// Contig name.
    pub fn contig(&self) -> &str {
        self.contiguous.contig()
    }

    /// Reference length in bases.
    pub fn len(&self) -> usize {
        self.contiguous.len()
    }

    /// Whether the reference is empty (never true for a built index).
    pub fn is_empty(&self) -> bool {
        self.contiguous.is_empty()
    }
}
