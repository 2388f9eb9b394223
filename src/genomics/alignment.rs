//! Global alignment used to decompose compound variants.
//!
//! The classifier only depends on [`GlobalAligner`]; [`AffineAligner`] is the
//! bundled implementation, a Needleman-Wunsch alignment with affine gap
//! costs.

use bio::alignment::pairwise::Aligner;
use bio::alignment::AlignmentOperation;
use thiserror::Error;

use crate::genomics::GAP_CHAR;

/// Default bound on DP cells (reference length x alternate length).
pub const DEFAULT_MAX_CELLS: usize = 1 << 24;

/// Errors surfaced by an aligner.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlignmentError {
    /// The DP matrix for the inputs would exceed the configured limit.
    #[error("alignment of {ref_len} x {alt_len} bases exceeds the {max_cells} cell limit")]
    TooLarge {
        /// Reference length.
        ref_len: usize,
        /// Alternate length.
        alt_len: usize,
        /// Configured cell limit.
        max_cells: usize,
    },

    /// Gap scores must be zero or negative.
    #[error("gap penalties must not be positive (open {gap_open}, extend {gap_extend})")]
    PositiveGapPenalty {
        /// Configured gap-open score.
        gap_open: i32,
        /// Configured gap-extend score.
        gap_extend: i32,
    },
}

/// Two gapped sequences of equal length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    /// Reference with gap characters inserted.
    pub reference: String,
    /// Alternate with gap characters inserted.
    pub alternate: String,
}

/// Contract for the global aligner consumed by the classifier.
pub trait GlobalAligner: Send + Sync {
    /// Globally align `alternate` against `reference`.
    fn align(&self, reference: &str, alternate: &str) -> Result<AlignedPair, AlignmentError>;
}

/// Substitution and gap scores. Gap penalties are negative; a gap of
/// length `L` costs `gap_open + L * gap_extend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringScheme {
    /// Score for identical bases.
    pub match_score: i32,
    /// Score for differing bases.
    pub mismatch_score: i32,
    /// Penalty for opening a gap.
    pub gap_open: i32,
    /// Penalty per gapped base.
    pub gap_extend: i32,
}

impl Default for ScoringScheme {
    /// DNA scoring in the spirit of EDNAFULL: +5 / -4, open -10, extend -1.
    fn default() -> Self {
        Self {
            match_score: 5,
            mismatch_score: -4,
            gap_open: -10,
            gap_extend: -1,
        }
    }
}

impl ScoringScheme {
    #[inline]
    fn substitution(&self, a: u8, b: u8) -> i32 {
        if a.eq_ignore_ascii_case(&b) {
            self.match_score
        } else {
            self.mismatch_score
        }
    }
}

/// Global alignment with affine gaps, backed by `bio`'s pairwise aligner.
///
/// Bases are compared case-insensitively; the output keeps the input case.
/// Among equally scoring alignments the traceback prefers aligned columns
/// over gaps in the alternate, and those over gaps in the reference.
#[derive(Debug, Clone)]
pub struct AffineAligner {
    scoring: ScoringScheme,
    max_cells: usize,
}

impl Default for AffineAligner {
    fn default() -> Self {
        Self::new(ScoringScheme::default())
    }
}

impl AffineAligner {
    /// Aligner with the given scores and the default cell limit.
    pub fn new(scoring: ScoringScheme) -> Self {
        Self {
            scoring,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }

    /// Override the DP cell limit.
    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells.max(1);
        self
    }
}

/// Lay the two inputs out column by column following `operations`.
fn render(operations: &[AlignmentOperation], reference: &[u8], alternate: &[u8]) -> AlignedPair {
    let gap = GAP_CHAR as u8;
    let mut ref_bases = reference.iter().copied();
    let mut alt_bases = alternate.iter().copied();
    let mut ref_out = Vec::with_capacity(operations.len());
    let mut alt_out = Vec::with_capacity(operations.len());

    for operation in operations {
        match operation {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                ref_out.push(ref_bases.next().unwrap_or(gap));
                alt_out.push(alt_bases.next().unwrap_or(gap));
            }
            // reference base against a gap
            AlignmentOperation::Ins => {
                ref_out.push(ref_bases.next().unwrap_or(gap));
                alt_out.push(gap);
            }
            AlignmentOperation::Del => {
                ref_out.push(gap);
                alt_out.push(alt_bases.next().unwrap_or(gap));
            }
            // global mode never clips
            AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => {}
        }
    }

    AlignedPair {
        reference: String::from_utf8_lossy(&ref_out).into_owned(),
        alternate: String::from_utf8_lossy(&alt_out).into_owned(),
    }
}

impl GlobalAligner for AffineAligner {
    fn align(&self, reference: &str, alternate: &str) -> Result<AlignedPair, AlignmentError> {
        let (x, y) = (reference.as_bytes(), alternate.as_bytes());

        let cells = (x.len() + 1).saturating_mul(y.len() + 1);
        if cells > self.max_cells {
            return Err(AlignmentError::TooLarge {
                ref_len: x.len(),
                alt_len: y.len(),
                max_cells: self.max_cells,
            });
        }
        let scoring = self.scoring;
        if scoring.gap_open > 0 || scoring.gap_extend > 0 {
            return Err(AlignmentError::PositiveGapPenalty {
                gap_open: scoring.gap_open,
                gap_extend: scoring.gap_extend,
            });
        }

        if x.is_empty() || y.is_empty() {
            let gaps = |len: usize| GAP_CHAR.to_string().repeat(len);
            return Ok(AlignedPair {
                reference: if x.is_empty() { gaps(y.len()) } else { reference.to_string() },
                alternate: if y.is_empty() { gaps(x.len()) } else { alternate.to_string() },
            });
        }

        let score = move |a: u8, b: u8| scoring.substitution(a, b);
        let mut aligner =
            Aligner::with_capacity(x.len(), y.len(), scoring.gap_open, scoring.gap_extend, score);
        let alignment = aligner.global(x, y);
        Ok(render(&alignment.operations, x, y))
    }
}
