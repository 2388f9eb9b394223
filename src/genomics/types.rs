use std::fmt;

use thiserror::Error;

/// Alternate allele written for deletions.
pub const DELETION_SENTINEL: &str = "DEL";
/// Reference allele written for insertions.
pub const INSERTION_SENTINEL: &str = "INS";
/// Character marking an indel column in aligned alleles.
pub const GAP_CHAR: char = '-';

/// Closed genomic interval in 1-based coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Interval {
    /// First base covered (inclusive).
    pub start: usize,
    /// Last base covered (inclusive).
    pub end: usize,
}

impl Interval {
    /// Construct a new interval; `start` must not exceed `end`.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "interval start {start} exceeds end {end}");
        Self { start, end }
    }

    /// Number of bases covered.
    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Candidate placement of a walk: one pre-anchor and one post-anchor hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorPair {
    /// Reference occurrence of the first k-mer of the walk.
    pub pre: Interval,
    /// Reference occurrence of the last k-mer of the walk.
    pub post: Interval,
}

impl AnchorPair {
    /// Reference bases strictly between the two anchors.
    pub fn gap(&self) -> i64 {
        self.post.start as i64 - self.pre.end as i64 - 1
    }
}

/// Violations of the k-mer chain invariants of a [`VariantRow`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    /// Fewer than the two anchor k-mers.
    #[error("k-mer chain has {0} element(s); at least the two anchors are required")]
    TooShort(usize),

    /// A k-mer does not have the run's fixed length.
    #[error("k-mer {index} ('{kmer}') has length {len}, expected {k}")]
    WrongLength {
        /// Position of the k-mer in the chain.
        index: usize,
        /// Offending k-mer.
        kmer: String,
        /// Its length.
        len: usize,
        /// Expected k-mer length.
        k: usize,
    },

    /// Consecutive k-mers are not one sliding-window step apart.
    #[error("k-mers {index} and {next} do not overlap by k-1 bases")]
    BrokenOverlap {
        /// Position of the earlier k-mer.
        index: usize,
        /// Position of the later k-mer.
        next: usize,
    },
}

/// Deviant walk read from the variant table.
///
/// `kmer_chain[0]` is the pre-anchor, the last element the post-anchor and
/// everything in between the deviant k-mers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VariantRow {
    /// Identifier carried through to the output record.
    pub id: String,
    /// Number of observations of the walk.
    pub count: u64,
    /// Anchors and deviants in walk order.
    pub kmer_chain: Vec<String>,
}

impl VariantRow {
    /// Build a row, checking the chain against k-mer length `k`.
    pub fn new(
        id: impl Into<String>,
        count: u64,
        kmer_chain: Vec<String>,
        k: usize,
    ) -> Result<Self, ChainError> {
        if kmer_chain.len() < 2 {
            return Err(ChainError::TooShort(kmer_chain.len()));
        }
        for (index, kmer) in kmer_chain.iter().enumerate() {
            if kmer.len() != k {
                return Err(ChainError::WrongLength {
                    index,
                    kmer: kmer.clone(),
                    len: kmer.len(),
                    k,
                });
            }
        }
        for (index, pair) in kmer_chain.windows(2).enumerate() {
            if pair[0].get(1..) != pair[1].get(..k.saturating_sub(1)) {
                return Err(ChainError::BrokenOverlap {
                    index,
                    next: index + 1,
                });
            }
        }
        Ok(Self {
            id: id.into(),
            count,
            kmer_chain,
        })
    }

    /// First k-mer of the walk.
    pub fn pre_anchor(&self) -> &str {
        &self.kmer_chain[0]
    }

    /// Last k-mer of the walk.
    pub fn post_anchor(&self) -> &str {
        &self.kmer_chain[self.kmer_chain.len() - 1]
    }

    /// K-mers strictly between the anchors.
    pub fn deviants(&self) -> &[String] {
        &self.kmer_chain[1..self.kmer_chain.len() - 1]
    }

    /// Number of deviant k-mers.
    pub fn n_deviants(&self) -> usize {
        self.kmer_chain.len() - 2
    }
}

/// Variant categories emitted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum VariantType {
    /// Single-base substitution.
    Snp,
    /// Deletion with an unambiguous location.
    Del,
    /// Insertion between two adjacent reference bases.
    Ins,
    /// Deletion inside a repeat; reported at both candidate placements.
    DelRepeat,
    /// Anything else, decomposed by global alignment.
    Compound,
}

impl VariantType {
    /// Label used in the `VARTYPE` INFO field.
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantType::Snp => "SNP",
            VariantType::Del => "DEL",
            VariantType::Ins => "INS",
            VariantType::DelRepeat => "DEL_REPEAT",
            VariantType::Compound => "COMPOUND",
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed, positioned variant call produced from one anchor placement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClassifiedVariant {
    /// Identifier of the originating row.
    pub source_id: String,
    /// Observation count of the originating row.
    pub count: u64,
    /// First reference position (1-based).
    pub start: usize,
    /// Last reference position (1-based, closed).
    pub end: usize,
    /// Variant category.
    pub variant_type: VariantType,
    /// Reference allele, or [`INSERTION_SENTINEL`].
    pub ref_allele: String,
    /// Alternate allele, or [`DELETION_SENTINEL`].
    pub alt_allele: String,
}
