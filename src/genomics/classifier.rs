//! Classification of deviant walks into typed variant calls.
//!
//! A walk is placed on the reference through every valid pairing of its
//! anchor occurrences. Each placement is classified independently, so a
//! walk whose anchors repeat in the reference produces one candidate per
//! placement; ambiguity is reported rather than resolved.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::genomics::{
    resolve_anchors, AffineAligner, AlignmentError, AnchorPair, ClassifiedVariant,
    GlobalAligner, ReferenceError, ReferenceIndex, VariantRow, VariantType, DELETION_SENTINEL,
    INSERTION_SENTINEL,
};

/// Anchor placements farther apart than this are treated as spurious.
pub const DEFAULT_MAX_GAP: usize = 100;

/// Errors raised while classifying a single row.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Configuration rejected before any classification.
    #[error("invalid classifier configuration: {0}")]
    InvalidConfiguration(String),

    /// The chain holds only its two anchors.
    #[error("k-mer chain has no deviant k-mers between its anchors")]
    NoDeviants,

    /// Merged sequence too short to strip the anchor context.
    #[error("cannot trim {flank} flanking bases from each side of '{sequence}'")]
    FlankUnderflow {
        /// Bases to remove from each end.
        flank: usize,
        /// Sequence that was too short.
        sequence: String,
    },

    /// A k-mer of the row does not have the classifier's length.
    #[error("k-mer '{kmer}' does not have length {k}")]
    KmerLength {
        /// Offending k-mer.
        kmer: String,
        /// Configured k-mer length.
        k: usize,
    },

    /// Reference lookup failed.
    #[error("reference error: {0}")]
    Reference(#[from] ReferenceError),

    /// Aligner rejected the compound region.
    #[error("alignment error: {0}")]
    Alignment(#[from] AlignmentError),
}

/// Thresholds driving the decision procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// K-mer length of the run.
    pub k: usize,
    /// Placements with at least this many bases between anchors are dropped.
    pub max_gap: usize,
    /// Walks with fewer deviants than this and no bases between the
    /// anchors are reported as repeat deletions.
    pub repeat_deviant_limit: usize,
}

impl ClassifierConfig {
    /// Defaults for k-mer length `k`: a gap bound of 100 and a repeat
    /// threshold of `k` deviants.
    pub fn new(k: usize) -> Result<Self, ClassifyError> {
        if k == 0 {
            return Err(ClassifyError::InvalidConfiguration(
                "k-mer length must be > 0".to_string(),
            ));
        }
        Ok(Self {
            k,
            max_gap: DEFAULT_MAX_GAP,
            repeat_deviant_limit: k,
        })
    }

    /// Set the spurious-placement gap bound.
    pub fn with_max_gap(mut self, max_gap: usize) -> Self {
        self.max_gap = max_gap;
        self
    }

    /// Set the repeat-deletion deviant threshold.
    pub fn with_repeat_deviant_limit(mut self, limit: usize) -> Self {
        self.repeat_deviant_limit = limit;
        self
    }
}

/// Spell the sequence covered by the deviant k-mers of `kmer_chain`.
///
/// The first deviant is taken whole; each later deviant contributes only
/// its final base. Both anchors are excluded.
pub fn merge_deviants(kmer_chain: &[String], k: usize) -> Result<String, ClassifyError> {
    let n = kmer_chain.len();
    if n < 3 {
        return Err(ClassifyError::NoDeviants);
    }

    let mut merged = String::with_capacity(k + n - 3);
    merged.push_str(&kmer_chain[1]);
    for kmer in &kmer_chain[2..n - 1] {
        if let Some(last) = kmer.chars().last() {
            merged.push(last);
        }
    }
    Ok(merged)
}

/// Longest suffix of `a` that is also a prefix of `b`.
pub fn suffix_prefix_overlap<'a>(a: &'a str, b: &str) -> &'a str {
    let max = a.len().min(b.len());
    for len in (1..=max).rev() {
        if a.as_bytes().ends_with(&b.as_bytes()[..len]) {
            if let Some(suffix) = a.get(a.len() - len..) {
                return suffix;
            }
        }
    }
    ""
}

/// Strip `flank` characters from both ends of `sequence`.
fn trim_flanks(sequence: &str, flank: usize) -> Result<&str, ClassifyError> {
    sequence
        .len()
        .checked_sub(flank)
        .filter(|&end| end >= flank)
        .and_then(|end| sequence.get(flank..end))
        .ok_or_else(|| ClassifyError::FlankUnderflow {
            flank,
            sequence: sequence.to_string(),
        })
}

/// Reference-anchored classifier shared by all workers.
#[derive(Debug)]
pub struct VariantClassifier<A = AffineAligner> {
    config: ClassifierConfig,
    index: Arc<ReferenceIndex>,
    aligner: A,
}

impl VariantClassifier<AffineAligner> {
    /// Classifier using the bundled affine-gap aligner.
    pub fn new(config: ClassifierConfig, index: Arc<ReferenceIndex>) -> Result<Self, ClassifyError> {
        Self::with_aligner(config, index, AffineAligner::default())
    }
}

impl<A: GlobalAligner> VariantClassifier<A> {
    /// Classifier with a caller-supplied aligner.
    pub fn with_aligner(
        config: ClassifierConfig,
        index: Arc<ReferenceIndex>,
        aligner: A,
    ) -> Result<Self, ClassifyError> {
        if config.k != index.k() {
            return Err(ClassifyError::InvalidConfiguration(format!(
                "classifier k={} does not match index k={}",
                config.k,
                index.k()
            )));
        }
        Ok(Self {
            config,
            index,
            aligner,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Reference the classifier queries.
    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    /// Classify every valid placement of `row`.
    pub fn classify(&self, row: &VariantRow) -> Result<Vec<ClassifiedVariant>, ClassifyError> {
        let k = self.config.k;
        let foreign = row
            .kmer_chain
            .iter()
            .find(|kmer| kmer.len() != k || !kmer.is_ascii());
        if let Some(kmer) = foreign {
            return Err(ClassifyError::KmerLength {
                kmer: kmer.clone(),
                k,
            });
        }
        if row.n_deviants() == 0 {
            debug!(id = %row.id, "walk has no deviant k-mers; nothing to classify");
            return Ok(Vec::new());
        }

        let placements = resolve_anchors(row.pre_anchor(), row.post_anchor(), self.index.windows());
        if placements.is_empty() {
            trace!(id = %row.id, "anchors have no valid placement");
            return Ok(Vec::new());
        }

        let merged = merge_deviants(&row.kmer_chain, k)?;
        let mut variants = Vec::with_capacity(placements.len());
        for anchors in &placements {
            self.classify_placement(row, anchors, &merged, &mut variants)?;
        }
        Ok(variants)
    }

    fn classify_placement(
        &self,
        row: &VariantRow,
        anchors: &AnchorPair,
        merged: &str,
        out: &mut Vec<ClassifiedVariant>,
    ) -> Result<(), ClassifyError> {
        let k = self.config.k;
        let gap = anchors.gap();
        let n_deviants = row.n_deviants();
        let (pre, post) = (anchors.pre, anchors.post);

        trace!(
            id = %row.id,
            pre = %pre,
            post = %post,
            gap,
            n_deviants,
            merged,
            "classifying placement"
        );

        if gap == 1 && n_deviants == k {
            let position = pre.end + 1;
            let alt = &row.deviants()[0][k - 1..];
            out.push(self.variant(
                row,
                position,
                position,
                VariantType::Snp,
                self.index.query_range(position, position)?,
                alt,
            ));
        } else if n_deviants == k - 1 && merged.len() == 2 * k - 2 && gap >= 1 {
            let (start, end) = (pre.end + 1, post.start - 1);
            out.push(self.variant(
                row,
                start,
                end,
                VariantType::Del,
                self.index.query_range(start, end)?,
                DELETION_SENTINEL,
            ));
        } else if gap == 0 && n_deviants >= self.config.repeat_deviant_limit {
            let inserted = trim_flanks(merged, k - 1)?;
            out.push(self.variant(
                row,
                pre.end,
                post.start,
                VariantType::Ins,
                INSERTION_SENTINEL,
                inserted,
            ));
        } else if n_deviants < self.config.repeat_deviant_limit && gap <= 0 {
            let repeat = suffix_prefix_overlap(row.pre_anchor(), row.post_anchor());
            if repeat.is_empty() {
                debug!(id = %row.id, "abutting anchors share no sequence; no repeat to place");
                return Ok(());
            }
            let len = repeat.len();
            out.push(self.variant(
                row,
                pre.end + 1 - len,
                pre.end,
                VariantType::DelRepeat,
                repeat,
                DELETION_SENTINEL,
            ));
            out.push(self.variant(
                row,
                post.start,
                post.start + len - 1,
                VariantType::DelRepeat,
                repeat,
                DELETION_SENTINEL,
            ));
        } else if gap < self.config.max_gap as i64 {
            // Alt-side anchors overlap when the walk is shorter than both
            // contexts; back the window off the pre-anchor by that much.
            let back = (2 * (k - 1)).saturating_sub(merged.len());
            let ref_inner = self.index.query_range(pre.end + 1 - back, post.start - 1)?;
            let alt_inner = merged
                .get(k - 1 - back..merged.len() + 1 - k)
                .ok_or_else(|| ClassifyError::FlankUnderflow {
                    flank: k - 1 - back,
                    sequence: merged.to_string(),
                })?;

            let aligned = self.aligner.align(ref_inner, alt_inner)?;
            out.push(self.variant(
                row,
                pre.end - back,
                post.start,
                VariantType::Compound,
                &aligned.reference,
                &aligned.alternate,
            ));
        } else {
            trace!(id = %row.id, gap, "placement exceeds gap bound; discarded");
        }
        Ok(())
    }

    fn variant(
        &self,
        row: &VariantRow,
        start: usize,
        end: usize,
        variant_type: VariantType,
        ref_allele: &str,
        alt_allele: &str,
    ) -> ClassifiedVariant {
        ClassifiedVariant {
            source_id: row.id.clone(),
            count: row.count,
            start,
            end,
            variant_type,
            ref_allele: ref_allele.to_string(),
            alt_allele: alt_allele.to_string(),
        }
    }
}
