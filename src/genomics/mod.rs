//! Genomic primitives for classifying deviant k-mer walks.
//!
//! This module exposes the reference index, anchor placement, the variant
//! classifier and the alignment contract it consumes, plus the adapters
//! for reading inputs and writing VCF output.

mod alignment;
mod anchors;
mod classifier;
mod io;
mod reference;
mod types;
mod vcf;

pub use alignment::{
    AffineAligner, AlignedPair, AlignmentError, GlobalAligner, ScoringScheme, DEFAULT_MAX_CELLS,
};
pub use anchors::resolve_anchors;
pub use classifier::{
    merge_deviants, suffix_prefix_overlap, ClassifierConfig, ClassifyError, VariantClassifier,
    DEFAULT_MAX_GAP,
};
pub use io::{
    load_reference, parse_variant_row, read_reference, ReferenceLoadError, ReferenceSequence,
    RowError, VariantTableReader, N_HEADER,
};
pub use reference::{ContiguousReference, ReferenceError, ReferenceIndex, WindowedReference};
pub use types::{
    AnchorPair, ChainError, ClassifiedVariant, Interval, VariantRow, VariantType,
    DELETION_SENTINEL, GAP_CHAR, INSERTION_SENTINEL,
};
pub use vcf::{render_vcf, write_vcf, InfoHeader, VcfHeader, VcfRecord};
