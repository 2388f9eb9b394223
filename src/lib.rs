//! # Reference-anchored classification of k-mer walk variants
//!
//! A deviant walk is a chain of overlapping k-mers whose first and last
//! k-mers (the anchors) occur in the reference while the k-mers between
//! them do not. This crate places each walk on the reference through its
//! anchors and classifies the difference between the walk and the
//! reference span as a SNP, a simple deletion, an insertion, a deletion
//! inside a tandem repeat or a compound event resolved by global
//! alignment.
//!
//! ## Usage Example
//!
//! ```
//! use std::sync::Arc;
//! use kmervar::genomics::{ClassifierConfig, ReferenceIndex, VariantClassifier, VariantRow};
//!
//! let index = ReferenceIndex::build("chr1", "ACTTGCAGTCCATGA", 4).unwrap();
//! let classifier =
//!     VariantClassifier::new(ClassifierConfig::new(4).unwrap(), Arc::new(index)).unwrap();
//!
//! let chain = ["CTTG", "TTGA", "TGAA", "GAAG", "AAGT", "AGTC"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let row = VariantRow::new("v1", 3, chain, 4).unwrap();
//! let calls = classifier.classify(&row).unwrap();
//! assert_eq!(calls.len(), 1);
//! assert_eq!(calls[0].variant_type.as_str(), "SNP");
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod genomics; // Reference index, classifier, aligner and file formats
pub mod pipeline; // Concurrent row processing and end-to-end jobs

pub use genomics::{
    AffineAligner, ClassifiedVariant, ClassifierConfig, ClassifyError, GlobalAligner,
    ReferenceIndex, VariantClassifier, VariantRow, VariantType,
};
pub use pipeline::{ClassificationPipeline, ClassifyJob, PipelineConfig, PipelineError, RunSummary};
