//! Concurrent classification of variant-table rows against one reference.
//!
//! Rows are classified on a rayon pool; the only shared mutable state is
//! the output sink, which each worker locks once per row so that all
//! records of a row land contiguously.

mod job;

pub use job::ClassifyJob;

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::genomics::{
    AffineAligner, ClassifiedVariant, GlobalAligner, RowError, VariantClassifier, VariantRow,
    VcfRecord,
};

/// Fatal pipeline failures. Row-level problems are logged and counted
/// instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Writing to the sink failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),

    /// A worker panicked while holding the sink.
    #[error("output sink lock poisoned")]
    SinkPoisoned,
}

/// Worker pool and output ordering options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Worker threads; `None` uses the available parallelism.
    pub threads: Option<usize>,
    /// Emit records in input-row order instead of completion order.
    pub ordered: bool,
}

impl PipelineConfig {
    /// Set the worker count (0 falls back to the available parallelism).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = (threads > 0).then_some(threads);
        self
    }

    /// Preserve input order in the output.
    pub fn with_ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows successfully classified (including those yielding nothing).
    pub rows: usize,
    /// Records written.
    pub variants: usize,
    /// Malformed input rows.
    pub skipped_rows: usize,
    /// Rows whose classification failed.
    pub failed_rows: usize,
}

enum RowOutcome {
    Skipped,
    Failed,
    Classified(VariantRow, Vec<ClassifiedVariant>),
}

#[derive(Default)]
struct Counters {
    rows: AtomicUsize,
    variants: AtomicUsize,
    skipped_rows: AtomicUsize,
    failed_rows: AtomicUsize,
}

impl Counters {
    fn record(&self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Skipped => self.skipped_rows.fetch_add(1, Ordering::Relaxed),
            RowOutcome::Failed => self.failed_rows.fetch_add(1, Ordering::Relaxed),
            RowOutcome::Classified(_, variants) => {
                self.variants.fetch_add(variants.len(), Ordering::Relaxed);
                self.rows.fetch_add(1, Ordering::Relaxed)
            }
        };
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            rows: self.rows.load(Ordering::Relaxed),
            variants: self.variants.load(Ordering::Relaxed),
            skipped_rows: self.skipped_rows.load(Ordering::Relaxed),
            failed_rows: self.failed_rows.load(Ordering::Relaxed),
        }
    }
}

/// Fans rows out to a worker pool and serialises their calls to one sink.
#[derive(Debug)]
pub struct ClassificationPipeline<A = AffineAligner> {
    classifier: VariantClassifier<A>,
    config: PipelineConfig,
}

impl<A: GlobalAligner> ClassificationPipeline<A> {
    /// Pipeline over a ready classifier.
    pub fn new(classifier: VariantClassifier<A>, config: PipelineConfig) -> Self {
        Self { classifier, config }
    }

    /// Classifier used by the workers.
    pub fn classifier(&self) -> &VariantClassifier<A> {
        &self.classifier
    }

    /// Classify every row and write the resulting records to `sink`.
    ///
    /// Returns once every row has been processed. Malformed rows and rows
    /// whose classification fails are logged and counted; only sink
    /// failures abort the run.
    pub fn run<I, W>(&self, rows: I, sink: &Mutex<W>) -> Result<RunSummary, PipelineError>
    where
        I: IntoIterator<Item = Result<VariantRow, RowError>>,
        I::IntoIter: Send,
        W: Write + Send,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads.unwrap_or(0))
            .build()?;
        info!(
            threads = pool.current_num_threads(),
            ordered = self.config.ordered,
            "classifying rows"
        );

        let rows = rows.into_iter();
        let counters = Counters::default();
        pool.install(|| {
            if self.config.ordered {
                self.run_ordered(rows, sink, &counters)
            } else {
                self.run_unordered(rows, sink, &counters)
            }
        })?;

        let summary = counters.summary();
        info!(
            rows = summary.rows,
            variants = summary.variants,
            skipped = summary.skipped_rows,
            failed = summary.failed_rows,
            "classification finished"
        );
        Ok(summary)
    }

    fn run_unordered<I, W>(
        &self,
        rows: I,
        sink: &Mutex<W>,
        counters: &Counters,
    ) -> Result<(), PipelineError>
    where
        I: Iterator<Item = Result<VariantRow, RowError>> + Send,
        W: Write + Send,
    {
        rows.par_bridge().try_for_each(|row| {
            let outcome = self.process_row(row);
            counters.record(&outcome);
            if let RowOutcome::Classified(row, variants) = &outcome {
                if !variants.is_empty() {
                    let mut writer = sink.lock().map_err(|_| PipelineError::SinkPoisoned)?;
                    self.write_row(&mut *writer, row, variants)?;
                }
            }
            Ok(())
        })
    }

    fn run_ordered<I, W>(
        &self,
        rows: I,
        sink: &Mutex<W>,
        counters: &Counters,
    ) -> Result<(), PipelineError>
    where
        I: Iterator<Item = Result<VariantRow, RowError>>,
        W: Write + Send,
    {
        let rows: Vec<_> = rows.collect();
        let outcomes: Vec<RowOutcome> = rows
            .into_par_iter()
            .map(|row| self.process_row(row))
            .collect();

        let mut writer = sink.lock().map_err(|_| PipelineError::SinkPoisoned)?;
        for outcome in &outcomes {
            counters.record(outcome);
            if let RowOutcome::Classified(row, variants) = outcome {
                self.write_row(&mut *writer, row, variants)?;
            }
        }
        Ok(())
    }

    fn process_row(&self, row: Result<VariantRow, RowError>) -> RowOutcome {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!(line = err.line(), error = %err, "skipping malformed row");
                return RowOutcome::Skipped;
            }
        };
        match self.classifier.classify(&row) {
            Ok(variants) => {
                debug!(id = %row.id, calls = variants.len(), "row classified");
                RowOutcome::Classified(row, variants)
            }
            Err(err) => {
                warn!(id = %row.id, error = %err, "classification failed; row skipped");
                RowOutcome::Failed
            }
        }
    }

    fn write_row<W: Write>(
        &self,
        writer: &mut W,
        row: &VariantRow,
        variants: &[ClassifiedVariant],
    ) -> Result<(), PipelineError> {
        let contig = self.classifier.index().contig();
        for variant in variants {
            VcfRecord::from_variant(contig, variant, &row.kmer_chain).write_to(writer)?;
        }
        Ok(())
    }
}
