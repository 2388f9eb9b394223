use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use tracing::info;

use super::{ClassificationPipeline, PipelineConfig, RunSummary};
use crate::genomics::{
    load_reference, ClassifierConfig, ReferenceIndex, VariantClassifier, VariantTableReader,
    VcfHeader, DEFAULT_MAX_GAP, N_HEADER,
};

/// Everything needed to classify one variant table end to end.
#[derive(Debug, Clone)]
pub struct ClassifyJob {
    /// Single-record FASTA reference.
    pub reference: PathBuf,
    /// Whitespace-delimited variant table.
    pub variants: PathBuf,
    /// VCF destination (created or truncated).
    pub output: PathBuf,
    /// K-mer length used to build the walks.
    pub k: usize,
    /// Spurious-placement gap bound.
    pub max_gap: usize,
    /// Repeat-deletion deviant threshold; defaults to `k`.
    pub repeat_deviant_limit: Option<usize>,
    /// Header lines to skip in the variant table.
    pub header_lines: usize,
    /// Worker pool options.
    pub pipeline: PipelineConfig,
}

impl ClassifyJob {
    /// Job with default thresholds.
    pub fn new(
        reference: impl Into<PathBuf>,
        variants: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        k: usize,
    ) -> Self {
        Self {
            reference: reference.into(),
            variants: variants.into(),
            output: output.into(),
            k,
            max_gap: DEFAULT_MAX_GAP,
            repeat_deviant_limit: None,
            header_lines: N_HEADER,
            pipeline: PipelineConfig::default(),
        }
    }

    fn classifier_config(&self) -> Result<ClassifierConfig> {
        let config = ClassifierConfig::new(self.k)?.with_max_gap(self.max_gap);
        Ok(match self.repeat_deviant_limit {
            Some(limit) => config.with_repeat_deviant_limit(limit),
            None => config,
        })
    }

    /// Load the reference, classify every row and write the VCF.
    pub fn run(&self) -> Result<RunSummary> {
        let config = self.classifier_config()?;

        let reference = load_reference(&self.reference).with_context(|| {
            format!("failed to load reference from {}", self.reference.display())
        })?;
        let length = reference.sequence.len();
        let index = ReferenceIndex::build(reference.contig.as_str(), reference.sequence, self.k)
            .context("failed to index reference")?;
        info!(
            contig = %index.contig(),
            length,
            k = self.k,
            distinct_kmers = index.windows().distinct_kmers(),
            "reference indexed"
        );

        let classifier = VariantClassifier::new(config, Arc::new(index))
            .context("failed to initialise classifier")?;
        let pipeline = ClassificationPipeline::new(classifier, self.pipeline.clone());

        let rows = VariantTableReader::from_path(&self.variants, self.k, self.header_lines)
            .with_context(|| {
                format!("failed to open variant table {}", self.variants.display())
            })?;

        let file = File::create(&self.output)
            .with_context(|| format!("failed to create {}", self.output.display()))?;
        let mut writer = BufWriter::new(file);
        VcfHeader::for_classification(
            &self.reference.display().to_string(),
            &reference.contig,
            length,
        )
        .write_to(&mut writer)?;

        let sink = Mutex::new(writer);
        let summary = pipeline.run(rows, &sink)?;
        sink.into_inner()
            .map_err(|_| anyhow!("output sink lock poisoned"))?
            .flush()
            .with_context(|| format!("failed to flush {}", self.output.display()))?;

        info!(output = %self.output.display(), "wrote VCF");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_limit_defaults_to_k() {
        let job = ClassifyJob::new("ref.fa", "rows.tsv", "out.vcf", 6);
        let config = job.classifier_config().unwrap();
        assert_eq!(config.repeat_deviant_limit, 6);
        assert_eq!(config.max_gap, DEFAULT_MAX_GAP);
    }

    #[test]
    fn zero_k_is_rejected_before_io() {
        let job = ClassifyJob::new("missing.fa", "missing.tsv", "out.vcf", 0);
        assert!(job.run().is_err());
    }
}
