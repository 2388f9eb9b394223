use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kmervar::genomics::{
    load_reference, ContiguousReference, ReferenceIndex, DEFAULT_MAX_GAP, N_HEADER,
};
use kmervar::{ClassifyJob, PipelineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "kmervar",
    about = "Classify deviant k-mer walks against a reference genome"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify every row of a variant table and write a VCF.
    Classify {
        /// Single-record FASTA reference.
        #[arg(long)]
        reference: PathBuf,
        /// Variant table (id, _, count, _, _, k-mer chain...).
        #[arg(long)]
        variants: PathBuf,
        /// Output VCF path.
        #[arg(long)]
        outfile: PathBuf,
        /// K-mer length the walks were built with.
        #[arg(long)]
        k: usize,
        /// Worker threads (0 = available parallelism).
        #[arg(long, default_value_t = 0)]
        threads: usize,
        /// Anchor placements this far apart or more are discarded.
        #[arg(long, default_value_t = DEFAULT_MAX_GAP)]
        max_gap: usize,
        /// Deviant count below which a zero-gap walk is a repeat deletion
        /// (default: k).
        #[arg(long)]
        repeat_limit: Option<usize>,
        /// Header lines to skip in the variant table.
        #[arg(long, default_value_t = N_HEADER)]
        header_lines: usize,
        /// Write records in input order.
        #[arg(long)]
        ordered: bool,
    },
    /// Print every 1-based interval at which a k-mer occurs.
    QueryWindow {
        /// Single-record FASTA reference.
        #[arg(long)]
        reference: PathBuf,
        /// K-mer length of the index.
        #[arg(long)]
        k: usize,
        /// K-mer to look up.
        kmer: String,
    },
    /// Print the reference bases of a closed 1-based interval.
    QueryPosition {
        /// Single-record FASTA reference.
        #[arg(long)]
        reference: PathBuf,
        /// First base (1-based).
        start: usize,
        /// Last base (inclusive).
        end: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify {
            reference,
            variants,
            outfile,
            k,
            threads,
            max_gap,
            repeat_limit,
            header_lines,
            ordered,
        } => {
            let job = ClassifyJob {
                max_gap,
                repeat_deviant_limit: repeat_limit,
                header_lines,
                pipeline: PipelineConfig::default()
                    .with_threads(threads)
                    .with_ordered(ordered),
                ..ClassifyJob::new(reference, variants, outfile, k)
            };
            let summary = job.run()?;
            if summary.skipped_rows + summary.failed_rows > 0 {
                eprintln!(
                    "{} rows skipped, {} rows failed; see log for details",
                    summary.skipped_rows, summary.failed_rows
                );
            }
        }
        Commands::QueryWindow { reference, k, kmer } => run_query_window(reference, k, kmer)?,
        Commands::QueryPosition {
            reference,
            start,
            end,
        } => run_query_position(reference, start, end)?,
    }

    Ok(())
}

fn run_query_window(reference_path: PathBuf, k: usize, kmer: String) -> Result<()> {
    if kmer.len() != k {
        bail!("k-mer '{}' has length {}, expected {}", kmer, kmer.len(), k);
    }
    let reference = load_reference(&reference_path).with_context(|| {
        format!("failed to load reference from {}", reference_path.display())
    })?;
    let index = ReferenceIndex::build(reference.contig, reference.sequence, k)
        .context("failed to index reference")?;

    let intervals = index.query(&kmer.to_ascii_uppercase());
    if intervals.is_empty() {
        println!("{kmer} not found in {}", index.contig());
    }
    for interval in intervals {
        println!("{}\t{}\t{}", index.contig(), interval.start, interval.end);
    }
    Ok(())
}

fn run_query_position(reference_path: PathBuf, start: usize, end: usize) -> Result<()> {
    let reference = load_reference(&reference_path).with_context(|| {
        format!("failed to load reference from {}", reference_path.display())
    })?;
    let contiguous = ContiguousReference::new(reference.contig, reference.sequence);
    let bases = contiguous
        .query(start, end)
        .with_context(|| format!("cannot read {}:{}-{}", contiguous.contig(), start, end))?;
    println!("{}:{}-{}\t{}", contiguous.contig(), start, end, bases);
    Ok(())
}
