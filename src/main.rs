use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mutscan::genomics::{GeneAnnotations, TrailingRuns};
use mutscan::ledger::{ProgressError, ProgressFile, ProgressSink, DEFAULT_INTERVAL};
use mutscan::pipeline::{
    scan_multi_file, scan_pairwise_dir, Exclusions, OutputPaths, ScanConfig, ScanSummary,
};

#[derive(Parser, Debug)]
#[command(name = "mutscan", about = "Count substitutions and deletions in one gene across aligned genomes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a multi-alignment file whose rows are already cut to the gene.
    Multi {
        /// Multi-block alignment file (reference/query `s` line couples).
        alignment: PathBuf,
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Scan a directory of whole-genome pairwise alignment files.
    Pairwise {
        /// Directory holding one pairwise alignment per file.
        dir: PathBuf,
        /// File names to skip, one per line.
        #[arg(long)]
        exclude: Option<PathBuf>,
        #[command(flatten)]
        scan: ScanArgs,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Gene annotation table.
    #[arg(long)]
    annotations: PathBuf,
    /// Gene number (1-based, in annotation order).
    #[arg(long)]
    gene: u32,
    /// Override the gene's coding length.
    #[arg(long)]
    length: Option<usize>,
    /// Directory receiving the output tables.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Prefix of the output file names (default: gene number).
    #[arg(long)]
    prefix: Option<String>,
    /// File overwritten with the processed count at every checkpoint.
    #[arg(long)]
    progress: Option<PathBuf>,
    /// Sequences between checkpoints.
    #[arg(long, default_value_t = DEFAULT_INTERVAL)]
    interval: u64,
    /// Do not record contributing ids for substitutions.
    #[arg(long)]
    no_groups: bool,
    /// Also record deletion runs that reach the end of the gene.
    #[arg(long)]
    record_trailing: bool,
}

impl ScanArgs {
    fn config(&self) -> ScanConfig {
        let mut config = ScanConfig::for_gene(self.gene)
            .with_progress_interval(self.interval)
            .with_group_tracking(!self.no_groups);
        if let Some(length) = self.length {
            config = config.with_expected_length(length);
        }
        if self.record_trailing {
            config = config.with_trailing_runs(TrailingRuns::Record);
        }
        config
    }

    fn outputs(&self) -> OutputPaths {
        let prefix = self
            .prefix
            .clone()
            .unwrap_or_else(|| format!("gene{}", self.gene));
        OutputPaths::with_prefix(&self.out_dir, &prefix)
    }

    fn sink(&self) -> CliProgress {
        CliProgress(self.progress.as_ref().map(ProgressFile::new))
    }
}

/// Checkpoints go to the progress file when one is given, otherwise to the log.
#[derive(Debug)]
struct CliProgress(Option<ProgressFile>);

impl ProgressSink for CliProgress {
    fn checkpoint(&mut self, processed: u64) -> Result<(), ProgressError> {
        match &mut self.0 {
            Some(file) => file.checkpoint(processed),
            None => {
                info!(processed, "sequences processed");
                Ok(())
            }
        }
    }
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
        Commands::Multi { alignment, scan } => run_multi(&alignment, &scan)?,
        Commands::Pairwise { dir, exclude, scan } => run_pairwise(&dir, exclude.as_deref(), &scan)?,
    }

    Ok(())
}

fn run_multi(alignment: &Path, args: &ScanArgs) -> Result<()> {
    let annotations = load_annotations(&args.annotations)?;
    let summary = scan_multi_file(&args.config(), &annotations, alignment, args.sink())
        .with_context(|| format!("scan of {} failed", alignment.display()))?;
    write_outputs(&summary, args)
}

fn run_pairwise(dir: &Path, exclude: Option<&Path>, args: &ScanArgs) -> Result<()> {
    let annotations = load_annotations(&args.annotations)?;
    let exclusions = match exclude {
        Some(path) => Exclusions::from_path(path)
            .with_context(|| format!("failed to read exclusion list {}", path.display()))?,
        None => Exclusions::default(),
    };
    let summary = scan_pairwise_dir(&args.config(), &annotations, dir, &exclusions, args.sink())
        .with_context(|| format!("scan of {} failed", dir.display()))?;
    write_outputs(&summary, args)
}

fn load_annotations(path: &Path) -> Result<GeneAnnotations> {
    GeneAnnotations::from_path(path)
        .with_context(|| format!("failed to read annotations from {}", path.display()))
}

fn write_outputs(summary: &ScanSummary, args: &ScanArgs) -> Result<()> {
    let outputs = args.outputs();
    summary.save(&outputs)?;
    info!(
        sequences = summary.total(),
        fingerprint = %summary.fingerprint(),
        dir = %args.out_dir.display(),
        "tables written"
    );
    Ok(())
}
