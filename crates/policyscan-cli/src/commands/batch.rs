//! Batch processing command for multiple policy documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use policyscan_core::{Company, DocumentSource, Pipeline, ProcessOutcome, SourceKind};

use super::output::{OutputFormat, SUMMARY_HEADER, SummaryRow, format_outcome};
use super::{ModeArg, build_pipeline, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Use this company's strategy for every file
    #[arg(long)]
    company: Option<String>,

    /// Extraction mode (overrides the config file)
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    outcome: Option<ProcessOutcome>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(mode) = args.mode {
        config.extraction.mode = mode.into();
    }

    let company = args
        .company
        .as_deref()
        .map(str::parse::<Company>)
        .transpose()?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && SourceKind::from_path(p).is_ok())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pipeline = Arc::new(build_pipeline(config, args.model_dir.clone())?);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // At most `jobs` documents in flight; nothing new starts after a failure.
    let jobs = args.jobs.max(1);
    let total = files.len();
    let mut pending = files.into_iter();
    let mut tasks = JoinSet::new();
    let mut results = Vec::with_capacity(total);

    loop {
        while tasks.len() < jobs {
            let Some(path) = pending.next() else {
                break;
            };
            let pipeline = pipeline.clone();
            tasks.spawn_blocking(move || process_single_file(&pipeline, path, company));
        }

        let Some(joined) = tasks.join_next().await else {
            break;
        };
        let result = joined?;
        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                pb.abandon();
                anyhow::bail!(
                    "Processing failed after {} of {} files: {}",
                    results.len() + 1,
                    total,
                    error_msg
                );
            }
        }
        results.push(result);
        pb.inc(1);
    }

    pb.finish_with_message("Complete");
    results.sort_by(|a, b| a.path.cmp(&b.path));

    let successful: Vec<_> = results.iter().filter(|r| r.outcome.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let flagged = successful
        .iter()
        .filter(|r| r.outcome.as_ref().is_some_and(|o| o.needs_review))
        .count();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(outcome) = &result.outcome {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("document");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_outcome(outcome, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} flagged for review",
        style(successful.len()).green(),
        style(failed.len()).red(),
        style(flagged).yellow()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    pipeline: &Pipeline,
    path: PathBuf,
    company: Option<Company>,
) -> ProcessResult {
    let file_start = Instant::now();
    let result = pipeline.process(DocumentSource::Path(path.clone()), company);
    let processing_time_ms = file_start.elapsed().as_millis() as u64;

    match result {
        Ok(outcome) => ProcessResult {
            path,
            outcome: Some(outcome),
            error: None,
            processing_time_ms,
        },
        Err(e) => ProcessResult {
            path,
            outcome: None,
            error: Some(e.to_string()),
            processing_time_ms,
        },
    }
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(SUMMARY_HEADER)?;

    for result in results {
        let row = SummaryRow {
            file: result
                .path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(""),
            outcome: result.outcome.as_ref(),
            error: result.error.as_deref(),
            processing_time_ms: result.processing_time_ms,
        };
        wtr.write_record(row.to_record())?;
    }

    wtr.flush()?;
    Ok(())
}
