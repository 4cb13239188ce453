//! Process command - extract fields from a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use policyscan_core::{Company, DocumentSource};

use super::output::{OutputFormat, format_outcome};
use super::{ModeArg, build_pipeline, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, image or text)
    #[arg(required = true)]
    input: PathBuf,

    /// Skip detection and use this company's strategy (e.g. "state_farm")
    #[arg(long)]
    company: Option<String>,

    /// Extraction mode (overrides the config file)
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Show detection and extraction confidence
    #[arg(long)]
    show_confidence: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
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

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Loading models...");

    let pipeline = build_pipeline(config, args.model_dir.clone())?;

    pb.set_message("Extracting fields...");
    let outcome = pipeline.process(DocumentSource::Path(args.input.clone()), company)?;
    pb.finish_and_clear();

    if outcome.needs_review {
        eprintln!("{}", style("Flagged for review:").yellow());
        for reason in &outcome.review_reasons {
            eprintln!("  - {}", reason);
        }
    }

    let output = format_outcome(&outcome, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        println!();
        println!(
            "{} Detected {} with confidence {:.1}%",
            style("ℹ").blue(),
            outcome.detection.company.display_name(),
            outcome.detection.confidence * 100.0
        );
        println!(
            "{} Extraction confidence: {:.1}%",
            style("ℹ").blue(),
            outcome.extraction_confidence
        );
        println!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            outcome.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
