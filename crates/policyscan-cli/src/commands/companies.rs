//! Companies command - list insurers with extraction strategies.

use clap::Args;
use console::style;
use serde::Serialize;

use policyscan_core::{Company, Pipeline, StrategyKind};

use super::load_config;

/// Arguments for the companies command.
#[derive(Args)]
pub struct CompaniesArgs {
    /// Print the list as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct CompanyEntry {
    id: &'static str,
    name: &'static str,
    coordinates: bool,
    patterns: bool,
}

pub async fn run(args: CompaniesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(load_config(config_path)?)?;
    let regions = pipeline.registry(StrategyKind::Region).companies();
    let patterns = pipeline.registry(StrategyKind::Pattern).companies();

    let entries: Vec<CompanyEntry> = Company::KNOWN
        .iter()
        .map(|company| CompanyEntry {
            id: company.id(),
            name: company.display_name(),
            coordinates: regions.contains(company),
            patterns: patterns.contains(company),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", style("Supported companies:").bold());
    println!();
    println!("  {:<16} {:<24} {:<12} {}", "ID", "NAME", "COORDINATES", "PATTERNS");
    for entry in &entries {
        println!(
            "  {:<16} {:<24} {:<12} {}",
            entry.id,
            entry.name,
            mark(entry.coordinates),
            mark(entry.patterns)
        );
    }
    println!();
    println!(
        "{} Unrecognized documents use the generic strategy.",
        style("ℹ").blue()
    );

    Ok(())
}

fn mark(available: bool) -> &'static str {
    if available { "yes" } else { "-" }
}
