//! Rendering of process outcomes.

use policyscan_core::{Field, ProcessOutcome};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn format_outcome(outcome: &ProcessOutcome, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
        OutputFormat::Csv => format_csv(outcome),
        OutputFormat::Text => Ok(format_text(outcome)),
    }
}

fn csv_header() -> Vec<&'static str> {
    let mut header = vec!["source", "company", "detection_confidence"];
    header.extend(Field::ALL.iter().map(|f| f.name()));
    header.extend(["extraction_confidence", "is_valid", "needs_review", "errors", "warnings"]);
    header
}

fn csv_row(outcome: &ProcessOutcome) -> Vec<String> {
    let mut row = vec![
        outcome.source.clone().unwrap_or_default(),
        outcome.detection.company.id().to_string(),
        format!("{:.2}", outcome.detection.confidence),
    ];
    row.extend(Field::ALL.iter().map(|f| outcome.record.get(*f).to_string()));
    row.extend([
        format!("{:.0}", outcome.extraction_confidence),
        outcome.verdict.is_valid.to_string(),
        outcome.needs_review.to_string(),
        outcome.verdict.errors.join("; "),
        outcome.verdict.warnings.join("; "),
    ]);
    row
}

fn format_csv(outcome: &ProcessOutcome) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(csv_header())?;
    wtr.write_record(csv_row(outcome))?;
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(outcome: &ProcessOutcome) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Company: {} ({:.0}%)\n",
        outcome.detection.company.display_name(),
        outcome.detection.confidence * 100.0
    ));
    output.push_str(&format!("Strategy: {:?}\n\n", outcome.strategy));

    for (field, value) in outcome.record.iter() {
        let value = if value.is_empty() { "-" } else { value };
        output.push_str(&format!("{:<20} {}\n", format!("{}:", field.label()), value));
    }

    if !outcome.record.extras.is_empty() {
        output.push('\n');
        for (name, value) in &outcome.record.extras {
            output.push_str(&format!("{:<20} {}\n", format!("{}:", name), value));
        }
    }

    output.push('\n');
    output.push_str(&format!(
        "Status: {}\n",
        match (outcome.verdict.is_valid, outcome.needs_review) {
            (true, false) => "valid",
            (true, true) => "valid, needs review",
            (false, _) => "invalid, needs review",
        }
    ));
    for error in &outcome.verdict.errors {
        output.push_str(&format!("  error: {}\n", error));
    }
    for warning in &outcome.verdict.warnings {
        output.push_str(&format!("  warning: {}\n", warning));
    }

    output
}

/// One line of the batch summary file.
pub struct SummaryRow<'a> {
    pub file: &'a str,
    pub outcome: Option<&'a ProcessOutcome>,
    pub error: Option<&'a str>,
    pub processing_time_ms: u64,
}

pub const SUMMARY_HEADER: [&str; 11] = [
    "filename",
    "status",
    "company",
    "policy_number",
    "policyholder_name",
    "coverage_amount",
    "premium_amount",
    "confidence",
    "needs_review",
    "processing_time_ms",
    "error",
];

impl SummaryRow<'_> {
    pub fn to_record(&self) -> Vec<String> {
        let time = self.processing_time_ms.to_string();
        match self.outcome {
            Some(outcome) => vec![
                self.file.to_string(),
                "success".to_string(),
                outcome.detection.company.id().to_string(),
                outcome.record.get(Field::PolicyNumber).to_string(),
                outcome.record.get(Field::PolicyholderName).to_string(),
                outcome.record.get(Field::CoverageAmount).to_string(),
                outcome.record.get(Field::PremiumAmount).to_string(),
                format!("{:.0}", outcome.extraction_confidence),
                outcome.needs_review.to_string(),
                time,
                String::new(),
            ],
            None => {
                let mut row = vec![self.file.to_string(), "error".to_string()];
                row.extend(std::iter::repeat_n(String::new(), 7));
                row.push(time);
                row.push(self.error.unwrap_or("").to_string());
                row
            }
        }
    }
}
