//! Process command - analyze a single OCR text file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{debug, info};

use fincheck_core::{
    AnalysisReport, Analyzer, Anomaly, DocumentType, Engine, FinancialRecord, MonetaryField,
    OcrProvider, PlainTextProvider, ProcessedDocument,
};

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input text file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Classify the document and include a summary
    #[arg(long)]
    summary: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text report
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// What gets written for one document.
#[derive(Debug, Serialize)]
pub struct DocumentOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_confidence: Option<f32>,

    pub fields: FinancialRecord,

    pub anomalies: Vec<Anomaly>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl From<ProcessedDocument> for DocumentOutput {
    fn from(processed: ProcessedDocument) -> Self {
        Self {
            document_type: None,
            classification_confidence: None,
            fields: processed.record,
            anomalies: processed.anomalies,
            summary: None,
        }
    }
}

impl From<AnalysisReport> for DocumentOutput {
    fn from(report: AnalysisReport) -> Self {
        Self {
            document_type: Some(report.document_type),
            classification_confidence: Some(report.classification_confidence),
            fields: report.fields,
            anomalies: report.anomalies,
            summary: Some(report.summary),
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let analyzer = Analyzer::new(Engine::with_default_index(config));
    let output = analyze_file(&analyzer, &args.input, args.summary)?;
    let content = format_output(&output, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &content)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", content);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Read one text file and run it through the engine.
pub fn analyze_file(
    analyzer: &Analyzer,
    path: &Path,
    with_summary: bool,
) -> anyhow::Result<DocumentOutput> {
    let document = PlainTextProvider::new().extract_text(path)?;

    let output = if with_summary {
        analyzer.analyze_document(&document)?.into()
    } else {
        analyzer.engine().process(&document.text)?.into()
    };
    Ok(output)
}

pub fn format_output(output: &DocumentOutput, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(output)?),
        OutputFormat::Csv => format_csv(output),
        OutputFormat::Text => Ok(format_text(output)),
    }
}

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn anomaly_codes(anomalies: &[Anomaly]) -> anyhow::Result<String> {
    let codes = anomalies
        .iter()
        .map(|a| serde_json::to_value(a.code).map(|v| v.as_str().unwrap_or_default().to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(codes.join(";"))
}

fn format_csv(output: &DocumentOutput) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let record = &output.fields;

    wtr.write_record([
        "vendor",
        "invoice_number",
        "date",
        "currency",
        "subtotal",
        "tax",
        "total",
        "line_items",
        "anomalies",
    ])?;

    wtr.write_record([
        &optional(&record.vendor),
        &optional(&record.invoice_number),
        &optional(&record.date),
        &record.currency,
        &optional(&record.subtotal),
        &optional(&record.tax),
        &optional(&record.total),
        &record.line_items.len().to_string(),
        &anomaly_codes(&output.anomalies)?,
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(output: &DocumentOutput) -> String {
    let record = &output.fields;
    let mut text = String::new();

    let amount = |field: MonetaryField| match record.amount(field) {
        Some(value) if record.is_derived(field) => {
            format!("{} {} (derived)", value, record.currency)
        }
        Some(value) => format!("{} {}", value, record.currency),
        None => "-".to_string(),
    };

    if let Some(document_type) = output.document_type {
        text.push_str(&format!("Document: {}\n", document_type));
    }
    text.push_str(&format!("Vendor:   {}\n", record.vendor.as_deref().unwrap_or("-")));
    text.push_str(&format!("Invoice:  {}\n", record.invoice_number.as_deref().unwrap_or("-")));
    text.push_str(&format!(
        "Date:     {}\n",
        record.date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    ));
    text.push('\n');

    if !record.line_items.is_empty() {
        text.push_str("Line items:\n");
        for item in &record.line_items {
            text.push_str(&format!("  {}: {} {}\n", item.description, item.amount, record.currency));
        }
        text.push('\n');
    }

    text.push_str(&format!("Subtotal: {}\n", amount(MonetaryField::Subtotal)));
    text.push_str(&format!("Tax:      {}\n", amount(MonetaryField::Tax)));
    text.push_str(&format!("Total:    {}\n", amount(MonetaryField::Total)));

    text.push('\n');
    if output.anomalies.is_empty() {
        text.push_str("No anomalies\n");
    } else {
        text.push_str("Anomalies:\n");
        for anomaly in &output.anomalies {
            text.push_str(&format!(
                "  [{:?}] {:?}: {}\n",
                anomaly.severity, anomaly.code, anomaly.detail
            ));
        }
    }

    if let Some(summary) = &output.summary {
        text.push_str(&format!("\n{}\n", summary));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use fincheck_core::FincheckConfig;

    const INVOICE: &str =
        "Acme Corp\nInvoice INV-2025-001\nDate: 2025-02-03\nSubtotal: 1000.00\nTax: 100.00\nTotal: 1100.00";

    fn output(text: &str) -> DocumentOutput {
        Engine::with_default_index(FincheckConfig::default())
            .process(text)
            .unwrap()
            .into()
    }

    #[test]
    fn test_csv_row() {
        let csv = format_csv(&output(INVOICE)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "Acme Corp,INV-2025-001,2025-02-03,USD,1000.00,100.00,1100.00,0,"
        );
    }

    #[test]
    fn test_csv_lists_anomaly_codes() {
        let csv = format_csv(&output("Total: 5.00")).unwrap();
        assert!(csv.contains("MISSING_FIELD;MISSING_FIELD;MISSING_FIELD"));
    }

    #[test]
    fn test_text_marks_derived_amounts() {
        let text = format_text(&output("Shop\nSubtotal: 40.00\nTax: 3.20"));
        assert!(text.contains("Total:    43.20 USD (derived)"));
    }

    #[test]
    fn test_json_omits_analysis_fields_without_summary() {
        let json = format_output(&output(INVOICE), OutputFormat::Json).unwrap();
        assert!(json.contains("\"fields\""));
        assert!(!json.contains("\"summary\""));
    }
}
