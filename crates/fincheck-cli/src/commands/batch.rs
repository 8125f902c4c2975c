//! Batch processing command for multiple OCR text files.

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

use fincheck_core::{Analyzer, Engine};

use super::load_config;
use super::process::{analyze_file, format_output, DocumentOutput, OutputFormat};

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
    ///
    /// With more than one worker, which of two identical documents is flagged
    /// as the duplicate depends on scheduling. Use `-j 1` for reproducible
    /// output.
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    index: usize,
    path: PathBuf,
    output: Option<DocumentOutput>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "txt" | "text")
        })
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

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // One analyzer, and so one fingerprint index, for the whole batch.
    let analyzer = Arc::new(Analyzer::new(Engine::with_default_index(config)));
    let jobs = args.jobs.max(1);
    let mut tasks = JoinSet::new();
    let mut results = Vec::with_capacity(files.len());

    for (index, path) in files.into_iter().enumerate() {
        if tasks.len() >= jobs {
            if let Some(joined) = tasks.join_next().await {
                collect(joined?, &args, &mut results)?;
                pb.inc(1);
            }
        }

        let analyzer = Arc::clone(&analyzer);
        tasks.spawn_blocking(move || {
            let file_start = Instant::now();
            let outcome = analyze_file(&analyzer, &path, true);
            let processing_time_ms = file_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(output) => ProcessResult {
                    index,
                    path,
                    output: Some(output),
                    error: None,
                    processing_time_ms,
                },
                Err(e) => ProcessResult {
                    index,
                    path,
                    output: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                },
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        collect(joined?, &args, &mut results)?;
        pb.inc(1);
    }

    pb.finish_with_message("Complete");
    results.sort_by_key(|r| r.index);

    let successful: Vec<_> = results.iter().filter(|r| r.output.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(output) = &result.output {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("document");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_output(output, args.format)?)?;
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

    let anomalies: usize = successful
        .iter()
        .filter_map(|r| r.output.as_ref())
        .map(|o| o.anomalies.len())
        .sum();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} anomalies",
        style(successful.len()).green(),
        style(failed.len()).red(),
        style(anomalies).yellow()
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

/// Record a finished file, failing the batch on error unless told to continue.
fn collect(
    result: ProcessResult,
    args: &BatchArgs,
    results: &mut Vec<ProcessResult>,
) -> anyhow::Result<()> {
    if let Some(error_msg) = &result.error {
        if args.continue_on_error {
            warn!("Failed to process {}: {}", result.path.display(), error_msg);
        } else {
            error!("Failed to process {}: {}", result.path.display(), error_msg);
            anyhow::bail!("Processing failed for {}: {}", result.path.display(), error_msg);
        }
    }
    results.push(result);
    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "document_type",
        "vendor",
        "invoice_number",
        "date",
        "total",
        "currency",
        "anomaly_count",
        "max_severity",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(output) = &result.output {
            let record = &output.fields;
            let max_severity = output
                .anomalies
                .iter()
                .map(|a| a.severity)
                .max()
                .map(|s| format!("{:?}", s).to_uppercase())
                .unwrap_or_default();

            wtr.write_record([
                filename,
                "success",
                &output
                    .document_type
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
                record.vendor.as_deref().unwrap_or(""),
                record.invoice_number.as_deref().unwrap_or(""),
                &record.date.map(|d| d.to_string()).unwrap_or_default(),
                &record.total.map(|t| t.to_string()).unwrap_or_default(),
                &record.currency,
                &output.anomalies.len().to_string(),
                &max_severity,
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
