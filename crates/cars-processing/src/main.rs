//! CLI entry point for the listing preprocessing pipeline.

use anyhow::{Result, anyhow};
use cars_processing::{
    MissingValuePolicy, OutlierOutcome, Pipeline, PipelineConfig, PipelineResult,
    PreprocessingReport, ReportGenerator,
};
use clap::Parser;
use dotenv::dotenv;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Used-car listing preprocessing pipeline",
    long_about = "Cleans a raw used-car listing CSV and writes a model-ready table.\n\n\
                  EXAMPLES:\n  \
                  # Clean with defaults, age derived against the current year\n  \
                  cars-processing -i car_price.csv\n\n  \
                  # Reproducible run with a pinned reference year\n  \
                  cars-processing -i car_price.csv --reference-year 2024 -o results/\n\n  \
                  # Machine-readable summary\n  \
                  cars-processing -i car_price.csv --json | jq .summary.rows_after"
)]
struct Args {
    /// Path to the listing CSV file to process
    #[arg(short, long)]
    input: String,

    /// Output directory for results
    #[arg(short, long, default_value = "output")]
    output: String,

    /// Custom output file name (without extension)
    ///
    /// If not specified, uses "cars_preprocessed"
    #[arg(long)]
    output_name: Option<String>,

    /// Year used to derive vehicle age (defaults to the current year)
    #[arg(long)]
    reference_year: Option<i32>,

    /// Keep rows whose value is missing in an outlier column
    #[arg(long)]
    keep_missing: bool,

    /// IQR multiplier for the outlier fences
    #[arg(long, default_value = "1.5")]
    iqr_multiplier: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <output_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level, quiet))
        .with_target(false)
        .init();
}

/// `RUST_LOG` (from the environment or `.env`) wins over `--log-level`.
fn log_filter(level: &str, quiet: bool) -> EnvFilter {
    let effective_level = if quiet { "warn" } else { level };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables from .env file, so it can set RUST_LOG
    dotenv().ok();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let data = load_csv_with_fallbacks(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let mut config_builder = PipelineConfig::builder()
        .output_dir(&args.output)
        .iqr_multiplier(args.iqr_multiplier);

    if args.keep_missing {
        config_builder = config_builder.missing_value_policy(MissingValuePolicy::Keep);
    }

    if let Some(year) = args.reference_year {
        config_builder = config_builder.reference_year(year);
    }

    if let Some(ref name) = args.output_name {
        config_builder = config_builder.output_name(name);
    }

    let config = config_builder.build()?;
    let pipeline = build_pipeline(&args, config.clone())?;

    run_pipeline(pipeline, &config, &args, data)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Run pipeline, write outputs and print results
fn run_pipeline(
    pipeline: Pipeline,
    config: &PipelineConfig,
    args: &Args,
    data: DataFrame,
) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting listing preprocessing pipeline...");
    info!("{}", "=".repeat(80));

    let result = pipeline.process(data).map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed: {}", e)
    })?;

    let generator = ReportGenerator::new(config.output_dir.clone(), config.output_name.clone());
    let dataset_path = generator.write_dataset(&result.data)?;
    let report = PreprocessingReport::from_result(&args.input, Some(&dataset_path), &result);

    if args.emit_report {
        let report_path = generator.write_report(&report)?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report, &result, &dataset_path);
    Ok(())
}

/// Print a human-readable summary of the preprocessing results.
fn print_human_readable_summary(
    report: &PreprocessingReport,
    result: &PipelineResult,
    dataset_path: &Path,
) {
    let summary = &result.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("PREPROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, summary.rows_before, summary.columns_before
    );
    println!(
        "Output: {} ({} rows x {} columns)",
        dataset_path.display(),
        summary.rows_after,
        summary.columns_after
    );
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!("  Reference year: {}", summary.reference_year);
    println!(
        "  Rows: {} -> {} ({} removed, {:.1}%)",
        summary.rows_before,
        summary.rows_after,
        summary.rows_removed,
        summary.rows_removed_percentage()
    );
    println!("  Duplicates removed: {}", summary.duplicates_removed);
    println!();

    println!("Outliers:");
    for outcome in &summary.outlier_outcomes {
        match outcome {
            OutlierOutcome::Cleaned {
                column,
                bounds,
                rows_removed,
                ..
            } => println!(
                "  - {}: {} removed, kept [{:.2}, {:.2}] (IQR {:.2})",
                column,
                rows_removed,
                bounds.lower,
                bounds.upper,
                bounds.iqr()
            ),
            OutlierOutcome::Skipped { column, reason } => {
                println!("  - {}: skipped ({})", column, reason)
            }
        }
    }
    println!();

    if !summary.actions.is_empty() {
        println!("Actions Taken:");
        for action in &summary.actions {
            println!(
                "  - [{}] {}: {}",
                action.action_type.display_name(),
                action.target,
                action.description
            );
        }
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Columns: {}", report.final_columns.join(", "));
    println!();
    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save detailed JSON report");
    println!("{}", "=".repeat(80));
}

/// Load CSV with multiple fallback strategies
fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    // Strategy 1: Standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: Without quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Loading without quotes failed: {}", e);
        }
    }

    // Strategy 3: Pre-clean content
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cleaned = clean_csv_content(&content);
            let cursor = std::io::Cursor::new(cleaned);

            CsvReadOptions::default()
                .with_infer_schema_length(Some(100))
                .with_has_header(true)
                .into_reader_with_file_handle(cursor)
                .finish()
                .map_err(|e| e.into())
        }
        Err(e) => {
            error!("Could not read file: {}", e);
            Err(e.into())
        }
    }
}

/// Drop blank lines and collapse doubled quotes
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_env_file_sets_log_filter() {
        if std::env::var_os("RUST_LOG").is_some() {
            // An inherited RUST_LOG is never overridden by .env
            return;
        }
        let dir = std::env::temp_dir().join(format!("cars-processing-env-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let env_file = dir.join(".env");
        std::fs::write(&env_file, "RUST_LOG=debug\n").unwrap();

        assert_eq!(log_filter("info", false).max_level_hint(), Some(LevelFilter::INFO));
        dotenv::from_path(&env_file).unwrap();
        assert_eq!(log_filter("info", true).max_level_hint(), Some(LevelFilter::DEBUG));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_clean_csv_content() {
        let raw = "Price,Levy\n\n\"\"\"15000\"\"\",-\n";
        assert_eq!(clean_csv_content(raw), "Price,Levy\n\"15000\",-");
    }
}
