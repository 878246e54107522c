use crate::error::{Result, ResultExt};
use crate::types::{PipelineResult, PreprocessingSummary};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Base name used when no output name is configured.
pub const DEFAULT_OUTPUT_NAME: &str = "cars_preprocessed";

/// Report written next to the cleaned dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path to the output file (if written)
    pub output_file: Option<String>,
    /// Final shape (rows, columns)
    pub final_shape: (usize, usize),
    /// Columns of the cleaned table, in order
    pub final_columns: Vec<String>,
    /// Summary of the pipeline run
    pub summary: PreprocessingSummary,
}

impl PreprocessingReport {
    /// Build a report from a finished pipeline run.
    pub fn from_result(
        input_file: &str,
        output_file: Option<&Path>,
        result: &PipelineResult,
    ) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            output_file: output_file.map(|p| p.display().to_string()),
            final_shape: result.data.shape(),
            final_columns: result
                .data
                .get_column_names()
                .into_iter()
                .map(|c| c.to_string())
                .collect(),
            summary: result.summary.clone(),
        }
    }
}

/// Writes cleaned datasets and their reports to an output directory.
pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: impl Into<PathBuf>, output_name: Option<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            output_name,
        }
    }

    /// Base name shared by the dataset and report files.
    pub fn file_stem(&self) -> &str {
        self.output_name.as_deref().unwrap_or(DEFAULT_OUTPUT_NAME)
    }

    /// Path the cleaned dataset is written to.
    pub fn dataset_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.file_stem()))
    }

    /// Path the JSON report is written to.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_report.json", self.file_stem()))
    }

    /// Save the cleaned table as CSV with a header row.
    pub fn write_dataset(&self, df: &DataFrame) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let output_path = self.dataset_path();
        let mut file = File::create(&output_path)?;

        let mut df = df.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(&mut df)
            .context(format!("Writing {}", output_path.display()))?;

        info!("Dataset saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Write a report as pretty-printed JSON.
    pub fn write_report(&self, report: &PreprocessingReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.report_path();
        let body = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&report_path)?;
        file.write_all(body.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}
