//! Configuration types for the listing preprocessing pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use crate::types::columns;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default multiplier applied to the IQR when computing outlier bounds.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Default floor substituted for non-finite logarithms and zero levies.
pub const DEFAULT_LOG_FLOOR: f64 = 1e-6;

/// What happens to rows whose value is missing in a column being cleaned
/// for outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MissingValuePolicy {
    /// Missing values fail the bound comparison and their rows are removed
    #[default]
    Drop,
    /// Missing values are kept; only present values are checked against the bounds
    Keep,
}

/// Configuration for the preprocessing pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use cars_processing::config::{PipelineConfig, MissingValuePolicy};
///
/// let config = PipelineConfig::builder()
///     .reference_year(2024)
///     .missing_value_policy(MissingValuePolicy::Keep)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Whether to remove exact-duplicate rows before anything else.
    /// Default: true
    pub remove_duplicates: bool,

    /// Columns cleaned for outliers, in order. Each column's bounds are
    /// computed on the table already filtered by the previous columns.
    /// Default: Price, Levy, Engine volume, Mileage
    pub outlier_columns: Vec<String>,

    /// Multiplier `k` in `[Q1 - k*IQR, Q3 + k*IQR]`.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Handling of missing values during outlier bound comparison.
    /// Default: Drop
    pub missing_value_policy: MissingValuePolicy,

    /// Value substituted for non-finite logarithms and zero levies.
    /// Default: 1e-6
    pub log_floor: f64,

    /// Year used to derive vehicle age. `None` resolves to the current
    /// calendar year when the pipeline runs.
    /// Default: None
    pub reference_year: Option<i32>,

    /// Columns removed at the end of the pipeline if present.
    /// Default: Doors, Prod. year
    pub drop_columns: Vec<String>,

    /// Output directory for the cleaned dataset and report.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Custom output file name (without extension).
    /// If None, uses "processed_listings".
    /// Default: None
    pub output_name: Option<String>,
}

fn default_outlier_columns() -> Vec<String> {
    columns::OUTLIER_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_drop_columns() -> Vec<String> {
    vec![columns::DOORS.to_string(), columns::PROD_YEAR.to_string()]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
            outlier_columns: default_outlier_columns(),
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            missing_value_policy: MissingValuePolicy::default(),
            log_floor: DEFAULT_LOG_FLOOR,
            reference_year: None,
            drop_columns: default_drop_columns(),
            output_dir: PathBuf::from("output"),
            output_name: None,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier <= 0.0 {
            return Err(ConfigValidationError::InvalidPositive {
                field: "iqr_multiplier".to_string(),
                value: self.iqr_multiplier,
            });
        }

        if !self.log_floor.is_finite() || self.log_floor <= 0.0 {
            return Err(ConfigValidationError::InvalidPositive {
                field: "log_floor".to_string(),
                value: self.log_floor,
            });
        }

        if let Some(year) = self.reference_year
            && !(1..=9999).contains(&year)
        {
            return Err(ConfigValidationError::InvalidReferenceYear(year));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{field}': {value} (must be finite and greater than 0)")]
    InvalidPositive { field: String, value: f64 },

    #[error("Invalid reference year: {0} (must be between 1 and 9999)")]
    InvalidReferenceYear(i32),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    remove_duplicates: Option<bool>,
    outlier_columns: Option<Vec<String>>,
    iqr_multiplier: Option<f64>,
    missing_value_policy: Option<MissingValuePolicy>,
    log_floor: Option<f64>,
    reference_year: Option<i32>,
    drop_columns: Option<Vec<String>>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
}

impl PipelineConfigBuilder {
    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Set the columns cleaned for outliers, in order.
    pub fn outlier_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outlier_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the IQR multiplier used for outlier bounds.
    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = Some(k);
        self
    }

    /// Set how missing values are treated during outlier removal.
    pub fn missing_value_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_value_policy = Some(policy);
        self
    }

    /// Set the floor used for non-finite logarithms.
    pub fn log_floor(mut self, floor: f64) -> Self {
        self.log_floor = Some(floor);
        self
    }

    /// Pin the year used to derive vehicle age.
    ///
    /// Without it the current calendar year is used, so results change when
    /// a run crosses a year boundary.
    pub fn reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Set the columns dropped at the end of the pipeline.
    pub fn drop_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the output directory for the cleaned dataset and report.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set a custom output file name (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            remove_duplicates: self.remove_duplicates.unwrap_or(true),
            outlier_columns: self.outlier_columns.unwrap_or_else(default_outlier_columns),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(DEFAULT_IQR_MULTIPLIER),
            missing_value_policy: self.missing_value_policy.unwrap_or_default(),
            log_floor: self.log_floor.unwrap_or(DEFAULT_LOG_FLOOR),
            reference_year: self.reference_year,
            drop_columns: self.drop_columns.unwrap_or_else(default_drop_columns),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("output")),
            output_name: self.output_name,
        };

        config.validate()?;
        Ok(config)
    }
}
