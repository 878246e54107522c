//! Shared types for the listing preprocessing pipeline.

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Column names of the listing table the pipeline knows about.
pub mod columns {
    pub const PRICE: &str = "Price";
    pub const LEVY: &str = "Levy";
    pub const ENGINE_VOLUME: &str = "Engine volume";
    pub const MILEAGE: &str = "Mileage";
    pub const PROD_YEAR: &str = "Prod. year";
    pub const DOORS: &str = "Doors";
    pub const AGE: &str = "age";

    /// Columns cleaned for outliers, in the order they are applied.
    pub const OUTLIER_COLUMNS: [&str; 4] = [PRICE, LEVY, ENGINE_VOLUME, MILEAGE];

    /// Columns that receive a `<name>_log` companion, in output order.
    pub const LOG_COLUMNS: [&str; 3] = [MILEAGE, LEVY, ENGINE_VOLUME];

    /// Name of the log-transformed companion of `column`.
    ///
    /// Spaces become underscores, so `Engine volume` maps to `Engine_volume_log`.
    pub fn log_column_name(column: &str) -> String {
        format!("{}_log", column.replace(' ', "_"))
    }
}

// ============================================================================
// Outlier Outcomes
// ============================================================================

/// Inclusive value range outside of which a value counts as an outlier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    /// 25th percentile.
    pub q1: f64,
    /// 75th percentile.
    pub q3: f64,
    /// Lower bound, `q1 - k * iqr`.
    pub lower: f64,
    /// Upper bound, `q3 + k * iqr`.
    pub upper: f64,
}

impl IqrBounds {
    /// Compute bounds from the quartiles and the IQR multiplier `k`.
    pub fn from_quartiles(q1: f64, q3: f64, k: f64) -> Self {
        let iqr = q3 - q1;
        Self {
            q1,
            q3,
            lower: q1 - k * iqr,
            upper: q3 + k * iqr,
        }
    }

    /// Interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Whether `value` lies within the bounds (inclusive).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Why outlier cleaning was skipped for a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The column does not exist in the table.
    ColumnNotFound,
    /// The column is not numeric.
    NonNumeric(String),
    /// The column has no non-null values to compute quartiles from.
    NoValidValues,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnNotFound => write!(f, "column not found"),
            Self::NonNumeric(dtype) => write!(f, "column is not numeric ({})", dtype),
            Self::NoValidValues => write!(f, "no valid values to compute quartiles"),
        }
    }
}

/// Result of cleaning one column for outliers.
///
/// Cleaning never fails the pipeline: a column whose quartiles cannot be
/// computed is reported as [`OutlierOutcome::Skipped`] and left unfiltered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutlierOutcome {
    /// Rows outside the bounds were removed.
    Cleaned {
        column: String,
        bounds: IqrBounds,
        rows_before: usize,
        rows_removed: usize,
    },
    /// The column was left untouched.
    Skipped { column: String, reason: SkipReason },
}

impl OutlierOutcome {
    /// Name of the column this outcome refers to.
    pub fn column(&self) -> &str {
        match self {
            Self::Cleaned { column, .. } | Self::Skipped { column, .. } => column,
        }
    }

    /// Whether the column was actually filtered.
    pub fn is_cleaned(&self) -> bool {
        matches!(self, Self::Cleaned { .. })
    }

    /// Number of rows removed (zero when skipped).
    pub fn rows_removed(&self) -> usize {
        match self {
            Self::Cleaned { rows_removed, .. } => *rows_removed,
            Self::Skipped { .. } => 0,
        }
    }
}

// ============================================================================
// Pipeline Result & Summary
// ============================================================================

/// Output of a pipeline run: the cleaned table plus what was done to it.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The cleaned, feature-engineered listing table.
    pub data: DataFrame,
    /// Audit trail of the run.
    pub summary: PreprocessingSummary,
}

/// Human-readable summary of what the pipeline did.
///
/// # Example
///
/// ```rust,ignore
/// let summary = result.summary;
/// println!("Processed {} rows in {}ms", summary.rows_after, summary.duration_ms);
/// for outcome in &summary.outlier_outcomes {
///     println!("{}: {} removed", outcome.column(), outcome.rows_removed());
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessingSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Number of rows before preprocessing.
    pub rows_before: usize,
    /// Number of rows after preprocessing.
    pub rows_after: usize,
    /// Number of rows removed during preprocessing.
    pub rows_removed: usize,

    /// Number of columns before preprocessing.
    pub columns_before: usize,
    /// Number of columns after preprocessing.
    pub columns_after: usize,

    /// Exact-duplicate rows removed.
    pub duplicates_removed: usize,

    /// Year the `age` column was derived against.
    pub reference_year: i32,

    /// One outcome per outlier column, in application order.
    pub outlier_outcomes: Vec<OutlierOutcome>,

    /// List of actions taken during preprocessing.
    pub actions: Vec<PreprocessingAction>,

    /// Warnings and notes generated during preprocessing.
    pub warnings: Vec<String>,
}

impl PreprocessingSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action to the summary.
    pub fn add_action(&mut self, action: PreprocessingAction) {
        self.actions.push(action);
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Calculate the percentage of rows removed.
    pub fn rows_removed_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed as f32 / self.rows_before as f32) * 100.0
        }
    }

    /// Total rows removed by outlier cleaning across all columns.
    pub fn outlier_rows_removed(&self) -> usize {
        self.outlier_outcomes.iter().map(|o| o.rows_removed()).sum()
    }

    /// Columns whose outlier cleaning was skipped.
    pub fn skipped_outlier_columns(&self) -> Vec<&str> {
        self.outlier_outcomes
            .iter()
            .filter(|o| !o.is_cleaned())
            .map(|o| o.column())
            .collect()
    }
}

/// A single action taken during preprocessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingAction {
    /// Type of action performed.
    pub action_type: ActionType,
    /// Target of the action (column name or "dataset").
    pub target: String,
    /// Human-readable description of the action.
    pub description: String,
    /// Additional details (e.g., bounds used).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl PreprocessingAction {
    /// Create a new preprocessing action.
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
            details: None,
        }
    }

    /// Add details to the action.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Types of actions that can be taken during preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Duplicate rows were removed.
    DuplicatesRemoved,
    /// A text column was coerced to numbers.
    TypeCorrected,
    /// Rows outside the IQR bounds of a column were removed.
    OutlierHandled,
    /// Outlier cleaning could not run for a column.
    OutlierSkipped,
    /// A derived column was added.
    FeatureDerived,
    /// A column was removed from the dataset.
    ColumnRemoved,
}

impl ActionType {
    /// Get a human-readable display name for the action type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DuplicatesRemoved => "Duplicates Removed",
            Self::TypeCorrected => "Type Corrected",
            Self::OutlierHandled => "Outlier Handled",
            Self::OutlierSkipped => "Outlier Skipped",
            Self::FeatureDerived => "Feature Derived",
            Self::ColumnRemoved => "Column Removed",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_column_name() {
        assert_eq!(columns::log_column_name("Mileage"), "Mileage_log");
        assert_eq!(columns::log_column_name("Levy"), "Levy_log");
        assert_eq!(
            columns::log_column_name("Engine volume"),
            "Engine_volume_log"
        );
    }

    #[test]
    fn test_action_type_display_name() {
        let action = PreprocessingAction::new(ActionType::OutlierSkipped, "Color", "skipped");
        assert_eq!(action.action_type.display_name(), "Outlier Skipped");
        assert_eq!(ActionType::FeatureDerived.display_name(), "Feature Derived");
    }

    #[test]
    fn test_iqr_bounds() {
        let bounds = IqrBounds::from_quartiles(2.0, 6.0, 1.5);
        assert_eq!(bounds.iqr(), 4.0);
        assert_eq!(bounds.lower, -4.0);
        assert_eq!(bounds.upper, 12.0);
        assert!(bounds.contains(-4.0));
        assert!(bounds.contains(12.0));
        assert!(!bounds.contains(12.5));
        assert!(!bounds.contains(f64::NAN));
    }

    #[test]
    fn test_outlier_outcome_accessors() {
        let cleaned = OutlierOutcome::Cleaned {
            column: "Price".to_string(),
            bounds: IqrBounds::from_quartiles(1.0, 2.0, 1.5),
            rows_before: 10,
            rows_removed: 3,
        };
        let skipped = OutlierOutcome::Skipped {
            column: "Levy".to_string(),
            reason: SkipReason::ColumnNotFound,
        };

        assert!(cleaned.is_cleaned());
        assert_eq!(cleaned.rows_removed(), 3);
        assert!(!skipped.is_cleaned());
        assert_eq!(skipped.rows_removed(), 0);
        assert_eq!(skipped.column(), "Levy");
    }

    #[test]
    fn test_summary_outlier_totals() {
        let mut summary = PreprocessingSummary::new();
        summary.outlier_outcomes = vec![
            OutlierOutcome::Cleaned {
                column: "Price".to_string(),
                bounds: IqrBounds::from_quartiles(1.0, 2.0, 1.5),
                rows_before: 10,
                rows_removed: 2,
            },
            OutlierOutcome::Skipped {
                column: "Levy".to_string(),
                reason: SkipReason::NoValidValues,
            },
        ];

        assert_eq!(summary.outlier_rows_removed(), 2);
        assert_eq!(summary.skipped_outlier_columns(), vec!["Levy"]);
    }

    #[test]
    fn test_summary_percentages() {
        let mut summary = PreprocessingSummary::new();
        summary.rows_before = 200;
        summary.rows_removed = 50;
        assert!((summary.rows_removed_percentage() - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_outcome_serialization() {
        let skipped = OutlierOutcome::Skipped {
            column: "Mileage".to_string(),
            reason: SkipReason::NonNumeric("str".to_string()),
        };
        let json = serde_json::to_string(&skipped).unwrap();
        assert!(json.contains("\"status\":\"skipped\""));
        assert!(json.contains("non_numeric"));
    }
}
