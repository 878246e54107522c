//! Main preprocessing pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the listing preprocessing workflow.

use crate::cleaner::{CategoricalNormalizer, DataCleaner};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{Result, ResultExt};
use crate::features::{FeatureEngineer, LogTransformer, current_year};
use crate::pipeline::outliers::OutlierCleaner;
use crate::pipeline::progress::{
    ClosureProgressReporter, PreprocessingStage, ProgressReporter, ProgressUpdate,
};
use crate::types::{
    ActionType, OutlierOutcome, PipelineResult, PreprocessingAction, PreprocessingSummary,
    columns,
};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Row loss above which the summary carries a warning.
const HIGH_ROW_LOSS_PERCENT: f32 = 30.0;

/// The listing preprocessing pipeline.
///
/// Stages, in order:
/// 1. drop exact-duplicate rows
/// 2. coerce `Levy`, `Engine volume`, `Mileage` to numbers
/// 3. remove IQR outliers in `Price`, `Levy`, `Engine volume`, `Mileage`,
///    each column on the table filtered by the previous ones
/// 4. derive `age` from `Prod. year`
/// 5. append `Mileage_log`, `Levy_log`, `Engine_volume_log`
/// 6. drop `Doors` and `Prod. year` if present
///
/// # Example
///
/// ```rust,ignore
/// use cars_processing::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().reference_year(2024).build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(listings)?;
///
/// println!("{} rows left", result.data.height());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    outlier_cleaner: OutlierCleaner,
    log_transformer: LogTransformer,
}

// Ensure Pipeline is Send (can be moved to another thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the listing table through every stage.
    ///
    /// The input is consumed; intermediate stages never alias it.
    ///
    /// # Errors
    ///
    /// Only structural problems propagate, e.g.
    /// [`PreprocessingError::ColumnNotFound`](crate::PreprocessingError::ColumnNotFound)
    /// when `Prod. year` is absent. Malformed cells and failed outlier
    /// statistics are recovered inside the stages.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        match self.process_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Preprocessing completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn begin_stage(&self, stage: PreprocessingStage, message: &str) {
        info!("{}", message);
        self.report_progress(ProgressUpdate::new(stage, 0.0, message));
    }

    fn end_stage(&self, stage: PreprocessingStage, message: impl Into<String>) {
        self.report_progress(ProgressUpdate::new(stage, 1.0, message));
    }

    fn process_internal(&self, df: DataFrame) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let reference_year = self.config.reference_year.unwrap_or_else(current_year);

        info!("Preprocessing started.....");
        info!("Initial shape : {:?}", df.shape());
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::Initializing,
            0.0,
            "Starting preprocessing pipeline...",
        ));

        let mut summary = PreprocessingSummary::new();
        summary.rows_before = df.height();
        summary.columns_before = df.width();
        summary.reference_year = reference_year;

        // Step 1: Remove duplicates
        let df = if self.config.remove_duplicates {
            self.begin_stage(PreprocessingStage::Deduplication, "Dropping duplicate rows...");
            let (deduped, removed) = DataCleaner::remove_duplicates(&df)?;
            summary.duplicates_removed = removed;
            if removed > 0 {
                summary.add_action(PreprocessingAction::new(
                    ActionType::DuplicatesRemoved,
                    "dataset",
                    format!("Removed {} duplicate rows", removed),
                ));
            }
            info!("After dropping duplicates: {:?}", deduped.shape());
            self.end_stage(
                PreprocessingStage::Deduplication,
                format!("Removed {} duplicate rows", removed),
            );
            deduped
        } else {
            info!("Skipping duplicate removal (disabled)");
            df
        };

        // Step 2: Normalize text-encoded columns
        self.begin_stage(PreprocessingStage::Normalization, "Replacing categorical values.....");
        let df = CategoricalNormalizer::normalize(&df).context("During normalization")?;
        for column in [columns::LEVY, columns::ENGINE_VOLUME, columns::MILEAGE] {
            summary.add_action(PreprocessingAction::new(
                ActionType::TypeCorrected,
                column,
                format!("Converted '{}' to Float64", column),
            ));
        }
        self.end_stage(PreprocessingStage::Normalization, "Columns normalized");

        // Step 3: Outliers, cumulative over the configured columns
        self.begin_stage(PreprocessingStage::OutlierRemoval, "Cleaning outliers.....");
        let df = self.remove_outliers(df, &mut summary);
        info!("After cleaning outliers: {:?}", df.shape());
        self.end_stage(
            PreprocessingStage::OutlierRemoval,
            format!("Removed {} outlier rows", summary.outlier_rows_removed()),
        );

        // Step 4: Vehicle age
        self.begin_stage(PreprocessingStage::FeatureEngineering, "Feature engineering.....");
        let df = FeatureEngineer::add_age(&df, reference_year).context("During feature engineering")?;
        summary.add_action(PreprocessingAction::new(
            ActionType::FeatureDerived,
            columns::AGE,
            format!("Derived age against reference year {}", reference_year),
        ));
        self.end_stage(PreprocessingStage::FeatureEngineering, "Age derived");

        // Step 5: Log transforms
        self.begin_stage(PreprocessingStage::LogTransform, "Column transformations...");
        let df = self
            .log_transformer
            .transform(&df)
            .context("During log transform")?;
        for column in columns::LOG_COLUMNS {
            summary.add_action(PreprocessingAction::new(
                ActionType::FeatureDerived,
                columns::log_column_name(column),
                format!("Natural log of '{}'", column),
            ));
        }
        self.end_stage(PreprocessingStage::LogTransform, "Log columns appended");

        // Step 6: Drop columns
        self.begin_stage(PreprocessingStage::ColumnPruning, "Dropping columns...");
        let (df, dropped) = DataCleaner::drop_columns(&df, &self.config.drop_columns);
        for column in &dropped {
            summary.add_action(PreprocessingAction::new(
                ActionType::ColumnRemoved,
                column,
                format!("Dropped column '{}'", column),
            ));
        }
        self.end_stage(
            PreprocessingStage::ColumnPruning,
            format!("Dropped {} columns", dropped.len()),
        );

        // Finalize summary
        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        summary.rows_after = df.height();
        summary.columns_after = df.width();
        summary.rows_removed = summary.rows_before.saturating_sub(summary.rows_after);

        if summary.rows_removed_percentage() > HIGH_ROW_LOSS_PERCENT {
            summary.add_warning(format!(
                "High data loss: {:.1}% of rows were removed",
                summary.rows_removed_percentage()
            ));
        }

        info!("Preprocessing completed successfully!");
        info!("Final shape: {:?}", df.shape());

        Ok(PipelineResult { data: df, summary })
    }

    fn remove_outliers(&self, df: DataFrame, summary: &mut PreprocessingSummary) -> DataFrame {
        let columns = &self.config.outlier_columns;
        let total = columns.len();

        let (cleaned, outcomes) = self.outlier_cleaner.clean_columns_with(&df, columns, |idx, column| {
            self.report_progress(ProgressUpdate::with_items(
                PreprocessingStage::OutlierRemoval,
                format!("Column: {}", column),
                idx,
                total,
                format!("Cleaning outliers in {}", column),
            ));
        });

        for outcome in outcomes {
            match &outcome {
                OutlierOutcome::Cleaned {
                    column,
                    bounds,
                    rows_removed,
                    ..
                } => summary.add_action(
                    PreprocessingAction::new(
                        ActionType::OutlierHandled,
                        column,
                        format!("Removed {} rows outside IQR bounds", rows_removed),
                    )
                    .with_details(format!(
                        "[{:.4}, {:.4}], IQR {:.4}",
                        bounds.lower,
                        bounds.upper,
                        bounds.iqr()
                    )),
                ),
                OutlierOutcome::Skipped { column, reason } => {
                    summary.add_action(PreprocessingAction::new(
                        ActionType::OutlierSkipped,
                        column,
                        format!("Outlier cleaning skipped: {}", reason),
                    ));
                    summary.add_warning(format!(
                        "Outlier cleaning skipped for '{}': {}",
                        column, reason
                    ));
                }
            }
            summary.outlier_outcomes.push(outcome);
        }

        if cleaned.height() == 0 {
            warn!("Outlier removal left no rows");
        }
        cleaned
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            outlier_cleaner: OutlierCleaner::new(config.iqr_multiplier, config.missing_value_policy),
            log_transformer: LogTransformer::new(config.log_floor),
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

/// Run the default pipeline on `df`, deriving age against the current year.
pub fn preprocess_listings(df: DataFrame) -> Result<DataFrame> {
    let pipeline = Pipeline::builder().build()?;
    Ok(pipeline.process(df)?.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreprocessingError;
    use std::sync::Mutex;

    fn listings() -> DataFrame {
        df![
            "Price" => [15000i64, 9000, 12000, 15000],
            "Levy" => ["-", "1399", "", "-"],
            "Engine volume" => ["2.0 Turbo", "1.6", "1.8", "2.0 Turbo"],
            "Mileage" => ["100000 km", "120000 km", "90000 km", "100000 km"],
            "Prod. year" => [2015i64, 2012, 2018, 2015],
            "Doors" => ["04-May", "04-May", "02-Mar", "04-May"],
        ]
        .unwrap()
    }

    fn pipeline_for(year: i32) -> Pipeline {
        Pipeline::builder()
            .config(PipelineConfig::builder().reference_year(year).build().unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert!(pipeline.progress_reporter.is_none());
        assert!(pipeline.config().remove_duplicates);
        assert_eq!(pipeline.config().reference_year, None);
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let mut config = PipelineConfig::default();
        config.iqr_multiplier = -1.0;
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_process_stage_order_and_summary() {
        let result = pipeline_for(2024).process(listings()).unwrap();
        let summary = &result.summary;

        assert_eq!(summary.rows_before, 4);
        assert_eq!(summary.duplicates_removed, 1);
        assert_eq!(summary.reference_year, 2024);
        assert_eq!(summary.outlier_outcomes.len(), 4);
        assert_eq!(
            summary
                .outlier_outcomes
                .iter()
                .map(|o| o.column())
                .collect::<Vec<_>>(),
            vec!["Price", "Levy", "Engine volume", "Mileage"]
        );
        assert_eq!(summary.rows_after, result.data.height());
        assert_eq!(summary.columns_after, result.data.width());
    }

    #[test]
    fn test_process_reports_progress_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let pipeline = Pipeline::builder()
            .config(PipelineConfig::builder().reference_year(2024).build().unwrap())
            .on_progress(move |update| {
                let mut seen = stages_clone.lock().unwrap();
                if seen.last() != Some(&update.stage) {
                    seen.push(update.stage);
                }
            })
            .build()
            .unwrap();

        pipeline.process(listings()).unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                PreprocessingStage::Initializing,
                PreprocessingStage::Deduplication,
                PreprocessingStage::Normalization,
                PreprocessingStage::OutlierRemoval,
                PreprocessingStage::FeatureEngineering,
                PreprocessingStage::LogTransform,
                PreprocessingStage::ColumnPruning,
                PreprocessingStage::Complete,
            ]
        );
    }

    #[test]
    fn test_process_missing_prod_year_is_fatal() {
        let df = listings().drop("Prod. year").unwrap();
        let failed = Arc::new(Mutex::new(false));
        let failed_clone = failed.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| {
                if update.stage == PreprocessingStage::Failed {
                    *failed_clone.lock().unwrap() = true;
                }
            })
            .build()
            .unwrap();

        let err = pipeline.process(df).unwrap_err();
        assert!(err.is_structural());
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
        assert!(*failed.lock().unwrap());
    }

    #[test]
    fn test_process_skipped_outlier_column_is_warned() {
        let config = PipelineConfig::builder()
            .reference_year(2024)
            .outlier_columns(["Price", "Color"])
            .build()
            .unwrap();
        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .process(listings())
            .unwrap();

        assert_eq!(result.summary.skipped_outlier_columns(), vec!["Color"]);
        assert!(result.summary.warnings.iter().any(|w| w.contains("Color")));
    }

    #[test]
    fn test_process_without_dedup() {
        let config = PipelineConfig::builder()
            .reference_year(2024)
            .remove_duplicates(false)
            .build()
            .unwrap();
        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .process(listings())
            .unwrap();
        assert_eq!(result.summary.duplicates_removed, 0);
    }

    #[test]
    fn test_preprocess_listings_convenience() {
        let out = preprocess_listings(listings()).unwrap();
        assert!(out.column("age").is_ok());
        assert!(out.column("Doors").is_err());
        assert!(matches!(
            preprocess_listings(df!["Price" => [1i64]].unwrap()),
            Err(PreprocessingError::WithContext { .. })
        ));
    }

    #[test]
    fn test_process_outliers_match_cumulative_cleaner() {
        let items = Arc::new(Mutex::new(Vec::new()));
        let items_clone = items.clone();

        let pipeline = Pipeline::builder()
            .config(PipelineConfig::builder().reference_year(2024).build().unwrap())
            .on_progress(move |update| {
                if update.stage == PreprocessingStage::OutlierRemoval
                    && let Some(sub_stage) = update.sub_stage
                {
                    items_clone
                        .lock()
                        .unwrap()
                        .push((update.items_processed, sub_stage));
                }
            })
            .build()
            .unwrap();
        let result = pipeline.process(listings()).unwrap();

        let (deduped, _) = DataCleaner::remove_duplicates(&listings()).unwrap();
        let normalized = CategoricalNormalizer::normalize(&deduped).unwrap();
        let (_, expected) =
            OutlierCleaner::default().clean_columns(&normalized, &pipeline.config().outlier_columns);

        assert_eq!(result.summary.outlier_outcomes, expected);
        assert_eq!(
            *items.lock().unwrap(),
            vec![
                (Some(0), "Column: Price".to_string()),
                (Some(1), "Column: Levy".to_string()),
                (Some(2), "Column: Engine volume".to_string()),
                (Some(3), "Column: Mileage".to_string()),
            ]
        );

        let details: Vec<&str> = result
            .summary
            .actions
            .iter()
            .filter(|a| a.action_type == ActionType::OutlierHandled)
            .filter_map(|a| a.details.as_deref())
            .collect();
        assert_eq!(details.len(), 4);
        assert!(details.iter().all(|d| d.contains("IQR")));
    }
}
