//! Used-Car Listing Preprocessing Library
//!
//! Turns a raw used-car listing table into a model-ready table, built with
//! Rust and Polars.
//!
//! # Overview
//!
//! The [`Pipeline`] runs these stages in order:
//!
//! - **Deduplication**: exact-duplicate rows are dropped, first occurrence wins
//! - **Normalization**: `Levy`, `Engine volume` and `Mileage` are coerced from
//!   their text encodings (`-`, `2.0 Turbo`, `100000 km`) to numbers
//! - **Outlier Removal**: IQR filtering over `Price`, `Levy`, `Engine volume`
//!   and `Mileage`, each column on the rows the previous ones kept
//! - **Feature Engineering**: `age` derived from `Prod. year` against a
//!   reference year
//! - **Log Transform**: `Mileage_log`, `Levy_log` and `Engine_volume_log`
//! - **Column Pruning**: `Doors` and `Prod. year` dropped
//!
//! Malformed cells never fail a run. Only structural problems, such as a
//! required column missing from the table, surface as errors.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cars_processing::{Pipeline, PipelineConfig};
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("car_price.csv".into()))?
//!     .finish()?;
//!
//! let config = PipelineConfig::builder()
//!     .reference_year(2024)
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//!
//! println!("{} rows kept", result.data.height());
//! for outcome in &result.summary.outlier_outcomes {
//!     println!("{}: {} removed", outcome.column(), outcome.rows_removed());
//! }
//! ```
//!
//! For the defaults alone, [`preprocess_listings`] runs the pipeline against
//! the current year and returns the cleaned table.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{CategoricalNormalizer, DataCleaner};
pub use config::{ConfigValidationError, MissingValuePolicy, PipelineConfig, PipelineConfigBuilder};
pub use error::{PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use features::{FeatureEngineer, LogTransformer};
pub use pipeline::{
    ClosureProgressReporter, OutlierCleaner, Pipeline, PipelineBuilder, PreprocessingStage,
    ProgressReporter, ProgressUpdate, preprocess_listings,
};
pub use reporting::{PreprocessingReport, ReportGenerator};
pub use types::{
    ActionType, IqrBounds, OutlierOutcome, PipelineResult, PreprocessingAction,
    PreprocessingSummary, SkipReason,
};
pub use utils::{is_numeric_dtype, parse_numeric_string};
