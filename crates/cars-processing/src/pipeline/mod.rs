//! Pipeline module.
//!
//! This module provides the main preprocessing pipeline and related components.

mod builder;
pub mod outliers;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, preprocess_listings};
pub use outliers::OutlierCleaner;
pub use progress::{
    ClosureProgressReporter, PreprocessingStage, ProgressReporter, ProgressUpdate,
};
