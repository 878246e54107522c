//! Report generation module.
//!
//! Saves the cleaned dataset as CSV and the run summary as a JSON report.
//!
//! # Example
//!
//! ```rust,ignore
//! use cars_processing::reporting::{PreprocessingReport, ReportGenerator};
//!
//! let generator = ReportGenerator::new("output", Some("listings".to_string()));
//! let dataset = generator.write_dataset(&result.data)?;
//!
//! let report = PreprocessingReport::from_result("data/car_price.csv", Some(&dataset), &result);
//! generator.write_report(&report)?;
//! ```

mod generator;

pub use generator::{DEFAULT_OUTPUT_NAME, PreprocessingReport, ReportGenerator};
