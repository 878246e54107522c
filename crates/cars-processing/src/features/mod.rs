//! Feature derivation for listing tables.
//!
//! - [`FeatureEngineer`] derives the vehicle `age` from `Prod. year`
//! - [`LogTransformer`] appends natural-log companions of the skewed
//!   numeric columns

mod log_transform;

pub use log_transform::LogTransformer;

use crate::error::{Result, ResultExt};
use crate::types::columns;
use crate::utils::required_series;
use chrono::Datelike;
use polars::prelude::*;
use tracing::debug;

/// The current calendar year in local time.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Derives vehicle age from the production year.
pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Append `age = reference_year - Prod. year` as an Int64 column.
    ///
    /// Rows without a production year get a null age.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessingError::ColumnNotFound`](crate::PreprocessingError::ColumnNotFound)
    /// if the table has no `Prod. year` column.
    pub fn add_age(df: &DataFrame, reference_year: i32) -> Result<DataFrame> {
        let years = required_series(df, columns::PROD_YEAR)?
            .cast(&DataType::Int64)
            .context("Casting production year to integer")?;
        let reference = i64::from(reference_year);

        let ages: Vec<Option<i64>> = years
            .i64()?
            .into_iter()
            .map(|year| year.map(|y| reference - y))
            .collect();

        debug!("Derived '{}' against reference year {}", columns::AGE, reference_year);

        let mut out = df.clone();
        out.with_column(Series::new(columns::AGE.into(), ages))
            .context("Appending age column")?;
        Ok(out)
    }
}
