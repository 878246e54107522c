//! Outlier handling module.
//!
//! Removes rows whose value in a column falls outside
//! `[Q1 - k*IQR, Q3 + k*IQR]`. Columns are processed one after another, each
//! on the table already filtered by the previous ones.

use crate::config::{DEFAULT_IQR_MULTIPLIER, MissingValuePolicy};
use crate::error::{PreprocessingError, Result};
use crate::types::{IqrBounds, OutlierOutcome, SkipReason};
use crate::utils::{has_column, is_numeric_dtype, present_values, quantile_sorted};
use polars::prelude::*;
use tracing::{debug, warn};

/// Removes IQR outliers from numeric columns.
#[derive(Debug, Clone, Copy)]
pub struct OutlierCleaner {
    multiplier: f64,
    missing_values: MissingValuePolicy,
}

impl Default for OutlierCleaner {
    fn default() -> Self {
        Self::new(DEFAULT_IQR_MULTIPLIER, MissingValuePolicy::default())
    }
}

impl OutlierCleaner {
    pub fn new(multiplier: f64, missing_values: MissingValuePolicy) -> Self {
        Self {
            multiplier,
            missing_values,
        }
    }

    /// Compute the outlier bounds of `column` on the current table.
    ///
    /// Quartiles are taken over the non-null values, interpolating linearly
    /// between neighbouring ranks.
    pub fn iqr_bounds(&self, df: &DataFrame, column: &str) -> Result<IqrBounds> {
        if !has_column(df, column) {
            return Err(PreprocessingError::ColumnNotFound(column.to_string()));
        }
        let series = df.column(column)?.as_materialized_series();
        if !is_numeric_dtype(series.dtype()) {
            return Err(PreprocessingError::TypeConversionFailed {
                column: column.to_string(),
                target_type: "Float64".to_string(),
                reason: format!("column has non-numeric type {}", series.dtype()),
            });
        }

        let mut values = present_values(series)?;
        values.sort_by(f64::total_cmp);

        let (Some(q1), Some(q3)) = (quantile_sorted(&values, 0.25), quantile_sorted(&values, 0.75))
        else {
            return Err(PreprocessingError::NoValidValues(column.to_string()));
        };

        Ok(IqrBounds::from_quartiles(q1, q3, self.multiplier))
    }

    /// Remove the rows of `df` that are outliers in `column`.
    ///
    /// Never fails: when the bounds cannot be computed the table is returned
    /// unchanged together with [`OutlierOutcome::Skipped`].
    pub fn clean_column(&self, df: &DataFrame, column: &str) -> (DataFrame, OutlierOutcome) {
        let bounds = match self.iqr_bounds(df, column) {
            Ok(bounds) => bounds,
            Err(e) => return (df.clone(), self.skip(column, e)),
        };

        match self.filter_within(df, column, &bounds) {
            Ok(filtered) => {
                let rows_removed = df.height() - filtered.height();
                debug!(
                    "Column '{}': bounds [{:.3}, {:.3}], removed {} rows",
                    column, bounds.lower, bounds.upper, rows_removed
                );
                let outcome = OutlierOutcome::Cleaned {
                    column: column.to_string(),
                    bounds,
                    rows_before: df.height(),
                    rows_removed,
                };
                (filtered, outcome)
            }
            Err(e) => (df.clone(), self.skip(column, e)),
        }
    }

    /// Clean `columns` in order, each on the output of the previous one.
    pub fn clean_columns(
        &self,
        df: &DataFrame,
        columns: &[String],
    ) -> (DataFrame, Vec<OutlierOutcome>) {
        self.clean_columns_with(df, columns, |_, _| {})
    }

    /// Same as [`clean_columns`](Self::clean_columns), calling
    /// `before_column(index, name)` before each column is cleaned.
    pub fn clean_columns_with<F>(
        &self,
        df: &DataFrame,
        columns: &[String],
        mut before_column: F,
    ) -> (DataFrame, Vec<OutlierOutcome>)
    where
        F: FnMut(usize, &str),
    {
        let mut current = df.clone();
        let mut outcomes = Vec::with_capacity(columns.len());

        for (idx, column) in columns.iter().enumerate() {
            before_column(idx, column);
            let (next, outcome) = self.clean_column(&current, column);
            current = next;
            outcomes.push(outcome);
        }

        (current, outcomes)
    }

    fn filter_within(&self, df: &DataFrame, column: &str, bounds: &IqrBounds) -> Result<DataFrame> {
        let float_series = df
            .column(column)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let keep_missing = self.missing_values == MissingValuePolicy::Keep;

        let mask_values: Vec<bool> = float_series
            .f64()?
            .into_iter()
            .map(|opt_val| match opt_val {
                Some(val) if !val.is_nan() => bounds.contains(val),
                _ => keep_missing,
            })
            .collect();

        let mask = BooleanChunked::from_slice("mask".into(), &mask_values);
        Ok(df.filter(&mask)?)
    }

    fn skip(&self, column: &str, error: PreprocessingError) -> OutlierOutcome {
        let reason = match &error {
            PreprocessingError::ColumnNotFound(_) => SkipReason::ColumnNotFound,
            PreprocessingError::NoValidValues(_) => SkipReason::NoValidValues,
            PreprocessingError::TypeConversionFailed { reason, .. } => {
                SkipReason::NonNumeric(reason.clone())
            }
            other => SkipReason::NonNumeric(other.to_string()),
        };
        warn!("Error cleaning column {}: {}", column, error);
        OutlierOutcome::Skipped {
            column: column.to_string(),
            reason,
        }
    }
}
