//! Shared utilities for the listing preprocessing pipeline.

use crate::error::{PreprocessingError, Result};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check whether `df` has a column called `name`.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Fetch a column as a materialized series, or fail with
/// [`PreprocessingError::ColumnNotFound`].
pub fn required_series(df: &DataFrame, name: &str) -> Result<Series> {
    if !has_column(df, name) {
        return Err(PreprocessingError::ColumnNotFound(name.to_string()));
    }
    Ok(df.column(name)?.as_materialized_series().clone())
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Parse a trimmed string as `f64`.
///
/// Empty strings and textual NaN (`"nan"`, `"NaN"`) yield `None`, so a
/// missing value is always represented as null rather than NaN.
///
/// ```rust,ignore
/// assert_eq!(parse_numeric_string(" 2.0 "), Some(2.0));
/// assert_eq!(parse_numeric_string("nan"), None);
/// ```
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Render a column as text, one `Option<String>` per row.
///
/// Numeric columns are cast to strings first so already-clean columns can
/// run through the same text normalization again.
pub fn series_as_text(series: &Series) -> Result<Vec<Option<String>>> {
    let as_str = series.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Collect the non-null, non-NaN values of a numeric series as `f64`.
pub fn present_values(series: &Series) -> Result<Vec<f64>> {
    let as_f64 = series.cast(&DataType::Float64)?;
    Ok(as_f64
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect())
}

// =============================================================================
// Statistics Utilities
// =============================================================================

/// Quantile of an ascending-sorted slice using linear interpolation between
/// the two nearest ranks.
///
/// Returns `None` for an empty slice.
pub fn quantile_sorted(values: &[f64], quantile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let pos = quantile.clamp(0.0, 1.0) * (values.len() as f64 - 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(values[lower]);
    }
    let weight = pos - lower as f64;
    Some(values[lower] + (values[upper] - values[lower]) * weight)
}
