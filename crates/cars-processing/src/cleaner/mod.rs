//! Data cleaning module for listing tables.
//!
//! This module provides functionality for:
//! - Removing exact-duplicate rows
//! - Coercing the text-encoded `Levy`, `Engine volume` and `Mileage` columns
//!   to numbers
//! - Pruning columns that carry no signal for modeling
//!
//! Every operation takes the table by reference and returns a new one; the
//! caller's table is never modified.

mod converters;
mod sanitizers;

pub use sanitizers::{parse_engine_volume, parse_levy, parse_mileage, strip_turbo_marker};

use crate::error::{Result, ResultExt};
use crate::types::columns;
use crate::utils::{has_column, required_series};
use polars::prelude::*;
use tracing::debug;

/// Row- and column-level table cleanup.
pub struct DataCleaner;

impl DataCleaner {
    /// Remove exact-duplicate rows, keeping the first occurrence and the
    /// original row order.
    ///
    /// Returns the deduplicated table and the number of rows removed.
    pub fn remove_duplicates(df: &DataFrame) -> Result<(DataFrame, usize)> {
        let before = df.height();
        let deduped = df
            .unique_stable(None, UniqueKeepStrategy::First, None)
            .context("Removing duplicate rows")?;
        let removed = before - deduped.height();

        if removed > 0 {
            debug!("Removed {} duplicate rows", removed);
        } else {
            debug!("No duplicate rows found");
        }

        Ok((deduped, removed))
    }

    /// Drop the named columns that are present; absent names are ignored.
    ///
    /// Returns the pruned table and the names actually dropped.
    pub fn drop_columns(df: &DataFrame, names: &[String]) -> (DataFrame, Vec<String>) {
        let present: Vec<String> = names
            .iter()
            .filter(|name| has_column(df, name))
            .cloned()
            .collect();

        if present.is_empty() {
            return (df.clone(), present);
        }

        let cols_ref: Vec<PlSmallStr> = present.iter().map(|s| s.as_str().into()).collect();
        let pruned = df.drop_many(cols_ref);
        debug!("Dropped columns: {:?}", present);
        (pruned, present)
    }
}

/// Coerces the text-encoded numeric listing columns to Float64.
///
/// - `Levy`: `-`, blanks and unparseable cells become `0`; never null
/// - `Engine volume`: the `Turbo` marker is removed (any case); unparseable
///   cells become null
/// - `Mileage`: the `km` unit is removed; unparseable cells become null
pub struct CategoricalNormalizer;

impl CategoricalNormalizer {
    /// Return a copy of `df` with the three columns converted.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessingError::ColumnNotFound`](crate::PreprocessingError::ColumnNotFound)
    /// if any of the three columns is absent. Malformed cells never error.
    pub fn normalize(df: &DataFrame) -> Result<DataFrame> {
        let levy = converters::levy_to_numeric(&required_series(df, columns::LEVY)?)?;
        let engine_volume =
            converters::engine_volume_to_numeric(&required_series(df, columns::ENGINE_VOLUME)?)?;
        let mileage = converters::mileage_to_numeric(&required_series(df, columns::MILEAGE)?)?;

        debug!(
            "Normalized columns: {} nulls in '{}', {} in '{}'",
            engine_volume.null_count(),
            columns::ENGINE_VOLUME,
            mileage.null_count(),
            columns::MILEAGE
        );

        let mut out = df.clone();
        out.replace(columns::LEVY, levy)
            .context("Replacing Levy column")?;
        out.replace(columns::ENGINE_VOLUME, engine_volume)
            .context("Replacing Engine volume column")?;
        out.replace(columns::MILEAGE, mileage)
            .context("Replacing Mileage column")?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreprocessingError;
    use pretty_assertions::assert_eq;

    fn raw_listings() -> DataFrame {
        df![
            "Price" => [15000i64, 8000, 15000],
            "Levy" => ["-", "1399", "-"],
            "Engine volume" => ["2.0 Turbo", "1.6", "2.0 Turbo"],
            "Mileage" => ["100000 km", "200000 km", "100000 km"],
            "Manufacturer" => ["TOYOTA", "HONDA", "TOYOTA"],
        ]
        .unwrap()
    }

    #[test]
    fn test_remove_duplicates_keeps_first_in_order() {
        let df = raw_listings();
        let (deduped, removed) = DataCleaner::remove_duplicates(&df).unwrap();

        assert_eq!(removed, 1);
        assert_eq!(deduped.height(), 2);
        let prices: Vec<Option<i64>> = deduped
            .column("Price")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(prices, vec![Some(15000), Some(8000)]);

        // Input untouched
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn test_remove_duplicates_none_found() {
        let df = df!["a" => [1, 2, 3]].unwrap();
        let (deduped, removed) = DataCleaner::remove_duplicates(&df).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(deduped.height(), 3);
    }

    #[test]
    fn test_drop_columns_ignores_absent() {
        let df = df![
            "Doors" => ["04-May", "02-Mar"],
            "Price" => [1, 2],
        ]
        .unwrap();

        let (pruned, dropped) =
            DataCleaner::drop_columns(&df, &["Doors".to_string(), "Prod. year".to_string()]);

        assert_eq!(dropped, vec!["Doors".to_string()]);
        assert_eq!(pruned.width(), 1);
        assert!(!has_column(&pruned, "Doors"));
        assert!(has_column(&df, "Doors"));
    }

    #[test]
    fn test_normalize_converts_three_columns() {
        let df = raw_listings();
        let out = CategoricalNormalizer::normalize(&df).unwrap();

        for name in ["Levy", "Engine volume", "Mileage"] {
            assert_eq!(out.column(name).unwrap().dtype(), &DataType::Float64);
        }
        let levy: Vec<Option<f64>> = out.column("Levy").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(levy, vec![Some(0.0), Some(1399.0), Some(0.0)]);

        let engine = out.column("Engine volume").unwrap().f64().unwrap();
        assert_eq!(engine.get(0), Some(2.0));
        let mileage = out.column("Mileage").unwrap().f64().unwrap();
        assert_eq!(mileage.get(1), Some(200000.0));

        // Untouched columns and the caller's table are preserved
        assert_eq!(out.column("Manufacturer").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("Levy").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_normalize_missing_column_is_structural() {
        let df = df![
            "Levy" => ["-"],
            "Mileage" => ["10 km"],
        ]
        .unwrap();

        let err = CategoricalNormalizer::normalize(&df).unwrap_err();
        assert!(matches!(err, PreprocessingError::ColumnNotFound(ref c) if c == "Engine volume"));
    }

    #[test]
    fn test_normalize_is_repeatable() {
        let once = CategoricalNormalizer::normalize(&raw_listings()).unwrap();
        let twice = CategoricalNormalizer::normalize(&once).unwrap();
        assert!(once.equals_missing(&twice));
    }
}
