//! Column-level conversions of text-encoded listing fields to Float64.

use super::sanitizers::{parse_engine_volume, parse_levy, parse_mileage};
use crate::error::Result;
use crate::utils::series_as_text;
use polars::prelude::*;

/// Convert a levy column to non-negative Float64 with no nulls.
pub(crate) fn levy_to_numeric(series: &Series) -> Result<Series> {
    let values: Vec<f64> = series_as_text(series)?
        .iter()
        .map(|v| parse_levy(v.as_deref()))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Convert an engine volume column to Float64, dropping the turbo marker.
pub(crate) fn engine_volume_to_numeric(series: &Series) -> Result<Series> {
    let values: Vec<Option<f64>> = series_as_text(series)?
        .iter()
        .map(|v| parse_engine_volume(v.as_deref()))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

/// Convert a mileage column to Float64 kilometres.
pub(crate) fn mileage_to_numeric(series: &Series) -> Result<Series> {
    let values: Vec<Option<f64>> = series_as_text(series)?
        .iter()
        .map(|v| parse_mileage(v.as_deref()))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_values(series: &Series) -> Vec<Option<f64>> {
        series.f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_levy_to_numeric() {
        let series = Series::new("Levy".into(), &[Some("1399"), Some("-"), Some(""), None, Some("x")]);
        let result = levy_to_numeric(&series).unwrap();

        assert_eq!(result.dtype(), &DataType::Float64);
        assert_eq!(result.null_count(), 0);
        assert_eq!(
            f64_values(&result),
            vec![Some(1399.0), Some(0.0), Some(0.0), Some(0.0), Some(0.0)]
        );
    }

    #[test]
    fn test_levy_to_numeric_from_integers() {
        let series = Series::new("Levy".into(), &[Some(500i64), None]);
        let result = levy_to_numeric(&series).unwrap();
        assert_eq!(f64_values(&result), vec![Some(500.0), Some(0.0)]);
    }

    #[test]
    fn test_engine_volume_to_numeric() {
        let series = Series::new("Engine volume".into(), &["2.0 Turbo", "1.6", "bad"]);
        let result = engine_volume_to_numeric(&series).unwrap();

        assert_eq!(result.name().as_str(), "Engine volume");
        assert_eq!(f64_values(&result), vec![Some(2.0), Some(1.6), None]);
    }

    #[test]
    fn test_engine_volume_from_floats_is_unchanged() {
        let series = Series::new("Engine volume".into(), &[2.0, 1.6]);
        let result = engine_volume_to_numeric(&series).unwrap();
        assert_eq!(f64_values(&result), vec![Some(2.0), Some(1.6)]);
    }

    #[test]
    fn test_mileage_to_numeric() {
        let series = Series::new("Mileage".into(), &[Some("150000 km"), Some("unknown"), None]);
        let result = mileage_to_numeric(&series).unwrap();
        assert_eq!(f64_values(&result), vec![Some(150000.0), None, None]);
    }
}
