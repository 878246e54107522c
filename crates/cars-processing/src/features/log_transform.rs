//! Natural-log transforms of skewed numeric columns.

use crate::config::DEFAULT_LOG_FLOOR;
use crate::error::{Result, ResultExt};
use crate::types::columns;
use crate::utils::required_series;
use polars::prelude::*;
use tracing::debug;

/// Appends `Mileage_log`, `Levy_log` and `Engine_volume_log`.
///
/// A logarithm that is not finite (zero gives `-inf`, negatives give NaN) is
/// replaced by `floor`. Zero levies are raised to `floor` before taking the
/// logarithm. Null inputs stay null.
#[derive(Debug, Clone, Copy)]
pub struct LogTransformer {
    floor: f64,
}

impl Default for LogTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_FLOOR)
    }
}

impl LogTransformer {
    pub fn new(floor: f64) -> Self {
        Self { floor }
    }

    /// Floored natural logarithm of a single value.
    pub fn floored_ln(&self, value: f64) -> f64 {
        let ln = value.ln();
        if ln.is_finite() { ln } else { self.floor }
    }

    /// Return a copy of `df` with the three log columns appended.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();

        for column in columns::LOG_COLUMNS {
            let source = required_series(df, column)?
                .cast(&DataType::Float64)
                .context(format!("Casting '{}' for log transform", column))?;
            let raise_zero = column == columns::LEVY;

            let logged: Vec<Option<f64>> = source
                .f64()?
                .into_iter()
                .map(|opt_val| {
                    opt_val.map(|v| {
                        let v = if raise_zero && v == 0.0 { self.floor } else { v };
                        self.floored_ln(v)
                    })
                })
                .collect();

            let name = columns::log_column_name(column);
            debug!("Appending '{}'", name);
            out.with_column(Series::new(name.as_str().into(), logged))
                .context(format!("Appending '{}'", name))?;
        }

        Ok(out)
    }
}
