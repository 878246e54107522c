//! Cell-level sanitization of the text-encoded numeric listing fields.

use crate::utils::parse_numeric_string;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the turbo marker in any letter case.
static TURBO_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)turbo").expect("Invalid regex: turbo marker"));

/// Tokens the source data uses for "no levy".
const NO_LEVY_TOKENS: [&str; 2] = ["-", ""];

/// Unit suffix carried by mileage values.
const MILEAGE_UNIT: &str = "km";

/// Parse a raw levy cell.
///
/// `-`, blank and whitespace-only cells are a levy of zero, as is a missing
/// cell. Anything that still fails to parse, and negative or NaN amounts,
/// collapse to zero too, so the result is always a non-negative number.
pub fn parse_levy(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let trimmed = raw.trim();
    let token = if NO_LEVY_TOKENS.contains(&trimmed) {
        "0"
    } else {
        trimmed
    };

    match parse_numeric_string(token) {
        Some(v) if v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Strip every case-insensitive `turbo` marker from an engine volume cell.
pub fn strip_turbo_marker(raw: &str) -> String {
    TURBO_MARKER.replace_all(raw, "").into_owned()
}

/// Parse a raw engine volume cell; `"2.0 Turbo"` becomes `2.0`.
///
/// Only the marker is removed. Unparseable cells become `None`.
pub fn parse_engine_volume(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|v| parse_numeric_string(&strip_turbo_marker(v)))
}

/// Parse a raw mileage cell; `"150000 km"` becomes `150000`.
///
/// The unit is matched case-sensitively. Unparseable cells become `None`.
pub fn parse_mileage(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|v| parse_numeric_string(&v.replace(MILEAGE_UNIT, "")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levy_no_levy_tokens() {
        assert_eq!(parse_levy(Some("-")), 0.0);
        assert_eq!(parse_levy(Some("")), 0.0);
        assert_eq!(parse_levy(Some("   ")), 0.0);
        assert_eq!(parse_levy(Some(" - ")), 0.0);
        assert_eq!(parse_levy(None), 0.0);
    }

    #[test]
    fn test_parse_levy_numbers() {
        assert_eq!(parse_levy(Some("1399")), 1399.0);
        assert_eq!(parse_levy(Some(" 862 ")), 862.0);
        assert_eq!(parse_levy(Some("1018.5")), 1018.5);
    }

    #[test]
    fn test_parse_levy_garbage_is_zero() {
        assert_eq!(parse_levy(Some("n/a")), 0.0);
        assert_eq!(parse_levy(Some("--")), 0.0);
        assert_eq!(parse_levy(Some("nan")), 0.0);
        assert_eq!(parse_levy(Some("-5")), 0.0);
    }

    #[test]
    fn test_parse_engine_volume() {
        assert_eq!(parse_engine_volume(Some("2000 Turbo")), Some(2000.0));
        assert_eq!(parse_engine_volume(Some("2.0 Turbo")), Some(2.0));
        assert_eq!(parse_engine_volume(Some("1.8 turbo")), Some(1.8));
        assert_eq!(parse_engine_volume(Some("3.5 TURBO")), Some(3.5));
        assert_eq!(parse_engine_volume(Some("1.6")), Some(1.6));
        assert_eq!(parse_engine_volume(Some("V8")), None);
        assert_eq!(parse_engine_volume(None), None);
    }

    #[test]
    fn test_strip_turbo_marker_only_removes_marker() {
        assert_eq!(strip_turbo_marker("2.0 TurboTurbo"), "2.0 ");
        assert_eq!(strip_turbo_marker("1.4"), "1.4");
    }

    #[test]
    fn test_parse_mileage() {
        assert_eq!(parse_mileage(Some("150000 km")), Some(150000.0));
        assert_eq!(parse_mileage(Some("0 km")), Some(0.0));
        assert_eq!(parse_mileage(Some("98000")), Some(98000.0));
        assert_eq!(parse_mileage(Some("lots km")), None);
        assert_eq!(parse_mileage(None), None);
    }

    #[test]
    fn test_parse_mileage_unit_is_case_sensitive() {
        assert_eq!(parse_mileage(Some("150000 KM")), None);
    }
}
