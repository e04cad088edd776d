//! Cell normalization and habit classification
//!
//! This module turns raw logbook values into typed observations:
//! - NA-like tokens collapse into a single `Cell::Absent`
//! - Binary habits map 1/true and 0/false onto the tri-state
//! - Duration habits are thresholded into the tri-state
//! - Activity cells become optional minute counts
//!
//! Values outside a habit's domain are rejected with a descriptive error
//! instead of being miscounted.

use crate::error::ComputeError;
use crate::types::{Cell, HabitKind, HabitSeries, HabitState};
use serde_json::Value;

/// Tokens (compared case-insensitively after trimming) that mean "nothing recorded"
pub const NA_TOKENS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "-"];

/// Normalizer for raw cells
pub struct Normalizer;

impl Normalizer {
    /// Normalize a JSON value from a logbook row
    pub fn cell_from_json(value: &Value) -> Cell {
        match value {
            Value::Null => Cell::Absent,
            Value::Bool(b) => Cell::Flag(*b),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.is_nan() => Cell::Absent,
                Some(f) => Cell::Number(f),
                None => Cell::Text(n.to_string()),
            },
            Value::String(s) => Self::cell_from_str(s),
            other => Cell::Text(other.to_string()),
        }
    }

    /// Normalize a textual cell (CSV field or JSON string)
    pub fn cell_from_str(raw: &str) -> Cell {
        let trimmed = raw.trim();

        if is_na_token(trimmed) {
            return Cell::Absent;
        }

        if let Some(n) = parse_number(trimmed) {
            return Cell::Number(n);
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "true" => Cell::Flag(true),
            "false" => Cell::Flag(false),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    /// Classify one cell for a habit of the given kind
    pub fn classify(cell: &Cell, kind: HabitKind) -> Result<HabitState, ComputeError> {
        match (kind, cell) {
            (_, Cell::Absent) => Ok(HabitState::Absent),

            (HabitKind::Binary, Cell::Flag(true)) => Ok(HabitState::Completed),
            (HabitKind::Binary, Cell::Flag(false)) => Ok(HabitState::NotCompleted),
            (HabitKind::Binary, Cell::Number(n)) if *n == 1.0 => Ok(HabitState::Completed),
            (HabitKind::Binary, Cell::Number(n)) if *n == 0.0 => Ok(HabitState::NotCompleted),

            (HabitKind::Duration { threshold_minutes }, Cell::Number(minutes))
                if minutes.is_finite() && *minutes >= 0.0 =>
            {
                if *minutes >= threshold_minutes {
                    Ok(HabitState::Completed)
                } else {
                    Ok(HabitState::NotCompleted)
                }
            }

            (kind, cell) => Err(ComputeError::OutOfDomain(format!(
                "{} is not a valid {} habit value",
                cell.describe(),
                kind.as_str()
            ))),
        }
    }

    /// Classify a whole column, ascending by date
    pub fn classify_series<'a, I>(cells: I, kind: HabitKind) -> Result<HabitSeries, ComputeError>
    where
        I: IntoIterator<Item = &'a Cell>,
    {
        cells
            .into_iter()
            .map(|cell| Self::classify(cell, kind))
            .collect()
    }

    /// Minutes logged for an activity cell; `None` when absent
    pub fn minutes(cell: &Cell) -> Result<Option<f64>, ComputeError> {
        match cell {
            Cell::Absent => Ok(None),
            Cell::Number(n) if n.is_finite() && *n >= 0.0 => Ok(Some(*n)),
            other => Err(ComputeError::OutOfDomain(format!(
                "{} is not a valid minute count",
                other.describe()
            ))),
        }
    }
}

fn is_na_token(trimmed: &str) -> bool {
    NA_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Parse a number, accepting a decimal comma as spreadsheets in some locales write it.
///
/// The comma is only read as a decimal separator when it is the sole separator
/// and is not followed by exactly three digits, so "1,000" stays text instead of
/// becoming 1.0.
fn parse_number(trimmed: &str) -> Option<f64> {
    let parsed = match trimmed.parse::<f64>() {
        Ok(value) => value,
        Err(_) => decimal_comma(trimmed)?.parse::<f64>().ok()?,
    };

    // "inf" and "nan" parse as floats but are not numbers a logbook would hold
    if parsed.is_finite() {
        Some(parsed)
    } else {
        None
    }
}

fn decimal_comma(trimmed: &str) -> Option<String> {
    if trimmed.contains('.') || trimmed.matches(',').count() != 1 {
        return None;
    }
    let (_, fraction) = trimmed.split_once(',')?;
    if fraction.len() == 3 && fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(trimmed.replacen(',', ".", 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TWENTY: HabitKind = HabitKind::Duration {
        threshold_minutes: 20.0,
    };

    #[test]
    fn test_na_tokens_become_absent() {
        for raw in ["", "   ", "NA", "na", " N/A ", "NaN", "null", "None"] {
            assert_eq!(Normalizer::cell_from_str(raw), Cell::Absent, "token {:?}", raw);
        }
        assert_eq!(Normalizer::cell_from_json(&Value::Null), Cell::Absent);
        assert_eq!(Normalizer::cell_from_json(&json!(" ")), Cell::Absent);
    }

    #[test]
    fn test_zero_is_not_absent() {
        assert_eq!(Normalizer::cell_from_str("0"), Cell::Number(0.0));
        assert_eq!(Normalizer::cell_from_json(&json!(0)), Cell::Number(0.0));
    }

    #[test]
    fn test_number_parsing() {
        assert_eq!(Normalizer::cell_from_str("35"), Cell::Number(35.0));
        assert_eq!(Normalizer::cell_from_str("12,5"), Cell::Number(12.5));
        assert_eq!(Normalizer::cell_from_json(&json!(42.5)), Cell::Number(42.5));
        assert_eq!(Normalizer::cell_from_str("TRUE"), Cell::Flag(true));
        assert_eq!(
            Normalizer::cell_from_str("bieganie"),
            Cell::Text("bieganie".to_string())
        );
        assert_eq!(Normalizer::cell_from_str("inf"), Cell::Text("inf".to_string()));
    }

    #[test]
    fn test_thousands_separator_is_not_a_decimal_comma() {
        assert_eq!(Normalizer::cell_from_str("1,000"), Cell::Text("1,000".to_string()));
        assert_eq!(Normalizer::cell_from_str("1,5,0"), Cell::Text("1,5,0".to_string()));
        assert_eq!(Normalizer::cell_from_str("1.000,5"), Cell::Text("1.000,5".to_string()));
        assert_eq!(Normalizer::cell_from_str("0,25"), Cell::Number(0.25));

        assert!(Normalizer::minutes(&Normalizer::cell_from_str("1,000")).is_err());
        assert!(Normalizer::classify(&Normalizer::cell_from_str("1,000"), TWENTY).is_err());
    }

    #[test]
    fn test_binary_classification() {
        let kind = HabitKind::Binary;
        assert_eq!(
            Normalizer::classify(&Cell::Number(1.0), kind).unwrap(),
            HabitState::Completed
        );
        assert_eq!(
            Normalizer::classify(&Cell::Flag(false), kind).unwrap(),
            HabitState::NotCompleted
        );
        assert_eq!(
            Normalizer::classify(&Cell::Absent, kind).unwrap(),
            HabitState::Absent
        );
    }

    #[test]
    fn test_binary_rejects_out_of_domain() {
        let err = Normalizer::classify(&Cell::Number(2.0), HabitKind::Binary).unwrap_err();
        assert!(matches!(err, ComputeError::OutOfDomain(_)));
        assert!(Normalizer::classify(&Cell::Text("yes".into()), HabitKind::Binary).is_err());
    }

    #[test]
    fn test_duration_threshold() {
        assert_eq!(
            Normalizer::classify(&Cell::Number(20.0), TWENTY).unwrap(),
            HabitState::Completed
        );
        assert_eq!(
            Normalizer::classify(&Cell::Number(19.5), TWENTY).unwrap(),
            HabitState::NotCompleted
        );
        assert_eq!(
            Normalizer::classify(&Cell::Number(0.0), TWENTY).unwrap(),
            HabitState::NotCompleted
        );
        assert_eq!(
            Normalizer::classify(&Cell::Absent, TWENTY).unwrap(),
            HabitState::Absent
        );
        assert!(Normalizer::classify(&Cell::Number(-3.0), TWENTY).is_err());
        assert!(Normalizer::classify(&Cell::Flag(true), TWENTY).is_err());
    }

    #[test]
    fn test_classify_series_keeps_order() {
        let cells = [
            Cell::Number(30.0),
            Cell::Absent,
            Cell::Number(5.0),
            Cell::Number(45.0),
        ];
        let series = Normalizer::classify_series(&cells, TWENTY).unwrap();
        assert_eq!(
            series,
            vec![
                HabitState::Completed,
                HabitState::Absent,
                HabitState::NotCompleted,
                HabitState::Completed
            ]
        );
    }

    #[test]
    fn test_minutes() {
        assert_eq!(Normalizer::minutes(&Cell::Absent).unwrap(), None);
        assert_eq!(Normalizer::minutes(&Cell::Number(0.0)).unwrap(), Some(0.0));
        assert!(Normalizer::minutes(&Cell::Text("x".into())).is_err());
        assert!(Normalizer::minutes(&Cell::Number(-1.0)).is_err());
    }
}
