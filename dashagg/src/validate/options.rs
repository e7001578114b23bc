//! Literal-format checks on well-known option values
//!
//! These run for every axis entry regardless of its function.

use crate::chart::OrderSpec;
use crate::error::ValidationError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static TIME_ZONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]\d{2}:\d{2}$").expect("static regex"));

static FIXED_INTERVAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[smhdwMy]$").expect("static regex"));

#[derive(Debug, Clone, Copy)]
enum Format {
    TimeZone,
    FixedInterval,
    Number,
    Count,
    Text,
    Order,
}

/// Checked options, in the order they are checked
const FORMATS: [(&str, Format); 8] = [
    ("timeZone", Format::TimeZone),
    ("fixed_interval", Format::FixedInterval),
    ("size", Format::Count),
    ("interval", Format::Number),
    ("min_doc_count", Format::Count),
    ("terms_size", Format::Count),
    ("missing", Format::Text),
    ("order", Format::Order),
];

/// Check every well-known option present in `get`; first failure wins.
pub fn check_formats<'a>(
    get: impl Fn(&str) -> Option<&'a Value>,
) -> Result<(), ValidationError> {
    for (option, format) in FORMATS {
        let Some(value) = get(option) else {
            continue;
        };
        if let Some(expected) = check(format, value) {
            return Err(ValidationError::InvalidOptionFormat {
                option: option.to_string(),
                value: display(value),
                expected,
            });
        }
    }
    Ok(())
}

/// Returns the expectation text when `value` does not match `format`
fn check(format: Format, value: &Value) -> Option<&'static str> {
    let ok = match format {
        Format::TimeZone => value.as_str().is_some_and(|s| TIME_ZONE.is_match(s)),
        Format::FixedInterval => value.as_str().is_some_and(|s| FIXED_INTERVAL.is_match(s)),
        Format::Number => value.is_number(),
        Format::Count => value.as_u64().is_some(),
        Format::Text => value.is_string(),
        Format::Order => OrderSpec::parse(value).is_ok(),
    };
    if ok {
        return None;
    }
    Some(match format {
        Format::TimeZone => "Expected a signed HH:mm offset such as +05:30.",
        Format::FixedInterval => "Expected a number followed by one of s, m, h, d, w, M, y.",
        Format::Number => "Must be a number.",
        Format::Count => "Must be a non-negative integer.",
        Format::Text => "Must be a string.",
        Format::Order => {
            "Expected {\"field\": \"_count\" | \"value_axis.<index>\", \"direction\": \"asc\" | \"desc\"}."
        }
    })
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn run(options: Value) -> Result<(), ValidationError> {
        let map: HashMap<String, Value> = serde_json::from_value(options).unwrap();
        check_formats(|k| map.get(k))
    }

    fn code(options: Value) -> &'static str {
        run(options).unwrap_err().code()
    }

    #[test]
    fn test_valid_options_pass() {
        run(json!({
            "timeZone": "+05:30",
            "fixed_interval": "1h",
            "size": 10,
            "interval": 50,
            "min_doc_count": 1,
            "terms_size": 5,
            "missing": "No Status",
            "order": {"field": "value_axis.0", "direction": "asc"}
        }))
        .unwrap();
    }

    #[test]
    fn test_time_zone_format() {
        assert_eq!(code(json!({"timeZone": "Asia/Calcutta"})), "INVALID_TIMEZONE_FORMAT");
        assert_eq!(code(json!({"timeZone": "+5:30"})), "INVALID_TIMEZONE_FORMAT");
        run(json!({"timeZone": "-12:45"})).unwrap();
    }

    #[test]
    fn test_fixed_interval_units() {
        for ok in ["30s", "5m", "2h", "1d", "1w", "3M", "1y"] {
            run(json!({ "fixed_interval": ok })).unwrap();
        }
        assert_eq!(code(json!({"fixed_interval": "1 h"})), "INVALID_FIXED_INTERVAL");
        assert_eq!(code(json!({"fixed_interval": "h"})), "INVALID_FIXED_INTERVAL");
        assert_eq!(code(json!({"fixed_interval": 60})), "INVALID_FIXED_INTERVAL");
    }

    #[test]
    fn test_numeric_options() {
        assert_eq!(code(json!({"size": "10"})), "INVALID_SIZE");
        assert_eq!(code(json!({"interval": true})), "INVALID_INTERVAL");
        assert_eq!(code(json!({"min_doc_count": "0"})), "INVALID_MIN_DOC_COUNT");
        assert_eq!(code(json!({"terms_size": [3]})), "INVALID_TERMS_SIZE");
    }

    #[test]
    fn test_counts_must_be_non_negative_integers() {
        assert_eq!(code(json!({"terms_size": -3})), "INVALID_TERMS_SIZE");
        assert_eq!(code(json!({"terms_size": 2.9})), "INVALID_TERMS_SIZE");
        assert_eq!(code(json!({"terms_size": -1.0})), "INVALID_TERMS_SIZE");
        assert_eq!(code(json!({"size": 4.5})), "INVALID_SIZE");
        assert_eq!(code(json!({"min_doc_count": -2})), "INVALID_MIN_DOC_COUNT");

        let err = run(json!({"terms_size": -3})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid terms_size: -3. Must be a non-negative integer."
        );

        // fractional intervals stay valid for histograms
        run(json!({"interval": 0.5, "terms_size": 0, "min_doc_count": 1})).unwrap();
    }

    #[test]
    fn test_missing_must_be_string() {
        let err = run(json!({"missing": 0})).unwrap_err();
        assert_eq!(err.code(), "INVALID_OPTION_MISSING");
        assert_eq!(err.to_string(), "Invalid missing: 0. Must be a string.");
    }

    #[test]
    fn test_order_shape() {
        assert_eq!(code(json!({"order": "asc"})), "INVALID_ORDER");
        assert_eq!(code(json!({"order": {"field": "holdCount"}})), "INVALID_ORDER");
    }

    #[test]
    fn test_first_failure_in_check_order() {
        // timeZone is checked before size
        let err = run(json!({"size": "x", "timeZone": "bad"})).unwrap_err();
        assert_eq!(err.code(), "INVALID_TIMEZONE_FORMAT");
    }
}
