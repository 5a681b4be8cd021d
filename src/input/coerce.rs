//! Lenient scalar coercion for request fields.
//!
//! Requests arrive as flat JSON objects filled in by a web form, so a numeric
//! field may hold a JSON number, a string with a comma decimal separator, an
//! empty string, `null`, or a placeholder such as `"user input needed"`. None
//! of these may fail a run: each accessor returns the parsed value or the
//! caller's default.

use serde_json::{Map, Value};
use tracing::warn;

/// Strings that mean "no value provided" (compared case-insensitively).
pub const MISSING_SENTINELS: &[&str] = &["user input needed", "nan", "null", "none", "n/a"];

/// Check whether `text` is one of the [`MISSING_SENTINELS`].
pub fn is_sentinel(text: &str) -> bool {
    MISSING_SENTINELS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(text.trim()))
}

/// Parse a number from user text.
///
/// Accepts `.` or `,` as the decimal separator. Returns `None` for empty
/// text, sentinels, garbage and non-finite results.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || is_sentinel(text) {
        return None;
    }

    let normalized = text.replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce a JSON value to a finite number.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Read-only view over a flat request object.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// Whether any of `keys` is present (even with an unusable value).
    pub fn has_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.map.contains_key(*k))
    }

    /// First usable number among `keys`, tried in order.
    pub fn number_any(&self, keys: &[&str]) -> Option<f64> {
        keys.iter()
            .filter_map(|k| self.map.get(*k))
            .find_map(coerce_f64)
    }

    /// Number under `key`, or `default`.
    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        self.number_any_or(&[key], default)
    }

    /// First usable number among `keys`, or `default`.
    ///
    /// A key that is present but unusable is logged once at warn level.
    pub fn number_any_or(&self, keys: &[&str], default: f64) -> f64 {
        match self.number_any(keys) {
            Some(v) => v,
            None => {
                if let Some(raw) = keys.iter().find_map(|k| self.map.get(*k)) {
                    if !raw.is_null() {
                        warn!(field = keys[0], value = %raw, default, "unusable numeric input, using default");
                    }
                }
                default
            }
        }
    }

    /// Strictly positive number among `keys`, or `default`.
    pub fn positive_any_or(&self, keys: &[&str], default: f64) -> f64 {
        match self.number_any(keys) {
            Some(v) if v > 0.0 => v,
            Some(v) => {
                warn!(field = keys[0], value = v, default, "non-positive input, using default");
                default
            }
            None => self.number_any_or(keys, default),
        }
    }

    /// Strictly positive number under `key`, or `default`.
    pub fn positive_or(&self, key: &str, default: f64) -> f64 {
        self.positive_any_or(&[key], default)
    }

    /// Truthy flag: a non-zero number, `true`, or a string such as `"1"`/`"true"`/`"yes"`.
    pub fn flag(&self, key: &str) -> bool {
        match self.map.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("true")
                    || s.eq_ignore_ascii_case("yes")
                    || parse_number(s).is_some_and(|v| v != 0.0)
            }
            Some(other) => coerce_f64(other).is_some_and(|v| v != 0.0),
            None => false,
        }
    }

    /// First non-empty, non-sentinel text among `keys`. Numbers are rendered as text.
    pub fn text_any(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.map.get(*k))
            .find_map(name_of)
    }

    /// Nested object under `key`.
    pub fn object(&self, key: &str) -> Option<Fields<'a>> {
        self.map.get(key).and_then(Value::as_object).map(Fields::new)
    }

    /// List of names under `key`.
    ///
    /// Accepts an array of strings or numbers, or a single string. Empty and
    /// sentinel entries are dropped. Returns `None` when the key is absent so
    /// callers can apply their own default list.
    pub fn names(&self, key: &str) -> Option<Vec<String>> {
        let value = self.map.get(key)?;
        let names = match value {
            Value::Array(items) => items.iter().filter_map(name_of).collect(),
            other => name_of(other).into_iter().collect(),
        };
        Some(names)
    }
}

fn name_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() || is_sentinel(&text) {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("4,7"), Some(4.7));
        assert_eq!(parse_number(" 230 "), Some(230.0));
        assert_eq!(parse_number("1e-6"), Some(1e-6));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("User Input Needed"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_coerce_values() {
        assert_eq!(coerce_f64(&json!(12)), Some(12.0));
        assert_eq!(coerce_f64(&json!("0,95")), Some(0.95));
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!([1, 2])), None);
        assert_eq!(coerce_f64(&json!(true)), Some(1.0));
    }

    #[test]
    fn test_fields_defaults_and_alternates() {
        let map = object(json!({
            "V_in_RMS": "230",
            "outVol": "",
            "outPow": "user input needed",
            "Tamb_input": null,
            "cost": -5,
        }));
        let fields = Fields::new(&map);

        assert_eq!(fields.number_any_or(&["vin", "V_in_RMS", "V_in"], 110.0), 230.0);
        assert_eq!(fields.number_any_or(&["outVol", "V_out"], 400.0), 400.0);
        assert_eq!(fields.positive_or("outPow", 500.0), 500.0);
        assert_eq!(fields.number_or("Tamb_input", 25.0), 25.0);
        assert_eq!(fields.positive_or("cost", 1.0), 1.0);
        assert_eq!(fields.number_or("cost", 1.0), -5.0);
        assert_eq!(fields.number_or("missing", 7.5), 7.5);
    }

    #[test]
    fn test_flags() {
        let map = object(json!({"a": 1, "b": 0, "c": "1", "d": true, "e": "false", "f": "yes"}));
        let fields = Fields::new(&map);
        assert!(fields.flag("a"));
        assert!(!fields.flag("b"));
        assert!(fields.flag("c"));
        assert!(fields.flag("d"));
        assert!(!fields.flag("e"));
        assert!(fields.flag("f"));
        assert!(!fields.flag("missing"));
    }

    #[test]
    fn test_names() {
        let map = object(json!({
            "list": ["IPP60R099C6", "", "none", 42],
            "single": "ETD29",
            "bad": {"x": 1},
        }));
        let fields = Fields::new(&map);
        assert_eq!(
            fields.names("list"),
            Some(vec!["IPP60R099C6".to_string(), "42".to_string()])
        );
        assert_eq!(fields.names("single"), Some(vec!["ETD29".to_string()]));
        assert_eq!(fields.names("bad"), Some(vec![]));
        assert_eq!(fields.names("missing"), None);
    }
}
