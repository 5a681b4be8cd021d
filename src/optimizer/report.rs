//! Flat design reports.
//!
//! A report is an ordered map from a result name (`BestTotalEfficiency`,
//! `BestPriFet_Name`, `t1`, ...) to a number, a text or a numeric series. It
//! serializes to a flat JSON object. Non-finite numbers never enter a report:
//! they are stored as 0.

use std::collections::BTreeMap;

use serde::Serialize;

/// Replace NaN and ±∞ by 0.
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportValue {
    Scalar(f64),
    Text(String),
    Series(Vec<f64>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DesignReport {
    entries: BTreeMap<String, ReportValue>,
}

impl DesignReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.entries.insert(key.into(), ReportValue::Scalar(sanitize(value)));
        self
    }

    pub fn text(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), ReportValue::Text(value.into()));
        self
    }

    pub fn series(&mut self, key: impl Into<String>, values: impl IntoIterator<Item = f64>) -> &mut Self {
        let values = values.into_iter().map(sanitize).collect();
        self.entries.insert(key.into(), ReportValue::Series(values));
        self
    }

    pub fn get(&self, key: &str) -> Option<&ReportValue> {
        self.entries.get(key)
    }

    pub fn scalar_value(&self, key: &str) -> Option<f64> {
        match self.entries.get(key) {
            Some(ReportValue::Scalar(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text_value(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(ReportValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn series_value(&self, key: &str) -> Option<&[f64]> {
        match self.entries.get(key) {
            Some(ReportValue::Series(v)) => Some(v),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReportValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_finite_values_are_zeroed() {
        let mut report = DesignReport::new();
        report
            .scalar("BestTotalLoss", f64::NAN)
            .scalar("BestPowerDensity", f64::INFINITY)
            .series("i_L", [1.0, f64::NEG_INFINITY]);
        assert_eq!(report.scalar_value("BestTotalLoss"), Some(0.0));
        assert_eq!(report.scalar_value("BestPowerDensity"), Some(0.0));
        assert_eq!(report.series_value("i_L"), Some(&[1.0, 0.0][..]));
    }

    #[test]
    fn test_flat_json() {
        let mut report = DesignReport::new();
        report
            .scalar("BestQ", 0.4)
            .text("BestPriFet_Name", "IPP60R099C6")
            .series("t", [0.0, 1.0]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({"BestPriFet_Name": "IPP60R099C6", "BestQ": 0.4, "t": [0.0, 1.0]})
        );
        assert_eq!(report.len(), 3);
        assert_eq!(report.text_value("BestPriFet_Name"), Some("IPP60R099C6"));
        assert!(report.scalar_value("BestPriFet_Name").is_none());
    }
}
