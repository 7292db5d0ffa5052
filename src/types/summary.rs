//! Home summary payload
//!
//! The backend returns a loose `{data: {...}}` object whose keys depend on the
//! caller's role and may evolve independently of the console. Nothing here
//! assumes a fixed record shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sparse mapping from metric key to a raw JSON value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSummary(HashMap<String, Value>);

impl RoleSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Raw value for a key. Explicit JSON nulls read as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Numeric reading of a key, if it holds something count-like
    pub fn count(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(coerce_count)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for RoleSummary {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        RoleSummary(iter.into_iter().collect())
    }
}

/// Envelope returned by the home summary endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryEnvelope {
    #[serde(default)]
    pub data: Option<RoleSummary>,
}

/// Interpret a JSON value as a non-negative count.
///
/// Integers pass through, non-negative floats are truncated, numeric strings
/// are parsed. Anything else has no count.
pub fn coerce_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as u64)
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count(&json!(5)), Some(5));
        assert_eq!(coerce_count(&json!(7.9)), Some(7));
        assert_eq!(coerce_count(&json!("12")), Some(12));
        assert_eq!(coerce_count(&json!(" 3.5 ")), Some(3));
        assert_eq!(coerce_count(&json!(-1)), None);
        assert_eq!(coerce_count(&json!("many")), None);
        assert_eq!(coerce_count(&json!(true)), None);
        assert_eq!(coerce_count(&json!(null)), None);
    }

    #[test]
    fn test_null_reads_as_absent() {
        let summary: RoleSummary =
            serde_json::from_value(json!({"total_schools": null, "total_classes": 4})).unwrap();
        assert!(summary.get("total_schools").is_none());
        assert_eq!(summary.count("total_classes"), Some(4));
        assert_eq!(summary.len(), 2);
    }

    #[test]
    fn test_envelope_parsing() {
        let env: SummaryEnvelope =
            serde_json::from_str(r#"{"data": {"total_schools": 5}}"#).unwrap();
        assert_eq!(env.data.unwrap().count("total_schools"), Some(5));

        let env: SummaryEnvelope = serde_json::from_str(r#"{"message": "ok"}"#).unwrap();
        assert!(env.data.is_none());
    }
}
