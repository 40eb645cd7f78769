//! Typed key/value parameters for filters, writers and pipeline steps.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A flat bag of named string, boolean and integer options, serialized as a
/// JSON object.
///
/// Lookups take a default and never fail: a missing key or a value of the
/// wrong type yields the default.
///
/// # Example
/// ```rust
/// use locflow::parameters::Parameters;
///
/// let mut params = Parameters::new();
/// params.set_string("separator", "=");
/// params.set_bool("trim", true);
///
/// assert_eq!(params.get_string("separator"), Some("="));
/// assert!(params.get_bool("trim", false));
/// assert_eq!(params.get_integer("depth", 3), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    values: serde_json::Map<String, Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Parameters::default()
    }

    /// Parses parameters from their JSON object form.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the parameters to a JSON object string.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn get_integer(&self, key: &str, default: i64) -> i64 {
        self.values.get(key).and_then(Value::as_i64).unwrap_or(default)
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), Value::String(value.into()));
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.values.insert(key.into(), Value::Bool(value));
    }

    pub fn set_integer(&mut self, key: impl Into<String>, value: i64) {
        self.values.insert(key.into(), Value::from(value));
    }

    /// Removes a key, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_keys() {
        let params = Parameters::new();
        assert_eq!(params.get_string("missing"), None);
        assert!(params.get_bool("missing", true));
        assert_eq!(params.get_integer("missing", 7), 7);
        assert!(params.is_empty());
    }

    #[test]
    fn test_wrong_type_yields_default() {
        let mut params = Parameters::new();
        params.set_string("key", "value");
        assert_eq!(params.get_integer("key", 2), 2);
        assert!(!params.get_bool("key", false));
    }

    #[test]
    fn test_json_round_trip() {
        let mut params = Parameters::new();
        params.set_string("separator", "=");
        params.set_bool("trim", false);
        params.set_integer("limit", 10);

        let json = params.to_json_string().unwrap();
        let back = Parameters::from_json_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_from_json_str_rejects_non_object() {
        assert!(Parameters::from_json_str("[1, 2]").is_err());
        assert!(Parameters::from_json_str("{\"a\": 1}").is_ok());
    }

    #[test]
    fn test_remove() {
        let mut params = Parameters::new();
        params.set_string("key", "value");
        assert!(params.remove("key"));
        assert!(!params.remove("key"));
        assert!(params.is_empty());
    }
}
