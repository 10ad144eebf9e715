//! The tagged rewrite target for intercepted structured results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured result with one unambiguous textual payload.
///
/// The interception layer rewrites `text` when a decision blocks the output
/// and attaches its verdict under `metadata`; nothing else in the structure
/// is ever touched. Callers wrap whatever they were going to return in one
/// of these so there is no guessing about which field holds the
/// user-facing text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPayload {
    /// The user/agent-facing text
    pub text: String,

    /// Everything else the caller wants to carry alongside
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl OutputPayload {
    /// A payload with just text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Map::new(),
        }
    }

    /// Attach a metadata entry, consuming and returning the payload
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Insert a metadata entry in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Look up a metadata entry
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

impl From<String> for OutputPayload {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for OutputPayload {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_metadata() {
        let mut payload = OutputPayload::new("all good").with_metadata("kind", "status");
        payload.insert("attempt", 2);

        assert_eq!(payload.text, "all good");
        assert_eq!(payload.get("kind"), Some(&Value::from("status")));
        assert_eq!(payload.get("attempt"), Some(&Value::from(2)));
        assert!(payload.get("missing").is_none());
    }

    #[test]
    fn test_payload_serialization_skips_empty_metadata() {
        let payload = OutputPayload::new("plain");
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"text":"plain"}"#);
    }
}
