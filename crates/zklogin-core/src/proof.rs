//! Proof bundle returned by the proving service

use serde::{Deserialize, Serialize};

/// Opaque proof bundle.
///
/// Stored verbatim inside the account record. The only place that looks
/// inside is signature assembly, which merges the address seed into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofBundle(serde_json::Value);

impl ProofBundle {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Copy of the bundle with one extra top-level field.
    ///
    /// Returns `None` when the bundle is not a JSON object.
    pub fn merged_with(&self, key: &str, value: serde_json::Value) -> Option<serde_json::Value> {
        let mut object = self.0.as_object()?.clone();
        object.insert(key.to_string(), value);
        Some(serde_json::Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_keeps_original() {
        let bundle = ProofBundle::new(json!({ "proof": "p" }));
        let merged = bundle.merged_with("addressSeed", json!("123")).unwrap();

        assert_eq!(merged, json!({ "proof": "p", "addressSeed": "123" }));
        assert_eq!(bundle.as_value(), &json!({ "proof": "p" }));
    }

    #[test]
    fn test_merge_rejects_non_object() {
        let bundle = ProofBundle::new(json!("p"));
        assert!(bundle.merged_with("addressSeed", json!("1")).is_none());
    }
}
