//! The merged dashboard view at one instant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered field-name -> value map shared by sources, snapshots and merges.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A single dashboard field: a gauge or a short status string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// The complete merged view. Every field declared by any source or metric is
/// always present; `partial` marks snapshots where at least one source fell
/// back to its defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub fields: FieldMap,
    pub captured_at_ms: i64,
    pub partial: bool,
}

impl Snapshot {
    pub fn new(fields: FieldMap, captured_at_ms: i64, partial: bool) -> Self {
        Self {
            fields,
            captured_at_ms,
            partial,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// New snapshot with `updates` applied over this one. Fields not named in
    /// `updates` carry over unchanged, as does the `partial` flag.
    pub fn merged_with(&self, updates: &FieldMap, captured_at_ms: i64) -> Snapshot {
        let mut fields = self.fields.clone();
        for (name, value) in updates {
            fields.insert(name.clone(), value.clone());
        }
        Snapshot {
            fields,
            captured_at_ms,
            partial: self.partial,
        }
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
