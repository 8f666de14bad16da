//! Detail masking for audit events.
//!
//! Redacts sensitive values from event details before they are stored or
//! written to the operational sink.

use serde_json::{Map, Value};

/// Keys that are masked when no list is configured.
pub const DEFAULT_SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "senha",
    "token",
    "secret",
    "authorization",
    "cookie",
    "api_key",
    "apikey",
    "private_key",
    "credential",
    "cpf",
];

/// Replacement value for masked fields.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Default nesting depth the masking walk descends into.
pub const DEFAULT_MAX_MASK_DEPTH: usize = 10;

/// Masks sensitive keys in JSON details.
///
/// A key is sensitive when its lowercase form contains one of the
/// configured names, so `newPassword` and `X-Auth-Token` are caught by
/// `password` and `token`.
#[derive(Debug, Clone)]
pub struct Masker {
    sensitive_fields: Vec<String>,
    marker: String,
    max_depth: usize,
}

impl Masker {
    /// Create a masker for the given field names.
    ///
    /// # Arguments
    ///
    /// * `sensitive_fields` - Key names to mask (matched case-insensitively)
    /// * `marker` - Value written in place of masked values
    /// * `max_depth` - Levels of nesting to descend into; deeper values are kept as-is
    pub fn new<S: AsRef<str>>(sensitive_fields: &[S], marker: impl Into<String>, max_depth: usize) -> Self {
        Self {
            sensitive_fields: sensitive_fields
                .iter()
                .map(|f| f.as_ref().trim().to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
            marker: marker.into(),
            // Top-level keys are always checked
            max_depth: max_depth.max(1),
        }
    }

    /// Return a masked copy of `value`.
    pub fn mask(&self, value: &Value) -> Value {
        self.mask_value(value, 0)
    }

    /// Whether `key` names a sensitive field.
    pub fn is_sensitive(&self, key: &str) -> bool {
        let key_lower = key.to_lowercase();
        self.sensitive_fields
            .iter()
            .any(|field| key_lower.contains(field.as_str()))
    }

    fn mask_value(&self, value: &Value, depth: usize) -> Value {
        if depth >= self.max_depth {
            return value.clone();
        }

        match value {
            Value::Object(map) => {
                let mut masked = Map::with_capacity(map.len());
                for (key, val) in map {
                    if self.is_sensitive(key) {
                        masked.insert(key.clone(), Value::String(self.marker.clone()));
                    } else {
                        masked.insert(key.clone(), self.mask_value(val, depth + 1));
                    }
                }
                Value::Object(masked)
            }
            Value::Array(arr) => Value::Array(
                arr.iter()
                    .map(|v| self.mask_value(v, depth + 1))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}

impl Default for Masker {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVE_FIELDS, REDACTION_MARKER, DEFAULT_MAX_MASK_DEPTH)
    }
}
