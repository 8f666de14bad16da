//! Request types for the daemon protocol.

use serde::{Deserialize, Serialize};

/// A request from a client.
///
/// Clients are authenticated by their peer credentials, so requests carry
/// only the command and its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// The command to execute (e.g., "audit.record", "audit.query").
    pub command: String,

    /// Command parameters as a JSON object.
    #[serde(default = "empty_params")]
    pub params: serde_json::Value,
}

fn empty_params() -> serde_json::Value {
    serde_json::json!({})
}

impl Request {
    /// Create a request with no parameters.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            params: empty_params(),
        }
    }

    /// Add a parameter to the request (builder pattern).
    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        if let Some(obj) = self.params.as_object_mut() {
            obj.insert(key.to_string(), value.into());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_default_to_empty_object() {
        let request: Request = serde_json::from_str(r#"{"command": "system.ping"}"#).unwrap();
        assert_eq!(request.command, "system.ping");
        assert!(request.params.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_builder() {
        let request = Request::new("audit.purge").with_param("days", 7);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["command"], "audit.purge");
        assert_eq!(json["params"]["days"], 7);
    }
}
