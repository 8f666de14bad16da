//! Response types for the daemon protocol.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::DaemonError;

/// Client-facing message for an error code.
///
/// Detailed messages stay in the daemon's own log.
fn client_message(code: &str) -> &'static str {
    match code {
        "AUTH_ERROR" => "Authentication failed",
        "VALIDATION_ERROR" => "Invalid request parameters",
        "INVALID_REQUEST" => "Malformed request",
        "EXECUTION_ERROR" => "Command execution failed",
        "INTERNAL_ERROR" => "Internal server error",
        "CONNECTION_TIMEOUT" => "Connection timed out",
        _ => "An error occurred",
    }
}

/// A response from the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Whether the request succeeded.
    pub success: bool,

    /// Unique identifier for this request/response pair.
    pub request_id: Uuid,

    /// Response data on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Error details on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

/// Error details in a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "VALIDATION_ERROR", "AUTH_ERROR").
    pub code: String,

    /// Human-readable error message.
    pub message: String,
}

impl Response {
    /// Create a success response.
    pub fn success(request_id: Uuid, data: serde_json::Value) -> Self {
        Self {
            success: true,
            request_id,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    ///
    /// The message is replaced by a generic one for the code; the detailed one
    /// is logged at debug level.
    pub fn error(request_id: Uuid, code: impl Into<String>, message: impl AsRef<str>) -> Self {
        let code = code.into();

        debug!(
            request_id = %request_id,
            code = %code,
            message = %message.as_ref(),
            "Error response (sanitized for client)"
        );

        Self {
            success: false,
            request_id,
            data: None,
            error: Some(ErrorResponse {
                message: client_message(&code).to_string(),
                code,
            }),
        }
    }

    /// Create an error response for a daemon error.
    pub fn from_error(request_id: Uuid, err: &DaemonError) -> Self {
        Self::error(request_id, err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;

    #[test]
    fn test_success_response() {
        let response = Response::success(Uuid::nil(), serde_json::json!({"result": "ok"}));
        assert!(response.success);
        assert!(response.data.is_some());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_error_message_is_sanitized() {
        let response = Response::error(Uuid::nil(), "AUTH_ERROR", "uid 1001 not in [33]");
        assert!(!response.success);

        let error = response.error.unwrap();
        assert_eq!(error.code, "AUTH_ERROR");
        assert_eq!(error.message, "Authentication failed");
    }

    #[test]
    fn test_from_daemon_error() {
        let err = DaemonError::Validation {
            kind: ValidationErrorKind::MissingParameter {
                param: "days".to_string(),
            },
        };
        let response = Response::from_error(Uuid::nil(), &err);
        let error = response.error.unwrap();
        assert_eq!(error.code, "VALIDATION_ERROR");
        assert_eq!(error.message, "Invalid request parameters");
    }

    #[test]
    fn test_unknown_code_gets_generic_message() {
        let response = Response::error(Uuid::nil(), "SOMETHING_ELSE", "detail");
        assert_eq!(response.error.unwrap().message, "An error occurred");
    }

    #[test]
    fn test_response_serialization() {
        let response = Response::success(Uuid::new_v4(), serde_json::json!({"key": "value"}));
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"request_id\""));
        assert!(!json.contains("\"error\"")); // Should be skipped when None
    }
}
