//! Command types: parameters, results, and execution context.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::PeerInfo;
use crate::error::{DaemonError, ValidationErrorKind};

/// Wrapper around command parameters with helper methods.
#[derive(Debug, Clone)]
pub struct CommandParams {
    inner: serde_json::Value,
}

impl CommandParams {
    /// Create new command parameters from a JSON value.
    pub fn new(value: serde_json::Value) -> Self {
        Self { inner: value }
    }

    /// Get the underlying JSON value.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.inner
    }

    /// Deserialize the parameters into a typed struct.
    ///
    /// Wrong JSON types, unknown fields and unparsable dates all surface as
    /// `InvalidParameters`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, DaemonError> {
        T::deserialize(&self.inner).map_err(|e| DaemonError::Validation {
            kind: ValidationErrorKind::InvalidParameters {
                message: e.to_string(),
            },
        })
    }

    /// Get an optional unsigned integer parameter.
    ///
    /// Present but non-integer values are rejected rather than ignored.
    pub fn get_optional_u64(&self, key: &str) -> Result<Option<u64>, DaemonError> {
        match self.inner.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| DaemonError::invalid_parameter(key, "must be a non-negative integer")),
        }
    }

    /// Check that the parameters are a JSON object.
    pub fn require_object(&self) -> Result<(), DaemonError> {
        if self.inner.is_object() {
            Ok(())
        } else {
            Err(DaemonError::Validation {
                kind: ValidationErrorKind::InvalidParameters {
                    message: "params must be a JSON object".to_string(),
                },
            })
        }
    }
}

impl From<serde_json::Value> for CommandParams {
    fn from(value: serde_json::Value) -> Self {
        Self::new(value)
    }
}

/// Result of command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,
    /// Result data on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResult {
    /// Create a success result with data.
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }

    /// Create a success result from any serializable value.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, DaemonError> {
        Ok(Self::success(serde_json::to_value(value)?))
    }
}

/// Execution context for a command.
///
/// Contains metadata about the request and the connected peer.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique identifier for this request.
    pub request_id: Uuid,
    /// Information about the connected peer.
    pub peer: PeerInfo,
    /// When the request was received.
    pub timestamp: DateTime<Utc>,
    /// The command being executed.
    pub command: String,
}

impl ExecutionContext {
    /// Create a new execution context.
    pub fn new(
        request_id: Uuid,
        peer: PeerInfo,
        timestamp: DateTime<Utc>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            peer,
            timestamp,
            command: command.into(),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_context(command: &str) -> ExecutionContext {
    ExecutionContext::new(
        Uuid::new_v4(),
        PeerInfo {
            uid: 1000,
            gid: 1000,
            pid: 12345,
        },
        Utc::now(),
        command,
    )
}
