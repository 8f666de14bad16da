//! Audit event types.
//!
//! Defines the structure of audit events and the typed input the recorder
//! normalizes them from.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default for `action`, `sourceAddress` and `method` when the caller omits them.
pub const UNKNOWN: &str = "unknown";

/// Severity of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AuditLevel {
    #[default]
    Info,
    Warn,
    Error,
    Critical,
}

impl AuditLevel {
    /// Lowercase name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLevel::Info => "info",
            AuditLevel::Warn => "warn",
            AuditLevel::Error => "error",
            AuditLevel::Critical => "critical",
        }
    }

    /// Whether events of this level are written to the operational sink.
    pub fn reaches_sink(&self) -> bool {
        *self >= AuditLevel::Warn
    }

    /// Whether the sink line carries the serialized details.
    pub fn includes_details(&self) -> bool {
        *self >= AuditLevel::Error
    }
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" | "debug" | "trace" => Ok(AuditLevel::Info),
            "warn" | "warning" => Ok(AuditLevel::Warn),
            "error" => Ok(AuditLevel::Error),
            "critical" | "fatal" => Ok(AuditLevel::Critical),
            other => Err(format!("unknown audit level '{}'", other)),
        }
    }
}

impl TryFrom<String> for AuditLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

/// Category of an audit event.
///
/// Well-known categories have their own variants; anything else is kept
/// verbatim in [`AuditCategory::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditCategory {
    Authentication,
    AccessControl,
    DataAccess,
    DataMutation,
    SecurityEvent,
    Error,
    AdminAction,
    #[default]
    General,
    Other(String),
}

impl AuditCategory {
    pub fn as_str(&self) -> &str {
        match self {
            AuditCategory::Authentication => "authentication",
            AuditCategory::AccessControl => "access_control",
            AuditCategory::DataAccess => "data_access",
            AuditCategory::DataMutation => "data_mutation",
            AuditCategory::SecurityEvent => "security_event",
            AuditCategory::Error => "error",
            AuditCategory::AdminAction => "admin_action",
            AuditCategory::General => "general",
            AuditCategory::Other(name) => name,
        }
    }
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for AuditCategory {
    fn from(value: &str) -> Self {
        match value {
            "authentication" => AuditCategory::Authentication,
            "access_control" => AuditCategory::AccessControl,
            "data_access" => AuditCategory::DataAccess,
            "data_mutation" => AuditCategory::DataMutation,
            "security_event" => AuditCategory::SecurityEvent,
            "error" => AuditCategory::Error,
            "admin_action" => AuditCategory::AdminAction,
            "general" | "" => AuditCategory::General,
            other => AuditCategory::Other(other.to_string()),
        }
    }
}

impl From<String> for AuditCategory {
    fn from(value: String) -> Self {
        AuditCategory::from(value.as_str())
    }
}

impl From<AuditCategory> for String {
    fn from(value: AuditCategory) -> Self {
        match value {
            AuditCategory::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// A single audit event as stored in the log.
///
/// Created once by the recorder and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Unique identifier assigned at append time.
    pub id: Uuid,
    /// When the event was appended.
    pub timestamp: DateTime<Utc>,
    pub level: AuditLevel,
    pub category: AuditCategory,
    /// Free-form description, e.g. `POST /api/alunos`.
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    /// Display identifier (usually an email), preferred over `actor_id` in log lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_label: Option<String>,
    pub source_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Masked details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl AuditEvent {
    /// Name used for the actor in log lines.
    pub fn actor_display(&self) -> &str {
        self.actor_label
            .as_deref()
            .or(self.actor_id.as_deref())
            .unwrap_or("anonymous")
    }
}

/// Description of an event supplied by a caller.
///
/// Every field is optional; missing values are filled in by the recorder
/// (`level` = info, `category` = general, `action`/`sourceAddress`/`method`
/// = "unknown"). Unknown fields are rejected when deserializing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventInput {
    pub level: Option<AuditLevel>,
    pub category: Option<AuditCategory>,
    pub action: Option<String>,
    pub actor_id: Option<String>,
    pub actor_label: Option<String>,
    pub source_address: Option<String>,
    pub user_agent: Option<String>,
    pub resource: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<u16>,
    pub details: Option<serde_json::Value>,
    pub duration_ms: Option<u64>,
    /// Set when `with_details` could not convert the caller's value.
    #[serde(skip)]
    pub(crate) details_error: Option<String>,
}

impl EventInput {
    /// Start an event description with the given action.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: AuditLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_category(mut self, category: impl Into<AuditCategory>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the actor id and, optionally, its display label.
    pub fn with_actor(mut self, id: impl Into<String>, label: Option<String>) -> Self {
        self.actor_id = Some(id.into());
        self.actor_label = label;
        self
    }

    pub fn with_source_address(mut self, address: impl Into<String>) -> Self {
        self.source_address = Some(address.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the HTTP method and request path.
    pub fn with_request(mut self, method: impl Into<String>, resource: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.resource = Some(resource.into());
        self
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Attach structured details.
    ///
    /// If the value cannot be represented as JSON the event is still
    /// recorded, without details.
    pub fn with_details<T: Serialize>(mut self, details: &T) -> Self {
        match serde_json::to_value(details) {
            Ok(value) => {
                self.details = Some(value);
                self.details_error = None;
            }
            Err(e) => {
                self.details = None;
                self.details_error = Some(e.to_string());
            }
        }
        self
    }

    /// Fill in defaults and build the stored event.
    ///
    /// `details` is the already-masked value.
    pub(crate) fn into_event(
        self,
        id: Uuid,
        timestamp: DateTime<Utc>,
        details: Option<serde_json::Value>,
    ) -> AuditEvent {
        AuditEvent {
            id,
            timestamp,
            level: self.level.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            action: non_blank(self.action).unwrap_or_else(|| UNKNOWN.to_string()),
            actor_id: non_blank(self.actor_id),
            actor_label: non_blank(self.actor_label),
            source_address: non_blank(self.source_address).unwrap_or_else(|| UNKNOWN.to_string()),
            user_agent: non_blank(self.user_agent),
            resource: non_blank(self.resource),
            method: non_blank(self.method).unwrap_or_else(|| UNKNOWN.to_string()),
            status_code: self.status_code,
            details,
            duration_ms: self.duration_ms,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stamp() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_defaults_applied() {
        let event = EventInput::default().into_event(Uuid::nil(), stamp(), None);
        assert_eq!(event.level, AuditLevel::Info);
        assert_eq!(event.category, AuditCategory::General);
        assert_eq!(event.action, "unknown");
        assert_eq!(event.source_address, "unknown");
        assert_eq!(event.method, "unknown");
        assert_eq!(event.actor_display(), "anonymous");
    }

    #[test]
    fn test_blank_strings_treated_as_missing() {
        let input = EventInput {
            action: Some("   ".to_string()),
            method: Some(String::new()),
            actor_label: Some(String::new()),
            actor_id: Some("u-42".to_string()),
            ..EventInput::default()
        };
        let event = input.into_event(Uuid::nil(), stamp(), None);
        assert_eq!(event.action, "unknown");
        assert_eq!(event.method, "unknown");
        assert_eq!(event.actor_display(), "u-42");
    }

    #[test]
    fn test_actor_label_preferred() {
        let event = EventInput::new("login")
            .with_actor("u-42", Some("ana@ufpe.br".to_string()))
            .into_event(Uuid::nil(), stamp(), None);
        assert_eq!(event.actor_display(), "ana@ufpe.br");
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("WARNING".parse::<AuditLevel>().unwrap(), AuditLevel::Warn);
        assert_eq!("debug".parse::<AuditLevel>().unwrap(), AuditLevel::Info);
        assert_eq!("Critical".parse::<AuditLevel>().unwrap(), AuditLevel::Critical);
        assert!("loud".parse::<AuditLevel>().is_err());
        assert!(AuditLevel::Warn.reaches_sink());
        assert!(!AuditLevel::Info.reaches_sink());
        assert!(!AuditLevel::Warn.includes_details());
        assert!(AuditLevel::Critical.includes_details());
    }

    #[test]
    fn test_level_from_owned_string() {
        assert_eq!(AuditLevel::try_from("error".to_string()), Ok(AuditLevel::Error));
        let err = AuditLevel::try_from("loud".to_string()).unwrap_err();
        assert!(err.contains("loud"));
    }

    #[test]
    fn test_category_round_trip_through_strings() {
        assert_eq!(AuditCategory::from("access_control"), AuditCategory::AccessControl);
        assert_eq!(
            AuditCategory::from("comunicados"),
            AuditCategory::Other("comunicados".to_string())
        );
        assert_eq!(String::from(AuditCategory::Other("x".to_string())), "x");
        assert_eq!(AuditCategory::DataMutation.to_string(), "data_mutation");
    }

    #[test]
    fn test_input_deserialization() {
        let input: EventInput = serde_json::from_value(json!({
            "level": "warn",
            "category": "authentication",
            "action": "login_failed",
            "actorId": "u-1",
            "sourceAddress": "10.0.0.7",
            "statusCode": 401
        }))
        .unwrap();
        assert_eq!(input.level, Some(AuditLevel::Warn));
        assert_eq!(input.category, Some(AuditCategory::Authentication));
        assert_eq!(input.status_code, Some(401));
    }

    #[test]
    fn test_input_rejects_unknown_fields() {
        let result: Result<EventInput, _> = serde_json::from_value(json!({
            "action": "x",
            "severity": "high"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_event_serialization_is_camel_case() {
        let event = EventInput::new("POST /api/alunos")
            .with_request("POST", "/api/alunos")
            .with_status(201)
            .with_duration_ms(12)
            .into_event(Uuid::nil(), stamp(), None);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["statusCode"], 201);
        assert_eq!(json["durationMs"], 12);
        assert_eq!(json["sourceAddress"], "unknown");
        assert_eq!(json["level"], "info");
        assert_eq!(json["category"], "general");
        assert!(json.get("actorId").is_none());
        assert!(json["timestamp"].as_str().unwrap().starts_with("2024-03-01T12:00:00"));
    }

    #[test]
    fn test_with_details_failure_is_recorded() {
        use std::collections::HashMap;

        // Maps with non-string keys cannot become JSON objects.
        let mut bad = HashMap::new();
        bad.insert((1, 2), "pair");

        let input = EventInput::new("upload").with_details(&bad);
        assert!(input.details.is_none());
        assert!(input.details_error.is_some());

        let input = EventInput::new("upload").with_details(&json!({"file": "a.pdf"}));
        assert_eq!(input.details, Some(json!({"file": "a.pdf"})));
        assert!(input.details_error.is_none());
    }
}
