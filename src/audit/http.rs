//! Classification of HTTP request/response cycles into audit events.
//!
//! The web application's middleware reports each exchange as-is; this
//! module decides its level, category and action.

use serde::Deserialize;

use super::entry::{AuditCategory, AuditLevel, EventInput};

/// Path segments that mark authentication endpoints.
const AUTH_PATH_SEGMENTS: &[&str] = &["auth", "login", "logout", "register", "password"];

/// Prefix of administrative endpoints.
const ADMIN_PATH_PREFIX: &str = "/api/admin";

/// Action prefix for rejected authentication attempts.
pub const LOGIN_FAILED: &str = "login_failed";

/// One request/response cycle as observed by the HTTP middleware.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpExchange {
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub source_address: Option<String>,
    pub user_agent: Option<String>,
    pub actor_id: Option<String>,
    pub actor_label: Option<String>,
    pub duration_ms: Option<u64>,
    /// Request or response body snapshot.
    pub body: Option<serde_json::Value>,
}

impl HttpExchange {
    pub fn new(method: impl Into<String>, path: impl Into<String>, status_code: u16) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            status_code,
            ..Self::default()
        }
    }

    /// Path without the query string.
    fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or_default()
    }

    fn method_upper(&self) -> String {
        self.method.trim().to_uppercase()
    }

    fn is_auth_path(&self) -> bool {
        self.route()
            .split('/')
            .any(|segment| {
                AUTH_PATH_SEGMENTS
                    .iter()
                    .any(|m| segment.eq_ignore_ascii_case(m))
            })
    }

    /// Whether the route is the admin prefix or lies below it.
    fn is_admin_path(&self) -> bool {
        let route = self.route().trim_end_matches('/');
        match route.strip_prefix(ADMIN_PATH_PREFIX) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    fn is_read(&self) -> bool {
        matches!(self.method_upper().as_str(), "GET" | "HEAD" | "OPTIONS")
    }

    /// Level and category for this exchange.
    pub fn classify(&self) -> (AuditLevel, AuditCategory) {
        let status = self.status_code;
        let client_error = (400..500).contains(&status);
        let base_level = if client_error {
            AuditLevel::Warn
        } else {
            AuditLevel::Info
        };

        // Server errors and throttling outrank the endpoint kind
        if status >= 500 {
            return (AuditLevel::Error, AuditCategory::Error);
        }
        if status == 429 {
            return (AuditLevel::Warn, AuditCategory::SecurityEvent);
        }
        if self.is_auth_path() {
            return (base_level, AuditCategory::Authentication);
        }
        if status == 401 || status == 403 {
            return (AuditLevel::Warn, AuditCategory::AccessControl);
        }
        if self.is_admin_path() {
            return (base_level, AuditCategory::AdminAction);
        }
        if self.is_read() {
            (base_level, AuditCategory::DataAccess)
        } else {
            (base_level, AuditCategory::DataMutation)
        }
    }

    /// Whether this exchange is a rejected authentication attempt.
    pub fn is_failed_login(&self) -> bool {
        self.is_auth_path() && matches!(self.status_code, 401 | 403)
    }

    /// Build the event description for the recorder.
    pub fn into_event(self) -> EventInput {
        let (level, category) = self.classify();
        let method = self.method_upper();
        let route = self.route().to_string();

        let action = if self.is_failed_login() {
            format!("{} {} {}", LOGIN_FAILED, method, route)
        } else {
            format!("{} {}", method, route)
        };

        // Body snapshots are only kept for writes and auth endpoints.
        let keep_body = !self.is_read() || self.is_auth_path();

        EventInput {
            level: Some(level),
            category: Some(category),
            action: Some(action),
            actor_id: self.actor_id,
            actor_label: self.actor_label,
            source_address: self.source_address,
            user_agent: self.user_agent,
            resource: Some(route),
            method: Some(method),
            status_code: Some(self.status_code),
            details: if keep_body { self.body } else { None },
            duration_ms: self.duration_ms,
            details_error: None,
        }
    }
}
