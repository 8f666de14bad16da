//! Configuration settings for the audit daemon.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audit::{DEFAULT_MAX_MASK_DEPTH, DEFAULT_SENSITIVE_FIELDS, REDACTION_MARKER};
use crate::error::DaemonError;
use crate::protocol::DEFAULT_MAX_MESSAGE_SIZE;

/// Main configuration structure for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub socket: SocketConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Socket configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketConfig {
    /// Path to the Unix socket file.
    pub path: PathBuf,
    /// Socket file permissions (e.g., "0660").
    #[serde(default = "default_socket_permissions")]
    pub permissions: String,
}

/// Security configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    /// List of allowed peer UIDs. An empty list rejects every peer.
    #[serde(default)]
    pub allowed_peer_uids: Vec<u32>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Limits configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum message size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Maximum concurrent connections.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// Socket read/write timeout in seconds.
    #[serde(default = "default_socket_timeout")]
    pub socket_timeout_seconds: u64,
}

/// Audit pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Maximum number of events kept in memory.
    #[serde(default = "default_max_log_size")]
    pub max_log_size: usize,
    /// Age in days after which events are purged.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Interval between automatic retention sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Key names whose values are masked in event details.
    #[serde(default = "default_sensitive_fields")]
    pub sensitive_fields: Vec<String>,
    /// Maximum nesting depth the masking walk descends into.
    #[serde(default = "default_max_mask_depth")]
    pub max_mask_depth: usize,
    /// Replacement value for masked fields.
    #[serde(default = "default_redaction_marker")]
    pub redaction_marker: String,
}

impl AuditConfig {
    /// Interval between automatic retention sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

// Default value functions
fn default_socket_permissions() -> String {
    "0660".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_max_message_size() -> usize {
    DEFAULT_MAX_MESSAGE_SIZE
}

fn default_max_concurrent() -> usize {
    100
}

fn default_socket_timeout() -> u64 {
    30
}

fn default_max_log_size() -> usize {
    10_000
}

fn default_retention_days() -> u32 {
    30
}

fn default_sweep_interval() -> u64 {
    24 * 60 * 60
}

fn default_sensitive_fields() -> Vec<String> {
    DEFAULT_SENSITIVE_FIELDS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_mask_depth() -> usize {
    DEFAULT_MAX_MASK_DEPTH
}

fn default_redaction_marker() -> String {
    REDACTION_MARKER.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
            max_concurrent_requests: default_max_concurrent(),
            socket_timeout_seconds: default_socket_timeout(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_log_size: default_max_log_size(),
            retention_days: default_retention_days(),
            sweep_interval_seconds: default_sweep_interval(),
            sensitive_fields: default_sensitive_fields(),
            max_mask_depth: default_max_mask_depth(),
            redaction_marker: default_redaction_marker(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DaemonError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DaemonError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| DaemonError::Config {
            message: format!("Failed to parse config file '{}': {}", path.display(), e),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), DaemonError> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(DaemonError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        // Validate log format
        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(DaemonError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        // Validate socket permissions format
        if !self.socket.permissions.chars().all(|c| c.is_ascii_digit()) {
            return Err(DaemonError::Config {
                message: format!(
                    "Invalid socket permissions '{}'. Must be octal (e.g., '0660')",
                    self.socket.permissions
                ),
            });
        }

        if self.audit.max_log_size == 0 {
            return Err(DaemonError::Config {
                message: "audit.max_log_size must be greater than zero".to_string(),
            });
        }

        // tokio intervals panic on a zero period
        if self.audit.sweep_interval_seconds == 0 {
            return Err(DaemonError::Config {
                message: "audit.sweep_interval_seconds must be greater than zero".to_string(),
            });
        }

        // A zero depth would store every detail unmasked
        if self.audit.max_mask_depth == 0 {
            return Err(DaemonError::Config {
                message: "audit.max_mask_depth must be greater than zero".to_string(),
            });
        }

        if self.audit.sensitive_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(DaemonError::Config {
                message: "audit.sensitive_fields must not contain empty names".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_socket_permissions(), "0660");
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_log_format(), "pretty");
        assert_eq!(default_max_log_size(), 10_000);
        assert_eq!(default_retention_days(), 30);
        assert_eq!(default_sweep_interval(), 86_400);
    }

    #[test]
    fn test_load_minimal_config() {
        let file = write_config(
            r#"
[socket]
path = "/run/estagio/auditd.sock"
"#,
        );

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.socket.permissions, "0660");
        assert!(settings.security.allowed_peer_uids.is_empty());
        assert_eq!(settings.audit.max_log_size, 10_000);
        assert_eq!(settings.audit.sweep_interval(), Duration::from_secs(86_400));
        assert!(settings
            .audit
            .sensitive_fields
            .iter()
            .any(|f| f == "password"));
    }

    #[test]
    fn test_load_audit_overrides() {
        let file = write_config(
            r#"
[socket]
path = "/tmp/auditd.sock"

[security]
allowed_peer_uids = [33, 1000]

[audit]
max_log_size = 500
retention_days = 7
sensitive_fields = ["password", "cpf"]
redaction_marker = "***"
"#,
        );

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.security.allowed_peer_uids, vec![33, 1000]);
        assert_eq!(settings.audit.max_log_size, 500);
        assert_eq!(settings.audit.retention_days, 7);
        assert_eq!(settings.audit.sensitive_fields, vec!["password", "cpf"]);
        assert_eq!(settings.audit.redaction_marker, "***");
        assert_eq!(settings.audit.max_mask_depth, DEFAULT_MAX_MASK_DEPTH);
    }

    #[test]
    fn test_rejects_zero_log_size() {
        let file = write_config(
            r#"
[socket]
path = "/tmp/auditd.sock"

[audit]
max_log_size = 0
"#,
        );

        assert!(matches!(
            Settings::load(file.path()),
            Err(DaemonError::Config { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_sweep_interval() {
        let file = write_config(
            r#"
[socket]
path = "/tmp/auditd.sock"

[audit]
sweep_interval_seconds = 0
"#,
        );

        assert!(Settings::load(file.path()).is_err());
    }

    #[test]
    fn test_rejects_zero_mask_depth() {
        let file = write_config(
            r#"
[socket]
path = "/tmp/auditd.sock"

[audit]
max_mask_depth = 0
"#,
        );

        let err = Settings::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_mask_depth"));
    }

    #[test]
    fn test_mask_depth_one_still_masks_top_level() {
        use crate::audit::{AuditLog, EventInput, MemorySink};
        use std::sync::Arc;

        let file = write_config(
            r#"
[socket]
path = "/tmp/auditd.sock"

[audit]
max_mask_depth = 1
"#,
        );

        let settings = Settings::load(file.path()).unwrap();
        let log = AuditLog::new(&settings.audit, Arc::new(MemorySink::new()));
        let event = log.record(
            EventInput::new("login").with_details(&serde_json::json!({ "password": "hunter2" })),
        );
        assert_eq!(event.details.unwrap()["password"], "[REDACTED]");
    }

    #[test]
    fn test_rejects_invalid_log_format() {
        let file = write_config(
            r#"
[socket]
path = "/tmp/auditd.sock"

[logging]
format = "xml"
"#,
        );

        let err = Settings::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid log format"));
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load("/nonexistent/auditd.toml").unwrap_err();
        assert!(matches!(err, DaemonError::Config { .. }));
    }
}
