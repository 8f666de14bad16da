//! Operational log sink for audit lines.
//!
//! The recorder writes one human-readable line per warn/error/critical
//! event (and one per non-empty retention purge). Production output goes
//! through `tracing` on a dedicated target so it can be filtered and
//! formatted independently of the daemon's own logs.

use std::sync::Mutex;

use tracing::{error, info, warn};

use crate::error::DaemonError;

use super::entry::{AuditEvent, AuditLevel};

/// Tracing target for audit sink output.
pub const AUDIT_TARGET: &str = "estagio_auditd::audit";

/// Channel a sink line is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkSeverity {
    Info,
    Warn,
    Error,
}

impl From<AuditLevel> for SinkSeverity {
    fn from(level: AuditLevel) -> Self {
        match level {
            AuditLevel::Info => SinkSeverity::Info,
            AuditLevel::Warn => SinkSeverity::Warn,
            AuditLevel::Error | AuditLevel::Critical => SinkSeverity::Error,
        }
    }
}

/// A single line written to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRecord {
    pub severity: SinkSeverity,
    pub line: String,
    /// Serialized (masked) details, for error and critical events.
    pub details: Option<String>,
}

impl SinkRecord {
    pub fn new(severity: SinkSeverity, line: impl Into<String>) -> Self {
        Self {
            severity,
            line: line.into(),
            details: None,
        }
    }
}

/// Destination for formatted audit lines.
///
/// Writes are best-effort: the recorder ignores returned errors.
pub trait AuditSink: Send + Sync {
    fn write(&self, record: &SinkRecord) -> Result<(), DaemonError>;
}

/// Format the sink line for an event.
///
/// `[AUDIT] WARN | authentication | login_failed | User: ana@ufpe.br | IP: 10.0.0.7 | POST /api/auth/login | Status: 401`
pub fn format_line(event: &AuditEvent) -> String {
    let status = event
        .status_code
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "[AUDIT] {} | {} | {} | User: {} | IP: {} | {} {} | Status: {}",
        event.level.as_str().to_uppercase(),
        event.category,
        event.action,
        event.actor_display(),
        event.source_address,
        event.method,
        event.resource.as_deref().unwrap_or("-"),
        status
    )
}

/// Sink that writes through `tracing` on [`AUDIT_TARGET`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn write(&self, record: &SinkRecord) -> Result<(), DaemonError> {
        match (record.severity, record.details.as_deref()) {
            (SinkSeverity::Info, _) => info!(target: AUDIT_TARGET, "{}", record.line),
            (SinkSeverity::Warn, _) => warn!(target: AUDIT_TARGET, "{}", record.line),
            (SinkSeverity::Error, Some(details)) => {
                error!(target: AUDIT_TARGET, details = %details, "{}", record.line)
            }
            (SinkSeverity::Error, None) => error!(target: AUDIT_TARGET, "{}", record.line),
        }
        Ok(())
    }
}

/// Sink that keeps records in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<SinkRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records written so far.
    pub fn records(&self) -> Vec<SinkRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl AuditSink for MemorySink {
    fn write(&self, record: &SinkRecord) -> Result<(), DaemonError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::{AuditCategory, EventInput};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_format_line_full() {
        let event = EventInput::new("login_failed")
            .with_level(AuditLevel::Warn)
            .with_category(AuditCategory::Authentication)
            .with_actor("u-1", Some("ana@ufpe.br".to_string()))
            .with_source_address("10.0.0.7")
            .with_request("POST", "/api/auth/login")
            .with_status(401)
            .into_event(Uuid::nil(), Utc::now(), None);

        assert_eq!(
            format_line(&event),
            "[AUDIT] WARN | authentication | login_failed | User: ana@ufpe.br | IP: 10.0.0.7 | POST /api/auth/login | Status: 401"
        );
    }

    #[test]
    fn test_format_line_defaults() {
        let event = EventInput::default()
            .with_level(AuditLevel::Critical)
            .into_event(Uuid::nil(), Utc::now(), None);

        assert_eq!(
            format_line(&event),
            "[AUDIT] CRITICAL | general | unknown | User: anonymous | IP: unknown | unknown - | Status: N/A"
        );
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(SinkSeverity::from(AuditLevel::Warn), SinkSeverity::Warn);
        assert_eq!(SinkSeverity::from(AuditLevel::Error), SinkSeverity::Error);
        assert_eq!(SinkSeverity::from(AuditLevel::Critical), SinkSeverity::Error);
    }

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.write(&SinkRecord::new(SinkSeverity::Info, "one")).unwrap();
        sink.write(&SinkRecord::new(SinkSeverity::Warn, "two")).unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records()[1].line, "two");
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_tracing_sink_never_fails() {
        let sink = TracingSink;
        let mut record = SinkRecord::new(SinkSeverity::Error, "[AUDIT] ERROR | error | x");
        record.details = Some("{\"a\":1}".to_string());
        assert!(sink.write(&record).is_ok());
    }
}
