//! Metrics command for monitoring daemon health.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audit::AuditLog;
use crate::error::DaemonError;
use crate::socket::ConnectionMetrics;

use super::super::traits::Command;
use super::super::types::{CommandParams, CommandResult, ExecutionContext};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Metrics command that returns daemon health statistics.
///
/// Returns:
/// - uptime_seconds: How long the daemon has been running
/// - requests_total: Total number of requests processed
/// - requests_failed: Number of failed requests
/// - active_connections: Currently active connections
/// - audit_log_size: Number of events currently held in the audit log
/// - audit_log_capacity: Maximum number of events held
/// - version: Daemon version
pub struct MetricsCommand {
    start_time: Instant,
    metrics: Arc<ConnectionMetrics>,
    log: Arc<AuditLog>,
}

impl MetricsCommand {
    /// Create a new metrics command.
    pub fn new(metrics: Arc<ConnectionMetrics>, log: Arc<AuditLog>) -> Self {
        Self {
            start_time: Instant::now(),
            metrics,
            log,
        }
    }

    /// Get the daemon uptime.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Command for MetricsCommand {
    fn name(&self) -> &'static str {
        "system.metrics"
    }

    fn validate(&self, _params: &CommandParams) -> Result<(), DaemonError> {
        Ok(())
    }

    fn execute(
        &self,
        _ctx: &ExecutionContext,
        _params: CommandParams,
    ) -> Result<CommandResult, DaemonError> {
        let uptime = self.uptime();

        Ok(CommandResult::success(serde_json::json!({
            "uptime_seconds": uptime.as_secs(),
            "requests_total": self.metrics.total_requests(),
            "requests_failed": self.metrics.failed_requests(),
            "active_connections": self.metrics.active(),
            "audit_log_size": self.log.len(),
            "audit_log_capacity": self.log.capacity(),
            "version": VERSION,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::EventInput;
    use crate::commands::audit::test_log;
    use crate::commands::types::test_context;

    fn metrics_command(metrics: Arc<ConnectionMetrics>) -> (MetricsCommand, Arc<AuditLog>) {
        let (log, _) = test_log();
        (MetricsCommand::new(metrics, Arc::clone(&log)), log)
    }

    #[test]
    fn test_metrics_name() {
        let (cmd, _) = metrics_command(Arc::new(ConnectionMetrics::new()));
        assert_eq!(cmd.name(), "system.metrics");
        assert!(!cmd.requires_audit());
    }

    #[test]
    fn test_metrics_execute() {
        let (cmd, _) = metrics_command(Arc::new(ConnectionMetrics::new()));
        let result = cmd
            .execute(&test_context("system.metrics"), CommandParams::new(serde_json::json!({})))
            .unwrap();
        assert!(result.success);

        let data = result.data.unwrap();
        assert!(data["uptime_seconds"].is_u64());
        assert_eq!(data["requests_total"], 0);
        assert_eq!(data["requests_failed"], 0);
        assert_eq!(data["active_connections"], 0);
        assert_eq!(data["audit_log_size"], 0);
        assert!(data["version"].is_string());
    }

    #[test]
    fn test_metrics_tracks_requests_and_log_size() {
        let metrics = Arc::new(ConnectionMetrics::new());
        metrics.record_request(true);
        metrics.record_request(true);
        metrics.record_request(false);

        let (cmd, log) = metrics_command(Arc::clone(&metrics));
        log.record(EventInput::new("login"));

        let data = cmd
            .execute(&test_context("system.metrics"), CommandParams::new(serde_json::json!({})))
            .unwrap()
            .data
            .unwrap();

        assert_eq!(data["requests_total"], 3);
        assert_eq!(data["requests_failed"], 1);
        assert_eq!(data["audit_log_size"], 1);
    }
}
