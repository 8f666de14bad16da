//! Record an HTTP request/response cycle.

use std::sync::Arc;

use crate::audit::{AuditLog, HttpExchange};
use crate::commands::traits::Command;
use crate::commands::types::{CommandParams, CommandResult, ExecutionContext};
use crate::error::DaemonError;

/// Classify an `HttpExchange` and append the resulting event.
pub struct RecordHttpCommand {
    log: Arc<AuditLog>,
}

impl RecordHttpCommand {
    pub fn new(log: Arc<AuditLog>) -> Self {
        Self { log }
    }
}

impl Command for RecordHttpCommand {
    fn name(&self) -> &'static str {
        "audit.record_http"
    }

    fn validate(&self, params: &CommandParams) -> Result<(), DaemonError> {
        let exchange: HttpExchange = params.parse()?;
        if exchange.method.trim().is_empty() {
            return Err(DaemonError::invalid_parameter("method", "must not be empty"));
        }
        if exchange.path.trim().is_empty() {
            return Err(DaemonError::invalid_parameter("path", "must not be empty"));
        }
        Ok(())
    }

    fn execute(
        &self,
        _ctx: &ExecutionContext,
        params: CommandParams,
    ) -> Result<CommandResult, DaemonError> {
        let exchange: HttpExchange = params.parse()?;
        let event = self.log.record(exchange.into_event());

        Ok(CommandResult::success(serde_json::json!({
            "id": event.id,
            "timestamp": event.timestamp,
            "level": event.level,
            "category": event.category,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditFilter;
    use crate::commands::audit::test_log;
    use crate::commands::types::test_context;

    #[test]
    fn test_failed_login_is_classified() {
        let (log, sink) = test_log();
        let cmd = RecordHttpCommand::new(Arc::clone(&log));
        let params = CommandParams::new(serde_json::json!({
            "method": "POST",
            "path": "/api/auth/login",
            "statusCode": 401,
            "sourceAddress": "203.0.113.9",
            "body": { "email": "a@b.c", "password": "nope" }
        }));

        cmd.validate(&params).unwrap();
        let result = cmd.execute(&test_context("audit.record_http"), params).unwrap();
        let data = result.data.unwrap();
        assert_eq!(data["level"], "warn");
        assert_eq!(data["category"], "authentication");

        let events = log.query(&AuditFilter::new());
        assert!(events[0].action.starts_with("login_failed"));
        assert_eq!(events[0].details.as_ref().unwrap()["password"], "[REDACTED]");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_read_request_is_data_access() {
        let (log, sink) = test_log();
        let cmd = RecordHttpCommand::new(log);
        let params = CommandParams::new(serde_json::json!({
            "method": "GET",
            "path": "/api/estagios?page=2",
            "statusCode": 200
        }));

        let data = cmd
            .execute(&test_context("audit.record_http"), params)
            .unwrap()
            .data
            .unwrap();
        assert_eq!(data["level"], "info");
        assert_eq!(data["category"], "data_access");
        assert!(sink.is_empty());
    }

    #[test]
    fn test_missing_status_code_rejected() {
        let (log, _) = test_log();
        let cmd = RecordHttpCommand::new(log);
        let params = CommandParams::new(serde_json::json!({ "method": "GET", "path": "/" }));
        assert!(cmd.validate(&params).is_err());
    }

    #[test]
    fn test_empty_method_rejected() {
        let (log, _) = test_log();
        let cmd = RecordHttpCommand::new(log);
        let params = CommandParams::new(serde_json::json!({
            "method": " ",
            "path": "/",
            "statusCode": 200
        }));
        assert!(cmd.validate(&params).is_err());
    }
}
