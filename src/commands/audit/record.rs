//! Record a single audit event.

use std::sync::Arc;

use tracing::debug;

use crate::audit::{AuditLog, EventInput};
use crate::commands::traits::Command;
use crate::commands::types::{CommandParams, CommandResult, ExecutionContext};
use crate::error::DaemonError;

/// Append an event built from `EventInput` JSON.
///
/// Returns the assigned `id` and `timestamp`.
pub struct RecordCommand {
    log: Arc<AuditLog>,
}

impl RecordCommand {
    pub fn new(log: Arc<AuditLog>) -> Self {
        Self { log }
    }
}

impl Command for RecordCommand {
    fn name(&self) -> &'static str {
        "audit.record"
    }

    fn validate(&self, params: &CommandParams) -> Result<(), DaemonError> {
        params.parse::<EventInput>().map(|_| ())
    }

    fn execute(
        &self,
        ctx: &ExecutionContext,
        params: CommandParams,
    ) -> Result<CommandResult, DaemonError> {
        let input: EventInput = params.parse()?;
        let event = self.log.record(input);

        debug!(
            request_id = %ctx.request_id,
            event_id = %event.id,
            level = event.level.as_str(),
            "Audit event recorded"
        );

        Ok(CommandResult::success(serde_json::json!({
            "id": event.id,
            "timestamp": event.timestamp,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditFilter, AuditLevel};
    use crate::commands::audit::test_log;
    use crate::commands::types::test_context;

    #[test]
    fn test_record_name() {
        let (log, _) = test_log();
        assert_eq!(RecordCommand::new(log).name(), "audit.record");
    }

    #[test]
    fn test_record_execute() {
        let (log, sink) = test_log();
        let cmd = RecordCommand::new(Arc::clone(&log));
        let params = CommandParams::new(serde_json::json!({
            "level": "warn",
            "category": "authentication",
            "action": "login_failed",
            "actorId": "user-7",
            "sourceAddress": "10.0.0.5",
            "details": { "email": "a@b.c", "password": "hunter2" }
        }));

        cmd.validate(&params).unwrap();
        let result = cmd.execute(&test_context("audit.record"), params).unwrap();
        let data = result.data.unwrap();
        assert!(data["id"].is_string());
        assert!(data["timestamp"].is_string());

        let events = log.query(&AuditFilter::new());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, AuditLevel::Warn);
        assert_eq!(events[0].details.as_ref().unwrap()["password"], "[REDACTED]");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_record_empty_params_uses_defaults() {
        let (log, _) = test_log();
        let cmd = RecordCommand::new(Arc::clone(&log));
        let params = CommandParams::new(serde_json::json!({}));

        cmd.validate(&params).unwrap();
        cmd.execute(&test_context("audit.record"), params).unwrap();

        let events = log.query(&AuditFilter::new());
        assert_eq!(events[0].level, AuditLevel::Info);
        assert_eq!(events[0].category.as_str(), "general");
    }

    #[test]
    fn test_record_rejects_wrong_types() {
        let (log, _) = test_log();
        let cmd = RecordCommand::new(log);
        let params = CommandParams::new(serde_json::json!({ "statusCode": "four-oh-one" }));
        assert!(matches!(
            cmd.validate(&params),
            Err(DaemonError::Validation { .. })
        ));
    }

    #[test]
    fn test_record_not_self_audited() {
        let (log, _) = test_log();
        assert!(!RecordCommand::new(log).requires_audit());
    }
}
