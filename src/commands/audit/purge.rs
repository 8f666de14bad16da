//! Purge events past the retention window.

use std::sync::Arc;

use tracing::info;

use crate::audit::AuditLog;
use crate::commands::traits::Command;
use crate::commands::types::{CommandParams, CommandResult, ExecutionContext};
use crate::error::DaemonError;

/// Remove events older than `days` (default: the configured retention).
///
/// This is an administrative action and is itself recorded.
pub struct PurgeCommand {
    log: Arc<AuditLog>,
}

impl PurgeCommand {
    pub fn new(log: Arc<AuditLog>) -> Self {
        Self { log }
    }

    fn days(&self, params: &CommandParams) -> Result<u32, DaemonError> {
        match params.get_optional_u64("days")? {
            None => Ok(self.log.retention_days()),
            Some(days) => u32::try_from(days)
                .map_err(|_| DaemonError::invalid_parameter("days", "out of range")),
        }
    }
}

impl Command for PurgeCommand {
    fn name(&self) -> &'static str {
        "audit.purge"
    }

    fn validate(&self, params: &CommandParams) -> Result<(), DaemonError> {
        params.require_object()?;
        self.days(params).map(|_| ())
    }

    fn execute(
        &self,
        ctx: &ExecutionContext,
        params: CommandParams,
    ) -> Result<CommandResult, DaemonError> {
        let days = self.days(&params)?;
        let report = self.log.purge_older_than(days);

        info!(
            request_id = %ctx.request_id,
            peer_uid = ctx.peer.uid,
            days,
            removed = report.removed_count,
            "Audit log purged on request"
        );

        CommandResult::from_serialize(&report)
    }

    fn requires_audit(&self) -> bool {
        true
    }
}
