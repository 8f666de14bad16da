//! Query the audit log.

use std::sync::Arc;

use tracing::debug;

use crate::audit::{AuditFilter, AuditLog};
use crate::commands::traits::Command;
use crate::commands::types::{CommandParams, CommandResult, ExecutionContext};
use crate::error::DaemonError;

/// Return events matching an `AuditFilter`, newest first.
pub struct QueryCommand {
    log: Arc<AuditLog>,
}

impl QueryCommand {
    pub fn new(log: Arc<AuditLog>) -> Self {
        Self { log }
    }
}

impl Command for QueryCommand {
    fn name(&self) -> &'static str {
        "audit.query"
    }

    fn validate(&self, params: &CommandParams) -> Result<(), DaemonError> {
        params.parse::<AuditFilter>().map(|_| ())
    }

    fn execute(
        &self,
        ctx: &ExecutionContext,
        params: CommandParams,
    ) -> Result<CommandResult, DaemonError> {
        let filter: AuditFilter = params.parse()?;
        let events = self.log.query(&filter);

        debug!(
            request_id = %ctx.request_id,
            count = events.len(),
            "Audit query served"
        );

        Ok(CommandResult::success(serde_json::json!({
            "count": events.len(),
            "events": events,
        })))
    }
}
