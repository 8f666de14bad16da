//! Audit log statistics.

use std::sync::Arc;

use crate::audit::AuditLog;
use crate::commands::traits::Command;
use crate::commands::types::{CommandParams, CommandResult, ExecutionContext};
use crate::error::DaemonError;

/// Summarize the log: size, counters and per-level/per-category counts.
pub struct StatsCommand {
    log: Arc<AuditLog>,
}

impl StatsCommand {
    pub fn new(log: Arc<AuditLog>) -> Self {
        Self { log }
    }
}

impl Command for StatsCommand {
    fn name(&self) -> &'static str {
        "audit.stats"
    }

    fn validate(&self, _params: &CommandParams) -> Result<(), DaemonError> {
        Ok(())
    }

    fn execute(
        &self,
        _ctx: &ExecutionContext,
        _params: CommandParams,
    ) -> Result<CommandResult, DaemonError> {
        CommandResult::from_serialize(&self.log.stats())
    }
}
