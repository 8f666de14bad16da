//! Ping command for health checking.

use crate::error::DaemonError;

use super::super::traits::Command;
use super::super::types::{CommandParams, CommandResult, ExecutionContext};

/// Simple ping command that returns a pong response.
///
/// Used for health checks and verifying the daemon is responsive.
pub struct PingCommand;

impl Command for PingCommand {
    fn name(&self) -> &'static str {
        "system.ping"
    }

    fn validate(&self, _params: &CommandParams) -> Result<(), DaemonError> {
        Ok(())
    }

    fn execute(
        &self,
        ctx: &ExecutionContext,
        _params: CommandParams,
    ) -> Result<CommandResult, DaemonError> {
        Ok(CommandResult::success(serde_json::json!({
            "pong": true,
            "timestamp": ctx.timestamp,
            "request_id": ctx.request_id.to_string(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::types::test_context;

    #[test]
    fn test_ping_name() {
        let cmd = PingCommand;
        assert_eq!(cmd.name(), "system.ping");
        assert!(!cmd.requires_audit());
    }

    #[test]
    fn test_ping_execute() {
        let cmd = PingCommand;
        let ctx = test_context("system.ping");
        let params = CommandParams::new(serde_json::json!({}));

        let result = cmd.execute(&ctx, params).unwrap();
        assert!(result.success);

        let data = result.data.unwrap();
        assert_eq!(data["pong"], true);
        assert!(data["timestamp"].is_string());
        assert_eq!(data["request_id"], ctx.request_id.to_string());
    }
}
