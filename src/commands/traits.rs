//! Command trait definition.

use crate::error::DaemonError;

use super::types::{CommandParams, CommandResult, ExecutionContext};

/// Core trait for all executable commands.
///
/// Every command the daemon can execute implements this trait.
///
/// # Example
///
/// ```ignore
/// pub struct CountCommand {
///     log: Arc<AuditLog>,
/// }
///
/// impl Command for CountCommand {
///     fn name(&self) -> &'static str {
///         "audit.count"
///     }
///
///     fn validate(&self, params: &CommandParams) -> Result<(), DaemonError> {
///         params.require_object()
///     }
///
///     fn execute(
///         &self,
///         _ctx: &ExecutionContext,
///         _params: CommandParams,
///     ) -> Result<CommandResult, DaemonError> {
///         Ok(CommandResult::success(serde_json::json!({"count": self.log.len()})))
///     }
/// }
/// ```
pub trait Command: Send + Sync {
    /// Unique command identifier (e.g., "audit.record", "system.ping").
    fn name(&self) -> &'static str;

    /// Validate the command parameters before execution.
    fn validate(&self, params: &CommandParams) -> Result<(), DaemonError>;

    /// Execute the command.
    ///
    /// Called from a blocking context via `spawn_blocking`.
    fn execute(
        &self,
        ctx: &ExecutionContext,
        params: CommandParams,
    ) -> Result<CommandResult, DaemonError>;

    /// Whether the invocation itself is recorded as an admin action.
    ///
    /// Off by default: recording and reading the log must not feed it.
    fn requires_audit(&self) -> bool {
        false
    }
}
