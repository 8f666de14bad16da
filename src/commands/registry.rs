//! Command registry for dispatching requests to handlers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::audit::AuditLog;
use crate::error::{CommandErrorKind, DaemonError};
use crate::socket::ConnectionMetrics;

use super::audit::{PurgeCommand, QueryCommand, RecordCommand, RecordHttpCommand, StatsCommand};
use super::system::{MetricsCommand, PingCommand};
use super::traits::Command;
use super::types::{CommandParams, CommandResult, ExecutionContext};

/// Registry of all available commands.
#[derive(Clone)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry with all built-in commands bound to `log`.
    ///
    /// `system.metrics` is only registered when connection metrics are given.
    pub fn new(log: Arc<AuditLog>, metrics: Option<Arc<ConnectionMetrics>>) -> Self {
        let mut registry = Self {
            commands: HashMap::new(),
        };

        // System commands
        registry.register(Arc::new(PingCommand));
        if let Some(metrics) = metrics {
            registry.register(Arc::new(MetricsCommand::new(metrics, Arc::clone(&log))));
        }

        // Audit commands
        registry.register(Arc::new(RecordCommand::new(Arc::clone(&log))));
        registry.register(Arc::new(RecordHttpCommand::new(Arc::clone(&log))));
        registry.register(Arc::new(QueryCommand::new(Arc::clone(&log))));
        registry.register(Arc::new(PurgeCommand::new(Arc::clone(&log))));
        registry.register(Arc::new(StatsCommand::new(log)));

        info!(
            count = registry.commands.len(),
            "Command registry initialized"
        );

        registry
    }

    /// Register a command.
    fn register(&mut self, command: Arc<dyn Command>) {
        let name = command.name();
        debug!(command = name, "Registering command");
        self.commands.insert(name, command);
    }

    /// Get a command by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// Look up, validate and execute a command.
    pub fn dispatch(
        &self,
        ctx: &ExecutionContext,
        command_name: &str,
        params: CommandParams,
    ) -> Result<CommandResult, DaemonError> {
        let command = self
            .commands
            .get(command_name)
            .ok_or_else(|| DaemonError::Command {
                kind: CommandErrorKind::UnknownCommand {
                    name: command_name.to_string(),
                },
            })?;

        command.validate(&params)?;
        command.execute(ctx, params)
    }

    /// List all registered command names.
    pub fn list_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
