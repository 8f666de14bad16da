//! Audit log commands.
//!
//! Recording, querying, purging and summarizing the shared `AuditLog`.

mod purge;
mod query;
mod record;
mod record_http;
mod stats;

pub use purge::PurgeCommand;
pub use query::QueryCommand;
pub use record::RecordCommand;
pub use record_http::RecordHttpCommand;
pub use stats::StatsCommand;

#[cfg(test)]
pub(crate) fn test_log() -> (
    std::sync::Arc<crate::audit::AuditLog>,
    std::sync::Arc<crate::audit::MemorySink>,
) {
    use std::sync::Arc;

    use crate::audit::{AuditLog, MemorySink};
    use crate::config::AuditConfig;

    let sink = Arc::new(MemorySink::new());
    let log = Arc::new(AuditLog::new(&AuditConfig::default(), sink.clone()));
    (log, sink)
}
