//! Audit event pipeline.
//!
//! Records structured audit events in a bounded in-memory log, answers
//! filtered queries, and purges events past the retention window.
//!
//! ## Features
//!
//! - Typed event input with documented defaults
//! - Recursive masking of sensitive keys in event details
//! - FIFO eviction at a configurable size cap
//! - Level-gated formatted lines to the operational log sink
//! - Newest-first queries by time range, level, category and actor
//! - Periodic and on-demand retention purges
//! - Classification of HTTP exchanges reported by the web middleware

mod clock;
mod entry;
mod http;
mod logger;
mod query;
mod sanitize;
mod sink;
mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{AuditCategory, AuditEvent, AuditLevel, EventInput, UNKNOWN};
pub use http::{HttpExchange, LOGIN_FAILED};
pub use logger::{AuditLog, AuditStats, PurgeReport};
pub use query::AuditFilter;
pub use sanitize::{Masker, DEFAULT_MAX_MASK_DEPTH, DEFAULT_SENSITIVE_FIELDS, REDACTION_MARKER};
pub use sink::{format_line, AuditSink, MemorySink, SinkRecord, SinkSeverity, TracingSink, AUDIT_TARGET};
pub use sweeper::RetentionSweeper;
