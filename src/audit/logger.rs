//! In-memory audit log.
//!
//! Holds the most recent events in a bounded buffer, writes warn-and-above
//! events to the operational sink, and purges events past the retention
//! window. Thread-safe via an internal mutex.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::AuditConfig;

use super::clock::{Clock, SystemClock};
use super::entry::{AuditEvent, EventInput};
use super::query::AuditFilter;
use super::sanitize::Masker;
use super::sink::{format_line, AuditSink, SinkRecord, SinkSeverity};

/// Outcome of a retention purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    pub removed_count: usize,
    pub size_before: usize,
    pub size_after: usize,
}

/// Summary of the log contents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    /// Events currently held.
    pub size: usize,
    pub capacity: usize,
    /// Events recorded since start, including evicted and purged ones.
    pub total_recorded: u64,
    /// Events dropped by the size cap.
    pub total_evicted: u64,
    /// Events removed by retention purges.
    pub total_purged: u64,
    pub by_level: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest: Option<DateTime<Utc>>,
}

/// Bounded, thread-safe audit log.
///
/// Owned by the daemon's composition root and shared as `Arc<AuditLog>`.
/// Oldest events sit at the front; appending past `max_size` evicts from
/// the front.
pub struct AuditLog {
    events: Mutex<VecDeque<AuditEvent>>,
    max_size: usize,
    retention_days: u32,
    masker: Masker,
    sink: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    total_recorded: AtomicU64,
    total_evicted: AtomicU64,
    total_purged: AtomicU64,
}

impl AuditLog {
    /// Create an empty log from the audit configuration.
    pub fn new(config: &AuditConfig, sink: Arc<dyn AuditSink>) -> Self {
        let max_size = config.max_log_size.max(1);
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_size.min(4096))),
            max_size,
            retention_days: config.retention_days,
            masker: Masker::new(
                config.sensitive_fields.as_slice(),
                config.redaction_marker.clone(),
                config.max_mask_depth,
            ),
            sink,
            clock: Arc::new(SystemClock),
            total_recorded: AtomicU64::new(0),
            total_evicted: AtomicU64::new(0),
            total_purged: AtomicU64::new(0),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<AuditEvent>> {
        // Recover from mutex poisoning
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record an event.
    ///
    /// Never fails: missing fields get their defaults, details are masked,
    /// and sink problems are ignored. Returns a copy of the stored event.
    pub fn record(&self, mut input: EventInput) -> AuditEvent {
        let details_error = input.details_error.take();
        let details = input.details.take().map(|d| self.masker.mask(&d));

        let event = {
            let mut events = self.lock();
            // Stamped under the lock so log order and timestamp order agree.
            let event = input.into_event(Uuid::new_v4(), self.clock.now(), details);
            events.push_back(event.clone());

            let mut evicted = 0u64;
            while events.len() > self.max_size {
                events.pop_front();
                evicted += 1;
            }
            if evicted > 0 {
                self.total_evicted.fetch_add(evicted, Ordering::Relaxed);
            }
            event
        };
        self.total_recorded.fetch_add(1, Ordering::Relaxed);

        if let Some(err) = details_error {
            self.emit(SinkRecord::new(
                SinkSeverity::Warn,
                format!(
                    "[AUDIT] details dropped for '{}': {}",
                    event.action, err
                ),
            ));
        }

        if event.level.reaches_sink() {
            let mut record = SinkRecord::new(event.level.into(), format_line(&event));
            if event.level.includes_details() {
                record.details = event
                    .details
                    .as_ref()
                    .and_then(|d| serde_json::to_string(d).ok());
            }
            self.emit(record);
        }

        event
    }

    fn emit(&self, record: SinkRecord) {
        if let Err(e) = self.sink.write(&record) {
            debug!(error = %e, "Audit sink write failed");
        }
    }

    /// Events matching `filter`, newest first.
    pub fn query(&self, filter: &AuditFilter) -> Vec<AuditEvent> {
        let events = self.lock();
        filter.apply(events.iter())
    }

    /// Remove events older than `days` days.
    pub fn purge_older_than(&self, days: u32) -> PurgeReport {
        let now = self.clock.now();
        let report = match now.checked_sub_signed(Duration::days(i64::from(days))) {
            Some(cutoff) => {
                let mut events = self.lock();
                let size_before = events.len();
                events.retain(|e| e.timestamp >= cutoff);
                PurgeReport {
                    removed_count: size_before - events.len(),
                    size_before,
                    size_after: events.len(),
                }
            }
            None => {
                let size = self.len();
                PurgeReport {
                    removed_count: 0,
                    size_before: size,
                    size_after: size,
                }
            }
        };

        if report.removed_count > 0 {
            self.total_purged
                .fetch_add(report.removed_count as u64, Ordering::Relaxed);
            self.emit(SinkRecord::new(
                SinkSeverity::Info,
                format!(
                    "[AUDIT] Purged {} events older than {} days (size {} -> {})",
                    report.removed_count, days, report.size_before, report.size_after
                ),
            ));
        }

        report
    }

    /// Remove events older than the configured retention window.
    pub fn purge_expired(&self) -> PurgeReport {
        self.purge_older_than(self.retention_days)
    }

    /// Summary counts over the current contents.
    pub fn stats(&self) -> AuditStats {
        let events = self.lock();
        let mut by_level = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        for event in events.iter() {
            *by_level.entry(event.level.as_str().to_string()).or_insert(0) += 1;
            *by_category.entry(event.category.to_string()).or_insert(0) += 1;
        }

        AuditStats {
            size: events.len(),
            capacity: self.max_size,
            total_recorded: self.total_recorded.load(Ordering::Relaxed),
            total_evicted: self.total_evicted.load(Ordering::Relaxed),
            total_purged: self.total_purged.load(Ordering::Relaxed),
            by_level,
            by_category,
            oldest: events.front().map(|e| e.timestamp),
            newest: events.back().map(|e| e.timestamp),
        }
    }

    /// Number of events currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of events held.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Configured retention window in days.
    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }
}
