//! Query filters over the audit log.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::entry::{AuditCategory, AuditEvent, AuditLevel};

/// Criteria for selecting audit events.
///
/// All fields are optional and combined with AND. `limit` keeps the most
/// recent matches.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AuditFilter {
    /// Inclusive lower bound on the event timestamp.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the event timestamp.
    pub end_date: Option<DateTime<Utc>>,
    pub level: Option<AuditLevel>,
    pub category: Option<AuditCategory>,
    pub actor_id: Option<String>,
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn since(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }

    pub fn level(mut self, level: AuditLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn category(mut self, category: impl Into<AuditCategory>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `event` satisfies every criterion except `limit`.
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(start) = self.start_date {
            if event.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if event.timestamp > end {
                return false;
            }
        }
        if let Some(level) = self.level {
            if event.level != level {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &event.category != category {
                return false;
            }
        }
        if let Some(actor_id) = &self.actor_id {
            if event.actor_id.as_deref() != Some(actor_id.as_str()) {
                return false;
            }
        }
        true
    }

    /// Select matching events from a chronological sequence, newest first.
    pub fn apply<'a, I>(&self, events: I) -> Vec<AuditEvent>
    where
        I: DoubleEndedIterator<Item = &'a AuditEvent>,
    {
        // Walking backwards and stopping at `limit` yields the same events as
        // taking the last `limit` chronological matches and reversing them.
        let limit = self.limit.unwrap_or(usize::MAX);
        events
            .rev()
            .filter(|e| self.matches(e))
            .take(limit)
            .cloned()
            .collect()
    }
}
