//! Append-only event log shared by every component of the simulation.
//!
//! Entries are immutable once appended and are never removed or rotated;
//! insertion order is chronological and significant. The log is part of the
//! observable system state, distinct from the operational `tracing` output.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::types::LogCategory;

/// A single timestamped, categorized event.
///
/// Entries are created by [`EventLog::append`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonically increasing identifier, unique within one log.
    pub id: u64,

    /// When the entry was appended.
    pub timestamp: DateTime<Local>,

    /// Human-readable event text.
    pub message: String,

    /// Which component produced the event.
    pub category: LogCategory,
}

impl LogEntry {
    /// Format the timestamp the way the log viewer displays it (hh:mm:ss).
    #[must_use]
    pub fn time_display(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Ordered, append-only sequence of [`LogEntry`] values.
///
/// # Examples
///
/// ```
/// use palmgate_core::{EventLog, LogCategory};
///
/// let mut log = EventLog::new();
/// log.append("Door: Opened", LogCategory::Door);
/// log.append("Door: Closed", LogCategory::Door);
///
/// assert_eq!(log.len(), 2);
/// assert!(log.entries()[0].id < log.entries()[1].id);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    next_id: u64,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new entry, stamped with the current time and the next id.
    ///
    /// This operation has no failure modes.
    pub fn append(&mut self, message: impl Into<String>, category: LogCategory) -> &LogEntry {
        let entry = LogEntry {
            id: self.next_id,
            timestamp: Local::now(),
            message: message.into(),
            category,
        };
        self.next_id += 1;
        self.entries.push(entry);
        // Just pushed, so the slice is non-empty.
        self.entries.last().unwrap()
    }

    /// Full ordered sequence, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of entries appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries from a given category, preserving order.
    pub fn by_category(&self, category: LogCategory) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_monotonic_ids() {
        let mut log = EventLog::new();
        log.append("first", LogCategory::Device);
        log.append("second", LogCategory::Middleware);
        log.append("third", LogCategory::App);

        let ids: Vec<u64> = log.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_entries_preserve_insertion_order() {
        let mut log = EventLog::new();
        for i in 0..10 {
            log.append(format!("event {i}"), LogCategory::Door);
        }

        let messages: Vec<&str> = log.entries().iter().map(|e| e.message.as_str()).collect();
        let expected: Vec<String> = (0..10).map(|i| format!("event {i}")).collect();
        assert_eq!(messages, expected);
    }

    #[test]
    fn test_append_returns_the_new_entry() {
        let mut log = EventLog::new();
        let entry = log.append("Door: Opened", LogCategory::Door);
        assert_eq!(entry.id, 0);
        assert_eq!(entry.message, "Door: Opened");
        assert_eq!(entry.category, LogCategory::Door);
    }

    #[test]
    fn test_existing_entries_unchanged_by_later_appends() {
        let mut log = EventLog::new();
        log.append("first", LogCategory::Device);
        let before = log.entries()[0].clone();

        log.append("second", LogCategory::Device);
        log.append("third", LogCategory::Device);

        assert_eq!(log.entries()[0], before);
    }

    #[test]
    fn test_by_category_filters_in_order() {
        let mut log = EventLog::new();
        log.append("d1", LogCategory::Device);
        log.append("m1", LogCategory::Middleware);
        log.append("d2", LogCategory::Device);

        let device: Vec<&str> = log
            .by_category(LogCategory::Device)
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(device, vec!["d1", "d2"]);
    }

    #[test]
    fn test_empty_log() {
        let log = EventLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn test_log_serialization_round_trip() {
        let mut log = EventLog::new();
        log.append("Door: Opened", LogCategory::Door);

        let json = serde_json::to_string(&log).unwrap();
        let restored: EventLog = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, log);
    }
}
