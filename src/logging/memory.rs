//! In-memory sink
//!
//! Keeps the most recent rendered lines in a bounded ring buffer so they can
//! be inspected after the fact.

use std::collections::VecDeque;
use std::io;
use std::sync::RwLock;

use chrono::{DateTime, Local};

use super::level::Level;
use super::record::Record;
use super::sink::Sink;

/// Default number of entries kept by [`MemorySink::new`]
pub const DEFAULT_CAPACITY: usize = 10_000;

/// A captured log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    /// Timestamp of the originating record
    pub timestamp: DateTime<Local>,
    /// Level of the originating record
    pub level: Level,
    /// Logger that produced it
    pub logger: String,
    /// Rendered line, without the line break
    pub line: String,
}

/// Thread-safe ring buffer sink
pub struct MemorySink {
    name: String,
    threshold: Level,
    entries: RwLock<VecDeque<MemoryEntry>>,
    max_entries: usize,
}

impl MemorySink {
    /// Create a memory sink holding up to [`DEFAULT_CAPACITY`] entries
    pub fn new(name: impl Into<String>, threshold: Level) -> Self {
        Self::with_capacity(name, threshold, DEFAULT_CAPACITY)
    }

    /// Create a memory sink holding up to `max_entries` entries
    pub fn with_capacity(name: impl Into<String>, threshold: Level, max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            name: name.into(),
            threshold,
            entries: RwLock::new(VecDeque::with_capacity(max_entries.min(DEFAULT_CAPACITY))),
            max_entries,
        }
    }

    /// Get all entries, oldest first
    pub fn entries(&self) -> Vec<MemoryEntry> {
        self.entries
            .read()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Get the rendered lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .read()
            .map(|e| e.iter().map(|entry| entry.line.clone()).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> Level {
        self.threshold
    }

    fn write_line(&self, record: &Record, line: &str) -> io::Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory sink lock poisoned"))?;

        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(MemoryEntry {
            timestamp: record.timestamp,
            level: record.level,
            logger: record.logger.clone(),
            line: line.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(sink: &MemorySink, level: Level, message: &str) {
        let record = Record::new(level, "test", message);
        sink.write_line(&record, message).unwrap();
    }

    #[test]
    fn test_memory_sink_push_and_retrieve() {
        let sink = MemorySink::new("memory", Level::Trace);

        push(&sink, Level::Info, "message 1");
        push(&sink, Level::Warn, "warning 1");
        push(&sink, Level::Error, "error 1");

        assert_eq!(sink.len(), 3);
        let entries = sink.entries();
        assert_eq!(entries[0].line, "message 1");
        assert_eq!(entries[1].level, Level::Warn);
        assert_eq!(entries[2].logger, "test");
        assert_eq!(sink.lines(), vec!["message 1", "warning 1", "error 1"]);
    }

    #[test]
    fn test_memory_sink_capacity() {
        let sink = MemorySink::with_capacity("memory", Level::Trace, 3);

        for i in 0..5 {
            push(&sink, Level::Info, &format!("msg {}", i));
        }

        assert_eq!(sink.lines(), vec!["msg 2", "msg 3", "msg 4"]);
    }

    #[test]
    fn test_memory_sink_clear() {
        let sink = MemorySink::new("memory", Level::Trace);
        push(&sink, Level::Info, "x");
        assert!(!sink.is_empty());
        sink.clear();
        assert!(sink.is_empty());
    }
}
