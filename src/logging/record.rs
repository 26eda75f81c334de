//! Log records

use std::collections::BTreeMap;

use chrono::{DateTime, Local};

use super::level::Level;
use super::mdc;

/// A single log event, built once per call and handed to every sink
#[derive(Debug, Clone)]
pub struct Record {
    /// When the record was created
    pub timestamp: DateTime<Local>,
    /// Severity
    pub level: Level,
    /// Name of the logger that produced the record
    pub logger: String,
    /// Log message
    pub message: String,
    /// Name of the thread that logged, if it has one
    pub thread: Option<String>,
    /// Diagnostic context captured at creation
    pub context: BTreeMap<String, String>,
}

impl Record {
    /// Create a record stamped with the current time, thread and context
    pub fn new(level: Level, logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            logger: logger.into(),
            message: message.into(),
            thread: std::thread::current().name().map(str::to_string),
            context: mdc::snapshot(),
        }
    }
}
