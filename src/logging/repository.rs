//! Logger repository and logger handles
//!
//! The repository is built once from configuration and then only read. It
//! hands out named [`Logger`] handles; asking twice for the same name yields
//! the same underlying logger.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use super::layout::PatternLayout;
use super::level::Level;
use super::record::Record;
use super::reporter::FallbackReporter;
use super::sink::Sink;

/// Default logger threshold
pub const DEFAULT_THRESHOLD: Level = Level::Debug;

/// Configuration shared by every logger of a repository
struct Shared {
    threshold: Level,
    layout: PatternLayout,
    sinks: Vec<Arc<dyn Sink>>,
    reporter: FallbackReporter,
}

impl Shared {
    fn dispatch(&self, record: &Record) {
        let mut line: Option<String> = None;

        for sink in &self.sinks {
            if !sink.accepts(record.level) {
                continue;
            }
            let line = line.get_or_insert_with(|| self.layout.format(record));
            if let Err(e) = sink.write_line(record, line.as_str()) {
                self.reporter.report(sink.name(), "write to", &e);
            }
        }
    }
}

/// Builder for [`LoggerRepository`]
pub struct RepositoryBuilder {
    threshold: Level,
    layout: PatternLayout,
    sinks: Vec<Arc<dyn Sink>>,
    reporter: FallbackReporter,
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            layout: PatternLayout::default(),
            sinks: Vec::new(),
            reporter: FallbackReporter::default(),
        }
    }
}

impl RepositoryBuilder {
    /// Set the threshold every logger of the repository uses
    pub fn threshold(mut self, threshold: Level) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the layout used to render every record
    pub fn layout(mut self, layout: PatternLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Add a sink; records go to sinks in the order they were added
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Replace the stderr fallback used to report sink failures
    pub fn reporter(mut self, reporter: FallbackReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Freeze the configuration into a repository
    pub fn build(self) -> LoggerRepository {
        LoggerRepository {
            shared: Arc::new(Shared {
                threshold: self.threshold,
                layout: self.layout,
                sinks: self.sinks,
                reporter: self.reporter,
            }),
            loggers: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// Hands out named loggers that share one threshold, layout and sink list
#[derive(Clone)]
pub struct LoggerRepository {
    shared: Arc<Shared>,
    loggers: Arc<RwLock<HashMap<String, Logger>>>,
}

impl fmt::Debug for LoggerRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerRepository")
            .field("threshold", &self.shared.threshold)
            .field("pattern", &self.shared.layout.pattern())
            .field(
                "sinks",
                &self.shared.sinks.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl LoggerRepository {
    /// Start a repository with the default threshold and layout and no sinks
    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::default()
    }

    /// Get the logger registered under `name`, creating it on first use
    pub fn get_logger(&self, name: &str) -> Logger {
        if let Ok(loggers) = self.loggers.read() {
            if let Some(logger) = loggers.get(name) {
                return logger.clone();
            }
        }

        let mut loggers = match self.loggers.write() {
            Ok(loggers) => loggers,
            Err(poisoned) => poisoned.into_inner(),
        };
        loggers
            .entry(name.to_string())
            .or_insert_with(|| Logger {
                inner: Arc::new(LoggerInner {
                    name: name.to_string(),
                    shared: Arc::clone(&self.shared),
                }),
            })
            .clone()
    }

    /// Names of all loggers handed out so far, sorted
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .loggers
            .read()
            .map(|l| l.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn threshold(&self) -> Level {
        self.shared.threshold
    }

    pub fn layout(&self) -> &PatternLayout {
        &self.shared.layout
    }

    pub fn sinks(&self) -> &[Arc<dyn Sink>] {
        &self.shared.sinks
    }

    pub fn reporter(&self) -> &FallbackReporter {
        &self.shared.reporter
    }

    /// Flush every sink, reporting failures instead of returning them
    pub fn flush(&self) {
        for sink in &self.shared.sinks {
            if let Err(e) = sink.flush() {
                self.shared.reporter.report(sink.name(), "flush", &e);
            }
        }
    }
}

struct LoggerInner {
    name: String,
    shared: Arc<Shared>,
}

/// A named handle used to emit records
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.inner.name)
            .field("threshold", &self.inner.shared.threshold)
            .finish()
    }
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Effective threshold of this logger
    pub fn threshold(&self) -> Level {
        self.inner.shared.threshold
    }

    /// Whether a record at `level` would pass this logger's threshold
    pub fn is_enabled(&self, level: Level) -> bool {
        level.passes(self.inner.shared.threshold)
    }

    /// Whether both handles refer to the same logger
    pub fn ptr_eq(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Emit `message` at `level`
    ///
    /// Records below the logger threshold are dropped before any formatting.
    /// Sink failures go to the repository's fallback reporter.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        if !self.is_enabled(level) {
            return;
        }
        let record = Record::new(level, self.inner.name.as_str(), message.to_string());
        self.inner.shared.dispatch(&record);
    }

    pub fn trace(&self, message: impl fmt::Display) {
        self.log(Level::Trace, message);
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::Error, message);
    }
}
