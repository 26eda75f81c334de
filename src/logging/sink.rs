//! Output sinks
//!
//! A sink owns a destination and a threshold. The repository renders each
//! record once and hands the line to every sink whose threshold it passes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::level::Level;
use super::record::Record;

/// A destination for rendered log lines
pub trait Sink: Send + Sync {
    /// Name used when reporting failures
    fn name(&self) -> &str;

    /// Lowest level this sink accepts
    fn threshold(&self) -> Level;

    /// Write one rendered line; the sink appends the line break
    fn write_line(&self, record: &Record, line: &str) -> io::Result<()>;

    /// Flush buffered output
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    /// Whether a record at `level` should reach this sink
    fn accepts(&self, level: Level) -> bool {
        level.passes(self.threshold())
    }
}

/// Errors raised while setting up a sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create log directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open log file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Standard stream a console sink writes to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleStream {
    #[default]
    Stdout,
    Stderr,
}

/// Writes lines to stdout or stderr
#[derive(Debug)]
pub struct ConsoleSink {
    name: String,
    threshold: Level,
    stream: ConsoleStream,
}

impl ConsoleSink {
    pub fn new(stream: ConsoleStream, threshold: Level) -> Self {
        let name = match stream {
            ConsoleStream::Stdout => "console:stdout",
            ConsoleStream::Stderr => "console:stderr",
        };
        Self {
            name: name.to_string(),
            threshold,
            stream,
        }
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> Level {
        self.threshold
    }

    fn write_line(&self, _record: &Record, line: &str) -> io::Result<()> {
        match self.stream {
            ConsoleStream::Stdout => writeln!(io::stdout().lock(), "{}", line),
            ConsoleStream::Stderr => writeln!(io::stderr().lock(), "{}", line),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self.stream {
            ConsoleStream::Stdout => io::stdout().flush(),
            ConsoleStream::Stderr => io::stderr().flush(),
        }
    }
}

/// Appends lines to a file
#[derive(Debug)]
pub struct FileSink {
    name: String,
    threshold: Level,
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Open `path` for logging, creating parent directories as needed
    ///
    /// With `append = false` an existing file is truncated.
    pub fn open(path: impl AsRef<Path>, threshold: Level, append: bool) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| SinkError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(&path).map_err(|source| SinkError::Open {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            name: format!("file:{}", path.display()),
            threshold,
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> Level {
        self.threshold
    }

    fn write_line(&self, _record: &Record, line: &str) -> io::Result<()> {
        let mut file = lock(&self.file);
        // Single write so concurrent writers never interleave within a line
        file.write_all(format!("{}\n", line).as_bytes())
    }

    fn flush(&self) -> io::Result<()> {
        lock(&self.file).flush()
    }
}

/// Writes lines to an arbitrary writer
///
/// Useful for pipes, sockets owned by the caller, and tests.
pub struct WriterSink {
    name: String,
    threshold: Level,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl WriterSink {
    pub fn new(name: impl Into<String>, threshold: Level, writer: impl Write + Send + 'static) -> Self {
        Self {
            name: name.into(),
            threshold,
            writer: Mutex::new(Box::new(writer)),
        }
    }
}

impl Sink for WriterSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn threshold(&self) -> Level {
        self.threshold
    }

    fn write_line(&self, _record: &Record, line: &str) -> io::Result<()> {
        lock(&self.writer).write_all(format!("{}\n", line).as_bytes())
    }

    fn flush(&self) -> io::Result<()> {
        lock(&self.writer).flush()
    }
}

/// Lock a sink destination, recovering from a poisoned mutex
///
/// A panic in one writer must not silence logging for the rest of the process.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(level: Level) -> Record {
        Record::new(level, "sender", "msg")
    }

    #[test]
    fn test_sink_accepts_by_threshold() {
        let sink = ConsoleSink::new(ConsoleStream::Stdout, Level::Info);
        assert!(!sink.accepts(Level::Debug));
        assert!(sink.accepts(Level::Info));
        assert!(sink.accepts(Level::Error));
        assert_eq!(sink.name(), "console:stdout");
    }

    #[test]
    fn test_file_sink_appends_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("sender.log");

        let sink = FileSink::open(&path, Level::Trace, true).unwrap();
        sink.write_line(&record(Level::Info), "INFO sender - Hello 0")
            .unwrap();
        sink.write_line(&record(Level::Info), "INFO sender - Hello 1")
            .unwrap();
        sink.flush().unwrap();
        drop(sink);

        // Reopen in append mode keeps earlier content
        let sink = FileSink::open(&path, Level::Trace, true).unwrap();
        sink.write_line(&record(Level::Debug), "DEBUG sender - Bye")
            .unwrap();
        assert_eq!(sink.path(), path.as_path());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "INFO sender - Hello 0\nINFO sender - Hello 1\nDEBUG sender - Bye\n"
        );
    }

    #[test]
    fn test_file_sink_truncates_without_append() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sender.log");
        fs::write(&path, "old line\n").unwrap();

        let sink = FileSink::open(&path, Level::Trace, false).unwrap();
        sink.write_line(&record(Level::Info), "new line").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new line\n");
    }

    #[test]
    fn test_file_sink_open_error() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be opened as a log file
        let err = FileSink::open(temp_dir.path(), Level::Trace, true).unwrap_err();
        assert!(matches!(err, SinkError::Open { .. }));
    }

    #[test]
    fn test_writer_sink_writes_to_writer() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.txt");
        let file = File::create(&path).unwrap();

        let sink = WriterSink::new("test", Level::Warn, file);
        assert_eq!(sink.name(), "test");
        assert!(!sink.accepts(Level::Info));
        sink.write_line(&record(Level::Warn), "WARN sender - careful")
            .unwrap();
        sink.flush().unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "WARN sender - careful\n"
        );
    }
}
