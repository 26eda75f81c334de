//! Fallback reporting for sink failures
//!
//! A sink that cannot write must not take the program down with it. Failures
//! are written to a fallback stream (stderr unless replaced) and counted.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::sink::lock;

/// Receives reports about failed sink writes
pub struct FallbackReporter {
    stream: Mutex<Box<dyn Write + Send>>,
    failures: AtomicUsize,
}

impl Default for FallbackReporter {
    fn default() -> Self {
        Self::new(io::stderr())
    }
}

impl std::fmt::Debug for FallbackReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackReporter")
            .field("failures", &self.failure_count())
            .finish_non_exhaustive()
    }
}

impl FallbackReporter {
    /// Report to the given stream instead of stderr
    pub fn new(stream: impl Write + Send + 'static) -> Self {
        Self {
            stream: Mutex::new(Box::new(stream)),
            failures: AtomicUsize::new(0),
        }
    }

    /// Record a failed operation on `sink`
    pub fn report(&self, sink: &str, action: &str, error: &io::Error) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        let mut stream = lock(&self.stream);
        // Nowhere left to report to if this fails too
        let _ = writeln!(stream, "logfacade: failed to {} sink '{}': {}", action, sink, error);
        let _ = stream.flush();
    }

    /// Number of failures reported so far
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Shared buffer so the test can read what the reporter wrote
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_report_writes_and_counts() {
        let buf = SharedBuf::default();
        let reporter = FallbackReporter::new(buf.clone());
        assert_eq!(reporter.failure_count(), 0);

        let err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        reporter.report("file:/var/log/sender.log", "write to", &err);

        assert_eq!(reporter.failure_count(), 1);
        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            text,
            "logfacade: failed to write to sink 'file:/var/log/sender.log': read-only\n"
        );
    }
}
