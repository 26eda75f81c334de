//! Logging facade
//!
//! Named loggers handed out by a [`LoggerRepository`], leveled filtering,
//! conversion-pattern layouts and console/file/memory sinks.

mod bridge;
mod layout;
mod level;
mod memory;
pub mod mdc;
mod record;
mod repository;
mod reporter;
mod sink;

pub use bridge::{install, FacadeLayer};
pub use layout::{LayoutError, PatternLayout, DEFAULT_DATE_FORMAT, DEFAULT_PATTERN, MAX_WIDTH};
pub use level::{Level, ParseLevelError};
pub use memory::{MemoryEntry, MemorySink};
pub use record::Record;
pub use repository::{Logger, LoggerRepository, RepositoryBuilder, DEFAULT_THRESHOLD};
pub use reporter::FallbackReporter;
pub use sink::{ConsoleSink, ConsoleStream, FileSink, Sink, SinkError, WriterSink};
