//! tracing integration
//!
//! Forwards `tracing` events into a [`LoggerRepository`] so code that logs
//! through `tracing` ends up in the same sinks. The event target is used as
//! the logger name.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::Layer;

use super::level::Level;
use super::repository::LoggerRepository;

/// A tracing layer that writes events through the repository
#[derive(Debug, Clone)]
pub struct FacadeLayer {
    repository: LoggerRepository,
}

impl FacadeLayer {
    pub fn new(repository: LoggerRepository) -> Self {
        Self { repository }
    }
}

impl<S: Subscriber> Layer<S> for FacadeLayer {
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        Level::from(*metadata.level()).passes(self.repository.threshold())
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let logger = self.repository.get_logger(metadata.target());

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        logger.log(Level::from(*metadata.level()), visitor.finish());
    }
}

/// Collects the `message` field, followed by any other fields as `key=value`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }
}

/// Install a global tracing subscriber that forwards into `repository`
pub fn install(repository: &LoggerRepository) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(FacadeLayer::new(repository.clone()))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::memory::MemorySink;
    use std::sync::Arc;

    fn repository(threshold: Level) -> (LoggerRepository, Arc<MemorySink>) {
        let memory = Arc::new(MemorySink::new("memory", Level::Trace));
        let repo = LoggerRepository::builder()
            .threshold(threshold)
            .sink(memory.clone())
            .build();
        (repo, memory)
    }

    #[test]
    fn test_bridge_uses_target_as_logger_name() {
        let (repo, memory) = repository(Level::Debug);
        let subscriber = tracing_subscriber::registry().with(FacadeLayer::new(repo.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "sender", "Hello {}", 0);
            tracing::debug!(target: "sender", "Bye");
        });

        assert_eq!(
            memory.lines(),
            vec!["INFO sender - Hello 0", "DEBUG sender - Bye"]
        );
        assert_eq!(repo.logger_names(), vec!["sender"]);
    }

    #[test]
    fn test_bridge_respects_threshold() {
        let (repo, memory) = repository(Level::Warn);
        let subscriber = tracing_subscriber::registry().with(FacadeLayer::new(repo));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "sender", "quiet");
            tracing::warn!(target: "sender", "loud");
        });

        assert_eq!(memory.lines(), vec!["WARN sender - loud"]);
    }

    #[test]
    fn test_bridge_appends_fields() {
        let (repo, memory) = repository(Level::Trace);
        let subscriber = tracing_subscriber::registry().with(FacadeLayer::new(repo));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "sender", attempt = 3, host = "db", "connect failed");
            tracing::warn!(target: "sender", code = 7);
        });

        assert_eq!(
            memory.lines(),
            vec![
                "ERROR sender - connect failed attempt=3 host=db",
                "WARN sender - code=7",
            ]
        );
    }
}
