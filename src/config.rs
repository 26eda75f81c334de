//! Logging configuration
//!
//! Read once at startup from `logging.toml` in the working directory. A
//! missing file means built-in defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::{
    ConsoleSink, ConsoleStream, FileSink, Level, LoggerRepository, PatternLayout, Sink,
    DEFAULT_PATTERN, DEFAULT_THRESHOLD,
};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "logging.toml";

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file
    File(PathBuf),
    /// This file did not exist, so built-in defaults apply
    Defaults(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults(path) => write!(f, "defaults ({} not found)", path.display()),
        }
    }
}

/// One configured output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Standard output or standard error
    Console {
        #[serde(default)]
        stream: ConsoleStream,
        #[serde(default = "default_sink_threshold")]
        threshold: Level,
    },
    /// A log file, created along with its parent directories
    File {
        path: PathBuf,
        #[serde(default = "default_sink_threshold")]
        threshold: Level,
        /// Append to an existing file instead of truncating it (default: true)
        #[serde(default = "default_append")]
        append: bool,
    },
}

impl SinkConfig {
    /// Open the sink this entry describes
    pub fn open(&self) -> Result<Arc<dyn Sink>> {
        match self {
            SinkConfig::Console { stream, threshold } => {
                Ok(Arc::new(ConsoleSink::new(*stream, *threshold)))
            }
            SinkConfig::File {
                path,
                threshold,
                append,
            } => {
                let sink = FileSink::open(path, *threshold, *append)
                    .with_context(|| format!("Failed to open file sink {}", path.display()))?;
                Ok(Arc::new(sink))
            }
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Threshold shared by every logger (default: debug)
    #[serde(default = "default_threshold")]
    pub threshold: Level,

    /// Conversion pattern, see [`PatternLayout`] (default: "%p %c - %m")
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Outputs, in delivery order (default: one stdout console sink)
    #[serde(default = "default_sinks")]
    pub sinks: Vec<SinkConfig>,
}

fn default_threshold() -> Level {
    DEFAULT_THRESHOLD
}

fn default_sink_threshold() -> Level {
    Level::Trace
}

fn default_append() -> bool {
    true
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![SinkConfig::Console {
        stream: ConsoleStream::Stdout,
        threshold: default_sink_threshold(),
    }]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            pattern: default_pattern(),
            sinks: default_sinks(),
        }
    }
}

impl Config {
    /// Load configuration from `logging.toml`, or return default if not found
    pub fn load() -> Result<(Self, ConfigSource)> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`, or return default if it does not exist
    ///
    /// The pattern and sinks are checked by [`Config::build_repository`].
    pub fn load_from(path: &Path) -> Result<(Self, ConfigSource)> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config = Self::parse(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            Ok((config, ConfigSource::File(path.to_path_buf())))
        } else {
            Ok((Self::default(), ConfigSource::Defaults(path.to_path_buf())))
        }
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse the pattern, open every sink and build the repository
    pub fn build_repository(&self) -> Result<LoggerRepository> {
        let layout = PatternLayout::new(&self.pattern)
            .with_context(|| format!("Invalid pattern '{}'", self.pattern))?;

        let mut builder = LoggerRepository::builder()
            .threshold(self.threshold)
            .layout(layout);
        for sink in &self.sinks {
            builder = builder.sink(sink.open()?);
        }
        Ok(builder.build())
    }
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}
