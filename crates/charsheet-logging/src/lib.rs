//! Structured logging for the character sheet panel
//!
//! # Features
//!
//! - **JSONL Output**: Structured JSON lines on stderr by default
//! - **Pretty Output**: Human-readable console format for development
//! - **Viewer Context**: Spans carry the viewer role and panel instance
//! - **File Output**: JSONL files, daily/hourly rotated or truncated, via tracing-appender
//!
//! # Quick Start
//!
//! ```ignore
//! use charsheet_logging::{LogConfig, PanelSubscriberBuilder};
//!
//! // JSONL to console
//! PanelSubscriberBuilder::new().init();
//!
//! // Pretty output while developing
//! PanelSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init();
//! ```

pub mod config;
pub mod context;

pub use config::{ConsoleFormat, FileConfig, LogConfig, LogRotation};
pub use context::{ViewerContextData, ViewerContextGuard};

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to create rolling log file: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(String),
}

/// Builds and installs the panel's global tracing subscriber
pub struct PanelSubscriberBuilder {
    config: LogConfig,
}

impl PanelSubscriberBuilder {
    /// JSONL on stderr at `info`
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Filter directive used when `RUST_LOG` is unset
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    pub fn with_console(mut self, format: ConsoleFormat) -> Self {
        self.config.console = format;
        self
    }

    pub fn with_file_output(mut self, file: FileConfig) -> Self {
        self.config.file = Some(file);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber, reporting failures on stderr.
    ///
    /// Keep the returned guard alive for file output to be flushed.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: logging not initialized: {}", e);
                None
            }
        }
    }

    /// Install the subscriber.
    ///
    /// Fails when the log file cannot be opened or a global subscriber is
    /// already set.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let config = self.config;
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

        let (file_writer, guard) = match &config.file {
            Some(file) => {
                let (writer, guard) = open_file_writer(file)?;
                (Some(writer), Some(guard))
            }
            None => (None, None),
        };

        // Each output is an optional layer; absent ones are no-ops
        let pretty_console = (config.console == ConsoleFormat::Pretty).then(|| {
            tracing_subscriber::fmt::layer()
                .with_ansi(config.ansi)
                .with_target(true)
                .with_writer(std::io::stderr)
        });

        let json_console = (config.console == ConsoleFormat::Json).then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(config.span_list)
                .with_file(config.location)
                .with_line_number(config.location)
                .with_writer(std::io::stderr)
        });

        let file_layer = file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(config.span_list)
                .with_file(config.location)
                .with_line_number(config.location)
                .with_writer(writer)
        });

        Registry::default()
            .with(env_filter)
            .with(pretty_console)
            .with(json_console)
            .with(file_layer)
            .try_init()
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

        Ok(guard)
    }
}

impl Default for PanelSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn open_file_writer(file: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let rotation = match file.rotation {
        LogRotation::Truncate => {
            fs::create_dir_all(&file.directory)?;
            let handle = File::create(file.directory.join(format!("{}.log", file.prefix)))?;
            return Ok(tracing_appender::non_blocking(handle));
        }
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Hourly => Rotation::HOURLY,
    };

    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&file.prefix)
        .build(&file.directory)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// JSONL on stderr
pub fn init_default() -> Option<WorkerGuard> {
    PanelSubscriberBuilder::new().init()
}

/// Pretty debug output on stderr
pub fn init_development() -> Option<WorkerGuard> {
    PanelSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init()
}

/// Quiet output for tests; repeat calls are ignored
pub fn init_testing() {
    let _ = PanelSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_to_json() {
        let builder = PanelSubscriberBuilder::new();
        assert_eq!(builder.config().level, "info");
        assert_eq!(builder.config().console, ConsoleFormat::Json);
    }

    #[test]
    fn test_builder_overrides() {
        let builder = PanelSubscriberBuilder::new()
            .with_config(LogConfig::development())
            .with_level("trace")
            .with_console(ConsoleFormat::Off)
            .with_file_output(FileConfig::new("logs").with_rotation(LogRotation::Hourly));

        let config = builder.config();
        assert_eq!(config.level, "trace");
        assert_eq!(config.console, ConsoleFormat::Off);
        assert!(config.ansi);
        assert_eq!(config.file.as_ref().map(|f| f.rotation), Some(LogRotation::Hourly));
    }

    #[test]
    fn test_logging_error_display() {
        let err = LoggingError::AlreadyInitialized("set".to_string());
        assert_eq!(err.to_string(), "Global subscriber already set: set");
    }
}
