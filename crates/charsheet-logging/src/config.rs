//! Logging configuration and presets

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How events are written to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable multi-field lines
    Pretty,
    Off,
}

/// How the log file is rolled over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Daily,
    Hourly,
    /// One `<prefix>.log` file, truncated at startup
    Truncate,
}

/// JSONL file output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub directory: PathBuf,
    pub prefix: String,
    pub rotation: LogRotation,
}

impl FileConfig {
    /// Daily-rotated `charsheet.*` files in `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            prefix: "charsheet".to_string(),
            rotation: LogRotation::Daily,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_rotation(mut self, rotation: LogRotation) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub console: ConsoleFormat,
    /// Colors on the pretty console
    pub ansi: bool,
    pub file: Option<FileConfig>,
    /// Attach the list of entered spans to JSON events
    pub span_list: bool,
    /// Attach source file and line to JSON events
    pub location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: ConsoleFormat::Json,
            ansi: false,
            file: None,
            span_list: true,
            location: true,
        }
    }
}

impl LogConfig {
    /// Debug level on a colored pretty console
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            console: ConsoleFormat::Pretty,
            ansi: true,
            ..Self::default()
        }
    }

    /// Warnings only, compact JSON
    pub fn testing() -> Self {
        Self {
            level: "warn".to_string(),
            span_list: false,
            location: false,
            ..Self::default()
        }
    }

    /// No console, JSONL files in `directory`
    pub fn file_only(directory: impl Into<PathBuf>) -> Self {
        Self {
            console: ConsoleFormat::Off,
            file: Some(FileConfig::new(directory)),
            ..Self::default()
        }
    }
}
