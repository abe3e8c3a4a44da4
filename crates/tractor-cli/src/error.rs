//! Error types and handling for the CLI
//!
//! This module wraps engine failures together with the I/O and parsing
//! failures of the command line, and maps each to a process exit code.

use std::io;
use std::path::PathBuf;
use tractor_core::ErrorKind;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from tractor-core library
    #[error("{0}")]
    Core(#[from] tractor_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {}", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(e) => match stage_cause(e).kind() {
                ErrorKind::Extraction => 20,
                ErrorKind::Transformation => 21,
                ErrorKind::InvalidData | ErrorKind::InvalidType => 22,
                ErrorKind::Configuration => 23,
                ErrorKind::Stage => 24,
                ErrorKind::NotFound | ErrorKind::InvalidInstance => 25,
            },
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Toml(_) => 14,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// The failing stage's own error behind any stage wrappers
pub fn stage_cause(error: &tractor_core::Error) -> &tractor_core::Error {
    let mut error = error;
    while error.stage_index().is_some() {
        match error.cause() {
            Some(cause) => error = cause,
            None => break,
        }
    }
    error
}

/// Format an error for display to the user
///
/// Engine errors are rendered from their report: kind, origin and failing
/// stage on the first line, then every accumulated message oldest first.
pub fn format_error(error: &Error, use_color: bool) -> String {
    use colored::Colorize;

    let Error::Core(core_error) = error else {
        return if use_color {
            format!("{} {}", "Error:".red().bold(), error)
        } else {
            format!("Error: {}", error)
        };
    };

    let report = core_error.report();
    let mut heading = stage_cause(core_error).kind().to_string();
    if let Some(origin) = &report.origin {
        heading.push_str(&format!(" in '{}'", origin));
    }
    if let Some(index) = report.stage_index {
        heading.push_str(&format!(" at stage {}", index));
    }

    let mut lines = vec![if use_color {
        format!("{} {}", "Error:".red().bold(), heading.bold())
    } else {
        format!("Error: {}", heading)
    }];
    for message in &report.messages {
        lines.push(format!("  - {}", message));
    }
    if let Some(data) = &report.data {
        lines.push(format!("  data: {}", data));
    }

    lines.join("\n")
}
