//! Error types for the filecast deployment system.
//!
//! This module provides the error hierarchy for every stage of a file
//! deployment: template rendering, command validation and synthesis,
//! manifest configuration, and execution on a target.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for filecast.
#[derive(Debug, Error)]
pub enum FilecastError {
    /// Command validation or synthesis errors.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Template rendering errors.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Manifest configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Execution errors reported by a target.
    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while validating a command or synthesizing its shell text.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A structural field is missing or empty.
    #[error("{message}")]
    Validation {
        /// Description of the problem.
        message: String,
    },

    /// The local source file could not be accessed.
    #[error("Cannot access source file {path}: {source}")]
    Source {
        /// Local path of the source file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Compressing or encoding the content failed.
    #[error("Failed to encode content for {path}: {message}")]
    Encoding {
        /// Target path of the file being encoded.
        path: String,
        /// Description of the failure.
        message: String,
    },
}

/// Template rendering errors.
#[derive(Debug, Error)]
#[error("Failed to render template {template:?}: {message}")]
pub struct TemplateError {
    /// The template text that failed to render.
    pub template: String,
    /// Description of the failure.
    pub message: String,
}

/// Manifest configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest file was not found.
    #[error("Manifest file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The manifest could not be parsed.
    #[error("Failed to parse manifest: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Manifest validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// The manifest references a template nobody registered.
    #[error("Unknown template: {name}")]
    UnknownTemplate {
        /// Name of the template.
        name: String,
    },

    /// An invalid permission specification.
    #[error("Invalid file mode: {spec}")]
    InvalidMode {
        /// The invalid mode string.
        spec: String,
    },
}

/// Errors raised while executing synthesized commands on a target.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The shell process could not be spawned.
    #[error("Failed to spawn {program} on {target}: {source}")]
    SpawnFailed {
        /// Program that failed to start.
        program: String,
        /// Target description.
        target: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Piping the input stream into the command failed.
    #[error("Failed to pipe input to {target}: {source}")]
    InputFailed {
        /// Target description.
        target: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A command exited unsuccessfully.
    #[error("Command {index} in task '{task}' failed on {target} (exit code {exit_code:?}): {stderr}")]
    CommandFailed {
        /// Position of the command within the plan.
        index: usize,
        /// Task the command belongs to.
        task: String,
        /// Target description.
        target: String,
        /// Exit code if the process exited normally.
        exit_code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
}

/// Result type alias for filecast operations.
pub type Result<T> = std::result::Result<T, FilecastError>;

impl FilecastError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if the error was detected before anything ran on a target.
    #[must_use]
    pub const fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::Command(_) | Self::Template(_) | Self::Config(_)
        )
    }
}

impl CommandError {
    /// Creates a validation error with the given message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a source access error for the given path.
    #[must_use]
    pub fn source_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Source {
            path: path.into(),
            source,
        }
    }
}

impl TemplateError {
    /// Creates a template error for the given template text.
    #[must_use]
    pub fn new(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            message: message.into(),
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}
