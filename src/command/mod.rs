//! Commands that can be synthesized into shell text for a target host.
//!
//! Every command goes through the same lifecycle:
//! 1. **Render**: template placeholders in its fields are expanded
//! 2. **Validate**: structurally invalid commands are rejected
//! 3. **Shell**: the command line to execute is synthesized
//! 4. **Logging**: a one-line human readable summary is produced
//!
//! Commands never execute anything themselves. Those that need data piped
//! to the remote shell expose it through [`Command::input`].

mod digest;
mod file;
mod mode;
mod quote;
mod send;
mod shell;

use serde_json::Value;
use std::fmt;
use std::fs::File;

use crate::error::{CommandError, TemplateError};
use crate::template::TemplateRenderer;

pub use digest::{file_sha1_hex, sha256_hex};
pub use file::{write_file, FileCommand, TMP_DIR, TMP_PREFIX};
pub use mode::FileMode;
pub use quote::{and_then, quote};
pub use send::{send_file, FileSendCommand, DEFAULT_SEND_OWNER};
pub use shell::{install_packages, run_shell, InstallPackages, ShellCommand};

/// A unit of work on a target host.
pub trait Command: fmt::Debug + Send + Sync {
    /// Expands template placeholders in the command's fields.
    ///
    /// On error the command is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if any field fails to render.
    fn render(&mut self, renderer: &dyn TemplateRenderer, context: &Value)
        -> Result<(), TemplateError>;

    /// Checks that the command can be synthesized.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first structural problem found.
    fn validate(&self) -> Result<(), CommandError>;

    /// Synthesizes the shell text to run on the target.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is invalid or its payload cannot be
    /// prepared.
    fn shell(&self) -> Result<String, CommandError>;

    /// Returns a one-line description of the command for logs.
    fn logging(&self) -> String;

    /// Opens the stream that must be piped into the command's stdin, if any.
    ///
    /// Each call opens a fresh handle that the caller owns.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be opened.
    fn input(&self) -> Result<Option<File>, CommandError> {
        Ok(None)
    }
}
