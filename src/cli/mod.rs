//! CLI module for the filecast deployment tool.
//!
//! This module provides the command-line interface for validating,
//! planning and applying file deployment manifests.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
