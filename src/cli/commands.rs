//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Filecast - deploy files and provisioning commands over a remote shell.
#[derive(Parser, Debug)]
#[command(name = "filecast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the manifest file.
    #[arg(short, long, global = true, env = "FILECAST_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the manifest.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Compile the manifest and display the plan.
    Plan {
        /// Show the synthesized shell text of every command.
        #[arg(short, long)]
        shell: bool,
    },

    /// Compile the manifest and execute it.
    Apply {
        /// Remote host to run on over ssh (runs locally when absent).
        #[arg(long, env = "FILECAST_HOST")]
        host: Option<String>,

        /// Remote login user.
        #[arg(short, long, requires = "host")]
        user: Option<String>,

        /// Remote ssh port.
        #[arg(short, long, requires = "host")]
        port: Option<u16>,

        /// Continue after failing commands.
        #[arg(long)]
        keep_going: bool,
    },

    /// Print the synthesized shell lines to stdout.
    Shell {
        /// Only print the commands of this task.
        #[arg(short, long)]
        task: Option<String>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
