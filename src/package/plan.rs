//! Compiled plans of shell commands.
//!
//! A plan is the output of [`super::Package::compile`]: every command has
//! been rendered and validated, and its shell text and log line are fixed.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs::File;

use crate::command::Command;
use crate::error::CommandError;

/// A compiled deployment plan.
#[derive(Debug)]
pub struct Plan {
    /// When the plan was compiled.
    pub created_at: DateTime<Utc>,
    /// Hash over every shell line, in order.
    pub fingerprint: String,
    commands: Vec<PlannedCommand>,
}

/// A single command ready to be executed.
#[derive(Debug)]
pub struct PlannedCommand {
    /// Task the command belongs to.
    pub task: String,
    /// Human readable description.
    pub logging: String,
    /// Shell text to execute on the target.
    pub shell: String,
    /// The command the shell text was synthesized from.
    pub command: Box<dyn Command>,
}

impl PlannedCommand {
    /// Opens the stream to pipe into the shell text, if the command has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be opened.
    pub fn input(&self) -> Result<Option<File>, CommandError> {
        self.command.input()
    }
}

impl Plan {
    /// Creates a plan from already compiled commands.
    #[must_use]
    pub fn new(commands: Vec<PlannedCommand>) -> Self {
        let mut hasher = Sha256::new();
        for command in &commands {
            hasher.update(command.task.as_bytes());
            hasher.update([0u8]);
            hasher.update(command.shell.as_bytes());
            hasher.update([0u8]);
        }

        Self {
            created_at: Utc::now(),
            fingerprint: hex::encode(hasher.finalize()),
            commands,
        }
    }

    /// Returns the commands in execution order.
    #[must_use]
    pub fn commands(&self) -> &[PlannedCommand] {
        &self.commands
    }

    /// Returns the commands of one task.
    #[must_use]
    pub fn commands_for(&self, task: &str) -> Vec<&PlannedCommand> {
        self.commands.iter().filter(|c| c.task == task).collect()
    }

    /// Returns the distinct task names in execution order.
    #[must_use]
    pub fn task_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for command in &self.commands {
            if !names.contains(&command.task.as_str()) {
                names.push(&command.task);
            }
        }
        names
    }

    /// Returns true if the plan has no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns the number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns the first eight characters of the fingerprint.
    #[must_use]
    pub fn short_fingerprint(&self) -> &str {
        self.fingerprint.get(..8).unwrap_or(&self.fingerprint)
    }
}

impl std::fmt::Display for PlannedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.task, self.logging)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.commands.is_empty() {
            return write!(f, "No commands planned");
        }

        writeln!(f, "Plan {} ({} commands):", self.short_fingerprint(), self.commands.len())?;
        for (i, command) in self.commands.iter().enumerate() {
            writeln!(f, "  {i}. {command}")?;
        }
        Ok(())
    }
}
