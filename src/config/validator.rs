//! Manifest validation.
//!
//! This module checks a manifest as a whole before any command is built,
//! collecting every problem instead of stopping at the first one. Per-command
//! validation (empty paths, missing sources) happens later, after rendering,
//! because templated fields are only known then.

use crate::error::{ConfigError, FilecastError, Result};
use crate::template::PLACEHOLDER_START;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use super::spec::{CommandConfig, Manifest, TaskConfig};

/// Validator for manifests.
#[derive(Debug, Default)]
pub struct ManifestValidator {
    /// Template names that may be referenced.
    known_templates: HashSet<String>,
}

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ManifestValidator {
    /// Creates a validator accepting the given template names.
    #[must_use]
    pub fn new<I, S>(known_templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_templates: known_templates.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds a template name to the known list.
    pub fn add_template(&mut self, name: impl Into<String>) {
        self.known_templates.insert(name.into());
    }

    /// Checks a manifest and returns every error and warning found.
    #[must_use]
    pub fn check(&self, manifest: &Manifest) -> ValidationResult {
        let mut result = ValidationResult::default();

        if manifest.tasks.is_empty() && manifest.templates.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("tasks"),
                message: String::from("At least one task or template is required"),
            });
        }

        Self::validate_tasks(&manifest.tasks, &mut result);
        self.validate_templates(manifest, &mut result);

        for error in &result.errors {
            debug!("Validation error: {}", error);
        }
        result
    }

    /// Validates a manifest.
    ///
    /// # Errors
    ///
    /// Returns the first error found if validation fails. Use [`Self::check`]
    /// to get the full list.
    pub fn validate(&self, manifest: &Manifest) -> Result<ValidationResult> {
        let result = self.check(manifest);

        match result.errors.first() {
            None => {
                debug!("Manifest validation passed");
                Ok(result)
            }
            Some(first_error) => Err(FilecastError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            })),
        }
    }

    /// Validates all tasks.
    fn validate_tasks(tasks: &[TaskConfig], result: &mut ValidationResult) {
        let mut seen_names = HashSet::new();

        for (i, task) in tasks.iter().enumerate() {
            let prefix = format!("tasks[{i}]");

            if task.name.trim().is_empty() {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: String::from("Task name cannot be empty"),
                });
            } else if !seen_names.insert(task.name.as_str()) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: format!("Duplicate task name: {}", task.name),
                });
            }

            if task.commands.is_empty() {
                result.warnings.push(format!("{prefix}: Task '{}' has no commands", task.name));
            }

            for (j, command) in task.commands.iter().enumerate() {
                Self::validate_command(command, &format!("{prefix}.commands[{j}]"), result);
            }
        }
    }

    /// Validates a single command's static fields.
    fn validate_command(command: &CommandConfig, prefix: &str, result: &mut ValidationResult) {
        match command {
            CommandConfig::WriteFile(c) => {
                if c.path.is_empty() {
                    result.errors.push(ValidationError {
                        field: format!("{prefix}.write_file.path"),
                        message: String::from("File path cannot be empty"),
                    });
                } else if !is_absolute_or_templated(&c.path) {
                    result.warnings.push(format!(
                        "{prefix}.write_file.path: '{}' is relative to the remote working directory",
                        c.path
                    ));
                }
                if c.content.is_empty() {
                    result.errors.push(ValidationError {
                        field: format!("{prefix}.write_file.content"),
                        message: format!("No content given for file '{}'", c.path),
                    });
                }
            }
            CommandConfig::SendFile(c) => {
                if c.source.is_empty() {
                    result.errors.push(ValidationError {
                        field: format!("{prefix}.send_file.source"),
                        message: String::from("Source path cannot be empty"),
                    });
                }
                if c.target.is_empty() {
                    result.errors.push(ValidationError {
                        field: format!("{prefix}.send_file.target"),
                        message: format!("No target path given for file '{}'", c.source),
                    });
                }
                if c.permissions.is_unset() {
                    result.warnings.push(format!(
                        "{prefix}.send_file.permissions: mode 0000 leaves '{}' unreadable",
                        c.target
                    ));
                }
            }
            CommandConfig::Shell(line) => {
                if line.trim().is_empty() {
                    result.errors.push(ValidationError {
                        field: format!("{prefix}.shell"),
                        message: String::from("Shell command cannot be empty"),
                    });
                }
            }
            CommandConfig::InstallPackages(packages) => {
                if packages.is_empty() || packages.iter().any(|p| p.trim().is_empty()) {
                    result.errors.push(ValidationError {
                        field: format!("{prefix}.install_packages"),
                        message: String::from("Package list cannot be empty or contain empty names"),
                    });
                }
            }
        }
    }

    /// Validates template references.
    fn validate_templates(&self, manifest: &Manifest, result: &mut ValidationResult) {
        for (i, template) in manifest.templates.iter().enumerate() {
            if !self.known_templates.contains(&template.template) {
                result.errors.push(ValidationError {
                    field: format!("templates[{i}].template"),
                    message: format!("Unknown template '{}'", template.template),
                });
            }
        }
    }
}

/// Returns true if a remote path is absolute or starts with a placeholder.
fn is_absolute_or_templated(path: &str) -> bool {
    Path::new(path).is_absolute() || path.starts_with(PLACEHOLDER_START)
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
