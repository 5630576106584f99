//! Plain shell commands and package installation.

use serde_json::Value;

use crate::error::{CommandError, TemplateError};
use crate::template::TemplateRenderer;

use super::quote::quote;
use super::Command;

/// Runs a shell line verbatim on the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    /// The shell line.
    pub command: String,
}

/// Creates a command running `command` verbatim.
#[must_use]
pub fn run_shell(command: impl Into<String>) -> ShellCommand {
    ShellCommand {
        command: command.into(),
    }
}

impl Command for ShellCommand {
    fn render(
        &mut self,
        renderer: &dyn TemplateRenderer,
        context: &Value,
    ) -> Result<(), TemplateError> {
        self.command = renderer.render(&self.command, context)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.command.trim().is_empty() {
            return Err(CommandError::validation("no shell command given"));
        }
        Ok(())
    }

    fn shell(&self) -> Result<String, CommandError> {
        self.validate()?;
        Ok(self.command.clone())
    }

    fn logging(&self) -> String {
        format!("[COMMAND] {}", self.command)
    }
}

/// Installs distribution packages with `apt-get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPackages {
    /// Names of the packages to install.
    pub packages: Vec<String>,
}

/// Creates a command installing the given packages.
#[must_use]
pub fn install_packages<I, S>(packages: I) -> InstallPackages
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    InstallPackages {
        packages: packages.into_iter().map(Into::into).collect(),
    }
}

impl Command for InstallPackages {
    fn render(
        &mut self,
        renderer: &dyn TemplateRenderer,
        context: &Value,
    ) -> Result<(), TemplateError> {
        let rendered = self
            .packages
            .iter()
            .map(|p| renderer.render(p, context))
            .collect::<Result<Vec<_>, _>>()?;
        self.packages = rendered;
        Ok(())
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.packages.is_empty() {
            return Err(CommandError::validation("no packages given"));
        }
        if self.packages.iter().any(|p| p.trim().is_empty()) {
            return Err(CommandError::validation("empty package name given"));
        }
        Ok(())
    }

    fn shell(&self) -> Result<String, CommandError> {
        self.validate()?;
        let names: Vec<String> = self.packages.iter().map(|p| quote(p)).collect();
        Ok(format!(
            "DEBIAN_FRONTEND=noninteractive apt-get install -y {}",
            names.join(" ")
        ))
    }

    fn logging(&self) -> String {
        format!("[PACKAGE] {}", self.packages.join(" "))
    }
}
