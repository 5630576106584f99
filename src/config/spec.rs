//! Manifest types for the deployment system.
//!
//! This module defines the structs that map to `filecast.yaml`. A manifest
//! declares the template context, the tasks with their commands, and the
//! registry templates to expand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::command::{
    install_packages, run_shell, send_file, write_file, Command, FileMode, DEFAULT_SEND_OWNER,
};
use crate::error::Result;
use crate::package::{Package, TemplateRegistry};

/// The root manifest structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Variables available to templates in every command field.
    #[serde(default)]
    pub context: Map<String, Value>,
    /// Tasks with their commands, in execution order.
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
    /// Registry templates to expand after the tasks.
    #[serde(default)]
    pub templates: Vec<TemplateConfig>,
}

/// A named list of commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskConfig {
    /// Name of the task.
    pub name: String,
    /// Commands of the task.
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub commands: Vec<CommandConfig>,
}

/// A single command, written as a one-key map (`write_file: {...}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandConfig {
    /// Write inline content to a file.
    WriteFile(WriteFileConfig),
    /// Send a local file.
    SendFile(SendFileConfig),
    /// Run a shell line.
    Shell(String),
    /// Install packages.
    InstallPackages(Vec<String>),
}

/// Inline file write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteFileConfig {
    /// Path of the file on the target.
    pub path: String,
    /// Content of the file.
    pub content: String,
    /// Owner of the file (unchanged if empty).
    #[serde(default)]
    pub owner: String,
    /// Mode of the file (unchanged if absent).
    #[serde(default)]
    pub permissions: FileMode,
}

/// Local file transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendFileConfig {
    /// Local path, relative to the manifest directory unless absolute.
    pub source: String,
    /// Path of the file on the target.
    pub target: String,
    /// Owner of the file.
    #[serde(default = "default_send_owner")]
    pub owner: String,
    /// Mode of the file.
    pub permissions: FileMode,
}

/// A registry template to expand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateConfig {
    /// Registry name of the template.
    pub template: String,
    /// Template options.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

fn default_send_owner() -> String {
    String::from(DEFAULT_SEND_OWNER)
}

impl Manifest {
    /// Returns the template context as a JSON value.
    #[must_use]
    pub fn context_value(&self) -> Value {
        Value::Object(self.context.clone())
    }

    /// Returns the total number of inline commands across all tasks.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.tasks.iter().map(|t| t.commands.len()).sum()
    }

    /// Returns the task names.
    #[must_use]
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }

    /// Builds the package described by this manifest.
    ///
    /// Relative `send_file` sources are resolved against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a template is unknown or rejects its options.
    pub fn to_package(&self, registry: &TemplateRegistry, base_dir: &Path) -> Result<Package> {
        let mut package = Package::new();

        for task in &self.tasks {
            let commands = task
                .commands
                .iter()
                .map(|c| c.to_command(base_dir))
                .collect::<Vec<_>>();
            package.add_commands(&task.name, commands);
        }

        for template in &self.templates {
            let built = registry.build(&template.template, &template.options)?;
            package.add_template(built.as_ref());
        }

        Ok(package)
    }
}

impl CommandConfig {
    /// Converts the configuration into an executable command.
    #[must_use]
    pub fn to_command(&self, base_dir: &Path) -> Box<dyn Command> {
        match self {
            Self::WriteFile(c) => Box::new(write_file(
                c.path.clone(),
                c.content.clone(),
                c.owner.clone(),
                c.permissions,
            )),
            Self::SendFile(c) => Box::new(send_file(
                resolve_source(&c.source, base_dir),
                c.target.clone(),
                c.owner.clone(),
                c.permissions,
            )),
            Self::Shell(line) => Box::new(run_shell(line.clone())),
            Self::InstallPackages(packages) => Box::new(install_packages(packages.clone())),
        }
    }

    /// Short name of the command kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::WriteFile(_) => "write_file",
            Self::SendFile(_) => "send_file",
            Self::Shell(_) => "shell",
            Self::InstallPackages(_) => "install_packages",
        }
    }
}

/// Resolves a source path against the manifest directory.
///
/// Sources containing template syntax are resolved too; rendering happens
/// later and only affects the templated part.
fn resolve_source(source: &str, base_dir: &Path) -> String {
    if source.is_empty() || Path::new(source).is_absolute() {
        return source.to_string();
    }
    base_dir.join(source).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_source() {
        let base = Path::new("/srv/deploy");
        assert_eq!(resolve_source("files/a.conf", base), "/srv/deploy/files/a.conf");
        assert_eq!(resolve_source("/etc/a.conf", base), "/etc/a.conf");
        assert_eq!(resolve_source("", base), "");
    }

    #[test]
    fn test_command_kind() {
        assert_eq!(CommandConfig::Shell(String::from("true")).kind(), "shell");
        assert_eq!(
            CommandConfig::InstallPackages(vec![String::from("git")]).kind(),
            "install_packages"
        );
    }

    #[test]
    fn test_to_package() {
        let manifest = Manifest {
            context: Map::new(),
            tasks: vec![TaskConfig {
                name: String::from("motd"),
                commands: vec![
                    CommandConfig::WriteFile(WriteFileConfig {
                        path: String::from("/etc/motd"),
                        content: String::from("hi\n"),
                        owner: String::new(),
                        permissions: FileMode::UNSET,
                    }),
                    CommandConfig::Shell(String::from("true")),
                ],
            }],
            templates: vec![TemplateConfig {
                template: String::from("install_packages"),
                options: BTreeMap::from([(String::from("packages"), String::from("git"))]),
            }],
        };

        let package = manifest
            .to_package(&TemplateRegistry::with_builtins(), Path::new("."))
            .unwrap();
        assert_eq!(package.tasks().len(), 2);
        assert_eq!(package.command_count(), 3);
        assert_eq!(package.tasks()[1].name, "install");
    }

    #[test]
    fn test_to_package_unknown_template() {
        let manifest = Manifest {
            templates: vec![TemplateConfig {
                template: String::from("missing"),
                options: BTreeMap::new(),
            }],
            ..Manifest::default()
        };

        assert!(manifest
            .to_package(&TemplateRegistry::new(), Path::new("."))
            .is_err());
    }
}
