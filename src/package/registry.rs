//! Named templates and the registry that builds them.
//!
//! A template is a reusable recipe that adds tasks to a [`Package`]. The
//! registry maps template names to factories and is handed explicitly to
//! whoever assembles packages; there is no process-wide registration.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

use crate::command::install_packages;
use crate::error::{ConfigError, Result};

use super::tasks::Package;

/// Options passed to a template factory.
pub type TemplateOptions = BTreeMap<String, String>;

/// Builds a template from its options.
pub type TemplateFactory =
    Box<dyn Fn(&TemplateOptions) -> Result<Box<dyn Template>> + Send + Sync>;

/// A reusable recipe of tasks.
pub trait Template: fmt::Debug + Send + Sync {
    /// Name of the template, used in logs.
    fn name(&self) -> &str;

    /// Adds the template's tasks to the package.
    fn render(&self, package: &mut Package);
}

/// Registry of template factories.
#[derive(Default)]
pub struct TemplateRegistry {
    factories: HashMap<String, TemplateFactory>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in templates.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(InstallPackagesTemplate::NAME, |options| {
            Ok(Box::new(InstallPackagesTemplate::from_options(options)?) as Box<dyn Template>)
        });
        registry
    }

    /// Registers a factory under a name, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&TemplateOptions) -> Result<Box<dyn Template>> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!("Registering template '{}'", name);
        self.factories.insert(name, Box::new(factory));
    }

    /// Returns true if a template with the given name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the registered template names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds the named template.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is unknown or rejects its options.
    pub fn build(&self, name: &str, options: &TemplateOptions) -> Result<Box<dyn Template>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ConfigError::UnknownTemplate {
                name: name.to_string(),
            })?;
        factory(options)
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("templates", &self.names())
            .finish()
    }
}

/// Built-in template installing a list of packages.
///
/// Options: `packages` (comma separated, required) and `task`
/// (default `install`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPackagesTemplate {
    /// Task the install command is added to.
    pub task: String,
    /// Packages to install.
    pub packages: Vec<String>,
}

impl InstallPackagesTemplate {
    /// Registry name of the template.
    pub const NAME: &'static str = "install_packages";

    /// Default task name.
    pub const DEFAULT_TASK: &'static str = "install";

    /// Builds the template from registry options.
    ///
    /// # Errors
    ///
    /// Returns an error if no packages are given.
    pub fn from_options(options: &TemplateOptions) -> Result<Self> {
        let packages: Vec<String> = options
            .get("packages")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        if packages.is_empty() {
            return Err(ConfigError::validation(
                "install_packages template requires at least one package",
                "options.packages",
            )
            .into());
        }

        let task = options
            .get("task")
            .cloned()
            .unwrap_or_else(|| Self::DEFAULT_TASK.to_string());

        Ok(Self { task, packages })
    }
}

impl Template for InstallPackagesTemplate {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn render(&self, package: &mut Package) {
        package.add_command(&self.task, install_packages(self.packages.clone()));
    }
}
