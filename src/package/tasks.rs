//! Packages: ordered, named tasks of commands.

use serde_json::Value;
use tracing::{debug, error, info};

use crate::command::Command;
use crate::error::Result;
use crate::template::TemplateRenderer;

use super::plan::{Plan, PlannedCommand};
use super::registry::Template;

/// A named group of commands executed in order.
#[derive(Debug)]
pub struct Task {
    /// Name of the task.
    pub name: String,
    /// Commands of the task, in execution order.
    pub commands: Vec<Box<dyn Command>>,
}

/// Everything to provision on a host, grouped into tasks.
#[derive(Debug, Default)]
pub struct Package {
    tasks: Vec<Task>,
}

impl Package {
    /// Creates an empty package.
    #[must_use]
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Appends commands to a task, creating the task on first use.
    ///
    /// Tasks keep the order in which they were first added.
    pub fn add_commands<I>(&mut self, task: &str, commands: I)
    where
        I: IntoIterator<Item = Box<dyn Command>>,
    {
        let index = match self.tasks.iter().position(|t| t.name == task) {
            Some(index) => index,
            None => {
                self.tasks.push(Task {
                    name: task.to_string(),
                    commands: Vec::new(),
                });
                self.tasks.len() - 1
            }
        };
        self.tasks[index].commands.extend(commands);
    }

    /// Appends a single command to a task.
    pub fn add_command(&mut self, task: &str, command: impl Command + 'static) {
        self.add_commands(task, [Box::new(command) as Box<dyn Command>]);
    }

    /// Lets a template add its tasks to this package.
    pub fn add_template(&mut self, template: &dyn Template) {
        debug!("Adding template '{}'", template.name());
        template.render(self);
    }

    /// Returns the tasks in order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Returns true if the package contains no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.command_count() == 0
    }

    /// Returns the total number of commands across all tasks.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.tasks.iter().map(|t| t.commands.len()).sum()
    }

    /// Renders, validates and synthesizes every command into a [`Plan`].
    ///
    /// The first failing command aborts compilation; nothing is partially
    /// planned.
    ///
    /// # Errors
    ///
    /// Returns an error if any command fails to render, validate or
    /// synthesize.
    pub fn compile(self, renderer: &dyn TemplateRenderer, context: &Value) -> Result<Plan> {
        let mut planned = Vec::with_capacity(self.command_count());

        for task in self.tasks {
            for (index, mut command) in task.commands.into_iter().enumerate() {
                let result = Self::compile_command(command.as_mut(), renderer, context);
                match result {
                    Ok((shell, logging)) => planned.push(PlannedCommand {
                        task: task.name.clone(),
                        logging,
                        shell,
                        command,
                    }),
                    Err(e) => {
                        error!("Command {} of task '{}' failed: {}", index, task.name, e);
                        return Err(e);
                    }
                }
            }
        }

        info!("Compiled {} command(s)", planned.len());
        Ok(Plan::new(planned))
    }

    /// Runs one command through render, validate, shell and logging.
    fn compile_command(
        command: &mut dyn Command,
        renderer: &dyn TemplateRenderer,
        context: &Value,
    ) -> Result<(String, String)> {
        command.render(renderer, context)?;
        command.validate()?;
        let shell = command.shell()?;
        Ok((shell, command.logging()))
    }
}
