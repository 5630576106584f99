//! Packages of provisioning tasks.
//!
//! This module assembles commands into named tasks, lets named templates
//! contribute tasks, and compiles everything into an executable plan:
//! - [`Package`]: ordered tasks of commands
//! - [`TemplateRegistry`]: explicit map of template factories
//! - [`Plan`]: rendered, validated and synthesized commands

mod plan;
mod registry;
mod tasks;

pub use plan::{Plan, PlannedCommand};
pub use registry::{
    InstallPackagesTemplate, Template, TemplateFactory, TemplateOptions, TemplateRegistry,
};
pub use tasks::{Package, Task};
