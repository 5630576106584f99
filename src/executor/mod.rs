//! Execution of compiled plans.
//!
//! Synthesized shell text is transport agnostic; this module provides the
//! transports that run it:
//! - [`LocalTarget`]: `sh -c` on the local machine
//! - [`SshTarget`]: the `ssh` client against a remote host
//! - [`Runner`]: sequential execution of a [`crate::package::Plan`]

mod runner;
mod target;

pub use runner::{CommandOutcome, RunReport, Runner};
pub use target::{CommandResult, LocalTarget, SshTarget, Target};
