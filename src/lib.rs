// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Filecast
//!
//! Synthesizes shell command lines that deploy files and run provisioning
//! steps on a remote host.
//!
//! ## Overview
//!
//! Filecast never copies files over a dedicated protocol. Every operation is
//! turned into plain shell text, so anything that can run `sh -c` on a host
//! can apply it:
//!
//! - Inline content is gzip-compressed, base64-encoded and written through a
//!   temporary file, then moved into place atomically
//! - Local files are streamed over the command's stdin
//! - Owners and modes are applied in the same command line
//!
//! ## Architecture
//!
//! 1. **Manifest**: tasks, commands and templates defined in `filecast.yaml`
//! 2. **Package**: commands grouped into ordered tasks
//! 3. **Plan**: every command rendered, validated and synthesized
//! 4. **Runner**: the plan executed on a local or ssh target
//!
//! ## Modules
//!
//! - [`command`]: shell synthesis for file writes, transfers and shell lines
//! - [`template`]: placeholder rendering in command fields
//! - [`package`]: tasks, the template registry and compiled plans
//! - [`config`]: manifest parsing and validation
//! - [`executor`]: targets and plan execution
//! - [`cli`]: command-line interface
//!
//! ## Example
//!
//! ```yaml
//! context:
//!   hostname: web-1
//!
//! tasks:
//!   - name: motd
//!     commands:
//!       - write_file:
//!           path: /etc/motd
//!           content: "welcome to {{ hostname }}\n"
//!           permissions: "0644"
//!       - send_file:
//!           source: files/app.conf
//!           target: /etc/app.conf
//!           permissions: "0640"
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod package;
pub mod template;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use command::{Command, FileCommand, FileMode, FileSendCommand};
pub use config::{Manifest, ManifestParser, ManifestValidator};
pub use error::{FilecastError, Result};
pub use executor::{LocalTarget, RunReport, Runner, SshTarget, Target};
pub use package::{Package, Plan, TemplateRegistry};
pub use template::{JinjaRenderer, TemplateRenderer};
