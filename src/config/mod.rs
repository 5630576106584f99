//! Manifest configuration.
//!
//! This module handles everything between `filecast.yaml` and a [`Package`]:
//! - Parsing and deserializing the manifest
//! - Merging context variables from `.env` and the environment
//! - Validating the manifest before commands are built
//!
//! [`Package`]: crate::package::Package

mod parser;
mod spec;
mod validator;

pub use parser::{find_manifest_file, ManifestParser, CONTEXT_ENV_PREFIX, DEFAULT_MANIFEST_FILES};
pub use spec::{
    CommandConfig, Manifest, SendFileConfig, TaskConfig, TemplateConfig, WriteFileConfig,
};
pub use validator::{ManifestValidator, ValidationError, ValidationResult};
