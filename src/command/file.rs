//! Inline file writes.
//!
//! A [`FileCommand`] carries the whole file content inside the synthesized
//! shell text. The content is gzip compressed and base64 encoded, decoded on
//! the target into a temporary file named after its SHA-256, fixed up
//! (owner, mode) and only then moved onto the final path. The `mv` is the
//! only step that touches the final path, so a failure anywhere earlier
//! leaves the existing file alone and nobody ever observes a partial write.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::error::{CommandError, TemplateError};
use crate::template::TemplateRenderer;

use super::digest::sha256_hex;
use super::mode::FileMode;
use super::quote::{and_then, quote};
use super::Command;

/// Directory on the target that holds temporary files.
pub const TMP_DIR: &str = "/tmp";

/// Prefix of temporary files created on the target.
pub const TMP_PREFIX: &str = "filecast";

/// Writes a file with inline content to the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCommand {
    /// Path of the file to create.
    pub path: String,
    /// Content of the file to create.
    pub content: String,
    /// Owner to assign; empty leaves the default owner.
    pub owner: String,
    /// Mode to assign; unset leaves the default mode.
    pub permissions: FileMode,
}

/// Creates a command writing `content` to `path`.
///
/// `owner` and `permissions` are ignored when empty or unset.
#[must_use]
pub fn write_file(
    path: impl Into<String>,
    content: impl Into<String>,
    owner: impl Into<String>,
    permissions: FileMode,
) -> FileCommand {
    FileCommand {
        path: path.into(),
        content: content.into(),
        owner: owner.into(),
        permissions,
    }
}

impl FileCommand {
    /// Creates a command without owner or mode changes.
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        write_file(path, content, String::new(), FileMode::UNSET)
    }

    /// Sets the owner of the created file.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Sets the mode of the created file.
    #[must_use]
    pub const fn with_permissions(mut self, permissions: FileMode) -> Self {
        self.permissions = permissions;
        self
    }

    /// Temporary path the content is decoded into before the final move.
    ///
    /// Identical content always maps to the same path. Different content maps
    /// to different paths unless SHA-256 collides.
    #[must_use]
    pub fn temp_path(&self) -> String {
        format!("{TMP_DIR}/{TMP_PREFIX}.{}", sha256_hex(self.content.as_bytes()))
    }

    /// Gzip compresses the content and encodes it as base64.
    ///
    /// # Errors
    ///
    /// Returns an error if compression fails.
    pub fn encoded_content(&self) -> Result<String, CommandError> {
        let encoding_error = |e: std::io::Error| CommandError::Encoding {
            path: self.path.clone(),
            message: e.to_string(),
        };

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(self.content.as_bytes())
            .map_err(encoding_error)?;
        let compressed = encoder.finish().map_err(encoding_error)?;

        Ok(BASE64.encode(compressed))
    }

    /// Directory that must exist before the file can be moved into place.
    fn parent_dir(&self) -> String {
        match Path::new(&self.path).parent() {
            Some(parent) if parent.as_os_str().is_empty() => String::from("."),
            Some(parent) => parent.to_string_lossy().into_owned(),
            None => String::from("/"),
        }
    }

    /// Validates, then encodes with `encode` and builds the command line.
    ///
    /// Encoding only runs once validation has passed.
    fn synthesize<E>(&self, encode: E) -> Result<String, CommandError>
    where
        E: FnOnce(&Self) -> Result<String, CommandError>,
    {
        self.validate()?;

        let encoded = encode(self)?;
        let tmp_path = quote(&self.temp_path());
        debug!(
            "Encoded {} bytes for {} into {} base64 characters",
            self.content.len(),
            self.path,
            encoded.len()
        );

        let mut steps = vec![
            format!("mkdir -p {}", quote(&self.parent_dir())),
            format!("echo {encoded} | base64 -d | gunzip > {tmp_path}"),
        ];
        if !self.owner.is_empty() {
            steps.push(format!("chown {} {tmp_path}", quote(&self.owner)));
        }
        if !self.permissions.is_unset() {
            steps.push(format!("chmod {} {tmp_path}", self.permissions.to_octal()));
        }
        steps.push(format!("mv {tmp_path} {}", quote(&self.path)));

        Ok(and_then(&steps))
    }
}

impl Command for FileCommand {
    fn render(
        &mut self,
        renderer: &dyn TemplateRenderer,
        context: &Value,
    ) -> Result<(), TemplateError> {
        let path = renderer.render(&self.path, context)?;
        let content = renderer.render(&self.content, context)?;
        self.path = path;
        self.content = content;
        Ok(())
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.path.is_empty() {
            return Err(CommandError::validation("no path given"));
        }

        if self.content.is_empty() {
            return Err(CommandError::validation(format!(
                "no content given for file {:?}",
                self.path
            )));
        }

        Ok(())
    }

    fn shell(&self) -> Result<String, CommandError> {
        self.synthesize(Self::encoded_content)
    }

    fn logging(&self) -> String {
        let mut parts = vec![String::from("[FILE   ]")];

        if !self.owner.is_empty() && self.owner != "root" {
            parts.push(format!("[CHOWN:{}]", self.owner));
        }

        if !self.permissions.is_unset() {
            parts.push(format!("[CHMOD:{}]", self.permissions.to_padded_octal()));
        }

        parts.push(format!(" {}", self.path));
        parts.concat()
    }
}
