//! Transfers of local files to the target.
//!
//! A [`FileSendCommand`] does not embed the file. Its shell text reads the
//! file from stdin, and the transport pipes the stream returned by
//! [`Command::input`] into it.
//!
//! Unlike inline writes, the stream is written straight to the target path
//! without a temporary file, so a failed or interrupted transfer can leave a
//! truncated target behind. Callers relying on atomic replacement should use
//! [`super::FileCommand`] instead.

use serde_json::Value;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::{CommandError, TemplateError};
use crate::template::TemplateRenderer;

use super::digest::file_sha1_hex;
use super::mode::FileMode;
use super::quote::{and_then, quote};
use super::Command;

/// Owner that is treated as "leave ownership alone".
pub const DEFAULT_SEND_OWNER: &str = "root";

/// Sends a local file to a path on the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSendCommand {
    /// Local path of the file to send.
    pub source: String,
    /// Path of the file on the target.
    pub target: String,
    /// Owner to assign; `root` leaves ownership unchanged.
    pub owner: String,
    /// Mode to assign to the target file.
    pub permissions: FileMode,
}

/// Creates a command sending the local file `source` to `target`.
#[must_use]
pub fn send_file(
    source: impl Into<String>,
    target: impl Into<String>,
    owner: impl Into<String>,
    permissions: FileMode,
) -> FileSendCommand {
    FileSendCommand {
        source: source.into(),
        target: target.into(),
        owner: owner.into(),
        permissions,
    }
}

impl FileSendCommand {
    /// Creates a command owned by root with the given mode.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, permissions: FileMode) -> Self {
        send_file(source, target, DEFAULT_SEND_OWNER, permissions)
    }

    /// Sets the owner of the target file.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// SHA-1 of the source file's current bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    pub fn source_hash(&self) -> Result<String, CommandError> {
        file_sha1_hex(Path::new(&self.source))
            .map_err(|e| CommandError::source_access(&self.source, e))
    }

    /// Opens the source file for piping into the command.
    ///
    /// Every call opens a new handle; the caller owns it and closes it by
    /// dropping it.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be opened.
    pub fn open_source(&self) -> Result<File, CommandError> {
        File::open(&self.source).map_err(|e| CommandError::source_access(&self.source, e))
    }

    /// Returns true if the owner requires a `chown`.
    fn changes_owner(&self) -> bool {
        !self.owner.is_empty() && self.owner != DEFAULT_SEND_OWNER
    }
}

impl Command for FileSendCommand {
    fn render(
        &mut self,
        renderer: &dyn TemplateRenderer,
        context: &Value,
    ) -> Result<(), TemplateError> {
        let source = renderer.render(&self.source, context)?;
        let target = renderer.render(&self.target, context)?;
        self.source = source;
        self.target = target;
        Ok(())
    }

    fn validate(&self) -> Result<(), CommandError> {
        if self.source.is_empty() {
            return Err(CommandError::validation("no source path given"));
        }

        std::fs::metadata(&self.source)
            .map_err(|e| CommandError::source_access(&self.source, e))?;

        if self.target.is_empty() {
            return Err(CommandError::validation(format!(
                "no target path given for file {:?}",
                self.source
            )));
        }

        Ok(())
    }

    fn shell(&self) -> Result<String, CommandError> {
        self.validate()?;

        let hash = self.source_hash()?;
        debug!("Source {} has sha1 {}", self.source, hash);

        let target = quote(&self.target);
        let mut steps = vec![
            format!("echo \"{hash}\""),
            format!("cat - > {target}"),
        ];
        if self.changes_owner() {
            steps.push(format!("chown {} {target}", quote(&self.owner)));
        }
        steps.push(format!("chmod {} {target}", self.permissions.to_octal()));

        Ok(and_then(&steps))
    }

    fn logging(&self) -> String {
        let mut parts = vec![String::from("[FILE   ]")];

        if self.changes_owner() {
            parts.push(format!("[CHOWN:{}]", self.owner));
        }

        if !self.permissions.is_unset() {
            parts.push(format!("[CHMOD:{}]", self.permissions.to_padded_octal()));
        }

        parts.push(format!(
            " Writing local file {} to {}",
            self.source, self.target
        ));
        parts.concat()
    }

    fn input(&self) -> Result<Option<File>, CommandError> {
        self.open_source().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::JinjaRenderer;
    use serde_json::json;
    use std::io::{Read, Write};
    use tempfile::NamedTempFile;

    fn source_file(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    fn mode(bits: u32) -> FileMode {
        FileMode::new(bits).unwrap()
    }

    #[test]
    fn test_validate_missing_source() {
        let cmd = FileSendCommand::new("/nonexistent/filecast/app.conf", "/etc/app.conf", mode(0o644));
        let err = cmd.validate().unwrap_err();
        assert!(matches!(err, CommandError::Source { .. }));
    }

    #[test]
    fn test_validate_empty_source() {
        let cmd = FileSendCommand::new("", "/etc/app.conf", mode(0o644));
        assert_eq!(cmd.validate().unwrap_err().to_string(), "no source path given");
    }

    #[test]
    fn test_validate_empty_target() {
        let file = source_file(b"data");
        let source = file.path().to_string_lossy().into_owned();
        let cmd = FileSendCommand::new(source.clone(), "", mode(0o644));

        let err = cmd.validate().unwrap_err();
        assert_eq!(err.to_string(), format!("no target path given for file {source:?}"));
    }

    #[test]
    fn test_validate_ok() {
        let file = source_file(b"data");
        let cmd = FileSendCommand::new(file.path().to_string_lossy(), "/etc/app.conf", mode(0o644));
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_shell_root_owner() {
        let file = source_file(b"hello\n");
        let cmd = FileSendCommand::new(file.path().to_string_lossy(), "/etc/app.conf", mode(0o644));

        assert_eq!(
            cmd.shell().unwrap(),
            "echo \"f572d396fae9206628714fb2ce00f72e94f2258f\" && cat - > /etc/app.conf && chmod 644 /etc/app.conf"
        );
    }

    #[test]
    fn test_shell_with_owner() {
        let file = source_file(b"hello\n");
        let cmd = FileSendCommand::new(file.path().to_string_lossy(), "/etc/app.conf", mode(0o640))
            .with_owner("app");

        let shell = cmd.shell().unwrap();
        assert!(shell.ends_with(
            "cat - > /etc/app.conf && chown app /etc/app.conf && chmod 640 /etc/app.conf"
        ));
    }

    #[test]
    fn test_shell_hash_tracks_current_bytes() {
        let mut file = source_file(b"one");
        let cmd = FileSendCommand::new(file.path().to_string_lossy(), "/etc/x", mode(0o644));
        let first = cmd.shell().unwrap();

        file.write_all(b" two").unwrap();
        file.flush().unwrap();
        let second = cmd.shell().unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_shell_rejects_empty_target() {
        let file = source_file(b"data");
        let cmd = FileSendCommand::new(file.path().to_string_lossy(), "", mode(0o644));

        let err = cmd.shell().unwrap_err();
        assert!(matches!(err, CommandError::Validation { .. }));
        assert!(err.to_string().starts_with("no target path given"));
    }

    #[test]
    fn test_shell_rejects_empty_source() {
        let cmd = FileSendCommand::new("", "/etc/app.conf", mode(0o644));
        assert_eq!(cmd.shell().unwrap_err().to_string(), "no source path given");
    }

    #[test]
    fn test_shell_missing_source_fails() {
        let cmd = FileSendCommand::new("/nonexistent/filecast/app.conf", "/etc/app.conf", mode(0o644));
        assert!(matches!(cmd.shell().unwrap_err(), CommandError::Source { .. }));
    }

    #[test]
    fn test_input_reopens_each_time() {
        let file = source_file(b"payload");
        let cmd = FileSendCommand::new(file.path().to_string_lossy(), "/etc/x", mode(0o600));

        for _ in 0..2 {
            let mut stream = cmd.input().unwrap().unwrap();
            let mut buf = String::new();
            stream.read_to_string(&mut buf).unwrap();
            assert_eq!(buf, "payload");
        }
    }

    #[test]
    fn test_open_missing_source_is_error() {
        let cmd = FileSendCommand::new("/nonexistent/filecast/app.conf", "/etc/x", mode(0o600));
        assert!(cmd.open_source().is_err());
        assert!(cmd.input().is_err());
    }

    #[test]
    fn test_render() {
        let renderer = JinjaRenderer::new().unwrap();
        let mut cmd = FileSendCommand::new("files/{{ app }}.conf", "/etc/{{ app }}.conf", mode(0o644));
        cmd.render(&renderer, &json!({ "app": "nginx" })).unwrap();

        assert_eq!(cmd.source, "files/nginx.conf");
        assert_eq!(cmd.target, "/etc/nginx.conf");
    }

    #[test]
    fn test_logging() {
        let cmd = FileSendCommand::new("files/app.conf", "/etc/app.conf", mode(0o644));
        assert_eq!(
            cmd.logging(),
            "[FILE   ][CHMOD:0644] Writing local file files/app.conf to /etc/app.conf"
        );

        let cmd = cmd.with_owner("app");
        assert_eq!(
            cmd.logging(),
            "[FILE   ][CHOWN:app][CHMOD:0644] Writing local file files/app.conf to /etc/app.conf"
        );
    }
}
