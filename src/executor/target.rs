//! Targets that execute synthesized shell text.
//!
//! A target receives one shell line at a time, optionally with a local file
//! to pipe into the command's stdin. Targets do not retry: a failing command
//! is reported back as an unsuccessful [`CommandResult`].

use async_trait::async_trait;
use serde::Serialize;
use std::fs::File;
use std::process::Stdio;
use tokio::process::Command as Process;
use tracing::{debug, warn};

use crate::command::quote;
use crate::error::{ExecError, FilecastError, Result};

/// Result of executing one shell line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,
    /// Command output (stdout).
    pub stdout: String,
    /// Command error output (stderr).
    pub stderr: String,
    /// Exit code if available.
    pub exit_code: Option<i32>,
}

impl CommandResult {
    /// Creates a successful result with the given stdout.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// Creates a failed result with the given exit code and stderr.
    #[must_use]
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
        }
    }
}

/// A host that can run shell text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Target: Send + Sync {
    /// Short description of the target for logs and errors.
    fn describe(&self) -> String;

    /// Executes `shell`, piping `input` into its stdin when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started or fed; a command
    /// that runs and fails is reported through [`CommandResult::success`].
    async fn execute(&self, shell: &str, input: Option<File>) -> Result<CommandResult>;
}

/// Runs commands on the local machine with `sh -c`.
#[derive(Debug, Clone, Default)]
pub struct LocalTarget;

impl LocalTarget {
    /// Creates a local target.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Target for LocalTarget {
    fn describe(&self) -> String {
        String::from("local")
    }

    async fn execute(&self, shell: &str, input: Option<File>) -> Result<CommandResult> {
        let mut process = Process::new("sh");
        process.arg("-c").arg(shell);
        run_process(process, "sh", &self.describe(), input).await
    }
}

/// Runs commands on a remote host through the `ssh` client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    /// Host name or address.
    pub host: String,
    /// Login user; the ssh client default when absent.
    pub user: Option<String>,
    /// Port; the ssh client default when absent.
    pub port: Option<u16>,
}

impl SshTarget {
    /// Creates a target for the given host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            port: None,
        }
    }

    /// Sets the login user.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Arguments passed to `ssh` to run `shell` on the host.
    #[must_use]
    pub fn ssh_args(&self, shell: &str) -> Vec<String> {
        let mut args = vec![String::from("-o"), String::from("BatchMode=yes")];
        if let Some(port) = self.port {
            args.push(String::from("-p"));
            args.push(port.to_string());
        }
        let destination = match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        };
        args.push(destination);
        args.push(String::from("--"));
        // The remote side hands the command to a login shell; keep it a single word.
        args.push(format!("sh -c {}", quote(shell)));
        args
    }
}

#[async_trait]
impl Target for SshTarget {
    fn describe(&self) -> String {
        let user = self.user.as_ref().map_or_else(String::new, |u| format!("{u}@"));
        let port = self.port.map_or_else(String::new, |p| format!(":{p}"));
        format!("ssh://{user}{}{port}", self.host)
    }

    async fn execute(&self, shell: &str, input: Option<File>) -> Result<CommandResult> {
        let mut process = Process::new("ssh");
        process.args(self.ssh_args(shell));
        run_process(process, "ssh", &self.describe(), input).await
    }
}

/// Spawns a process, pipes the input into it and collects its output.
async fn run_process(
    mut process: Process,
    program: &str,
    target: &str,
    input: Option<File>,
) -> Result<CommandResult> {
    process
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = process.spawn().map_err(|source| ExecError::SpawnFailed {
        program: program.to_string(),
        target: target.to_string(),
        source,
    })?;

    // Feed stdin concurrently so a chatty command cannot fill its stdout pipe and stall.
    let writer = match (input, child.stdin.take()) {
        (Some(file), Some(mut stdin)) => Some(tokio::spawn(async move {
            let mut reader = tokio::fs::File::from_std(file);
            tokio::io::copy(&mut reader, &mut stdin).await
        })),
        _ => None,
    };

    let output = child.wait_with_output().await?;
    let result = CommandResult {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
    };

    if let Some(writer) = writer {
        let copied = writer
            .await
            .map_err(|e| FilecastError::internal(format!("stdin writer panicked: {e}")))?;
        match copied {
            Ok(bytes) => debug!("Piped {} bytes to {}", bytes, target),
            Err(source) if result.success => {
                return Err(ExecError::InputFailed {
                    target: target.to_string(),
                    source,
                }
                .into());
            }
            Err(e) => warn!("Input pipe to {} closed early: {}", target, e),
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ssh_args() {
        let target = SshTarget::new("web-1").with_user("deploy").with_port(2222);
        let args = target.ssh_args("echo hi");
        assert_eq!(
            args,
            vec!["-o", "BatchMode=yes", "-p", "2222", "deploy@web-1", "--", "sh -c 'echo hi'"]
        );
    }

    #[test]
    fn test_ssh_describe() {
        assert_eq!(SshTarget::new("web-1").describe(), "ssh://web-1");
        assert_eq!(
            SshTarget::new("web-1").with_user("root").with_port(22).describe(),
            "ssh://root@web-1:22"
        );
    }

    #[tokio::test]
    async fn test_local_success() {
        let result = LocalTarget::new().execute("echo hello", None).await.unwrap();
        assert!(result.success);
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_local_failure() {
        let result = LocalTarget::new()
            .execute("echo oops >&2; exit 3", None)
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.stderr, "oops\n");
        assert_eq!(result.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_local_pipes_input() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"piped bytes").unwrap();
        file.flush().unwrap();

        let input = File::open(file.path()).unwrap();
        let result = LocalTarget::new().execute("cat -", Some(input)).await.unwrap();
        assert!(result.success);
        assert_eq!(result.stdout, "piped bytes");
    }
}
