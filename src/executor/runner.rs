//! Sequential execution of a compiled plan on a target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{ExecError, Result};
use crate::package::Plan;

use super::target::{CommandResult, Target};

/// Outcome of one executed command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    /// Position of the command within the plan.
    pub index: usize,
    /// Task the command belongs to.
    pub task: String,
    /// Log line of the command.
    pub logging: String,
    /// What the target reported.
    pub result: CommandResult,
}

/// Report of a plan execution.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Target description.
    pub target: String,
    /// Fingerprint of the executed plan.
    pub fingerprint: String,
    /// When execution started.
    pub started_at: DateTime<Utc>,
    /// When execution finished.
    pub finished_at: DateTime<Utc>,
    /// Outcomes in execution order.
    pub outcomes: Vec<CommandOutcome>,
}

impl RunReport {
    /// Returns true if every executed command succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.success)
    }

    /// Returns the number of failed commands.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.result.success).count()
    }

    /// Returns a one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} command(s) OK",
            self.target,
            self.outcomes.len() - self.failed_count(),
            self.outcomes.len()
        )
    }
}

/// Executes plans on a target, one command at a time.
#[derive(Debug)]
pub struct Runner<T: Target> {
    target: T,
    keep_going: bool,
}

impl<T: Target> Runner<T> {
    /// Creates a runner that stops at the first failing command.
    #[must_use]
    pub const fn new(target: T) -> Self {
        Self {
            target,
            keep_going: false,
        }
    }

    /// Continues after failing commands instead of stopping.
    #[must_use]
    pub const fn with_keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Returns the target.
    #[must_use]
    pub const fn target(&self) -> &T {
        &self.target
    }

    /// Executes every command of the plan in order.
    ///
    /// Each command's input stream is opened right before it runs and is
    /// closed once the target has consumed it.
    ///
    /// # Errors
    ///
    /// Returns an error if an input stream cannot be opened, the target
    /// fails to run a command, or a command fails and `keep_going` is off.
    pub async fn run(&self, plan: &Plan) -> Result<RunReport> {
        let target = self.target.describe();
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(plan.len());

        info!("Applying plan {} to {}", plan.short_fingerprint(), target);

        for (index, planned) in plan.commands().iter().enumerate() {
            info!("{}", planned.logging);

            let input = planned.input()?;
            let result = self.target.execute(&planned.shell, input).await?;

            if !result.success {
                if self.keep_going {
                    warn!(
                        "Command {} in task '{}' failed with {:?}, continuing",
                        index, planned.task, result.exit_code
                    );
                } else {
                    error!("Command {} in task '{}' failed on {}", index, planned.task, target);
                    return Err(ExecError::CommandFailed {
                        index,
                        task: planned.task.clone(),
                        target,
                        exit_code: result.exit_code,
                        stderr: result.stderr.trim().to_string(),
                    }
                    .into());
                }
            }

            outcomes.push(CommandOutcome {
                index,
                task: planned.task.clone(),
                logging: planned.logging.clone(),
                result,
            });
        }

        let report = RunReport {
            target,
            fingerprint: plan.fingerprint.clone(),
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!("{}", report.summary());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{run_shell, FileCommand, FileSendCommand, FileMode};
    use crate::error::FilecastError;
    use crate::executor::target::MockTarget;
    use crate::package::Package;
    use crate::template::JinjaRenderer;
    use mockall::predicate::*;
    use serde_json::json;
    use std::io::Write;

    fn compile(package: Package) -> Plan {
        package.compile(&JinjaRenderer::new().unwrap(), &json!({})).unwrap()
    }

    fn mock_target() -> MockTarget {
        let mut target = MockTarget::new();
        target
            .expect_describe()
            .returning(|| String::from("mock"));
        target
    }

    #[tokio::test]
    async fn test_runs_all_commands_in_order() {
        let mut package = Package::new();
        package.add_command("a", run_shell("echo 1"));
        package.add_command("b", run_shell("echo 2"));
        let plan = compile(package);

        let mut target = mock_target();
        let mut seq = mockall::Sequence::new();
        target
            .expect_execute()
            .with(eq("echo 1"), always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CommandResult::ok("1\n")));
        target
            .expect_execute()
            .with(eq("echo 2"), always())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CommandResult::ok("2\n")));

        let report = Runner::new(target).run(&plan).await.unwrap();
        assert!(report.succeeded());
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.summary(), "mock: 2/2 command(s) OK");
        assert_eq!(report.fingerprint, plan.fingerprint);
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let mut package = Package::new();
        package.add_command("a", run_shell("false"));
        package.add_command("a", run_shell("echo never"));
        let plan = compile(package);

        let mut target = mock_target();
        target
            .expect_execute()
            .with(eq("false"), always())
            .times(1)
            .returning(|_, _| Ok(CommandResult::failed(1, "boom\n")));
        target
            .expect_execute()
            .with(eq("echo never"), always())
            .never();

        let err = Runner::new(target).run(&plan).await.unwrap_err();
        match err {
            FilecastError::Exec(ExecError::CommandFailed { index, stderr, .. }) => {
                assert_eq!(index, 0);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_keep_going_records_failures() {
        let mut package = Package::new();
        package.add_command("a", run_shell("false"));
        package.add_command("a", run_shell("true"));
        let plan = compile(package);

        let mut target = mock_target();
        target
            .expect_execute()
            .with(eq("false"), always())
            .returning(|_, _| Ok(CommandResult::failed(1, "")));
        target
            .expect_execute()
            .with(eq("true"), always())
            .returning(|_, _| Ok(CommandResult::ok("")));

        let report = Runner::new(target)
            .with_keep_going(true)
            .run(&plan)
            .await
            .unwrap();
        assert!(!report.succeeded());
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.outcomes.len(), 2);
    }

    #[tokio::test]
    async fn test_send_file_gets_input_inline_does_not() {
        let mut source = tempfile::NamedTempFile::new().unwrap();
        source.write_all(b"conf").unwrap();
        source.flush().unwrap();

        let mut package = Package::new();
        package.add_command("files", FileCommand::new("/etc/motd", "hi\n"));
        package.add_command(
            "files",
            FileSendCommand::new(
                source.path().to_string_lossy(),
                "/etc/app.conf",
                FileMode::new(0o644).unwrap(),
            ),
        );
        let plan = compile(package);

        let mut target = mock_target();
        let mut seq = mockall::Sequence::new();
        target
            .expect_execute()
            .withf(|shell, input| shell.ends_with("/etc/motd") && input.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CommandResult::ok("")));
        target
            .expect_execute()
            .withf(|shell, input| shell.contains("cat - > /etc/app.conf") && input.is_some())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CommandResult::ok("")));

        let report = Runner::new(target).run(&plan).await.unwrap();
        assert!(report.succeeded());
    }

    #[tokio::test]
    async fn test_target_error_propagates() {
        let mut package = Package::new();
        package.add_command("a", run_shell("echo 1"));
        let plan = compile(package);

        let mut target = mock_target();
        target
            .expect_execute()
            .returning(|_, _| Err(FilecastError::internal("transport down")));

        let err = Runner::new(target).run(&plan).await.unwrap_err();
        assert!(matches!(err, FilecastError::Internal(_)));
    }
}
