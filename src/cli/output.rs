//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::executor::RunReport;
use crate::package::Plan;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan command row for table display.
#[derive(Tabled)]
struct PlanCommandRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Command")]
    logging: String,
}

/// Run outcome row for table display.
#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Command")]
    logging: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a compiled plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &Plan, show_shell: bool) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&PlanJson::from(plan)).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_plan_text(plan, show_shell),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &Plan, show_shell: bool) -> String {
        if plan.is_empty() {
            return format!("{} Nothing to do - the manifest has no commands.\n", "✓".green());
        }

        let mut output = String::new();

        let _ = write!(output, "\nDeployment Plan\n");
        let _ = write!(output, "   Fingerprint: {}\n\n", plan.short_fingerprint());

        let rows: Vec<PlanCommandRow> = plan
            .commands()
            .iter()
            .enumerate()
            .map(|(i, c)| PlanCommandRow {
                index: i + 1,
                task: c.task.clone(),
                logging: Self::truncate(&c.logging, 72),
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        if show_shell {
            output.push('\n');
            for (i, command) in plan.commands().iter().enumerate() {
                let _ = writeln!(output, "{} {}", format!("#{}", i + 1).dimmed(), command.shell);
            }
        }

        let _ = write!(
            output,
            "\nPlan: {} command(s) in {} task(s)\n",
            plan.len().to_string().green(),
            plan.task_names().len()
        );

        output
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "valid": result.is_valid(),
                    "errors": result.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "warnings": result.warnings,
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = if result.is_valid() {
                    format!("{} Manifest is valid\n", "✓".green())
                } else {
                    format!("{} Manifest is invalid\n", "✗".red())
                };

                for error in &result.errors {
                    let _ = writeln!(output, "   - {error}");
                }

                if result.warning_count() > 0 {
                    if show_warnings {
                        let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                        for warning in &result.warnings {
                            let _ = writeln!(output, "   - {warning}");
                        }
                    } else {
                        let _ = writeln!(
                            output,
                            "   ({} warning(s), use --warnings to show)",
                            result.warning_count()
                        );
                    }
                }

                output
            }
        }
    }

    /// Formats the report of an applied plan.
    #[must_use]
    pub fn format_report(&self, report: &RunReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => {
                let status = if report.succeeded() {
                    format!("{} Apply successful", "✓".green())
                } else {
                    format!("{} Apply finished with failures", "✗".red())
                };

                let mut output = format!("{status}\n\n");

                let rows: Vec<OutcomeRow> = report
                    .outcomes
                    .iter()
                    .map(|o| OutcomeRow {
                        index: o.index + 1,
                        task: o.task.clone(),
                        status: if o.result.success {
                            "ok".green().to_string()
                        } else {
                            format!("failed ({:?})", o.result.exit_code).red().to_string()
                        },
                        logging: Self::truncate(&o.logging, 60),
                    })
                    .collect();

                if !rows.is_empty() {
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }

                let elapsed = report.finished_at - report.started_at;
                let _ = write!(
                    output,
                    "\n{} in {}ms\n",
                    report.summary(),
                    elapsed.num_milliseconds()
                );

                output
            }
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

// JSON serialization helpers

#[derive(serde::Serialize)]
struct PlanJson {
    fingerprint: String,
    created_at: String,
    command_count: usize,
    commands: Vec<PlannedCommandJson>,
}

#[derive(serde::Serialize)]
struct PlannedCommandJson {
    task: String,
    logging: String,
    shell: String,
}

impl From<&Plan> for PlanJson {
    fn from(plan: &Plan) -> Self {
        Self {
            fingerprint: plan.fingerprint.clone(),
            created_at: plan.created_at.to_rfc3339(),
            command_count: plan.len(),
            commands: plan
                .commands()
                .iter()
                .map(|c| PlannedCommandJson {
                    task: c.task.clone(),
                    logging: c.logging.clone(),
                    shell: c.shell.clone(),
                })
                .collect(),
        }
    }
}
