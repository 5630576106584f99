//! Filecast CLI entrypoint.
//!
//! This is the main entrypoint for the filecast command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use filecast::cli::{Cli, Commands, OutputFormatter};
use filecast::config::{find_manifest_file, Manifest, ManifestParser, ManifestValidator};
use filecast::error::Result;
use filecast::executor::{LocalTarget, RunReport, Runner, SshTarget, Target};
use filecast::package::{Plan, TemplateRegistry};
use filecast::template::JinjaRenderer;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point. Returns whether the command succeeded.
async fn run(cli: Cli) -> Result<bool> {
    let formatter = OutputFormatter::new(cli.output);
    let manifest = cli.manifest.as_ref();

    match cli.command {
        Commands::Validate { warnings } => cmd_validate(manifest, warnings, &formatter),
        Commands::Plan { shell } => cmd_plan(manifest, shell, &formatter),
        Commands::Apply {
            host,
            user,
            port,
            keep_going,
        } => {
            let plan = compile_manifest(manifest)?;
            match host {
                Some(host) => {
                    let mut target = SshTarget::new(host);
                    if let Some(user) = user {
                        target = target.with_user(user);
                    }
                    if let Some(port) = port {
                        target = target.with_port(port);
                    }
                    cmd_apply(target, &plan, keep_going, &formatter).await
                }
                None => cmd_apply(LocalTarget::new(), &plan, keep_going, &formatter).await,
            }
        }
        Commands::Shell { task } => cmd_shell(manifest, task.as_deref()),
    }
}

/// Validate the manifest.
fn cmd_validate(
    manifest_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let (manifest, _) = load_manifest(manifest_path)?;

    let registry = TemplateRegistry::with_builtins();
    let validator = ManifestValidator::new(registry.names());
    let result = validator.check(&manifest);

    eprintln!("{}", formatter.format_validation(&result, show_warnings));

    eprintln!("Manifest summary:");
    eprintln!("  Tasks: {}", manifest.tasks.len());
    eprintln!("  Commands: {}", manifest.command_count());
    eprintln!("  Templates: {}", manifest.templates.len());
    eprintln!("  Context variables: {}", manifest.context.len());

    Ok(result.is_valid())
}

/// Show the compiled plan.
fn cmd_plan(
    manifest_path: Option<&PathBuf>,
    show_shell: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let plan = compile_manifest(manifest_path)?;
    write_stdout(&formatter.format_plan(&plan, show_shell))?;
    Ok(true)
}

/// Apply the compiled plan to a target.
async fn cmd_apply<T: Target>(
    target: T,
    plan: &Plan,
    keep_going: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    if plan.is_empty() {
        warn!("Plan has no commands, nothing to apply");
        return Ok(true);
    }

    let runner = Runner::new(target).with_keep_going(keep_going);
    let report: RunReport = runner.run(plan).await?;

    write_stdout(&formatter.format_report(&report))?;
    Ok(report.succeeded())
}

/// Print the synthesized shell lines.
fn cmd_shell(manifest_path: Option<&PathBuf>, task: Option<&str>) -> Result<bool> {
    let plan = compile_manifest(manifest_path)?;

    let commands = match task {
        Some(task) => plan.commands_for(task),
        None => plan.commands().iter().collect(),
    };

    if commands.is_empty() {
        warn!("No commands to print");
    }

    let mut output = String::new();
    for command in commands {
        output.push_str(&command.shell);
        output.push('\n');
    }
    write_stdout(&output)?;
    Ok(true)
}

/// Resolves the manifest path from CLI or default locations.
fn resolve_manifest_path(manifest_path: Option<&PathBuf>) -> Result<PathBuf> {
    manifest_path.map_or_else(|| find_manifest_file("."), |path| Ok(path.clone()))
}

/// Loads the manifest along with `.env` and environment overrides.
///
/// Returns the manifest and the directory relative sources resolve against.
fn load_manifest(manifest_path: Option<&PathBuf>) -> Result<(Manifest, PathBuf)> {
    let manifest_file = resolve_manifest_path(manifest_path)?;
    debug!("Loading manifest from: {}", manifest_file.display());

    let base_dir = manifest_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let parser = ManifestParser::new().with_base_path(base_dir);
    parser.load_dotenv()?;

    let manifest = parser.load_with_env(&manifest_file)?;
    Ok((manifest, parser.base_dir()))
}

/// Loads, validates and compiles the manifest into a plan.
fn compile_manifest(manifest_path: Option<&PathBuf>) -> Result<Plan> {
    let (manifest, base_dir) = load_manifest(manifest_path)?;

    let registry = TemplateRegistry::with_builtins();
    let validator = ManifestValidator::new(registry.names());
    let result = validator.validate(&manifest)?;
    for warning in &result.warnings {
        warn!("{}", warning);
    }

    let package = manifest.to_package(&registry, &base_dir)?;
    let plan = package.compile(&JinjaRenderer::new()?, &manifest.context_value())?;
    info!("Plan {} ready with {} command(s)", plan.short_fingerprint(), plan.len());
    Ok(plan)
}

/// Writes command output to stdout.
fn write_stdout(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
