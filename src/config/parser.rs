//! Manifest parser for loading deployment manifests.
//!
//! This module handles loading manifests from YAML files, `.env` files and
//! environment variables, with proper precedence and error handling.

use crate::error::{ConfigError, FilecastError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::Manifest;

/// Prefix of environment variables merged into the template context.
pub const CONTEXT_ENV_PREFIX: &str = "FILECAST_VAR_";

/// Manifest parser.
#[derive(Debug, Default)]
pub struct ManifestParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl ManifestParser {
    /// Creates a new manifest parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Returns the directory relative sources are resolved against.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.base_path.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Loads a manifest from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Manifest> {
        let path = path.as_ref();
        info!("Loading manifest from: {}", path.display());

        if !path.exists() {
            return Err(FilecastError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            FilecastError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses a manifest from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<Manifest> {
        debug!("Parsing YAML manifest");

        let manifest: Manifest = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            FilecastError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!(
            "Parsed manifest with {} task(s) and {} template(s)",
            manifest.tasks.len(),
            manifest.templates.len()
        );
        Ok(manifest)
    }

    /// Loads a manifest and merges context variables from the environment.
    ///
    /// Variables named `FILECAST_VAR_<NAME>` become context entry `<name>`
    /// and override values from the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<Manifest> {
        let mut manifest = self.load_file(path)?;
        Self::apply_env_overrides(&mut manifest, std::env::vars());
        Ok(manifest)
    }

    /// Merges prefixed variables into the manifest context.
    fn apply_env_overrides<I>(manifest: &mut Manifest, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(name) = key.strip_prefix(CONTEXT_ENV_PREFIX) {
                if name.is_empty() {
                    continue;
                }
                let name = name.to_lowercase();
                debug!("Overriding context.{} from environment", name);
                manifest.context.insert(name, Value::String(value));
            }
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                FilecastError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default manifest file names to search for.
pub const DEFAULT_MANIFEST_FILES: &[&str] = &["filecast.yaml", "filecast.yml"];

/// Finds the manifest in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no manifest is found.
pub fn find_manifest_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_MANIFEST_FILES {
            let manifest_path = current.join(filename);
            if manifest_path.exists() {
                info!("Found manifest: {}", manifest_path.display());
                return Ok(manifest_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(FilecastError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_MANIFEST_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::FileMode;
    use crate::config::spec::CommandConfig;

    const FULL_MANIFEST: &str = r#"
context:
  hostname: web-1
  port: 8080

tasks:
  - name: motd
    commands:
      - write_file:
          path: /etc/motd
          content: "welcome to {{ hostname }}\n"
          owner: root
          permissions: "0644"
      - send_file:
          source: files/app.conf
          target: /etc/app.conf
          permissions: 0640
      - shell: systemctl restart app
      - install_packages: [nginx, curl]

templates:
  - template: install_packages
    options:
      packages: "git,htop"
      task: base
"#;

    #[test]
    fn test_parse_minimal_manifest() {
        let yaml = r"
tasks:
  - name: empty
";
        let manifest = ManifestParser::new().parse_yaml(yaml, None).unwrap();
        assert_eq!(manifest.tasks.len(), 1);
        assert!(manifest.tasks[0].commands.is_empty());
        assert!(manifest.context.is_empty());
        assert!(manifest.templates.is_empty());
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest = ManifestParser::new().parse_yaml(FULL_MANIFEST, None).unwrap();

        assert_eq!(manifest.context["hostname"], "web-1");
        assert_eq!(manifest.command_count(), 4);
        assert_eq!(manifest.templates[0].options["task"], "base");

        let commands = &manifest.tasks[0].commands;
        match &commands[0] {
            CommandConfig::WriteFile(c) => {
                assert_eq!(c.path, "/etc/motd");
                assert_eq!(c.owner, "root");
                assert_eq!(c.permissions, FileMode::new(0o644).unwrap());
            }
            other => panic!("unexpected command: {other:?}"),
        }
        match &commands[1] {
            CommandConfig::SendFile(c) => {
                assert_eq!(c.owner, "root");
                assert_eq!(c.permissions, FileMode::new(0o640).unwrap());
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(commands[2], CommandConfig::Shell(String::from("systemctl restart app")));
        assert_eq!(
            commands[3],
            CommandConfig::InstallPackages(vec![String::from("nginx"), String::from("curl")])
        );
    }

    #[test]
    fn test_parse_invalid_mode() {
        let yaml = r#"
tasks:
  - name: bad
    commands:
      - write_file: { path: /etc/x, content: x, permissions: "rwx" }
"#;
        assert!(ManifestParser::new().parse_yaml(yaml, None).is_err());
    }

    #[test]
    fn test_parse_unquoted_octal_mode_rejected() {
        let yaml = r"
tasks:
  - name: bad
    commands:
      - write_file: { path: /etc/x, content: x, permissions: 0o644 }
";
        let err = ManifestParser::new().parse_yaml(yaml, None).unwrap_err();
        assert!(err.to_string().contains("quote the mode"), "{err}");
    }

    #[test]
    fn test_parse_unknown_command() {
        let yaml = r"
tasks:
  - name: bad
    commands:
      - reboot: now
";
        let err = ManifestParser::new().parse_yaml(yaml, None).unwrap_err();
        assert!(matches!(err, FilecastError::Config(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut manifest = ManifestParser::new().parse_yaml(FULL_MANIFEST, None).unwrap();
        let vars = vec![
            (String::from("FILECAST_VAR_HOSTNAME"), String::from("web-2")),
            (String::from("FILECAST_VAR_"), String::from("ignored")),
            (String::from("PATH"), String::from("/usr/bin")),
        ];
        ManifestParser::apply_env_overrides(&mut manifest, vars);

        assert_eq!(manifest.context["hostname"], "web-2");
        assert!(!manifest.context.contains_key(""));
        assert!(!manifest.context.contains_key("path"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ManifestParser::new()
            .load_file("/nonexistent/filecast.yaml")
            .unwrap_err();
        assert!(matches!(err, FilecastError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_find_manifest_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("filecast.yaml"), "tasks: []\n").unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_manifest_file(&nested).unwrap();
        assert_eq!(found, dir.path().join("filecast.yaml"));
    }

    #[test]
    fn test_base_dir_default() {
        assert_eq!(ManifestParser::new().base_dir(), PathBuf::from("."));
        assert_eq!(
            ManifestParser::new().with_base_path("/srv").base_dir(),
            PathBuf::from("/srv")
        );
    }
}
