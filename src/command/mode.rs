//! Unix permission bits for deployed files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Highest mode accepted: permission bits plus setuid, setgid and sticky.
const MAX_MODE: u32 = 0o7777;

/// Permission bits of a file, e.g. `0o644`.
///
/// A zero mode means "leave the remote default untouched" for inline writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ModeRepr", into = "String")]
pub struct FileMode(u32);

/// Accepted manifest spellings of a mode.
#[derive(Deserialize)]
#[serde(untagged)]
enum ModeRepr {
    Number(u64),
    Text(String),
}

impl FileMode {
    /// Mode meaning "not set".
    pub const UNSET: Self = Self(0);

    /// Creates a mode from raw bits.
    ///
    /// # Errors
    ///
    /// Returns an error if the bits exceed `0o7777`.
    pub fn new(bits: u32) -> Result<Self, ConfigError> {
        if bits > MAX_MODE {
            return Err(ConfigError::InvalidMode {
                spec: format!("{bits:o}"),
            });
        }
        Ok(Self(bits))
    }

    /// Returns the raw permission bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if no bits are set.
    #[must_use]
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }

    /// Octal form accepted by `chmod`, e.g. `644`.
    #[must_use]
    pub fn to_octal(self) -> String {
        format!("{:o}", self.0)
    }

    /// Zero-padded four digit form used in log lines, e.g. `0644`.
    #[must_use]
    pub fn to_padded_octal(self) -> String {
        format!("{:04o}", self.0)
    }
}

impl FromStr for FileMode {
    type Err = ConfigError;

    /// Parses an octal mode such as `"0644"`, `"644"` or `"0o644"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(ConfigError::InvalidMode { spec: s.to_string() });
        }

        let bits = u32::from_str_radix(digits, 8)
            .map_err(|_| ConfigError::InvalidMode { spec: s.to_string() })?;
        Self::new(bits).map_err(|_| ConfigError::InvalidMode { spec: s.to_string() })
    }
}

impl TryFrom<ModeRepr> for FileMode {
    type Error = ConfigError;

    fn try_from(repr: ModeRepr) -> Result<Self, Self::Error> {
        match repr {
            // YAML resolves `0o644` to 420 and `644` to decimal 644 before we see
            // them, so the intended digits are lost. Only string modes are accepted.
            ModeRepr::Number(n) => Err(ConfigError::InvalidMode {
                spec: format!("{n} (quote the mode, e.g. \"0644\")"),
            }),
            ModeRepr::Text(s) => s.parse(),
        }
    }
}

impl From<FileMode> for String {
    fn from(mode: FileMode) -> Self {
        mode.to_padded_octal()
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_octal_forms() {
        assert_eq!("0644".parse::<FileMode>().unwrap().bits(), 0o644);
        assert_eq!("755".parse::<FileMode>().unwrap().bits(), 0o755);
        assert_eq!("0o600".parse::<FileMode>().unwrap().bits(), 0o600);
        assert_eq!("4755".parse::<FileMode>().unwrap().bits(), 0o4755);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<FileMode>().is_err());
        assert!("rwx".parse::<FileMode>().is_err());
        assert!("0988".parse::<FileMode>().is_err());
        assert!("17777".parse::<FileMode>().is_err());
    }

    #[test]
    fn test_formatting() {
        let mode = FileMode::new(0o644).unwrap();
        assert_eq!(mode.to_octal(), "644");
        assert_eq!(mode.to_padded_octal(), "0644");
        assert_eq!(mode.to_string(), "0644");

        let mode = FileMode::new(0o7).unwrap();
        assert_eq!(mode.to_octal(), "7");
        assert_eq!(mode.to_padded_octal(), "0007");
    }

    #[test]
    fn test_deserialize_quoted_string() {
        let mode: FileMode = serde_yaml::from_str("\"0640\"").unwrap();
        assert_eq!(mode.bits(), 0o640);
        let mode: FileMode = serde_yaml::from_str("'0o644'").unwrap();
        assert_eq!(mode.bits(), 0o644);
        // A leading zero keeps a bare scalar a string in YAML 1.2.
        let mode: FileMode = serde_yaml::from_str("0644").unwrap();
        assert_eq!(mode.bits(), 0o644);
    }

    #[test]
    fn test_deserialize_unquoted_number_rejected() {
        for yaml in ["0o644", "644", "420"] {
            let err = serde_yaml::from_str::<FileMode>(yaml).unwrap_err();
            assert!(err.to_string().contains("quote the mode"), "{yaml}: {err}");
        }
    }

    #[test]
    fn test_unset() {
        assert!(FileMode::UNSET.is_unset());
        assert!(FileMode::default().is_unset());
        assert!(!FileMode::new(0o644).unwrap().is_unset());
    }
}
