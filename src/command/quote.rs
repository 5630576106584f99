//! Shell quoting for values embedded in synthesized commands.

use shell_escape::unix::escape;
use std::borrow::Cow;

/// Separator between the steps of a synthesized command.
pub const AND: &str = " && ";

/// Quotes a value for a POSIX shell.
///
/// Values made only of characters the shell never interprets (alphanumerics
/// and `-_=/,.+`) are returned unchanged, so ordinary paths stay readable.
/// Anything else is wrapped in single quotes.
#[must_use]
pub fn quote(value: &str) -> String {
    escape(Cow::Borrowed(value)).into_owned()
}

/// Joins command steps so that each one only runs if the previous succeeded.
#[must_use]
pub fn and_then<S: AsRef<str>>(steps: &[S]) -> String {
    steps
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(AND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path_unquoted() {
        assert_eq!(quote("/etc/motd"), "/etc/motd");
        assert_eq!(quote("/tmp/filecast.abc123"), "/tmp/filecast.abc123");
    }

    #[test]
    fn test_dangerous_values_quoted() {
        let dangerous = [
            "/tmp/file with spaces",
            "/tmp/$(whoami)",
            "/tmp/`id`",
            "/tmp/a; touch pwned",
            "/tmp/a && true",
            "/tmp/a | cat",
            "/tmp/a > b",
        ];

        for value in dangerous {
            let quoted = quote(value);
            assert!(quoted.starts_with('\''), "not quoted: {value} -> {quoted}");
        }
    }

    #[test]
    fn test_single_quote_escaped() {
        let quoted = quote("it's");
        assert!(quoted.contains("\\'"), "{quoted}");
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_and_then() {
        assert_eq!(and_then(&["a", "b", "c"]), "a && b && c");
        assert_eq!(and_then(&[String::from("only")]), "only");
    }
}
