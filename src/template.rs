//! Template rendering for command fields.
//!
//! Paths, contents and shell lines may contain `{{ }}` placeholders that are
//! expanded against a context before any command is validated. Rendering is
//! strict: an undefined variable or malformed placeholder fails the whole
//! command instead of leaving it in the synthesized shell text.
//!
//! Only `{{` is reserved. Block and comment tags are moved to `{{% %}}` and
//! `{{# #}}`, so shell text such as `${#arr[@]}` or `{% raw %}` in a config
//! file passes through untouched.

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior};
use serde_json::Value;
use tracing::trace;

use crate::error::TemplateError;

/// Opening delimiter of a placeholder.
pub const PLACEHOLDER_START: &str = "{{";

/// Expands template placeholders in a piece of text.
pub trait TemplateRenderer: Send + Sync {
    /// Renders `text` against `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is malformed or references a value
    /// missing from the context.
    fn render(&self, text: &str, context: &Value) -> Result<String, TemplateError>;
}

/// Jinja-style renderer backed by `minijinja`.
#[derive(Debug)]
pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    /// Creates a strict renderer.
    ///
    /// # Errors
    ///
    /// Returns an error if the delimiter configuration is rejected.
    pub fn new() -> Result<Self, TemplateError> {
        let syntax = SyntaxConfig::builder()
            .variable_delimiters(PLACEHOLDER_START, "}}")
            .block_delimiters("{{%", "%}}")
            .comment_delimiters("{{#", "#}}")
            .build()
            .map_err(|e| TemplateError::new(PLACEHOLDER_START, e.to_string()))?;

        let mut env = Environment::new();
        env.set_syntax(syntax);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // File contents must come back byte-for-byte, including the final newline.
        env.set_keep_trailing_newline(true);
        Ok(Self { env })
    }
}

impl TemplateRenderer for JinjaRenderer {
    fn render(&self, text: &str, context: &Value) -> Result<String, TemplateError> {
        if !text.contains(PLACEHOLDER_START) {
            return Ok(text.to_string());
        }

        trace!("Rendering template of {} bytes", text.len());
        self.env
            .render_str(text, context)
            .map_err(|e| TemplateError::new(text, e.to_string()))
    }
}
