//! Notification body rendering.
//!
//! Templates use `{name}` placeholders. Supported names:
//! - `{function}` - Name of the wrapped task
//! - `{start}` - Time the first attempt started
//! - `{end}` - Time the terminal outcome was reached
//! - `{fail_time}` - Same as `{end}` on failure, empty on success
//! - `{machine}` - Host name
//! - `{user}` - Invoking user
//! - `{error}` - Last error message (empty on success)
//! - `{traceback}` - Last error details (empty on success)
//! - `{attempts}` - Number of attempts made
//!
//! `{{` and `}}` produce literal braces. Unknown names and unterminated
//! braces are copied to the output unchanged.

use std::path::Path;

use tracing::warn;

use crate::context::NotificationContext;
use crate::{Error, Result};

const DEFAULT_FAILURE_LAYOUT: &str = "Function {function} initiated at {start}\n\
Failed at {fail_time}\n\
Machine: {machine}\n\
User: {user}\n\
Attempts: {attempts}\n\
Error: {error}\n\
\n\
Traceback:\n\
{traceback}";

const DEFAULT_SUCCESS_LAYOUT: &str = "Function {function} initiated at {start}\n\
Succeeded at {end}\n\
Machine: {machine}\n\
User: {user}\n\
Attempts: {attempts}";

/// Source of the notification body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Template {
    /// Built-in layout listing every field.
    #[default]
    Default,
    /// User-supplied Markdown text.
    Markdown(String),
}

impl Template {
    pub fn markdown(text: impl Into<String>) -> Self {
        Self::Markdown(text.into())
    }

    /// Read a UTF-8 Markdown template from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::read_to_string(path)
            .map(Self::Markdown)
            .map_err(|e| Error::template(format!("cannot read {}: {}", path.display(), e)))
    }

    /// Read a template, falling back to [`Template::Default`] when the file
    /// cannot be used.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(template) => template,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Unusable notification template, using the built-in layout"
                );
                Self::Default
            }
        }
    }

    /// Render the body for `context`.
    pub fn render(&self, context: &NotificationContext) -> String {
        match self {
            Self::Default if context.record.is_success() => {
                expand_placeholders(DEFAULT_SUCCESS_LAYOUT, context)
            }
            Self::Default => expand_placeholders(DEFAULT_FAILURE_LAYOUT, context),
            Self::Markdown(text) => expand_placeholders(text, context),
        }
    }
}

fn is_brace(c: char) -> bool {
    c == '{' || c == '}'
}

/// Substitute `{name}` placeholders in `template`.
///
/// Substituted values are not scanned again, so braces inside an error
/// message or traceback come through untouched.
pub fn expand_placeholders(template: &str, context: &NotificationContext) -> String {
    let mut result = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(pos) = rest.find(is_brace) {
        result.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        // Escaped braces
        if tail.starts_with("{{") || tail.starts_with("}}") {
            result.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        // A lone closing brace is literal
        if tail.starts_with('}') {
            result.push('}');
            rest = &tail[1..];
            continue;
        }

        let inner = &tail[1..];
        match inner.find(is_brace) {
            Some(end) if inner[end..].starts_with('}') => {
                let name = &inner[..end];
                match context.value(name) {
                    Some(value) => result.push_str(&value),
                    // Unrecognized placeholder, keep it as written
                    None => result.push_str(&tail[..end + 2]),
                }
                rest = &inner[end + 1..];
            }
            // Unterminated, or another `{` opens first
            _ => {
                result.push('{');
                rest = inner;
            }
        }
    }

    result.push_str(rest);
    result
}
