//! Diagnostic records handed from the checker to the driver.
//!
//! The solver decides *what* failed; rendering and file bookkeeping belong
//! to the driver. These records are the serialized boundary between them.

use crate::span::Span;
use serde::Serialize;

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Message = 2,
}

/// A located diagnostic with a rendered message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub span: Span,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub fn error(span: Span, message: impl Into<String>, code: u32) -> Self {
        Self {
            span,
            message_text: message.into(),
            category: DiagnosticCategory::Error,
            code,
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

/// Format a message template by replacing `{0}`, `{1}`, ... with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}
