//! Diagnostic types and message lookup for the binder.
//!
//! Message templates live in `data.rs`; `{0}`, `{1}`, ... placeholders are
//! filled from the diagnostic's argument list by [`format_message`].

use serde::Serialize;

use crate::span::Span;

mod data;
pub use data::{DIAGNOSTIC_MESSAGES, DiagnosticCode};

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

impl DiagnosticCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Suggestion => "suggestion",
            Self::Message => "message",
        }
    }
}

/// Where a diagnostic is anchored: the type being analysed, the syntax node
/// (raw node id) and its source span.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DiagnosticLocation {
    pub type_name: String,
    pub node: u32,
    pub span: Span,
}

impl DiagnosticLocation {
    #[must_use]
    pub fn new(type_name: impl Into<String>, node: u32, span: Span) -> Self {
        Self {
            type_name: type_name.into(),
            node,
            span,
        }
    }
}

/// Related information for a diagnostic (e.g., the parameter declaration).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub location: DiagnosticLocation,
    pub message_text: String,
    pub category: DiagnosticCategory,
}

/// A binder diagnostic: `(Severity, Code, Location, Message, Arguments)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: DiagnosticCode,
    pub location: DiagnosticLocation,
    pub message_text: String,
    pub arguments: Vec<String>,
    /// Related information spans (e.g., where a parameter was declared)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Create a diagnostic for `code`, formatting its template with `args`.
    ///
    /// The category comes from the message table, so callers never pick
    /// severity by hand.
    #[must_use]
    pub fn new(code: DiagnosticCode, location: DiagnosticLocation, args: &[&str]) -> Self {
        let message = code.message();
        Self {
            category: message.category,
            code,
            location,
            message_text: format_message(message.message, args),
            arguments: args.iter().map(|arg| (*arg).to_string()).collect(),
            related_information: Vec::new(),
        }
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(mut self, location: DiagnosticLocation, message: impl Into<String>) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            location,
            message_text: message.into(),
            category: DiagnosticCategory::Message,
        });
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    /// Deterministic ordering key: type, position, node, code, arguments.
    #[must_use]
    pub fn sort_key(&self) -> (&str, Span, u32, DiagnosticCode, &[String]) {
        (
            self.location.type_name.as_str(),
            self.location.span,
            self.location.node,
            self.code,
            self.arguments.as_slice(),
        )
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: DiagnosticCode,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_has_exactly_one_message() {
        for message in DIAGNOSTIC_MESSAGES {
            let count = DIAGNOSTIC_MESSAGES
                .iter()
                .filter(|other| other.code == message.code)
                .count();
            assert_eq!(count, 1, "duplicate entry for {:?}", message.code);
        }
    }

    #[test]
    fn new_formats_arguments_and_takes_category_from_table() {
        let diag = Diagnostic::new(
            DiagnosticCode::UnreadPrimaryConstructorParameter,
            DiagnosticLocation::default(),
            &["x"],
        );
        assert_eq!(diag.category, DiagnosticCategory::Warning);
        assert_eq!(
            diag.message_text,
            "Parameter 'x' is unread. Did you forget to use it to initialize the property with that name?"
        );
        assert_eq!(diag.arguments, vec!["x".to_string()]);
    }
}
