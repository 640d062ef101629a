//! The core diagnostic type.
//!
//! A [`Diagnostic`] represents a single error or warning with optional
//! error code, labeled spans into one named source file, and help text.

use std::{fmt, sync::Arc};

use crate::{
    error::{ErrorCode, ErrorKind},
    span::Span,
};

/// Whether a diagnostic stops the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Fatal: nothing is rendered.
    Error,
    /// Collected and reported when the run completes.
    Warning,
}

impl Severity {
    /// Returns `true` for [`Severity::Error`].
    pub fn is_error(&self) -> bool {
        *self == Severity::Error
    }

    /// Returns `true` for [`Severity::Warning`].
    pub fn is_warning(&self) -> bool {
        *self == Severity::Warning
    }

    /// Lowercase name, as shown before a diagnostic message.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message attached to a span of the diagnostic's source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    span: Span,
    message: String,
}

impl Label {
    /// Byte range the label points at.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Text shown at the span.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The text of a source file a diagnostic points into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    name: String,
    text: Arc<str>,
}

impl SourceText {
    /// Create a named source text.
    pub fn new(name: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// The display name of the file, usually its path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full file contents.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A rich diagnostic message with optional source location information.
///
/// # Example
///
/// ```text
/// error[E002]: YAML syntax error in `core.base.yaml`
///   --> core.base.yaml:4:9
///    |
///  4 |   doc: [unterminated
///    |         ^ did not find expected ',' or ']'
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
    source: Option<SourceText>,
    subject: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use specdoc_schema::error::{Diagnostic, ErrorCode};
    ///
    /// let diag = Diagnostic::error("namespace `hdmf-common` is not loaded")
    ///     .with_code(ErrorCode::E004)
    ///     .with_help("pass the namespace file that declares it");
    /// assert_eq!(diag.code(), Some(ErrorCode::E004));
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the kind of error, derived from the code.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.code.map(|code| code.kind())
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Get the source file the labels point into, if any.
    pub fn source(&self) -> Option<&SourceText> {
        self.source.as_ref()
    }

    /// The name this diagnostic is about, such as an unresolved type.
    ///
    /// Reports about the same subject under one code are duplicates even
    /// when their messages differ.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Point at a span of the source file. The first label marks the
    /// main location.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
        });
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Set the name this diagnostic is about.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Attach the source file the labels point into.
    pub fn with_source(mut self, source: SourceText) -> Self {
        self.source = Some(source);
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
            source: None,
            subject: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "warning[E100]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::new(Severity::Error, "test error");

        assert!(diag.severity().is_error());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.kind().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
        assert!(diag.source().is_none());
        assert!(diag.subject().is_none());
    }

    #[test]
    fn test_diagnostic_kind_follows_code() {
        let diag = Diagnostic::warning("missing").with_code(ErrorCode::E100);

        assert_eq!(diag.kind(), Some(ErrorKind::Resolution));
    }

    #[test]
    fn test_diagnostic_with_source_and_label() {
        let diag = Diagnostic::error("bad yaml")
            .with_code(ErrorCode::E002)
            .with_label(Span::new(2..3), "here")
            .with_source(SourceText::new("a.yaml", "a: [\n"));

        assert_eq!(diag.labels().len(), 1);
        assert_eq!(diag.labels()[0].span(), Span::new(2..3));
        assert_eq!(diag.labels()[0].message(), "here");
        assert_eq!(diag.source().map(SourceText::name), Some("a.yaml"));
        assert_eq!(diag.source().map(SourceText::text), Some("a: [\n"));
    }

    #[test]
    fn test_diagnostic_subject_is_not_displayed() {
        let diag = Diagnostic::warning("unresolved type `Foo` referenced by `core:A`")
            .with_code(ErrorCode::E100)
            .with_subject("Foo");

        assert_eq!(diag.subject(), Some("Foo"));
        assert_eq!(
            diag.to_string(),
            "warning[E100]: unresolved type `Foo` referenced by `core:A`"
        );
    }

    #[test]
    fn test_diagnostic_display_with_code() {
        let diag = Diagnostic::warning("unresolved type `Foo`").with_code(ErrorCode::E100);

        assert_eq!(diag.to_string(), "warning[E100]: unresolved type `Foo`");
    }

    #[test]
    fn test_severity_display() {
        assert!(Diagnostic::warning("w").severity().is_warning());
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn test_diagnostic_display_without_code() {
        let diag = Diagnostic::error("cannot continue");

        assert_eq!(diag.to_string(), "error: cannot continue");
    }
}
