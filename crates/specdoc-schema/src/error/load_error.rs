//! The LoadError type for fatal specification problems.
//!
//! [`LoadError`] wraps one or more [`Diagnostic`]s produced while reading,
//! parsing or normalizing the specification input.

use std::fmt;

use crate::error::Diagnostic;

/// Fatal error of the loading and normalization phases.
#[derive(Debug)]
pub struct LoadError {
    diagnostics: Vec<Diagnostic>,
}

impl LoadError {
    /// Create a new load error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{}", first)?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for LoadError {}

impl From<Diagnostic> for LoadError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for LoadError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_load_error_from_diagnostic() {
        let err: LoadError = Diagnostic::error("bad").with_code(ErrorCode::E003).into();

        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E003));
    }

    #[test]
    fn test_load_error_display_multiple() {
        let err: LoadError = vec![
            Diagnostic::error("first error"),
            Diagnostic::error("second error"),
        ]
        .into();

        assert_eq!(err.to_string(), "error: first error (+1 more)");
    }
}
