//! Collector for accumulating diagnostics during a processing phase.
//!
//! The [`DiagnosticCollector`] lets a phase report every problem it finds
//! instead of failing on the first one.

use crate::error::{Diagnostic, LoadError};

/// A collector for accumulating diagnostics during a processing phase.
///
/// # Example
///
/// ```
/// # use specdoc_schema::error::{Diagnostic, DiagnosticCollector, ErrorCode};
///
/// let mut collector = DiagnosticCollector::new();
/// collector.emit(Diagnostic::warning("unresolved type `Foo`").with_code(ErrorCode::E100));
///
/// let warnings = collector.finish().expect("warnings are not fatal");
/// assert_eq!(warnings.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Finish collection.
    ///
    /// - If there are errors, returns `Err(LoadError)` with all diagnostics.
    /// - Otherwise returns the collected warnings.
    pub fn finish(self) -> Result<Vec<Diagnostic>, LoadError> {
        if self.has_errors {
            Err(LoadError::new(self.diagnostics))
        } else {
            Ok(self.diagnostics)
        }
    }
}
