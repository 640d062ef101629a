//! Error and diagnostic system for specification loading and rendering.
//!
//! This module provides:
//! - Error codes grouped by [`ErrorKind`]
//! - Labeled spans into named source files for rich error context
//! - Severity levels separating fatal errors from collected warnings
//! - A collector for accumulating many diagnostics in one pass
//!
//! # Overview
//!
//! A [`Diagnostic`] is a single error or warning with an optional error
//! code, source locations and help text. Fatal problems found while loading
//! are wrapped in [`LoadError`]; recoverable ones travel as warning
//! diagnostics next to the successful result.
//!
//! # Example
//!
//! ```
//! # use specdoc_schema::error::{Diagnostic, ErrorCode};
//!
//! let diag = Diagnostic::warning("type `core:TimeSeries` is defined twice")
//!     .with_code(ErrorCode::E200)
//!     .with_help("keep one definition or rename the second one");
//! assert!(diag.severity().is_warning());
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod load_error;

pub use collector::DiagnosticCollector;
pub use diagnostic::{Diagnostic, Label, Severity, SourceText};
pub use error_code::{ErrorCode, ErrorKind};
pub use load_error::LoadError;
