//! Error types for specdoc operations.
//!
//! [`SpecdocError`] is returned for failures that end a run. Problems that
//! only skip one artifact are reported as warnings in the run report.

use std::io;

use thiserror::Error;

use specdoc_schema::error::LoadError;

use crate::{export, layout::LayoutError};

/// The main error type for specdoc operations.
///
/// The `Load` variant carries the diagnostics of every fatal problem found
/// while reading the specifications, with source spans where available.
#[derive(Debug, Error)]
pub enum SpecdocError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Export error: {0}")]
    Export(#[from] export::Error),
}
