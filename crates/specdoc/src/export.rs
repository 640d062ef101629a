//! Artifact export.
//!
//! Exporters turn a laid out render graph into artifact text; writing the
//! text to the output directory is shared by every artifact kind.

pub mod svg;

use std::{fs, path::Path};

use log::{error, info};

use crate::{hierarchy::RenderGraph, layout::DiagramLayout};

/// A diagram output format.
pub trait Exporter {
    /// Render one diagram into the text of an artifact.
    fn export_hierarchy(&self, graph: &RenderGraph, layout: &DiagramLayout)
    -> Result<String, Error>;
}

/// Errors raised while exporting or writing an artifact.
#[derive(Debug)]
pub enum Error {
    /// The exporter could not render the diagram.
    Render(String),
    /// The artifact could not be written to disk.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}

/// Write an artifact, replacing any existing file at `path`.
pub fn write_artifact(path: &Path, contents: &str) -> Result<(), Error> {
    let file_name = path.display().to_string();
    info!(file_name = file_name; "Writing artifact");

    if let Err(err) = fs::write(path, contents) {
        error!(file_name = file_name, err:err; "Failed to write artifact");
        return Err(Error::Io(err));
    }

    Ok(())
}
