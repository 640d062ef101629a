//! Command-line argument definitions for the specdoc CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the namespace files, the diagram roots
//! and the output directory, plus configuration and logging.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use specdoc::ArtifactSelection;

/// Artifacts to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Only {
    Diagrams,
    Rst,
    #[default]
    All,
}

impl From<Only> for ArtifactSelection {
    fn from(only: Only) -> Self {
        match only {
            Only::Diagrams => ArtifactSelection::Diagrams,
            Only::Rst => ArtifactSelection::Rst,
            Only::All => ArtifactSelection::All,
        }
    }
}

/// Command-line arguments for the specdoc documentation tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Namespace files to load
    #[arg(required = true, value_name = "NAMESPACE_FILE")]
    pub namespace_files: Vec<String>,

    /// Directory the namespace files are resolved in
    #[arg(short, long, value_name = "DIR")]
    pub spec_dir: Option<String>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = "specdoc-out")]
    pub output: String,

    /// Restrict output to this namespace
    #[arg(short, long, value_name = "NAME")]
    pub namespace: Option<String>,

    /// Diagram root type, `ns:Name` allowed (repeatable)
    #[arg(short, long = "root", value_name = "TYPE")]
    pub roots: Vec<String>,

    /// Traversal depth limit, overrides the configuration file
    #[arg(short = 'd', long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Artifacts to produce
    #[arg(long, value_enum, default_value_t = Only::All)]
    pub only: Only,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Namespace file paths, joined to `--spec-dir` when given.
    pub fn namespace_paths(&self) -> Vec<PathBuf> {
        self.namespace_files
            .iter()
            .map(|file| match &self.spec_dir {
                Some(dir) => PathBuf::from(dir).join(file),
                None => PathBuf::from(file),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["specdoc", "core.namespace.yaml"]);

        assert_eq!(args.output, "specdoc-out");
        assert_eq!(args.only, Only::All);
        assert!(args.roots.is_empty());
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_repeated_roots_and_spec_dir() {
        let args = Args::parse_from([
            "specdoc",
            "-s",
            "schema",
            "-r",
            "TimeSeries",
            "--root",
            "core:Image",
            "--only",
            "diagrams",
            "-d",
            "2",
            "core.namespace.yaml",
        ]);

        assert_eq!(args.roots, vec!["TimeSeries", "core:Image"]);
        assert_eq!(args.only, Only::Diagrams);
        assert_eq!(args.max_depth, Some(2));
        assert_eq!(
            args.namespace_paths(),
            vec![PathBuf::from("schema").join("core.namespace.yaml")]
        );
    }

    #[test]
    fn test_namespace_file_is_required() {
        assert!(Args::try_parse_from(["specdoc"]).is_err());
    }
}
