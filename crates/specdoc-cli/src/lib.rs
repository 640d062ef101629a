//! CLI logic for the specdoc documentation tool.
//!
//! This module contains the core CLI logic: configuration loading, one
//! documentation run, and the end-of-run summary.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Only};
pub use config::{ConfigError, LOCAL_CONFIG, load_config};

use log::info;

use specdoc::{DocBuilder, RunReport, RunRequest, SpecdocError};

/// Run the specdoc CLI application
///
/// This function loads the namespace files named in `args`, renders the
/// selected artifacts into the output directory and returns the report
/// of the run.
///
/// # Errors
///
/// Returns `SpecdocError` for:
/// - Configuration loading errors
/// - Unreadable or malformed specification files
/// - Missing namespaces and inheritance cycles
/// - An output directory that cannot be created
pub fn run(args: &Args) -> Result<RunReport, SpecdocError> {
    info!(
        namespace_files = args.namespace_files.len(),
        output_dir = args.output;
        "Processing specifications"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(max_depth) = args.max_depth {
        app_config.hierarchy_mut().set_max_depth(Some(max_depth));
    }

    let request = RunRequest::new(args.namespace_paths(), &args.output)
        .with_namespace(args.namespace.clone())
        .with_roots(args.roots.clone())
        .with_only(args.only.into());

    let report = DocBuilder::new(app_config).run(&request)?;

    info!(
        artifacts = report.artifacts().len(),
        output_dir = args.output;
        "Documentation written"
    );

    Ok(report)
}

/// Lines summarizing the problems of a completed run, empty when there
/// were none.
pub fn summary(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.warnings().is_empty() {
        lines.push(format!(
            "{} warning(s), {} artifact(s) written",
            report.warnings().len(),
            report.artifacts().len()
        ));
    }
    if !report.unresolved().is_empty() {
        lines.push(format!("unresolved: {}", report.unresolved().join(", ")));
    }
    if !report.collisions().is_empty() {
        lines.push(format!("collisions: {}", report.collisions().len()));
        lines.extend(report.collisions().iter().map(|message| format!("  {message}")));
    }
    lines
}
