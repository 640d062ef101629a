//! Specdoc CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info, warn};
use miette::GraphicalReportHandler;

use specdoc_cli::{
    Args,
    error_adapter::{DiagnosticAdapter, to_reportables},
    summary,
};

fn render<D: miette::Diagnostic>(reporter: &GraphicalReportHandler, diagnostic: &D) -> String {
    let mut writer = String::new();
    reporter
        .render_report(&mut writer, diagnostic)
        .expect("Writing to String buffer is infallible");
    writer
}

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting specdoc");
    debug!(args:?; "Parsed arguments");

    let reporter = GraphicalReportHandler::new();
    match specdoc_cli::run(&args) {
        Ok(report) => {
            for warning in report.warnings() {
                warn!("{}", render(&reporter, &DiagnosticAdapter::new(warning)));
            }
            for line in summary(&report) {
                warn!("{line}");
            }
            info!("Completed successfully");
        }
        Err(err) => {
            for reportable in to_reportables(&err) {
                error!("{}", render(&reporter, &reportable));
            }
            process::exit(1);
        }
    }
}
