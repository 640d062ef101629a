//! Specdoc - documentation artifacts for HDMF/NWB format specifications.
//!
//! Hierarchy diagrams (SVG) and reStructuredText reference documents are
//! rendered from one normalized [`SpecCatalog`]. The [`DocBuilder`] offers
//! each stage on its own; [`Pipeline`] runs a whole batch into an output
//! directory.

pub mod color;
pub mod config;
pub mod export;
pub mod geometry;
pub mod hierarchy;
pub mod layout;
pub mod pipeline;
pub mod rst;

mod error;

pub use error::SpecdocError;
pub use pipeline::{
    ArtifactSelection, Pipeline, RunReport, RunRequest, RunState, sanitize_file_name,
};
pub use specdoc_schema::{Normalized, SpecCatalog, SpecSource, TypeKey};

use std::path::PathBuf;

use log::{debug, info, trace};

use specdoc_schema::{FileSystem, error::Diagnostic, load_catalog};

use config::AppConfig;
use export::svg::SvgBuilder;
use hierarchy::{TraversalOptions, build_hierarchy};
use layout::Engine;
use rst::{Generated, RstGenerator};

/// A rendered diagram plus the problems met while building it.
#[derive(Debug)]
pub struct RenderedDiagram {
    pub svg: String,
    pub warnings: Vec<Diagnostic>,
    pub unresolved: Vec<String>,
}

/// Builder for loading specifications and rendering their documentation.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::PathBuf;
///
/// use specdoc::{DocBuilder, config::AppConfig};
///
/// let builder = DocBuilder::new(AppConfig::default());
///
/// let normalized = builder
///     .load_files(&[PathBuf::from("spec/core.namespace.yaml")])
///     .expect("Failed to load");
///
/// let document = builder
///     .render_rst(&normalized.catalog, "core")
///     .expect("Namespace is not loaded");
/// println!("{}", document.to_rst());
/// ```
#[derive(Default)]
pub struct DocBuilder {
    config: AppConfig,
}

impl DocBuilder {
    /// Create a new builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Load and normalize namespace files read through `source`.
    ///
    /// # Errors
    ///
    /// Returns [`SpecdocError::Load`] carrying every fatal diagnostic of
    /// the loading and normalization phases.
    pub fn load<S: SpecSource + ?Sized>(
        &self,
        source: &S,
        namespace_files: &[PathBuf],
    ) -> Result<Normalized, SpecdocError> {
        info!(files = namespace_files.len(); "Loading specifications");
        let normalized = load_catalog(source, namespace_files, &self.config.catalog_options())?;
        debug!(
            types = normalized.catalog.len(),
            warnings = normalized.warnings.len();
            "Specifications normalized"
        );
        Ok(normalized)
    }

    /// Load and normalize namespace files from the file system.
    ///
    /// # Errors
    ///
    /// See [`DocBuilder::load`].
    pub fn load_files(&self, namespace_files: &[PathBuf]) -> Result<Normalized, SpecdocError> {
        self.load(&FileSystem, namespace_files)
    }

    /// Render the hierarchy diagram of `roots`.
    ///
    /// `home` is the namespace the diagram is about; types of other
    /// namespaces are drawn as external.
    ///
    /// # Errors
    ///
    /// Returns [`SpecdocError::Config`] for an invalid style and
    /// [`SpecdocError::Layout`] or [`SpecdocError::Export`] when the
    /// diagram cannot be drawn.
    pub fn render_hierarchy_svg(
        &self,
        catalog: &SpecCatalog,
        roots: &[TypeKey],
        home: Option<&str>,
    ) -> Result<RenderedDiagram, SpecdocError> {
        let exporter = SvgBuilder::new()
            .with_style(self.config.style())
            .build()
            .map_err(|err| SpecdocError::Config(err.to_string()))?;

        let options = TraversalOptions {
            max_depth: self.config.hierarchy().max_depth(),
            direction: self.config.hierarchy().direction(),
        };
        info!(roots = roots.len(); "Building hierarchy");
        let hierarchy = build_hierarchy(catalog, roots, home, options);
        trace!(graph:? = hierarchy.graph; "Render graph");

        let svg = pipeline::render_diagram(&hierarchy.graph, &Engine::new(), &exporter)?;
        info!("SVG rendered successfully");

        Ok(RenderedDiagram {
            svg,
            warnings: hierarchy.warnings,
            unresolved: hierarchy.unresolved,
        })
    }

    /// Generate the RST document of one namespace, or `None` when the
    /// namespace is not loaded.
    pub fn render_rst(&self, catalog: &SpecCatalog, namespace: &str) -> Option<Generated> {
        RstGenerator::new(catalog, self.config.rst()).generate_namespace(namespace)
    }

    /// Run a whole batch over files on disk.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run`].
    pub fn run(&self, request: &RunRequest) -> Result<RunReport, SpecdocError> {
        self.run_with(&FileSystem, request)
    }

    /// Run a whole batch over files read through `source`.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run`].
    pub fn run_with<S: SpecSource + ?Sized>(
        &self,
        source: &S,
        request: &RunRequest,
    ) -> Result<RunReport, SpecdocError> {
        Pipeline::new(source, &self.config).run(request)
    }
}
