//! One documentation run over a set of namespace files.
//!
//! A run moves through [`RunState`]s: the specifications are loaded and
//! normalized, then diagrams and documents are rendered into the output
//! directory. Fatal problems stop the run before anything is written.
//! Everything else is collected into the [`RunReport`] and the batch goes
//! on with the next artifact.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};

use specdoc_schema::{
    SpecCatalog, SpecSource, TypeKey,
    error::{Diagnostic, ErrorCode, LoadError},
    load,
};

use crate::{
    config::{AppConfig, DuplicateRoots},
    error::SpecdocError,
    export::{self, Exporter, svg::Svg, svg::SvgBuilder},
    hierarchy::{
        Hierarchy, RenderGraph, TraversalOptions, build_hierarchy, build_namespace_hierarchy,
        resolve_root,
    },
    layout::Engine,
    rst::RstGenerator,
};

/// Progress of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    Loading,
    Normalizing,
    Rendering,
    Done,
    Failed,
}

/// Which artifacts a run produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArtifactSelection {
    Diagrams,
    Rst,
    #[default]
    All,
}

impl ArtifactSelection {
    pub fn diagrams(self) -> bool {
        matches!(self, ArtifactSelection::Diagrams | ArtifactSelection::All)
    }

    pub fn rst(self) -> bool {
        matches!(self, ArtifactSelection::Rst | ArtifactSelection::All)
    }
}

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    namespace_files: Vec<PathBuf>,
    output_dir: PathBuf,
    namespace: Option<String>,
    roots: Vec<String>,
    only: ArtifactSelection,
}

impl RunRequest {
    pub fn new(namespace_files: Vec<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            namespace_files,
            output_dir: output_dir.into(),
            namespace: None,
            roots: Vec::new(),
            only: ArtifactSelection::default(),
        }
    }

    /// Restrict output to one namespace.
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Diagram roots; without roots one diagram per namespace is drawn.
    pub fn with_roots(mut self, roots: Vec<String>) -> Self {
        self.roots = roots;
        self
    }

    pub fn with_only(mut self, only: ArtifactSelection) -> Self {
        self.only = only;
        self
    }

    pub fn namespace_files(&self) -> &[PathBuf] {
        &self.namespace_files
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Outcome of a completed run.
#[derive(Debug, Default)]
pub struct RunReport {
    state: RunState,
    artifacts: Vec<PathBuf>,
    warnings: Vec<Diagnostic>,
    unresolved: Vec<String>,
    collisions: Vec<String>,
    seen_warnings: HashSet<(Option<ErrorCode>, String)>,
}

impl RunReport {
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Files written, in the order they were written.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Every warning of the run, once each.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Type names that could not be resolved, in the order first met.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// Messages of the name collisions found during normalization.
    pub fn collisions(&self) -> &[String] {
        &self.collisions
    }

    fn warn(&mut self, diagnostic: Diagnostic) {
        let identity = diagnostic.subject().unwrap_or(diagnostic.message());
        let key = (diagnostic.code(), identity.to_string());
        if !self.seen_warnings.insert(key) {
            return;
        }
        if diagnostic.code() == Some(ErrorCode::E200) {
            self.collisions.push(diagnostic.message().to_string());
        }
        let code = diagnostic.code().map(|code| code.as_str()).unwrap_or_default();
        debug!(code = code; "{}", diagnostic.message());
        self.warnings.push(diagnostic);
    }

    fn unresolved_name(&mut self, name: &str) {
        if !self.unresolved.iter().any(|known| known == name) {
            self.unresolved.push(name.to_string());
        }
    }

    fn absorb(&mut self, warnings: Vec<Diagnostic>, unresolved: &[String]) {
        for warning in warnings {
            self.warn(warning);
        }
        for name in unresolved {
            self.unresolved_name(name);
        }
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

/// Lay out and export one render graph.
pub(crate) fn render_diagram(
    graph: &RenderGraph,
    engine: &Engine,
    exporter: &Svg,
) -> Result<String, SpecdocError> {
    let layout = engine.layout(graph)?;
    Ok(exporter.export_hierarchy(graph, &layout)?)
}

/// A documentation run bound to a source of specification files.
pub struct Pipeline<'a, S: SpecSource + ?Sized> {
    source: &'a S,
    config: &'a AppConfig,
    state: RunState,
}

impl<'a, S: SpecSource + ?Sized> Pipeline<'a, S> {
    pub fn new(source: &'a S, config: &'a AppConfig) -> Self {
        Self {
            source,
            config,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run the whole batch.
    ///
    /// # Errors
    ///
    /// Returns an error when the specifications cannot be loaded, the
    /// namespace filter names no loaded namespace, the style configuration
    /// is invalid or the output directory cannot be created. No artifact is
    /// written in these cases.
    pub fn run(&mut self, request: &RunRequest) -> Result<RunReport, SpecdocError> {
        let result = self.execute(request);
        self.state = if result.is_ok() {
            RunState::Done
        } else {
            RunState::Failed
        };
        result.map(|mut report| {
            report.state = RunState::Done;
            info!(
                artifacts = report.artifacts.len(),
                warnings = report.warnings.len();
                "Run finished"
            );
            report
        })
    }

    fn execute(&mut self, request: &RunRequest) -> Result<RunReport, SpecdocError> {
        let mut report = RunReport::default();

        let exporter = SvgBuilder::new()
            .with_style(self.config.style())
            .build()
            .map_err(|err| SpecdocError::Config(err.to_string()))?;

        self.state = RunState::Loading;
        info!(files = request.namespace_files.len(); "Loading specifications");
        let specs = load(self.source, &request.namespace_files)?;

        self.state = RunState::Normalizing;
        let normalized = SpecCatalog::build(specs, &self.config.catalog_options())?;
        let catalog = normalized.catalog;
        for warning in normalized.warnings {
            report.warn(warning);
        }

        if let Some(namespace) = &request.namespace {
            if catalog.namespace(namespace).is_none() {
                return Err(LoadError::from(
                    Diagnostic::error(format!("namespace `{namespace}` is not loaded"))
                        .with_code(ErrorCode::E004),
                )
                .into());
            }
        }
        fs::create_dir_all(&request.output_dir)?;

        self.state = RunState::Rendering;
        let mut rendering = Rendering {
            catalog: &catalog,
            config: self.config,
            request,
            exporter,
            engine: Engine::new(),
            written: HashMap::new(),
            report: &mut report,
        };
        if request.only.diagrams() {
            rendering.diagrams();
        }
        if request.only.rst() {
            rendering.documents();
        }

        Ok(report)
    }
}

/// Rendering stage of a run.
struct Rendering<'r> {
    catalog: &'r SpecCatalog,
    config: &'r AppConfig,
    request: &'r RunRequest,
    exporter: Svg,
    engine: Engine,
    /// Artifacts of this run by path, with what they were written for.
    written: HashMap<PathBuf, String>,
    report: &'r mut RunReport,
}

impl Rendering<'_> {
    fn traversal(&self) -> TraversalOptions {
        TraversalOptions {
            max_depth: self.config.hierarchy().max_depth(),
            direction: self.config.hierarchy().direction(),
        }
    }

    /// Namespaces selected by the request, in load order.
    fn namespaces(&self) -> Vec<String> {
        match &self.request.namespace {
            Some(namespace) => vec![namespace.clone()],
            None => self
                .catalog
                .namespaces()
                .map(|namespace| namespace.name.clone())
                .collect(),
        }
    }

    fn diagrams(&mut self) {
        if self.request.roots.is_empty() {
            for namespace in self.namespaces() {
                let hierarchy =
                    build_namespace_hierarchy(self.catalog, &namespace, self.traversal());
                if hierarchy.graph.is_empty() {
                    debug!(namespace = namespace; "Namespace defines no types");
                    continue;
                }
                let file = format!("namespace_{}.svg", sanitize_file_name(&namespace));
                self.diagram(hierarchy, &file, &format!("namespace `{namespace}`"));
            }
            return;
        }

        let request = self.request;
        let scope = request.namespace.as_deref();
        for root in &request.roots {
            let key: TypeKey = match resolve_root(self.catalog, root, scope) {
                Ok(key) => key.clone(),
                Err(diagnostic) => {
                    self.report.warn(diagnostic);
                    self.report.unresolved_name(root);
                    continue;
                }
            };
            info!(root = key.to_string(); "Rendering hierarchy diagram");
            let hierarchy = build_hierarchy(
                self.catalog,
                std::slice::from_ref(&key),
                Some(key.namespace()),
                self.traversal(),
            );
            let file = format!("{}.svg", sanitize_file_name(key.name()));
            self.diagram(hierarchy, &file, &format!("`{key}`"));
        }
    }

    fn diagram(&mut self, mut hierarchy: Hierarchy, file: &str, subject: &str) {
        let Some(path) = self.claim(file, subject) else {
            return;
        };
        let warnings = std::mem::take(&mut hierarchy.warnings);
        self.report.absorb(warnings, &hierarchy.unresolved);

        match render_diagram(&hierarchy.graph, &self.engine, &self.exporter) {
            Ok(svg) => self.write(path, &svg),
            Err(err) => self.report.warn(
                Diagnostic::warning(format!("cannot render diagram for {subject}: {err}"))
                    .with_code(ErrorCode::E300),
            ),
        }
    }

    fn documents(&mut self) {
        let config = self.config;
        let generator = RstGenerator::new(self.catalog, config.rst());
        for namespace in self.namespaces() {
            let Some(generated) = generator.generate_namespace(&namespace) else {
                continue;
            };
            let file = format!("{}.rst", sanitize_file_name(&namespace));
            let Some(path) = self.claim(&file, &format!("namespace `{namespace}`")) else {
                continue;
            };
            let text = generated.to_rst();
            self.report.absorb(generated.warnings, &generated.unresolved);
            self.write(path, &text);
        }
    }

    /// Reserve an output path, applying the duplicate root policy when the
    /// path was already written in this run.
    fn claim(&mut self, file: &str, subject: &str) -> Option<PathBuf> {
        let path = self.request.output_dir.join(file);
        if let Some(previous) = self.written.get(&path) {
            match self.config.hierarchy().duplicate_roots() {
                DuplicateRoots::Skip => {
                    self.report.warn(
                        Diagnostic::warning(format!(
                            "skipping {subject}: `{file}` was already written for {previous}"
                        ))
                        .with_code(ErrorCode::E201)
                        .with_help("set `hierarchy.duplicate_roots = \"overwrite\"` to replace it"),
                    );
                    return None;
                }
                DuplicateRoots::Overwrite => {
                    debug!(file = file; "Overwriting artifact of this run");
                }
            }
        }
        self.written.insert(path.clone(), subject.to_string());
        Some(path)
    }

    fn write(&mut self, path: PathBuf, contents: &str) {
        match export::write_artifact(&path, contents) {
            Ok(()) => {
                if !self.report.artifacts.contains(&path) {
                    self.report.artifacts.push(path);
                }
            }
            Err(err) => self.report.warn(
                Diagnostic::warning(format!("cannot write `{}`: {err}", path.display()))
                    .with_code(ErrorCode::E301),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use specdoc_schema::InMemory;

    use super::*;

    fn files() -> InMemory {
        InMemory::new()
            .with_file(
                "core.namespace.yaml",
                "namespaces:\n- name: core\n  schema:\n  - source: core.yaml\n",
            )
            .with_file(
                "core.yaml",
                "groups:\n- data_type_def: A\n- data_type_def: B\n  data_type_inc: A\n",
            )
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Time Series/v2"), "Time_Series_v2");
        assert_eq!(sanitize_file_name("ok-name_1"), "ok-name_1");
        assert_eq!(sanitize_file_name(""), "_");
    }

    #[test]
    fn test_selection_flags() {
        assert!(ArtifactSelection::All.diagrams() && ArtifactSelection::All.rst());
        assert!(!ArtifactSelection::Rst.diagrams());
        assert!(!ArtifactSelection::Diagrams.rst());
    }

    #[test]
    fn test_run_reaches_done() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default();
        let files = files();
        let mut pipeline = Pipeline::new(&files, &config);
        let request = RunRequest::new(vec![PathBuf::from("core.namespace.yaml")], dir.path());

        let report = pipeline.run(&request).unwrap();

        assert_eq!(pipeline.state(), RunState::Done);
        assert_eq!(report.state(), RunState::Done);
        let names: Vec<String> = report
            .artifacts()
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["namespace_core.svg", "core.rst"]);
    }

    #[test]
    fn test_unknown_namespace_filter_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let config = AppConfig::default();
        let files = files();
        let mut pipeline = Pipeline::new(&files, &config);
        let request = RunRequest::new(vec![PathBuf::from("core.namespace.yaml")], &output)
            .with_namespace(Some("other".to_string()));

        let err = pipeline.run(&request).unwrap_err();

        assert!(matches!(err, SpecdocError::Load(_)));
        assert_eq!(pipeline.state(), RunState::Failed);
        assert!(!output.exists());
    }

    #[test]
    fn test_invalid_style_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config: AppConfig = toml::from_str("[style]\ngroup_color = \"nope\"\n").unwrap();
        let files = files();
        let mut pipeline = Pipeline::new(&files, &config);
        let request = RunRequest::new(vec![PathBuf::from("core.namespace.yaml")], dir.path());

        assert!(matches!(pipeline.run(&request), Err(SpecdocError::Config(_))));
    }

    #[test]
    fn test_report_dedups_warnings() {
        let mut report = RunReport::default();
        let warning = Diagnostic::warning("unresolved type `X` referenced by `core:A`")
            .with_code(ErrorCode::E100);

        report.warn(warning.clone());
        report.warn(warning);
        report.unresolved_name("X");
        report.unresolved_name("X");

        assert_eq!(report.warnings().len(), 1);
        assert_eq!(report.unresolved(), ["X".to_string()]);
    }

    #[test]
    fn test_report_dedups_unresolved_name_across_owners() {
        let mut report = RunReport::default();
        for owner in ["core:Z", "core:A"] {
            report.warn(
                Diagnostic::warning(format!("unresolved type `Ghost` referenced by `{owner}`"))
                    .with_code(ErrorCode::E100)
                    .with_subject("Ghost"),
            );
        }
        report.warn(
            Diagnostic::warning("unresolved type `Other` referenced by `core:A`")
                .with_code(ErrorCode::E100)
                .with_subject("Other"),
        );

        let messages: Vec<&str> = report.warnings().iter().map(Diagnostic::message).collect();
        assert_eq!(
            messages,
            [
                "unresolved type `Ghost` referenced by `core:Z`",
                "unresolved type `Other` referenced by `core:A`",
            ]
        );
    }
}
