//! Reading namespace and schema source files into model types.
//!
//! The loader reports every problem it finds through a
//! [`DiagnosticCollector`]; any error diagnostic makes the whole load fail
//! with a [`LoadError`]. Cross references are left unresolved here.

use std::{
    collections::{HashMap, HashSet},
    io,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde_yaml::Value;

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, LoadError, SourceText},
    model::{
        CompoundField, DataType, FieldEntry, Namespace, NodeKind, Quantity, SourceSection,
        TypeKey, TypeNode, TypeRef,
    },
    raw::{
        RawAttribute, RawDType, RawLink, RawNamespace, RawNamespaceFile, RawQuantity,
        RawSchemaEntry, RawSourceFile, RawSpec, display_value,
    },
    span::Span,
};

/// Where specification files are read from.
pub trait SpecSource {
    /// Read the whole file at `path` as UTF-8 text.
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Reads specification files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystem;

impl SpecSource for FileSystem {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// An in-memory file map, mainly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct InMemory {
    files: HashMap<PathBuf, String>,
}

impl InMemory {
    /// Create an empty file map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous content at the same path.
    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }
}

impl SpecSource for InMemory {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }
}

/// Everything read from the input files, before normalization.
#[derive(Debug, Default)]
pub struct LoadedSpecs {
    /// Namespaces in file order. The same name may appear more than once.
    pub namespaces: Vec<Namespace>,
    /// Type definitions in load order, inline definitions after their owner.
    pub types: Vec<TypeNode>,
}

/// Load the given namespace files and every schema source they list.
///
/// The load fails if any file cannot be read or parsed, if a spec is
/// malformed, or if an imported namespace is not among the loaded ones.
pub fn load<S: SpecSource + ?Sized>(
    source: &S,
    namespace_files: &[PathBuf],
) -> Result<LoadedSpecs, LoadError> {
    let mut loader = Loader {
        source,
        collector: DiagnosticCollector::new(),
        specs: LoadedSpecs::default(),
    };

    for file in namespace_files {
        loader.load_namespace_file(file);
    }
    loader.check_imports();

    let Loader {
        collector, specs, ..
    } = loader;
    collector.finish()?;

    info!(
        namespaces = specs.namespaces.len(),
        types = specs.types.len();
        "Specifications loaded"
    );
    Ok(specs)
}

struct Loader<'a, S: ?Sized> {
    source: &'a S,
    collector: DiagnosticCollector,
    specs: LoadedSpecs,
}

impl<S: SpecSource + ?Sized> Loader<'_, S> {
    fn load_namespace_file(&mut self, path: &Path) {
        let origin = path.display().to_string();
        debug!(path = origin; "Reading namespace file");

        let Some(value) = self.read_yaml(path) else {
            return;
        };
        let raw: RawNamespaceFile = match serde_yaml::from_value(value) {
            Ok(raw) => raw,
            Err(err) => {
                self.collector.emit(invalid_structure(&origin, &err));
                return;
            }
        };

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for namespace in raw.namespaces {
            self.load_namespace(namespace, base, &origin);
        }
    }

    fn load_namespace(&mut self, raw: RawNamespace, base: &Path, origin: &str) {
        let mut namespace = Namespace {
            name: raw.name,
            full_name: raw.full_name,
            doc: raw.doc,
            version: raw.version.as_ref().map(display_value),
            date: raw.date.as_ref().map(display_value),
            authors: raw.author.into_vec(),
            contacts: raw.contact.into_vec(),
            imports: Vec::new(),
            sources: Vec::new(),
            types: Vec::new(),
            origin: origin.to_string(),
        };

        for entry in raw.schema {
            match entry {
                RawSchemaEntry::Import { namespace: import } => {
                    if !namespace.imports.contains(&import) {
                        namespace.imports.push(import);
                    }
                }
                RawSchemaEntry::Source { source, title, doc } => {
                    self.load_source(&namespace.name, &base.join(&source), &source, origin);
                    namespace.sources.push(SourceSection {
                        file: source,
                        title,
                        doc,
                        types: Vec::new(),
                    });
                }
            }
        }

        debug!(
            namespace = namespace.name,
            sources = namespace.sources.len();
            "Namespace read"
        );
        self.specs.namespaces.push(namespace);
    }

    fn load_source(&mut self, namespace: &str, path: &Path, source: &str, origin: &str) {
        let Some(value) = self.read_yaml(path) else {
            return;
        };
        let file = path.display().to_string();
        let raw: RawSourceFile = if value.is_null() {
            RawSourceFile::default()
        } else {
            match serde_yaml::from_value(value) {
                Ok(raw) => raw,
                Err(err) => {
                    self.collector.emit(invalid_structure(&file, &err));
                    return;
                }
            }
        };

        let context = SourceContext {
            namespace,
            source,
            origin,
            file: &file,
        };
        let specs = raw
            .groups
            .into_iter()
            .map(|value| (value, NodeKind::Group))
            .chain(raw.datasets.into_iter().map(|value| (value, NodeKind::Dataset)));

        for (value, kind) in specs {
            match context.top_level_type(value, kind) {
                Ok(types) => self.specs.types.extend(types),
                Err(diagnostic) => self.collector.emit(diagnostic),
            }
        }
    }

    fn read_yaml(&mut self, path: &Path) -> Option<Value> {
        let name = path.display().to_string();
        let text = match self.source.read(path) {
            Ok(text) => text,
            Err(err) => {
                self.collector.emit(
                    Diagnostic::error(format!("cannot read `{name}`: {err}"))
                        .with_code(ErrorCode::E001),
                );
                return None;
            }
        };

        match serde_yaml::from_str::<Value>(&text) {
            Ok(value) => Some(value),
            Err(err) => {
                let mut diagnostic = Diagnostic::error(format!("YAML syntax error in `{name}`"))
                    .with_code(ErrorCode::E002);
                match err.location() {
                    Some(location) => {
                        let span = Span::at(location.index(), &text);
                        diagnostic = diagnostic
                            .with_label(span, err.to_string())
                            .with_source(SourceText::new(name, text));
                    }
                    None => diagnostic = diagnostic.with_help(err.to_string()),
                }
                self.collector.emit(diagnostic);
                None
            }
        }
    }

    fn check_imports(&mut self) {
        let known: HashSet<&str> = self
            .specs
            .namespaces
            .iter()
            .map(|namespace| namespace.name.as_str())
            .collect();

        for namespace in &self.specs.namespaces {
            for import in &namespace.imports {
                if !known.contains(import.as_str()) {
                    self.collector.emit(
                        Diagnostic::error(format!(
                            "namespace `{import}` imported by `{}` is not loaded",
                            namespace.name
                        ))
                        .with_code(ErrorCode::E004)
                        .with_help(format!("pass the namespace file that declares `{import}`")),
                    );
                }
            }
        }
    }
}

fn invalid_structure(file: &str, err: &serde_yaml::Error) -> Diagnostic {
    Diagnostic::error(format!("invalid specification in `{file}`: {err}"))
        .with_code(ErrorCode::E003)
}

/// Identifies the file a batch of specs is read from.
struct SourceContext<'a> {
    namespace: &'a str,
    source: &'a str,
    origin: &'a str,
    file: &'a str,
}

impl SourceContext<'_> {
    fn invalid(&self, message: impl std::fmt::Display) -> Diagnostic {
        Diagnostic::error(format!("invalid specification in `{}`: {message}", self.file))
            .with_code(ErrorCode::E003)
    }

    fn parse(&self, value: &Value) -> Result<RawSpec, Diagnostic> {
        serde_yaml::from_value(value.clone()).map_err(|err| self.invalid(err))
    }

    /// Convert a top-level spec; returns the type followed by its inline
    /// definitions.
    fn top_level_type(&self, value: Value, kind: NodeKind) -> Result<Vec<TypeNode>, Diagnostic> {
        let raw = self.parse(&value)?;
        let Some(name) = raw.data_type_def.clone() else {
            return Err(self.invalid(format!(
                "top-level {} `{}` has no data_type_def",
                kind.as_str().to_lowercase(),
                raw.name.as_deref().unwrap_or("<unnamed>")
            )));
        };
        self.type_node(raw, value, kind, name, None)
    }

    fn type_node(
        &self,
        raw: RawSpec,
        value: Value,
        kind: NodeKind,
        name: String,
        contained_in: Option<TypeKey>,
    ) -> Result<Vec<TypeNode>, Diagnostic> {
        let key = TypeKey::new(self.namespace, name);
        let mut nested = Vec::new();
        let fields = self.members(&raw, &key, &mut nested)?;

        let node = TypeNode {
            key,
            kind,
            doc: raw.doc.unwrap_or_default(),
            parent: raw.data_type_inc.map(TypeRef::new),
            fields,
            dtype: raw.dtype.map(convert_dtype),
            dims: raw.dims.as_ref().map(display_value),
            shape: raw.shape.as_ref().map(display_value),
            quantity: raw.quantity.as_ref().map(|q| self.quantity(q)).transpose()?,
            default_name: raw.default_name,
            name: raw.name,
            linkable: raw.linkable,
            source: self.source.to_string(),
            origin: self.origin.to_string(),
            contained_in,
            raw: value,
        };

        let mut types = Vec::with_capacity(nested.len() + 1);
        types.push(node);
        types.extend(nested);
        Ok(types)
    }

    fn members(
        &self,
        raw: &RawSpec,
        owner: &TypeKey,
        nested: &mut Vec<TypeNode>,
    ) -> Result<Vec<FieldEntry>, Diagnostic> {
        let mut fields = Vec::new();
        for attribute in &raw.attributes {
            fields.push(attribute_field(attribute));
        }
        for value in &raw.datasets {
            fields.push(self.member(value, NodeKind::Dataset, owner, nested)?);
        }
        for value in &raw.groups {
            fields.push(self.member(value, NodeKind::Group, owner, nested)?);
        }
        for link in &raw.links {
            fields.push(self.link_field(link)?);
        }
        Ok(fields)
    }

    fn member(
        &self,
        value: &Value,
        kind: NodeKind,
        owner: &TypeKey,
        nested: &mut Vec<TypeNode>,
    ) -> Result<FieldEntry, Diagnostic> {
        let raw = self.parse(value)?;
        let quantity = raw
            .quantity
            .as_ref()
            .map(|q| self.quantity(q))
            .transpose()?
            .unwrap_or_default();

        if let Some(name) = raw.data_type_def.clone() {
            let field = FieldEntry {
                name: raw.name.clone(),
                kind: Some(kind),
                doc: raw.doc.clone().unwrap_or_default(),
                defines: Some(TypeKey::new(self.namespace, name.as_str())),
                quantity,
                ..Default::default()
            };
            let types = self.type_node(raw, value.clone(), kind, name, Some(owner.clone()))?;
            nested.extend(types);
            return Ok(field);
        }

        let children = self.members(&raw, owner, nested)?;
        Ok(FieldEntry {
            name: raw.name,
            kind: Some(kind),
            doc: raw.doc.unwrap_or_default(),
            dtype: raw.dtype.map(convert_dtype),
            includes: raw.data_type_inc.map(TypeRef::new),
            quantity,
            dims: raw.dims.as_ref().map(display_value),
            shape: raw.shape.as_ref().map(display_value),
            default_name: raw.default_name,
            linkable: raw.linkable,
            children,
            ..Default::default()
        })
    }

    fn link_field(&self, link: &RawLink) -> Result<FieldEntry, Diagnostic> {
        Ok(FieldEntry {
            name: link.name.clone(),
            kind: Some(NodeKind::Link),
            doc: link.doc.clone().unwrap_or_default(),
            target: Some(TypeRef::new(link.target_type.as_str())),
            quantity: link
                .quantity
                .as_ref()
                .map(|q| self.quantity(q))
                .transpose()?
                .unwrap_or_default(),
            ..Default::default()
        })
    }

    fn quantity(&self, raw: &RawQuantity) -> Result<Quantity, Diagnostic> {
        match raw {
            RawQuantity::Count(count) => Ok(Quantity::Exactly(*count)),
            RawQuantity::Symbol(symbol) => Quantity::from_symbol(symbol)
                .ok_or_else(|| self.invalid(format!("unknown quantity `{symbol}`"))),
        }
    }
}

fn attribute_field(attribute: &RawAttribute) -> FieldEntry {
    FieldEntry {
        name: Some(attribute.name.clone()),
        kind: Some(NodeKind::Attribute),
        doc: attribute.doc.clone().unwrap_or_default(),
        dtype: attribute.dtype.clone().map(convert_dtype),
        dims: attribute.dims.as_ref().map(display_value),
        shape: attribute.shape.as_ref().map(display_value),
        value: attribute.value.as_ref().map(display_value),
        default_value: attribute.default_value.as_ref().map(display_value),
        required: attribute.required,
        ..Default::default()
    }
}

fn convert_dtype(dtype: RawDType) -> DataType {
    match dtype {
        RawDType::Name(name) => DataType::Primitive(name),
        RawDType::Reference(reference) => DataType::Reference {
            target: TypeRef::new(reference.target_type),
            reftype: reference.reftype,
        },
        RawDType::Compound(fields) => DataType::Compound(
            fields
                .into_iter()
                .map(|field| CompoundField {
                    name: field.name,
                    doc: field.doc.unwrap_or_default(),
                    dtype: convert_dtype(field.dtype),
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMESPACE: &str = "\
namespaces:
- name: core
  doc: Core types
  version: 2.1
  author: Ada
  schema:
  - source: base.yaml
    title: Base types
";

    const BASE: &str = "\
groups:
- data_type_def: Container
  doc: A container
  attributes:
  - name: help
    dtype: text
    required: false
  datasets:
  - name: data
    dtype: float32
    dims: [num_times]
    attributes:
    - name: unit
      dtype: text
  groups:
  - data_type_def: Inner
    data_type_inc: Container
    quantity: '*'
    doc: nested
  links:
  - name: source
    target_type: Container
datasets:
- data_type_def: Table
  dtype:
  - name: idx
    dtype: uint8
  - name: ref
    dtype:
      target_type: Container
      reftype: object
";

    fn sources() -> InMemory {
        InMemory::new()
            .with_file("specs/core.namespace.yaml", NAMESPACE)
            .with_file("specs/base.yaml", BASE)
    }

    #[test]
    fn test_load_namespace_metadata() {
        let specs = load(&sources(), &[PathBuf::from("specs/core.namespace.yaml")]).unwrap();

        let namespace = &specs.namespaces[0];
        assert_eq!(namespace.name, "core");
        assert_eq!(namespace.version.as_deref(), Some("2.1"));
        assert_eq!(namespace.authors, vec!["Ada"]);
        assert_eq!(namespace.sources[0].display_title(), "Base types");
        assert_eq!(namespace.origin, "specs/core.namespace.yaml");
    }

    #[test]
    fn test_load_types_with_inline_definition_after_owner() {
        let specs = load(&sources(), &[PathBuf::from("specs/core.namespace.yaml")]).unwrap();

        let names: Vec<&str> = specs.types.iter().map(|t| t.key.name()).collect();
        assert_eq!(names, vec!["Container", "Inner", "Table"]);

        let inner = &specs.types[1];
        assert_eq!(inner.contained_in, Some(TypeKey::new("core", "Container")));
        assert_eq!(inner.parent.as_ref().map(TypeRef::name), Some("Container"));
        assert_eq!(inner.quantity, Some(Quantity::ZeroOrMore));
    }

    #[test]
    fn test_load_member_order_and_children() {
        let specs = load(&sources(), &[PathBuf::from("specs/core.namespace.yaml")]).unwrap();
        let container = &specs.types[0];

        let kinds: Vec<NodeKind> = container.fields.iter().map(FieldEntry::node_kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Attribute, NodeKind::Dataset, NodeKind::Group, NodeKind::Link]
        );

        let data = &container.fields[1];
        assert_eq!(data.dims.as_deref(), Some("['num_times']"));
        assert_eq!(data.children[0].name.as_deref(), Some("unit"));
        assert_eq!(container.fields[2].defines, Some(TypeKey::new("core", "Inner")));
        assert_eq!(container.fields[3].target.as_ref().map(TypeRef::name), Some("Container"));
    }

    #[test]
    fn test_load_compound_dtype() {
        let specs = load(&sources(), &[PathBuf::from("specs/core.namespace.yaml")]).unwrap();

        let Some(DataType::Compound(fields)) = &specs.types[2].dtype else {
            panic!("expected compound dtype");
        };
        assert_eq!(fields.len(), 2);
        assert!(matches!(&fields[1].dtype, DataType::Reference { reftype, .. } if reftype == "object"));
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let files = InMemory::new().with_file("specs/core.namespace.yaml", NAMESPACE);

        let err = load(&files, &[PathBuf::from("specs/core.namespace.yaml")]).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E001));
    }

    #[test]
    fn test_yaml_syntax_error_has_span_and_source() {
        let files = sources().with_file("specs/base.yaml", "groups:\n- doc: [unterminated\n");

        let err = load(&files, &[PathBuf::from("specs/core.namespace.yaml")]).unwrap_err();
        let diagnostic = &err.diagnostics()[0];
        assert_eq!(diagnostic.code(), Some(ErrorCode::E002));
        assert_eq!(diagnostic.labels().len(), 1);
        assert_eq!(diagnostic.source().map(SourceText::name), Some("specs/base.yaml"));
    }

    #[test]
    fn test_top_level_spec_without_definition_is_invalid() {
        let files = sources().with_file("specs/base.yaml", "groups:\n- name: loose\n  doc: x\n");

        let err = load(&files, &[PathBuf::from("specs/core.namespace.yaml")]).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E003));
        assert!(err.diagnostics()[0].message().contains("loose"));
    }

    #[test]
    fn test_unknown_quantity_is_invalid() {
        let files = sources().with_file(
            "specs/base.yaml",
            "groups:\n- data_type_def: A\n  groups:\n  - name: g\n    quantity: lots\n",
        );

        let err = load(&files, &[PathBuf::from("specs/core.namespace.yaml")]).unwrap_err();
        assert!(err.diagnostics()[0].message().contains("unknown quantity `lots`"));
    }

    #[test]
    fn test_missing_import_is_fatal() {
        let files = InMemory::new().with_file(
            "ext.namespace.yaml",
            "namespaces:\n- name: ext\n  schema:\n  - namespace: core\n",
        );

        let err = load(&files, &[PathBuf::from("ext.namespace.yaml")]).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E004));
    }

    #[test]
    fn test_empty_source_file_defines_nothing() {
        let files = sources().with_file("specs/base.yaml", "");

        let specs = load(&files, &[PathBuf::from("specs/core.namespace.yaml")]).unwrap();
        assert!(specs.types.is_empty());
    }
}
