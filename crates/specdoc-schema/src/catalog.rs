//! The normalized, read-only type catalog.
//!
//! [`SpecCatalog::build`] registers every type of every loaded namespace
//! first and resolves references afterwards, so definition order never
//! matters. The finished catalog is shared by every renderer.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use log::{debug, info};
use petgraph::{algo::tarjan_scc, graph::DiGraph};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, LoadError},
    loader::LoadedSpecs,
    model::{Namespace, TypeKey, TypeNode, TypeRef, split_qualified},
};

/// Options of the normalization phase.
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Type names that are accepted without a definition, e.g. base types
    /// provided by the storage layer.
    pub builtin_types: Vec<String>,
}

/// A successfully normalized catalog plus the recoverable problems met.
#[derive(Debug)]
pub struct Normalized {
    pub catalog: SpecCatalog,
    pub warnings: Vec<Diagnostic>,
}

/// All namespaces and types of a run, with resolved references.
#[derive(Debug, Default)]
pub struct SpecCatalog {
    namespaces: IndexMap<String, Namespace>,
    types: IndexMap<TypeKey, TypeNode>,
    subtypes: IndexMap<TypeKey, Vec<TypeKey>>,
    builtin_types: HashSet<String>,
}

impl SpecCatalog {
    /// Normalize loaded specifications.
    ///
    /// Identical duplicate definitions collapse silently. Differing ones
    /// produce an E200 warning and the later one is excluded. An
    /// inheritance cycle fails the build with E005.
    pub fn build(specs: LoadedSpecs, options: &CatalogOptions) -> Result<Normalized, LoadError> {
        let mut collector = DiagnosticCollector::new();
        let mut catalog = SpecCatalog {
            builtin_types: options.builtin_types.iter().cloned().collect(),
            ..Default::default()
        };

        for namespace in specs.namespaces {
            catalog.register_namespace(namespace);
        }
        // Nested definitions follow their owner in load order, so an owner
        // is always decided before the types defined inside it.
        let mut excluded = HashSet::new();
        for node in specs.types {
            let owner_excluded = node.contained_in.as_ref().is_some_and(|owner| {
                excluded.contains(&(owner.clone(), node.origin.clone(), node.source.clone()))
            });
            if owner_excluded {
                debug!(
                    key = node.key.to_string(),
                    origin = node.origin;
                    "Excluded definition nested in an excluded owner"
                );
                excluded.insert((node.key, node.origin, node.source));
                continue;
            }
            if let Some(node) = catalog.register_type(node, &mut collector) {
                excluded.insert((node.key, node.origin, node.source));
            }
        }

        catalog.resolve_references();
        catalog.check_inheritance(&mut collector);
        catalog.index_subtypes();

        let warnings = collector.finish()?;
        info!(
            namespaces = catalog.namespaces.len(),
            types = catalog.types.len(),
            warnings = warnings.len();
            "Catalog normalized"
        );
        Ok(Normalized { catalog, warnings })
    }

    fn register_namespace(&mut self, namespace: Namespace) {
        match self.namespaces.get_mut(&namespace.name) {
            None => {
                self.namespaces.insert(namespace.name.clone(), namespace);
            }
            Some(existing) => {
                debug!(
                    namespace = namespace.name,
                    origin = namespace.origin;
                    "Merging repeated namespace declaration"
                );
                for import in namespace.imports {
                    if !existing.imports.contains(&import) {
                        existing.imports.push(import);
                    }
                }
                for section in namespace.sources {
                    if !existing.sources.iter().any(|s| s.file == section.file) {
                        existing.sources.push(section);
                    }
                }
            }
        }
    }

    /// Add `node` to the catalog. A differing definition of a key that is
    /// already taken is handed back as excluded.
    fn register_type(
        &mut self,
        node: TypeNode,
        collector: &mut DiagnosticCollector,
    ) -> Option<TypeNode> {
        if let Some(existing) = self.types.get(&node.key) {
            if existing.raw == node.raw {
                debug!(key = node.key.to_string(), origin = node.origin; "Collapsed identical definition");
                return None;
            }
            collector.emit(
                Diagnostic::warning(format!(
                    "conflicting definitions of `{}` in `{}` (source `{}`) and `{}` (source `{}`)",
                    node.key, existing.origin, existing.source, node.origin, node.source
                ))
                .with_code(ErrorCode::E200)
                .with_help(format!("the definition from `{}` is excluded", node.origin)),
            );
            return Some(node);
        }

        if let Some(namespace) = self.namespaces.get_mut(node.key.namespace()) {
            namespace.types.push(node.key.clone());
            if let Some(section) = namespace.sources.iter_mut().find(|s| s.file == node.source) {
                section.types.push(node.key.clone());
            }
        }
        self.types.insert(node.key.clone(), node);
        None
    }

    fn resolve_references(&mut self) {
        let known: HashSet<TypeKey> = self.types.keys().cloned().collect();
        let scopes: HashMap<String, Vec<String>> = self
            .namespaces
            .keys()
            .map(|name| {
                let order = self.search_order(name).into_iter().map(str::to_string).collect();
                (name.clone(), order)
            })
            .collect();
        let builtins = &self.builtin_types;

        for node in self.types.values_mut() {
            let scope = scopes
                .get(node.key.namespace())
                .map(Vec::as_slice)
                .unwrap_or_default();
            node.for_each_ref_mut(&mut |reference: &mut TypeRef| {
                if let Some(key) = lookup(&known, scope, reference.name()) {
                    reference.resolve_to(key);
                } else if builtins.contains(reference.name()) {
                    reference.mark_builtin();
                }
            });
        }
    }

    fn check_inheritance(&self, collector: &mut DiagnosticCollector) {
        let mut graph = DiGraph::<&TypeKey, ()>::new();
        let indices: HashMap<&TypeKey, _> = self
            .types
            .keys()
            .map(|key| (key, graph.add_node(key)))
            .collect();

        for (key, node) in &self.types {
            if let Some(parent) = node.parent.as_ref().and_then(TypeRef::target) {
                graph.add_edge(indices[parent], indices[key], ());
            }
        }

        for component in tarjan_scc(&graph) {
            let is_cycle = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&index| graph.contains_edge(index, index));
            if !is_cycle {
                continue;
            }

            let mut members: Vec<&TypeKey> = component.iter().map(|&index| graph[index]).collect();
            members.sort_by_key(|key| self.types.get_index_of(*key));
            let names: Vec<String> = members.iter().map(ToString::to_string).collect();
            collector.emit(
                Diagnostic::error(format!("inheritance cycle between {}", names.join(", ")))
                    .with_code(ErrorCode::E005)
                    .with_help("a type cannot extend itself, directly or through its ancestors"),
            );
        }
    }

    fn index_subtypes(&mut self) {
        for (key, node) in &self.types {
            if let Some(parent) = node.parent.as_ref().and_then(TypeRef::target) {
                self.subtypes
                    .entry(parent.clone())
                    .or_default()
                    .push(key.clone());
            }
        }
    }

    /// Namespaces to search from `namespace`: itself, then its imports
    /// breadth first in declaration order.
    pub fn search_order<'a>(&'a self, namespace: &'a str) -> Vec<&'a str> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([namespace]);

        while let Some(name) = queue.pop_front() {
            if !visited.insert(name) {
                continue;
            }
            order.push(name);
            if let Some(entry) = self.namespaces.get(name) {
                queue.extend(entry.imports.iter().map(String::as_str));
            }
        }
        order
    }

    /// Resolve a possibly qualified type name.
    ///
    /// With a `scope` the lookup follows [`Self::search_order`]; without one
    /// every namespace is searched in load order.
    pub fn resolve(&self, name: &str, scope: Option<&str>) -> Option<&TypeKey> {
        let (namespace, bare) = split_qualified(name);
        if let Some(namespace) = namespace {
            return self
                .types
                .get_key_value(&TypeKey::new(namespace, bare))
                .map(|(key, _)| key);
        }

        let order: Vec<&str> = match scope {
            Some(scope) => self.search_order(scope),
            None => self.namespaces.keys().map(String::as_str).collect(),
        };
        order.into_iter().find_map(|namespace| {
            self.types
                .get_key_value(&TypeKey::new(namespace, bare))
                .map(|(key, _)| key)
        })
    }

    /// Whether `name` is a configured built-in type.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtin_types.contains(name)
    }

    /// All namespaces in load order.
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.values()
    }

    /// Look up a namespace by name.
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    /// All types in definition order.
    pub fn types(&self) -> impl Iterator<Item = &TypeNode> {
        self.types.values()
    }

    /// Look up a type by key.
    pub fn get(&self, key: &TypeKey) -> Option<&TypeNode> {
        self.types.get(key)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Position of a type in definition order.
    pub fn definition_index(&self, key: &TypeKey) -> Option<usize> {
        self.types.get_index_of(key)
    }

    /// The resolved parent of a type.
    pub fn parent(&self, node: &TypeNode) -> Option<&TypeNode> {
        node.parent
            .as_ref()
            .and_then(TypeRef::target)
            .and_then(|key| self.types.get(key))
    }

    /// Resolved ancestors of a type, nearest first.
    pub fn ancestors(&self, key: &TypeKey) -> Vec<&TypeNode> {
        let mut ancestors = Vec::new();
        let mut visited = HashSet::from([key]);
        let mut current = self.types.get(key);

        while let Some(parent) = current.and_then(|node| self.parent(node)) {
            if !visited.insert(&parent.key) {
                break;
            }
            ancestors.push(parent);
            current = Some(parent);
        }
        ancestors
    }

    /// Direct subtypes of a type in definition order.
    pub fn subtypes(&self, key: &TypeKey) -> &[TypeKey] {
        self.subtypes.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Order `keys` so that every parent precedes its subtypes; otherwise
    /// the input order is kept. Keys unknown to the catalog are dropped.
    pub fn dependency_order(&self, keys: &[TypeKey]) -> Vec<TypeKey> {
        let wanted: HashSet<&TypeKey> = keys.iter().collect();
        let mut placed = HashSet::new();
        let mut ordered = Vec::with_capacity(keys.len());

        for key in keys {
            let mut chain = vec![key];
            chain.extend(
                self.ancestors(key)
                    .into_iter()
                    .map(|node| &node.key)
                    .filter(|ancestor| wanted.contains(ancestor)),
            );
            for key in chain.into_iter().rev() {
                if self.types.contains_key(key) && placed.insert(key) {
                    ordered.push(key.clone());
                }
            }
        }
        ordered
    }
}

fn lookup(known: &HashSet<TypeKey>, scope: &[String], name: &str) -> Option<TypeKey> {
    let (namespace, bare) = split_qualified(name);
    if let Some(namespace) = namespace {
        let key = TypeKey::new(namespace, bare);
        return known.contains(&key).then_some(key);
    }
    scope
        .iter()
        .map(|namespace| TypeKey::new(namespace.as_str(), bare))
        .find(|key| known.contains(key))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::loader::{InMemory, load};

    fn build(files: InMemory, namespaces: &[&str]) -> Result<Normalized, LoadError> {
        let paths: Vec<PathBuf> = namespaces.iter().map(PathBuf::from).collect();
        let specs = load(&files, &paths)?;
        SpecCatalog::build(
            specs,
            &CatalogOptions {
                builtin_types: vec!["Data".to_string()],
            },
        )
    }

    fn namespace(name: &str, imports: &[&str], sources: &[&str]) -> String {
        let mut text = format!("namespaces:\n- name: {name}\n  schema:\n");
        for import in imports {
            text.push_str(&format!("  - namespace: {import}\n"));
        }
        for source in sources {
            text.push_str(&format!("  - source: {source}\n"));
        }
        text
    }

    #[test]
    fn test_forward_reference_resolves() {
        let files = InMemory::new()
            .with_file("core.yaml", namespace("core", &[], &["types.yaml"]))
            .with_file(
                "types.yaml",
                "groups:\n- data_type_def: Child\n  data_type_inc: Parent\n- data_type_def: Parent\n",
            );

        let normalized = build(files, &["core.yaml"]).unwrap();
        let child = normalized.catalog.get(&TypeKey::new("core", "Child")).unwrap();
        assert_eq!(
            child.parent.as_ref().and_then(TypeRef::target),
            Some(&TypeKey::new("core", "Parent"))
        );
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn test_lookup_prefers_own_namespace_then_imports() {
        let files = InMemory::new()
            .with_file("base.yaml", namespace("base", &[], &["base.types.yaml"]))
            .with_file("ext.yaml", namespace("ext", &["base"], &["ext.types.yaml"]))
            .with_file(
                "base.types.yaml",
                "groups:\n- data_type_def: Shared\n- data_type_def: OnlyBase\n",
            )
            .with_file(
                "ext.types.yaml",
                "groups:\n- data_type_def: Shared\n  doc: ext\n- data_type_def: User\n  data_type_inc: OnlyBase\n  groups:\n  - data_type_inc: Shared\n",
            );

        let catalog = build(files, &["base.yaml", "ext.yaml"]).unwrap().catalog;
        let user = catalog.get(&TypeKey::new("ext", "User")).unwrap();

        assert_eq!(
            user.parent.as_ref().and_then(TypeRef::target),
            Some(&TypeKey::new("base", "OnlyBase"))
        );
        assert_eq!(
            user.includes()[0].target(),
            Some(&TypeKey::new("ext", "Shared"))
        );
        assert_eq!(
            catalog.resolve("Shared", Some("base")),
            Some(&TypeKey::new("base", "Shared"))
        );
        assert_eq!(
            catalog.resolve("base:Shared", Some("ext")),
            Some(&TypeKey::new("base", "Shared"))
        );
    }

    #[test]
    fn test_identical_duplicates_collapse() {
        let files = InMemory::new()
            .with_file("a/ns.yaml", namespace("core", &[], &["types.yaml"]))
            .with_file("b/ns.yaml", namespace("core", &[], &["types.yaml"]))
            .with_file("a/types.yaml", "groups:\n- data_type_def: A\n  doc: same\n")
            .with_file("b/types.yaml", "groups:\n- data_type_def: A\n  doc: same\n");

        let normalized = build(files, &["a/ns.yaml", "b/ns.yaml"]).unwrap();
        assert_eq!(normalized.catalog.len(), 1);
        assert!(normalized.warnings.is_empty());
        assert_eq!(normalized.catalog.namespace("core").unwrap().types.len(), 1);
    }

    #[test]
    fn test_differing_duplicates_warn_and_keep_first() {
        let files = InMemory::new()
            .with_file("a/ns.yaml", namespace("core", &[], &["types.yaml"]))
            .with_file("b/ns.yaml", namespace("core", &[], &["types.yaml"]))
            .with_file("a/types.yaml", "groups:\n- data_type_def: A\n  doc: first\n")
            .with_file("b/types.yaml", "groups:\n- data_type_def: A\n  doc: second\n");

        let normalized = build(files, &["a/ns.yaml", "b/ns.yaml"]).unwrap();
        assert_eq!(normalized.warnings.len(), 1);
        let warning = &normalized.warnings[0];
        assert_eq!(warning.code(), Some(ErrorCode::E200));
        assert!(warning.message().contains("a/ns.yaml"));
        assert!(warning.message().contains("b/ns.yaml"));
        assert_eq!(
            normalized.catalog.get(&TypeKey::new("core", "A")).unwrap().doc,
            "first"
        );
    }

    #[test]
    fn test_excluded_definition_drops_its_nested_types() {
        let files = InMemory::new()
            .with_file("a/ns.yaml", namespace("core", &[], &["types.yaml"]))
            .with_file("b/ns.yaml", namespace("core", &[], &["types.yaml"]))
            .with_file(
                "a/types.yaml",
                "groups:\n- data_type_def: A\n  doc: first\n  groups:\n  - data_type_def: Shared\n    doc: kept\n",
            )
            .with_file(
                "b/types.yaml",
                "groups:\n- data_type_def: A\n  doc: second\n  groups:\n  - data_type_def: OnlyInSecond\n    groups:\n    - data_type_def: Deeper\n  - data_type_def: Shared\n    doc: kept\n",
            );

        let normalized = build(files, &["a/ns.yaml", "b/ns.yaml"]).unwrap();
        let catalog = &normalized.catalog;

        assert_eq!(normalized.warnings.len(), 1);
        assert_eq!(normalized.warnings[0].code(), Some(ErrorCode::E200));
        assert!(catalog.get(&TypeKey::new("core", "OnlyInSecond")).is_none());
        assert!(catalog.get(&TypeKey::new("core", "Deeper")).is_none());

        let shared = catalog.get(&TypeKey::new("core", "Shared")).unwrap();
        assert_eq!(shared.origin, "a/ns.yaml");
        assert_eq!(shared.contained_in, Some(TypeKey::new("core", "A")));

        let names: Vec<&str> = catalog
            .namespace("core")
            .unwrap()
            .types
            .iter()
            .map(TypeKey::name)
            .collect();
        assert_eq!(names, ["A", "Shared"]);
    }

    #[test]
    fn test_inheritance_cycle_is_fatal() {
        let files = InMemory::new()
            .with_file("core.yaml", namespace("core", &[], &["types.yaml"]))
            .with_file(
                "types.yaml",
                "groups:\n- data_type_def: A\n  data_type_inc: B\n- data_type_def: B\n  data_type_inc: A\n",
            );

        let err = build(files, &["core.yaml"]).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E005));
        assert!(err.diagnostics()[0].message().contains("core:A, core:B"));
    }

    #[test]
    fn test_self_inheritance_is_fatal() {
        let files = InMemory::new()
            .with_file("core.yaml", namespace("core", &[], &["types.yaml"]))
            .with_file("types.yaml", "groups:\n- data_type_def: A\n  data_type_inc: A\n");

        assert!(build(files, &["core.yaml"]).is_err());
    }

    #[test]
    fn test_inclusion_cycle_is_allowed() {
        let files = InMemory::new()
            .with_file("core.yaml", namespace("core", &[], &["types.yaml"]))
            .with_file(
                "types.yaml",
                "groups:\n- data_type_def: A\n  groups:\n  - data_type_inc: B\n- data_type_def: B\n  groups:\n  - data_type_inc: A\n",
            );

        assert!(build(files, &["core.yaml"]).is_ok());
    }

    #[test]
    fn test_builtin_and_unresolved_references() {
        let files = InMemory::new()
            .with_file("core.yaml", namespace("core", &[], &["types.yaml"]))
            .with_file(
                "types.yaml",
                "datasets:\n- data_type_def: A\n  data_type_inc: Data\n- data_type_def: B\n  data_type_inc: Missing\n",
            );

        let catalog = build(files, &["core.yaml"]).unwrap().catalog;
        let a = catalog.get(&TypeKey::new("core", "A")).unwrap();
        let b = catalog.get(&TypeKey::new("core", "B")).unwrap();

        assert!(a.parent.as_ref().unwrap().is_builtin());
        assert!(b.parent.as_ref().unwrap().is_unresolved());
        assert!(catalog.is_builtin("Data"));
    }

    #[test]
    fn test_subtypes_ancestors_and_dependency_order() {
        let files = InMemory::new()
            .with_file("core.yaml", namespace("core", &[], &["types.yaml"]))
            .with_file(
                "types.yaml",
                "groups:\n- data_type_def: C\n  data_type_inc: B\n- data_type_def: B\n  data_type_inc: A\n- data_type_def: A\n- data_type_def: D\n  data_type_inc: A\n",
            );

        let catalog = build(files, &["core.yaml"]).unwrap().catalog;
        let key = |name: &str| TypeKey::new("core", name);

        assert_eq!(catalog.subtypes(&key("A")), &[key("B"), key("D")]);
        let ancestors: Vec<&str> = catalog.ancestors(&key("C")).iter().map(|n| n.key.name()).collect();
        assert_eq!(ancestors, vec!["B", "A"]);

        let all = [key("C"), key("B"), key("A"), key("D")];
        let ordered = catalog.dependency_order(&all);
        assert_eq!(ordered, vec![key("A"), key("B"), key("C"), key("D")]);
    }

    #[test]
    fn test_source_sections_collect_types() {
        let files = InMemory::new()
            .with_file("core.yaml", namespace("core", &[], &["one.yaml", "two.yaml"]))
            .with_file("one.yaml", "groups:\n- data_type_def: A\n")
            .with_file("two.yaml", "groups:\n- data_type_def: B\n");

        let catalog = build(files, &["core.yaml"]).unwrap().catalog;
        let sections = &catalog.namespace("core").unwrap().sources;
        assert_eq!(sections[0].types, vec![TypeKey::new("core", "A")]);
        assert_eq!(sections[1].types, vec![TypeKey::new("core", "B")]);
    }
}
