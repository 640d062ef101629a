//! Diagram-ready views of the type graph.
//!
//! A [`RenderGraph`] is built fresh for every diagram by a breadth-first
//! walk from one or more roots. The walk keeps a visited set, so every type
//! is visited at most once even when composition edges form cycles, and it
//! stops expanding at the configured depth.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use log::{debug, trace};

use specdoc_schema::{
    NodeKind, SpecCatalog, TypeKey, TypeNode, TypeRef,
    error::{Diagnostic, ErrorCode},
};

use crate::config::Direction;

/// Namespace name reported for roots given without a namespace filter.
pub const ROOTS_SCOPE: &str = "<roots>";

/// Relationship drawn between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Subtype to parent.
    Inherits,
    /// Owner to a type it includes or links to.
    Includes,
    /// Owner to a type defined inline inside it.
    Contains,
}

/// A type placed in a render graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    key: TypeKey,
    label: String,
    kind: NodeKind,
    depth: usize,
    external: bool,
}

impl GraphNode {
    /// Key of the type this node stands for.
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Text shown on the node.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Group or dataset.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Namespace that defines the type.
    pub fn namespace(&self) -> &str {
        self.key.namespace()
    }

    /// Distance from the nearest root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the type lives outside the namespace the diagram is about.
    pub fn is_external(&self) -> bool {
        self.external
    }
}

/// A typed edge between two node indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    source: usize,
    target: usize,
    kind: EdgeKind,
}

impl GraphEdge {
    /// Index of the node the edge starts at. For inheritance this is the
    /// subtype.
    pub fn source(&self) -> usize {
        self.source
    }

    /// Index of the node the edge points to.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Relation the edge stands for.
    pub fn kind(&self) -> EdgeKind {
        self.kind
    }
}

/// Nodes in discovery order plus typed edges.
#[derive(Debug, Clone, Default)]
pub struct RenderGraph {
    nodes: IndexMap<TypeKey, GraphNode>,
    edges: Vec<GraphEdge>,
}

impl RenderGraph {
    /// Nodes in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Node at `index`.
    pub fn node(&self, index: usize) -> Option<&GraphNode> {
        self.nodes.get_index(index).map(|(_, node)| node)
    }

    /// Index of the node for `key`.
    pub fn index_of(&self, key: &TypeKey) -> Option<usize> {
        self.nodes.get_index_of(key)
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a node unless present; returns whether it was added.
    fn insert_node(&mut self, node: &TypeNode, depth: usize, home: Option<&str>) -> bool {
        if self.nodes.contains_key(&node.key) {
            return false;
        }
        let external = home.is_some_and(|home| home != node.key.namespace());
        self.nodes.insert(
            node.key.clone(),
            GraphNode {
                key: node.key.clone(),
                label: node.key.name().to_string(),
                kind: node.kind,
                depth,
                external,
            },
        );
        true
    }

    fn insert_edge(&mut self, source: &TypeKey, target: &TypeKey, kind: EdgeKind) {
        let (Some(source), Some(target)) = (self.index_of(source), self.index_of(target)) else {
            return;
        };
        let edge = GraphEdge {
            source,
            target,
            kind,
        };
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }
}

/// Traversal limits for one diagram.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraversalOptions {
    pub max_depth: Option<usize>,
    pub direction: Direction,
}

/// A render graph plus the references that could not be followed.
#[derive(Debug, Default)]
pub struct Hierarchy {
    pub graph: RenderGraph,
    pub warnings: Vec<Diagnostic>,
    pub unresolved: Vec<String>,
}

/// Resolve a root name given on the command line.
///
/// `scope` is the namespace filter, if any; it is also the namespace named
/// in the error.
pub fn resolve_root<'a>(
    catalog: &'a SpecCatalog,
    name: &str,
    scope: Option<&str>,
) -> Result<&'a TypeKey, Diagnostic> {
    catalog.resolve(name, scope).ok_or_else(|| {
        Diagnostic::warning(format!(
            "unresolved root type `{name}` referenced from namespace `{}`",
            scope.unwrap_or(ROOTS_SCOPE)
        ))
        .with_code(ErrorCode::E101)
        .with_subject(name)
        .with_help("check the type name or load the namespace that defines it")
    })
}

/// Breadth-first walk from `roots`.
///
/// `home` is the namespace the diagram is about; nodes from other
/// namespaces are flagged external. Roots unknown to the catalog are
/// ignored; resolve them with [`resolve_root`] first.
pub fn build_hierarchy(
    catalog: &SpecCatalog,
    roots: &[TypeKey],
    home: Option<&str>,
    options: TraversalOptions,
) -> Hierarchy {
    let mut hierarchy = Hierarchy::default();
    let mut reported = HashSet::new();
    let mut queue = VecDeque::new();

    for root in roots {
        let Some(node) = catalog.get(root) else {
            continue;
        };
        if hierarchy.graph.insert_node(node, 0, home) {
            queue.push_back((node, 0));
        }
    }

    while let Some((node, depth)) = queue.pop_front() {
        trace!(key = node.key.to_string(), depth = depth; "Visiting type");
        if options.max_depth.is_some_and(|max| depth >= max) {
            continue;
        }

        for step in neighbors(catalog, node, options.direction) {
            let related = match step.target {
                Target::Resolved(related) => related,
                Target::Unresolved(name) => {
                    if reported.insert(name.to_string()) {
                        hierarchy.unresolved.push(name.to_string());
                        hierarchy.warnings.push(
                            Diagnostic::warning(format!(
                                "unresolved type `{name}` referenced by `{}`",
                                node.key
                            ))
                            .with_code(ErrorCode::E100)
                            .with_subject(name),
                        );
                    }
                    continue;
                }
            };

            if hierarchy.graph.insert_node(related, depth + 1, home) {
                queue.push_back((related, depth + 1));
            }
            let (source, target) = if step.reversed {
                (&related.key, &node.key)
            } else {
                (&node.key, &related.key)
            };
            hierarchy.graph.insert_edge(source, target, step.kind);
        }
    }

    debug!(
        nodes = hierarchy.graph.len(),
        edges = hierarchy.graph.edges().len(),
        unresolved = hierarchy.unresolved.len();
        "Hierarchy built"
    );
    hierarchy
}

/// Walk from every type of a namespace; types of other namespaces reached
/// on the way are flagged external.
pub fn build_namespace_hierarchy(
    catalog: &SpecCatalog,
    namespace: &str,
    options: TraversalOptions,
) -> Hierarchy {
    let roots = catalog
        .namespace(namespace)
        .map(|namespace| namespace.types.clone())
        .unwrap_or_default();
    build_hierarchy(catalog, &roots, Some(namespace), options)
}

enum Target<'a> {
    Resolved(&'a TypeNode),
    Unresolved(&'a str),
}

struct Step<'a> {
    target: Target<'a>,
    kind: EdgeKind,
    /// Whether the edge points from the neighbor to the visited node.
    reversed: bool,
}

fn neighbors<'a>(catalog: &'a SpecCatalog, node: &'a TypeNode, direction: Direction) -> Vec<Step<'a>> {
    let mut steps = Vec::new();

    match direction {
        Direction::Ancestors => {
            if let Some(target) = node.parent.as_ref().and_then(|parent| follow(catalog, parent)) {
                steps.push(Step {
                    target,
                    kind: EdgeKind::Inherits,
                    reversed: false,
                });
            }
        }
        Direction::Descendants => {
            steps.extend(
                catalog
                    .subtypes(&node.key)
                    .iter()
                    .filter_map(|key| catalog.get(key))
                    .map(|subtype| Step {
                        target: Target::Resolved(subtype),
                        kind: EdgeKind::Inherits,
                        reversed: true,
                    }),
            );
        }
    }

    steps.extend(
        node.includes()
            .into_iter()
            .filter_map(|reference| follow(catalog, reference))
            .map(|target| Step {
                target,
                kind: EdgeKind::Includes,
                reversed: false,
            }),
    );
    steps.extend(
        node.nested_definitions()
            .into_iter()
            .filter_map(|key| catalog.get(key))
            .map(|nested| Step {
                target: Target::Resolved(nested),
                kind: EdgeKind::Contains,
                reversed: false,
            }),
    );

    steps
}

/// Built-in references are neither drawn nor reported.
fn follow<'a>(catalog: &'a SpecCatalog, reference: &'a TypeRef) -> Option<Target<'a>> {
    match reference.target() {
        Some(key) => catalog.get(key).map(Target::Resolved),
        None if reference.is_builtin() => None,
        None => Some(Target::Unresolved(reference.name())),
    }
}
