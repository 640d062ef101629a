//! Normalized specification model.
//!
//! These types describe namespaces and their type definitions after the
//! YAML has been read. References between types are carried as [`TypeRef`]s
//! which the catalog resolves to [`TypeKey`]s in a second pass, so forward
//! references and cross-namespace references behave the same way.

use std::fmt;

/// Separator between namespace and type name in qualified names.
pub const QUALIFIER: char = ':';

/// The `(namespace, name)` identity of a type.
///
/// Ordering is by namespace first, then by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeKey {
    namespace: String,
    name: String,
}

impl TypeKey {
    /// Create a key from a namespace and a type name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// The namespace the type is defined in.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The unqualified type name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, QUALIFIER, self.name)
    }
}

/// Split a possibly qualified name (`ns:Name`) into its parts.
///
/// # Examples
///
/// ```
/// use specdoc_schema::model::split_qualified;
///
/// assert_eq!(split_qualified("core:TimeSeries"), (Some("core"), "TimeSeries"));
/// assert_eq!(split_qualified("TimeSeries"), (None, "TimeSeries"));
/// ```
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once(QUALIFIER) {
        Some((namespace, name)) if !namespace.is_empty() => (Some(namespace), name),
        Some((_, name)) => (None, name),
        None => (None, name),
    }
}

/// The primitive kind of a specification node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Group,
    Dataset,
    Attribute,
    Link,
}

impl NodeKind {
    /// Display name used in documents and diagrams.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Group => "Group",
            NodeKind::Dataset => "Dataset",
            NodeKind::Attribute => "Attribute",
            NodeKind::Link => "Link",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many instances of a member may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Exactly(u64),
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Quantity {
    /// Parse the symbolic quantity forms used in specifications.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "*" | "zero_or_more" => Some(Quantity::ZeroOrMore),
            "+" | "one_or_more" => Some(Quantity::OneOrMore),
            "?" | "zero_or_one" => Some(Quantity::ZeroOrOne),
            _ => None,
        }
    }

    /// Human readable description, e.g. `0 or more`.
    pub fn describe(&self) -> String {
        match self {
            Quantity::Exactly(count) => count.to_string(),
            Quantity::ZeroOrOne => "0 or 1".to_string(),
            Quantity::ZeroOrMore => "0 or more".to_string(),
            Quantity::OneOrMore => "1 or more".to_string(),
        }
    }

    /// Whether zero instances are allowed.
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            Quantity::ZeroOrOne | Quantity::ZeroOrMore | Quantity::Exactly(0)
        )
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::Exactly(1)
    }
}

/// A reference to a type by name, resolved by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    name: String,
    target: Option<TypeKey>,
    builtin: bool,
}

impl TypeRef {
    /// Create an unresolved reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
            builtin: false,
        }
    }

    /// The name as written in the specification.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved type, if any.
    pub fn target(&self) -> Option<&TypeKey> {
        self.target.as_ref()
    }

    /// Whether the reference names a configured built-in type.
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// Whether the reference is neither resolved nor built-in.
    pub fn is_unresolved(&self) -> bool {
        self.target.is_none() && !self.builtin
    }

    pub(crate) fn resolve_to(&mut self, target: TypeKey) {
        self.target = Some(target);
    }

    pub(crate) fn mark_builtin(&mut self) {
        self.builtin = true;
    }
}

/// One element of a compound data type.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundField {
    pub name: String,
    pub doc: String,
    pub dtype: DataType,
}

/// Declared data type of a dataset or attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    /// A primitive such as `int32` or `text`.
    Primitive(String),
    /// An object or region reference to a type.
    Reference { target: TypeRef, reftype: String },
    /// A table-like compound of named elements.
    Compound(Vec<CompoundField>),
}

/// A member of a type: attribute, dataset, group or link.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldEntry {
    pub name: Option<String>,
    pub kind: Option<NodeKind>,
    pub doc: String,
    pub dtype: Option<DataType>,
    /// Type this member is an instance of (`data_type_inc` without a def).
    pub includes: Option<TypeRef>,
    /// Type defined inline by this member (`data_type_def`).
    pub defines: Option<TypeKey>,
    /// Target type of a link.
    pub target: Option<TypeRef>,
    pub quantity: Quantity,
    pub dims: Option<String>,
    pub shape: Option<String>,
    pub value: Option<String>,
    pub default_value: Option<String>,
    pub default_name: Option<String>,
    pub linkable: Option<bool>,
    pub required: Option<bool>,
    /// Locally declared members (attributes of a dataset, members of an
    /// anonymous group).
    pub children: Vec<FieldEntry>,
}

impl FieldEntry {
    /// The kind of this member; members always have one once loaded.
    pub fn node_kind(&self) -> NodeKind {
        self.kind.unwrap_or(NodeKind::Group)
    }

    /// The identifier shown for this member: its name, or `<Type>` for
    /// unnamed members.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let type_name = self
            .defines
            .as_ref()
            .map(TypeKey::name)
            .or_else(|| self.includes.as_ref().map(TypeRef::name))
            .or_else(|| self.target.as_ref().map(TypeRef::name));
        match type_name {
            Some(type_name) => format!("<{type_name}>"),
            None => "<unnamed>".to_string(),
        }
    }

    /// Cardinality of this member. Attributes derive it from `required`.
    pub fn cardinality(&self) -> Quantity {
        match (self.kind, self.required) {
            (Some(NodeKind::Attribute), Some(false)) => Quantity::ZeroOrOne,
            (Some(NodeKind::Attribute), _) => Quantity::Exactly(1),
            _ => self.quantity,
        }
    }

    /// References this member makes to other types by composition: its
    /// included type and its link target. Nested members are not visited.
    pub fn composition_refs(&self) -> impl Iterator<Item = &TypeRef> {
        self.includes.iter().chain(self.target.iter())
    }

    pub(crate) fn for_each_ref_mut(&mut self, visit: &mut dyn FnMut(&mut TypeRef)) {
        if let Some(includes) = &mut self.includes {
            visit(includes);
        }
        if let Some(target) = &mut self.target {
            visit(target);
        }
        if let Some(dtype) = &mut self.dtype {
            dtype_refs_mut(dtype, visit);
        }
        for child in &mut self.children {
            child.for_each_ref_mut(visit);
        }
    }
}

fn dtype_refs_mut(dtype: &mut DataType, visit: &mut dyn FnMut(&mut TypeRef)) {
    match dtype {
        DataType::Primitive(_) => {}
        DataType::Reference { target, .. } => visit(target),
        DataType::Compound(fields) => {
            for field in fields {
                dtype_refs_mut(&mut field.dtype, visit);
            }
        }
    }
}

/// One type definition within a namespace.
#[derive(Debug, Clone)]
pub struct TypeNode {
    pub key: TypeKey,
    pub kind: NodeKind,
    pub doc: String,
    pub parent: Option<TypeRef>,
    /// Members in specification order: attributes, datasets, groups, links.
    pub fields: Vec<FieldEntry>,
    pub dtype: Option<DataType>,
    pub dims: Option<String>,
    pub shape: Option<String>,
    pub quantity: Option<Quantity>,
    pub default_name: Option<String>,
    pub name: Option<String>,
    pub linkable: Option<bool>,
    /// Schema source file (as listed in the namespace) the type comes from.
    pub source: String,
    /// Namespace file the definition was loaded through.
    pub origin: String,
    /// Enclosing type for definitions nested inside another type.
    pub contained_in: Option<TypeKey>,
    /// The YAML mapping the definition was read from.
    pub raw: serde_yaml::Value,
}

impl TypeNode {
    /// Types included by composition anywhere in this type's members,
    /// including link targets, in specification order.
    pub fn includes(&self) -> Vec<&TypeRef> {
        fn walk<'a>(fields: &'a [FieldEntry], out: &mut Vec<&'a TypeRef>) {
            for field in fields {
                out.extend(field.composition_refs());
                walk(&field.children, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.fields, &mut out);
        out
    }

    /// Keys of types defined inline inside this type.
    pub fn nested_definitions(&self) -> Vec<&TypeKey> {
        fn walk<'a>(fields: &'a [FieldEntry], out: &mut Vec<&'a TypeKey>) {
            for field in fields {
                out.extend(field.defines.iter());
                walk(&field.children, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.fields, &mut out);
        out
    }

    pub(crate) fn for_each_ref_mut(&mut self, visit: &mut dyn FnMut(&mut TypeRef)) {
        if let Some(parent) = &mut self.parent {
            visit(parent);
        }
        if let Some(dtype) = &mut self.dtype {
            dtype_refs_mut(dtype, visit);
        }
        for field in &mut self.fields {
            field.for_each_ref_mut(visit);
        }
    }
}

/// A schema source file of a namespace, used to group types into sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSection {
    pub file: String,
    pub title: Option<String>,
    pub doc: Option<String>,
    /// Types registered from this source, in definition order.
    pub types: Vec<TypeKey>,
}

impl SourceSection {
    /// Section title: the configured title, or the file name.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.file)
    }
}

/// A named, versioned collection of type definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    pub full_name: Option<String>,
    pub doc: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
    pub authors: Vec<String>,
    pub contacts: Vec<String>,
    /// Imported namespaces in declaration order.
    pub imports: Vec<String>,
    pub sources: Vec<SourceSection>,
    /// Types defined by this namespace, in definition order.
    pub types: Vec<TypeKey>,
    /// Namespace file the namespace was declared in.
    pub origin: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_key_display_and_order() {
        let a = TypeKey::new("core", "B");
        let b = TypeKey::new("ext", "A");

        assert_eq!(a.to_string(), "core:B");
        assert!(a < b);
    }

    #[test]
    fn test_split_qualified_ignores_empty_namespace() {
        assert_eq!(split_qualified(":Foo"), (None, "Foo"));
        assert_eq!(split_qualified("hdmf-common:Data"), (Some("hdmf-common"), "Data"));
    }

    #[test]
    fn test_quantity_symbols() {
        assert_eq!(Quantity::from_symbol("*"), Some(Quantity::ZeroOrMore));
        assert_eq!(Quantity::from_symbol("one_or_more"), Some(Quantity::OneOrMore));
        assert_eq!(Quantity::from_symbol("?"), Some(Quantity::ZeroOrOne));
        assert_eq!(Quantity::from_symbol("many"), None);
        assert_eq!(Quantity::Exactly(2).describe(), "2");
        assert_eq!(Quantity::ZeroOrMore.describe(), "0 or more");
        assert!(Quantity::ZeroOrOne.is_optional());
        assert!(!Quantity::default().is_optional());
    }

    #[test]
    fn test_field_display_name() {
        let named = FieldEntry {
            name: Some("data".to_string()),
            ..Default::default()
        };
        let included = FieldEntry {
            includes: Some(TypeRef::new("TimeSeries")),
            ..Default::default()
        };

        assert_eq!(named.display_name(), "data");
        assert_eq!(included.display_name(), "<TimeSeries>");
        assert_eq!(FieldEntry::default().display_name(), "<unnamed>");
    }

    #[test]
    fn test_attribute_cardinality_from_required() {
        let optional = FieldEntry {
            kind: Some(NodeKind::Attribute),
            required: Some(false),
            ..Default::default()
        };
        let required = FieldEntry {
            kind: Some(NodeKind::Attribute),
            ..Default::default()
        };

        assert_eq!(optional.cardinality(), Quantity::ZeroOrOne);
        assert_eq!(required.cardinality(), Quantity::Exactly(1));
    }

    #[test]
    fn test_type_ref_states() {
        let mut reference = TypeRef::new("Container");
        assert!(reference.is_unresolved());

        reference.mark_builtin();
        assert!(reference.is_builtin());
        assert!(!reference.is_unresolved());

        let mut resolved = TypeRef::new("A");
        resolved.resolve_to(TypeKey::new("core", "A"));
        assert_eq!(resolved.target(), Some(&TypeKey::new("core", "A")));
    }
}
