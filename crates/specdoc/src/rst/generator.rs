//! Builds [`DocumentSection`] trees from the type catalog.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use specdoc_schema::{
    DataType, FieldEntry, Namespace, SpecCatalog, TypeKey, TypeNode, TypeRef,
    error::{Diagnostic, ErrorCode},
};

use super::{
    document::{
        Block, BulletItem, DocumentSection, HeadingLevel, Property, literal, reference,
        section_label,
    },
    emit::emit,
    table::GridTable,
    text::{clean_doc, single_line},
};
use crate::config::{RstConfig, TypeOrder};

const FIELD_COLUMNS: [&str; 5] = ["Id", "Kind", "Type", "Quantity", "Description"];

/// A generated document with the unresolved references met while building
/// it. Each unresolved name is reported once per document.
#[derive(Debug)]
pub struct Generated {
    pub section: DocumentSection,
    pub warnings: Vec<Diagnostic>,
    pub unresolved: Vec<String>,
}

impl Generated {
    /// The document as RST text.
    pub fn to_rst(&self) -> String {
        emit(&self.section)
    }
}

/// RST document generator over a read-only catalog.
#[derive(Debug, Clone, Copy)]
pub struct RstGenerator<'a> {
    catalog: &'a SpecCatalog,
    config: &'a RstConfig,
}

impl<'a> RstGenerator<'a> {
    pub fn new(catalog: &'a SpecCatalog, config: &'a RstConfig) -> Self {
        Self { catalog, config }
    }

    /// Document a whole namespace; `None` if it is not loaded.
    pub fn generate_namespace(&self, name: &str) -> Option<Generated> {
        let namespace = self.catalog.namespace(name)?;
        info!(namespace = name, types = namespace.types.len(); "Generating namespace document");

        let mut pass = Pass::new(self.catalog, self.config);
        let title = format!(
            "Namespace -- {}",
            namespace.full_name.as_deref().unwrap_or(&namespace.name)
        );
        let mut section =
            DocumentSection::new(title, HeadingLevel::Section).with_label(format!("namespace-{name}"));
        section.push(Block::PropertyList(namespace_properties(namespace)));

        let mut hierarchy = DocumentSection::new("Type Hierarchy", HeadingLevel::Subsection)
            .with_label(format!("type-hierarchy-{name}"));
        hierarchy.push(Block::BulletTree(self.type_hierarchy(namespace)));
        section.subsections.push(hierarchy);

        if self.config.group_by_source() {
            for source in &namespace.sources {
                let mut subsection =
                    DocumentSection::new(source.display_title(), HeadingLevel::Subsection);
                if let Some(doc) = source.doc.as_deref().filter(|doc| !doc.trim().is_empty()) {
                    subsection.push(Block::Paragraph(clean_doc(doc, "\n\n")));
                }
                for key in self.order(&source.types) {
                    if let Some(node) = self.catalog.get(&key) {
                        subsection
                            .subsections
                            .push(pass.type_section(node, HeadingLevel::Subsubsection));
                    }
                }
                section.subsections.push(subsection);
            }
        } else {
            let mut subsection = DocumentSection::new("Data Types", HeadingLevel::Subsection);
            for key in self.order(&namespace.types) {
                if let Some(node) = self.catalog.get(&key) {
                    subsection
                        .subsections
                        .push(pass.type_section(node, HeadingLevel::Subsubsection));
                }
            }
            section.subsections.push(subsection);
        }

        Some(pass.finish(section))
    }

    /// Document the given types in the configured order.
    pub fn generate_types(&self, keys: &[TypeKey]) -> Generated {
        let mut pass = Pass::new(self.catalog, self.config);
        let mut section = DocumentSection::new("Data Types", HeadingLevel::Section);
        for key in self.order(keys) {
            match self.catalog.get(&key) {
                Some(node) => section
                    .subsections
                    .push(pass.type_section(node, HeadingLevel::Subsection)),
                None => debug!(key = key.to_string(); "Skipping type missing from catalog"),
            }
        }
        pass.finish(section)
    }

    /// Arrange `keys` in the configured order, each key once.
    pub fn order(&self, keys: &[TypeKey]) -> Vec<TypeKey> {
        let mut seen = HashSet::new();
        let mut keys: Vec<TypeKey> = keys.iter().filter(|key| seen.insert(*key)).cloned().collect();
        keys.sort_by_key(|key| self.catalog.definition_index(key).unwrap_or(usize::MAX));
        match self.config.order() {
            TypeOrder::Definition => keys,
            TypeOrder::Alphabetical => {
                keys.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.cmp(b)));
                keys
            }
            TypeOrder::Dependency => self.catalog.dependency_order(&keys),
        }
    }

    /// Nested list of the namespace's types following subtype relations.
    /// Types whose parent lies outside the namespace start a new tree.
    fn type_hierarchy(&self, namespace: &Namespace) -> Vec<BulletItem> {
        let members: HashSet<&TypeKey> = namespace.types.iter().collect();
        let roots: Vec<TypeKey> = namespace
            .types
            .iter()
            .filter(|key| {
                self.catalog
                    .get(key)
                    .and_then(|node| node.parent.as_ref())
                    .and_then(TypeRef::target)
                    .is_none_or(|parent| !members.contains(parent))
            })
            .cloned()
            .collect();

        let mut visited = HashSet::new();
        self.order(&roots)
            .iter()
            .filter_map(|key| self.hierarchy_item(key, &members, &mut visited))
            .collect()
    }

    fn hierarchy_item(
        &self,
        key: &TypeKey,
        members: &HashSet<&TypeKey>,
        visited: &mut HashSet<TypeKey>,
    ) -> Option<BulletItem> {
        if !visited.insert(key.clone()) {
            return None;
        }
        let children: Vec<TypeKey> = self
            .catalog
            .subtypes(key)
            .iter()
            .filter(|subtype| members.contains(subtype))
            .cloned()
            .collect();
        Some(BulletItem {
            text: reference(key.name(), &section_label(key.name())),
            children: self
                .order(&children)
                .iter()
                .filter_map(|child| self.hierarchy_item(child, members, visited))
                .collect(),
        })
    }
}

fn namespace_properties(namespace: &Namespace) -> Vec<Property> {
    let mut properties = Vec::new();
    if let Some(doc) = &namespace.doc {
        properties.push(Property::text("Description", clean_doc(&single_line(doc), " ")));
    }
    properties.push(Property::text("Name", namespace.name.as_str()));
    if let Some(full_name) = &namespace.full_name {
        properties.push(Property::text("Full Name", full_name.as_str()));
    }
    if let Some(version) = &namespace.version {
        properties.push(Property::text("Version", version.as_str()));
    }
    if let Some(date) = &namespace.date {
        properties.push(Property::text("Date", date.as_str()));
    }
    push_people(&mut properties, "Author", &namespace.authors);
    push_people(&mut properties, "Contact", &namespace.contacts);

    let schema: Vec<String> = namespace
        .imports
        .iter()
        .map(|import| format!("**namespace:** {import}"))
        .chain(
            namespace
                .sources
                .iter()
                .map(|source| format!("**source:** {}", source.file)),
        )
        .collect();
    if !schema.is_empty() {
        properties.push(Property::list("Schema", schema));
    }
    properties
}

fn push_people(properties: &mut Vec<Property>, name: &str, people: &[String]) {
    match people {
        [] => {}
        [single] => properties.push(Property::text(name, single.as_str())),
        many => properties.push(Property::list(format!("{name}s"), many.to_vec())),
    }
}

/// State of one document build.
struct Pass<'a> {
    catalog: &'a SpecCatalog,
    config: &'a RstConfig,
    reported: HashSet<String>,
    warnings: Vec<Diagnostic>,
    unresolved: Vec<String>,
    /// Unresolved names met in the section being built.
    section_unresolved: Vec<String>,
}

impl<'a> Pass<'a> {
    fn new(catalog: &'a SpecCatalog, config: &'a RstConfig) -> Self {
        Self {
            catalog,
            config,
            reported: HashSet::new(),
            warnings: Vec::new(),
            unresolved: Vec::new(),
            section_unresolved: Vec::new(),
        }
    }

    fn finish(self, section: DocumentSection) -> Generated {
        debug!(
            title = section.title,
            unresolved = self.unresolved.len();
            "Document section built"
        );
        Generated {
            section,
            warnings: self.warnings,
            unresolved: self.unresolved,
        }
    }

    fn type_section(&mut self, node: &TypeNode, level: HeadingLevel) -> DocumentSection {
        self.section_unresolved.clear();
        let name = node.key.name();
        let mut section = DocumentSection::new(name, level).with_label(section_label(name));

        let mut body = Vec::new();
        if !node.doc.trim().is_empty() {
            body.push(Block::Paragraph(clean_doc(&node.doc, "\n\n")));
        }
        if let Some(owner) = &node.contained_in {
            body.push(Block::Paragraph(format!(
                "Defined inside {}.",
                reference(owner.name(), &section_label(owner.name()))
            )));
        }
        body.push(Block::PropertyList(self.properties(node)));

        let table = self.field_table(node);
        if table.rows().len() > 1 {
            body.push(Block::FieldTable(table));
        }

        if self.config.show_yaml_source() {
            match serde_yaml::to_string(&node.raw) {
                Ok(yaml) => {
                    body.push(Block::Paragraph("**YAML Specification:**".to_string()));
                    body.push(Block::Code {
                        language: "yaml".to_string(),
                        text: yaml,
                    });
                }
                Err(err) => warn!(key = node.key.to_string(), err:err; "Failed to serialize YAML source"),
            }
        }

        if !self.section_unresolved.is_empty() {
            let names: Vec<String> = self.section_unresolved.iter().map(|name| literal(name)).collect();
            section.push(Block::Warning(format!(
                "Unresolved type references: {}",
                names.join(", ")
            )));
        }
        section.blocks.extend(body);
        section
    }

    fn properties(&mut self, node: &TypeNode) -> Vec<Property> {
        let key = &node.key;
        let mut properties = vec![Property::text("Neurodata Type", key.name())];
        if let Some(parent) = &node.parent {
            let extends = self.type_ref(parent, key);
            properties.push(Property::text("Extends", extends));
        }
        properties.push(Property::text("Primitive Type", node.kind.as_str()));
        properties.push(Property::text("Namespace", key.namespace()));
        if let Some(quantity) = node.quantity {
            properties.push(Property::text("Quantity", quantity.describe()));
        }
        if let Some(dtype) = &node.dtype {
            let dtype = self.dtype(dtype, key, false);
            properties.push(Property::text("Data Type", dtype));
        }
        if let Some(dims) = &node.dims {
            properties.push(Property::text("Dimensions", dims.as_str()));
        }
        if let Some(shape) = &node.shape {
            properties.push(Property::text("Shape", shape.as_str()));
        }
        if let Some(linkable) = node.linkable {
            properties.push(Property::text("Linkable", linkable.to_string()));
        }
        if let Some(default_name) = &node.default_name {
            properties.push(Property::text("Default Name", default_name.as_str()));
        }
        if let Some(name) = &node.name {
            properties.push(Property::text("Name", name.as_str()));
        }

        let mut seen = HashSet::new();
        let includes: Vec<&TypeRef> = node
            .includes()
            .into_iter()
            .filter(|reference| seen.insert(reference.name()))
            .collect();
        if !includes.is_empty() {
            let links: Vec<String> = includes
                .into_iter()
                .map(|reference| self.type_ref(reference, key))
                .collect();
            properties.push(Property::text("Includes", links.join(", ")));
        }
        properties
    }

    /// Field table with inherited members flattened in, root-most ancestor
    /// first. An own member replaces an inherited one of the same name in
    /// place.
    fn field_table(&mut self, node: &TypeNode) -> GridTable {
        let mut table = GridTable::new(&FIELD_COLUMNS).with_title(format!(
            "Members of {}",
            literal(node.key.name())
        ));

        let kind = node.kind.as_str();
        let type_cell = match &node.dtype {
            Some(dtype) => self.dtype(dtype, &node.key, true),
            None => String::new(),
        };
        table.add_row(vec![
            node.name
                .clone()
                .unwrap_or_else(|| format!("<{}>", node.key.name())),
            kind.to_string(),
            type_cell,
            node.quantity.unwrap_or_default().describe(),
            format!("Top level {kind} for {}", node.key.name()),
        ]);

        let catalog = self.catalog;
        let mut chain = catalog.ancestors(&node.key);
        chain.reverse();
        chain.push(node);

        let mut rows: Vec<(&FieldEntry, Option<&TypeKey>)> = Vec::new();
        let mut positions: HashMap<String, (usize, usize)> = HashMap::new();
        for (level, owner) in chain.iter().enumerate() {
            let origin = (owner.key != node.key).then_some(&owner.key);
            for field in &owner.fields {
                let name = field.display_name();
                match positions.get(&name).copied() {
                    Some((position, defined_at)) if defined_at < level => {
                        rows[position] = (field, origin);
                        positions.insert(name, (position, level));
                    }
                    _ => {
                        positions.insert(name, (rows.len(), level));
                        rows.push((field, origin));
                    }
                }
            }
        }

        for (field, origin) in rows {
            self.field_rows(&mut table, field, 1, origin, &node.key);
        }
        table
    }

    fn field_rows(
        &mut self,
        table: &mut GridTable,
        field: &FieldEntry,
        depth: usize,
        origin: Option<&TypeKey>,
        owner: &TypeKey,
    ) {
        let id: String = std::iter::repeat_n(self.config.depth_char(), depth)
            .chain(field.display_name().chars())
            .collect();
        let type_cell = self.field_type(field, owner);
        let description = self.field_description(field, origin, owner);
        table.add_row(vec![
            id,
            field.node_kind().as_str().to_string(),
            type_cell,
            field.cardinality().describe(),
            description,
        ]);

        for child in &field.children {
            self.field_rows(table, child, depth + 1, origin, owner);
        }
    }

    fn field_type(&mut self, field: &FieldEntry, owner: &TypeKey) -> String {
        if let Some(defined) = &field.defines {
            return reference(defined.name(), &section_label(defined.name()));
        }
        if let Some(included) = &field.includes {
            return self.type_ref(included, owner);
        }
        if let Some(target) = &field.target {
            return format!("link to {}", self.type_ref(target, owner));
        }
        match &field.dtype {
            Some(dtype) => self.dtype(dtype, owner, true),
            None => String::new(),
        }
    }

    fn field_description(
        &mut self,
        field: &FieldEntry,
        origin: Option<&TypeKey>,
        owner: &TypeKey,
    ) -> String {
        let mut parts = Vec::new();
        let doc = clean_doc(&single_line(&field.doc), "\n\n");
        if !doc.trim().is_empty() {
            parts.push(doc.trim_start().to_string());
        }
        if let Some(dtype @ DataType::Compound(_)) = &field.dtype {
            parts.push(self.dtype(dtype, owner, false));
        }

        let details = [
            ("Dimensions", &field.dims),
            ("Shape", &field.shape),
            ("Value", &field.value),
            ("Default Value", &field.default_value),
            ("Default Name", &field.default_name),
        ];
        for (name, value) in details {
            if let Some(value) = value {
                parts.push(format!("- **{name}:** {value}"));
            }
        }
        if let Some(linkable) = field.linkable {
            parts.push(format!("- **Linkable:** {linkable}"));
        }
        if let Some(origin) = origin {
            parts.push(format!(
                "*Inherited from* {}",
                reference(origin.name(), &section_label(origin.name()))
            ));
        }
        parts.join("\n\n")
    }

    /// Text of a data type; `compact` abbreviates compound types.
    fn dtype(&mut self, dtype: &DataType, owner: &TypeKey, compact: bool) -> String {
        match dtype {
            DataType::Primitive(name) => name.clone(),
            DataType::Reference { target, reftype } => {
                format!("{reftype} reference to {}", self.type_ref(target, owner))
            }
            DataType::Compound(_) if compact => "compound".to_string(),
            DataType::Compound(fields) => {
                let mut text = String::from("Compound data type with the following elements:");
                for field in fields {
                    let dtype = self.dtype(&field.dtype, owner, true);
                    text.push_str(&format!(
                        "\n\n* **{}:** {} (*dtype=* {dtype} )",
                        field.name,
                        single_line(&field.doc)
                    ));
                }
                text
            }
        }
    }

    /// Cross-reference to a referenced type. Unresolved names render as
    /// literals and are reported once per document.
    fn type_ref(&mut self, reference_to: &TypeRef, owner: &TypeKey) -> String {
        match reference_to.target() {
            Some(key) => reference(key.name(), &section_label(key.name())),
            None if reference_to.is_builtin() => literal(reference_to.name()),
            None => {
                let name = reference_to.name();
                if !self.section_unresolved.iter().any(|seen| seen == name) {
                    self.section_unresolved.push(name.to_string());
                }
                if self.reported.insert(name.to_string()) {
                    self.unresolved.push(name.to_string());
                    self.warnings.push(
                        Diagnostic::warning(format!(
                            "unresolved type `{name}` referenced by `{owner}`"
                        ))
                        .with_code(ErrorCode::E100)
                        .with_subject(name),
                    );
                }
                format!("{} (unresolved)", literal(name))
            }
        }
    }
}
