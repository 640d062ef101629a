//! Intermediate representation of a generated document.

use super::table::GridTable;

/// Heading levels, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeadingLevel {
    Part,
    Chapter,
    Section,
    Subsection,
    Subsubsection,
    Paragraph,
}

impl HeadingLevel {
    /// Character used to underline a title of this level.
    pub fn marker(self) -> char {
        match self {
            HeadingLevel::Part => '#',
            HeadingLevel::Chapter => '*',
            HeadingLevel::Section => '=',
            HeadingLevel::Subsection => '-',
            HeadingLevel::Subsubsection => '^',
            HeadingLevel::Paragraph => '"',
        }
    }

    /// Parts and chapters are overlined as well as underlined.
    pub fn has_overline(self) -> bool {
        matches!(self, HeadingLevel::Part | HeadingLevel::Chapter)
    }

    /// The level directly below this one; paragraphs are the deepest level.
    pub fn child(self) -> Self {
        match self {
            HeadingLevel::Part => HeadingLevel::Chapter,
            HeadingLevel::Chapter => HeadingLevel::Section,
            HeadingLevel::Section => HeadingLevel::Subsection,
            HeadingLevel::Subsection => HeadingLevel::Subsubsection,
            HeadingLevel::Subsubsection | HeadingLevel::Paragraph => HeadingLevel::Paragraph,
        }
    }
}

/// One entry of a property list.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    /// Rendered as a nested list under the property name.
    List(Vec<String>),
}

impl Property {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PropertyValue::Text(value.into()),
        }
    }

    pub fn list(name: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            name: name.into(),
            value: PropertyValue::List(items),
        }
    }
}

/// An item of a bullet tree with its nested items.
#[derive(Debug, Clone, PartialEq)]
pub struct BulletItem {
    pub text: String,
    pub children: Vec<BulletItem>,
}

impl BulletItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            children: Vec::new(),
        }
    }
}

/// A body element of a section.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(String),
    PropertyList(Vec<Property>),
    BulletTree(Vec<BulletItem>),
    FieldTable(GridTable),
    Code { language: String, text: String },
    Warning(String),
}

/// A titled section with its blocks and subsections.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSection {
    pub title: String,
    pub label: Option<String>,
    pub level: HeadingLevel,
    pub blocks: Vec<Block>,
    pub subsections: Vec<DocumentSection>,
}

impl DocumentSection {
    pub fn new(title: impl Into<String>, level: HeadingLevel) -> Self {
        Self {
            title: title.into(),
            label: None,
            level,
            blocks: Vec::new(),
            subsections: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Find a section by label in this tree, depth first.
    pub fn find(&self, label: &str) -> Option<&DocumentSection> {
        if self.label.as_deref() == Some(label) {
            return Some(self);
        }
        self.subsections
            .iter()
            .find_map(|section| section.find(label))
    }
}

/// Label of the section documenting a type.
pub fn section_label(type_name: &str) -> String {
    format!("sec-{type_name}")
}

/// Inline cross-reference to a labeled section.
pub fn reference(title: &str, label: &str) -> String {
    format!(":ref:`{title} <{label}>`")
}

/// Inline literal text.
pub fn literal(text: &str) -> String {
    format!("``{text}``")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_levels_bottom_out() {
        assert_eq!(HeadingLevel::Section.child(), HeadingLevel::Subsection);
        assert_eq!(HeadingLevel::Paragraph.child(), HeadingLevel::Paragraph);
    }

    #[test]
    fn test_find_nested_section() {
        let mut root = DocumentSection::new("Root", HeadingLevel::Section);
        let mut source = DocumentSection::new("Source", HeadingLevel::Subsection);
        source
            .subsections
            .push(DocumentSection::new("B", HeadingLevel::Subsubsection).with_label(section_label("B")));
        root.subsections.push(source);

        assert_eq!(root.find("sec-B").map(|s| s.title.as_str()), Some("B"));
        assert!(root.find("sec-C").is_none());
    }

    #[test]
    fn test_reference_markup() {
        assert_eq!(reference("A", &section_label("A")), ":ref:`A <sec-A>`");
        assert_eq!(literal("Ghost"), "``Ghost``");
    }
}
