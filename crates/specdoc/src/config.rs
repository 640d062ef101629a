//! Configuration types for diagram and document generation.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so
//! a configuration file only needs to name the settings it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`HierarchyConfig`] - Traversal depth, direction and duplicate root policy.
//! - [`RstConfig`] - Ordering and layout of generated documents.
//! - [`StyleConfig`] - Diagram colors.
//!
//! # Example
//!
//! ```
//! # use specdoc::config::{AppConfig, Direction};
//! let config = AppConfig::default();
//! assert_eq!(config.hierarchy().direction(), Direction::Ancestors);
//! assert!(config.style().background_color().is_ok());
//! ```

use serde::Deserialize;

use specdoc_schema::CatalogOptions;

use crate::color::Color;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    hierarchy: HierarchyConfig,

    #[serde(default)]
    rst: RstConfig,

    #[serde(default)]
    style: StyleConfig,

    /// Type names accepted as parents or references without a definition.
    #[serde(default)]
    builtin_types: Vec<String>,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(hierarchy: HierarchyConfig, rst: RstConfig, style: StyleConfig) -> Self {
        Self {
            hierarchy,
            rst,
            style,
            builtin_types: Vec::new(),
        }
    }

    /// Returns the hierarchy section.
    pub fn hierarchy(&self) -> &HierarchyConfig {
        &self.hierarchy
    }

    /// Returns the hierarchy section for modification.
    pub fn hierarchy_mut(&mut self) -> &mut HierarchyConfig {
        &mut self.hierarchy
    }

    /// Returns the RST section.
    pub fn rst(&self) -> &RstConfig {
        &self.rst
    }

    /// Returns the style section.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns the configured built-in types.
    pub fn builtin_types(&self) -> &[String] {
        &self.builtin_types
    }

    /// Replaces the built-in types.
    pub fn with_builtin_types(mut self, builtin_types: Vec<String>) -> Self {
        self.builtin_types = builtin_types;
        self
    }

    /// Options handed to catalog normalization.
    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            builtin_types: self.builtin_types.clone(),
        }
    }
}

/// Which edges a hierarchy traversal follows from a root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Child to parent, plus composition.
    #[default]
    Ancestors,
    /// Parent to subtypes, plus composition.
    Descendants,
}

/// What happens when the same diagram would be produced twice in one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateRoots {
    /// Warn and keep the first artifact.
    #[default]
    Skip,
    /// Render again and replace the artifact.
    Overwrite,
}

/// Hierarchy diagram settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HierarchyConfig {
    /// Maximum traversal depth; unlimited when absent.
    #[serde(default)]
    max_depth: Option<usize>,

    #[serde(default)]
    direction: Direction,

    #[serde(default)]
    duplicate_roots: DuplicateRoots,
}

impl HierarchyConfig {
    /// Creates a hierarchy section.
    pub fn new(
        max_depth: Option<usize>,
        direction: Direction,
        duplicate_roots: DuplicateRoots,
    ) -> Self {
        Self {
            max_depth,
            direction,
            duplicate_roots,
        }
    }

    /// Returns the depth limit.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Overrides the depth limit.
    pub fn set_max_depth(&mut self, max_depth: Option<usize>) -> &mut Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the traversal direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the duplicate root policy.
    pub fn duplicate_roots(&self) -> DuplicateRoots {
        self.duplicate_roots
    }
}

/// Order in which types are documented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeOrder {
    #[default]
    Definition,
    Alphabetical,
    /// Parents before subtypes, ties in definition order.
    Dependency,
}

/// RST generation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RstConfig {
    #[serde(default)]
    order: TypeOrder,

    #[serde(default = "default_true")]
    group_by_source: bool,

    #[serde(default)]
    show_yaml_source: bool,

    #[serde(default = "default_depth_char")]
    depth_char: char,
}

fn default_true() -> bool {
    true
}

fn default_depth_char() -> char {
    '.'
}

impl Default for RstConfig {
    fn default() -> Self {
        Self {
            order: TypeOrder::default(),
            group_by_source: true,
            show_yaml_source: false,
            depth_char: default_depth_char(),
        }
    }
}

impl RstConfig {
    /// Creates an RST section.
    pub fn new(order: TypeOrder, group_by_source: bool, show_yaml_source: bool) -> Self {
        Self {
            order,
            group_by_source,
            show_yaml_source,
            depth_char: default_depth_char(),
        }
    }

    /// Returns the type order.
    pub fn order(&self) -> TypeOrder {
        self.order
    }

    /// Whether types are grouped into one section per schema source.
    pub fn group_by_source(&self) -> bool {
        self.group_by_source
    }

    /// Whether each type section lists its YAML source.
    pub fn show_yaml_source(&self) -> bool {
        self.show_yaml_source
    }

    /// Character used to indent nested ids in field tables.
    pub fn depth_char(&self) -> char {
        self.depth_char
    }
}

/// Diagram colors, as CSS color strings.
///
/// Fields that are not set fall back to renderer defaults.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    #[serde(default)]
    background_color: Option<String>,

    #[serde(default)]
    group_color: Option<String>,

    #[serde(default)]
    dataset_color: Option<String>,

    #[serde(default)]
    external_color: Option<String>,

    #[serde(default)]
    edge_color: Option<String>,
}

impl StyleConfig {
    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        parse_color("background", self.background_color.as_deref())
    }

    /// Returns the fill color of group nodes.
    pub fn group_color(&self) -> Result<Option<Color>, String> {
        parse_color("group", self.group_color.as_deref())
    }

    /// Returns the fill color of dataset nodes.
    pub fn dataset_color(&self) -> Result<Option<Color>, String> {
        parse_color("dataset", self.dataset_color.as_deref())
    }

    /// Returns the fill color of nodes from other namespaces.
    pub fn external_color(&self) -> Result<Option<Color>, String> {
        parse_color("external", self.external_color.as_deref())
    }

    /// Returns the stroke color of edges.
    pub fn edge_color(&self) -> Result<Option<Color>, String> {
        parse_color("edge", self.edge_color.as_deref())
    }
}

fn parse_color(name: &str, value: Option<&str>) -> Result<Option<Color>, String> {
    value
        .map(Color::new)
        .transpose()
        .map_err(|err| format!("Invalid {name} color in config: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.hierarchy().max_depth(), None);
        assert_eq!(config.hierarchy().duplicate_roots(), DuplicateRoots::Skip);
        assert_eq!(config.rst().order(), TypeOrder::Definition);
        assert!(config.rst().group_by_source());
        assert!(!config.rst().show_yaml_source());
        assert_eq!(config.rst().depth_char(), '.');
        assert!(config.builtin_types().is_empty());
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: AppConfig = toml::from_str(
            r##"
builtin_types = ["Data", "Container"]

[hierarchy]
max_depth = 2
direction = "descendants"
duplicate_roots = "overwrite"

[rst]
order = "dependency"
group_by_source = false

[style]
group_color = "#ffcc00"
"##,
        )
        .unwrap();

        assert_eq!(config.hierarchy().max_depth(), Some(2));
        assert_eq!(config.hierarchy().direction(), Direction::Descendants);
        assert_eq!(config.hierarchy().duplicate_roots(), DuplicateRoots::Overwrite);
        assert_eq!(config.rst().order(), TypeOrder::Dependency);
        assert!(!config.rst().group_by_source());
        assert_eq!(config.rst().depth_char(), '.');
        assert!(config.style().group_color().unwrap().is_some());
        assert_eq!(config.catalog_options().builtin_types.len(), 2);
    }

    #[test]
    fn test_invalid_color_reports_section() {
        let config: AppConfig = toml::from_str("[style]\nedge_color = \"not-a-color\"\n").unwrap();

        let err = config.style().edge_color().unwrap_err();
        assert!(err.contains("edge"));
    }
}
