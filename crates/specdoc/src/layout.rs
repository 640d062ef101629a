//! Layered placement of render graph nodes.
//!
//! Positions come from the Sugiyama implementation in `rust-sugiyama`.
//! Parents are placed above their subtypes and owners above the types they
//! include. Nodes without any edge are arranged in a row next to the
//! layered components.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, warn};
use rust_sugiyama::configure::Config;

use crate::{
    geometry::{Bounds, Point, Size},
    hierarchy::{EdgeKind, RenderGraph},
};

/// Font size of node labels.
pub const LABEL_FONT_SIZE: f32 = 14.0;
/// Font size of the kind and namespace line under a label.
pub const CAPTION_FONT_SIZE: f32 = 11.0;

const SUGIYAMA_VERTEX_SPACING: f64 = 3.0;

/// Errors raised by the layout backend.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("layout backend panicked: {0}")]
    Panicked(String),

    #[error("layout backend returned no position for `{0}`")]
    MissingPosition(String),
}

/// Placement of one node, by render graph index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBox {
    center: Point,
    size: Size,
}

impl NodeBox {
    /// Center of the box in diagram coordinates.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Width and height, sized to fit the label.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Corners of the box.
    pub fn bounds(&self) -> Bounds {
        self.center.to_bounds(self.size)
    }
}

/// Positions of every node of a render graph.
#[derive(Debug, Clone, Default)]
pub struct DiagramLayout {
    boxes: Vec<NodeBox>,
    size: Size,
}

impl DiagramLayout {
    /// Box of the node at `index`.
    pub fn node_box(&self, index: usize) -> Option<&NodeBox> {
        self.boxes.get(index)
    }

    /// Every box, indexed like the graph's nodes.
    pub fn boxes(&self) -> &[NodeBox] {
        &self.boxes
    }

    /// Size of the area covered by all boxes, including the margin.
    pub fn size(&self) -> Size {
        self.size
    }
}

/// Estimate the rendered width of `text` at `font_size`.
pub fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.6
}

/// The layered layout engine.
#[derive(Debug, Clone)]
pub struct Engine {
    /// Padding around node text.
    text_padding: f32,

    /// Horizontal spacing between nodes.
    horizontal_spacing: f32,

    /// Vertical spacing between layers.
    vertical_spacing: f32,

    /// Empty space around the whole diagram.
    margin: f32,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            text_padding: 12.0,
            horizontal_spacing: 40.0,
            vertical_spacing: 70.0,
            margin: 30.0,
        }
    }

    /// Set the horizontal spacing between nodes
    pub fn set_horizontal_spacing(&mut self, spacing: f32) -> &mut Self {
        self.horizontal_spacing = spacing;
        self
    }

    /// Set the vertical spacing between layers
    pub fn set_vertical_spacing(&mut self, spacing: f32) -> &mut Self {
        self.vertical_spacing = spacing;
        self
    }

    /// Size of the box drawn for a node with this label and caption.
    pub fn node_size(&self, label: &str, caption: &str) -> Size {
        let width = estimate_text_width(label, LABEL_FONT_SIZE)
            .max(estimate_text_width(caption, CAPTION_FONT_SIZE));
        let height = (LABEL_FONT_SIZE + CAPTION_FONT_SIZE) * 1.2;
        Size::new(width, height).add_padding(self.text_padding)
    }

    /// Place every node of `graph`.
    pub fn layout(&self, graph: &RenderGraph) -> Result<DiagramLayout, LayoutError> {
        let sizes: Vec<Size> = graph
            .nodes()
            .map(|node| self.node_size(node.label(), &caption(node.kind().as_str(), node.namespace())))
            .collect();
        if sizes.is_empty() {
            return Ok(DiagramLayout::default());
        }

        let edges = layered_edges(graph);
        let cells = if edges.is_empty() {
            HashMap::new()
        } else {
            run_sugiyama(edges)?
        };

        let column_width = sizes
            .iter()
            .map(|size| size.width())
            .fold(0.0_f32, f32::max)
            + self.horizontal_spacing;
        let row_height = sizes
            .iter()
            .map(|size| size.height())
            .fold(0.0_f32, f32::max)
            + self.vertical_spacing;

        let positioning_columns = cells
            .values()
            .map(|&(column, _)| column + 1.0)
            .fold(0.0_f32, f32::max);
        let mut next_isolated_column = positioning_columns;

        let mut boxes = Vec::with_capacity(sizes.len());
        for (index, size) in sizes.iter().enumerate() {
            let (column, row) = match cells.get(&index) {
                Some(&cell) => cell,
                None => {
                    let cell = (next_isolated_column, 0.0);
                    next_isolated_column += 1.0;
                    cell
                }
            };
            let center = Point::new(
                self.margin + column_width * (column + 0.5),
                self.margin + row_height * (row + 0.5),
            );
            boxes.push(NodeBox {
                center,
                size: *size,
            });
        }

        let bounds = boxes
            .iter()
            .skip(1)
            .map(NodeBox::bounds)
            .fold(boxes[0].bounds(), |acc, bounds| acc.merge(&bounds));
        let size = Size::new(
            bounds.max_x() + self.margin,
            bounds.max_y() + self.margin,
        );

        debug!(nodes = boxes.len(), width = size.width(), height = size.height(); "Layout calculated");
        Ok(DiagramLayout { boxes, size })
    }
}

/// The caption under a node label.
pub fn caption(kind: &str, namespace: &str) -> String {
    format!("{kind} | {namespace}")
}

/// Edges oriented from the upper to the lower layer, without self loops
/// or duplicates.
fn layered_edges(graph: &RenderGraph) -> Vec<(u32, u32)> {
    let mut seen = HashSet::new();
    graph
        .edges()
        .iter()
        .map(|edge| match edge.kind() {
            EdgeKind::Inherits => (edge.target(), edge.source()),
            EdgeKind::Includes | EdgeKind::Contains => (edge.source(), edge.target()),
        })
        .filter(|(upper, lower)| upper != lower)
        .map(|(upper, lower)| (upper as u32, lower as u32))
        .filter(|edge| seen.insert(*edge))
        .collect()
}

/// Run the backend and convert its coordinates into `(column, row)` cells.
///
/// Connected components are placed left to right. Rows are the ranks of
/// the distinct y values of a component, oriented so that edge sources sit
/// above edge targets.
fn run_sugiyama(edges: Vec<(u32, u32)>) -> Result<HashMap<usize, (f32, f32)>, LayoutError> {
    debug!(edges = edges.len(); "Applying Sugiyama algorithm");
    let probe = edges.clone();
    let layouts = std::panic::catch_unwind(move || {
        let config = Config {
            minimum_length: 1,
            vertex_spacing: SUGIYAMA_VERTEX_SPACING,
            ..Default::default()
        };
        rust_sugiyama::from_edges(&edges, &config)
    })
    .map_err(|err| {
        let message = err
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_else(|| "unknown error".to_string());
        warn!(err = message; "Sugiyama layout failed");
        LayoutError::Panicked(message)
    })?;

    let mut cells = HashMap::new();
    let mut column_offset = 0.0_f32;

    for (coords, _, _) in &layouts {
        let positions: HashMap<usize, (f64, f64)> = coords.iter().copied().collect();
        let (mut downward, mut upward) = (0_usize, 0_usize);
        for (upper, lower) in &probe {
            if let (Some(upper), Some(lower)) = (
                positions.get(&(*upper as usize)),
                positions.get(&(*lower as usize)),
            ) {
                if upper.1 < lower.1 {
                    downward += 1;
                } else if upper.1 > lower.1 {
                    upward += 1;
                }
            }
        }
        let flip = upward > downward;

        // Ranks of distinct y values; coordinates are exact multiples in
        // practice, rounding guards against float noise.
        let rows: BTreeSet<i64> = coords.iter().map(|(_, (_, y))| y.round() as i64).collect();
        let rows: Vec<i64> = rows.into_iter().collect();
        let min_x = coords
            .iter()
            .map(|(_, (x, _))| *x)
            .fold(f64::INFINITY, f64::min);

        let mut widest = 0.0_f32;
        for &(id, (x, y)) in coords {
            let rank = rows.binary_search(&(y.round() as i64)).unwrap_or_default();
            let row = if flip { rows.len() - 1 - rank } else { rank };
            let column = ((x - min_x) / SUGIYAMA_VERTEX_SPACING) as f32;
            widest = widest.max(column + 1.0);
            cells.insert(id, (column_offset + column, row as f32));
        }
        column_offset += widest;
    }

    for (upper, lower) in &probe {
        for id in [*upper as usize, *lower as usize] {
            if !cells.contains_key(&id) {
                return Err(LayoutError::MissingPosition(id.to_string()));
            }
        }
    }

    Ok(cells)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use specdoc_schema::{CatalogOptions, InMemory, TypeKey, load_catalog};

    use super::*;
    use crate::hierarchy::{TraversalOptions, build_hierarchy};

    fn graph(types: &str, roots: &[&str]) -> RenderGraph {
        let files = InMemory::new()
            .with_file(
                "core.yaml",
                "namespaces:\n- name: core\n  schema:\n  - source: types.yaml\n",
            )
            .with_file("types.yaml", types);
        let catalog = load_catalog(&files, &[PathBuf::from("core.yaml")], &CatalogOptions::default())
            .unwrap()
            .catalog;
        let roots: Vec<TypeKey> = roots.iter().map(|name| TypeKey::new("core", *name)).collect();
        build_hierarchy(&catalog, &roots, Some("core"), TraversalOptions::default()).graph
    }

    #[test]
    fn test_empty_graph() {
        let layout = Engine::new().layout(&RenderGraph::default()).unwrap();

        assert!(layout.boxes().is_empty());
    }

    #[test]
    fn test_isolated_nodes_in_a_row() {
        let graph = graph("groups:\n- data_type_def: A\n- data_type_def: B\n", &["A", "B"]);
        let layout = Engine::new().layout(&graph).unwrap();

        let a = layout.node_box(0).unwrap().center();
        let b = layout.node_box(1).unwrap().center();
        assert_eq!(a.y(), b.y());
        assert!(a.x() < b.x());
    }

    #[test]
    fn test_parent_above_child() {
        let graph = graph(
            "groups:\n- data_type_def: Parent\n- data_type_def: Child\n  data_type_inc: Parent\n",
            &["Child"],
        );
        let layout = Engine::new().layout(&graph).unwrap();

        let child = layout.node_box(0).unwrap().center();
        let parent = layout.node_box(1).unwrap().center();
        assert!(parent.y() < child.y());
        assert!(layout.size().height() > parent.y());
    }

    #[test]
    fn test_boxes_inside_canvas() {
        let graph = graph(
            "groups:\n- data_type_def: A\n  groups:\n  - data_type_inc: B\n  - data_type_inc: C\n- data_type_def: B\n- data_type_def: C\n  groups:\n  - data_type_inc: A\n",
            &["A"],
        );
        let layout = Engine::new().layout(&graph).unwrap();

        assert_eq!(layout.boxes().len(), 3);
        for node in layout.boxes() {
            let bounds = node.bounds();
            assert!(bounds.min_x() >= 0.0 && bounds.min_y() >= 0.0);
            assert!(bounds.max_x() <= layout.size().width());
            assert!(bounds.max_y() <= layout.size().height());
        }
    }

    #[test]
    fn test_node_size_grows_with_label() {
        let engine = Engine::new();
        let short = engine.node_size("A", "Group | core");
        let long = engine.node_size("AVeryLongTypeNameIndeed", "Group | core");

        assert!(long.width() > short.width());
        assert_eq!(long.height(), short.height());
    }
}
