//! SVG rendering of hierarchy diagrams.

mod markers;

use std::collections::HashMap;

use log::debug;
use svg::{
    Document,
    node::element::{Group, Path, Rectangle, Text},
};

use specdoc_schema::NodeKind;

use crate::{
    color::Color,
    config::StyleConfig,
    export::{self, Exporter},
    geometry::Point,
    hierarchy::{GraphEdge, GraphNode, RenderGraph},
    layout::{CAPTION_FONT_SIZE, DiagramLayout, LABEL_FONT_SIZE, NodeBox, caption},
};

/// Distance between parallel edges of the same node pair.
const PARALLEL_EDGE_OFFSET: f32 = 8.0;

const DEFAULT_GROUP_COLOR: &str = "#dbe9f6";
const DEFAULT_DATASET_COLOR: &str = "#fde9c9";
const DEFAULT_EXTERNAL_COLOR: &str = "#eeeeee";
const DEFAULT_STROKE_COLOR: &str = "#333333";

/// Builder for [`Svg`] exporters.
#[derive(Debug, Default)]
pub struct SvgBuilder<'a> {
    style: Option<&'a StyleConfig>,
}

impl<'a> SvgBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the colors of `style`; unset colors keep their defaults.
    pub fn with_style(mut self, style: &'a StyleConfig) -> Self {
        self.style = Some(style);
        self
    }

    /// Resolve every color.
    ///
    /// # Errors
    ///
    /// Returns [`export::Error::Render`] when a configured color does not
    /// parse.
    pub fn build(self) -> Result<Svg, export::Error> {
        let default_style = StyleConfig::default();
        let style = self.style.unwrap_or(&default_style);

        let pick = |configured: Result<Option<Color>, String>, fallback: &str| {
            configured
                .and_then(|color| match color {
                    Some(color) => Ok(color),
                    None => Color::new(fallback),
                })
                .map_err(export::Error::Render)
        };

        Ok(Svg {
            background: style.background_color().map_err(export::Error::Render)?,
            group_fill: pick(style.group_color(), DEFAULT_GROUP_COLOR)?,
            dataset_fill: pick(style.dataset_color(), DEFAULT_DATASET_COLOR)?,
            external_fill: pick(style.external_color(), DEFAULT_EXTERNAL_COLOR)?,
            stroke: pick(style.edge_color(), DEFAULT_STROKE_COLOR)?,
        })
    }
}

/// SVG exporter with resolved colors.
#[derive(Debug, Clone)]
pub struct Svg {
    background: Option<Color>,
    group_fill: Color,
    dataset_fill: Color,
    external_fill: Color,
    stroke: Color,
}

impl Svg {
    /// Render a laid out graph into an SVG document.
    pub fn render(&self, graph: &RenderGraph, layout: &DiagramLayout) -> Document {
        let size = layout.size();
        let mut doc = Document::new()
            .set("viewBox", format!("0 0 {} {}", size.width(), size.height()))
            .set("width", size.width())
            .set("height", size.height())
            .add(markers::create_marker_definitions(&self.stroke));

        if let Some(background) = &self.background {
            doc = doc.add(
                Rectangle::new()
                    .set("x", 0)
                    .set("y", 0)
                    .set("width", size.width())
                    .set("height", size.height())
                    .set("fill", background),
            );
        }

        let mut edges = Group::new().set("class", "edges");
        for (edge, offset) in edges_with_offsets(graph.edges()) {
            let (Some(source), Some(target)) =
                (layout.node_box(edge.source()), layout.node_box(edge.target()))
            else {
                continue;
            };
            edges = edges.add(self.render_edge(edge, source, target, offset));
        }

        let mut nodes = Group::new().set("class", "nodes");
        for (index, node) in graph.nodes().enumerate() {
            let Some(node_box) = layout.node_box(index) else {
                continue;
            };
            nodes = nodes.add(self.render_node(node, node_box));
        }

        debug!(nodes = graph.len(), edges = graph.edges().len(); "SVG document rendered");
        doc.add(edges).add(nodes)
    }

    fn fill_for(&self, node: &GraphNode) -> &Color {
        if node.is_external() {
            return &self.external_fill;
        }
        match node.kind() {
            NodeKind::Dataset => &self.dataset_fill,
            NodeKind::Group | NodeKind::Attribute | NodeKind::Link => &self.group_fill,
        }
    }

    fn render_node(&self, node: &GraphNode, node_box: &NodeBox) -> Group {
        let bounds = node_box.bounds();
        let center = node_box.center();

        let mut class = format!("node {}", node.kind().as_str().to_lowercase());
        if node.is_external() {
            class.push_str(" external");
        }

        let mut rect = Rectangle::new()
            .set("x", bounds.min_x())
            .set("y", bounds.min_y())
            .set("width", bounds.width())
            .set("height", bounds.height())
            .set("fill", self.fill_for(node))
            .set("stroke", &self.stroke)
            .set("stroke-width", 1.5);
        if node.kind() == NodeKind::Group {
            rect = rect.set("rx", 6);
        }
        if node.is_external() {
            rect = rect.set("stroke-dasharray", "4 3");
        }

        let label = Text::new(node.label())
            .set("x", center.x())
            .set("y", center.y() - CAPTION_FONT_SIZE * 0.4)
            .set("text-anchor", "middle")
            .set("font-family", "sans-serif")
            .set("font-size", LABEL_FONT_SIZE)
            .set("font-weight", "bold");

        let caption = Text::new(caption(node.kind().as_str(), node.namespace()))
            .set("x", center.x())
            .set("y", center.y() + LABEL_FONT_SIZE * 0.9)
            .set("text-anchor", "middle")
            .set("font-family", "sans-serif")
            .set("font-size", CAPTION_FONT_SIZE)
            .set("fill", "#555555");

        Group::new()
            .set("class", class)
            .set("data-type", node.key().to_string())
            .add(rect)
            .add(label)
            .add(caption)
    }

    fn render_edge(&self, edge: &GraphEdge, source: &NodeBox, target: &NodeBox, offset: f32) -> Path {
        let data = if edge.source() == edge.target() {
            self_loop_path(source)
        } else {
            let shift = perpendicular(source.center(), target.center(), offset);
            let start = source
                .bounds()
                .boundary_point(target.center().add_point(shift))
                .add_point(shift);
            let end = target
                .bounds()
                .boundary_point(source.center().add_point(shift))
                .add_point(shift);
            format!("M {} {} L {} {}", start.x(), start.y(), end.x(), end.y())
        };

        let mut path = Path::new()
            .set("d", data)
            .set("fill", "none")
            .set("stroke", &self.stroke)
            .set("stroke-width", 1.2);

        let (marker_start, marker_end) = markers::markers_for_edge(edge.kind(), &self.stroke);
        if let Some(marker) = marker_start {
            path = path.set("marker-start", marker);
        }
        if let Some(marker) = marker_end {
            path = path.set("marker-end", marker);
        }
        if let Some(dash) = markers::dash_for_edge(edge.kind()) {
            path = path.set("stroke-dasharray", dash);
        }
        path
    }
}

impl Exporter for Svg {
    fn export_hierarchy(
        &self,
        graph: &RenderGraph,
        layout: &DiagramLayout,
    ) -> Result<String, export::Error> {
        Ok(self.render(graph, layout).to_string())
    }
}

/// Pair every edge with its perpendicular offset; edges sharing a node pair
/// are spread around the straight line between the nodes.
fn edges_with_offsets(edges: &[GraphEdge]) -> Vec<(&GraphEdge, f32)> {
    let pair = |edge: &GraphEdge| {
        (
            edge.source().min(edge.target()),
            edge.source().max(edge.target()),
        )
    };

    let mut totals: HashMap<(usize, usize), usize> = HashMap::new();
    for edge in edges {
        *totals.entry(pair(edge)).or_default() += 1;
    }

    let mut seen: HashMap<(usize, usize), usize> = HashMap::new();
    edges
        .iter()
        .map(|edge| {
            let key = pair(edge);
            let total = totals.get(&key).copied().unwrap_or(1);
            let index = seen.entry(key).or_default();
            let offset = (*index as f32 - (total - 1) as f32 / 2.0) * PARALLEL_EDGE_OFFSET;
            *index += 1;
            (edge, offset)
        })
        .collect()
}

/// Unit normal of the segment `from -> to`, scaled by `offset`.
///
/// The normal is taken for the segment ordered by node position, so two
/// edges in opposite directions still land on opposite sides.
fn perpendicular(from: Point, to: Point, offset: f32) -> Point {
    if offset == 0.0 {
        return Point::default();
    }
    let (a, b) = if (from.x(), from.y()) <= (to.x(), to.y()) {
        (from, to)
    } else {
        (to, from)
    };
    let delta = b.sub_point(a);
    let length = delta.x().hypot(delta.y());
    if length == 0.0 {
        return Point::default();
    }
    Point::new(-delta.y() / length * offset, delta.x() / length * offset)
}

fn self_loop_path(node_box: &NodeBox) -> String {
    let bounds = node_box.bounds();
    let center = node_box.center();
    let top = Point::new(bounds.max_x(), center.y() - bounds.height() / 4.0);
    let bottom = Point::new(bounds.max_x(), center.y() + bounds.height() / 4.0);
    let reach = bounds.height() / 1.5;
    format!(
        "M {} {} C {} {}, {} {}, {} {}",
        top.x(),
        top.y(),
        top.x() + reach,
        top.y() - reach / 2.0,
        bottom.x() + reach,
        bottom.y() + reach / 2.0,
        bottom.x(),
        bottom.y()
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use specdoc_schema::{CatalogOptions, InMemory, TypeKey, load_catalog};

    use super::*;
    use crate::{
        hierarchy::{TraversalOptions, build_hierarchy, build_namespace_hierarchy},
        layout::Engine,
    };

    fn render(types: &str, root: &str) -> String {
        let files = InMemory::new()
            .with_file(
                "core.yaml",
                "namespaces:\n- name: core\n  schema:\n  - source: types.yaml\n",
            )
            .with_file("types.yaml", types);
        let catalog = load_catalog(&files, &[PathBuf::from("core.yaml")], &CatalogOptions::default())
            .unwrap()
            .catalog;
        let graph = build_hierarchy(
            &catalog,
            &[TypeKey::new("core", root)],
            Some("core"),
            TraversalOptions::default(),
        )
        .graph;
        let layout = Engine::new().layout(&graph).unwrap();
        SvgBuilder::new()
            .build()
            .unwrap()
            .export_hierarchy(&graph, &layout)
            .unwrap()
    }

    #[test]
    fn test_nodes_carry_type_keys() {
        let svg = render(
            "groups:\n- data_type_def: Parent\n- data_type_def: Child\n  data_type_inc: Parent\n",
            "Child",
        );

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("data-type=\"core:Child\""));
        assert!(svg.contains("data-type=\"core:Parent\""));
        assert!(svg.contains("marker-end=\"url(#inherits-"));
    }

    #[test]
    fn test_dataset_and_external_styles() {
        let files = InMemory::new()
            .with_file(
                "base.yaml",
                "namespaces:\n- name: base\n  schema:\n  - source: base.types.yaml\n",
            )
            .with_file(
                "ext.yaml",
                "namespaces:\n- name: ext\n  schema:\n  - namespace: base\n  - source: ext.types.yaml\n",
            )
            .with_file("base.types.yaml", "groups:\n- data_type_def: Root\n")
            .with_file(
                "ext.types.yaml",
                "datasets:\n- data_type_def: Table\n  data_type_inc: Root\n",
            );
        let catalog = load_catalog(
            &files,
            &[PathBuf::from("base.yaml"), PathBuf::from("ext.yaml")],
            &CatalogOptions::default(),
        )
        .unwrap()
        .catalog;
        let graph = build_namespace_hierarchy(&catalog, "ext", TraversalOptions::default()).graph;
        let layout = Engine::new().layout(&graph).unwrap();
        let svg = SvgBuilder::new().build().unwrap().render(&graph, &layout).to_string();

        assert!(svg.contains("class=\"node dataset\""));
        assert!(svg.contains("class=\"node group external\""));
        assert!(svg.contains("Dataset | ext"));
    }

    #[test]
    fn test_parallel_edges_are_offset() {
        let edges = build_pair_edges();
        let offsets: Vec<f32> = edges_with_offsets(&edges).into_iter().map(|(_, o)| o).collect();

        assert_eq!(offsets, vec![-4.0, 4.0]);
    }

    fn build_pair_edges() -> Vec<GraphEdge> {
        let files = InMemory::new()
            .with_file(
                "core.yaml",
                "namespaces:\n- name: core\n  schema:\n  - source: types.yaml\n",
            )
            .with_file(
                "types.yaml",
                "groups:\n- data_type_def: A\n- data_type_def: B\n  data_type_inc: A\n  groups:\n  - data_type_inc: A\n",
            );
        let catalog = load_catalog(&files, &[PathBuf::from("core.yaml")], &CatalogOptions::default())
            .unwrap()
            .catalog;
        build_hierarchy(
            &catalog,
            &[TypeKey::new("core", "B")],
            None,
            TraversalOptions::default(),
        )
        .graph
        .edges()
        .to_vec()
    }

    #[test]
    fn test_invalid_style_color_fails_build() {
        let style: StyleConfig = toml::from_str("group_color = \"nope\"\n").unwrap();

        let err = SvgBuilder::new().with_style(&style).build().unwrap_err();
        assert!(matches!(err, export::Error::Render(_)));
    }

    #[test]
    fn test_background_rect_when_configured() {
        let style: StyleConfig = toml::from_str("background_color = \"white\"\n").unwrap();
        let svg = SvgBuilder::new().with_style(&style).build().unwrap();
        let doc = svg
            .render(&RenderGraph::default(), &DiagramLayout::default())
            .to_string();

        assert!(doc.contains("<rect"));
    }
}
