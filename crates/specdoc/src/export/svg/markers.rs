use svg::node::element::{Definitions, Marker, Path};

use crate::{color::Color, hierarchy::EdgeKind};

/// Marker definitions for every edge kind in `color`.
pub fn create_marker_definitions(color: &Color) -> Definitions {
    let id = color.to_id_safe_string();

    // Hollow triangle pointing at the parent.
    let inherits = Marker::new()
        .set("id", format!("inherits-{id}"))
        .set("viewBox", "0 0 10 10")
        .set("refX", 9)
        .set("refY", 5)
        .set("markerWidth", 9)
        .set("markerHeight", 9)
        .set("orient", "auto")
        .add(
            Path::new()
                .set("d", "M 0 0 L 10 5 L 0 10 z")
                .set("fill", "white")
                .set("stroke", color.to_string()),
        );

    let includes = Marker::new()
        .set("id", format!("includes-{id}"))
        .set("viewBox", "0 0 10 10")
        .set("refX", 9)
        .set("refY", 5)
        .set("markerWidth", 6)
        .set("markerHeight", 6)
        .set("orient", "auto")
        .add(
            Path::new()
                .set("d", "M 0 0 L 10 5 L 0 10 z")
                .set("fill", color.to_string()),
        );

    // Filled diamond on the owner side.
    let contains = Marker::new()
        .set("id", format!("contains-{id}"))
        .set("viewBox", "0 0 10 10")
        .set("refX", 1)
        .set("refY", 5)
        .set("markerWidth", 9)
        .set("markerHeight", 9)
        .set("orient", "auto")
        .add(
            Path::new()
                .set("d", "M 0 5 L 5 0 L 10 5 L 5 10 z")
                .set("fill", color.to_string()),
        );

    Definitions::new().add(inherits).add(includes).add(contains)
}

/// `(marker-start, marker-end)` references for an edge kind.
pub fn markers_for_edge(kind: EdgeKind, color: &Color) -> (Option<String>, Option<String>) {
    let id = color.to_id_safe_string();
    match kind {
        EdgeKind::Inherits => (None, Some(format!("url(#inherits-{id})"))),
        EdgeKind::Includes => (None, Some(format!("url(#includes-{id})"))),
        EdgeKind::Contains => (Some(format!("url(#contains-{id})")), None),
    }
}

/// Dash pattern of an edge kind; `None` draws a solid line.
pub fn dash_for_edge(kind: EdgeKind) -> Option<&'static str> {
    match kind {
        EdgeKind::Inherits | EdgeKind::Contains => None,
        EdgeKind::Includes => Some("6 4"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_per_kind() {
        let color = Color::new("black").unwrap();

        let (start, end) = markers_for_edge(EdgeKind::Inherits, &color);
        assert!(start.is_none());
        assert!(end.unwrap().starts_with("url(#inherits-"));

        let (start, end) = markers_for_edge(EdgeKind::Contains, &color);
        assert!(start.unwrap().starts_with("url(#contains-"));
        assert!(end.is_none());
    }

    #[test]
    fn test_definitions_name_every_marker() {
        let color = Color::new("black").unwrap();
        let defs = create_marker_definitions(&color).to_string();

        assert!(defs.contains("inherits-"));
        assert!(defs.contains("includes-"));
        assert!(defs.contains("contains-"));
    }
}
