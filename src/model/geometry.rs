//! Bounding polygons.

use serde::{Deserialize, Serialize};

/// A pixel coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

impl Vertex {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Vertex {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// A bounding polygon, normally the four corners of a box in clockwise
/// order starting at the top-left of the text's reading direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundingPoly(pub Vec<Vertex>);

impl BoundingPoly {
    /// Create a polygon from its vertices.
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self(vertices)
    }

    /// An axis-aligned rectangle.
    pub fn rect(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self(vec![
            Vertex::new(left, top),
            Vertex::new(right, top),
            Vertex::new(right, bottom),
            Vertex::new(left, bottom),
        ])
    }

    /// The vertices in order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.0
    }

    /// The first vertex, used as the anchor for labels.
    pub fn anchor(&self) -> Option<Vertex> {
        self.0.first().copied()
    }

    /// Whether the polygon has enough vertices to be drawn.
    pub fn is_drawable(&self) -> bool {
        self.0.len() >= 4
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_corners() {
        let poly = BoundingPoly::rect(1, 2, 30, 40);
        assert_eq!(poly.vertices().len(), 4);
        assert_eq!(poly.anchor(), Some(Vertex::new(1, 2)));
        assert_eq!(poly.vertices()[2], Vertex::new(30, 40));
        assert!(poly.is_drawable());
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let poly = BoundingPoly::new(vec![Vertex::new(3, 4)]);
        let json = serde_json::to_string(&poly).unwrap();
        assert_eq!(json, r#"[{"x":3,"y":4}]"#);
        assert!(!poly.is_drawable());
    }
}
