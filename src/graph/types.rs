//! Graph data types consumed and produced by the layout engine.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Citation count at which an edge reaches full weight.
const MAX_CITATIONS: f64 = 60_000.0;

/// A 2D vector used for positions, velocities and force impulses.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (other - self).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// A node as supplied by the upstream data/filter layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    /// Starting position. Seeded around the layout center when absent.
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
    /// Repulsion charge override; the configured strength applies otherwise.
    #[serde(default)]
    pub strength: Option<f64>,
}

impl GraphNode {
    /// A node with no position yet.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: None,
            y: None,
            vx: 0.0,
            vy: 0.0,
            strength: None,
        }
    }

    /// A node placed at `(x, y)`.
    pub fn at(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::new(id)
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    /// The supplied position, if both coordinates are present.
    pub fn position(&self) -> Option<Vec2> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Vec2::new(x, y)),
            _ => None,
        }
    }
}

/// A weighted, undirected edge between two node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    /// Attraction weight in `[0, 1]`; heavier edges are shorter and stiffer.
    pub weight: f64,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }

    /// Create an edge weighted by the mean citation count of its two papers,
    /// saturating at full weight.
    pub fn from_citations(
        source: impl Into<String>,
        target: impl Into<String>,
        source_citations: u64,
        target_citations: u64,
    ) -> Self {
        let mean = (source_citations as f64 + target_citations as f64) / 2.0;
        Self::new(source, target, (mean / MAX_CITATIONS).min(1.0))
    }
}

/// Complete graph input, as read from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

/// A node inside a running simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimNode {
    pub id: String,
    /// Stable slot for this simulation run; indexes per-node strength tables.
    pub index: usize,
    pub position: Vec2,
    pub velocity: Vec2,
    pub strength: f64,
}

/// An edge resolved to node slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_weight_saturates() {
        let edge = GraphEdge::from_citations("a", "b", 30_000, 90_000);
        assert_eq!(edge.weight, 1.0);

        let edge = GraphEdge::from_citations("a", "b", 3_000, 3_000);
        assert!((edge.weight - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_parse_graph_with_optional_fields() {
        let json = r#"{
            "nodes": [
                {"id": "p1", "x": 10.0, "y": 20.0},
                {"id": "p2", "strength": -60.0}
            ],
            "edges": [{"source": "p1", "target": "p2", "weight": 0.5}]
        }"#;
        let data: GraphData = serde_json::from_str(json).unwrap();
        assert_eq!(data.nodes[0].position(), Some(Vec2::new(10.0, 20.0)));
        assert_eq!(data.nodes[1].position(), None);
        assert_eq!(data.nodes[1].strength, Some(-60.0));
        assert_eq!(data.edges[0].weight, 0.5);
    }

    #[test]
    fn test_vec2_ops() {
        let a = Vec2::new(3.0, 4.0);
        assert_eq!(a.length(), 5.0);
        assert_eq!(a - a, Vec2::ZERO);
        assert_eq!(a * 2.0, Vec2::new(6.0, 8.0));
        assert_eq!(Vec2::ZERO.distance(a), 5.0);
    }
}
