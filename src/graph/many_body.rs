//! Many-body repulsion using the Barnes-Hut approximation.
//!
//! Distant cells of the quadtree are treated as a single charge at their
//! centroid; nearby cells are opened and, at the leaves, each node in the
//! coincident chain contributes exactly.

use super::jiggle::JitterSource;
use super::quadtree::{QuadNode, Quadtree};
use super::types::{SimNode, Vec2};

/// Repulsion parameters plus the per-node charge table.
#[derive(Debug, Clone)]
pub struct ManyBody {
    /// Charge per node slot
    strengths: Vec<f64>,
    theta2: f64,
    distance_min2: f64,
    distance_max2: f64,
}

impl ManyBody {
    /// `distance_max` of `None` means direct pairs are never cut off.
    pub fn new(theta: f64, distance_min: f64, distance_max: Option<f64>) -> Self {
        Self {
            strengths: Vec::new(),
            theta2: theta * theta,
            distance_min2: distance_min * distance_min,
            distance_max2: distance_max.map_or(f64::INFINITY, |d| d * d),
        }
    }

    /// Record each node's charge under its stable slot.
    pub fn initialize(&mut self, nodes: &[SimNode]) {
        let slots = nodes.iter().map(|n| n.index + 1).max().unwrap_or(0);
        self.strengths = vec![0.0; slots];
        for node in nodes {
            self.strengths[node.index] = node.strength;
        }
    }

    pub fn strengths(&self) -> &[f64] {
        &self.strengths
    }

    /// Build and aggregate a quadtree for the current positions.
    pub fn tree(&self, nodes: &[SimNode]) -> Quadtree {
        let mut tree = Quadtree::build(nodes);
        tree.accumulate(&self.strengths);
        tree
    }

    /// Calculate the repulsion impulse on `node` from every other node in
    /// `tree`, scaled by `alpha`.
    pub fn apply(
        &self,
        tree: &Quadtree,
        node: &SimNode,
        alpha: f64,
        jitter: &mut dyn JitterSource,
    ) -> Vec2 {
        let mut force = Vec2::ZERO;
        let Some(root) = tree.root() else {
            return force;
        };

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let quad = tree.quad(id);
            if quad.value == 0.0 {
                continue;
            }

            let dx = quad.centroid.x - node.position.x;
            let dy = quad.centroid.y - node.position.y;
            let l = dx * dx + dy * dy;
            let w = quad.bounds.width();

            // Far enough away: the whole cell acts as one charge. distance_max
            // does not apply here.
            if w * w / self.theta2 < l {
                if let Some((dx, dy, l)) = self.soften(dx, dy, l, jitter) {
                    force += Vec2::new(dx, dy) * (quad.value * alpha / l);
                }
                continue;
            }

            match quad.node {
                QuadNode::Internal { children } => {
                    // Reverse so NW is visited first
                    for child in children.into_iter().rev().flatten() {
                        stack.push(child);
                    }
                }
                QuadNode::Leaf { head, .. } => {
                    if l >= self.distance_max2 {
                        continue;
                    }
                    let alone = head == node.index && tree.members(head).nth(1).is_none();
                    if alone {
                        continue;
                    }
                    let Some((dx, dy, l)) = self.soften(dx, dy, l, jitter) else {
                        continue;
                    };
                    for slot in tree.members(head).filter(|&slot| slot != node.index) {
                        force += Vec2::new(dx, dy) * (self.strengths[slot] * alpha / l);
                    }
                }
            }
        }

        force
    }

    /// Exact O(n²) repulsion on `node`, using the same per-pair rule as the
    /// leaf path of [`ManyBody::apply`].
    pub fn exact(
        &self,
        nodes: &[SimNode],
        node: &SimNode,
        alpha: f64,
        jitter: &mut dyn JitterSource,
    ) -> Vec2 {
        let mut force = Vec2::ZERO;
        for other in nodes.iter().filter(|other| other.index != node.index) {
            let dx = other.position.x - node.position.x;
            let dy = other.position.y - node.position.y;
            let l = dx * dx + dy * dy;
            if l >= self.distance_max2 {
                continue;
            }
            if let Some((dx, dy, l)) = self.soften(dx, dy, l, jitter) {
                force += Vec2::new(dx, dy) * (self.strengths[other.index] * alpha / l);
            }
        }
        force
    }

    /// Replace zero offsets with jitter and clamp the squared distance from
    /// below. Returns `None` if the pair still has no direction.
    fn soften(
        &self,
        mut dx: f64,
        mut dy: f64,
        mut l: f64,
        jitter: &mut dyn JitterSource,
    ) -> Option<(f64, f64, f64)> {
        if dx == 0.0 {
            dx = jitter.jiggle();
            l += dx * dx;
        }
        if dy == 0.0 {
            dy = jitter.jiggle();
            l += dy * dy;
        }
        if l == 0.0 {
            return None;
        }
        if l < self.distance_min2 {
            l = (self.distance_min2 * l).sqrt();
        }
        Some((dx, dy, l))
    }
}
