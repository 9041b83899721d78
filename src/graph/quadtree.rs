//! Barnes-Hut quadtree for O(n log n) force calculation.
//!
//! Distant groups of nodes are summarised by their total charge and
//! charge-weighted centroid, so repulsion costs O(n log n) instead of O(n²).
//!
//! Cells live in a flat arena and refer to each other by index. The tree is
//! rebuilt from scratch every simulation step and simply dropped afterwards.
//! Nodes sharing a position are chained at one leaf through `next`, a linked
//! list keyed by node slot, rather than being split forever.

use super::types::{SimNode, Vec2};

/// Index of a cell in the arena.
pub type QuadId = usize;

/// Subdivision depth after which nodes that still share a cell are chained.
const MAX_DEPTH: u32 = 48;

/// Axis-aligned square region covered by a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Bounds {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Smallest square anchored at the minimum corner that covers every node.
    fn covering(nodes: &[SimNode]) -> Self {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for node in nodes {
            min_x = min_x.min(node.position.x);
            min_y = min_y.min(node.position.y);
            max_x = max_x.max(node.position.x);
            max_y = max_y.max(node.position.y);
        }

        // The opening test in the force pass assumes square cells
        let mut size = (max_x - min_x).max(max_y - min_y);
        if !(size > 0.0) {
            size = 1.0;
        }
        Self::new(min_x, min_y, min_x + size, min_y + size)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn midpoint(&self) -> Vec2 {
        Vec2::new((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Get the quadrant for a position (0=NW, 1=NE, 2=SW, 3=SE, y grows south)
    pub fn quadrant(&self, pos: Vec2) -> usize {
        let mid = self.midpoint();
        let east = pos.x >= mid.x;
        let south = pos.y >= mid.y;
        ((south as usize) << 1) | east as usize
    }

    /// Get bounds for a specific quadrant
    pub fn child_bounds(&self, quadrant: usize) -> Bounds {
        let mid = self.midpoint();
        let (x0, x1) = if quadrant & 1 == 1 { (mid.x, self.x1) } else { (self.x0, mid.x) };
        let (y0, y1) = if quadrant & 2 == 2 { (mid.y, self.y1) } else { (self.y0, mid.y) };
        Bounds::new(x0, y0, x1, y1)
    }

    /// False once the midpoint is no longer strictly inside the region.
    fn can_split(&self) -> bool {
        let mid = self.midpoint();
        mid.x > self.x0 && mid.x < self.x1 && mid.y > self.y0 && mid.y < self.y1
    }
}

/// A cell is either a leaf holding a chain of coincident nodes, or an internal
/// node with up to four children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuadNode {
    Leaf {
        /// First node slot of the coincident chain
        head: usize,
        /// Position of the first node inserted here
        position: Vec2,
    },
    Internal {
        /// Children: NW, NE, SW, SE
        children: [Option<QuadId>; 4],
    },
}

/// A cell of the quadtree with its aggregate charge.
#[derive(Debug, Clone)]
pub struct Quad {
    pub node: QuadNode,
    pub bounds: Bounds,
    /// Sum of the strengths of every node below this cell
    pub value: f64,
    /// Charge-weighted average position of the nodes below this cell
    pub centroid: Vec2,
}

impl Quad {
    fn leaf(head: usize, position: Vec2, bounds: Bounds) -> Self {
        Self {
            node: QuadNode::Leaf { head, position },
            bounds,
            value: 0.0,
            centroid: position,
        }
    }
}

/// Barnes-Hut quadtree over a set of simulation nodes.
#[derive(Debug, Clone)]
pub struct Quadtree {
    cells: Vec<Quad>,
    /// Coincident chain links, indexed by node slot
    next: Vec<Option<usize>>,
    bounds: Bounds,
    len: usize,
}

impl Quadtree {
    /// Build a quadtree from the current node positions.
    ///
    /// Aggregates are zero until [`Quadtree::accumulate`] runs.
    pub fn build(nodes: &[SimNode]) -> Self {
        let slots = nodes.iter().map(|n| n.index + 1).max().unwrap_or(0);
        let mut tree = Self {
            cells: Vec::with_capacity(nodes.len() * 2),
            next: vec![None; slots],
            bounds: Bounds::covering(nodes),
            len: 0,
        };

        for node in nodes {
            tree.insert(node.index, node.position);
        }

        tree
    }

    fn insert(&mut self, slot: usize, pos: Vec2) {
        self.len += 1;
        let Some(mut cell) = self.root() else {
            self.cells.push(Quad::leaf(slot, pos, self.bounds));
            return;
        };

        let mut depth = 0;
        loop {
            let bounds = self.cells[cell].bounds;
            match self.cells[cell].node {
                QuadNode::Internal { children } => {
                    let q = bounds.quadrant(pos);
                    match children[q] {
                        Some(child) => {
                            cell = child;
                            depth += 1;
                        }
                        None => {
                            let child = self.push(Quad::leaf(slot, pos, bounds.child_bounds(q)));
                            self.attach(cell, q, child);
                            return;
                        }
                    }
                }

                QuadNode::Leaf { head, position } => {
                    if position == pos || depth >= MAX_DEPTH || !bounds.can_split() {
                        // Chain behind the head so the leaf keeps its anchor
                        self.next[slot] = self.next[head];
                        self.next[head] = Some(slot);
                        return;
                    }

                    // Push the resident chain one level down, then retry here
                    let q = bounds.quadrant(position);
                    let moved = self.push(Quad::leaf(head, position, bounds.child_bounds(q)));
                    let mut children = [None; 4];
                    children[q] = Some(moved);
                    self.cells[cell].node = QuadNode::Internal { children };
                }
            }
        }
    }

    fn push(&mut self, quad: Quad) -> QuadId {
        self.cells.push(quad);
        self.cells.len() - 1
    }

    fn attach(&mut self, parent: QuadId, quadrant: usize, child: QuadId) {
        if let QuadNode::Internal { children } = &mut self.cells[parent].node {
            children[quadrant] = Some(child);
        }
    }

    /// Compute `value` and `centroid` for every cell, children before parents.
    ///
    /// `strengths` is indexed by node slot.
    pub fn accumulate(&mut self, strengths: &[f64]) {
        // Children are always pushed after their parent, so walking the arena
        // backwards is a post-order traversal.
        for id in (0..self.cells.len()).rev() {
            let (value, centroid) = match self.cells[id].node {
                QuadNode::Leaf { head, position } => {
                    let value: f64 = self.members(head).map(|slot| strengths[slot]).sum();
                    (value, position)
                }
                QuadNode::Internal { children } => {
                    let mut value = 0.0;
                    let mut weight = 0.0;
                    let mut weighted = Vec2::ZERO;
                    for child in children.into_iter().flatten() {
                        let quad = &self.cells[child];
                        let c = quad.value.abs();
                        value += quad.value;
                        weight += c;
                        weighted += quad.centroid * c;
                    }
                    let centroid = if weight > 0.0 {
                        weighted * (1.0 / weight)
                    } else {
                        self.cells[id].bounds.midpoint()
                    };
                    (value, centroid)
                }
            };
            self.cells[id].value = value;
            self.cells[id].centroid = centroid;
        }
    }

    pub fn root(&self) -> Option<QuadId> {
        if self.cells.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn quad(&self, id: QuadId) -> &Quad {
        &self.cells[id]
    }

    pub fn quads(&self) -> &[Quad] {
        &self.cells
    }

    /// Iterate the node slots chained at a leaf, starting from `head`.
    pub fn members(&self, head: usize) -> Members<'_> {
        Members {
            next: &self.next,
            cursor: Some(head),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Number of nodes inserted.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Iterator over a coincident chain.
pub struct Members<'a> {
    next: &'a [Option<usize>],
    cursor: Option<usize>,
}

impl Iterator for Members<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let slot = self.cursor?;
        self.cursor = self.next[slot];
        Some(slot)
    }
}
