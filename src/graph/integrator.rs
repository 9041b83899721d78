//! Per-step force composition and the cooling schedule.
//!
//! Each step computes every node's impulse from one position snapshot:
//! - Centering toward a fixed point
//! - Many-body repulsion via the Barnes-Hut quadtree, scaled by alpha
//! - Weighted springs along edges
//!
//! and then damps, integrates and contains every node before cooling alpha.

use super::config::LayoutConfig;
use super::jiggle::JitterSource;
use super::many_body::ManyBody;
use super::types::{SimNode, Spring, Vec2};

/// The rectangle nodes are kept inside, inset by `margin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    pub margin: f64,
    pub width: f64,
    pub height: f64,
}

impl Boundary {
    /// Clamp `position` into the interior, reversing and attenuating the
    /// velocity component of every axis that was crossed.
    pub fn contain(&self, position: &mut Vec2, velocity: &mut Vec2, bounce: f64) {
        contain_axis(&mut position.x, &mut velocity.x, self.margin, self.width - self.margin, bounce);
        contain_axis(&mut position.y, &mut velocity.y, self.margin, self.height - self.margin, bounce);
    }

    pub fn contains(&self, position: Vec2) -> bool {
        position.x >= self.margin
            && position.x <= self.width - self.margin
            && position.y >= self.margin
            && position.y <= self.height - self.margin
    }
}

fn contain_axis(p: &mut f64, v: &mut f64, lo: f64, hi: f64, bounce: f64) {
    if *p < lo {
        *p = lo;
        *v *= -bounce;
    } else if *p > hi {
        *p = hi;
        *v *= -bounce;
    }
}

/// Mutable simulation parameters, created at initialize and cooled every step.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    /// Cooling coefficient, starts at 1.0
    pub alpha: f64,
    pub alpha_decay: f64,
    pub alpha_min: f64,
    pub velocity_decay: f64,
    pub theta: f64,
    pub distance_min: f64,
    pub distance_max: Option<f64>,
    pub center: Vec2,
    pub center_strength: f64,
    pub attraction: f64,
    pub rest_length: f64,
    pub rest_length_spread: f64,
    pub boundary: Boundary,
    pub bounce: f64,
}

impl SimulationState {
    /// A fresh state at `alpha = 1.0`. `config` is assumed validated.
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            alpha: 1.0,
            alpha_decay: config.alpha_decay,
            alpha_min: config.alpha_min,
            velocity_decay: config.velocity_decay,
            theta: config.theta,
            distance_min: config.distance_min,
            distance_max: config.distance_max,
            center: config.center,
            center_strength: config.center_strength,
            attraction: config.attraction,
            rest_length: config.rest_length,
            rest_length_spread: config.rest_length_spread,
            boundary: Boundary {
                margin: config.boundary_margin,
                width: config.width,
                height: config.height,
            },
            bounce: config.bounce,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.alpha < self.alpha_min
    }

    /// Rest length for an edge of the given weight. Heavier edges are shorter.
    pub fn rest_length_for(&self, weight: f64) -> f64 {
        self.rest_length + (1.0 - weight) * self.rest_length_spread
    }
}

/// Outcome of one integrator step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Alpha after this step's decay
    pub alpha: f64,
    pub converged: bool,
}

/// Advances a node set one tick at a time.
#[derive(Debug, Clone)]
pub struct Integrator {
    many_body: ManyBody,
    /// Scratch buffer, one impulse per node slot
    impulses: Vec<Vec2>,
}

impl Integrator {
    pub fn new(state: &SimulationState) -> Self {
        Self {
            many_body: ManyBody::new(state.theta, state.distance_min, state.distance_max),
            impulses: Vec::new(),
        }
    }

    /// Load per-node charges. Must be called whenever the node set changes.
    pub fn initialize(&mut self, nodes: &[SimNode]) {
        self.many_body.initialize(nodes);
        self.impulses = vec![Vec2::ZERO; nodes.len()];
    }

    pub fn many_body(&self) -> &ManyBody {
        &self.many_body
    }

    /// Run one step over `nodes`. Never stops by itself; the caller acts on
    /// `converged`.
    ///
    /// Every node's `index` must equal its position in `nodes`, and springs
    /// refer to nodes by that index. [`LayoutEngine`](super::LayoutEngine)
    /// assigns indices this way.
    ///
    /// # Panics
    ///
    /// Panics if a node's `index` differs from its position in `nodes`, or a
    /// spring names an index outside `nodes`.
    pub fn step(
        &mut self,
        nodes: &mut [SimNode],
        springs: &[Spring],
        state: &mut SimulationState,
        jitter: &mut dyn JitterSource,
    ) -> StepReport {
        if let Some((position, node)) = nodes.iter().enumerate().find(|(i, n)| n.index != *i) {
            panic!(
                "node {} has index {} but sits at position {}",
                node.id, node.index, position
            );
        }

        if !nodes.is_empty() {
            self.impulses.clear();
            self.impulses.resize(nodes.len(), Vec2::ZERO);

            let tree = self.many_body.tree(nodes);
            for (impulse, node) in self.impulses.iter_mut().zip(nodes.iter()) {
                *impulse = (state.center - node.position) * state.center_strength;
                *impulse += self.many_body.apply(&tree, node, state.alpha, jitter);
            }

            for spring in springs {
                self.apply_spring(nodes, spring, state);
            }

            for (node, impulse) in nodes.iter_mut().zip(&self.impulses) {
                node.velocity = (node.velocity + *impulse) * state.velocity_decay;
                node.position += node.velocity;
                state
                    .boundary
                    .contain(&mut node.position, &mut node.velocity, state.bounce);
            }
        }

        state.alpha *= 1.0 - state.alpha_decay;
        tracing::trace!(alpha = state.alpha, nodes = nodes.len(), "integrator step");

        StepReport {
            alpha: state.alpha,
            converged: state.is_converged(),
        }
    }

    /// Spring force along one edge, equal and opposite on both endpoints.
    fn apply_spring(&mut self, nodes: &[SimNode], spring: &Spring, state: &SimulationState) {
        let delta = nodes[spring.target].position - nodes[spring.source].position;
        let distance = delta.length();
        if distance == 0.0 {
            return;
        }

        let rest = state.rest_length_for(spring.weight);
        let magnitude = (distance - rest) * state.attraction * spring.weight;
        let force = delta * (magnitude / distance);

        self.impulses[spring.source] += force;
        self.impulses[spring.target] -= force;
    }
}
