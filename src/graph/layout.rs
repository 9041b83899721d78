//! Layout engine: the `Idle → Running → Complete` state machine hosts drive
//! one tick at a time.
//!
//! The engine owns the node and edge set for the lifetime of a run. Hosts
//! call [`LayoutEngine::step`] from their own frame loop and read
//! [`LayoutEngine::positions`] between steps. Changing the visible graph goes
//! through [`LayoutEngine::replace_graph`], which swaps the whole set and
//! reheats.

use super::config::LayoutConfig;
use super::integrator::{Integrator, SimulationState};
use super::jiggle::{JitterSource, RngJitter};
use super::types::{GraphEdge, GraphNode, SimNode, Spring, Vec2};
use crate::error::LayoutError;
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use std::fmt;

/// Radius step of the seeding spiral
const SEED_RADIUS: f64 = 10.0;

/// Lifecycle of a layout run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutPhase {
    /// No graph loaded
    #[default]
    Idle,
    Running,
    /// Positions frozen until reheat
    Complete,
}

/// Everything that exists only once a graph is loaded.
struct Simulation {
    config: LayoutConfig,
    nodes: Vec<SimNode>,
    springs: Vec<Spring>,
    state: SimulationState,
    integrator: Integrator,
    /// Positions captured when the run completed
    snapshot: Option<HashMap<String, (f64, f64)>>,
    steps: usize,
}

impl Simulation {
    fn new(config: LayoutConfig, nodes: Vec<SimNode>, springs: Vec<Spring>) -> Self {
        let state = SimulationState::from_config(&config);
        let mut integrator = Integrator::new(&state);
        integrator.initialize(&nodes);
        Self {
            config,
            nodes,
            springs,
            state,
            integrator,
            snapshot: None,
            steps: 0,
        }
    }

    fn live_positions(&self) -> HashMap<String, (f64, f64)> {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), (n.position.x, n.position.y)))
            .collect()
    }

    fn freeze(&mut self) {
        self.snapshot = Some(self.live_positions());
    }
}

/// Force-directed layout engine.
pub struct LayoutEngine {
    phase: LayoutPhase,
    simulation: Option<Simulation>,
    jitter: Box<dyn JitterSource>,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("phase", &self.phase)
            .field("alpha", &self.alpha())
            .field("nodes", &self.nodes().len())
            .field("steps", &self.steps())
            .finish()
    }
}

impl LayoutEngine {
    /// An idle engine with entropy-seeded jitter.
    pub fn new() -> Self {
        Self::with_jitter(RngJitter::from_entropy())
    }

    /// An idle engine whose jitter is reproducible from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::with_jitter(RngJitter::seeded(seed))
    }

    pub fn with_jitter(jitter: impl JitterSource + 'static) -> Self {
        Self {
            phase: LayoutPhase::Idle,
            simulation: None,
            jitter: Box::new(jitter),
        }
    }

    /// Load a graph and start a run at `alpha = 1.0`.
    ///
    /// Edges whose endpoints are not in `nodes` are dropped. Nodes without a
    /// position are seeded on a spiral around the configured center. An empty
    /// node set completes immediately. On error the engine is left unchanged.
    pub fn initialize(
        &mut self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        config: LayoutConfig,
    ) -> Result<(), LayoutError> {
        config.validate()?;
        let sim_nodes = seed_nodes(nodes, &config, &HashMap::new())?;
        let springs = resolve_edges(&sim_nodes, edges)?;

        tracing::info!(
            nodes = sim_nodes.len(),
            edges = springs.len(),
            "Layout initialized"
        );

        self.simulation = Some(Simulation::new(config, sim_nodes, springs));
        self.start();
        Ok(())
    }

    /// Advance one tick.
    ///
    /// Running: one integrator step, completing on the step where alpha first
    /// drops below `alpha_min`. Complete: no-op. Idle: `NotInitialized`.
    pub fn step(&mut self) -> Result<LayoutPhase, LayoutError> {
        let Some(simulation) = self.simulation.as_mut() else {
            tracing::warn!("step() called before initialize()");
            return Err(LayoutError::NotInitialized);
        };
        if self.phase != LayoutPhase::Running {
            return Ok(self.phase);
        }

        if simulation.nodes.is_empty() {
            simulation.freeze();
            self.phase = LayoutPhase::Complete;
            return Ok(self.phase);
        }

        let report = simulation.integrator.step(
            &mut simulation.nodes,
            &simulation.springs,
            &mut simulation.state,
            self.jitter.as_mut(),
        );
        simulation.steps += 1;

        if report.converged {
            simulation.freeze();
            self.phase = LayoutPhase::Complete;
            tracing::info!(
                steps = simulation.steps,
                alpha = report.alpha,
                "Layout complete"
            );
        }
        Ok(self.phase)
    }

    /// Step until complete or until `max_steps` ticks have run. Returns the
    /// number of ticks taken.
    pub fn run_to_completion(&mut self, max_steps: usize) -> Result<usize, LayoutError> {
        let before = self.steps();
        for _ in 0..max_steps {
            if self.step()? != LayoutPhase::Running {
                break;
            }
        }
        if self.phase == LayoutPhase::Running {
            tracing::debug!(max_steps, alpha = ?self.alpha(), "Step limit reached before convergence");
        }
        Ok(self.steps() - before)
    }

    /// Current positions by node id; the frozen snapshot once complete.
    /// Empty while idle.
    pub fn positions(&self) -> HashMap<String, (f64, f64)> {
        match &self.simulation {
            None => HashMap::new(),
            Some(simulation) => match &simulation.snapshot {
                Some(snapshot) => snapshot.clone(),
                None => simulation.live_positions(),
            },
        }
    }

    /// Restart cooling from `alpha`, from either Running or Complete.
    pub fn reheat(&mut self, alpha: f64) -> Result<(), LayoutError> {
        LayoutConfig::validate_alpha(alpha)?;
        let Some(simulation) = self.simulation.as_mut() else {
            tracing::warn!("reheat() called before initialize()");
            return Err(LayoutError::NotInitialized);
        };

        simulation.state.alpha = alpha;
        simulation.snapshot = None;
        self.phase = LayoutPhase::Running;
        tracing::info!(alpha, "Layout reheated");
        Ok(())
    }

    /// Swap in a new node and edge set between ticks, then reheat.
    ///
    /// Surviving ids whose input carries no position keep their current
    /// position and velocity. Indices are reassigned. On error the engine is
    /// left unchanged.
    pub fn replace_graph(
        &mut self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        alpha: f64,
    ) -> Result<(), LayoutError> {
        LayoutConfig::validate_alpha(alpha)?;
        let Some(simulation) = self.simulation.as_mut() else {
            tracing::warn!("replace_graph() called before initialize()");
            return Err(LayoutError::NotInitialized);
        };

        let previous: HashMap<String, (Vec2, Vec2)> = simulation
            .nodes
            .iter()
            .map(|n| (n.id.clone(), (n.position, n.velocity)))
            .collect();
        let sim_nodes = seed_nodes(nodes, &simulation.config, &previous)?;
        let springs = resolve_edges(&sim_nodes, edges)?;

        tracing::info!(
            nodes = sim_nodes.len(),
            edges = springs.len(),
            alpha,
            "Layout graph replaced"
        );

        simulation.integrator.initialize(&sim_nodes);
        simulation.nodes = sim_nodes;
        simulation.springs = springs;
        simulation.state.alpha = alpha;
        simulation.snapshot = None;
        self.start();
        Ok(())
    }

    /// Enter Running, or Complete straight away for an empty graph.
    fn start(&mut self) {
        match self.simulation.as_mut() {
            Some(simulation) if simulation.nodes.is_empty() => {
                simulation.freeze();
                self.phase = LayoutPhase::Complete;
                tracing::debug!("Empty graph, layout complete");
            }
            Some(_) => self.phase = LayoutPhase::Running,
            None => self.phase = LayoutPhase::Idle,
        }
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == LayoutPhase::Running
    }

    pub fn is_complete(&self) -> bool {
        self.phase == LayoutPhase::Complete
    }

    /// Current cooling coefficient, `None` while idle.
    pub fn alpha(&self) -> Option<f64> {
        self.simulation.as_ref().map(|s| s.state.alpha)
    }

    /// Ticks integrated since initialize.
    pub fn steps(&self) -> usize {
        self.simulation.as_ref().map_or(0, |s| s.steps)
    }

    pub fn config(&self) -> Option<&LayoutConfig> {
        self.simulation.as_ref().map(|s| &s.config)
    }

    /// Simulation nodes in index order.
    pub fn nodes(&self) -> &[SimNode] {
        self.simulation
            .as_ref()
            .map(|s| s.nodes.as_slice())
            .unwrap_or(&[])
    }

    /// Number of edges kept after dropping dangling ones.
    pub fn edge_count(&self) -> usize {
        self.simulation.as_ref().map_or(0, |s| s.springs.len())
    }
}

/// Convert input nodes into simulation nodes with stable indices.
///
/// Positions come from the input, then `previous`, then the seeding spiral.
fn seed_nodes(
    nodes: &[GraphNode],
    config: &LayoutConfig,
    previous: &HashMap<String, (Vec2, Vec2)>,
) -> Result<Vec<SimNode>, LayoutError> {
    let mut seen = HashSet::with_capacity(nodes.len());
    let mut sim_nodes = Vec::with_capacity(nodes.len());

    for (index, node) in nodes.iter().enumerate() {
        if !seen.insert(node.id.as_str()) {
            return Err(LayoutError::DuplicateNode(node.id.clone()));
        }

        let input_velocity = Vec2::new(node.vx, node.vy);
        let (position, velocity) = match (node.position(), previous.get(&node.id)) {
            (Some(position), _) => (position, input_velocity),
            (None, Some(&(position, velocity))) => (position, velocity),
            (None, None) => (spiral_position(config.center, index), input_velocity),
        };
        let strength = node.strength.unwrap_or(config.strength);

        if !(position.is_finite() && velocity.is_finite() && strength.is_finite()) {
            return Err(LayoutError::NonFiniteNode(node.id.clone()));
        }

        sim_nodes.push(SimNode {
            id: node.id.clone(),
            index,
            position,
            velocity,
            strength,
        });
    }

    Ok(sim_nodes)
}

/// Phyllotaxis spiral: evenly spread, never coincident.
fn spiral_position(center: Vec2, index: usize) -> Vec2 {
    let i = index as f64;
    let radius = SEED_RADIUS * (0.5 + i).sqrt();
    let angle = i * PI * (3.0 - 5.0_f64.sqrt());
    center + Vec2::new(radius * angle.cos(), radius * angle.sin())
}

/// Resolve edge endpoints to node slots, dropping edges that leave the set.
fn resolve_edges(nodes: &[SimNode], edges: &[GraphEdge]) -> Result<Vec<Spring>, LayoutError> {
    let index: HashMap<&str, usize> = nodes.iter().map(|n| (n.id.as_str(), n.index)).collect();
    let mut springs = Vec::with_capacity(edges.len());

    for edge in edges {
        if !(0.0..=1.0).contains(&edge.weight) {
            return Err(LayoutError::EdgeWeight {
                from: edge.source.clone(),
                to: edge.target.clone(),
                weight: edge.weight,
            });
        }

        let (Some(&source), Some(&target)) = (
            index.get(edge.source.as_str()),
            index.get(edge.target.as_str()),
        ) else {
            tracing::debug!(source = %edge.source, target = %edge.target, "Dropping edge outside node set");
            continue;
        };
        if source == target {
            tracing::debug!(node = %edge.source, "Dropping self-loop");
            continue;
        }

        springs.push(Spring {
            source,
            target,
            weight: edge.weight,
        });
    }

    Ok(springs)
}
