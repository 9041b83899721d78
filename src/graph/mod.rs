//! Graph data structures and layout algorithms.

pub mod config;
pub mod integrator;
pub mod jiggle;
pub mod layout;
pub mod many_body;
pub mod quadtree;
pub mod types;

pub use config::LayoutConfig;
pub use integrator::{Boundary, Integrator, SimulationState, StepReport};
pub use jiggle::{JitterSource, RngJitter};
pub use layout::{LayoutEngine, LayoutPhase};
pub use many_body::ManyBody;
pub use quadtree::{Bounds, Quad, QuadNode, Quadtree};
pub use types::{GraphData, GraphEdge, GraphNode, SimNode, Spring, Vec2};
