//! Force-directed layout for citation graphs.
//!
//! Nodes repel each other through a Barnes-Hut quadtree, edges pull their
//! endpoints toward a weight-dependent rest length, and a cooling schedule
//! lets the layout settle. Hosts drive [`LayoutEngine::step`] from their own
//! frame loop and read positions between ticks.

pub mod error;
pub mod graph;
pub mod settings;

pub use error::{ConfigurationError, LayoutError, SettingsError};
pub use graph::{GraphData, GraphEdge, GraphNode, LayoutConfig, LayoutEngine, LayoutPhase};
pub use settings::{Preset, Settings};
