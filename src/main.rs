//! Headless citation graph layout.
//!
//! Reads a graph as JSON, runs the force simulation to completion and prints
//! the final positions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use citation_layout::{GraphData, LayoutConfig, LayoutEngine, LayoutPhase, Settings};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Lay out a citation graph with a Barnes-Hut force simulation.
#[derive(Parser)]
#[command(name = "citation-layout")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Graph JSON: {"nodes": [...], "edges": [...]}
    graph: PathBuf,

    /// Layout config JSON, overriding saved settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Named preset from the settings file
    #[arg(short, long, conflicts_with = "config")]
    preset: Option<String>,

    /// Save the effective layout config as a preset under this name
    #[arg(long)]
    save_preset: Option<String>,

    /// Seed for reproducible layouts
    #[arg(short, long)]
    seed: Option<u64>,

    /// Maximum simulation ticks
    #[arg(short, long)]
    max_steps: Option<usize>,

    /// Write positions here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load();
    if let Some(name) = &cli.preset {
        settings.apply_preset(name)?;
    }
    if let Some(path) = &cli.config {
        settings.layout = read_json::<LayoutConfig>(path)?;
    }
    let config = settings.layout_config()?;

    if let Some(name) = cli.save_preset {
        settings.save_preset(name);
        settings.save().context("failed to save settings")?;
    }

    let graph: GraphData = read_json(&cli.graph)?;

    let mut engine = match cli.seed.or(settings.seed) {
        Some(seed) => LayoutEngine::seeded(seed),
        None => LayoutEngine::new(),
    };
    engine.initialize(&graph.nodes, &graph.edges, config)?;

    let max_steps = cli.max_steps.unwrap_or(settings.max_steps);
    let steps = engine.run_to_completion(max_steps)?;
    if engine.phase() != LayoutPhase::Complete {
        tracing::warn!(steps, alpha = ?engine.alpha(), "Layout did not converge");
    }

    let positions: BTreeMap<String, [f64; 2]> = engine
        .positions()
        .into_iter()
        .map(|(id, (x, y))| (id, [x, y]))
        .collect();
    let json = serde_json::to_string_pretty(&positions)?;

    match &cli.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }

    Ok(())
}
