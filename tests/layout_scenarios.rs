//! End-to-end layout runs through the public engine API.

use citation_layout::graph::Vec2;
use citation_layout::{GraphEdge, GraphNode, LayoutConfig, LayoutEngine, LayoutPhase};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

fn distance(positions: &HashMap<String, (f64, f64)>, a: &str, b: &str) -> f64 {
    let (ax, ay) = positions[a];
    let (bx, by) = positions[b];
    Vec2::new(ax, ay).distance(Vec2::new(bx, by))
}

fn pairwise(positions: &HashMap<String, (f64, f64)>) -> [f64; 3] {
    [
        distance(positions, "a", "b"),
        distance(positions, "b", "c"),
        distance(positions, "a", "c"),
    ]
}

#[test]
fn test_three_nodes_repel_and_settle() {
    // Triangle with side 10, moved into the middle of the canvas
    let offset = 500.0;
    let nodes = vec![
        GraphNode::at("a", offset, offset),
        GraphNode::at("b", offset + 10.0, offset),
        GraphNode::at("c", offset + 5.0, offset + 8.66),
    ];
    let config = LayoutConfig {
        strength: -30.0,
        theta: 0.9,
        alpha_decay: 0.05,
        alpha_min: 1e-4,
        center_strength: 0.0,
        width: 1000.0,
        height: 1000.0,
        boundary_margin: 10.0,
        ..Default::default()
    };
    let start: HashMap<String, (f64, f64)> = nodes
        .iter()
        .filter_map(|n| n.position().map(|p| (n.id.clone(), (p.x, p.y))))
        .collect();
    let initial = pairwise(&start);

    let mut engine = LayoutEngine::seeded(7);
    engine.initialize(&nodes, &[], config).unwrap();

    // Largest change in any pairwise distance on the tick that completed
    let mut previous = initial;
    let mut settled_delta = None;
    for tick in 1..=200 {
        let phase = engine.step().unwrap();
        let current = pairwise(&engine.positions());
        if phase == LayoutPhase::Complete {
            let delta = (0..3)
                .map(|i| (current[i] - previous[i]).abs())
                .fold(0.0, f64::max);
            settled_delta = Some((tick, delta));
            break;
        }
        previous = current;
    }

    // 0.95^180 < 1e-4
    let Some((tick, delta)) = settled_delta else {
        panic!("layout still running after 200 ticks");
    };
    assert_eq!(tick, 180);
    assert!(delta < 1e-3, "still moving when complete: {delta}");
    assert!(engine.alpha().unwrap() < 1e-4);

    let last = pairwise(&engine.positions());
    for i in 0..3 {
        assert!(last[i] > initial[i], "pair {i} did not separate: {} <= {}", last[i], initial[i]);
    }

    // Further ticks leave the frozen layout alone
    engine.step().unwrap();
    assert_eq!(pairwise(&engine.positions()), last);
}

#[test]
fn test_path_converges_to_rest_length() {
    let nodes = vec![
        GraphNode::at("a", 400.0, 480.0),
        GraphNode::at("b", 500.0, 500.0),
        GraphNode::at("c", 620.0, 524.0),
    ];
    let edges = vec![GraphEdge::new("a", "b", 1.0), GraphEdge::new("b", "c", 1.0)];
    let config = LayoutConfig {
        strength: 0.0,
        center_strength: 0.0,
        attraction: 0.05,
        alpha_decay: 0.02,
        alpha_min: 0.001,
        ..Default::default()
    };

    let mut engine = LayoutEngine::seeded(3);
    engine.initialize(&nodes, &edges, config).unwrap();

    // Both edges start short of the rest length, so the ends move outward
    // along the path direction (5, 1)
    let start = engine.positions();
    engine.step().unwrap();
    let first = engine.positions();
    let direction = Vec2::new(5.0, 1.0);
    for (id, sign) in [("a", -1.0), ("c", 1.0)] {
        let moved = Vec2::new(first[id].0 - start[id].0, first[id].1 - start[id].1);
        let along = (moved.x * direction.x + moved.y * direction.y) * sign;
        let across = moved.x * direction.y - moved.y * direction.x;
        assert!(along > 0.0, "{id} moved the wrong way: {:?}", moved);
        assert!(across.abs() < 1e-9, "{id} left the line: {:?}", moved);
    }
    assert!(distance(&first, "a", "b") > distance(&start, "a", "b"));
    assert!(distance(&first, "b", "c") > distance(&start, "b", "c"));

    engine.run_to_completion(10_000).unwrap();
    assert!(engine.is_complete());

    let positions = engine.positions();
    assert!((distance(&positions, "a", "b") - 150.0).abs() < 0.01);
    assert!((distance(&positions, "b", "c") - 150.0).abs() < 0.01);

    let [a, b, c] = ["a", "b", "c"].map(|id| {
        let (x, y) = positions[id];
        Vec2::new(x, y)
    });
    let ab = b - a;
    let bc = c - b;
    let sine = (ab.x * bc.y - ab.y * bc.x) / (ab.length() * bc.length());
    assert!(sine.abs() < 1e-6, "path bent: sin = {sine}");
}

#[test]
fn test_boundary_holds_after_every_step() {
    let mut rng = StdRng::seed_from_u64(17);
    let nodes: Vec<GraphNode> = (0..60)
        .map(|i| {
            GraphNode::at(
                format!("p{i}"),
                rng.gen_range(20.0..580.0),
                rng.gen_range(20.0..380.0),
            )
        })
        .collect();
    let edges: Vec<GraphEdge> = (0..80)
        .map(|_| {
            let a = rng.gen_range(0..60);
            let b = rng.gen_range(0..60);
            GraphEdge::from_citations(format!("p{a}"), format!("p{b}"), rng.gen_range(0..100_000), 1_000)
        })
        .collect();
    let config = LayoutConfig {
        strength: -400.0,
        center: Vec2::new(300.0, 200.0),
        width: 600.0,
        height: 400.0,
        boundary_margin: 20.0,
        alpha_decay: 0.02,
        ..Default::default()
    };

    let mut engine = LayoutEngine::seeded(17);
    engine.initialize(&nodes, &edges, config).unwrap();

    loop {
        let phase = engine.step().unwrap();
        for node in engine.nodes() {
            let p = node.position;
            assert!(p.is_finite());
            assert!((20.0..=580.0).contains(&p.x), "{} escaped: {:?}", node.id, p);
            assert!((20.0..=380.0).contains(&p.y), "{} escaped: {:?}", node.id, p);
        }
        if phase != LayoutPhase::Running {
            break;
        }
    }
}

#[test]
fn test_coincident_nodes_never_produce_nan() {
    let nodes: Vec<GraphNode> = (0..5).map(|i| GraphNode::at(format!("n{i}"), 800.0, 800.0)).collect();
    let mut engine = LayoutEngine::seeded(99);
    engine.initialize(&nodes, &[], LayoutConfig::default()).unwrap();

    engine.step().unwrap();
    for node in engine.nodes() {
        assert!(node.position.is_finite(), "{:?}", node);
        assert!(node.velocity.is_finite(), "{:?}", node);
    }

    engine.run_to_completion(50).unwrap();
    let positions: Vec<(f64, f64)> = engine.positions().into_values().collect();
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_completes_on_exact_step() {
    let config = LayoutConfig::default();
    let mut alpha: f64 = 1.0;
    let mut expected = 0;
    while alpha >= config.alpha_min {
        alpha *= 1.0 - config.alpha_decay;
        expected += 1;
    }

    let nodes = vec![GraphNode::at("a", 1000.0, 900.0), GraphNode::at("b", 1400.0, 900.0)];
    let mut engine = LayoutEngine::seeded(1);
    engine.initialize(&nodes, &[], config).unwrap();

    let mut previous = 1.0;
    for tick in 1..expected {
        assert_eq!(engine.step(), Ok(LayoutPhase::Running), "completed early at {tick}");
        let alpha = engine.alpha().unwrap();
        assert!(alpha < previous);
        previous = alpha;
    }
    assert_eq!(engine.step(), Ok(LayoutPhase::Complete));
    assert_eq!(engine.steps(), expected);
}

#[test]
fn test_reheat_resumes_a_completed_layout() {
    let nodes = vec![
        GraphNode::at("a", 1000.0, 900.0),
        GraphNode::at("b", 1100.0, 900.0),
        GraphNode::at("c", 1050.0, 990.0),
    ];
    let config = LayoutConfig {
        alpha_decay: 0.05,
        ..Default::default()
    };
    let mut engine = LayoutEngine::seeded(5);
    engine.initialize(&nodes, &[GraphEdge::new("a", "b", 0.3)], config).unwrap();
    engine.run_to_completion(1_000).unwrap();
    assert!(engine.is_complete());
    let settled_steps = engine.steps();

    engine.reheat(0.5).unwrap();
    assert!(engine.is_running());
    assert_eq!(engine.alpha(), Some(0.5));

    assert_eq!(engine.step(), Ok(LayoutPhase::Running));
    assert!((engine.alpha().unwrap() - 0.5 * 0.95).abs() < 1e-12);
    assert_eq!(engine.steps(), settled_steps + 1);

    engine.run_to_completion(1_000).unwrap();
    assert!(engine.is_complete());
}

#[test]
fn test_filter_change_replaces_graph() {
    let nodes: Vec<GraphNode> = (0..10).map(|i| GraphNode::new(format!("p{i}"))).collect();
    let edges: Vec<GraphEdge> = (1..10)
        .map(|i| GraphEdge::from_citations("p0", format!("p{i}"), 40_000, 20_000 * i))
        .collect();
    let config = LayoutConfig {
        alpha_decay: 0.05,
        ..Default::default()
    };
    let mut engine = LayoutEngine::seeded(8);
    engine.initialize(&nodes, &edges, config).unwrap();
    engine.run_to_completion(1_000).unwrap();
    let before = engine.positions();

    // Keep the even papers only
    let visible: Vec<GraphNode> = nodes.iter().step_by(2).cloned().collect();
    engine.replace_graph(&visible, &edges, 0.8).unwrap();
    assert!(engine.is_running());
    assert_eq!(engine.edge_count(), 4);

    let resumed = engine.positions();
    assert_eq!(resumed.len(), 5);
    for node in &visible {
        assert_eq!(resumed[&node.id], before[&node.id]);
    }

    engine.run_to_completion(1_000).unwrap();
    assert!(engine.is_complete());
    assert_eq!(engine.positions().len(), 5);
}
