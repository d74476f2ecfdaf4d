//! Post-operation invariant tests using generated data.
#![allow(clippy::expect_used)]

use ragsim_bench::correctness;
use ragsim_bench::{GeneratedRag, GeneratorConfig, SizeTier, generate_rag};
use ragsim_core::{build_graph, choose_edge, detect};

fn medium() -> GeneratedRag {
    generate_rag(&SizeTier::Medium.config(42))
}

#[test]
fn graph_construction_invariants() {
    let rag = medium();
    let graph = build_graph(&rag.edges);
    correctness::check_graph_invariants(&rag.edges, &graph).expect("graph invariants hold");
}

#[test]
fn detection_finds_exactly_the_injected_rings() {
    for tier in [SizeTier::Small, SizeTier::Medium, SizeTier::Large] {
        let rag = generate_rag(&tier.config(7));
        let result = detect(&rag.edges, &rag.nodes);
        assert_eq!(
            result.cycles.len(),
            rag.expected_cycles,
            "tier {}",
            tier.label()
        );
        correctness::check_detection_result(&result, &rag.edges)
            .expect("detection invariants hold");
    }
}

#[test]
fn detection_agrees_with_petgraph() {
    let rag = medium();
    let graph = build_graph(&rag.edges);
    let result = detect(&rag.edges, &rag.nodes);
    correctness::check_agrees_with_petgraph(&result, &graph).expect("petgraph agrees");
}

#[test]
fn deadlock_free_base_reports_nothing() {
    let config = GeneratorConfig {
        inject_cycles: 0,
        ..SizeTier::Large.config(3)
    };
    let rag = generate_rag(&config);
    let result = detect(&rag.edges, &rag.nodes);
    assert!(!result.deadlocked);
    correctness::check_detection_result(&result, &rag.edges).expect("empty result is valid");
}

#[test]
fn anonymous_edges_are_reported_by_key() {
    let config = GeneratorConfig {
        id_fraction: 0.0,
        ..SizeTier::Small.config(11)
    };
    let rag = generate_rag(&config);
    let result = detect(&rag.edges, &rag.nodes);
    assert!(result.deadlocked);
    assert!(
        result
            .cycles_edges
            .iter()
            .flatten()
            .all(|r| r.as_id().is_none())
    );
    correctness::check_detection_result(&result, &rag.edges).expect("key refs are backed");
}

#[test]
fn first_choice_is_an_edge_of_the_first_cycle() {
    let rag = medium();
    let result = detect(&rag.edges, &rag.nodes);
    let choice = choose_edge(&result, &rag.edges).expect("deadlocked graph has a choice");
    let edge = rag.edges.get(choice.position).expect("position in range");
    let (cycle, _) = result.first().expect("first cycle");
    assert!(
        cycle
            .steps()
            .any(|(from, to)| edge.connects(from, to))
    );
}

#[test]
fn resolve_all_invariants() {
    let generated = medium();
    let mut rag = generated.to_rag().expect("document loads");
    let before = rag.edges().to_vec();
    let removed = rag.resolve_all();
    assert_eq!(removed.len(), generated.expected_cycles);
    correctness::check_resolution(&before, rag.edges(), &removed, &rag.detect())
        .expect("resolution invariants hold");
}

#[test]
fn generation_is_deterministic() {
    let a = generate_rag(&SizeTier::Medium.config(99));
    let b = generate_rag(&SizeTier::Medium.config(99));
    assert_eq!(a.nodes, b.nodes);
    assert_eq!(a.edges, b.edges);
    let c = generate_rag(&SizeTier::Medium.config(100));
    assert_ne!(a.edges, c.edges);
}

#[test]
fn to_rag_keeps_nodes_and_edges() {
    let generated = generate_rag(&SizeTier::Small.config(5));
    let rag = generated.to_rag().expect("document loads");
    assert_eq!(rag.nodes(), generated.nodes);
    assert_eq!(rag.edges(), generated.edges.as_slice());
    assert_eq!(rag.detect(), detect(&generated.edges, &generated.nodes));
}
