//! Resource allocation graph generator.
//!
//! Produces a deadlock-free base graph plus an exact number of injected
//! deadlock rings, so every generated graph has a known cycle count.

pub mod topology;

use ragsim_core::{Edge, NodeId, Rag};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Configuration for the RAG generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Seed for the random number generator (deterministic).
    pub seed: u64,
    /// Number of processes in the deadlock-free base graph.
    pub num_processes: usize,
    /// Number of resources in the deadlock-free base graph.
    pub num_resources: usize,
    /// Upper bound on request edges per base process.
    pub max_requests_per_process: usize,
    /// Fraction of base resources that are allocated (0.0-1.0).
    pub allocation_fraction: f64,
    /// Number of deadlock rings appended to the base graph.
    pub inject_cycles: usize,
    /// Processes per injected ring (at least 2).
    pub ring_length: usize,
    /// Fraction of edges that carry an id (0.0-1.0).
    pub id_fraction: f64,
}

/// Predefined size tiers for benchmarking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    /// ~40 nodes, ~60 edges
    Small,
    /// ~400 nodes, ~700 edges
    Medium,
    /// ~4000 nodes, ~7000 edges
    Large,
    /// ~20000 nodes, ~35000 edges
    XLarge,
}

impl SizeTier {
    /// Returns the default `GeneratorConfig` for this size tier.
    pub fn config(self, seed: u64) -> GeneratorConfig {
        let (nodes, cycles, ring_length) = match self {
            SizeTier::Small => (20, 1, 2),
            SizeTier::Medium => (200, 5, 3),
            SizeTier::Large => (2000, 20, 4),
            SizeTier::XLarge => (10_000, 50, 6),
        };
        GeneratorConfig {
            seed,
            num_processes: nodes,
            num_resources: nodes,
            max_requests_per_process: 3,
            allocation_fraction: 0.7,
            inject_cycles: cycles,
            ring_length,
            id_fraction: 0.9,
        }
    }

    /// Short label used in benchmark ids.
    pub fn label(self) -> &'static str {
        match self {
            SizeTier::Small => "S",
            SizeTier::Medium => "M",
            SizeTier::Large => "L",
            SizeTier::XLarge => "XL",
        }
    }
}

/// A generated graph: declared nodes in detection seed order plus edges.
#[derive(Debug, Clone)]
pub struct GeneratedRag {
    /// Processes followed by resources.
    pub nodes: Vec<NodeId>,
    /// All edges, shuffled.
    pub edges: Vec<Edge>,
    /// Number of deadlock cycles the graph contains.
    pub expected_cycles: usize,
}

impl GeneratedRag {
    /// Converts into an editable [`Rag`] by round-tripping the document form.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error message if the document is rejected.
    pub fn to_rag(&self) -> Result<Rag, String> {
        let (processes, resources): (Vec<&NodeId>, Vec<&NodeId>) =
            self.nodes.iter().partition(|n| n.is_process());
        let doc = serde_json::json!({
            "processes": processes,
            "resources": resources,
            "edges": self.edges,
        });
        serde_json::from_value(doc).map_err(|e| e.to_string())
    }
}

/// Generates a RAG from the given configuration.
///
/// The same config (including seed) always produces the same graph.
pub fn generate_rag(config: &GeneratorConfig) -> GeneratedRag {
    let mut rng = StdRng::seed_from_u64(config.seed);
    topology::build_rag(config, &mut rng)
}
