//! Topology: a wait-for order that cannot deadlock, plus injected rings.

use std::collections::HashSet;

use ragsim_core::{Edge, EdgeId, EdgeKind, NodeId};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::{GeneratedRag, GeneratorConfig};

/// Builds the full graph described by `config`.
///
/// Base processes only request resources that are free or held by a
/// higher-numbered process, so every base path climbs in process number and
/// the base is deadlock-free. Each injected ring uses fresh nodes; one base
/// process requests into it, which adds no cycle.
pub fn build_rag(config: &GeneratorConfig, rng: &mut StdRng) -> GeneratedRag {
    let mut ids = IdAssigner::new(config.id_fraction);
    let mut edges: Vec<Edge> = Vec::new();

    let holders = allocate(config, rng);
    for (r, holder) in holders.iter().enumerate() {
        if let Some(p) = holder {
            edges.push(ids.edge(rng, resource(r), process(*p), EdgeKind::Allocation));
        }
    }
    edges.extend(requests(config, &holders, &mut ids, rng));

    let ring_length = config.ring_length.max(2);
    for ring in 0..config.inject_cycles {
        let offset = ring * ring_length;
        let p = |i: usize| process(config.num_processes + offset + i % ring_length);
        let r = |i: usize| resource(config.num_resources + offset + i);
        for i in 0..ring_length {
            edges.push(ids.edge(rng, p(i), r(i), EdgeKind::Request));
            edges.push(ids.edge(rng, r(i), p(i + 1), EdgeKind::Allocation));
        }
        if config.num_processes > 0 {
            let waiter = rng.gen_range(0..config.num_processes);
            edges.push(ids.edge(rng, process(waiter), r(0), EdgeKind::Request));
        }
    }

    edges.shuffle(rng);

    let ring_nodes = config.inject_cycles * ring_length;
    let nodes = (0..config.num_processes + ring_nodes)
        .map(process)
        .chain((0..config.num_resources + ring_nodes).map(resource))
        .collect();

    GeneratedRag {
        nodes,
        edges,
        expected_cycles: config.inject_cycles,
    }
}

/// Picks a holder for each base resource, or `None` when it stays free.
fn allocate(config: &GeneratorConfig, rng: &mut StdRng) -> Vec<Option<usize>> {
    let fraction = config.allocation_fraction.clamp(0.0, 1.0);
    (0..config.num_resources)
        .map(|_| {
            if config.num_processes > 0 && rng.gen_bool(fraction) {
                Some(rng.gen_range(0..config.num_processes))
            } else {
                None
            }
        })
        .collect()
}

fn requests(
    config: &GeneratorConfig,
    holders: &[Option<usize>],
    ids: &mut IdAssigner,
    rng: &mut StdRng,
) -> Vec<Edge> {
    let mut out = Vec::new();
    if holders.is_empty() {
        return out;
    }
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    for p in 0..config.num_processes {
        let wanted = rng.gen_range(0..=config.max_requests_per_process);
        for _ in 0..wanted {
            let r = rng.gen_range(0..holders.len());
            let waits_upward = holders.get(r).copied().flatten().is_none_or(|h| h > p);
            if waits_upward && seen.insert((p, r)) {
                out.push(ids.edge(rng, process(p), resource(r), EdgeKind::Request));
            }
        }
    }
    out
}

fn process(i: usize) -> NodeId {
    NodeId::process(i + 1)
}

fn resource(i: usize) -> NodeId {
    NodeId::resource(i + 1)
}

/// Hands out sequential edge ids, leaving a fraction of edges anonymous.
struct IdAssigner {
    next: u64,
    fraction: f64,
}

impl IdAssigner {
    fn new(fraction: f64) -> Self {
        Self {
            next: 1,
            fraction: fraction.clamp(0.0, 1.0),
        }
    }

    fn edge(&mut self, rng: &mut StdRng, from: NodeId, to: NodeId, kind: EdgeKind) -> Edge {
        let id = if rng.gen_bool(self.fraction) {
            let id = EdgeId::sequential(self.next);
            self.next += 1;
            Some(id)
        } else {
            None
        };
        Edge::new(id, from, to, kind)
    }
}
