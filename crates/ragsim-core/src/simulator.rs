/// The editable resource allocation graph.
///
/// [`Rag`] owns the process and resource lists, the edge list and the edge
/// id counter. It is the mutation surface that feeds snapshots to
/// [`detect`](crate::graph::detect) and applies
/// [`choose_edge`](crate::resolution::choose_edge) decisions.
///
/// # Document format
///
/// A `Rag` (de)serializes as
///
/// ```json
/// { "processes": ["P1"], "resources": ["R1"],
///   "edges": [{"id": "e1", "from": "P1", "to": "R1", "type": "request"}],
///   "next_edge_seq": 2 }
/// ```
///
/// Every field is optional on input, and a field of the wrong shape or a list
/// entry that does not parse is skipped with a warning. Loading then repairs
/// two things: names in
/// `processes` and `resources` are tagged with their declared kind (also on
/// edge endpoints that name them), and `next_edge_seq` is raised above every
/// existing `e<k>` id so new ids never collide.
use std::collections::HashMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::enums::{EdgeKind, NodeKind};
use crate::graph::{DetectionResult, detect};
use crate::newtypes::{EdgeId, NodeId};
use crate::resolution::choose_edge;
use crate::structures::Edge;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A rejected graph mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RagError {
    /// The named node is not declared in the graph.
    #[error("unknown {kind} {name:?}")]
    UnknownNode {
        /// The kind the caller asked for.
        kind: NodeKind,
        /// The name that was not found.
        name: String,
    },
    /// An edge with the same endpoints and kind already exists.
    #[error("duplicate {kind} edge {from} -> {to} (existing edge {existing})")]
    DuplicateEdge {
        /// Source of the rejected edge.
        from: NodeId,
        /// Target of the rejected edge.
        to: NodeId,
        /// Kind of the rejected edge.
        kind: EdgeKind,
        /// Id (or `"from->to"` key) of the edge already present.
        existing: String,
    },
    /// No edge carries the given id.
    #[error("no edge with id {id:?}")]
    UnknownEdge {
        /// The id that was not found.
        id: String,
    },
}

// ---------------------------------------------------------------------------
// Rag
// ---------------------------------------------------------------------------

/// A single-instance resource allocation graph under edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RagDocument", into = "RagDocument")]
pub struct Rag {
    processes: Vec<NodeId>,
    resources: Vec<NodeId>,
    edges: Vec<Edge>,
    next_edge_seq: u64,
}

impl Default for Rag {
    fn default() -> Self {
        Self {
            processes: Vec::new(),
            resources: Vec::new(),
            edges: Vec::new(),
            next_edge_seq: 1,
        }
    }
}

impl Rag {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// The classic two-process deadlock: `P1 → R1 → P2 → R2 → P1`.
    pub fn example() -> Self {
        let (p1, p2) = (NodeId::process(1), NodeId::process(2));
        let (r1, r2) = (NodeId::resource(1), NodeId::resource(2));
        let edges = vec![
            Edge::request(Some(EdgeId::sequential(1)), p1.clone(), r1.clone()),
            Edge::allocation(Some(EdgeId::sequential(2)), r1.clone(), p2.clone()),
            Edge::request(Some(EdgeId::sequential(3)), p2.clone(), r2.clone()),
            Edge::allocation(Some(EdgeId::sequential(4)), r2.clone(), p1.clone()),
        ];
        Self {
            processes: vec![p1, p2],
            resources: vec![r1, r2],
            edges,
            next_edge_seq: 5,
        }
    }

    pub fn processes(&self) -> &[NodeId] {
        &self.processes
    }

    pub fn resources(&self) -> &[NodeId] {
        &self.resources
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The sequence number the next created edge will receive.
    pub fn next_edge_seq(&self) -> u64 {
        self.next_edge_seq
    }

    /// All nodes, processes first: the detection seed order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.processes
            .iter()
            .chain(&self.resources)
            .cloned()
            .collect()
    }

    /// Looks up a declared node by kind and name.
    pub fn find_node(&self, kind: NodeKind, name: &str) -> Option<&NodeId> {
        self.category(kind).iter().find(|n| n.name() == name)
    }

    /// Number of `(request, allocation)` edges.
    pub fn edge_counts(&self) -> (usize, usize) {
        self.edges
            .iter()
            .fold((0, 0), |(req, alloc), e| match e.kind {
                EdgeKind::Request => (req + 1, alloc),
                EdgeKind::Allocation => (req, alloc + 1),
            })
    }

    /// Whether any allocation edge exists.
    ///
    /// A graph with no allocations cannot deadlock, so a "no deadlock"
    /// verdict is only informative when this is `true`.
    pub fn has_allocations(&self) -> bool {
        self.edges.iter().any(|e| e.kind == EdgeKind::Allocation)
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Appends a process named `P<k>`, `k` being the process count plus one.
    pub fn add_process(&mut self) -> NodeId {
        self.add_node(NodeKind::Process)
    }

    /// Appends a resource named `R<k>`, `k` being the resource count plus one.
    pub fn add_resource(&mut self) -> NodeId {
        self.add_node(NodeKind::Resource)
    }

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let make = match kind {
            NodeKind::Process => NodeId::process,
            NodeKind::Resource => NodeId::resource,
        };
        // A loaded document may already use the natural name; skip ahead.
        let mut k = self.category(kind).len() + 1;
        while self.category(kind).contains(&make(k)) {
            k += 1;
        }
        let node = make(k);
        tracing::debug!(node = %node, "added {kind}");
        self.category_mut(kind).push(node.clone());
        node
    }

    /// Creates a request (`process → resource`) or allocation
    /// (`resource → process`) edge with the next sequential id.
    ///
    /// # Errors
    ///
    /// - [`RagError::UnknownNode`] if either node is not declared.
    /// - [`RagError::DuplicateEdge`] if an edge with the same endpoints and
    ///   kind already exists.
    pub fn create_edge(
        &mut self,
        process: &NodeId,
        resource: &NodeId,
        kind: EdgeKind,
    ) -> Result<Edge, RagError> {
        self.require(NodeKind::Process, process)?;
        self.require(NodeKind::Resource, resource)?;

        let (from, to) = match kind {
            EdgeKind::Request => (process, resource),
            EdgeKind::Allocation => (resource, process),
        };

        if let Some(existing) = self
            .edges
            .iter()
            .find(|e| e.kind == kind && e.connects(from, to))
        {
            return Err(RagError::DuplicateEdge {
                from: from.clone(),
                to: to.clone(),
                kind,
                existing: existing
                    .id
                    .as_ref()
                    .map_or_else(|| format!("{from}->{to}"), ToString::to_string),
            });
        }

        let id = EdgeId::sequential(self.next_edge_seq);
        self.next_edge_seq += 1;
        tracing::debug!(edge_id = %id, %from, %to, %kind, "created edge");
        let edge = Edge::new(Some(id), from.clone(), to.clone(), kind);
        self.edges.push(edge.clone());
        Ok(edge)
    }

    /// Removes the edge with id `id` and returns it.
    ///
    /// # Errors
    ///
    /// [`RagError::UnknownEdge`] if no edge has that id.
    pub fn delete_edge(&mut self, id: &EdgeId) -> Result<Edge, RagError> {
        let position = self
            .edges
            .iter()
            .position(|e| e.id.as_ref() == Some(id))
            .ok_or_else(|| RagError::UnknownEdge {
                id: id.to_string(),
            })?;
        let removed = self.edges.remove(position);
        tracing::debug!(edge_id = %id, "deleted edge");
        Ok(removed)
    }

    /// Clears all nodes and edges and restarts edge numbering at `e1`.
    pub fn reset(&mut self) {
        *self = Self::default();
        tracing::debug!("graph reset");
    }

    // -----------------------------------------------------------------------
    // Detection and resolution
    // -----------------------------------------------------------------------

    /// Runs deadlock detection over the current snapshot.
    pub fn detect(&self) -> DetectionResult {
        detect(&self.edges, &self.nodes())
    }

    /// Removes one edge of the first deadlock cycle, if any.
    ///
    /// Returns the removed edge, or `None` when there is no deadlock or no
    /// identifiable edge to remove.
    pub fn resolve_deadlock(&mut self) -> Option<Edge> {
        let result = self.detect();
        let choice = choose_edge(&result, &self.edges)?;
        if choice.position >= self.edges.len() {
            return None;
        }
        let removed = self.edges.remove(choice.position);
        tracing::info!(
            edge_id = ?removed.id,
            from = ?removed.from,
            to = ?removed.to,
            "removed edge to break deadlock"
        );
        Some(removed)
    }

    /// Repeats [`resolve_deadlock`](Self::resolve_deadlock) until the graph
    /// is deadlock-free or no edge can be chosen.
    ///
    /// Returns the removed edges in removal order.
    pub fn resolve_all(&mut self) -> Vec<Edge> {
        let mut removed = Vec::new();
        while let Some(edge) = self.resolve_deadlock() {
            removed.push(edge);
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn category(&self, kind: NodeKind) -> &[NodeId] {
        match kind {
            NodeKind::Process => &self.processes,
            NodeKind::Resource => &self.resources,
        }
    }

    fn category_mut(&mut self, kind: NodeKind) -> &mut Vec<NodeId> {
        match kind {
            NodeKind::Process => &mut self.processes,
            NodeKind::Resource => &mut self.resources,
        }
    }

    fn require(&self, kind: NodeKind, node: &NodeId) -> Result<(), RagError> {
        if node.kind() == kind && self.category(kind).contains(node) {
            Ok(())
        } else {
            Err(RagError::UnknownNode {
                kind,
                name: node.name().to_owned(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Document (serde mirror)
// ---------------------------------------------------------------------------

/// Wire shape of a [`Rag`]. Field order is the serialized key order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RagDocument {
    #[serde(default, deserialize_with = "lenient_processes")]
    processes: Vec<String>,
    #[serde(default, deserialize_with = "lenient_resources")]
    resources: Vec<String>,
    #[serde(default, deserialize_with = "lenient_edges")]
    edges: Vec<Edge>,
    #[serde(default)]
    next_edge_seq: u64,
}

impl From<Rag> for RagDocument {
    fn from(rag: Rag) -> Self {
        let names = |nodes: Vec<NodeId>| -> Vec<String> {
            nodes.iter().map(ToString::to_string).collect()
        };
        Self {
            processes: names(rag.processes),
            resources: names(rag.resources),
            edges: rag.edges,
            next_edge_seq: rag.next_edge_seq,
        }
    }
}

impl From<RagDocument> for Rag {
    fn from(doc: RagDocument) -> Self {
        let processes = tag_all(NodeKind::Process, &doc.processes);
        let resources = tag_all(NodeKind::Resource, &doc.resources);

        // Processes win when a name is declared in both lists.
        let mut declared: HashMap<&str, &NodeId> = HashMap::new();
        for node in resources.iter().rev().chain(processes.iter().rev()) {
            declared.insert(node.name(), node);
        }
        let retag = |node: Option<NodeId>| {
            node.map(|n| match declared.get(n.name()) {
                Some(d) => (*d).clone(),
                None => n,
            })
        };
        let edges: Vec<Edge> = doc
            .edges
            .into_iter()
            .map(|e| Edge {
                from: retag(e.from),
                to: retag(e.to),
                ..e
            })
            .collect();

        let floor = edges
            .iter()
            .filter_map(|e| e.id.as_ref().and_then(EdgeId::sequence_number))
            .max()
            .map_or(1, |max| max.saturating_add(1));
        let next_edge_seq = doc.next_edge_seq.max(floor);
        if next_edge_seq != doc.next_edge_seq {
            tracing::debug!(
                declared = doc.next_edge_seq,
                repaired = next_edge_seq,
                "raised edge sequence counter"
            );
        }

        Self {
            processes,
            resources,
            edges,
            next_edge_seq,
        }
    }
}

/// One list entry: kept when it parses as `T`, otherwise consumed and dropped.
#[derive(Deserialize)]
#[serde(untagged)]
enum Entry<T> {
    Valid(T),
    Invalid(IgnoredAny),
}

/// A list field, or anything else standing where the list should be.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientList<T> {
    List(Vec<Entry<T>>),
    NotAList(IgnoredAny),
}

fn lenient_list<'de, D, T>(deserializer: D, field: &'static str) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let entries = match LenientList::deserialize(deserializer)? {
        LenientList::List(entries) => entries,
        LenientList::NotAList(_) => {
            tracing::warn!(field, "expected a list, treating as empty");
            return Ok(Vec::new());
        }
    };
    let mut kept = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            Entry::Valid(value) => kept.push(value),
            Entry::Invalid(_) => tracing::warn!(field, index, "skipping malformed entry"),
        }
    }
    Ok(kept)
}

fn lenient_processes<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    lenient_list(d, "processes")
}

fn lenient_resources<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    lenient_list(d, "resources")
}

fn lenient_edges<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Edge>, D::Error> {
    lenient_list(d, "edges")
}

/// Tags declared names with `kind`, dropping names that fail validation.
fn tag_all(kind: NodeKind, names: &[String]) -> Vec<NodeId> {
    names
        .iter()
        .filter_map(|name| match NodeId::new(kind, name) {
            Ok(node) => Some(node),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring invalid {kind} name");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
