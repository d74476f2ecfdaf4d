/// Canonical cycle identity.
///
/// A closed cycle `[n0, n1, …, nk]` with `n0 == nk` has `k` rotations of its
/// core `[n0, …, nk-1]`. The canonical form is the rotation whose
/// comma-joined name key (`"P1,R1,P2,R2"`) is smallest, closed again by
/// repeating its first node. Two discoveries of the same cycle from
/// different entry points therefore compare equal element by element.
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::newtypes::{NewtypeError, NodeId};

/// Separator used when building the rotation comparison key.
const KEY_SEPARATOR: &str = ",";

/// A closed cycle in minimal rotation.
///
/// Always holds at least two entries and `first == last`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<NodeId>", try_from = "Vec<NodeId>")]
pub struct CanonicalCycle(Vec<NodeId>);

impl CanonicalCycle {
    /// Canonicalizes a closed raw cycle (`first == last`).
    ///
    /// Returns `None` if `closed` has fewer than two entries or is not
    /// closed.
    pub fn from_closed(closed: &[NodeId]) -> Option<Self> {
        match closed.split_last() {
            Some((last, core)) if core.first() == Some(last) => Some(Self::from_core(core)),
            Some(_) | None => None,
        }
    }

    /// Canonicalizes an open core sequence and closes it.
    ///
    /// An empty core yields an empty cycle; callers never produce one.
    pub fn from_core(core: &[NodeId]) -> Self {
        let (head, tail) = core.split_at(minimal_rotation(core));
        let mut nodes = Vec::with_capacity(core.len() + 1);
        nodes.extend_from_slice(tail);
        nodes.extend_from_slice(head);
        if let Some(first) = nodes.first().cloned() {
            nodes.push(first);
        }
        Self(nodes)
    }

    /// The closed node sequence, first node repeated at the end.
    pub fn nodes(&self) -> &[NodeId] {
        &self.0
    }

    /// The node sequence without the closing repeat.
    pub fn core(&self) -> &[NodeId] {
        self.0.split_last().map_or(&[][..], |(_, core)| core)
    }

    /// Number of steps (edges) in the cycle.
    pub fn len(&self) -> usize {
        self.core().len()
    }

    pub fn is_empty(&self) -> bool {
        self.core().is_empty()
    }

    /// Consecutive `(from, to)` pairs in cycle order.
    pub fn steps(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> {
        self.0.windows(2).map(|w| (&w[0], &w[1]))
    }

    /// Number of distinct process nodes on the cycle.
    pub fn process_count(&self) -> usize {
        distinct_processes(self.core())
    }

    /// Whether `node` lies on the cycle.
    pub fn contains(&self, node: &NodeId) -> bool {
        self.core().contains(node)
    }
}

impl From<CanonicalCycle> for Vec<NodeId> {
    fn from(cycle: CanonicalCycle) -> Self {
        cycle.0
    }
}

impl TryFrom<Vec<NodeId>> for CanonicalCycle {
    type Error = NewtypeError;

    fn try_from(nodes: Vec<NodeId>) -> Result<Self, Self::Error> {
        match Self::from_closed(&nodes) {
            Some(canonical) if canonical.0 == nodes => Ok(canonical),
            Some(_) | None => Err(NewtypeError::InvalidFormat {
                type_name: "CanonicalCycle",
                expected: "closed node sequence in minimal rotation",
                got: rotation_key(&nodes),
            }),
        }
    }
}

impl fmt::Display for CanonicalCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" → ")?;
            }
            f.write_str(node)?;
        }
        Ok(())
    }
}

/// Counts distinct process nodes in `nodes`.
pub fn distinct_processes(nodes: &[NodeId]) -> usize {
    nodes
        .iter()
        .filter(|n| n.is_process())
        .collect::<HashSet<_>>()
        .len()
}

/// The comma-joined name key rotations are compared by.
pub fn rotation_key(nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(NodeId::name)
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Index of the first rotation of `core` with the smallest key.
///
/// Keys are compared lazily, byte by byte, without materializing them.
fn minimal_rotation(core: &[NodeId]) -> usize {
    let mut best = 0;
    for start in 1..core.len() {
        if rotation_bytes(core, start).lt(rotation_bytes(core, best)) {
            best = start;
        }
    }
    best
}

/// The bytes of the rotation key of `core` starting at `start`.
fn rotation_bytes(core: &[NodeId], start: usize) -> impl Iterator<Item = u8> + '_ {
    let (head, tail) = core.split_at(start.min(core.len()));
    tail.iter().chain(head).enumerate().flat_map(|(i, node)| {
        let sep = if i == 0 { "" } else { KEY_SEPARATOR };
        sep.bytes().chain(node.name().bytes())
    })
}
