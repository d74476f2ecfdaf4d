/// Node and edge kinds of a resource allocation graph.
///
/// Both enums serialize to/from `snake_case` JSON strings.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a node is a process or a single-unit resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// An actor that requests and holds resources.
    Process,
    /// A single-instance resource.
    Resource,
}

/// Direction of a relationship between a process and a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Process → resource: the process is waiting to acquire the resource.
    Request,
    /// Resource → process: the resource is currently held by the process.
    Allocation,
}

impl EdgeKind {
    /// Returns the `snake_case` string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Request => "request",
            EdgeKind::Allocation => "allocation",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Process => "process",
            NodeKind::Resource => "resource",
        })
    }
}
