/// Edge records and edge references of a resource allocation graph.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::enums::EdgeKind;
use crate::newtypes::{EdgeId, NewtypeError, NodeId};

/// Separator used in the fallback `"from->to"` edge key.
pub const EDGE_KEY_SEPARATOR: &str = "->";

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// A directed request or allocation edge.
///
/// Both endpoints are optional so that a malformed record can travel with
/// the rest of a snapshot; graph construction skips any edge that lacks an
/// endpoint. `id`, when present, identifies this edge instance and is the
/// preferred handle for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EdgeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NodeId>,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

impl Edge {
    /// Builds an edge with both endpoints present.
    pub fn new(id: Option<EdgeId>, from: NodeId, to: NodeId, kind: EdgeKind) -> Self {
        Self {
            id,
            from: Some(from),
            to: Some(to),
            kind,
        }
    }

    /// `process → resource`.
    pub fn request(id: Option<EdgeId>, process: NodeId, resource: NodeId) -> Self {
        Self::new(id, process, resource, EdgeKind::Request)
    }

    /// `resource → process`.
    pub fn allocation(id: Option<EdgeId>, resource: NodeId, process: NodeId) -> Self {
        Self::new(id, resource, process, EdgeKind::Allocation)
    }

    /// Both endpoints, or `None` for a malformed edge.
    pub fn endpoints(&self) -> Option<(&NodeId, &NodeId)> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => Some((from, to)),
            (None, _) | (_, None) => None,
        }
    }

    /// Whether this edge connects `from` to `to`.
    pub fn connects(&self, from: &NodeId, to: &NodeId) -> bool {
        self.from.as_ref() == Some(from) && self.to.as_ref() == Some(to)
    }
}

// ---------------------------------------------------------------------------
// EdgeRef
// ---------------------------------------------------------------------------

/// Identifies the edge behind one step of a reported cycle.
///
/// Displays (and serializes) as the edge id when the edge has one, or as
/// the fallback key `"from->to"` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeRef {
    /// The matching edge carries an explicit id.
    Id(EdgeId),
    /// The matching edge has no id (or no edge was found for the pair).
    Key {
        /// Source node of the step.
        from: NodeId,
        /// Target node of the step.
        to: NodeId,
    },
}

impl EdgeRef {
    pub fn as_id(&self) -> Option<&EdgeId> {
        match self {
            EdgeRef::Id(id) => Some(id),
            EdgeRef::Key { .. } => None,
        }
    }
}

impl fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeRef::Id(id) => f.write_str(id),
            EdgeRef::Key { from, to } => write!(f, "{from}{EDGE_KEY_SEPARATOR}{to}"),
        }
    }
}

impl FromStr for EdgeRef {
    type Err = NewtypeError;

    /// Parses `"from->to"` as a key and anything else as an edge id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(EDGE_KEY_SEPARATOR) {
            Some((from, to)) => Ok(EdgeRef::Key {
                from: NodeId::try_from(from)?,
                to: NodeId::try_from(to)?,
            }),
            None => Ok(EdgeRef::Id(EdgeId::try_from(s)?)),
        }
    }
}

impl Serialize for EdgeRef {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EdgeRef {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    fn eid(s: &str) -> EdgeId {
        EdgeId::try_from(s).expect("valid EdgeId")
    }

    #[test]
    fn request_and_allocation_directions() {
        let req = Edge::request(None, NodeId::process(1), NodeId::resource(1));
        assert_eq!(req.from, Some(NodeId::process(1)));
        assert_eq!(req.to, Some(NodeId::resource(1)));
        assert_eq!(req.kind, EdgeKind::Request);

        let alloc = Edge::allocation(None, NodeId::resource(1), NodeId::process(2));
        assert_eq!(alloc.from, Some(NodeId::resource(1)));
        assert_eq!(alloc.to, Some(NodeId::process(2)));
        assert_eq!(alloc.kind, EdgeKind::Allocation);
    }

    #[test]
    fn edge_json_uses_type_field() {
        let edge = Edge::request(Some(eid("e1")), NodeId::process(1), NodeId::resource(2));
        let json = serde_json::to_value(&edge).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"id": "e1", "from": "P1", "to": "R2", "type": "request"})
        );
    }

    #[test]
    fn edge_without_from_deserializes_as_malformed() {
        let edge: Edge =
            serde_json::from_str(r#"{"to": "R1", "type": "request"}"#).expect("deserialize");
        assert!(edge.from.is_none());
        assert!(edge.endpoints().is_none());
    }

    #[test]
    fn connects_checks_both_endpoints() {
        let edge = Edge::request(None, NodeId::process(1), NodeId::resource(1));
        assert!(edge.connects(&NodeId::process(1), &NodeId::resource(1)));
        assert!(!edge.connects(&NodeId::resource(1), &NodeId::process(1)));
    }

    #[test]
    fn edge_ref_display() {
        assert_eq!(EdgeRef::Id(eid("e7")).to_string(), "e7");
        let key = EdgeRef::Key {
            from: NodeId::resource(2),
            to: NodeId::process(1),
        };
        assert_eq!(key.to_string(), "R2->P1");
    }

    #[test]
    fn edge_ref_parses_key_and_id() {
        let key: EdgeRef = "P1->R1".parse().expect("parse key");
        assert_eq!(
            key,
            EdgeRef::Key {
                from: NodeId::process(1),
                to: NodeId::resource(1),
            }
        );
        let id: EdgeRef = "e-ab".parse().expect("parse id");
        assert_eq!(id.as_id(), Some(&eid("e-ab")));
    }

    #[test]
    fn edge_ref_rejects_half_key() {
        assert!("P1->".parse::<EdgeRef>().is_err());
    }

    #[test]
    fn edge_ref_serializes_as_string() {
        let key = EdgeRef::Key {
            from: NodeId::process(3),
            to: NodeId::resource(4),
        };
        let json = serde_json::to_string(&key).expect("serialize");
        assert_eq!(json, "\"P3->R4\"");
        let back: EdgeRef = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, key);
    }
}
