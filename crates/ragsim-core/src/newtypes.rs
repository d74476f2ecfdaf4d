/// Validated newtype wrappers for resource allocation graph identifiers.
///
/// Each newtype enforces a regex-based shape constraint at construction time
/// via [`TryFrom<&str>`]. Once constructed, the inner value is immutable.
/// Serde `Deserialize` impls re-run validation so invalid data cannot enter
/// the type system from untrusted JSON.
///
/// Neither [`NodeId`] nor [`EdgeId`] may contain `>`, and node names may not
/// contain `-` either, so the fallback edge key `"from->to"` always splits
/// back into exactly one `(from, to)` pair.
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::enums::NodeKind;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced when constructing a validated newtype from an invalid string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NewtypeError {
    /// The string did not match the expected format.
    #[error("invalid {type_name}: expected {expected}, got {got:?}")]
    InvalidFormat {
        /// Name of the type that rejected the input.
        type_name: &'static str,
        /// A human-readable description of the expected format.
        expected: &'static str,
        /// The input that was rejected.
        got: String,
    },
}

// ---------------------------------------------------------------------------
// Regex statics
// ---------------------------------------------------------------------------

/// Compiles a pattern that is a compile-time literal and therefore valid.
fn compile(pattern: &'static str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|_| unreachable!("static pattern {pattern} is valid"))
}

/// Node names: ASCII alphanumerics plus `_`, `.` and `:`.
static NODE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z0-9_.:]+$"));

/// Edge identifiers: node-name characters plus `-`.
static EDGE_ID_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z0-9_.:-]+$"));

/// Name prefix that marks a process under the string naming convention.
pub const PROCESS_PREFIX: char = 'P';

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Identifier of a process or resource node.
///
/// Carries an explicit [`NodeKind`] tag. The `P…` naming convention is
/// applied exactly once, when a bare name is parsed via [`TryFrom<&str>`];
/// every later classification reads the tag.
///
/// Identity is the name alone: equality, hashing and ordering ignore the
/// tag, so one token always denotes one graph node. Ordering is the string
/// ordering used for canonical cycle rotation.
#[derive(Debug, Clone)]
pub struct NodeId {
    name: String,
    kind: NodeKind,
}

impl NodeId {
    /// Builds a node identifier with an explicit kind.
    ///
    /// # Errors
    ///
    /// Returns [`NewtypeError::InvalidFormat`] if `name` contains characters
    /// outside `[A-Za-z0-9_.:]` or is empty.
    pub fn new(kind: NodeKind, name: &str) -> Result<Self, NewtypeError> {
        if NODE_NAME_RE.is_match(name) {
            Ok(Self {
                name: name.to_owned(),
                kind,
            })
        } else {
            Err(NewtypeError::InvalidFormat {
                type_name: "NodeId",
                expected: "non-empty [A-Za-z0-9_.:]+",
                got: name.to_owned(),
            })
        }
    }

    /// The `n`th process, named `P<n>`.
    pub fn process(n: usize) -> Self {
        Self {
            name: format!("{PROCESS_PREFIX}{n}"),
            kind: NodeKind::Process,
        }
    }

    /// The `n`th resource, named `R<n>`.
    pub fn resource(n: usize) -> Self {
        Self {
            name: format!("R{n}"),
            kind: NodeKind::Resource,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_process(&self) -> bool {
        self.kind == NodeKind::Process
    }
}

impl PartialEq for NodeId {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for NodeId {}

impl Hash for NodeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl TryFrom<&str> for NodeId {
    type Error = NewtypeError;

    /// Parses a bare name, classifying it by the process prefix convention.
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let kind = if s.starts_with(PROCESS_PREFIX) {
            NodeKind::Process
        } else {
            NodeKind::Resource
        };
        Self::new(kind, s)
    }
}

impl Deref for NodeId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::try_from(s.as_str()).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// EdgeId
// ---------------------------------------------------------------------------

/// Identifier of a single edge instance, e.g. `e12`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(String);

impl EdgeId {
    /// The identifier the mutation surface assigns to its `seq`th edge.
    pub fn sequential(seq: u64) -> Self {
        Self(format!("e{seq}"))
    }

    /// Returns `n` when this id has the sequential form `e<n>`.
    pub fn sequence_number(&self) -> Option<u64> {
        self.0.strip_prefix('e').and_then(|n| n.parse().ok())
    }
}

impl TryFrom<&str> for EdgeId {
    type Error = NewtypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if EDGE_ID_RE.is_match(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(NewtypeError::InvalidFormat {
                type_name: "EdgeId",
                expected: "non-empty [A-Za-z0-9_.:-]+",
                got: s.to_owned(),
            })
        }
    }
}

impl Deref for EdgeId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for EdgeId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EdgeId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::try_from(s.as_str()).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
