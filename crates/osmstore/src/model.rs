//! Record types shared by every store backend.
//!
//! Coordinates are signed double-precision degrees (lon/lat), exactly as
//! the producer decoded them; no reprojection happens here. Identifiers
//! are unique per kind but the node/way/relation id spaces may overlap.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Tag mapping attached to every record. Keys are unique, order is not
/// meaningful.
pub type Tags = HashMap<String, String>;

/// The three record kinds a store can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    Node,
    Way,
    Relation,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeatureKind::Node => "node",
            FeatureKind::Way => "way",
            FeatureKind::Relation => "relation",
        };
        f.write_str(s)
    }
}

/// A single point with its position and tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: i64,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub tags: Tags,
    /// Revision number from the source format, if it carried one.
    #[serde(default)]
    pub version: Option<i32>,
}

impl Node {
    pub fn new(id: i64, lon: f64, lat: f64) -> Self {
        Self {
            id,
            lon,
            lat,
            tags: Tags::new(),
            version: None,
        }
    }
}

/// An ordered chain of node references forming a polyline. The nodes are
/// referenced, not owned; a reference to a node the store never saw is a
/// missing-data condition, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Way {
    pub id: i64,
    pub nodes: Vec<i64>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub version: Option<i32>,
}

impl Way {
    pub fn new(id: i64, nodes: Vec<i64>) -> Self {
        Self {
            id,
            nodes,
            tags: Tags::new(),
            version: None,
        }
    }

    /// A way is closed iff its first and last node refs are equal and it
    /// has more than two distinct refs. `[a, b, a]` is a degenerate spike,
    /// not a ring.
    pub fn is_closed(&self) -> bool {
        self.nodes.len() >= 4 && self.nodes.first() == self.nodes.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    Node,
    Way,
    Relation,
}

/// One member of a relation: what it points at and the role it plays
/// there (e.g. "outer"/"inner" for multipolygon boundaries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub kind: MemberKind,
    pub id: i64,
    pub role: String,
}

impl Member {
    pub fn way(id: i64, role: &str) -> Self {
        Self {
            kind: MemberKind::Way,
            id,
            role: role.to_owned(),
        }
    }
}

/// A grouped relationship between other records, with ordered members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: i64,
    pub members: Vec<Member>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub version: Option<i32>,
}

impl Relation {
    pub fn new(id: i64, members: Vec<Member>) -> Self {
        Self {
            id,
            members,
            tags: Tags::new(),
            version: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_way_detection() {
        assert!(Way::new(1, vec![10, 11, 12, 10]).is_closed());
        // Open chain.
        assert!(!Way::new(2, vec![10, 11, 12]).is_closed());
        // First == last but only two distinct points.
        assert!(!Way::new(3, vec![10, 11, 10]).is_closed());
        assert!(!Way::new(4, vec![]).is_closed());
    }

    #[test]
    fn test_record_json_roundtrip() {
        let mut way = Way::new(42, vec![1, 2, 3, 1]);
        way.tags.insert("landuse".into(), "forest".into());
        way.version = Some(7);
        let bytes = serde_json::to_vec(&way).unwrap();
        let back: Way = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(way, back);
    }
}
