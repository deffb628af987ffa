//! Link edge model
//!
//! An edge between two exported issues, identified by their assigned
//! sequential identifiers. Edges are undirected on the wire: the identifier
//! pair is canonicalized numerically (smaller first) so that the same
//! relationship discovered from either end collapses to one edge.

use serde::{Deserialize, Serialize};

/// Which link descriptor an edge was discovered from.
///
/// The import format has no notion of direction, so this is retained in
/// memory only; it is not serialized into bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkDirection {
    #[default]
    Outward,
    Inward,
}

/// An undirected, typed edge between two assigned identifiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkEdge {
    /// Link-type label (e.g. "Blocks", "Relates")
    pub name: String,

    /// Smaller identifier of the pair, stringified for the import format
    pub source_id: String,

    /// Larger identifier of the pair, stringified for the import format
    pub destination_id: String,

    /// Direction of the descriptor that first produced this edge
    #[serde(skip)]
    pub discovered_from: LinkDirection,
}

impl LinkEdge {
    /// Build a canonical edge from two assigned identifiers.
    ///
    /// The pair is ordered numerically regardless of argument order, so
    /// `canonical(t, 5, 3, d)` and `canonical(t, 3, 5, d)` are equal on the
    /// wire.
    pub fn canonical(name: impl Into<String>, a: u64, b: u64, discovered_from: LinkDirection) -> Self {
        let (source, destination) = if a <= b { (a, b) } else { (b, a) };
        Self {
            name: name.into(),
            source_id: source.to_string(),
            destination_id: destination.to_string(),
            discovered_from,
        }
    }

    /// True if this edge connects the same pair with the same type label.
    pub fn same_relationship(&self, other: &Self) -> bool {
        self.name == other.name
            && self.source_id == other.source_id
            && self.destination_id == other.destination_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_orders_pair() {
        let forward = LinkEdge::canonical("Blocks", 3, 7, LinkDirection::Outward);
        let reverse = LinkEdge::canonical("Blocks", 7, 3, LinkDirection::Inward);

        assert_eq!(forward.source_id, "3");
        assert_eq!(forward.destination_id, "7");
        assert!(forward.same_relationship(&reverse));
    }

    #[test]
    fn test_canonical_orders_numerically_not_lexically() {
        // 10 < 9 lexically but not numerically
        let edge = LinkEdge::canonical("Relates", 10, 9, LinkDirection::Outward);
        assert_eq!(edge.source_id, "9");
        assert_eq!(edge.destination_id, "10");
    }

    #[test]
    fn test_type_label_distinguishes_edges() {
        let blocks = LinkEdge::canonical("Blocks", 1, 2, LinkDirection::Outward);
        let relates = LinkEdge::canonical("Relates", 1, 2, LinkDirection::Outward);
        assert!(!blocks.same_relationship(&relates));
    }

    #[test]
    fn test_direction_not_serialized() {
        let edge = LinkEdge::canonical("Blocks", 1, 2, LinkDirection::Inward);
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["sourceId"], "1");
        assert_eq!(json["destinationId"], "2");
        assert!(json.get("discoveredFrom").is_none());
        assert!(json.get("discovered_from").is_none());
    }
}
