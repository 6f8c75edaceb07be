//! Expansion of a way's node references into coordinates.

use osmstore::{FeatureStore, Way};

use crate::error::{ComposeError, Incomplete};
use crate::geom::Coord;

/// Resolve every node reference of `way`, in order, into a coordinate
/// sequence. Any reference the store cannot answer fails the whole way as
/// [`Incomplete::MissingNode`]; a result with fewer than two coordinates
/// is [`Incomplete::DegenerateWay`]. Partial output is never returned.
pub fn resolve_way(store: &dyn FeatureStore, way: &Way) -> Result<Vec<Coord>, ComposeError> {
    let mut coords = Vec::with_capacity(way.nodes.len());
    for &node_id in &way.nodes {
        match store.node(node_id)? {
            Some(node) => coords.push([node.lon, node.lat]),
            None => {
                return Err(Incomplete::MissingNode {
                    way: way.id,
                    node: node_id,
                }
                .into())
            }
        }
    }
    if coords.len() < 2 {
        return Err(Incomplete::DegenerateWay { way: way.id }.into());
    }
    Ok(coords)
}
