//! Derived features handed to the downstream sink.
//!
//! The sink itself (spatial schema, column mapping) lives outside this
//! crate; these types and streams are the boundary. Each feature carries
//! the original identifier and tag mapping for column population.

use log::warn;

use osmstore::{FeatureStore, StoreError, Tags};

use crate::error::recoverable;
use crate::geom::{Coord, Polygon};
use crate::resolve::resolve_way;

/// One or more exterior/holes pairs composed from a relation, or a single
/// pair composed from a closed area way.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipolygonFeature {
    pub id: i64,
    pub tags: Tags,
    pub polygons: Vec<Polygon>,
}

/// A way that stayed a line: its resolved coordinates and tags.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFeature {
    pub id: i64,
    pub tags: Tags,
    pub coords: Vec<Coord>,
}

/// A tagged point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    pub id: i64,
    pub tags: Tags,
    pub coord: Coord,
}

/// Stream every remaining tagged way as a line feature. Untagged ways are
/// skipped silently; unresolvable ways are skipped with a warning and
/// counted in the returned tally.
pub fn each_line_feature(
    store: &dyn FeatureStore,
    emit: &mut dyn FnMut(LineFeature),
) -> Result<u64, StoreError> {
    let mut incomplete = 0u64;
    let mut failure: Option<StoreError> = None;
    store.each_way(&mut |way| {
        if failure.is_some() || way.tags.is_empty() {
            return;
        }
        match recoverable(resolve_way(store, &way)) {
            Ok(Ok(coords)) => emit(LineFeature {
                id: way.id,
                tags: way.tags,
                coords,
            }),
            Ok(Err(reason)) => {
                warn!("skipping line {}: {reason}", way.id);
                incomplete += 1;
            }
            Err(err) => failure = Some(err),
        }
    })?;
    if let Some(err) = failure {
        return Err(err);
    }
    Ok(incomplete)
}

/// Stream every tagged node as a point feature.
pub fn each_point_feature(
    store: &dyn FeatureStore,
    emit: &mut dyn FnMut(PointFeature),
) -> Result<(), StoreError> {
    store.each_node(&mut |node| {
        if node.tags.is_empty() {
            return;
        }
        emit(PointFeature {
            id: node.id,
            tags: node.tags,
            coord: [node.lon, node.lat],
        });
    })
}
