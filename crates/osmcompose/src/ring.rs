//! Stitching unordered chain fragments into closed rings.
//!
//! The chains of one role set (e.g. all "outer" members of a relation)
//! may arrive in any order and either direction. They close into rings iff
//! every shared endpoint has an even number of incident chain-ends; the
//! assembler validates that first, then walks the endpoint graph,
//! consuming chain-ends as it goes.

use osmstore::{FeatureStore, IdMap, Way};
use smallvec::SmallVec;

use crate::error::{ComposeError, Incomplete};
use crate::geom::{Coord, Ring};
use crate::resolve::resolve_way;

/// A resolved chain held in the traversal arena. Chains are referenced by
/// arena index from the endpoint lists; the index stays stable while
/// chain-ends are consumed.
struct Chain {
    way_id: i64,
    first: i64,
    last: i64,
    coords: Vec<Coord>,
}

/// Incident chain-ends per endpoint node. Two entries per chain (one per
/// end); a chain that starts and ends on the same node contributes both.
type EndpointIndex = IdMap<SmallVec<[usize; 4]>>;

/// Join `ways` into closed coordinate rings.
///
/// Fails as [`Incomplete`] — for the whole set, emitting no partial rings —
/// when any chain cannot be resolved, when an endpoint has an odd number
/// of incident chain-ends, or when a traversal runs out of chains before
/// returning to its start. An empty input yields no rings.
///
/// Chain selection at a junction follows input order, so the traversal is
/// deterministic for a given member list.
pub fn assemble_rings(
    store: &dyn FeatureStore,
    relation_id: i64,
    ways: &[Way],
) -> Result<Vec<Ring>, ComposeError> {
    let mut arena = Vec::with_capacity(ways.len());
    for way in ways {
        let coords = resolve_way(store, way)?;
        let (first, last) = match (way.nodes.first(), way.nodes.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Err(Incomplete::DegenerateWay { way: way.id }.into()),
        };
        arena.push(Chain {
            way_id: way.id,
            first,
            last,
            coords,
        });
    }

    let mut endpoints = EndpointIndex::default();
    for (idx, chain) in arena.iter().enumerate() {
        endpoints.entry(chain.first).or_default().push(idx);
        endpoints.entry(chain.last).or_default().push(idx);
    }

    // An odd incidence count anywhere means the set cannot close.
    for (&node, incident) in &endpoints {
        if incident.len() % 2 != 0 {
            return Err(Incomplete::OddEndpoint {
                relation: relation_id,
                node,
            }
            .into());
        }
    }

    let mut used = vec![false; arena.len()];
    let mut rings = Vec::new();

    for seed in 0..arena.len() {
        if used[seed] {
            continue;
        }
        let (start, mut cursor) = (arena[seed].first, arena[seed].last);
        let mut coords = arena[seed].coords.clone();
        consume(&mut endpoints, &mut used, seed, start, cursor);

        while cursor != start {
            let next = endpoints
                .get(&cursor)
                .and_then(|incident| incident.iter().copied().find(|&idx| !used[idx]));
            let Some(next) = next else {
                return Err(Incomplete::OpenRing {
                    relation: relation_id,
                    way: arena[seed].way_id,
                }
                .into());
            };

            let (first, last) = (arena[next].first, arena[next].last);
            consume(&mut endpoints, &mut used, next, first, last);

            // Orient the chain to continue from the cursor, skipping the
            // duplicate junction coordinate.
            if first == cursor {
                coords.extend_from_slice(&arena[next].coords[1..]);
                cursor = last;
            } else {
                coords.extend(arena[next].coords.iter().rev().skip(1).copied());
                cursor = first;
            }
        }

        rings.push(Ring {
            way_id: arena[seed].way_id,
            coords,
        });
    }

    Ok(rings)
}

/// Mark a chain used and detach both of its ends from the index.
fn consume(endpoints: &mut EndpointIndex, used: &mut [bool], idx: usize, first: i64, last: i64) {
    used[idx] = true;
    detach(endpoints, first, idx);
    detach(endpoints, last, idx);
}

fn detach(endpoints: &mut EndpointIndex, node: i64, idx: usize) {
    if let Some(incident) = endpoints.get_mut(&node) {
        if let Some(pos) = incident.iter().position(|&i| i == idx) {
            incident.remove(pos);
        }
        if incident.is_empty() {
            endpoints.remove(&node);
        }
    }
}
