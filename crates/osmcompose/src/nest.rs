//! Containment resolution: grouping a flat set of rings into top-level
//! polygons with holes.
//!
//! Each pass counts, for every still-contested ring, how many *other*
//! contested rings contain it. Zero containers makes it a top-level
//! exterior, exactly one attaches it as a hole of that container, two or
//! more defer it to the next pass. Because resolved rings leave the
//! working set, an island inside a hole surfaces as its own top-level
//! polygon on a later pass instead of being mistaken for a second hole.
//! The deferred set must strictly shrink; if it does not, containment is
//! cyclic or ambiguous and the whole set fails rather than looping.

use smallvec::SmallVec;

use crate::error::{ComposeError, Incomplete};
use crate::geom::{Polygon, Ring};

/// Partition `rings` into polygons with holes, correcting hole winding to
/// oppose its exterior.
pub fn nest_rings(relation_id: i64, rings: Vec<Ring>) -> Result<Vec<Polygon>, ComposeError> {
    let total = rings.len();
    let mut pending: Vec<usize> = (0..total).collect();
    let mut parent: Vec<Option<usize>> = vec![None; total];
    let mut roots: Vec<usize> = Vec::new();

    while !pending.is_empty() {
        let mut deferred = Vec::new();
        let mut placed: Vec<(usize, Option<usize>)> = Vec::new();

        for &i in &pending {
            let containers: SmallVec<[usize; 2]> = pending
                .iter()
                .copied()
                .filter(|&j| j != i && rings[j].contains(&rings[i]))
                .collect();
            match containers.len() {
                0 => placed.push((i, None)),
                1 => placed.push((i, Some(containers[0]))),
                _ => deferred.push(i),
            }
        }

        if deferred.len() == pending.len() {
            return Err(Incomplete::ContainmentConflict {
                relation: relation_id,
            }
            .into());
        }

        for (i, container) in placed {
            match container {
                None => roots.push(i),
                Some(c) => parent[i] = Some(c),
            }
        }
        pending = deferred;
    }

    // A hole hanging off another hole means the containment test
    // contradicted itself (overlapping or duplicate rings).
    for i in 0..total {
        if let Some(c) = parent[i] {
            if parent[c].is_some() {
                return Err(Incomplete::ContainmentConflict {
                    relation: relation_id,
                }
                .into());
            }
        }
    }

    let mut holes_of: Vec<Vec<usize>> = vec![Vec::new(); total];
    for i in 0..total {
        if let Some(c) = parent[i] {
            holes_of[c].push(i);
        }
    }

    let mut slots: Vec<Option<Ring>> = rings.into_iter().map(Some).collect();
    let mut polygons = Vec::with_capacity(roots.len());
    for &r in &roots {
        let Some(exterior) = slots[r].take() else {
            continue;
        };
        let exterior_ccw = exterior.is_ccw();
        let mut holes = Vec::with_capacity(holes_of[r].len());
        for &h in &holes_of[r] {
            if let Some(mut hole) = slots[h].take() {
                // The renderer's fill rule needs holes wound opposite
                // their exterior.
                if hole.is_ccw() == exterior_ccw {
                    hole.coords.reverse();
                }
                holes.push(hole);
            }
        }
        polygons.push(Polygon { exterior, holes });
    }

    Ok(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Coord;

    fn ring(way_id: i64, origin: f64, size: f64) -> Ring {
        // Counter-clockwise square.
        let coords: Vec<Coord> = vec![
            [origin, origin],
            [origin + size, origin],
            [origin + size, origin + size],
            [origin, origin + size],
            [origin, origin],
        ];
        Ring { way_id, coords }
    }

    #[test]
    fn test_single_ring_single_polygon() {
        let polygons = nest_rings(1, vec![ring(10, 0.0, 10.0)]).unwrap();
        assert_eq!(polygons.len(), 1);
        assert!(polygons[0].holes.is_empty());
        assert_eq!(polygons[0].exterior.way_id, 10);
    }

    #[test]
    fn test_hole_attached_and_rewound() {
        let outer = ring(10, 0.0, 10.0);
        let inner = ring(11, 3.0, 2.0);
        let polygons = nest_rings(1, vec![inner, outer]).unwrap();
        assert_eq!(polygons.len(), 1);
        let poly = &polygons[0];
        assert_eq!(poly.exterior.way_id, 10);
        assert_eq!(poly.holes.len(), 1);
        // Both rings were built counter-clockwise; the hole must now wind
        // the other way while the exterior is untouched.
        assert!(poly.exterior.is_ccw());
        assert!(!poly.holes[0].is_ccw());
    }

    #[test]
    fn test_two_disjoint_exteriors() {
        let polygons = nest_rings(1, vec![ring(10, 0.0, 5.0), ring(11, 20.0, 5.0)]).unwrap();
        assert_eq!(polygons.len(), 2);
        assert!(polygons.iter().all(|p| p.holes.is_empty()));
    }

    #[test]
    fn test_island_in_hole_resolves_in_second_pass() {
        // Lake in a forest, island in the lake: the island is contained by
        // two rings on the first pass, then surfaces as its own top-level
        // polygon once the outer pair has been resolved.
        let forest = ring(10, 0.0, 100.0);
        let lake = ring(11, 20.0, 40.0);
        let island = ring(12, 30.0, 10.0);
        let polygons = nest_rings(1, vec![island, lake, forest]).unwrap();
        assert_eq!(polygons.len(), 2);

        let forest_poly = polygons
            .iter()
            .find(|p| p.exterior.way_id == 10)
            .expect("forest polygon");
        assert_eq!(forest_poly.holes.len(), 1);
        assert_eq!(forest_poly.holes[0].way_id, 11);

        let island_poly = polygons
            .iter()
            .find(|p| p.exterior.way_id == 12)
            .expect("island polygon");
        assert!(island_poly.holes.is_empty());
    }

    #[test]
    fn test_two_holes_one_exterior() {
        let outer = ring(10, 0.0, 10.0);
        let a = ring(11, 1.0, 2.0);
        let b = ring(12, 6.0, 2.0);
        let polygons = nest_rings(1, vec![a, outer, b]).unwrap();
        assert_eq!(polygons.len(), 1);
        let mut hole_ids: Vec<i64> = polygons[0].holes.iter().map(|h| h.way_id).collect();
        hole_ids.sort_unstable();
        assert_eq!(hole_ids, vec![11, 12]);
    }

    #[test]
    fn test_empty_input() {
        assert!(nest_rings(1, Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_five_level_nesting_terminates() {
        // forest ⊃ lake ⊃ island ⊃ pond ⊃ islet. Odd depths are holes of
        // the ring one level up; even depths are top-level exteriors.
        let rings: Vec<Ring> = (0..5)
            .map(|lvl| ring(10 + lvl as i64, lvl as f64 * 10.0, 100.0 - lvl as f64 * 20.0))
            .collect();
        let polygons = nest_rings(1, rings).unwrap();
        assert_eq!(polygons.len(), 3);
        let mut exteriors: Vec<i64> = polygons.iter().map(|p| p.exterior.way_id).collect();
        exteriors.sort_unstable();
        assert_eq!(exteriors, vec![10, 12, 14]);
        for poly in &polygons {
            match poly.exterior.way_id {
                10 => assert_eq!(poly.holes[0].way_id, 11),
                12 => assert_eq!(poly.holes[0].way_id, 13),
                14 => assert!(poly.holes.is_empty()),
                _ => unreachable!(),
            }
        }
    }
}
