//! Planar geometry over lon/lat coordinate sequences.
//!
//! Coordinates stay in their input angular degrees; the containment and
//! winding tests only compare positions, so no projection is needed.

/// A lon/lat pair in degrees.
pub type Coord = [f64; 2];

/// A closed coordinate ring. `coords` starts and ends on the same
/// coordinate; `way_id` is the chain that seeded the ring, kept for
/// provenance in diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub way_id: i64,
    pub coords: Vec<Coord>,
}

impl Ring {
    /// Winding sense from the shoelace signed area.
    pub fn is_ccw(&self) -> bool {
        signed_area(&self.coords) > 0.0
    }

    /// Strict interior containment of `other`: every vertex of `other`
    /// inside this ring.
    pub fn contains(&self, other: &Ring) -> bool {
        ring_contains(&self.coords, &other.coords)
    }
}

/// A top-level polygon: exterior ring plus its direct holes. Holes wind
/// opposite the exterior after nesting.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

/// Shoelace signed area; positive for counter-clockwise winding.
pub fn signed_area(coords: &[Coord]) -> f64 {
    let mut acc = 0.0;
    for pair in coords.windows(2) {
        acc += pair[0][0] * pair[1][1] - pair[1][0] * pair[0][1];
    }
    acc * 0.5
}

/// Even-odd ray cast: is `pt` inside the ring outlined by `ring`?
/// Points exactly on the boundary are not handled specially.
pub fn point_in_ring(pt: Coord, ring: &[Coord]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > pt[1]) != (yj > pt[1]) {
            let x_cross = (xj - xi) * (pt[1] - yi) / (yj - yi) + xi;
            if pt[0] < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// True when every vertex of `inner` lies inside `outer`.
pub fn ring_contains(outer: &[Coord], inner: &[Coord]) -> bool {
    !inner.is_empty() && inner.iter().all(|&c| point_in_ring(c, outer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(origin: f64, size: f64) -> Vec<Coord> {
        // Counter-clockwise.
        vec![
            [origin, origin],
            [origin + size, origin],
            [origin + size, origin + size],
            [origin, origin + size],
            [origin, origin],
        ]
    }

    #[test]
    fn test_signed_area_winding() {
        let ccw = square(0.0, 2.0);
        assert!(signed_area(&ccw) > 0.0);
        let cw: Vec<Coord> = ccw.iter().rev().copied().collect();
        assert!(signed_area(&cw) < 0.0);
        assert!((signed_area(&ccw).abs() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_in_ring() {
        let ring = square(0.0, 10.0);
        assert!(point_in_ring([5.0, 5.0], &ring));
        assert!(!point_in_ring([15.0, 5.0], &ring));
        assert!(!point_in_ring([-1.0, -1.0], &ring));
    }

    #[test]
    fn test_ring_containment() {
        let outer = square(0.0, 10.0);
        let inner = square(4.0, 2.0);
        assert!(ring_contains(&outer, &inner));
        assert!(!ring_contains(&inner, &outer));
        let beside = square(20.0, 2.0);
        assert!(!ring_contains(&outer, &beside));
    }
}
