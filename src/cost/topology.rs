//! Grid topology: plain mesh or torus.

/// Dimensions and wrap-around flag of the placement grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Topology {
    width: usize,
    height: usize,
    wrap_around: bool,
}

impl Topology {
    pub fn new(width: usize, height: usize, wrap_around: bool) -> Self {
        Self {
            width,
            height,
            wrap_around,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn wraps(&self) -> bool {
        self.wrap_around
    }

    /// Per-axis distances `(dx, dy)` between two cells.
    #[inline]
    pub fn axis_distances(&self, a: (usize, usize), b: (usize, usize)) -> (usize, usize) {
        (
            axis_distance(a.0, b.0, self.width, self.wrap_around),
            axis_distance(a.1, b.1, self.height, self.wrap_around),
        )
    }

    #[inline]
    pub fn chebyshev(&self, a: (usize, usize), b: (usize, usize)) -> usize {
        let (dx, dy) = self.axis_distances(a, b);
        dx.max(dy)
    }

    #[inline]
    pub fn manhattan(&self, a: (usize, usize), b: (usize, usize)) -> usize {
        let (dx, dy) = self.axis_distances(a, b);
        dx + dy
    }

    /// Hop count between two cells of a hexagonal mesh, wrapping when the
    /// grid is a torus.
    pub fn hexagonal(&self, a: (usize, usize), b: (usize, usize)) -> usize {
        let dx = b.0 as i64 - a.0 as i64;
        let dy = b.1 as i64 - a.1 as i64;
        if !self.wrap_around {
            return hexagonal_distance(dx, dy);
        }
        let w = self.width as i64;
        let h = self.height as i64;
        let mut best = usize::MAX;
        for ox in [dx, dx - w, dx + w] {
            for oy in [dy, dy - h, dy + h] {
                best = best.min(hexagonal_distance(ox, oy));
            }
        }
        best
    }
}

/// Distance between two coordinates on an axis of length `size`.
///
/// With wrap-around this is `min(|a - b|, size - |a - b|)`.
#[inline]
pub fn axis_distance(a: usize, b: usize, size: usize, wrap_around: bool) -> usize {
    let direct = a.abs_diff(b);
    if wrap_around {
        direct.min(size - direct)
    } else {
        direct
    }
}

/// Hop count of the vector `(dx, dy)` on a hexagonal mesh.
///
/// Moving along `(+1, +1)` is a single hop, so vectors whose components
/// share a sign cost `max(|dx|, |dy|)` while the others cost `|dx| + |dy|`.
#[inline]
pub fn hexagonal_distance(dx: i64, dy: i64) -> usize {
    let (ax, ay) = (dx.unsigned_abs() as usize, dy.unsigned_abs() as usize);
    if (dx >= 0) == (dy >= 0) {
        ax.max(ay)
    } else {
        ax + ay
    }
}

/// Length of the shortest interval covering every coordinate in `coords`.
///
/// Without wrap-around this is `max - min`. On a ring of length `size` it
/// is `size` minus the largest gap between neighbouring coordinates, the
/// gap across the seam included. `coords` is reordered.
pub fn axis_extent(coords: &mut [usize], size: usize, wrap_around: bool) -> usize {
    if coords.len() < 2 {
        return 0;
    }
    if !wrap_around {
        let (mut lo, mut hi) = (coords[0], coords[0]);
        for &c in coords.iter() {
            lo = lo.min(c);
            hi = hi.max(c);
        }
        return hi - lo;
    }

    coords.sort_unstable();
    let first = coords[0];
    let last = coords[coords.len() - 1];
    let mut largest_gap = first + size - last;
    for pair in coords.windows(2) {
        largest_gap = largest_gap.max(pair[1] - pair[0]);
    }
    size - largest_gap
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_axis_distance_wraps() {
        assert_eq!(axis_distance(0, 9, 10, true), 1);
        assert_eq!(axis_distance(9, 0, 10, true), 1);
        assert_eq!(axis_distance(0, 9, 10, false), 9);
        assert_eq!(axis_distance(2, 7, 10, true), 5);
    }

    #[test]
    fn test_axis_extent_wraps() {
        assert_eq!(axis_extent(&mut [0, 9], 10, true), 1);
        assert_eq!(axis_extent(&mut [0, 9], 10, false), 9);
        assert_eq!(axis_extent(&mut [4, 4, 4], 10, true), 0);
        assert_eq!(axis_extent(&mut [0, 3, 6], 9, true), 6);
        assert_eq!(axis_extent(&mut [7], 10, true), 0);
    }

    /// Table of hexagonal distances on a 4x5 grid.
    fn hex_table(wrap: bool) -> Vec<((usize, usize), (usize, usize), usize)> {
        let mut table = vec![
            // Same cell
            ((0, 0), (0, 0), 0),
            ((1, 2), (1, 2), 0),
            // Adjacent
            ((1, 2), (1, 1), 1),
            ((1, 2), (1, 3), 1),
            ((1, 2), (2, 2), 1),
            ((1, 2), (0, 2), 1),
            ((1, 2), (2, 3), 1),
            ((1, 2), (0, 1), 1),
            // "Wrong" diagonal
            ((1, 2), (0, 3), 2),
            ((1, 2), (2, 1), 2),
        ];
        if wrap {
            table.extend([
                ((0, 0), (3, 0), 1),
                ((3, 0), (0, 0), 1),
                ((0, 0), (0, 4), 1),
                ((0, 4), (0, 0), 1),
                ((0, 0), (3, 4), 1),
                ((3, 4), (0, 0), 1),
            ]);
        } else {
            table.extend([
                ((0, 0), (3, 0), 3),
                ((3, 0), (0, 0), 3),
                ((0, 0), (0, 4), 4),
                ((0, 4), (0, 0), 4),
                ((0, 0), (3, 4), 4),
                ((3, 4), (0, 0), 4),
            ]);
        }
        table
    }

    #[test]
    fn test_hexagonal_torus() {
        let t = Topology::new(4, 5, true);
        for (a, b, expected) in hex_table(true) {
            assert_eq!(t.hexagonal(a, b), expected, "{a:?} -> {b:?}");
        }
    }

    #[test]
    fn test_hexagonal_mesh() {
        let t = Topology::new(4, 5, false);
        for (a, b, expected) in hex_table(false) {
            assert_eq!(t.hexagonal(a, b), expected, "{a:?} -> {b:?}");
        }
    }

    #[test]
    fn test_chebyshev_and_manhattan() {
        let t = Topology::new(10, 10, true);
        assert_eq!(t.chebyshev((0, 0), (9, 8)), 2);
        assert_eq!(t.manhattan((0, 0), (9, 8)), 3);
        let m = Topology::new(10, 10, false);
        assert_eq!(m.chebyshev((0, 0), (9, 8)), 9);
        assert_eq!(m.manhattan((0, 0), (9, 8)), 17);
    }

    proptest! {
        #[test]
        fn prop_axis_distance_symmetric_and_bounded(
            size in 1usize..64,
            a in 0usize..64,
            b in 0usize..64,
        ) {
            let (a, b) = (a % size, b % size);
            let d = axis_distance(a, b, size, true);
            prop_assert_eq!(d, axis_distance(b, a, size, true));
            prop_assert!(d <= size / 2);
            prop_assert!(d <= axis_distance(a, b, size, false));
        }

        #[test]
        fn prop_wrapped_extent_never_exceeds_plain(
            size in 1usize..32,
            raw in proptest::collection::vec(0usize..32, 0..8),
        ) {
            let mut coords: Vec<usize> = raw.iter().map(|c| c % size).collect();
            let plain = axis_extent(&mut coords.clone(), size, false);
            let wrapped = axis_extent(&mut coords, size, true);
            prop_assert!(wrapped <= plain);
            prop_assert!(wrapped < size.max(1));
        }

        #[test]
        fn prop_hexagonal_symmetric(
            ax in 0usize..6, ay in 0usize..7, bx in 0usize..6, by in 0usize..7,
            wrap in any::<bool>(),
        ) {
            let t = Topology::new(6, 7, wrap);
            prop_assert_eq!(t.hexagonal((ax, ay), (bx, by)), t.hexagonal((bx, by), (ax, ay)));
        }
    }
}
