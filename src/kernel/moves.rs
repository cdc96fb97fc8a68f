//! Candidate generation: which vertex moves, and where to.

use crate::cost::Topology;
use crate::state::{AnnealState, Grid, Neighbourhood, Vertex, VertexId};
use rand::Rng;

/// Sampling window along one axis.
#[derive(Debug, Clone, Copy)]
enum AxisWindow {
    /// Every coordinate of the axis.
    Whole { size: usize },
    /// `lo..=hi`, already clamped to the axis.
    Clamped { lo: usize, hi: usize },
    /// `origin - radius ..= origin + radius`, taken modulo `size`.
    Wrapped {
        origin: usize,
        radius: usize,
        size: usize,
    },
}

impl AxisWindow {
    fn new(origin: usize, radius: usize, size: usize, wrap_around: bool) -> Self {
        if wrap_around {
            if radius.saturating_mul(2).saturating_add(1) >= size {
                AxisWindow::Whole { size }
            } else {
                AxisWindow::Wrapped {
                    origin,
                    radius,
                    size,
                }
            }
        } else {
            AxisWindow::Clamped {
                lo: origin.saturating_sub(radius),
                hi: origin.saturating_add(radius).min(size - 1),
            }
        }
    }

    /// Number of distinct coordinates in the window.
    fn len(self) -> usize {
        match self {
            AxisWindow::Whole { size } => size,
            AxisWindow::Clamped { lo, hi } => hi - lo + 1,
            AxisWindow::Wrapped { radius, .. } => 2 * radius + 1,
        }
    }

    #[inline]
    fn sample<R: Rng>(self, rng: &mut R) -> usize {
        match self {
            AxisWindow::Whole { size } => rng.random_range(0..size),
            AxisWindow::Clamped { lo, hi } => rng.random_range(lo..=hi),
            AxisWindow::Wrapped {
                origin,
                radius,
                size,
            } => (origin + size - radius + rng.random_range(0..=2 * radius)) % size,
        }
    }
}

/// Picks a cell other than `origin` within `distance_limit` of it.
///
/// Returns `None` when the window holds no cell besides the origin, which
/// happens for a zero limit or a 1x1 grid.
pub(crate) fn random_nearby_cell<R: Rng>(
    rng: &mut R,
    topology: &Topology,
    neighbourhood: Neighbourhood,
    origin: (usize, usize),
    distance_limit: usize,
) -> Option<(usize, usize)> {
    let wx = AxisWindow::new(origin.0, distance_limit, topology.width(), topology.wraps());
    let wy = AxisWindow::new(origin.1, distance_limit, topology.height(), topology.wraps());
    if wx.len() * wy.len() <= 1 {
        return None;
    }

    loop {
        let cell = (wx.sample(rng), wy.sample(rng));
        if cell == origin {
            continue;
        }
        if neighbourhood == Neighbourhood::Manhattan
            && topology.manhattan(origin, cell) > distance_limit
        {
            continue;
        }
        return Some(cell);
    }
}

/// Evicts movable occupants of `cell`, newest first, until `demand` fits.
///
/// Evicted vertices are appended to `evicted` with their resources
/// released. On failure the cell is restored exactly and `evicted` is
/// emptied.
pub(crate) fn make_room(
    grid: &mut Grid,
    vertices: &[Vertex],
    cell: usize,
    demand: &[i32],
    evicted: &mut Vec<VertexId>,
) -> bool {
    evicted.clear();
    while !grid.fits_at(cell, demand) {
        match grid.pop_occupant(cell) {
            Some(v) => {
                grid.release(cell, &vertices[v.index()].demand);
                evicted.push(v);
            }
            None => {
                restore(grid, vertices, cell, evicted);
                return false;
            }
        }
    }
    true
}

/// Puts vertices taken by [`make_room`] back on `cell` in their old order.
pub(crate) fn restore(grid: &mut Grid, vertices: &[Vertex], cell: usize, evicted: &mut Vec<VertexId>) {
    while let Some(v) = evicted.pop() {
        grid.occupy(cell, &vertices[v.index()].demand);
        grid.push_occupant(cell, v);
    }
}

impl AnnealState {
    /// Uniformly picks one of the movable vertices.
    pub(crate) fn random_movable_vertex(&mut self) -> Option<VertexId> {
        if self.movable.is_empty() {
            return None;
        }
        let i = self.rng.random_range(0..self.movable.len());
        Some(self.movable[i])
    }
}
