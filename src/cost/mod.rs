//! Net cost model.
//!
//! A net costs `weight * spread(members)`, where the spread is measured
//! by a [`CostMetric`] over the member positions. On a wrap-around grid
//! every per-axis distance is `min(|a - b|, size - |a - b|)` and the
//! bounding box along an axis is the shortest arc covering all member
//! coordinates, not the naive `max - min`.
//!
//! Unplaced members are ignored; a net with fewer than two placed members
//! costs nothing.

mod topology;

pub use topology::{axis_distance, axis_extent, hexagonal_distance, Topology};

use crate::state::{CostMetric, Net, Vertex};

/// Reusable buffers for computing net costs without allocating.
#[derive(Debug, Clone, Default)]
pub struct NetCostEvaluator {
    xs: Vec<usize>,
    ys: Vec<usize>,
}

impl NetCostEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an evaluator whose buffers already hold `fanout` entries.
    pub fn with_capacity(fanout: usize) -> Self {
        Self {
            xs: Vec::with_capacity(fanout),
            ys: Vec::with_capacity(fanout),
        }
    }

    /// Cost of `net` with its members at their current positions.
    pub fn net_cost(
        &mut self,
        metric: CostMetric,
        topology: &Topology,
        net: &Net,
        vertices: &[Vertex],
    ) -> f64 {
        let spread = match metric {
            CostMetric::HalfPerimeter => self.bounding_box(topology, net, vertices),
            CostMetric::FullPerimeter => 2 * self.bounding_box(topology, net, vertices),
            CostMetric::HexagonalStar => star(topology, net, vertices),
        };
        net.weight * spread as f64
    }

    /// `extent_x + extent_y` of the placed members.
    fn bounding_box(&mut self, topology: &Topology, net: &Net, vertices: &[Vertex]) -> usize {
        self.xs.clear();
        self.ys.clear();
        for &member in &net.members {
            if let Some((x, y)) = vertices[member.index()].position {
                self.xs.push(x);
                self.ys.push(y);
            }
        }
        if self.xs.len() < 2 {
            return 0;
        }
        axis_extent(&mut self.xs, topology.width(), topology.wraps())
            + axis_extent(&mut self.ys, topology.height(), topology.wraps())
    }
}

/// Sum of hexagonal distances from the first placed member to the others.
fn star(topology: &Topology, net: &Net, vertices: &[Vertex]) -> usize {
    let mut placed = net
        .members
        .iter()
        .filter_map(|m| vertices[m.index()].position);
    let Some(source) = placed.next() else {
        return 0;
    };
    placed.map(|p| topology.hexagonal(source, p)).sum()
}

/// Cost of a single net, allocating scratch space for the call.
pub fn net_cost(metric: CostMetric, topology: &Topology, net: &Net, vertices: &[Vertex]) -> f64 {
    NetCostEvaluator::with_capacity(net.members.len()).net_cost(metric, topology, net, vertices)
}
