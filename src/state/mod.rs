//! Annealing state: grid, vertex and net registries, and the running cost.
//!
//! An [`AnnealState`] is built once with fixed dimensions, populated during
//! an initialisation phase, then handed to
//! [`run_steps`](AnnealState::run_steps) as many times as the caller's
//! schedule requires. All storage is owned by the state and released when
//! it is dropped.
//!
//! # Examples
//!
//! ```
//! use grid_anneal::state::AnnealState;
//!
//! let mut state = AnnealState::new(4, 4, 1, 2, 1).unwrap();
//! for x in 0..4 {
//!     for y in 0..4 {
//!         state.set_chip_resource(x, y, 0, 1).unwrap();
//!     }
//! }
//! let a = state.new_vertex(1).unwrap();
//! let b = state.new_vertex(1).unwrap();
//! state.set_vertex_resource(a, 0, 1).unwrap();
//! state.set_vertex_resource(b, 0, 1).unwrap();
//! let net = state.new_net(2).unwrap();
//! state.add_vertex_to_net(net, a).unwrap();
//! state.add_vertex_to_net(net, b).unwrap();
//! state.add_vertex_to_chip(a, 0, 0, true).unwrap();
//! state.add_vertex_to_chip(b, 3, 3, true).unwrap();
//! assert_eq!(state.total_cost(), 6.0);
//! ```

mod config;
mod grid;
mod registry;

pub use config::{CostMetric, DeltaStatistics, Neighbourhood, PlacerConfig};
pub use grid::{add_resources, all_non_negative, subtract_resources, Grid, DEAD_CELL};
pub use registry::{Net, NetId, Registry, Vertex, VertexId};

use crate::cost::{NetCostEvaluator, Topology};
use crate::error::{PlaceError, Result};
use crate::kernel::StepScratch;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The aggregate placement problem and its current solution.
#[derive(Debug, Clone)]
pub struct AnnealState {
    pub(crate) config: PlacerConfig,
    pub(crate) topology: Topology,
    pub(crate) grid: Grid,
    pub(crate) registry: Registry,
    /// Movable vertices, in placement order.
    pub(crate) movable: Vec<VertexId>,
    /// Sum of every cached net cost.
    pub(crate) tracked_cost: f64,
    pub(crate) rng: StdRng,
    pub(crate) scratch: StepScratch,
}

impl AnnealState {
    /// Creates a state with the default [`PlacerConfig`].
    ///
    /// Every cell starts dead (capacity [`DEAD_CELL`]) and there is room
    /// for exactly `num_vertices` vertices and `num_nets` nets.
    pub fn new(
        width: usize,
        height: usize,
        num_resource_types: usize,
        num_vertices: usize,
        num_nets: usize,
    ) -> Result<Self> {
        Self::with_config(
            width,
            height,
            num_resource_types,
            num_vertices,
            num_nets,
            PlacerConfig::default(),
        )
    }

    /// Creates a state with an explicit configuration.
    pub fn with_config(
        width: usize,
        height: usize,
        num_resource_types: usize,
        num_vertices: usize,
        num_nets: usize,
        config: PlacerConfig,
    ) -> Result<Self> {
        config.validate()?;
        let grid = Grid::new(width, height, num_resource_types)?;
        let registry = Registry::new(num_vertices, num_nets, num_resource_types)?;
        let mut movable = Vec::new();
        movable
            .try_reserve_exact(num_vertices)
            .map_err(|e| PlaceError::AllocationFailure(e.to_string()))?;

        Ok(Self {
            topology: Topology::new(width, height, config.wrap_around),
            rng: StdRng::seed_from_u64(config.seed),
            scratch: StepScratch::new(num_nets, num_resource_types)?,
            config,
            grid,
            registry,
            movable,
            tracked_cost: 0.0,
        })
    }

    // ---- Initialisation ----

    /// Allocates a vertex that may join at most `num_nets` nets.
    pub fn new_vertex(&mut self, num_nets: usize) -> Result<VertexId> {
        self.registry.new_vertex(num_nets)
    }

    /// Allocates a unit-weight net holding at most `num_vertices` members.
    pub fn new_net(&mut self, num_vertices: usize) -> Result<NetId> {
        self.registry.new_net(num_vertices)
    }

    /// Sets the weight of a net. The weight must be finite.
    pub fn set_net_weight(&mut self, net: NetId, weight: f64) -> Result<()> {
        if !weight.is_finite() {
            return Err(PlaceError::InvalidConfig(format!(
                "weight of net {net} must be finite, got {weight}"
            )));
        }
        self.registry.net_mut(net)?.weight = weight;
        self.refresh_net(net);
        Ok(())
    }

    /// Sets how much of `resource` a vertex needs. Only valid before the
    /// vertex is placed.
    pub fn set_vertex_resource(&mut self, vertex: VertexId, resource: usize, amount: i32) -> Result<()> {
        let limit = self.grid.num_resource_types();
        let v = self.registry.vertex_mut(vertex)?;
        if v.is_placed() {
            return Err(PlaceError::AlreadyPlaced(vertex));
        }
        if resource >= limit {
            return Err(PlaceError::OutOfBounds {
                what: "resource",
                index: resource,
                limit,
            });
        }
        if amount < 0 {
            return Err(PlaceError::InvalidDemand {
                vertex,
                resource,
                amount,
            });
        }
        v.demand[resource] = amount;
        Ok(())
    }

    /// Makes `vertex` a member of `net` and updates the net's cost.
    pub fn add_vertex_to_net(&mut self, net: NetId, vertex: VertexId) -> Result<()> {
        self.registry.add_vertex_to_net(net, vertex)?;
        self.refresh_net(net);
        Ok(())
    }

    /// Places a vertex at its initial cell.
    ///
    /// Fixed vertices (`movable == false`) consume resources like any other
    /// vertex but are never moved or evicted by the kernel.
    pub fn add_vertex_to_chip(&mut self, vertex: VertexId, x: usize, y: usize, movable: bool) -> Result<()> {
        let cell = self.grid.cell_index(x, y)?;
        let v = self.registry.vertex(vertex)?;
        if v.is_placed() {
            return Err(PlaceError::AlreadyPlaced(vertex));
        }
        // A dead cell refuses even a zero demand.
        if let Some(resource) = self.grid.first_overflow(cell, &v.demand) {
            return Err(PlaceError::ResourceExceeded { x, y, resource });
        }

        self.grid.occupy(cell, &v.demand);
        if movable {
            self.grid.push_occupant(cell, vertex);
            self.movable.push(vertex);
        }
        let v = self.registry.vertex_mut(vertex)?;
        v.position = Some((x, y));
        v.movable = movable;
        self.refresh_vertex_nets(vertex);
        Ok(())
    }

    /// Takes a vertex off the grid, returning its resources to the cell.
    ///
    /// This is an initialisation-phase call: it lets a caller restart a
    /// placement from chosen positions.
    pub fn remove_vertex_from_chip(&mut self, vertex: VertexId) -> Result<()> {
        let v = self.registry.vertex(vertex)?;
        let Some((x, y)) = v.position else {
            return Ok(());
        };
        let cell = self.grid.index_of(x, y);
        self.grid.release(cell, &v.demand);
        if v.movable {
            self.grid.remove_occupant(cell, vertex);
            self.movable.retain(|&m| m != vertex);
        }
        self.registry.vertex_mut(vertex)?.position = None;
        self.refresh_vertex_nets(vertex);
        Ok(())
    }

    /// Sets the capacity of `resource` at cell `(x, y)`.
    ///
    /// Fails with [`PlaceError::ResourceExceeded`] if the cell holds a
    /// vertex and the new capacity is negative or below the current usage.
    pub fn set_chip_resource(&mut self, x: usize, y: usize, resource: usize, capacity: i32) -> Result<()> {
        self.grid.set_capacity(x, y, resource, capacity)
    }

    /// Switches between mesh and torus topology and recomputes every net.
    pub fn set_wrap_around(&mut self, wrap_around: bool) {
        self.config.wrap_around = wrap_around;
        self.topology = Topology::new(self.grid.width(), self.grid.height(), wrap_around);
        self.refresh_all();
    }

    /// Restarts the random stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    // ---- Cost bookkeeping ----

    fn refresh_net(&mut self, net: NetId) {
        let i = net.index();
        let cost = self.scratch.evaluator.net_cost(
            self.config.cost_metric,
            &self.topology,
            &self.registry.nets[i],
            &self.registry.vertices,
        );
        self.tracked_cost += cost - self.registry.nets[i].cost;
        self.registry.nets[i].cost = cost;
    }

    fn refresh_vertex_nets(&mut self, vertex: VertexId) {
        for k in 0..self.registry.vertices[vertex.index()].nets.len() {
            let net = self.registry.vertices[vertex.index()].nets[k];
            self.refresh_net(net);
        }
    }

    fn refresh_all(&mut self) {
        let mut evaluator = NetCostEvaluator::new();
        let mut total = 0.0;
        for net in &mut self.registry.nets {
            net.cost = evaluator.net_cost(
                self.config.cost_metric,
                &self.topology,
                net,
                &self.registry.vertices,
            );
            total += net.cost;
        }
        self.tracked_cost = total;
    }

    /// Recomputes the cost of every net from scratch and sums it.
    ///
    /// Verification utility; the annealing loop uses
    /// [`tracked_cost`](Self::tracked_cost) instead.
    pub fn total_cost(&self) -> f64 {
        let mut evaluator = NetCostEvaluator::new();
        self.registry
            .nets
            .iter()
            .map(|net| {
                evaluator.net_cost(
                    self.config.cost_metric,
                    &self.topology,
                    net,
                    &self.registry.vertices,
                )
            })
            .sum()
    }

    /// Running total maintained incrementally by every mutation.
    pub fn tracked_cost(&self) -> f64 {
        self.tracked_cost
    }

    /// Distance between two placed vertices in the configured metric
    /// (hop count for [`CostMetric::HexagonalStar`], Manhattan otherwise).
    pub fn vertex_distance(&self, a: VertexId, b: VertexId) -> Result<Option<usize>> {
        let pa = self.registry.vertex(a)?.position;
        let pb = self.registry.vertex(b)?.position;
        Ok(match (pa, pb) {
            (Some(pa), Some(pb)) => Some(match self.config.cost_metric {
                CostMetric::HexagonalStar => self.topology.hexagonal(pa, pb),
                CostMetric::HalfPerimeter | CostMetric::FullPerimeter => {
                    self.topology.manhattan(pa, pb)
                }
            }),
            _ => None,
        })
    }

    // ---- Accessors ----

    pub fn config(&self) -> &PlacerConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.registry.vertex(id)
    }

    pub fn net(&self, id: NetId) -> Result<&Net> {
        self.registry.net(id)
    }

    /// Current cell of a vertex, `None` while unplaced.
    pub fn vertex_position(&self, id: VertexId) -> Result<Option<(usize, usize)>> {
        Ok(self.registry.vertex(id)?.position)
    }

    pub fn movable_vertices(&self) -> &[VertexId] {
        &self.movable
    }

    pub fn num_movable_vertices(&self) -> usize {
        self.movable.len()
    }

    /// Checks the structural invariants of the state.
    ///
    /// Every net member is a registered vertex whose net list names the net
    /// back, usage never exceeds capacity, no vertex sits on a dead cell,
    /// grid usage and vertex counts match the placed vertices, movable vertices are listed exactly once at
    /// their cell, and the tracked cost matches a full recomputation.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let vertices = &self.registry.vertices;
        for (i, net) in self.registry.nets.iter().enumerate() {
            for &m in &net.members {
                let v = vertices
                    .get(m.index())
                    .ok_or_else(|| format!("net n{i} references unknown vertex {m}"))?;
                if !v.nets.iter().any(|n| n.index() == i) {
                    return Err(format!("vertex {m} does not list net n{i}"));
                }
            }
        }

        if !self.grid.within_capacity() {
            return Err("resource usage exceeds capacity".into());
        }

        let nr = self.grid.num_resource_types();
        let mut usage = vec![0i32; self.grid.num_cells() * nr];
        let mut residents = vec![0u32; self.grid.num_cells()];
        for (i, v) in vertices.iter().enumerate() {
            let Some((x, y)) = v.position else {
                if v.movable && self.movable.iter().any(|m| m.index() == i) {
                    return Err(format!("unplaced vertex v{i} is in the movable pool"));
                }
                continue;
            };
            let cell = self.grid.index_of(x, y);
            add_resources(&mut usage[cell * nr..(cell + 1) * nr], &v.demand);
            residents[cell] += 1;
            let listed = self
                .grid
                .occupants_at(cell)
                .iter()
                .filter(|o| o.index() == i)
                .count();
            let expected = usize::from(v.movable);
            if listed != expected {
                return Err(format!(
                    "vertex v{i} listed {listed} times at ({x}, {y}), expected {expected}"
                ));
            }
        }
        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                let cell = self.grid.index_of(x, y);
                let counted = self.grid.residents(x, y).map_err(|e| e.to_string())?;
                if counted != residents[cell] {
                    return Err(format!(
                        "({x}, {y}) counts {counted} vertices, expected {}",
                        residents[cell]
                    ));
                }
                for r in 0..nr {
                    let recorded = self.grid.usage(x, y, r).map_err(|e| e.to_string())?;
                    if recorded != usage[cell * nr + r] {
                        return Err(format!(
                            "usage of resource {r} at ({x}, {y}) is {recorded}, expected {}",
                            usage[cell * nr + r]
                        ));
                    }
                }
            }
        }

        let total = self.total_cost();
        let tolerance = 1e-9 * total.abs().max(1.0);
        if (total - self.tracked_cost).abs() > tolerance {
            return Err(format!(
                "tracked cost {} differs from recomputed cost {total}",
                self.tracked_cost
            ));
        }
        Ok(())
    }
}
