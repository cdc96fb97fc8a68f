//! One annealing step: propose, evaluate incrementally, accept or revert.

use super::moves::{make_room, random_nearby_cell, restore};
use crate::cost::NetCostEvaluator;
use crate::error::{PlaceError, Result};
use crate::state::{add_resources, AnnealState, NetId, VertexId};
use rand::Rng;

/// Buffers reused by every step so the loop never allocates once warm.
#[derive(Debug, Clone)]
pub(crate) struct StepScratch {
    pub(crate) evaluator: NetCostEvaluator,
    /// Vertices displaced from the target cell.
    evicted: Vec<VertexId>,
    /// Nets touched by the current move, each once.
    affected: Vec<NetId>,
    /// Recomputed costs, parallel to `affected`.
    new_costs: Vec<f64>,
    /// `stamp[net] == epoch` marks a net already in `affected`.
    stamp: Vec<u32>,
    epoch: u32,
    /// Summed demand of the evicted vertices.
    demand_sum: Vec<i32>,
}

impl StepScratch {
    pub(crate) fn new(num_nets: usize, num_resource_types: usize) -> Result<Self> {
        let mut stamp = Vec::new();
        stamp
            .try_reserve_exact(num_nets)
            .map_err(|e| PlaceError::AllocationFailure(e.to_string()))?;
        stamp.resize(num_nets, 0);
        Ok(Self {
            evaluator: NetCostEvaluator::new(),
            evicted: Vec::new(),
            affected: Vec::new(),
            new_costs: Vec::new(),
            stamp,
            epoch: 0,
            demand_sum: vec![0; num_resource_types],
        })
    }

    fn next_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.stamp.fill(0);
            self.epoch = 1;
        }
        self.affected.clear();
    }

    #[inline]
    fn touch(&mut self, net: NetId) {
        let i = net.index();
        if self.stamp[i] != self.epoch {
            self.stamp[i] = self.epoch;
            self.affected.push(net);
        }
    }
}

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum StepOutcome {
    /// No resource-feasible candidate was found; nothing changed.
    NoCandidate,
    /// The move was evaluated and undone.
    Rejected { delta: f64 },
    /// The move was committed.
    Accepted { delta: f64 },
}

/// Metropolis criterion. Never draws a random number for downhill moves
/// or at a non-positive temperature.
#[inline]
pub(crate) fn metropolis<R: Rng>(rng: &mut R, delta: f64, temperature: f64) -> bool {
    if delta <= 0.0 {
        return true;
    }
    if temperature.is_nan() || temperature <= 0.0 {
        return false;
    }
    rng.random::<f64>() < (-delta / temperature).exp()
}

impl AnnealState {
    /// Runs one step at `temperature`, resampling the candidate up to
    /// `max_candidate_attempts` times on resource conflicts.
    pub(crate) fn step(&mut self, distance_limit: usize, temperature: f64) -> StepOutcome {
        for _ in 0..self.config.max_candidate_attempts {
            let Some(vertex) = self.random_movable_vertex() else {
                return StepOutcome::NoCandidate;
            };
            let Some(origin) = self.registry.vertices[vertex.index()].position else {
                return StepOutcome::NoCandidate;
            };
            let Some(target) = random_nearby_cell(
                &mut self.rng,
                &self.topology,
                self.config.neighbourhood,
                origin,
                distance_limit,
            ) else {
                return StepOutcome::NoCandidate;
            };
            if let Some(outcome) = self.try_move(vertex, origin, target, temperature) {
                return outcome;
            }
        }
        StepOutcome::NoCandidate
    }

    /// Moves `vertex` to `target`, sending whatever had to be evicted there
    /// back to `origin`. Returns `None`, with the state untouched, when the
    /// exchange does not fit.
    fn try_move(
        &mut self,
        vertex: VertexId,
        origin: (usize, usize),
        target: (usize, usize),
        temperature: f64,
    ) -> Option<StepOutcome> {
        let from = self.grid.index_of(origin.0, origin.1);
        let to = self.grid.index_of(target.0, target.1);
        let vertices = &self.registry.vertices;
        let scratch = &mut self.scratch;
        let demand = &vertices[vertex.index()].demand;

        if !make_room(&mut self.grid, vertices, to, demand, &mut scratch.evicted) {
            return None;
        }

        self.grid.release(from, demand);
        let slot = self.grid.remove_occupant(from, vertex).unwrap_or(0);

        scratch.demand_sum.fill(0);
        for &e in &scratch.evicted {
            add_resources(&mut scratch.demand_sum, &vertices[e.index()].demand);
        }
        if !self.grid.fits_at(from, &scratch.demand_sum) {
            self.grid.occupy(from, demand);
            self.grid.insert_occupant(from, slot, vertex);
            restore(&mut self.grid, vertices, to, &mut scratch.evicted);
            return None;
        }

        self.grid.occupy(to, demand);
        self.grid.push_occupant(to, vertex);
        for &e in &scratch.evicted {
            self.grid.occupy(from, &vertices[e.index()].demand);
            self.grid.push_occupant(from, e);
        }
        self.set_positions(vertex, target, origin);

        let delta = self.evaluate_move(vertex);
        if metropolis(&mut self.rng, delta, temperature) {
            for (&net, &cost) in self.scratch.affected.iter().zip(&self.scratch.new_costs) {
                self.registry.nets[net.index()].cost = cost;
            }
            self.tracked_cost += delta;
            Some(StepOutcome::Accepted { delta })
        } else {
            self.undo_move(vertex, from, to, slot);
            self.set_positions(vertex, origin, target);
            Some(StepOutcome::Rejected { delta })
        }
    }

    /// Puts `vertex` at `at` and every evicted vertex at `others`.
    fn set_positions(&mut self, vertex: VertexId, at: (usize, usize), others: (usize, usize)) {
        self.registry.vertices[vertex.index()].position = Some(at);
        for &e in &self.scratch.evicted {
            self.registry.vertices[e.index()].position = Some(others);
        }
    }

    /// Reverses the grid side of an exchange made by `try_move`, leaving
    /// both occupant lists in their original order.
    fn undo_move(&mut self, vertex: VertexId, from: usize, to: usize, slot: usize) {
        let vertices = &self.registry.vertices;
        for _ in 0..self.scratch.evicted.len() {
            if let Some(e) = self.grid.pop_occupant(from) {
                self.grid.release(from, &vertices[e.index()].demand);
            }
        }
        self.grid.pop_occupant(to);
        self.grid.release(to, &vertices[vertex.index()].demand);
        // The evicted list is still needed by `set_positions`, so it is
        // walked rather than drained.
        for &e in self.scratch.evicted.iter().rev() {
            self.grid.occupy(to, &vertices[e.index()].demand);
            self.grid.push_occupant(to, e);
        }
        self.grid.occupy(from, &vertices[vertex.index()].demand);
        self.grid.insert_occupant(from, slot, vertex);
    }

    /// Cost delta of the exchange just applied, over the nets of `vertex`
    /// and of every evicted vertex. Leaves the new costs in the scratch.
    fn evaluate_move(&mut self, vertex: VertexId) -> f64 {
        let scratch = &mut self.scratch;
        let vertices = &self.registry.vertices;
        scratch.next_epoch();
        for &net in &vertices[vertex.index()].nets {
            scratch.touch(net);
        }
        for k in 0..scratch.evicted.len() {
            let e = scratch.evicted[k];
            for &net in &vertices[e.index()].nets {
                scratch.touch(net);
            }
        }

        let mut before = 0.0;
        let mut after = 0.0;
        scratch.new_costs.clear();
        for &net in &scratch.affected {
            let n = &self.registry.nets[net.index()];
            let cost =
                scratch
                    .evaluator
                    .net_cost(self.config.cost_metric, &self.topology, n, vertices);
            before += n.cost;
            after += cost;
            scratch.new_costs.push(cost);
        }
        after - before
    }
}
