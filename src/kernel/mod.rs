//! Move generator, Metropolis acceptance and the batch driver.
//!
//! [`AnnealState::run_steps`] runs a fixed number of annealing steps at a
//! fixed temperature and distance limit, and reports what happened. How
//! the temperature evolves between batches is left to the caller; the
//! [`schedule`](crate::schedule) module offers one such policy.
//!
//! Each step:
//!
//! 1. picks a movable vertex uniformly at random;
//! 2. picks a random cell other than its own within `distance_limit`;
//! 3. evicts movable occupants of that cell, newest first, until the vertex
//!    fits, and checks that the evicted vertices fit in the cell being
//!    vacated (otherwise the candidate is discarded and, if attempts
//!    remain, resampled);
//! 4. re-evaluates only the nets touching the moved vertices;
//! 5. accepts with the Metropolis criterion, or restores the state exactly.
//!
//! Resource conflicts are rejections, never errors.

mod moves;
mod stats;
mod step;

pub use stats::{RunningStats, StepStats};

pub(crate) use step::StepScratch;

use crate::state::{AnnealState, DeltaStatistics};
use step::StepOutcome;

impl AnnealState {
    /// Runs `num_steps` annealing steps at `temperature`, proposing moves
    /// no farther than `distance_limit` from the moving vertex.
    ///
    /// Every executed step is counted. Steps that evaluate a move add one
    /// cost-delta sample to the returned statistics (see
    /// [`DeltaStatistics`]); steps that find no resource-feasible candidate
    /// add none. With no movable vertex nothing is executed and all-zero
    /// statistics are returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use grid_anneal::state::AnnealState;
    ///
    /// let mut state = AnnealState::new(4, 4, 1, 2, 1).unwrap();
    /// for x in 0..4 {
    ///     for y in 0..4 {
    ///         state.set_chip_resource(x, y, 0, 1).unwrap();
    ///     }
    /// }
    /// let a = state.new_vertex(1).unwrap();
    /// let b = state.new_vertex(1).unwrap();
    /// state.set_vertex_resource(a, 0, 1).unwrap();
    /// state.set_vertex_resource(b, 0, 1).unwrap();
    /// let net = state.new_net(2).unwrap();
    /// state.add_vertex_to_net(net, a).unwrap();
    /// state.add_vertex_to_net(net, b).unwrap();
    /// state.add_vertex_to_chip(a, 0, 0, true).unwrap();
    /// state.add_vertex_to_chip(b, 3, 3, true).unwrap();
    ///
    /// let stats = state.run_steps(1000, 4, 0.0);
    /// assert_eq!(stats.num_steps, 1000);
    /// assert!(state.tracked_cost() <= 6.0);
    /// ```
    pub fn run_steps(&mut self, num_steps: usize, distance_limit: usize, temperature: f64) -> StepStats {
        if self.movable.is_empty() {
            return StepStats::default();
        }

        let mut deltas = RunningStats::new();
        let mut num_accepted = 0;
        for _ in 0..num_steps {
            let sample = match self.step(distance_limit, temperature) {
                StepOutcome::NoCandidate => None,
                StepOutcome::Rejected { delta } => Some(match self.config.delta_statistics {
                    DeltaStatistics::Proposed => delta,
                    DeltaStatistics::Accepted => 0.0,
                }),
                StepOutcome::Accepted { delta } => {
                    num_accepted += 1;
                    Some(delta)
                }
            };
            if let Some(delta) = sample {
                deltas.push(delta);
            }
        }

        let stats = StepStats {
            num_steps,
            num_accepted,
            cost_delta_sum: deltas.sum(),
            cost_delta_std_dev: deltas.sample_std_dev(),
        };
        log::debug!(
            "run_steps: {} steps at T={:.6} (limit {}): {} accepted, delta sum {:.4}, sd {:.4}",
            num_steps,
            temperature,
            distance_limit,
            num_accepted,
            stats.cost_delta_sum,
            stats.cost_delta_std_dev
        );
        stats
    }
}
