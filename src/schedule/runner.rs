//! Multi-stage annealing loop built on [`AnnealState::run_steps`].

use super::config::{adapt_distance_limit, cool, CoolingSchedule, ScheduleConfig};
use crate::error::Result;
use crate::kernel::StepStats;
use crate::state::AnnealState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One temperature stage of a schedule run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageRecord {
    /// Temperature the stage ran at.
    pub temperature: f64,

    /// Distance limit the stage ran with.
    pub distance_limit: usize,

    /// Statistics returned by the batch.
    pub stats: StepStats,

    /// Tracked cost at the end of the stage.
    pub cost: f64,
}

/// Result of an [`Annealer`] run. The placement itself is left in the state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleResult {
    /// Cost before the run.
    pub initial_cost: f64,

    /// Cost after the run.
    pub final_cost: f64,

    /// Lowest cost seen before the run or at the end of any stage.
    pub best_cost: f64,

    /// Temperature of the first stage.
    pub initial_temperature: f64,

    /// Temperature the schedule stopped at.
    pub final_temperature: f64,

    /// Steps executed, trial and quench batches included.
    pub total_steps: usize,

    /// Accepted steps, trial and quench batches included.
    pub total_accepted: usize,

    /// Whether cancelled externally.
    pub cancelled: bool,

    /// One record per temperature stage, in order.
    pub history: Vec<StageRecord>,
}

/// Drives an [`AnnealState`] through a cooling schedule.
pub struct Annealer;

impl Annealer {
    /// Anneals `state` in place.
    ///
    /// # Examples
    ///
    /// ```
    /// use grid_anneal::schedule::{Annealer, ScheduleConfig};
    /// use grid_anneal::state::AnnealState;
    ///
    /// let mut state = AnnealState::new(3, 3, 1, 2, 1).unwrap();
    /// for x in 0..3 {
    ///     for y in 0..3 {
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
    /// state.add_vertex_to_chip(b, 2, 2, true).unwrap();
    ///
    /// let result = Annealer::run(&mut state, &ScheduleConfig::default()).unwrap();
    /// assert!(result.final_cost <= result.initial_cost);
    /// ```
    pub fn run(state: &mut AnnealState, config: &ScheduleConfig) -> Result<ScheduleResult> {
        Self::run_with_cancel(state, config, None)
    }

    /// Anneals `state` in place, checking `cancel` before every stage.
    pub fn run_with_cancel(
        state: &mut AnnealState,
        config: &ScheduleConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<ScheduleResult> {
        config.validate()?;

        let initial_cost = state.tracked_cost();
        let mut result = ScheduleResult {
            initial_cost,
            final_cost: initial_cost,
            best_cost: initial_cost,
            initial_temperature: 0.0,
            final_temperature: 0.0,
            total_steps: 0,
            total_accepted: 0,
            cancelled: false,
            history: Vec::new(),
        };

        let num_movable = state.num_movable_vertices();
        if num_movable == 0 {
            log::warn!("annealing skipped: no movable vertex");
            return Ok(result);
        }

        let max_limit = state.grid().width().max(state.grid().height());
        let mut distance_limit = config.initial_distance_limit.unwrap_or(max_limit);
        let steps = config
            .steps_per_temperature
            .unwrap_or_else(|| default_steps(config.effort, num_movable));

        let mut temperature = match config.initial_temperature {
            Some(t) => t,
            None => {
                let trial = state.run_steps(num_movable, max_limit, f64::INFINITY);
                result.total_steps += trial.num_steps;
                result.total_accepted += trial.num_accepted;
                20.0 * trial.cost_delta_std_dev
            }
        };
        result.initial_temperature = temperature;
        log::info!(
            "annealing {} movable vertices: T0={:.6}, {} steps per stage, cost {:.4}",
            num_movable,
            temperature,
            steps,
            state.tracked_cost()
        );

        let num_nets = state.registry().num_nets();
        while !finished(config, temperature, state.tracked_cost(), num_nets) {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    result.cancelled = true;
                    break;
                }
            }

            let stats = state.run_steps(steps, distance_limit, temperature);
            let cost = state.tracked_cost();
            let rate = stats.acceptance_rate();
            result.total_steps += stats.num_steps;
            result.total_accepted += stats.num_accepted;
            result.best_cost = result.best_cost.min(cost);
            result.history.push(StageRecord {
                temperature,
                distance_limit,
                stats,
                cost,
            });
            log::info!(
                "stage {}: T={:.6} limit={} accepted {:.1}% cost {:.4}",
                result.history.len(),
                temperature,
                distance_limit,
                100.0 * rate,
                cost
            );

            temperature = cool(temperature, config.cooling, rate);
            if config.cooling == CoolingSchedule::Adaptive {
                distance_limit = adapt_distance_limit(distance_limit, rate, max_limit);
            }
            if config.max_stages > 0 && result.history.len() >= config.max_stages {
                break;
            }
        }

        if config.quench && !result.cancelled {
            let stats = state.run_steps(steps, distance_limit, 0.0);
            result.total_steps += stats.num_steps;
            result.total_accepted += stats.num_accepted;
        }

        result.final_temperature = temperature;
        result.final_cost = state.tracked_cost();
        result.best_cost = result.best_cost.min(result.final_cost);
        log::info!(
            "annealing done after {} stages: cost {:.4} -> {:.4}",
            result.history.len(),
            result.initial_cost,
            result.final_cost
        );
        Ok(result)
    }

    /// Anneals several independent states in parallel, one schedule run
    /// per state. Give each state its own seed for distinct trajectories.
    #[cfg(feature = "parallel")]
    pub fn run_independent(
        states: &mut [AnnealState],
        config: &ScheduleConfig,
    ) -> Result<Vec<ScheduleResult>> {
        use rayon::prelude::*;

        config.validate()?;
        states
            .par_iter_mut()
            .map(|state| Self::run(state, config))
            .collect()
    }
}

/// `effort * n^(4/3)` steps, at least one.
fn default_steps(effort: f64, num_movable: usize) -> usize {
    let steps = effort * (num_movable as f64).powf(4.0 / 3.0);
    (steps.round() as usize).max(1)
}

fn finished(config: &ScheduleConfig, temperature: f64, cost: f64, num_nets: usize) -> bool {
    if temperature.is_nan() || temperature <= config.min_temperature || cost <= 0.0 {
        return true;
    }
    num_nets > 0 && temperature < config.stop_ratio * cost / num_nets as f64
}
