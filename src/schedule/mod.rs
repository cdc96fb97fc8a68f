//! Cooling schedules layered on top of the annealing kernel.
//!
//! The kernel only knows how to run a batch of steps at one temperature.
//! [`Annealer`] repeats such batches, lowering the temperature (and, for
//! [`CoolingSchedule::Adaptive`], the distance limit) between them from the
//! statistics each batch returns, until the temperature is negligible
//! relative to the average net cost.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Lundy & Mees (1986), "Convergence of an Annealing Algorithm"
//! - Betz & Rose (1997), "VPR: A New Packing, Placement and Routing Tool
//!   for FPGA Research"

mod config;
mod runner;

pub use config::{CoolingSchedule, ScheduleConfig};
pub use runner::{Annealer, ScheduleResult, StageRecord};
