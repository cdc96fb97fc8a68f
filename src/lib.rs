//! Simulated-annealing placement on resource-constrained 2D grids.
//!
//! Vertices demanding per-type resources are placed on the cells of a
//! width x height grid (optionally a torus) and connected by weighted nets.
//! The annealing kernel moves vertices around to shorten the nets while
//! never exceeding any cell's capacity.
//!
//! - **State** ([`state`]): grid capacities and usage, vertex and net
//!   registries, the construction API and the incrementally tracked cost.
//! - **Cost** ([`cost`]): topology-aware distances and net cost metrics
//!   (half-perimeter wire length by default).
//! - **Kernel** ([`kernel`]): [`AnnealState::run_steps`], a batch of
//!   Metropolis steps at a fixed temperature and distance limit.
//! - **Schedule** ([`schedule`]): an optional cooling loop built only from
//!   `run_steps` results.
//!
//! # Architecture
//!
//! The kernel is single-threaded and owns all of its storage. Temperature
//! policy lives outside it so that schedules can be tuned without touching
//! the hot loop; independent runs may be spread over threads with the
//! `parallel` feature.

pub mod cost;
pub mod error;
pub mod kernel;
pub mod schedule;
pub mod state;

pub use error::{PlaceError, Result};
pub use kernel::StepStats;
pub use state::{AnnealState, NetId, PlacerConfig, VertexId};
