//! Schedule configuration and cooling rules.

use crate::error::{PlaceError, Result};

/// How the temperature falls between stages.
///
/// # References
///
/// - Geometric: Kirkpatrick, Gelatt & Vecchi (1983)
/// - LundyMees: Lundy & Mees (1986)
/// - Adaptive: Betz & Rose (1997), "VPR: A New Packing, Placement and
///   Routing Tool for FPGA Research"
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoolingSchedule {
    /// `T_{k+1} = alpha * T_k`. Typical `alpha`: 0.9-0.99.
    Geometric {
        /// Cooling factor in (0, 1). Higher = slower cooling.
        alpha: f64,
    },

    /// `T_{k+1} = T_k / (1 + beta * T_k)`.
    ///
    /// Cools fast at high temperature and slowly near the end.
    LundyMees {
        /// Cooling parameter, positive.
        beta: f64,
    },

    /// Acceptance-driven cooling.
    ///
    /// The cooling factor follows the acceptance rate `r` of the last stage
    /// (0.5 above 0.96, 0.9 above 0.8, 0.95 above 0.15, 0.8 otherwise), and
    /// the distance limit is scaled by `1 - 0.44 + r` so that roughly 44%
    /// of the proposed moves are accepted.
    Adaptive,
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::Adaptive
    }
}

/// Configuration of an [`Annealer`](super::Annealer) run.
///
/// # Examples
///
/// ```
/// use grid_anneal::schedule::{CoolingSchedule, ScheduleConfig};
///
/// let config = ScheduleConfig::default()
///     .with_initial_temperature(50.0)
///     .with_cooling(CoolingSchedule::Geometric { alpha: 0.9 })
///     .with_steps_per_temperature(500)
///     .with_max_stages(100);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleConfig {
    /// Starting temperature. `None` estimates it as twenty times the
    /// standard deviation of the cost deltas of a trial batch run at
    /// infinite temperature.
    pub initial_temperature: Option<f64>,

    /// Absolute temperature floor; the schedule stops below it.
    pub min_temperature: f64,

    /// The schedule also stops once the temperature drops below
    /// `stop_ratio * cost / num_nets`.
    pub stop_ratio: f64,

    /// Cooling schedule.
    pub cooling: CoolingSchedule,

    /// Steps run at each temperature. `None` uses
    /// `effort * num_movable^(4/3)`, at least one.
    pub steps_per_temperature: Option<usize>,

    /// Scales the default number of steps per temperature.
    pub effort: f64,

    /// Distance limit of the first stage. `None` uses the larger grid
    /// dimension.
    pub initial_distance_limit: Option<usize>,

    /// Maximum number of stages (0 = unlimited).
    pub max_stages: usize,

    /// Whether a final batch is run at zero temperature.
    pub quench: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            initial_temperature: None,
            min_temperature: 1e-9,
            stop_ratio: 0.005,
            cooling: CoolingSchedule::default(),
            steps_per_temperature: None,
            effort: 0.5,
            initial_distance_limit: None,
            max_stages: 0,
            quench: true,
        }
    }
}

impl ScheduleConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = Some(t);
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_stop_ratio(mut self, ratio: f64) -> Self {
        self.stop_ratio = ratio;
        self
    }

    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }

    pub fn with_steps_per_temperature(mut self, n: usize) -> Self {
        self.steps_per_temperature = Some(n);
        self
    }

    pub fn with_effort(mut self, effort: f64) -> Self {
        self.effort = effort;
        self
    }

    pub fn with_initial_distance_limit(mut self, limit: usize) -> Self {
        self.initial_distance_limit = Some(limit);
        self
    }

    pub fn with_max_stages(mut self, n: usize) -> Self {
        self.max_stages = n;
        self
    }

    pub fn with_quench(mut self, quench: bool) -> Self {
        self.quench = quench;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.initial_temperature {
            if !t.is_finite() || t <= 0.0 {
                return Err(invalid(format!(
                    "initial_temperature must be positive and finite, got {t}"
                )));
            }
        }
        if self.min_temperature.is_nan() || self.min_temperature < 0.0 {
            return Err(invalid(format!(
                "min_temperature must be non-negative, got {}",
                self.min_temperature
            )));
        }
        if self.stop_ratio.is_nan() || self.stop_ratio < 0.0 {
            return Err(invalid(format!(
                "stop_ratio must be non-negative, got {}",
                self.stop_ratio
            )));
        }
        if self.effort.is_nan() || self.effort <= 0.0 {
            return Err(invalid(format!("effort must be positive, got {}", self.effort)));
        }
        if self.steps_per_temperature == Some(0) {
            return Err(invalid("steps_per_temperature must be at least 1".into()));
        }
        if self.initial_distance_limit == Some(0) {
            return Err(invalid("initial_distance_limit must be at least 1".into()));
        }
        match self.cooling {
            CoolingSchedule::Geometric { alpha } => {
                if !(alpha > 0.0 && alpha < 1.0) {
                    return Err(invalid(format!(
                        "geometric alpha must be in (0, 1), got {alpha}"
                    )));
                }
            }
            CoolingSchedule::LundyMees { beta } => {
                if beta.is_nan() || beta <= 0.0 {
                    return Err(invalid(format!(
                        "lundy-mees beta must be positive, got {beta}"
                    )));
                }
            }
            CoolingSchedule::Adaptive => {}
        }
        Ok(())
    }
}

fn invalid(message: String) -> PlaceError {
    PlaceError::InvalidConfig(message)
}

/// Next temperature after a stage that accepted `acceptance_rate` of its
/// steps.
pub(crate) fn cool(temperature: f64, cooling: CoolingSchedule, acceptance_rate: f64) -> f64 {
    match cooling {
        CoolingSchedule::Geometric { alpha } => temperature * alpha,
        CoolingSchedule::LundyMees { beta } => temperature / (1.0 + beta * temperature),
        CoolingSchedule::Adaptive => {
            let alpha = if acceptance_rate > 0.96 {
                0.5
            } else if acceptance_rate > 0.8 {
                0.9
            } else if acceptance_rate > 0.15 {
                0.95
            } else {
                0.8
            };
            temperature * alpha
        }
    }
}

/// Distance limit for the next stage, kept within `1..=max_limit`.
pub(crate) fn adapt_distance_limit(limit: usize, acceptance_rate: f64, max_limit: usize) -> usize {
    let scaled = (limit as f64 * (1.0 - 0.44 + acceptance_rate)).round();
    (scaled.max(1.0) as usize).min(max_limit.max(1))
}
