//! Placement state configuration.

use crate::error::{PlaceError, Result};

/// How the spatial spread of a net is turned into a cost.
///
/// Every metric is scaled by the net weight and honours the
/// wrap-around flag of the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CostMetric {
    /// Half-perimeter of the member bounding box: `extent_x + extent_y`.
    #[default]
    HalfPerimeter,

    /// Full perimeter of the member bounding box: `2 * (extent_x + extent_y)`.
    FullPerimeter,

    /// Sum of hexagonal-mesh hop counts from the first member to every other
    /// member.
    ///
    /// On a hexagonal mesh a step along `(+1, +1)` or `(-1, -1)` is a single
    /// hop, so `(dx, dy)` with matching signs costs `max(|dx|, |dy|)` and with
    /// opposite signs costs `|dx| + |dy|`.
    HexagonalStar,
}

/// Shape of the neighbourhood searched for move and swap candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Neighbourhood {
    /// Square window: `max(dx, dy) <= distance_limit`.
    #[default]
    Chebyshev,

    /// Diamond window: `dx + dy <= distance_limit`.
    Manhattan,
}

/// Which cost deltas feed the batch statistics returned by `run_steps`.
///
/// Steps that never find a resource-feasible candidate are counted in
/// `num_steps` but contribute no sample in either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeltaStatistics {
    /// The delta of every evaluated move, accepted or not.
    #[default]
    Proposed,

    /// The delta of accepted moves; rejected moves contribute `0.0`.
    ///
    /// The batch sum then equals the change of the tracked cost.
    Accepted,
}

/// Configuration of an [`AnnealState`](super::AnnealState).
///
/// # Examples
///
/// ```
/// use grid_anneal::state::{CostMetric, Neighbourhood, PlacerConfig};
///
/// let config = PlacerConfig::default()
///     .with_wrap_around(true)
///     .with_cost_metric(CostMetric::FullPerimeter)
///     .with_neighbourhood(Neighbourhood::Manhattan)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlacerConfig {
    /// Whether the grid is a torus (distances wrap across edges).
    pub wrap_around: bool,

    /// Net cost metric.
    pub cost_metric: CostMetric,

    /// Candidate window shape for `distance_limit`.
    pub neighbourhood: Neighbourhood,

    /// Which deltas feed the returned statistics.
    pub delta_statistics: DeltaStatistics,

    /// How many candidates a single step may draw before giving up
    /// on resource conflicts. Must be at least 1.
    pub max_candidate_attempts: usize,

    /// Seed of the state-owned random stream.
    pub seed: u64,
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            wrap_around: false,
            cost_metric: CostMetric::default(),
            neighbourhood: Neighbourhood::default(),
            delta_statistics: DeltaStatistics::default(),
            max_candidate_attempts: 1,
            seed: 0,
        }
    }
}

impl PlacerConfig {
    pub fn with_wrap_around(mut self, wrap_around: bool) -> Self {
        self.wrap_around = wrap_around;
        self
    }

    pub fn with_cost_metric(mut self, metric: CostMetric) -> Self {
        self.cost_metric = metric;
        self
    }

    pub fn with_neighbourhood(mut self, neighbourhood: Neighbourhood) -> Self {
        self.neighbourhood = neighbourhood;
        self
    }

    pub fn with_delta_statistics(mut self, statistics: DeltaStatistics) -> Self {
        self.delta_statistics = statistics;
        self
    }

    pub fn with_max_candidate_attempts(mut self, n: usize) -> Self {
        self.max_candidate_attempts = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_candidate_attempts == 0 {
            return Err(PlaceError::InvalidConfig(
                "max_candidate_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlacerConfig::default();
        assert!(!config.wrap_around);
        assert_eq!(config.cost_metric, CostMetric::HalfPerimeter);
        assert_eq!(config.neighbourhood, Neighbourhood::Chebyshev);
        assert_eq!(config.delta_statistics, DeltaStatistics::Proposed);
        assert_eq!(config.max_candidate_attempts, 1);
    }

    #[test]
    fn test_validate_ok() {
        assert!(PlacerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_attempts() {
        let config = PlacerConfig::default().with_max_candidate_attempts(0);
        assert!(matches!(
            config.validate(),
            Err(PlaceError::InvalidConfig(_))
        ));
    }
}
