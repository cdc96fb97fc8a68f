//! Batch statistics for the annealing kernel.

/// Streaming mean and variance (Welford's algorithm).
///
/// # References
///
/// Welford (1962), "Note on a Method for Calculating Corrected Sums of
/// Squares and Products"
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    sum: f64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        self.sum += x;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Plain running sum of the samples.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance (`n - 1` denominator); `0.0` below two samples.
    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn sample_std_dev(&self) -> f64 {
        self.sample_variance().sqrt()
    }
}

/// Result of one [`run_steps`](crate::state::AnnealState::run_steps) batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepStats {
    /// Steps executed (zero when nothing is movable).
    pub num_steps: usize,

    /// Steps whose move was committed.
    pub num_accepted: usize,

    /// Sum of the sampled cost deltas.
    pub cost_delta_sum: f64,

    /// Sample standard deviation of the sampled cost deltas.
    pub cost_delta_std_dev: f64,
}

impl StepStats {
    /// Fraction of executed steps that were accepted.
    pub fn acceptance_rate(&self) -> f64 {
        if self.num_steps == 0 {
            0.0
        } else {
            self.num_accepted as f64 / self.num_steps as f64
        }
    }
}
