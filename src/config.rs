// THEORY:
// `TrackerConfig` gathers every tunable of the engine in one place, the same way
// the rest of the engine is driven from a single configuration struct. It is
// plain data (serde-friendly, so it can be loaded from a file) and it is checked
// once, up front, by `validate`. Nothing downstream re-checks these values.

use crate::core_modules::color::ColorSpace;
use crate::core_modules::histogram::HistogramSpec;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for the `TrackingLoop`, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// The number of particles `N`. Fixed for the whole session.
    pub num_particles: usize,
    /// Standard deviation of the per-frame position noise, in pixels.
    pub std_xy: f64,
    /// Standard deviation of the per-frame size change, in pixels.
    pub std_size: f64,
    /// Likelihood sharpness. Larger values punish histogram mismatch harder.
    pub lambda: f64,
    /// Side length of the region learned when tracking starts at a default location.
    pub seed_size: f64,
    /// Histogram bins per color channel.
    pub histogram_bins: [usize; 3],
    /// The color space histograms are computed in.
    pub color_space: ColorSpace,
    /// Evaluate particle likelihoods on the rayon thread pool.
    /// Results are identical to sequential evaluation.
    pub parallel_likelihood: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            num_particles: 250,
            std_xy: 10.0,
            std_size: 2.0,
            lambda: 50.0,
            seed_size: 50.0,
            histogram_bins: [5, 25, 25],
            color_space: ColorSpace::Lab,
            parallel_likelihood: false,
        }
    }
}

impl TrackerConfig {
    /// Rejects values that would make the statistical model meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_particles == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if !self.std_xy.is_finite() || self.std_xy <= 0.0 {
            return Err(ConfigError::PositionNoise(self.std_xy));
        }
        if !self.std_size.is_finite() || self.std_size < 0.0 {
            return Err(ConfigError::SizeNoise(self.std_size));
        }
        if !self.lambda.is_finite() || self.lambda <= 0.0 {
            return Err(ConfigError::Lambda(self.lambda));
        }
        if !self.seed_size.is_finite() || self.seed_size <= 0.0 {
            return Err(ConfigError::SeedSize(self.seed_size));
        }
        HistogramSpec::new(self.histogram_bins)?;
        Ok(())
    }
}
