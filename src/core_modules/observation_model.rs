// THEORY:
// The observation model answers one question for the filter: "how much does the
// image under this particle look like the thing we learned?" The tracking loop only
// depends on the `ObservationModel` trait, so any likelihood (a color histogram, a
// template score, a test stub) can drive it.
//
// Key architectural principles:
// 1.  **Learn Once**: `HistogramObservationModel` builds its reference histogram a
//     single time, from the training region, and is immutable afterwards.
// 2.  **Smooth, Positive Surface**: The likelihood is `exp(-lambda * d)` for a
//     histogram distance `d` in [0, 1]. Identical color distributions score 1, and
//     every real mismatch still scores above 0, so one bad frame cannot wipe out a
//     particle that is actually on target.
// 3.  **Sentinel, Not Error**: A particle whose region cannot be extracted scores
//     exactly 0. Frame processing never aborts because of a single particle.

use crate::core_modules::frame::{Frame, Region};
use crate::core_modules::histogram::{ColorHistogram, HistogramSpec};
use crate::core_modules::particle::Particle;
use crate::error::{ConfigError, TrackerError};

/// The likelihood assigned to a particle whose region cannot be extracted.
pub const MIN_LIKELIHOOD: f64 = 0.0;

/// A source of per-particle observation likelihoods.
///
/// Implementations must be pure with respect to `frame` and `particle` and return a
/// value in `[0, 1]`. They are `Sync` so the loop may evaluate particles in parallel.
pub trait ObservationModel: Send + Sync {
    fn likelihood(&self, frame: &Frame, particle: &Particle) -> f64;
}

/// Color-histogram observation model.
#[derive(Debug, Clone)]
pub struct HistogramObservationModel {
    /// The histogram of the training region.
    reference: ColorHistogram,
    /// The bin layout shared by the reference and every evaluated region.
    spec: HistogramSpec,
    /// Likelihood sharpness.
    lambda: f64,
}

impl HistogramObservationModel {
    /// Builds the model from an already-extracted training region.
    pub fn new(region: &Region<'_>, spec: HistogramSpec, lambda: f64) -> Result<Self, ConfigError> {
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(ConfigError::Lambda(lambda));
        }
        Ok(Self {
            reference: spec.build(region),
            spec,
            lambda,
        })
    }

    /// Extracts the region under `seed` from `frame` and learns it.
    pub fn learn(frame: &Frame, seed: &Particle, spec: HistogramSpec, lambda: f64) -> Result<Self, TrackerError> {
        if frame.is_empty() {
            return Err(TrackerError::EmptyTrainingFrame);
        }
        let region = frame.extract(seed).map_err(|_| TrackerError::TrainingRegion {
            x: seed.x,
            y: seed.y,
            size: seed.size,
        })?;
        Ok(Self::new(&region, spec, lambda)?)
    }

    /// The histogram distance between the region under `particle` and the reference.
    pub fn distance(&self, frame: &Frame, particle: &Particle) -> Option<f64> {
        let region = frame.extract(particle).ok()?;
        Some(self.reference.bhattacharyya(&self.spec.build(&region)))
    }
}

impl ObservationModel for HistogramObservationModel {
    fn likelihood(&self, frame: &Frame, particle: &Particle) -> f64 {
        match self.distance(frame, particle) {
            Some(d) => (-self.lambda * d).exp(),
            None => MIN_LIKELIHOOD,
        }
    }
}
