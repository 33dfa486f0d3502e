// THEORY:
// The `MotionModel` is the prediction half of the filter. It knows nothing about
// the image; it only encodes the prior belief that, between two frames, the object
// drifts by a small random amount and may grow or shrink slightly.
//
// Key architectural principles:
// 1.  **Random Walk**: Position and size are perturbed by independent zero-mean
//     Gaussian noise. There is no velocity term; the resampling step, not the motion
//     model, is what pulls the population toward the object.
// 2.  **Borrowed Randomness**: The model never owns a generator. Every draw comes
//     from the `Rng` handed in by the caller, which makes a seeded run reproducible
//     bit for bit.
// 3.  **No Validation of Output**: A perturbed size may become non-positive. That is
//     handled downstream, where a degenerate particle simply scores zero.

use crate::core_modules::particle::Particle;
use crate::error::ConfigError;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// A stateless Gaussian random-walk transition for particles.
#[derive(Debug, Clone)]
pub struct MotionModel {
    distribution_xy: Normal<f64>,
    distribution_size: Normal<f64>,
}

impl MotionModel {
    /// Builds the model from the position and size noise standard deviations.
    ///
    /// A standard deviation of zero disables noise for that component, which is
    /// useful for deterministic tests. Production callers go through
    /// `TrackerConfig::validate`, which additionally requires `std_xy > 0`.
    pub fn new(std_xy: f64, std_size: f64) -> Result<Self, ConfigError> {
        if !std_xy.is_finite() || std_xy < 0.0 {
            return Err(ConfigError::PositionNoise(std_xy));
        }
        if !std_size.is_finite() || std_size < 0.0 {
            return Err(ConfigError::SizeNoise(std_size));
        }
        let distribution_xy = Normal::new(0.0, std_xy).map_err(|_| ConfigError::PositionNoise(std_xy))?;
        let distribution_size = Normal::new(0.0, std_size).map_err(|_| ConfigError::SizeNoise(std_size))?;
        Ok(Self {
            distribution_xy,
            distribution_size,
        })
    }

    /// Perturbs a particle. Draw order is x, then y, then size.
    /// The returned particle carries no weight.
    pub fn move_particle<R: Rng + ?Sized>(&self, particle: &Particle, rng: &mut R) -> Particle {
        let dx = self.distribution_xy.sample(rng);
        let dy = self.distribution_xy.sample(rng);
        let ds = self.distribution_size.sample(rng);
        Particle::new(particle.x + dx, particle.y + dy, particle.size + ds)
    }
}
