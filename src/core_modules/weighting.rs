// THEORY:
// Weighting turns raw observation likelihoods into a normalized importance
// distribution over the population, and condenses that distribution into the
// single number the outside world cares about: the mean estimate.
//
// Key architectural principles:
// 1.  **Explicit Collapse Branch**: If every particle scores zero, the population
//     carries no information about the target. Dividing by the zero total would
//     poison every later stage with NaN, so the weights fall back to uniform `1/N`
//     and the condition is reported to the caller as a quality signal.
// 2.  **Index-Stable Evaluation**: Likelihoods are written by particle index. The
//     optional parallel path produces exactly the same vector as the sequential one.
// 3.  **Estimate Is Not a Particle of the Population**: The weighted centroid is
//     reported, never resampled or moved.

use crate::core_modules::frame::Frame;
use crate::core_modules::observation_model::{MIN_LIKELIHOOD, ObservationModel};
use crate::core_modules::particle::{Particle, Population};
use rayon::prelude::*;

/// The result of weighting one frame's population.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPopulation {
    /// The population with normalized weights, in the original order.
    pub particles: Population,
    /// True when the total likelihood was zero and uniform weights were used.
    pub collapsed: bool,
    /// The number of particles whose likelihood was exactly the minimum.
    pub degenerate: usize,
}

/// Evaluates the observation model for every particle, preserving order.
pub fn evaluate<M>(model: &M, frame: &Frame, particles: &[Particle], parallel: bool) -> Vec<f64>
where
    M: ObservationModel + ?Sized,
{
    if parallel {
        particles.par_iter().map(|p| sanitize(model.likelihood(frame, p))).collect()
    } else {
        particles.iter().map(|p| sanitize(model.likelihood(frame, p))).collect()
    }
}

/// Negative or non-finite likelihoods carry no usable information.
fn sanitize(likelihood: f64) -> f64 {
    if likelihood.is_finite() && likelihood > 0.0 {
        likelihood
    } else {
        MIN_LIKELIHOOD
    }
}

/// Attaches normalized weights to the population.
///
/// `likelihoods[i]` belongs to `particles[i]`; extra entries on either side are ignored.
pub fn normalize(particles: &[Particle], likelihoods: &[f64]) -> WeightedPopulation {
    let n = particles.len().min(likelihoods.len());
    let likelihoods: Vec<f64> = likelihoods[..n].iter().map(|&l| sanitize(l)).collect();
    let degenerate = likelihoods.iter().filter(|&&l| l <= MIN_LIKELIHOOD).count();
    let total: f64 = likelihoods.iter().sum();

    if n == 0 {
        return WeightedPopulation {
            particles: Vec::new(),
            collapsed: false,
            degenerate,
        };
    }

    if !(total.is_finite() && total > 0.0) {
        let uniform = 1.0 / n as f64;
        return WeightedPopulation {
            particles: particles[..n].iter().map(|p| p.with_weight(uniform)).collect(),
            collapsed: true,
            degenerate,
        };
    }

    WeightedPopulation {
        particles: particles[..n]
            .iter()
            .zip(&likelihoods)
            .map(|(p, &l)| p.with_weight(l / total))
            .collect(),
        collapsed: false,
        degenerate,
    }
}

/// The weighted centroid of a normalized population. `None` for an empty one.
pub fn mean_estimate(particles: &[Particle]) -> Option<Particle> {
    if particles.is_empty() {
        return None;
    }
    let (x, y, size) = particles.iter().fold((0.0, 0.0, 0.0), |(x, y, s), p| {
        (x + p.weight * p.x, y + p.weight * p.y, s + p.weight * p.size)
    });
    Some(Particle::new(x, y, size).with_weight(1.0))
}

/// Effective sample size `1 / Σ w²` of a normalized population.
/// Ranges from 1 (all mass on one particle) to `N` (uniform weights).
pub fn effective_sample_size(particles: &[Particle]) -> f64 {
    let sum_sq: f64 = particles.iter().map(|p| p.weight * p.weight).sum();
    if sum_sq > 0.0 { 1.0 / sum_sq } else { 0.0 }
}
