// THEORY:
// The `Resampler` implements sequential importance resampling with a roulette
// wheel. After weighting, most of the probability mass tends to sit on a few
// particles; left alone, the rest would drift off and the filter would degenerate
// to a handful of useful hypotheses. Resampling replaces the weighted population
// with an unweighted one in which each particle appears roughly in proportion to
// its weight.
//
// Key architectural principles:
// 1.  **Prefix Sums + Binary Search**: The cumulative distribution is a plain
//     `Vec<f64>` of running sums. A draw `u` selects the first particle whose
//     running sum is strictly greater than `u` (the upper-bound rule), found with
//     `partition_point`. Tied weights need no special handling.
// 2.  **Explicit Rounding Fallback**: Floating-point sums may end slightly below 1.
//     A draw above the final sum selects the last particle instead of indexing out
//     of bounds.
// 3.  **Copies, Not Aliases**: Every output particle is an independent value with
//     weight `1 / count`. The motion model re-diversifies the duplicates afterwards.

use crate::core_modules::particle::{Particle, Population};
use crate::error::ResampleError;
use rand::Rng;

/// The running sums `c_i = w_0 + ... + w_i` of a population's weights.
pub fn cumulative_weights(particles: &[Particle]) -> Vec<f64> {
    particles
        .iter()
        .scan(0.0, |acc, p| {
            *acc += p.weight;
            Some(*acc)
        })
        .collect()
}

/// Inverse-CDF lookup: the index of the first running sum strictly greater than `u`,
/// or the last index when no sum exceeds `u`.
pub fn select(cumulative: &[f64], u: f64) -> Option<usize> {
    if cumulative.is_empty() {
        return None;
    }
    let index = cumulative.partition_point(|&c| c <= u);
    Some(index.min(cumulative.len() - 1))
}

/// Draws `count` particles from a normalized population, proportionally to weight.
pub fn resample<R: Rng + ?Sized>(particles: &[Particle], count: usize, rng: &mut R) -> Result<Population, ResampleError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let cumulative = cumulative_weights(particles);
    let weight = 1.0 / count as f64;

    let mut result = Vec::with_capacity(count);
    for _ in 0..count {
        let u: f64 = rng.random();
        let index = select(&cumulative, u).ok_or(ResampleError::EmptyPopulation(count))?;
        result.push(particles[index].with_weight(weight));
    }
    Ok(result)
}
