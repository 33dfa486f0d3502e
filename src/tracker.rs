// THEORY:
// The `tracker` module is the top-level API of the engine. `TrackingLoop` owns the
// whole closed loop of the particle filter and exposes it as a tiny state machine:
// learn a target, feed it frames one at a time, stop.
//
// Key architectural principles:
// 1.  **Two States, No Leftovers**: The loop is either `Untracked` (no model, no
//     particles) or `Tracking` (a learned model and a live population). Learning
//     always starts from scratch; stopping drops everything.
// 2.  **Fixed Stage Order**: Every tick runs weighting, mean estimate, resampling,
//     then motion, in that order, on the same indexing of the population. The moved
//     population becomes the input of the next tick.
// 3.  **Caller-Owned Randomness**: `tick` borrows the caller's generator. Resampling
//     draws first, then motion draws particle by particle, always in population
//     order, so a seeded run is reproducible.
// 4.  **Failures Stay Local**: A dropped frame, a degenerate particle, or a total
//     weight collapse never abort a session. They are reported in the tick outcome.

use crate::config::TrackerConfig;
use crate::core_modules::color::ColorSpace;
use crate::core_modules::frame::Frame;
use crate::core_modules::histogram::HistogramSpec;
use crate::core_modules::motion_model::MotionModel;
use crate::core_modules::observation_model::{HistogramObservationModel, ObservationModel};
use crate::core_modules::particle::{Particle, Population};
use crate::core_modules::resampler::resample;
use crate::core_modules::weighting::{effective_sample_size, evaluate, mean_estimate, normalize};
use crate::error::{ConfigError, ResampleError, TrackerError};
use rand::Rng;
use std::borrow::Cow;
use tracing::{debug, info, trace, warn};

/// The lifecycle state of a `TrackingLoop`.
#[derive(Debug, Clone)]
pub enum TrackerState<M> {
    /// Nothing has been learned. No model and no particles are held.
    Untracked,
    /// A target has been learned and is being followed.
    Tracking { model: M, population: Population },
}

/// Everything the loop reports about one tracked frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingResult {
    /// The weighted mean of the population before resampling. The tracker's output.
    pub estimate: Particle,
    /// True when every particle scored zero and uniform weights were used instead.
    pub collapsed: bool,
    /// Effective sample size of the weighted population, in `[1, N]`.
    pub effective_sample_size: f64,
    /// How many particles had no extractable region or scored exactly zero.
    pub degenerate: usize,
    /// Number of frames tracked since the last `learn`, including this one.
    pub frame_index: u64,
}

/// The outcome of a single `tick`.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The loop is untracked; the frame was ignored.
    NotTracking,
    /// No usable frame was supplied. State is unchanged.
    NoFrame,
    /// The frame was processed and the population advanced.
    Tracked(TrackingResult),
}

impl TickOutcome {
    pub fn estimate(&self) -> Option<&Particle> {
        match self {
            TickOutcome::Tracked(result) => Some(&result.estimate),
            _ => None,
        }
    }
}

/// The particle filter tracking loop.
pub struct TrackingLoop<M = HistogramObservationModel> {
    config: TrackerConfig,
    motion_model: MotionModel,
    histogram_spec: HistogramSpec,
    state: TrackerState<M>,
    frames_tracked: u64,
}

impl<M: ObservationModel> TrackingLoop<M> {
    /// Validates the configuration and creates an untracked loop.
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let motion_model = MotionModel::new(config.std_xy, config.std_size)?;
        let histogram_spec = HistogramSpec::new(config.histogram_bins)?;
        Ok(Self {
            config,
            motion_model,
            histogram_spec,
            state: TrackerState::Untracked,
            frames_tracked: 0,
        })
    }

    /// Replaces the motion model built from the configuration.
    pub fn with_motion_model(mut self, motion_model: MotionModel) -> Self {
        self.motion_model = motion_model;
        self
    }

    pub fn state(&self) -> &TrackerState<M> {
        &self.state
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackerState::Tracking { .. })
    }

    /// The live population, for visualizing particle spread.
    pub fn population(&self) -> Option<&[Particle]> {
        match &self.state {
            TrackerState::Tracking { population, .. } => Some(population),
            TrackerState::Untracked => None,
        }
    }

    pub fn model(&self) -> Option<&M> {
        match &self.state {
            TrackerState::Tracking { model, .. } => Some(model),
            TrackerState::Untracked => None,
        }
    }

    /// Starts tracking with a caller-supplied model, seeding `N` copies of `seed`.
    /// Any previous model and population are discarded first.
    pub fn learn_with_model(&mut self, model: M, seed: Particle) {
        self.stop();
        let population = vec![seed.with_weight(0.0); self.config.num_particles];
        info!(
            x = seed.x,
            y = seed.y,
            size = seed.size,
            particles = population.len(),
            "start tracking"
        );
        self.state = TrackerState::Tracking { model, population };
        self.frames_tracked = 0;
    }

    /// Drops the model and the population. A no-op when already untracked.
    pub fn stop(&mut self) {
        if let TrackerState::Tracking { .. } = self.state {
            info!(frames = self.frames_tracked, "stop tracking");
        }
        self.state = TrackerState::Untracked;
    }

    /// Processes one frame: weight, estimate, resample, move.
    pub fn tick<R: Rng + ?Sized>(&mut self, frame: Option<&Frame>, rng: &mut R) -> Result<TickOutcome, TrackerError> {
        let Some(frame) = frame.filter(|f| !f.is_empty()) else {
            debug!("no frame this tick");
            return Ok(TickOutcome::NoFrame);
        };
        let TrackerState::Tracking { model, population } = &mut self.state else {
            return Ok(TickOutcome::NotTracking);
        };
        let observed = in_color_space(frame, self.config.color_space);
        let n = self.config.num_particles;

        // Stage 1: Weighting
        let likelihoods = evaluate(&*model, &observed, population, self.config.parallel_likelihood);
        let weighted = normalize(population, &likelihoods);
        if weighted.collapsed {
            warn!(particles = n, "total likelihood is zero; falling back to uniform weights");
        } else if weighted.degenerate > 0 {
            trace!(degenerate = weighted.degenerate, "particles scored the minimum likelihood");
        }

        // Stage 2: Mean Estimate
        let estimate = mean_estimate(&weighted.particles).ok_or(ResampleError::EmptyPopulation(n))?;
        let ess = effective_sample_size(&weighted.particles);

        // Stage 3: Resampling
        let resampled = resample(&weighted.particles, n, rng)?;

        // Stage 4: Motion
        let uniform = 1.0 / n as f64;
        *population = resampled
            .iter()
            .map(|p| self.motion_model.move_particle(p, rng).with_weight(uniform))
            .collect();

        self.frames_tracked += 1;
        debug!(
            frame = self.frames_tracked,
            x = estimate.x,
            y = estimate.y,
            size = estimate.size,
            ess,
            "tracked"
        );

        Ok(TickOutcome::Tracked(TrackingResult {
            estimate,
            collapsed: weighted.collapsed,
            effective_sample_size: ess,
            degenerate: weighted.degenerate,
            frame_index: self.frames_tracked,
        }))
    }
}

impl TrackingLoop<HistogramObservationModel> {
    /// Learns a color-histogram model from the square `region` of `frame` and
    /// seeds the population on it.
    ///
    /// On failure the loop is left untracked; nothing from a previous session survives.
    pub fn learn(&mut self, frame: &Frame, region: Particle) -> Result<(), TrackerError> {
        self.stop();
        let observed = in_color_space(frame, self.config.color_space);
        let model = HistogramObservationModel::learn(&observed, &region, self.histogram_spec, self.config.lambda)?;
        self.learn_with_model(model, region);
        Ok(())
    }

    /// Learns the square of side `seed_size` at the center of `frame`.
    pub fn learn_center(&mut self, frame: &Frame) -> Result<(), TrackerError> {
        let region = self.center_region(frame);
        self.learn(frame, region)
    }

    /// The default learning region for a frame.
    pub fn center_region(&self, frame: &Frame) -> Particle {
        let (x, y) = frame.center();
        Particle::new(x, y, self.config.seed_size)
    }
}

fn in_color_space(frame: &Frame, color_space: ColorSpace) -> Cow<'_, Frame> {
    match color_space {
        ColorSpace::Rgb => Cow::Borrowed(frame),
        other => Cow::Owned(frame.to_color_space(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config(num_particles: usize) -> TrackerConfig {
        TrackerConfig {
            num_particles,
            color_space: ColorSpace::Rgb,
            ..TrackerConfig::default()
        }
    }

    fn gray_frame() -> Frame {
        Frame::new(RgbImage::from_pixel(120, 90, Rgb([100, 100, 100])))
    }

    struct Constant(f64);

    impl ObservationModel for Constant {
        fn likelihood(&self, _frame: &Frame, _particle: &Particle) -> f64 {
            self.0
        }
    }

    #[test]
    fn starts_untracked_and_ignores_frames() {
        let mut tracker: TrackingLoop = TrackingLoop::new(config(10)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(!tracker.is_tracking());
        assert_eq!(tracker.tick(Some(&gray_frame()), &mut rng).unwrap(), TickOutcome::NotTracking);
        assert!(tracker.population().is_none());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let bad = TrackerConfig { lambda: -1.0, ..config(10) };
        assert!(matches!(TrackingLoop::<Constant>::new(bad), Err(ConfigError::Lambda(_))));
        let empty = config(0);
        assert!(matches!(TrackingLoop::<Constant>::new(empty), Err(ConfigError::EmptyPopulation)));
    }

    #[test]
    fn learn_seeds_identical_particles() {
        let mut tracker: TrackingLoop = TrackingLoop::new(config(25)).unwrap();
        let frame = gray_frame();
        tracker.learn_center(&frame).unwrap();

        let TrackerState::Tracking { population, .. } = tracker.state() else {
            panic!("expected a tracking state after learn");
        };
        assert_eq!(population.len(), 25);
        assert!(population.iter().all(|p| (p.x, p.y, p.size) == (60.0, 45.0, 50.0)));
    }

    #[test]
    fn learning_on_an_empty_frame_fails_untracked() {
        let mut tracker: TrackingLoop = TrackingLoop::new(config(5)).unwrap();
        tracker.learn_center(&gray_frame()).unwrap();
        let empty = Frame::new(RgbImage::new(0, 0));
        assert!(matches!(tracker.learn_center(&empty), Err(TrackerError::EmptyTrainingFrame)));
        assert!(matches!(tracker.state(), TrackerState::Untracked));
    }

    #[test]
    fn failed_learn_leaves_loop_untracked() {
        let mut tracker: TrackingLoop = TrackingLoop::new(config(5)).unwrap();
        let frame = gray_frame();
        tracker.learn_center(&frame).unwrap();
        let result = tracker.learn(&frame, Particle::new(-400.0, -400.0, 10.0));
        assert!(matches!(result, Err(TrackerError::TrainingRegion { .. })));
        assert!(!tracker.is_tracking());
    }

    #[test]
    fn missing_or_empty_frame_leaves_state_unchanged() {
        let mut tracker = TrackingLoop::new(config(8)).unwrap();
        tracker.learn_with_model(Constant(0.5), Particle::new(10.0, 10.0, 5.0));
        let before = tracker.population().unwrap().to_vec();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(tracker.tick(None, &mut rng).unwrap(), TickOutcome::NoFrame);
        let empty = Frame::new(RgbImage::new(0, 0));
        assert_eq!(tracker.tick(Some(&empty), &mut rng).unwrap(), TickOutcome::NoFrame);
        assert_eq!(tracker.population().unwrap(), before.as_slice());
    }

    #[test]
    fn tick_keeps_population_size_and_uniform_weights() {
        let mut tracker = TrackingLoop::new(config(40)).unwrap();
        tracker.learn_with_model(Constant(0.3), Particle::new(60.0, 45.0, 20.0));
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        for i in 1..=5 {
            let outcome = tracker.tick(Some(&gray_frame()), &mut rng).unwrap();
            let TickOutcome::Tracked(result) = outcome else { panic!("expected a tracked frame") };
            assert_eq!(result.frame_index, i);
            let population = tracker.population().unwrap();
            assert_eq!(population.len(), 40);
            assert!(population.iter().all(|p| p.weight == 1.0 / 40.0));
        }
    }

    #[test]
    fn stop_discards_everything() {
        let mut tracker = TrackingLoop::new(config(3)).unwrap();
        tracker.learn_with_model(Constant(1.0), Particle::new(1.0, 1.0, 1.0));
        tracker.stop();
        assert!(tracker.model().is_none());
        assert!(tracker.population().is_none());
        tracker.stop();
        assert!(!tracker.is_tracking());
    }
}
