// THEORY:
// This file is the entry point for the `particle_tracker` library crate. It
// exposes the `TrackingLoop` and its configuration as the high-level interface of
// the engine, while the building blocks of the filter (particles, motion and
// observation models, weighting, resampling, frame access) live in
// `core_modules` and stay usable on their own.
//
// A typical session builds a `TrackingLoop` from a validated `TrackerConfig`,
// learns the target from a region of the first frame (`learn` or `learn_center`),
// then calls `tick` once per frame with a caller-owned seeded generator. Each
// tracked tick reports the weighted-mean estimate of the target's square.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod tracker;

pub use config::TrackerConfig;
pub use core_modules::color::ColorSpace;
pub use core_modules::frame::{Frame, OutOfBounds};
pub use core_modules::motion_model::MotionModel;
pub use core_modules::observation_model::{HistogramObservationModel, ObservationModel};
pub use core_modules::particle::{Particle, Population};
pub use error::{ConfigError, ResampleError, TrackerError};
pub use tracker::{TickOutcome, TrackerState, TrackingLoop, TrackingResult};
