// Error types for the tracking engine.
//
// Only conditions that make the statistical model meaningless, or that stop a
// session from starting, become errors. Per-particle and per-frame problems
// (degenerate regions, weight collapse, dropped frames) are reported through
// return values instead, so one bad particle never unwinds a session.

use thiserror::Error;

/// Rejected configuration values. Fatal at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("position noise std-dev must be finite and positive, got {0}")]
    PositionNoise(f64),
    #[error("size noise std-dev must be finite and non-negative, got {0}")]
    SizeNoise(f64),
    #[error("likelihood sharpness lambda must be finite and positive, got {0}")]
    Lambda(f64),
    #[error("population size must be at least 1")]
    EmptyPopulation,
    #[error("seed region size must be finite and positive, got {0}")]
    SeedSize(f64),
    #[error("histogram bin counts must each be between 1 and 256 with at most 65536 cells in total, got {0:?}")]
    HistogramBins([usize; 3]),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResampleError {
    #[error("cannot draw {0} particles from an empty population")]
    EmptyPopulation(usize),
}

/// Errors surfaced by the tracking loop.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("invalid tracker configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("resampling failed: {0}")]
    Resample(#[from] ResampleError),
    #[error("training region centered at ({x:.1}, {y:.1}) with size {size:.1} lies outside the frame")]
    TrainingRegion { x: f64, y: f64, size: f64 },
    #[error("the training frame is empty")]
    EmptyTrainingFrame,
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
