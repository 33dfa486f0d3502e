// THEORY:
// The `Particle` is the smallest unit of belief in the tracker. Each one is a
// single hypothesis about where the tracked object is in the current frame: a
// square window centered at `(x, y)` with side `size`, plus a `weight` that
// says how much the latest observation agrees with that hypothesis.
//
// Key architectural principles:
// 1.  **Value Semantics**: A `Particle` is `Copy`. Every stage of the filter
//     (weighting, resampling, motion) produces fresh values instead of mutating
//     shared ones, so the "current" and "next" populations can never alias.
// 2.  **No Identity**: Particles carry no ID. The whole population is replaced
//     every frame; only the statistics of the population persist.
// 3.  **Geometry Lives Here**: The conversion from a continuous `(x, y, size)`
//     state to a discrete pixel window is defined once (`PixelWindow`), so the
//     observation model and the renderer always agree on what a particle covers.

/// A fixed-size, ordered collection of particles. Order is stable within one frame.
pub type Population = Vec<Particle>;

/// A single weighted hypothesis of the tracked region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// The horizontal center of the square region, in frame pixels.
    pub x: f64,
    /// The vertical center of the square region, in frame pixels.
    pub y: f64,
    /// The side length of the square region, in frame pixels.
    pub size: f64,
    /// The importance weight for the current frame. Recomputed every cycle.
    pub weight: f64,
}

/// The integer pixel window a particle describes, before any clamping to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub left: i64,
    pub top: i64,
    pub side: i64,
}

impl Particle {
    /// Creates an unweighted particle.
    pub fn new(x: f64, y: f64, size: f64) -> Self {
        Self {
            x,
            y,
            size,
            weight: 0.0,
        }
    }

    /// Returns a copy of this particle carrying the given weight.
    pub fn with_weight(self, weight: f64) -> Self {
        Self { weight, ..self }
    }

    /// A particle may only be evaluated when its region is a real, finite square.
    pub fn is_degenerate(&self) -> bool {
        let finite = self.x.is_finite() && self.y.is_finite() && self.size.is_finite();
        !finite || self.size <= 0.0
    }

    /// Rounds the continuous state to a pixel window.
    /// Returns `None` for degenerate particles or a window that rounds to zero pixels.
    pub fn pixel_window(&self) -> Option<PixelWindow> {
        if self.is_degenerate() {
            return None;
        }
        let half = self.size / 2.0;
        let side = self.size.round() as i64;
        if side <= 0 {
            return None;
        }
        Some(PixelWindow {
            left: (self.x - half).round() as i64,
            top: (self.y - half).round() as i64,
            side,
        })
    }
}
