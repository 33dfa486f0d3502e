// THEORY:
// `Frame` is the only place in the engine that touches pixel memory. Every other
// module asks it for a square sub-region and receives either a bounds-checked view
// or an explicit `OutOfBounds` answer; no caller ever computes a byte offset.
//
// Key architectural principles:
// 1.  **One Audited Boundary**: Rounding a particle to a pixel window and clamping
//     that window to the frame happens here and nowhere else.
// 2.  **Deterministic Clamping**: A window that partly overlaps the frame is cut
//     down to the overlap. A window with no overlap, or a degenerate particle, is
//     rejected. The same inputs always produce the same answer.
// 3.  **Zero-Copy Views**: Extraction returns a `Region` borrowing the frame, so
//     evaluating hundreds of particles per frame does not allocate.

use crate::core_modules::color::ColorSpace;
use crate::core_modules::particle::Particle;
use crate::error::TrackerError;
use image::{Rgb, RgbImage};
use std::path::Path;

/// Why a sub-region could not be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfBounds {
    /// The particle's size is non-positive, non-finite, or rounds to zero pixels.
    Degenerate,
    /// The square does not overlap the frame at all.
    OutsideFrame,
}

/// The pixel rectangle that survives clamping a particle's square to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A bounds-checked, borrowed view of a rectangle inside a frame.
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    image: &'a RgbImage,
    rect: ClampedRect,
}

impl<'a> Region<'a> {
    pub fn pixel_count(&self) -> usize {
        self.rect.width as usize * self.rect.height as usize
    }

    /// Iterates the region's pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = &'a Rgb<u8>> + 'a {
        let (image, rect) = (self.image, self.rect);
        (rect.y..rect.y + rect.height)
            .flat_map(move |y| (rect.x..rect.x + rect.width).map(move |x| image.get_pixel(x, y)))
    }

    /// Copies the region out into its own image.
    pub fn to_image(&self) -> RgbImage {
        let (image, rect) = (self.image, self.rect);
        RgbImage::from_fn(rect.width, rect.height, |x, y| *image.get_pixel(rect.x + x, rect.y + y))
    }
}

/// A single video frame, stored as 8-bit three-channel pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Loads any format the `image` crate can decode and converts it to RGB.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TrackerError> {
        Ok(Self::new(image::open(path)?.to_rgb8()))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// A frame with no pixels, e.g. a dropped camera capture.
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Returns a copy of this frame converted into `color_space`.
    pub fn to_color_space(&self, color_space: ColorSpace) -> Frame {
        Frame::new(color_space.convert(&self.image))
    }

    /// The center of the frame, used as the default learning location.
    pub fn center(&self) -> (f64, f64) {
        ((self.width() / 2) as f64, (self.height() / 2) as f64)
    }

    /// Computes the clamped rectangle a particle covers in this frame.
    pub fn clamp(&self, particle: &Particle) -> Result<ClampedRect, OutOfBounds> {
        let window = particle.pixel_window().ok_or(OutOfBounds::Degenerate)?;
        let (width, height) = (self.width() as i64, self.height() as i64);

        let x0 = window.left.max(0);
        let y0 = window.top.max(0);
        let x1 = window.left.saturating_add(window.side).min(width);
        let y1 = window.top.saturating_add(window.side).min(height);

        if x1 <= x0 || y1 <= y0 {
            return Err(OutOfBounds::OutsideFrame);
        }
        Ok(ClampedRect {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    /// Extracts the square sub-region described by a particle.
    pub fn extract(&self, particle: &Particle) -> Result<Region<'_>, OutOfBounds> {
        let rect = self.clamp(particle)?;
        Ok(Region { image: &self.image, rect })
    }

    /// The whole frame as a region.
    pub fn full_region(&self) -> Result<Region<'_>, OutOfBounds> {
        if self.is_empty() {
            return Err(OutOfBounds::OutsideFrame);
        }
        let rect = ClampedRect { x: 0, y: 0, width: self.width(), height: self.height() };
        Ok(Region { image: &self.image, rect })
    }

    /// Extracts the square of side `size` centered at `(x, y)`.
    pub fn extract_square(&self, x: f64, y: f64, size: f64) -> Result<Region<'_>, OutOfBounds> {
        self.extract(&Particle::new(x, y, size))
    }
}
