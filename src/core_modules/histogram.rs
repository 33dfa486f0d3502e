// THEORY:
// A `ColorHistogram` summarizes the color distribution of an image region in a
// fixed-shape 3-D grid of bins, one axis per color channel. The bin shape is a
// configuration value, never derived from the data, so two histograms built with
// the same `HistogramSpec` can always be compared bin for bin.
//
// The distance used by the observation model is the Bhattacharyya distance in its
// normalized-coefficient form. It is symmetric, lies in [0, 1], is 0 for identical
// distributions and 1 for distributions with no overlapping bins.

use crate::core_modules::frame::Region;
use crate::error::ConfigError;

const CHANNEL_RANGE: usize = 256;

/// Upper bound on the number of cells in one histogram. A histogram is rebuilt
/// for every particle on every tick, so the table has to stay small.
pub const MAX_HISTOGRAM_CELLS: usize = 1 << 16;

/// The fixed bin layout shared by every histogram of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramSpec {
    bins: [usize; 3],
}

impl HistogramSpec {
    pub fn new(bins: [usize; 3]) -> Result<Self, ConfigError> {
        if bins.iter().any(|&b| b == 0 || b > CHANNEL_RANGE) || bins.iter().product::<usize>() > MAX_HISTOGRAM_CELLS {
            return Err(ConfigError::HistogramBins(bins));
        }
        Ok(Self { bins })
    }

    pub fn bins(&self) -> [usize; 3] {
        self.bins
    }

    fn bin_of(&self, channel: usize, value: u8) -> usize {
        value as usize * self.bins[channel] / CHANNEL_RANGE
    }

    /// Counts every pixel of `region` into a new histogram.
    pub fn build(&self, region: &Region<'_>) -> ColorHistogram {
        let [_, b1, b2] = self.bins;
        let mut counts = vec![0.0f32; self.bins.iter().product()];
        for pixel in region.pixels() {
            let [c0, c1, c2] = pixel.0;
            let index = (self.bin_of(0, c0) * b1 + self.bin_of(1, c1)) * b2 + self.bin_of(2, c2);
            counts[index] += 1.0;
        }
        ColorHistogram { bins: self.bins, counts }
    }
}

/// A 3-D color frequency table, stored flat in channel-0-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorHistogram {
    bins: [usize; 3],
    counts: Vec<f32>,
}

impl ColorHistogram {
    pub fn bins(&self) -> [usize; 3] {
        self.bins
    }

    pub fn counts(&self) -> &[f32] {
        &self.counts
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().map(|&c| c as f64).sum()
    }

    /// Bhattacharyya distance to another histogram of the same shape.
    ///
    /// Histograms of different shape, or an empty histogram, are maximally distant.
    pub fn bhattacharyya(&self, other: &ColorHistogram) -> f64 {
        if self.bins != other.bins {
            return 1.0;
        }
        let norm = (self.total() * other.total()).sqrt();
        if norm <= f64::EPSILON {
            return 1.0;
        }
        let coefficient: f64 = self
            .counts
            .iter()
            .zip(&other.counts)
            .map(|(&a, &b)| (a as f64 * b as f64).sqrt())
            .sum();
        (1.0 - coefficient / norm).max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::frame::Frame;
    use approx::assert_abs_diff_eq;
    use image::{Rgb, RgbImage};

    fn solid(color: [u8; 3]) -> Frame {
        Frame::new(RgbImage::from_pixel(10, 10, Rgb(color)))
    }

    fn histogram_of(frame: &Frame) -> ColorHistogram {
        let spec = HistogramSpec::new([5, 25, 25]).unwrap();
        spec.build(&frame.full_region().unwrap())
    }

    #[test]
    fn counts_every_pixel_once() {
        let h = histogram_of(&solid([255, 255, 255]));
        assert_eq!(h.total(), 100.0);
        assert_eq!(h.counts().iter().filter(|&&c| c > 0.0).count(), 1);
        assert_eq!(h.counts()[h.counts().len() - 1], 100.0);
    }

    #[test]
    fn identical_regions_have_zero_distance() {
        let a = histogram_of(&solid([12, 200, 80]));
        assert_abs_diff_eq!(a.bhattacharyya(&a.clone()), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn disjoint_regions_have_unit_distance() {
        let a = histogram_of(&solid([0, 0, 0]));
        let b = histogram_of(&solid([255, 255, 255]));
        assert_abs_diff_eq!(a.bhattacharyya(&b), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn distance_is_symmetric_and_bounded() {
        let mut image = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        for x in 0..5 {
            for y in 0..10 {
                image.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let half = histogram_of(&Frame::new(image));
        let black = histogram_of(&solid([0, 0, 0]));

        let d = half.bhattacharyya(&black);
        assert_abs_diff_eq!(d, black.bhattacharyya(&half), epsilon = 1e-12);
        assert!(d > 0.0 && d < 1.0);
    }

    #[test]
    fn mismatched_shapes_are_maximally_distant() {
        let frame = solid([1, 2, 3]);
        let region = frame.full_region().unwrap();
        let a = HistogramSpec::new([5, 25, 25]).unwrap().build(&region);
        let b = HistogramSpec::new([8, 8, 8]).unwrap().build(&region);
        assert_eq!(a.bhattacharyya(&b), 1.0);
    }

    #[test]
    fn rejects_zero_bins() {
        assert!(HistogramSpec::new([0, 25, 25]).is_err());
        assert!(HistogramSpec::new([5, 25, 257]).is_err());
    }

    #[test]
    fn rejects_oversized_tables() {
        assert!(HistogramSpec::new([256, 256, 256]).is_err());
        assert!(HistogramSpec::new([64, 32, 33]).is_err());
        assert!(HistogramSpec::new([64, 32, 32]).is_ok());
    }
}
