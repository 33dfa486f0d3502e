// Drawing and image output for the sequence runner.

use image::imageops::{self, FilterType};
use image::{ImageEncoder, Rgb, RgbImage};
use particle_tracker::{Frame, Particle};
use std::path::Path;

pub const PARTICLE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const ESTIMATE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const LEARN_REGION_COLOR: Rgb<u8> = Rgb([0, 255, 255]);

const CROP_SIDE: u32 = 200;

/// Draws the one-pixel outline of a particle's square. Parts outside the image are skipped.
pub fn draw_square(image: &mut RgbImage, particle: &Particle, color: Rgb<u8>) {
    let Some(window) = particle.pixel_window() else {
        return;
    };
    let (width, height) = (image.width() as i64, image.height() as i64);
    let (left, top) = (window.left, window.top);
    let (right, bottom) = (left.saturating_add(window.side - 1), top.saturating_add(window.side - 1));

    let mut plot = |x: i64, y: i64| {
        if (0..width).contains(&x) && (0..height).contains(&y) {
            image.put_pixel(x as u32, y as u32, color);
        }
    };

    for x in left.max(0)..=right.min(width - 1) {
        plot(x, top);
        plot(x, bottom);
    }
    for y in top.max(0)..=bottom.min(height - 1) {
        plot(left, y);
        plot(right, y);
    }
}

/// The region under `estimate`, scaled to a fixed-size square for inspection.
pub fn estimate_crop(frame: &Frame, estimate: &Particle) -> Option<RgbImage> {
    let region = frame.extract(estimate).ok()?;
    Some(imageops::resize(&region.to_image(), CROP_SIDE, CROP_SIDE, FilterType::Triangle))
}

pub fn save_png(path: &Path, image: &RgbImage) -> Result<(), image::ImageError> {
    let output = std::fs::File::create(path)?;
    let encoder = image::codecs::png::PngEncoder::new(output);
    encoder.write_image(image.as_raw(), image.width(), image.height(), image::ExtendedColorType::Rgb8)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_only_the_outline() {
        let mut image = RgbImage::new(20, 20);
        draw_square(&mut image, &Particle::new(10.0, 10.0, 6.0), PARTICLE_COLOR);

        assert_eq!(*image.get_pixel(7, 7), PARTICLE_COLOR);
        assert_eq!(*image.get_pixel(12, 12), PARTICLE_COLOR);
        assert_eq!(*image.get_pixel(7, 12), PARTICLE_COLOR);
        assert_eq!(*image.get_pixel(10, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn squares_outside_the_image_are_clipped() {
        let mut image = RgbImage::new(10, 10);
        draw_square(&mut image, &Particle::new(0.0, 0.0, 8.0), ESTIMATE_COLOR);
        draw_square(&mut image, &Particle::new(500.0, 500.0, 8.0), ESTIMATE_COLOR);
        draw_square(&mut image, &Particle::new(5.0, 5.0, -1.0), ESTIMATE_COLOR);

        assert_eq!(*image.get_pixel(3, 0), ESTIMATE_COLOR);
        assert_eq!(*image.get_pixel(0, 3), ESTIMATE_COLOR);
        assert_eq!(*image.get_pixel(9, 9), Rgb([0, 0, 0]));
    }

    #[test]
    fn far_away_squares_do_not_overflow() {
        let mut image = RgbImage::new(10, 10);
        draw_square(&mut image, &Particle::new(1e30, 1e30, 8.0), ESTIMATE_COLOR);
        draw_square(&mut image, &Particle::new(-1e30, -1e30, 1e30), ESTIMATE_COLOR);
        assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn crop_has_fixed_size() {
        let frame = Frame::new(RgbImage::from_pixel(64, 64, Rgb([9, 9, 9])));
        let crop = estimate_crop(&frame, &Particle::new(32.0, 32.0, 16.0)).unwrap();
        assert_eq!(crop.dimensions(), (CROP_SIDE, CROP_SIDE));
        assert!(estimate_crop(&frame, &Particle::new(-100.0, 32.0, 16.0)).is_none());
    }

    #[test]
    fn saved_png_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let image = RgbImage::from_pixel(4, 3, Rgb([1, 2, 3]));
        save_png(&path, &image).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8(), image);
    }
}
