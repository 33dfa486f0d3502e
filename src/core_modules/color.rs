// THEORY:
// Color histograms are far more stable under lighting changes when they are built
// in a perceptual space. This module converts 8-bit RGB frames into 8-bit CIE
// L*a*b* (D65 white point), packed so each channel still fits in a `u8`:
// `L` scaled from [0, 100] to [0, 255], `a` and `b` offset by 128.
//
// The tracker itself never looks at color; the conversion is applied once per
// frame before any particle is evaluated.

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

const LAB_THRESHOLD: f64 = 0.008_856;
const D65_WHITE_X: f64 = 0.950_456;
const D65_WHITE_Z: f64 = 1.088_754;

/// The color space particle histograms are computed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// Raw 8-bit RGB, untouched.
    Rgb,
    /// 8-bit packed CIE L*a*b*.
    #[default]
    Lab,
}

impl ColorSpace {
    /// Converts a whole image into this color space.
    pub fn convert(self, image: &RgbImage) -> RgbImage {
        match self {
            ColorSpace::Rgb => image.clone(),
            ColorSpace::Lab => {
                let mut out = RgbImage::new(image.width(), image.height());
                for (src, dst) in image.pixels().zip(out.pixels_mut()) {
                    *dst = rgb_to_lab(*src);
                }
                out
            }
        }
    }
}

fn srgb_to_linear(channel: u8) -> f64 {
    let v = channel as f64 / 255.0;
    if v <= 0.040_45 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn lab_f(t: f64) -> f64 {
    if t > LAB_THRESHOLD {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

/// Converts a single 8-bit RGB pixel to packed 8-bit L*a*b*.
pub fn rgb_to_lab(pixel: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = pixel.0;
    let (r, g, b) = (srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b));

    let x = (0.412_453 * r + 0.357_580 * g + 0.180_423 * b) / D65_WHITE_X;
    let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
    let z = (0.019_334 * r + 0.119_193 * g + 0.950_227 * b) / D65_WHITE_Z;

    let l = if y > LAB_THRESHOLD { 116.0 * y.cbrt() - 16.0 } else { 903.3 * y };
    let a = 500.0 * (lab_f(x) - lab_f(y));
    let b = 200.0 * (lab_f(y) - lab_f(z));

    let pack = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    Rgb([pack(l * 255.0 / 100.0), pack(a + 128.0), pack(b + 128.0)])
}
