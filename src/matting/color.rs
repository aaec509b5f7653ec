//! Colour conversions used by the matting stages.
//!
//! Lightness follows CIE L*a*b* under a D65 white point with sRGB gamma,
//! normalised so `L = 1.0` is white.

use crate::utils::to_channel;
use crate::Image;
use image::{Luma, Rgb};
use imageproc::map::map_colors;

const WHITE_X: f32 = 0.950_456;
const WHITE_Z: f32 = 1.088_754;
const LAB_EPSILON: f32 = 0.008_856;
const LAB_KAPPA: f32 = 903.3;

/// A colour in CIE L*a*b*, with `l` in `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

/// Rec. 601 luma in `[0, 1]`
#[inline]
pub fn luma(pixel: Rgb<u8>) -> f32 {
    let Rgb([r, g, b]) = pixel;
    (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)) / 255.0
}

/// Grayscale guide plane in `[0, 1]`
pub fn gray_plane(image: &Image<Rgb<u8>>) -> Image<Luma<f32>> {
    map_colors(image, |p| Luma([luma(p)]))
}

/// Perceptual lightness in `[0, 1]`
#[inline]
pub fn lightness(pixel: Rgb<u8>) -> f32 {
    rgb_to_lab(pixel).l / 100.0
}

/// Lightness plane in `[0, 1]`
pub fn lightness_plane(image: &Image<Rgb<u8>>) -> Image<Luma<f32>> {
    map_colors(image, |p| Luma([lightness(p)]))
}

#[inline]
fn srgb_to_linear(channel: u8) -> f32 {
    let c = f32::from(channel) / 255.0;
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    let encoded = if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    encoded * 255.0
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

#[inline]
fn lab_f_inv(f: f32) -> f32 {
    let cubed = f * f * f;
    if cubed > LAB_EPSILON {
        cubed
    } else {
        (f - 16.0 / 116.0) / 7.787
    }
}

/// Converts an 8-bit sRGB pixel to L*a*b*
pub fn rgb_to_lab(pixel: Rgb<u8>) -> Lab {
    let Rgb([r, g, b]) = pixel;
    let (r, g, b) = (srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b));

    let x = (0.412_453 * r + 0.357_580 * g + 0.180_423 * b) / WHITE_X;
    let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
    let z = (0.019_334 * r + 0.119_193 * g + 0.950_227 * b) / WHITE_Z;

    let l = if y > LAB_EPSILON {
        116.0 * y.cbrt() - 16.0
    } else {
        LAB_KAPPA * y
    };
    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));

    Lab {
        l,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// Converts L*a*b* back to an 8-bit sRGB pixel, clamping out-of-gamut values
pub fn lab_to_rgb(lab: Lab) -> Rgb<u8> {
    let fy = (lab.l + 16.0) / 116.0;
    let fx = fy + lab.a / 500.0;
    let fz = fy - lab.b / 200.0;

    let y = if lab.l > LAB_KAPPA * LAB_EPSILON {
        fy * fy * fy
    } else {
        lab.l / LAB_KAPPA
    };
    let x = lab_f_inv(fx) * WHITE_X;
    let z = lab_f_inv(fz) * WHITE_Z;

    let r = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let g = -0.969_256 * x + 1.875_992 * y + 0.041_556 * z;
    let b = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;

    Rgb([
        to_channel(linear_to_srgb(r)),
        to_channel(linear_to_srgb(g)),
        to_channel(linear_to_srgb(b)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lightness_spans_unit_range() {
        assert!(lightness(Rgb([0, 0, 0])).abs() < 1e-4);
        assert!((lightness(Rgb([255, 255, 255])) - 1.0).abs() < 1e-3);
        let grey = lightness(Rgb([119, 119, 119]));
        assert!(grey > 0.45 && grey < 0.55);
    }

    #[test]
    fn white_has_neutral_chroma() {
        let lab = rgb_to_lab(Rgb([255, 255, 255]));
        assert!(lab.a.abs() < 0.5);
        assert!(lab.b.abs() < 0.5);
    }

    #[test]
    fn lab_round_trip_is_close() {
        for pixel in [Rgb([200, 150, 100]), Rgb([12, 80, 220]), Rgb([3, 3, 3])] {
            let back = lab_to_rgb(rgb_to_lab(pixel));
            for c in 0..3 {
                assert!((i16::from(back[c]) - i16::from(pixel[c])).abs() <= 1);
            }
        }
    }

    #[test]
    fn luma_weights_green_most() {
        assert!(luma(Rgb([0, 255, 0])) > luma(Rgb([255, 0, 0])));
        assert!((luma(Rgb([255, 255, 255])) - 1.0).abs() < 1e-6);
    }
}
