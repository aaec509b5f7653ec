use crate::config::CleanupConfig;
use crate::utils::{dilate_disc, MASK_ON};
use crate::Image;
use image::{ImageBuffer, Luma};
use imageproc::map::map_colors;

/// `|Gx| + |Gy|` of the 3x3 Sobel operator, borders replicated
pub fn gradient_magnitude(alpha: &Image<Luma<f32>>) -> Image<Luma<f32>> {
    let (width, height) = alpha.dimensions();
    if width == 0 || height == 0 {
        return ImageBuffer::new(width, height);
    }

    let at = |x: i64, y: i64| {
        let cx = x.clamp(0, i64::from(width) - 1) as u32;
        let cy = y.clamp(0, i64::from(height) - 1) as u32;
        alpha.get_pixel(cx, cy)[0]
    };

    ImageBuffer::from_fn(width, height, |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        let gx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
            - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
        let gy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
            - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
        Luma([gx.abs() + gy.abs()])
    })
}

/// Pixels close enough to an alpha edge that they must not be zeroed
fn protected_zone(alpha: &Image<Luma<f32>>, config: &CleanupConfig) -> Image<Luma<u8>> {
    let edges = map_colors(&gradient_magnitude(alpha), |g| {
        Luma([if g[0] > config.gradient_threshold { MASK_ON } else { 0 }])
    });
    dilate_disc(&edges, config.edge_protection_radius)
}

/// Removes isolated near-zero alpha while keeping soft edge gradients
///
/// Alpha above `solidify_threshold` becomes exactly 1. Pixels below
/// `noise_threshold` are zeroed unless they lie within
/// `edge_protection_radius` of an alpha edge. Zeroing can move edges, so
/// the protected zone is recomputed until no further pixel is cleared;
/// this makes the operation idempotent.
pub fn cleanup(alpha: &Image<Luma<f32>>, config: &CleanupConfig) -> Image<Luma<f32>> {
    let mut clean = map_colors(alpha, |a| {
        let a = a[0].clamp(0.0, 1.0);
        Luma([if a > config.solidify_threshold { 1.0 } else { a }])
    });
    if clean.width() == 0 || clean.height() == 0 {
        return clean;
    }

    loop {
        let protected = protected_zone(&clean, config);
        let mut cleared = 0usize;
        for (out, guard) in clean.pixels_mut().zip(protected.pixels()) {
            if out[0] > 0.0 && out[0] < config.noise_threshold && guard[0] != MASK_ON {
                out[0] = 0.0;
                cleared += 1;
            }
        }
        // each pass clears at least one non-zero pixel, so this terminates
        if cleared == 0 {
            break;
        }
    }

    clean
}

/// S-curve contrast around 0.5: `0.5 + c * (1 + s * (1 - 4c^2))` with
/// `c = alpha - 0.5`, clamped to `[0, 1]`
///
/// Steepens mid-range transitions while leaving 0, 0.5 and 1 fixed.
pub fn soft_contrast(alpha: &Image<Luma<f32>>, strength: f32) -> Image<Luma<f32>> {
    map_colors(alpha, |a| {
        let c = a[0] - 0.5;
        let curved = 0.5 + c * (1.0 + strength * (1.0 - 4.0 * c * c));
        Luma([curved.clamp(0.0, 1.0)])
    })
}
