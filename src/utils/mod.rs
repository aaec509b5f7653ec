//! Internal utility functions for portrait-matte.
//!
//! This module contains common functionality used across the matting stages.

use crate::error::{MattingError, MattingResult};
use crate::Image;
use image::{Luma, Pixel};
use imageproc::distance_transform::{euclidean_squared_distance_transform, Norm};
use imageproc::morphology;

/// Value written into binary masks for set pixels.
pub const MASK_ON: u8 = 255;

/// Clamps a floating-point value to the unit interval.
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Rounds and clamps a floating-point intensity to an 8-bit channel.
#[inline]
pub fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Validates that an image has non-zero dimensions.
pub fn validate_non_empty_image(width: u32, height: u32) -> MattingResult<()> {
    if width == 0 || height == 0 {
        Err(MattingError::EmptyImage)
    } else {
        Ok(())
    }
}

/// Validates that two images have matching dimensions.
pub fn validate_matching_dimensions<P1, P2>(
    expected: &Image<P1>,
    actual: &Image<P2>,
) -> MattingResult<()>
where
    P1: Pixel,
    P2: Pixel,
{
    if expected.dimensions() != actual.dimensions() {
        return Err(MattingError::DimensionMismatch {
            expected: expected.dimensions(),
            actual: actual.dimensions(),
        });
    }
    Ok(())
}

/// Builds a binary mask from an alpha map and a per-pixel predicate.
pub fn alpha_mask<F>(alpha: &Image<Luma<f32>>, predicate: F) -> Image<Luma<u8>>
where
    F: Fn(f32) -> bool,
{
    imageproc::map::map_colors(alpha, |p| {
        Luma([if predicate(p[0]) { MASK_ON } else { 0 }])
    })
}

/// Dilates a binary mask with a disc of the given radius.
///
/// Radii above 255 saturate; a radius of zero returns the mask unchanged.
pub fn dilate_disc(mask: &Image<Luma<u8>>, radius: u32) -> Image<Luma<u8>> {
    if radius == 0 {
        return mask.clone();
    }
    morphology::dilate(mask, Norm::L2, radius.min(255) as u8)
}

/// Erodes a binary mask with a disc of the given radius.
pub fn erode_disc(mask: &Image<Luma<u8>>, radius: u32) -> Image<Luma<u8>> {
    if radius == 0 {
        return mask.clone();
    }
    morphology::erode(mask, Norm::L2, radius.min(255) as u8)
}

/// Euclidean distance from every pixel to the nearest set pixel of `mask`.
///
/// When the mask is empty every distance is `f32::INFINITY`.
pub fn distance_to_mask(mask: &Image<Luma<u8>>) -> Image<Luma<f32>> {
    let (width, height) = mask.dimensions();
    if mask.pixels().all(|p| p[0] == 0) {
        return Image::from_pixel(width, height, Luma([f32::INFINITY]));
    }
    let squared = euclidean_squared_distance_transform(mask);
    imageproc::map::map_colors(&squared, |p| Luma([p[0].sqrt() as f32]))
}

/// Mean value of an alpha map, used for log output.
pub fn mean_alpha(alpha: &Image<Luma<f32>>) -> f32 {
    let count = alpha.as_raw().len();
    if count == 0 {
        return 0.0;
    }
    alpha.as_raw().iter().map(|&a| f64::from(a)).sum::<f64>() as f32 / count as f32
}
