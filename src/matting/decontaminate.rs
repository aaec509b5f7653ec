//! Removal of background colour bleeding into translucent edge pixels.
//!
//! Solid foreground colour is pushed outward into the edge band with a
//! normalised Gaussian convolution, then blended in with a weight that grows
//! as alpha falls. Grey edge pixels are pulled toward the median colour of
//! the solid foreground near the edge, and a light bilateral pass smooths
//! what remains. Pixels above `solid_alpha` are returned bit for bit.

use crate::config::DecontaminationConfig;
use crate::error::MattingResult;
use crate::matting::bilateral::BilateralFilter;
use crate::utils::{alpha_mask, dilate_disc, to_channel, validate_matching_dimensions, MASK_ON};
use crate::Image;
use image::{ImageBuffer, Luma, Rgb};
use imageproc::filter::gaussian_blur_f32;
use imageproc::map::map_colors;
use tracing::debug;

#[inline]
fn is_on(mask: &Image<Luma<u8>>, x: u32, y: u32) -> bool {
    mask.get_pixel(x, y)[0] == MASK_ON
}

#[inline]
fn lerp(from: &Rgb<f32>, to: &Rgb<f32>, weight: f32) -> Rgb<f32> {
    Rgb([0, 1, 2].map(|c| from[c] + (to[c] - from[c]) * weight))
}

fn channel_plane(image: &Image<Rgb<f32>>, channel: usize) -> Image<Luma<f32>> {
    map_colors(image, |p| Luma([p[channel]]))
}

/// Fills non-solid pixels with colour diffused from the solid region
///
/// Each pass blurs the known colour and the known mask; wherever the blurred
/// mask exceeds `known_threshold`, the pixel takes the ratio and becomes
/// known. Pixels never reached keep their original colour.
fn propagate_colors(
    original: &Image<Rgb<f32>>,
    solid: &Image<Luma<u8>>,
    config: &DecontaminationConfig,
) -> Image<Rgb<f32>> {
    let (width, height) = original.dimensions();
    let mut known: Image<Luma<f32>> =
        map_colors(solid, |m| Luma([if m[0] == MASK_ON { 1.0 } else { 0.0 }]));
    let mut planes = [0, 1, 2].map(|c| {
        let mut plane = channel_plane(original, c);
        for (value, k) in plane.pixels_mut().zip(known.pixels()) {
            value[0] *= k[0];
        }
        plane
    });

    for _ in 0..config.iterations {
        let reach = gaussian_blur_f32(&known, config.propagation_sigma);
        let sums = [0, 1, 2].map(|c| gaussian_blur_f32(&planes[c], config.propagation_sigma));

        for (x, y, weight) in reach.enumerate_pixels() {
            if weight[0] <= config.known_threshold || is_on(solid, x, y) {
                continue;
            }
            let denominator = weight[0].max(config.known_threshold);
            for (plane, sum) in planes.iter_mut().zip(&sums) {
                plane.get_pixel_mut(x, y)[0] = sum.get_pixel(x, y)[0] / denominator;
            }
            known.get_pixel_mut(x, y)[0] = 1.0;
        }
    }

    ImageBuffer::from_fn(width, height, |x, y| {
        if known.get_pixel(x, y)[0] > 0.0 {
            Rgb([0, 1, 2].map(|c| planes[c].get_pixel(x, y)[0]))
        } else {
            *original.get_pixel(x, y)
        }
    })
}

/// Per-channel median of solid pixels within `sample_radius` of the edge
///
/// Returns `None` when fewer than `min_samples` such pixels exist.
fn median_edge_color(
    image: &Image<Rgb<u8>>,
    solid: &Image<Luma<u8>>,
    config: &DecontaminationConfig,
) -> Option<Rgb<f32>> {
    let not_solid = map_colors(solid, |m| Luma([MASK_ON - m[0]]));
    let near_edge = dilate_disc(&not_solid, config.sample_radius);

    let mut channels: [Vec<u8>; 3] = Default::default();
    for (x, y, pixel) in image.enumerate_pixels() {
        if is_on(solid, x, y) && is_on(&near_edge, x, y) {
            for (samples, value) in channels.iter_mut().zip(pixel.0) {
                samples.push(value);
            }
        }
    }

    if channels[0].len() <= config.min_samples {
        return None;
    }

    Some(Rgb(channels.map(|mut samples| {
        samples.sort_unstable();
        let mid = samples.len() / 2;
        if samples.len() % 2 == 0 {
            (f32::from(samples[mid - 1]) + f32::from(samples[mid])) / 2.0
        } else {
            f32::from(samples[mid])
        }
    })))
}

/// Mean absolute deviation of the channels from their mean
#[inline]
fn color_deviation(pixel: &Rgb<f32>) -> f32 {
    let mean = (pixel[0] + pixel[1] + pixel[2]) / 3.0;
    pixel.0.iter().map(|v| (v - mean).abs()).sum::<f32>() / 3.0
}

/// Strips background colour from the translucent edge band
///
/// # Errors
///
/// * `MattingError::DimensionMismatch` - image and alpha differ in size
pub fn decontaminate(
    image: &Image<Rgb<u8>>,
    alpha: &Image<Luma<f32>>,
    config: &DecontaminationConfig,
) -> MattingResult<Image<Rgb<u8>>> {
    validate_matching_dimensions(image, alpha)?;
    let (width, height) = image.dimensions();

    let solid = alpha_mask(alpha, |a| a > config.solid_alpha);
    let edge = alpha_mask(alpha, |a| a > config.edge_alpha_min && a <= config.solid_alpha);
    let any = |mask: &Image<Luma<u8>>| mask.pixels().any(|m| m[0] == MASK_ON);
    if !any(&edge) || !any(&solid) {
        debug!("no edge band to decontaminate");
        return Ok(image.clone());
    }

    let original: Image<Rgb<f32>> = map_colors(image, |p| Rgb(p.0.map(f32::from)));
    let propagated = propagate_colors(&original, &solid, config);

    let raw_blend = ImageBuffer::from_fn(width, height, |x, y| {
        let a = alpha.get_pixel(x, y)[0].clamp(0.0, 1.0);
        Luma([if is_on(&edge, x, y) {
            (1.0 - a.sqrt()).clamp(0.0, config.max_blend)
        } else {
            0.0
        }])
    });
    let blend = gaussian_blur_f32(&raw_blend, config.blend_sigma);

    let mut result: Image<Rgb<f32>> = ImageBuffer::from_fn(width, height, |x, y| {
        lerp(
            original.get_pixel(x, y),
            propagated.get_pixel(x, y),
            blend.get_pixel(x, y)[0],
        )
    });

    if let Some(reference) = median_edge_color(image, &solid, config) {
        let raw_grey = ImageBuffer::from_fn(width, height, |x, y| {
            let a = alpha.get_pixel(x, y)[0];
            let grey = color_deviation(result.get_pixel(x, y)) < config.grey_deviation
                && is_on(&edge, x, y)
                && a < config.grey_alpha_max;
            Luma([if grey { (1.0 - a) * config.grey_strength } else { 0.0 }])
        });
        let grey_blend = gaussian_blur_f32(&raw_grey, config.blend_sigma);
        for (x, y, pixel) in result.enumerate_pixels_mut() {
            *pixel = lerp(pixel, &reference, grey_blend.get_pixel(x, y)[0]);
        }
    } else {
        debug!("too few solid edge samples for grey correction");
    }

    let smoothed = BilateralFilter::new(
        config.bilateral_radius,
        config.bilateral_sigma_color,
        config.bilateral_sigma_space,
    )
    .filter(&result);
    let raw_smoothing = map_colors(&edge, |m| {
        Luma([if m[0] == MASK_ON { config.smoothing_strength } else { 0.0 }])
    });
    let smoothing = gaussian_blur_f32(&raw_smoothing, config.smoothing_sigma);

    Ok(ImageBuffer::from_fn(width, height, |x, y| {
        if is_on(&solid, x, y) {
            return *image.get_pixel(x, y);
        }
        let mixed = lerp(
            result.get_pixel(x, y),
            smoothed.get_pixel(x, y),
            smoothing.get_pixel(x, y)[0],
        );
        Rgb(mixed.0.map(to_channel))
    }))
}
