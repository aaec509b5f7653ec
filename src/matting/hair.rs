//! Recovery of hair strands the coarse segmentation cuts off.
//!
//! Alpha is pushed outward into dark, hair-coloured pixels near the subject,
//! decaying with distance from the solid foreground.

use crate::config::HairConfig;
use crate::error::MattingResult;
use crate::matting::color::{gray_plane, lightness_plane};
use crate::matting::guided_filter::GuidedFilterExt;
use crate::utils::{
    alpha_mask, dilate_disc, distance_to_mask, validate_matching_dimensions, MASK_ON,
};
use crate::Image;
use image::{Luma, Rgb};
use tracing::debug;

impl HairConfig {
    /// Whether a pixel of this lightness may be hair
    #[inline]
    fn is_hair_colored(&self, lightness: f32) -> bool {
        lightness < self.dark_lightness
            || (self.medium_lightness_min..self.medium_lightness_max).contains(&lightness)
    }

    /// Boost for a cut-off candidate at `distance` from solid foreground
    #[inline]
    fn extension_alpha(&self, distance: f32, lightness: f32) -> f32 {
        let normalized = (distance / self.max_extension).clamp(0.0, 1.0);
        let falloff = (1.0 - normalized).powf(self.falloff_exponent);
        let darkness = ((self.darkness_ceiling - lightness) / self.darkness_range).clamp(0.0, 1.0);
        self.extension_strength * falloff * (0.5 + 0.5 * darkness)
    }
}

/// Extends alpha into hair-coloured pixels around the subject
///
/// # Errors
///
/// * `MattingError::DimensionMismatch` - image and alpha differ in size
pub fn recover(
    image: &Image<Rgb<u8>>,
    alpha: &Image<Luma<f32>>,
    config: &HairConfig,
) -> MattingResult<Image<Luma<f32>>> {
    validate_matching_dimensions(image, alpha)?;

    let lightness = lightness_plane(image);
    let solid = alpha_mask(alpha, |a| a > config.solid_alpha);
    let seeds = alpha_mask(alpha, |a| a > config.seed_alpha);
    let search_zone = dilate_disc(&seeds, config.search_radius);
    let distance = distance_to_mask(&solid);

    let mut extended = alpha.clone();
    let mut candidates = 0usize;

    for (x, y, out) in extended.enumerate_pixels_mut() {
        let a = out[0];
        let l = lightness.get_pixel(x, y)[0];
        if !config.is_hair_colored(l) {
            continue;
        }

        let mut boosted = a;
        if a > config.weak_alpha_min && a < config.weak_alpha_max {
            boosted = a.mul_add(config.weak_gain, config.weak_offset).clamp(0.0, 1.0);
        }

        if search_zone.get_pixel(x, y)[0] == MASK_ON && a < config.candidate_alpha {
            candidates += 1;
            let d = distance.get_pixel(x, y)[0];
            boosted = boosted.max(config.extension_alpha(d, l));
        }

        out[0] = boosted;
    }
    debug!(candidates, "hair candidates boosted");

    let guide = gray_plane(image);
    let mut smoothed =
        extended.guided_filter(&guide, config.smoothing_radius, config.smoothing_epsilon)?;

    for (x, y, out) in smoothed.enumerate_pixels_mut() {
        let a = out[0].clamp(0.0, 1.0);
        let far = distance.get_pixel(x, y)[0] > config.noise_distance;
        let light = lightness.get_pixel(x, y)[0] > config.noise_lightness;

        out[0] = if a < config.noise_alpha && far && light {
            0.0
        } else if a > config.solidify_threshold {
            1.0
        } else {
            a
        };
    }

    Ok(smoothed)
}
