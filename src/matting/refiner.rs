use crate::config::RefinerConfig;
use crate::error::MattingResult;
use crate::matting::color::gray_plane;
use crate::matting::guided_filter::GuidedFilter;
use crate::matting::trimap::{Trimap, TrimapLabel};
use crate::utils::validate_matching_dimensions;
use crate::Image;
use image::{Luma, Rgb};

/// Refines alpha inside the trimap's unknown band
///
/// A gray-guided filter fitted on the initial alpha gives an edge-aware
/// estimate; it replaces alpha at unknown pixels only. Foreground and
/// background pixels pass through bit for bit. This is a local
/// approximation of closed-form matting: no global system is solved.
///
/// # Errors
///
/// * `MattingError::DimensionMismatch` - image, trimap and alpha differ in size
pub fn refine(
    image: &Image<Rgb<u8>>,
    trimap: &Trimap,
    alpha_init: &Image<Luma<f32>>,
    config: &RefinerConfig,
) -> MattingResult<Image<Luma<f32>>> {
    validate_matching_dimensions(image, alpha_init)?;
    if trimap.dimensions() != image.dimensions() {
        return Err(crate::MattingError::DimensionMismatch {
            expected: image.dimensions(),
            actual: trimap.dimensions(),
        });
    }

    let mut alpha = alpha_init.clone();
    if trimap.count(TrimapLabel::Unknown) == 0 {
        return Ok(alpha);
    }

    let guide = gray_plane(image);
    let estimate = GuidedFilter::new(&guide, config.radius, config.epsilon)?.filter(alpha_init)?;

    for ((out, est), label) in alpha
        .pixels_mut()
        .zip(estimate.pixels())
        .zip(trimap.labels())
    {
        if *label == TrimapLabel::Unknown {
            out[0] = est[0].clamp(0.0, 1.0);
        }
    }

    Ok(alpha)
}
