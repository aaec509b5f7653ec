use crate::config::CompositeConfig;
use crate::error::MattingResult;
use crate::matting::color::lightness;
use crate::utils::{
    alpha_mask, clamp_unit, dilate_disc, to_channel, validate_matching_dimensions, MASK_ON,
};
use crate::Image;
use image::{ImageBuffer, Luma, Rgb, Rgba};

/// Alpha-over blend onto a flat background
///
/// `result = image * alpha + background * (1 - alpha)` per channel. Before
/// blending, alpha below `noise_alpha` is dropped on light pixels that lie
/// outside the `near_radius` band around the foreground; every other pixel
/// keeps its alpha, so translucent hair survives.
///
/// # Errors
///
/// * `MattingError::DimensionMismatch` - image and alpha differ in size
pub fn composite(
    image: &Image<Rgb<u8>>,
    alpha: &Image<Luma<f32>>,
    background: Rgb<u8>,
    config: &CompositeConfig,
) -> MattingResult<Image<Rgb<u8>>> {
    validate_matching_dimensions(image, alpha)?;

    let anchors = alpha_mask(alpha, |a| a > config.foreground_alpha);
    let near = dilate_disc(&anchors, config.near_radius);

    Ok(ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let pixel = *image.get_pixel(x, y);
        let mut a = clamp_unit(alpha.get_pixel(x, y)[0]);
        if a < config.noise_alpha
            && near.get_pixel(x, y)[0] != MASK_ON
            && lightness(pixel) > config.noise_lightness
        {
            a = 0.0;
        }

        Rgb([0, 1, 2].map(|c| {
            to_channel(f32::from(pixel[c]) * a + f32::from(background[c]) * (1.0 - a))
        }))
    }))
}

/// Packs colour and alpha into an 8-bit RGBA cutout
///
/// # Errors
///
/// * `MattingError::DimensionMismatch` - image and alpha differ in size
pub fn to_rgba(image: &Image<Rgb<u8>>, alpha: &Image<Luma<f32>>) -> MattingResult<Image<Rgba<u8>>> {
    validate_matching_dimensions(image, alpha)?;
    Ok(ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        let a = to_channel(clamp_unit(alpha.get_pixel(x, y)[0]) * 255.0);
        Rgba([r, g, b, a])
    }))
}
