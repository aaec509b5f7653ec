use crate::config::EnhanceConfig;
use crate::matting::bilateral::BilateralFilter;
use crate::matting::color::{lab_to_rgb, rgb_to_lab};
use crate::utils::to_channel;
use crate::Image;
use image::{ImageBuffer, Rgb};
use imageproc::map::map_colors;
use itertools::iproduct;

/// Adds `lift` to L* of every pixel
fn lift_lightness(image: &Image<Rgb<u8>>, lift: f32) -> Image<Rgb<u8>> {
    map_colors(image, |p| {
        let mut lab = rgb_to_lab(p);
        lab.l = (lab.l + lift).clamp(0.0, 100.0);
        lab_to_rgb(lab)
    })
}

/// 3x3 unsharp kernel: neighbours `-amount`, centre `1 + 8 * amount`
///
/// The kernel sums to one, so flat regions are unchanged. Borders are
/// replicated and results saturate to the 8-bit range.
fn sharpen(image: &Image<Rgb<u8>>, amount: f32) -> Image<Rgb<u8>> {
    let (width, height) = image.dimensions();
    let centre_weight = 1.0 + 8.0 * amount;

    ImageBuffer::from_fn(width, height, |x, y| {
        let mut acc = [0.0f32; 3];
        for (dy, dx) in iproduct!(-1i64..=1, -1i64..=1) {
            let nx = (i64::from(x) + dx).clamp(0, i64::from(width) - 1) as u32;
            let ny = (i64::from(y) + dy).clamp(0, i64::from(height) - 1) as u32;
            let weight = if dx == 0 && dy == 0 { centre_weight } else { -amount };
            let neighbour = image.get_pixel(nx, ny);
            for (sum, &value) in acc.iter_mut().zip(&neighbour.0) {
                *sum += weight * f32::from(value);
            }
        }
        Rgb(acc.map(to_channel))
    })
}

/// Cosmetic finish for passport output: lightness lift, mild sharpening
/// and light bilateral denoising
///
/// Dimensions are preserved. Returns the input unchanged when disabled.
pub fn enhance(image: &Image<Rgb<u8>>, config: &EnhanceConfig) -> Image<Rgb<u8>> {
    if !config.enabled || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let lifted = lift_lightness(image, config.lightness_lift);
    let sharpened = sharpen(&lifted, config.sharpen_amount);

    let denoiser = BilateralFilter::new(
        config.bilateral_radius,
        config.bilateral_sigma_color,
        config.bilateral_sigma_space,
    );
    let denoised = denoiser.filter(&map_colors(&sharpened, |p| Rgb(p.0.map(f32::from))));
    map_colors(&denoised, |p| Rgb(p.0.map(to_channel)))
}
