use crate::Image;
use image::{ImageBuffer, Rgb};
use itertools::iproduct;

/// Edge-preserving bilateral smoothing of an RGB plane
///
/// Neighbours inside a `(2 * radius + 1)^2` square are weighted by a
/// spatial Gaussian and by a Gaussian of their colour distance to the
/// centre pixel, so strong colour edges survive the blur. Out-of-image
/// neighbours are skipped.
pub struct BilateralFilter {
    radius: u32,
    color_coeff: f32,
    spatial_weights: Vec<f32>,
}

impl BilateralFilter {
    /// Sigmas must be positive; callers validate them through the config.
    pub fn new(radius: u32, sigma_color: f32, sigma_space: f32) -> Self {
        let r = radius as i32;
        let space_coeff = -0.5 / (sigma_space * sigma_space);
        let spatial_weights = iproduct!(-r..=r, -r..=r)
            .map(|(dy, dx)| (((dx * dx + dy * dy) as f32) * space_coeff).exp())
            .collect();

        Self {
            radius,
            color_coeff: -0.5 / (sigma_color * sigma_color),
            spatial_weights,
        }
    }

    pub fn filter(&self, image: &Image<Rgb<f32>>) -> Image<Rgb<f32>> {
        let (width, height) = image.dimensions();
        let r = self.radius as i32;
        let side = 2 * r + 1;

        ImageBuffer::from_fn(width, height, |x, y| {
            let centre = image.get_pixel(x, y);
            let mut sum = [0.0f32; 3];
            let mut weight_sum = 0.0f32;

            for (dy, dx) in iproduct!(-r..=r, -r..=r) {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                    continue;
                }
                let neighbour = image.get_pixel(nx as u32, ny as u32);
                let color_dist_sq: f32 = (0..3)
                    .map(|c| (neighbour[c] - centre[c]) * (neighbour[c] - centre[c]))
                    .sum();
                let weight = self.spatial_weights[((dy + r) * side + dx + r) as usize]
                    * (color_dist_sq * self.color_coeff).exp();

                for c in 0..3 {
                    sum[c] += neighbour[c] * weight;
                }
                weight_sum += weight;
            }

            // the centre pixel always contributes weight 1
            Rgb(sum.map(|s| s / weight_sum))
        })
    }
}
