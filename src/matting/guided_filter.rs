use crate::error::FilterError;
use crate::matting::box_filter::BoxFilter;
use crate::Image;
use image::{ImageBuffer, Luma};
use imageproc::map::{map_colors, map_colors2};

/// Extension trait for guided filtering of single channel `f32` planes
pub trait GuidedFilterExt {
    /// Smooths `self` while following the edges of `guide`
    ///
    /// # Errors
    ///
    /// * `FilterError::InvalidRadius` - radius is zero
    /// * `FilterError::InvalidEpsilon` - epsilon is not strictly positive
    /// * `FilterError::DimensionMismatch` - guide and input sizes differ
    fn guided_filter(
        &self,
        guide: &Image<Luma<f32>>,
        radius: u32,
        epsilon: f32,
    ) -> Result<Image<Luma<f32>>, FilterError>;
}

impl GuidedFilterExt for Image<Luma<f32>> {
    fn guided_filter(
        &self,
        guide: &Image<Luma<f32>>,
        radius: u32,
        epsilon: f32,
    ) -> Result<Image<Luma<f32>>, FilterError> {
        GuidedFilter::new(guide, radius, epsilon)?.filter(self)
    }
}

fn validate_guided_filter_params(radius: u32, epsilon: f32) -> Result<(), FilterError> {
    if radius == 0 {
        return Err(FilterError::InvalidRadius { radius });
    }
    if epsilon.is_nan() || epsilon <= 0.0 {
        return Err(FilterError::InvalidEpsilon { epsilon });
    }
    Ok(())
}

fn to_f64_plane(image: &Image<Luma<f32>>) -> Image<Luma<f64>> {
    map_colors(image, |p| Luma([f64::from(p[0])]))
}

/// Gray-guided filter with the guide statistics precomputed
///
/// Fits `q = a * I + b` in every `(2r + 1)^2` window around a pixel by
/// least squares, then averages the coefficients of all windows covering
/// the pixel. `epsilon` regularises `a` and keeps the division finite on
/// flat guide regions.
pub struct GuidedFilter {
    guide: Image<Luma<f64>>,
    radius: u32,
    epsilon: f64,
    guide_mean: Image<Luma<f64>>,
    guide_var: Image<Luma<f64>>,
}

impl GuidedFilter {
    pub fn new(guide: &Image<Luma<f32>>, radius: u32, epsilon: f32) -> Result<Self, FilterError> {
        validate_guided_filter_params(radius, epsilon)?;

        let guide = to_f64_plane(guide);
        let guide_mean = guide.box_filter_square(radius)?;
        let guide_sq = map_colors(&guide, |p| Luma([p[0] * p[0]]));
        let guide_sq_mean = guide_sq.box_filter_square(radius)?;

        // var(I) = E[I^2] - E[I]^2
        let guide_var = map_colors2(&guide_mean, &guide_sq_mean, |mean, sq_mean| {
            Luma([mean[0].mul_add(-mean[0], sq_mean[0]).max(0.0)])
        });

        Ok(Self {
            guide,
            radius,
            epsilon: f64::from(epsilon),
            guide_mean,
            guide_var,
        })
    }

    pub fn filter(&self, input: &Image<Luma<f32>>) -> Result<Image<Luma<f32>>, FilterError> {
        if input.dimensions() != self.guide.dimensions() {
            return Err(FilterError::DimensionMismatch {
                guide_dims: self.guide.dimensions(),
                input_dims: input.dimensions(),
            });
        }

        let input = to_f64_plane(input);
        let (width, height) = input.dimensions();
        let input_mean = input.box_filter_square(self.radius)?;

        let product = map_colors2(&input, &self.guide, |p, i| Luma([p[0] * i[0]]));
        let product_mean = product.box_filter_square(self.radius)?;

        let mut a: Image<Luma<f64>> = ImageBuffer::new(width, height);
        let mut b: Image<Luma<f64>> = ImageBuffer::new(width, height);

        for (x, y, a_pixel) in a.enumerate_pixels_mut() {
            let ip_mean = product_mean.get_pixel(x, y)[0];
            let p_mean = input_mean.get_pixel(x, y)[0];
            let i_mean = self.guide_mean.get_pixel(x, y)[0];
            let i_var = self.guide_var.get_pixel(x, y)[0];

            // cov(I, p) = E[I * p] - E[I] * E[p]
            let cov = i_mean.mul_add(-p_mean, ip_mean);
            let a_val = cov / (i_var + self.epsilon);
            a_pixel[0] = a_val;
            b.put_pixel(x, y, Luma([a_val.mul_add(-i_mean, p_mean)]));
        }

        let a_mean = a.box_filter_square(self.radius)?;
        let b_mean = b.box_filter_square(self.radius)?;

        let output = a_mean
            .pixels()
            .zip(b_mean.pixels())
            .zip(self.guide.pixels())
            .map(|((a, b), i)| a[0].mul_add(i[0], b[0]) as f32)
            .collect();

        ImageBuffer::from_raw(width, height, output).ok_or(FilterError::EmptyImage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_radius_is_rejected() {
        let guide: Image<Luma<f32>> = ImageBuffer::new(4, 4);
        assert_eq!(
            GuidedFilter::new(&guide, 0, 1e-3).err(),
            Some(FilterError::InvalidRadius { radius: 0 })
        );
    }

    #[test]
    fn non_positive_epsilon_is_rejected() {
        let guide: Image<Luma<f32>> = ImageBuffer::new(4, 4);
        assert!(matches!(
            GuidedFilter::new(&guide, 1, 0.0),
            Err(FilterError::InvalidEpsilon { .. })
        ));
    }

    #[test]
    fn mismatched_input_is_rejected() {
        let guide: Image<Luma<f32>> = ImageBuffer::new(4, 4);
        let input: Image<Luma<f32>> = ImageBuffer::new(3, 4);
        assert!(matches!(
            input.guided_filter(&guide, 1, 1e-3),
            Err(FilterError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn constant_input_is_preserved() {
        let guide: Image<Luma<f32>> =
            ImageBuffer::from_fn(8, 8, |x, y| Luma([((x * 7 + y * 3) % 5) as f32 / 5.0]));
        let input: Image<Luma<f32>> = ImageBuffer::from_pixel(8, 8, Luma([0.6]));
        let output = input.guided_filter(&guide, 2, 1e-4).unwrap();
        for p in output.pixels() {
            assert!((p[0] - 0.6).abs() < 1e-5);
        }
    }

    #[test]
    fn flat_guide_does_not_divide_by_zero() {
        let guide: Image<Luma<f32>> = ImageBuffer::from_pixel(6, 6, Luma([0.5]));
        let input: Image<Luma<f32>> =
            ImageBuffer::from_fn(6, 6, |x, _| Luma([if x < 3 { 0.0 } else { 1.0 }]));
        let output = input.guided_filter(&guide, 1, 1e-6).unwrap();
        assert!(output.pixels().all(|p| p[0].is_finite()));
    }

    #[test]
    fn step_edge_in_guide_is_preserved() {
        let guide: Image<Luma<f32>> =
            ImageBuffer::from_fn(12, 12, |x, _| Luma([if x < 6 { 0.0 } else { 1.0 }]));
        let input = guide.clone();
        let output = input.guided_filter(&guide, 2, 1e-4).unwrap();
        assert!(output.get_pixel(4, 6)[0] < 0.05);
        assert!(output.get_pixel(7, 6)[0] > 0.95);
    }
}
