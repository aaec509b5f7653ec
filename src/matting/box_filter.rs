use crate::error::FilterError;
use crate::matting::summed_area_table::SummedAreaTable;
use crate::Image;
use image::{ImageBuffer, Luma};

/// Box filter backed by a summed-area table
///
/// The cost per pixel is constant regardless of the window size. Windows
/// are truncated at the image border and normalised by the number of
/// pixels they actually cover, so a radius larger than the image is valid
/// and degenerates to the global mean.
pub trait BoxFilter {
    /// Filtered output type
    type Output;

    /// Applies a `(2 * x_radius + 1) x (2 * y_radius + 1)` mean filter
    ///
    /// # Errors
    ///
    /// * `FilterError::EmptyImage` - the image has a zero dimension
    fn box_filter(&self, x_radius: u32, y_radius: u32) -> Result<Self::Output, FilterError>;

    /// Applies a square mean filter
    fn box_filter_square(&self, radius: u32) -> Result<Self::Output, FilterError> {
        self.box_filter(radius, radius)
    }
}

impl BoxFilter for Image<Luma<f32>> {
    type Output = Self;

    fn box_filter(&self, x_radius: u32, y_radius: u32) -> Result<Self::Output, FilterError> {
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 {
            return Err(FilterError::EmptyImage);
        }

        let sat = SummedAreaTable::from_data(self.as_raw(), width, height);
        let means = sat_box_means(&sat, x_radius, y_radius);
        ImageBuffer::from_raw(width, height, means.into_iter().map(|m| m as f32).collect())
            .ok_or(FilterError::EmptyImage)
    }
}

impl BoxFilter for Image<Luma<f64>> {
    type Output = Self;

    fn box_filter(&self, x_radius: u32, y_radius: u32) -> Result<Self::Output, FilterError> {
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 {
            return Err(FilterError::EmptyImage);
        }

        let sat = SummedAreaTable::from_data(self.as_raw(), width, height);
        ImageBuffer::from_raw(width, height, sat_box_means(&sat, x_radius, y_radius))
            .ok_or(FilterError::EmptyImage)
    }
}

/// Window means for every pixel, row-major
fn sat_box_means(sat: &SummedAreaTable, x_radius: u32, y_radius: u32) -> Vec<f64> {
    let width = sat.width();
    let height = sat.height();
    let mut output = Vec::with_capacity(width as usize * height as usize);

    for y in 0..height {
        let y1 = y.saturating_sub(y_radius);
        let y2 = y.saturating_add(y_radius).min(height - 1);
        for x in 0..width {
            let x1 = x.saturating_sub(x_radius);
            let x2 = x.saturating_add(x_radius).min(width - 1);

            // border windows cover fewer pixels
            let area = f64::from(x2 - x1 + 1) * f64::from(y2 - y1 + 1);
            output.push(sat.rectangle_sum(x1, y1, x2, y2) / area);
        }
    }

    output
}
