use crate::error::{MattingError, MattingResult};
use crate::Image;
use image::{imageops, ImageBuffer, Pixel, Primitive, Rgb};

/// Element of the weight table for area interpolation.
#[derive(Debug, Clone, Copy)]
struct InterpolationWeight {
    destination_index: u32,
    source_index: u32,
    weight: f32,
}

/// Area-averaging resize to floating point output.
///
/// Each destination pixel is the coverage-weighted mean of the source
/// pixels under its footprint, which avoids the aliasing a point sampler
/// shows on large reductions. Enlargement falls back to a triangle filter.
pub struct InterAreaResize {
    pub new_width: u32,
    pub new_height: u32,
}

impl InterAreaResize {
    pub fn new(new_width: u32, new_height: u32) -> MattingResult<Self> {
        if new_width == 0 || new_height == 0 {
            return Err(MattingError::invalid_parameter(format!(
                "resize target must be non-empty, got {new_width}x{new_height}"
            )));
        }
        Ok(Self {
            new_width,
            new_height,
        })
    }

    /// Resizes an 8-bit RGB image without requantising the result.
    pub fn resize(&self, src: &Image<Rgb<u8>>) -> MattingResult<Image<Rgb<f32>>> {
        let (src_width, src_height) = src.dimensions();
        if src_width == 0 || src_height == 0 {
            return Err(MattingError::EmptyImage);
        }

        if self.new_width > src_width || self.new_height > src_height {
            let enlarged = imageops::resize(
                src,
                self.new_width,
                self.new_height,
                imageops::FilterType::Triangle,
            );
            return Ok(to_f32_rgb(&enlarged));
        }

        resize_area(&to_f32_rgb(src), self.new_width, self.new_height)
    }
}

fn to_f32_rgb(image: &Image<Rgb<u8>>) -> Image<Rgb<f32>> {
    imageproc::map::map_colors(image, |p| Rgb(p.0.map(f32::from)))
}

/// Weight table mapping every destination index to its source footprint.
fn compute_interpolation_weights(src_size: u32, dst_size: u32) -> Vec<InterpolationWeight> {
    let scale = src_size as f32 / dst_size as f32;
    let mut table = Vec::new();

    for dx in 0..dst_size {
        let start = dx as f32 * scale;
        let end = (start + scale).min(src_size as f32);
        let span = end - start;

        let first = start.floor() as u32;
        let last = (end.ceil() as u32).min(src_size);
        for sx in first..last {
            let overlap = (sx as f32 + 1.0).min(end) - (sx as f32).max(start);
            if overlap > 1e-6 {
                table.push(InterpolationWeight {
                    destination_index: dx,
                    source_index: sx,
                    weight: overlap / span,
                });
            }
        }
    }

    table
}

fn resize_area<P>(src: &Image<P>, dst_width: u32, dst_height: u32) -> MattingResult<Image<P>>
where
    P: Pixel<Subpixel = f32>,
{
    if src.width() == 0 || src.height() == 0 {
        return Err(MattingError::EmptyImage);
    }

    let channels = P::CHANNEL_COUNT as usize;
    let x_weights = compute_interpolation_weights(src.width(), dst_width);
    let y_weights = compute_interpolation_weights(src.height(), dst_height);

    // horizontal pass into a dst_width x src_height buffer
    let src_height = src.height() as usize;
    let mut rows = vec![0.0f32; dst_width as usize * src_height * channels];
    for sy in 0..src.height() {
        let row_offset = sy as usize * dst_width as usize * channels;
        for entry in &x_weights {
            let pixel = src.get_pixel(entry.source_index, sy);
            for (c, value) in pixel.channels().iter().enumerate() {
                rows[row_offset + entry.destination_index as usize * channels + c] +=
                    value * entry.weight;
            }
        }
    }

    // vertical pass
    let mut output = vec![0.0f32; dst_width as usize * dst_height as usize * channels];
    let row_len = dst_width as usize * channels;
    for entry in &y_weights {
        let src_row = &rows[entry.source_index as usize * row_len..][..row_len];
        let dst_row = &mut output[entry.destination_index as usize * row_len..][..row_len];
        for (dst, src) in dst_row.iter_mut().zip(src_row) {
            *dst += src * entry.weight;
        }
    }

    ImageBuffer::from_raw(dst_width, dst_height, output).ok_or(MattingError::EmptyImage)
}

/// Resizes any image with the cubic (Catmull-Rom) filter.
///
/// Float planes are clamped to `[0, 1]` by the resampler, which suits
/// alpha maps.
pub fn resize_cubic<P>(image: &Image<P>, width: u32, height: u32) -> Image<P>
where
    P: Pixel + 'static,
    P::Subpixel: Primitive + 'static,
{
    imageops::resize(image, width, height, imageops::FilterType::CatmullRom)
}
