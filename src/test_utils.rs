//! Test utilities for portrait-matte
//!
//! Synthetic portraits, a counting stub segmentation model and tolerant
//! image comparison. Only compiled when running tests.

use crate::error::{MattingError, MattingResult};
use crate::matting::normalizer::SegmentationModel;
use crate::Image;
use image::{DynamicImage, ImageFormat, Luma, Rgb};
use ndarray::{Array4, Axis};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Light backdrop with a head, dark hair cap and shoulders.
pub fn portrait_scene(width: u32, height: u32) -> Image<Rgb<u8>> {
    let (w, h) = (width as f32, height as f32);
    let (cx, cy) = (w / 2.0, h * 0.4);
    let head = w.min(h) * 0.22;

    Image::from_fn(width, height, |x, y| {
        let (fx, fy) = (x as f32, y as f32);
        let d = (fx - cx).hypot(fy - cy);
        if d < head && fy < cy - head * 0.3 {
            Rgb([40, 30, 25])
        } else if d < head {
            Rgb([200, 150, 120])
        } else if fy > h * 0.7 && (fx - cx).abs() < w * 0.35 {
            Rgb([60, 80, 140])
        } else {
            Rgb([235, 235, 235])
        }
    })
}

/// Encodes an RGB image as PNG bytes.
pub fn encode_png(image: &Image<Rgb<u8>>) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("encoding to memory cannot fail");
    bytes.into_inner()
}

/// Stub network marking pixels darker than `1 - threshold` as foreground
///
/// Counts its invocations.
#[derive(Debug)]
pub struct ThresholdModel {
    pub threshold: f32,
    pub calls: AtomicUsize,
}

impl Default for ThresholdModel {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ThresholdModel {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SegmentationModel for ThresholdModel {
    fn infer(&self, input: &Array4<f32>) -> MattingResult<Array4<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let brightness = input
            .mean_axis(Axis(1))
            .ok_or_else(|| MattingError::inference("empty channel axis"))?
            .mapv(|v| (v + 1.0) / 2.0);
        Ok(brightness
            .insert_axis(Axis(1))
            .mapv(|b| if 1.0 - b > self.threshold { 1.0 } else { 0.0 }))
    }
}

/// Compares two alpha maps with an absolute tolerance.
pub fn alphas_approx_equal(
    expected: &Image<Luma<f32>>,
    actual: &Image<Luma<f32>>,
    tolerance: f32,
) -> bool {
    expected.dimensions() == actual.dimensions()
        && expected
            .pixels()
            .zip(actual.pixels())
            .all(|(e, a)| (e[0] - a[0]).abs() <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portrait_scene_has_subject_and_backdrop() {
        let scene = portrait_scene(100, 100);
        assert_eq!(*scene.get_pixel(0, 0), Rgb([235, 235, 235]));
        assert_eq!(*scene.get_pixel(50, 40), Rgb([200, 150, 120]));
        assert_eq!(*scene.get_pixel(50, 28), Rgb([40, 30, 25]));
    }

    #[test]
    fn threshold_model_counts_calls_and_keeps_shape() {
        let model = ThresholdModel::default();
        let input = Array4::<f32>::from_elem((1, 3, 8, 4), -1.0);
        let output = model.infer(&input).unwrap();
        assert_eq!(output.shape(), &[1, 1, 8, 4]);
        assert!(output.iter().all(|&v| v == 1.0));
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn png_round_trip_decodes() {
        let scene = portrait_scene(12, 9);
        let decoded = image::load_from_memory(&encode_png(&scene)).unwrap().to_rgb8();
        assert_eq!(decoded, scene);
    }

    #[test]
    fn alpha_comparison_respects_tolerance() {
        let a = Image::from_pixel(2, 2, Luma([0.5f32]));
        let b = Image::from_pixel(2, 2, Luma([0.52f32]));
        assert!(alphas_approx_equal(&a, &b, 0.05));
        assert!(!alphas_approx_equal(&a, &b, 0.01));
    }
}
