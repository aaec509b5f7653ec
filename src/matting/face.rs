//! Face-centred cropping for passport-style output.

use crate::config::CompositeConfig;
use crate::error::{MattingError, MattingResult};
use crate::utils::validate_non_empty_image;
use crate::Image;
use image::{imageops, Rgb};
use tracing::debug;

/// Axis-aligned face bounding box in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceBox {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Centre rounded toward the top-left
    #[must_use]
    pub const fn center(&self) -> (i64, i64) {
        (
            self.x as i64 + self.width as i64 / 2,
            self.y as i64 + self.height as i64 / 2,
        )
    }
}

/// External face detector
///
/// May return any number of boxes; the largest one wins.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &Image<Rgb<u8>>) -> Vec<FaceBox>;
}

impl<F> FaceDetector for F
where
    F: Fn(&Image<Rgb<u8>>) -> Vec<FaceBox> + Send + Sync,
{
    fn detect(&self, image: &Image<Rgb<u8>>) -> Vec<FaceBox> {
        self(image)
    }
}

/// Largest box by area; the first one wins ties
#[must_use]
pub fn largest_face(faces: &[FaceBox]) -> Option<FaceBox> {
    faces
        .iter()
        .copied()
        .reduce(|best, face| if face.area() > best.area() { face } else { best })
}

/// Source rectangle selected by [`center_on_face`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Centre in source coordinates
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }
}

/// Places a `crop`-long span around `center` inside `[0, limit)`
///
/// When one bound is clamped, the span re-expands on the opposite side as
/// far as the image allows.
fn place_span(center: i64, crop: i64, limit: i64) -> (u32, u32) {
    let mut start = (center - crop / 2).max(0);
    let mut end = (start + crop).min(limit);
    if end - start < crop {
        if start == 0 {
            end = crop.min(limit);
        } else {
            start = (end - crop).max(0);
        }
    }
    // a box lying outside the image still yields a one-pixel span
    let start = start.min(limit - 1);
    let end = end.max(start + 1);
    (start as u32, (end - start) as u32)
}

/// Chooses the source rectangle for the passport crop
///
/// With a face, the square side is `max(width, height) * crop_scale` and the
/// square is shifted up by `height * upward_shift`, then clamped to the
/// image. Without one, the largest centred square is used.
#[must_use]
pub fn face_crop_region(
    width: u32,
    height: u32,
    face: Option<FaceBox>,
    config: &CompositeConfig,
) -> CropRegion {
    let (w, h) = (i64::from(width), i64::from(height));

    let face = face.filter(|_| width > 0 && height > 0);
    let Some(face) = face else {
        let side = width.min(height);
        return CropRegion {
            x: (width - side) / 2,
            y: (height - side) / 2,
            width: side,
            height: side,
        };
    };

    let (cx, cy) = face.center();
    let longest = f64::from(face.width.max(face.height));
    let crop = ((longest * f64::from(config.crop_scale)) as i64).max(1);
    let shift = (f64::from(face.height) * f64::from(config.upward_shift)) as i64;

    let (x, crop_width) = place_span(cx, crop, w);
    let (y, crop_height) = place_span(cy - shift, crop, h);

    CropRegion {
        x,
        y,
        width: crop_width,
        height: crop_height,
    }
}

/// Crops around the largest face and resizes to exactly `target`
///
/// # Errors
///
/// * `MattingError::EmptyImage` - the image has no pixels
/// * `MattingError::InvalidParameter` - a target side is zero
pub fn center_on_face(
    image: &Image<Rgb<u8>>,
    faces: &[FaceBox],
    target: (u32, u32),
    config: &CompositeConfig,
) -> MattingResult<(Image<Rgb<u8>>, CropRegion)> {
    let (width, height) = image.dimensions();
    validate_non_empty_image(width, height)?;
    let (target_width, target_height) = target;
    if target_width == 0 || target_height == 0 {
        return Err(MattingError::invalid_parameter(format!(
            "target size must be non-empty, got {target_width}x{target_height}"
        )));
    }

    let face = largest_face(faces);
    let region = face_crop_region(width, height, face, config);
    debug!(?face, ?region, "passport crop");

    let cropped =
        imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image();
    let resized = imageops::resize(
        &cropped,
        target_width,
        target_height,
        imageops::FilterType::Lanczos3,
    );
    Ok((resized, region))
}
