//! Network input preparation and soft mask recovery.

use crate::config::NormalizerConfig;
use crate::error::{MattingError, MattingResult};
use crate::matting::inter_area::{resize_cubic, InterAreaResize};
use crate::utils::validate_non_empty_image;
use crate::Image;
use image::{ImageBuffer, Luma, Rgb};
use ndarray::Array4;
use tracing::debug;

/// Pretrained portrait segmentation network
///
/// Input is `[1, 3, H, W]` with channels in `[-1, 1]`; output is
/// `[1, 1, H, W]` with values in `[0, 1]` at the same spatial size.
/// Implementations hold their session read-only after construction, so a
/// single model may serve concurrent requests.
pub trait SegmentationModel: Send + Sync {
    /// Runs the network on a normalised tensor
    ///
    /// # Errors
    ///
    /// * `MattingError::ModelUnavailable` - the session cannot be invoked
    /// * `MattingError::Inference` - the network failed on this input
    fn infer(&self, input: &Array4<f32>) -> MattingResult<Array4<f32>>;

    /// Whether the model can currently be invoked
    fn is_ready(&self) -> bool {
        true
    }
}

impl<M: SegmentationModel + ?Sized> SegmentationModel for Box<M> {
    fn infer(&self, input: &Array4<f32>) -> MattingResult<Array4<f32>> {
        (**self).infer(input)
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Network input size for an image of `width x height`
///
/// The longer side becomes `reference_size`, the aspect ratio is kept, and
/// each side is rounded down to a multiple of `size_multiple` (never below
/// one multiple).
///
/// # Errors
///
/// * `MattingError::EmptyImage` - either side is zero
/// * `MattingError::InvalidParameter` - `reference_size` or `size_multiple`
///   is zero
pub fn inference_size(
    width: u32,
    height: u32,
    config: &NormalizerConfig,
) -> MattingResult<(u32, u32)> {
    validate_non_empty_image(width, height)?;
    if config.reference_size == 0 || config.size_multiple == 0 {
        return Err(MattingError::invalid_parameter(format!(
            "reference size {} and size multiple {} must be positive",
            config.reference_size, config.size_multiple
        )));
    }

    let reference = f64::from(config.reference_size);
    let longer = f64::from(width.max(height));
    let scale = reference / longer;

    let round_down = |side: u32| {
        let scaled = (f64::from(side) * scale).round() as u32;
        (scaled - scaled % config.size_multiple).max(config.size_multiple)
    };

    Ok((round_down(width), round_down(height)))
}

/// Converts an image to a `[1, 3, H, W]` tensor in `[-1, 1]` at network size
pub fn to_input_tensor(
    image: &Image<Rgb<u8>>,
    config: &NormalizerConfig,
) -> MattingResult<Array4<f32>> {
    let (width, height) = image.dimensions();
    let (net_width, net_height) = inference_size(width, height, config)?;
    let resized = InterAreaResize::new(net_width, net_height)?.resize(image)?;

    let mut tensor = Array4::<f32>::zeros((1, 3, net_height as usize, net_width as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] - 127.5) / 127.5;
        }
    }

    Ok(tensor)
}

/// Converts a `[1, 1, H, W]` network output back to a soft mask of the
/// requested size, clamped to `[0, 1]`
pub fn from_output_tensor(
    output: &Array4<f32>,
    expected: (u32, u32),
    target: (u32, u32),
) -> MattingResult<Image<Luma<f32>>> {
    let (expected_width, expected_height) = expected;
    let shape = output.shape();
    if shape != [1, 1, expected_height as usize, expected_width as usize] {
        return Err(MattingError::inference(format!(
            "expected output shape [1, 1, {expected_height}, {expected_width}], got {shape:?}"
        )));
    }

    let low_res: Image<Luma<f32>> = ImageBuffer::from_fn(expected_width, expected_height, |x, y| {
        let value = output[[0, 0, y as usize, x as usize]];
        Luma([if value.is_finite() { value } else { 0.0 }])
    });

    let (target_width, target_height) = target;
    let mut mask = resize_cubic(&low_res, target_width, target_height);
    for pixel in mask.pixels_mut() {
        pixel[0] = pixel[0].clamp(0.0, 1.0);
    }
    Ok(mask)
}

/// Produces a soft foreground mask at the image's own resolution
///
/// # Errors
///
/// * `MattingError::ModelUnavailable` - the model reports it is not ready;
///   nothing is sent to it
/// * `MattingError::Inference` - the model output has the wrong shape
pub fn normalize<M>(
    image: &Image<Rgb<u8>>,
    model: &M,
    config: &NormalizerConfig,
) -> MattingResult<Image<Luma<f32>>>
where
    M: SegmentationModel + ?Sized,
{
    if !model.is_ready() {
        return Err(MattingError::model_unavailable(
            "segmentation model is not initialized",
        ));
    }

    let (width, height) = image.dimensions();
    let input = to_input_tensor(image, config)?;
    let net_size = (input.shape()[3] as u32, input.shape()[2] as u32);
    debug!(
        width,
        height,
        net_width = net_size.0,
        net_height = net_size.1,
        "running segmentation"
    );

    let output = model.infer(&input)?;
    from_output_tensor(&output, net_size, (width, height))
}
