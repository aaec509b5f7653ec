//! Edge case and error condition tests
//!
//! Boundary sizes, broken collaborators, malformed configuration and
//! mismatched inputs.

use image::{DynamicImage, ImageFormat, Luma, Rgb};
use ndarray::Array4;
use portrait_matte::matting::cleanup::cleanup;
use portrait_matte::matting::decontaminate::decontaminate;
use portrait_matte::matting::face::center_on_face;
use portrait_matte::matting::refiner::refine;
use portrait_matte::matting::trimap::build_trimap;
use portrait_matte::{
    largest_face, CleanupConfig, CompositeConfig, DecontaminationConfig, FaceBox, FilterError,
    GuidedFilterExt, Image, MattingConfig, MattingError, MattingPipeline, MattingResult,
    PassportOptions, RefinerConfig, SegmentationModel, TrimapConfig, TrimapLabel,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};

/// Reports itself unavailable and records any call that slips through
#[derive(Default)]
struct OfflineModel {
    invoked: AtomicBool,
}

impl SegmentationModel for OfflineModel {
    fn infer(&self, _input: &Array4<f32>) -> MattingResult<Array4<f32>> {
        self.invoked.store(true, Ordering::SeqCst);
        Err(MattingError::model_unavailable("offline"))
    }

    fn is_ready(&self) -> bool {
        false
    }
}

/// Returns a tensor of the wrong spatial size
struct MisshapenModel;

impl SegmentationModel for MisshapenModel {
    fn infer(&self, _input: &Array4<f32>) -> MattingResult<Array4<f32>> {
        Ok(Array4::from_elem((1, 1, 3, 3), 1.0))
    }
}

/// Everything is foreground
struct OpaqueModel;

impl SegmentationModel for OpaqueModel {
    fn infer(&self, input: &Array4<f32>) -> MattingResult<Array4<f32>> {
        let (_, _, height, width) = input.dim();
        Ok(Array4::from_elem((1, 1, height, width), 1.0))
    }
}

/// Emits NaN everywhere
struct NanModel;

impl SegmentationModel for NanModel {
    fn infer(&self, input: &Array4<f32>) -> MattingResult<Array4<f32>> {
        let (_, _, height, width) = input.dim();
        Ok(Array4::from_elem((1, 1, height, width), f32::NAN))
    }
}

fn encoded_bytes(width: u32, height: u32, color: Rgb<u8>, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(Image::from_pixel(width, height, color))
        .write_to(&mut bytes, format)
        .expect("encoding should succeed");
    bytes.into_inner()
}

fn png_bytes(width: u32, height: u32, color: Rgb<u8>) -> Vec<u8> {
    encoded_bytes(width, height, color, ImageFormat::Png)
}

#[test]
fn unavailable_model_is_reported_and_not_invoked() {
    let pipeline = MattingPipeline::new(OfflineModel::default(), MattingConfig::default())
        .expect("default config should be valid");

    let result = pipeline.matte(&png_bytes(16, 16, Rgb([10, 10, 10])));

    assert!(matches!(result, Err(MattingError::ModelUnavailable(_))));
    assert!(!pipeline.model().invoked.load(Ordering::SeqCst));
}

#[test]
fn wrong_output_shape_is_an_inference_error() {
    let pipeline = MattingPipeline::new(MisshapenModel, MattingConfig::default())
        .expect("default config should be valid");
    let result = pipeline.matte(&png_bytes(16, 16, Rgb([10, 10, 10])));
    assert!(matches!(result, Err(MattingError::Inference(_))));
}

#[test]
fn empty_input_is_a_decode_error() {
    let pipeline = MattingPipeline::new(OpaqueModel, MattingConfig::default())
        .expect("default config should be valid");
    assert!(matches!(pipeline.matte(&[]), Err(MattingError::Decode(_))));
}

#[test]
fn single_pixel_image_is_matted() {
    let pipeline = MattingPipeline::new(OpaqueModel, MattingConfig::default())
        .expect("default config should be valid");
    let rgba = pipeline
        .matte(&png_bytes(1, 1, Rgb([120, 80, 60])))
        .expect("1x1 image should be processed");
    assert_eq!(rgba.dimensions(), (1, 1));
}

#[test]
fn lossless_formats_other_than_png_are_decoded() {
    let pipeline = MattingPipeline::new(OpaqueModel, MattingConfig::default())
        .expect("default config should be valid");

    for format in [ImageFormat::Bmp, ImageFormat::Tiff, ImageFormat::WebP] {
        let bytes = encoded_bytes(16, 16, Rgb([120, 80, 60]), format);
        let rgba = pipeline
            .matte(&bytes)
            .unwrap_or_else(|err| panic!("{format:?} should decode: {err}"));
        assert_eq!(rgba.dimensions(), (16, 16));
        assert!(rgba.pixels().all(|p| p.0 == [120, 80, 60, 255]), "{format:?}");
    }
}

#[test]
fn gif_input_is_decoded() {
    let pipeline = MattingPipeline::new(OpaqueModel, MattingConfig::default())
        .expect("default config should be valid");
    let bytes = encoded_bytes(16, 16, Rgb([0, 0, 0]), ImageFormat::Gif);
    let rgba = pipeline.matte(&bytes).expect("GIF should decode");
    assert_eq!(rgba.dimensions(), (16, 16));
}

#[test]
fn opaque_mask_keeps_every_pixel() {
    let pipeline = MattingPipeline::new(OpaqueModel, MattingConfig::default())
        .expect("default config should be valid");
    let parts = pipeline
        .matte_parts(&png_bytes(40, 30, Rgb([120, 80, 60])))
        .expect("matting should succeed");
    assert!(parts.alpha.pixels().all(|a| a[0] == 1.0));
    assert!(parts.image.pixels().all(|p| *p == Rgb([120, 80, 60])));
}

#[test]
fn non_finite_model_output_is_treated_as_background() {
    let pipeline = MattingPipeline::new(NanModel, MattingConfig::default())
        .expect("default config should be valid");
    let rgba = pipeline
        .matte(&png_bytes(20, 20, Rgb([200, 200, 200])))
        .expect("NaN output should be sanitised");
    assert!(rgba.pixels().all(|p| p[3] == 0));
}

#[test]
fn passport_size_outside_range_is_rejected() {
    let pipeline = MattingPipeline::new(OpaqueModel, MattingConfig::default())
        .expect("default config should be valid");
    let bytes = png_bytes(40, 40, Rgb([1, 2, 3]));

    for size in [(99, 400), (400, 2001), (0, 0)] {
        assert!(matches!(
            pipeline.passport_photo(&bytes, size),
            Err(MattingError::InvalidParameter(_))
        ));
    }
    assert!(PassportOptions::new(100, 2000).validate().is_ok());
}

#[test]
fn partial_json_config_fills_defaults() {
    let json = r#"{
        "hair_refinement": false,
        "trimap": { "dilation_radius": 20 },
        "soft_contrast": 0.3
    }"#;
    let config: MattingConfig =
        serde_json::from_str(json).expect("partial config should deserialize");

    assert!(!config.hair_refinement);
    assert_eq!(config.trimap.dilation_radius, 20);
    assert_eq!(config.trimap.erosion_radius, TrimapConfig::default().erosion_radius);
    assert_eq!(config.soft_contrast, Some(0.3));
    assert_eq!(config.cleanup, CleanupConfig::default());
    assert!(config.validate().is_ok());
}

#[test]
fn invalid_config_is_rejected_by_pipeline() {
    let mut config = MattingConfig::default();
    config.decontamination.propagation_sigma = 0.0;
    assert!(matches!(
        MattingPipeline::new(OpaqueModel, config),
        Err(MattingError::InvalidParameter(_))
    ));
}

#[test]
fn guided_filter_rejects_bad_parameters() {
    let plane: Image<Luma<f32>> = Image::from_pixel(4, 4, Luma([0.5]));
    assert_eq!(
        plane.guided_filter(&plane, 0, 0.1),
        Err(FilterError::InvalidRadius { radius: 0 })
    );
    assert!(matches!(
        plane.guided_filter(&plane, 1, 0.0),
        Err(FilterError::InvalidEpsilon { .. })
    ));
    let other: Image<Luma<f32>> = Image::from_pixel(3, 4, Luma([0.5]));
    assert!(matches!(
        plane.guided_filter(&other, 1, 0.1),
        Err(FilterError::DimensionMismatch { .. })
    ));
}

#[test]
fn stage_inputs_of_different_sizes_are_rejected() {
    let image = Image::from_pixel(8, 8, Rgb([1u8, 2, 3]));
    let alpha: Image<Luma<f32>> = Image::from_pixel(8, 6, Luma([0.5]));

    assert!(matches!(
        decontaminate(&image, &alpha, &DecontaminationConfig::default()),
        Err(MattingError::DimensionMismatch { .. })
    ));

    let trimap = build_trimap(&alpha, &TrimapConfig::default());
    assert!(matches!(
        refine(&image, &trimap, &alpha, &RefinerConfig::default()),
        Err(MattingError::DimensionMismatch { .. })
    ));
}

#[test]
fn all_background_trimap_flows_through_refinement() {
    let image = Image::from_pixel(12, 12, Rgb([100u8, 100, 100]));
    let alpha: Image<Luma<f32>> = Image::from_pixel(12, 12, Luma([0.2]));
    let trimap = build_trimap(&alpha, &TrimapConfig::default());

    assert!(trimap.is_degenerate());
    assert_eq!(trimap.count(TrimapLabel::Unknown), 0);
    let refined = refine(&image, &trimap, &alpha, &RefinerConfig::default())
        .expect("refinement should succeed");
    assert_eq!(refined, alpha);
}

#[test]
fn cleanup_of_empty_and_tiny_maps() {
    let empty: Image<Luma<f32>> = Image::new(0, 0);
    assert_eq!(cleanup(&empty, &CleanupConfig::default()).dimensions(), (0, 0));

    let single: Image<Luma<f32>> = Image::from_pixel(1, 1, Luma([0.01]));
    assert_eq!(cleanup(&single, &CleanupConfig::default()).get_pixel(0, 0)[0], 0.0);
}

#[test]
fn empty_image_cannot_be_cropped() {
    let image: Image<Rgb<u8>> = Image::new(0, 0);
    assert_eq!(
        center_on_face(&image, &[], (100, 100), &CompositeConfig::default()),
        Err(MattingError::EmptyImage)
    );
}

#[test]
fn ties_keep_the_first_face() {
    let first = FaceBox::new(0, 0, 10, 20);
    let second = FaceBox::new(50, 50, 20, 10);
    assert_eq!(largest_face(&[first, second]), Some(first));
}
