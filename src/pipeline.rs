//! End-to-end matting and passport-photo entry points.

use crate::config::MattingConfig;
use crate::error::{MattingError, MattingResult};
use crate::matting::cleanup::{cleanup, soft_contrast};
use crate::matting::composite::{composite, to_rgba};
use crate::matting::decontaminate::decontaminate;
use crate::matting::enhance::enhance;
use crate::matting::face::{center_on_face, CropRegion, FaceDetector};
use crate::matting::hair::recover;
use crate::matting::normalizer::{normalize, SegmentationModel};
use crate::matting::refiner::refine;
use crate::matting::trimap::{build_trimap, TrimapLabel};
use crate::utils::{mean_alpha, validate_non_empty_image};
use crate::Image;
use image::{ImageBuffer, Luma, Rgb, Rgba};
use std::ops::RangeInclusive;
use tracing::{debug, info, instrument, warn};

/// Accepted passport output side length in pixels
pub const PASSPORT_SIDE_RANGE: RangeInclusive<u32> = 100..=2000;

/// Decontaminated colour and clean alpha at source resolution
#[derive(Debug, Clone, PartialEq)]
pub struct MatteParts {
    pub image: Image<Rgb<u8>>,
    pub alpha: Image<Luma<f32>>,
}

impl MatteParts {
    /// Packs the parts into an 8-bit RGBA cutout
    ///
    /// # Errors
    ///
    /// * `MattingError::DimensionMismatch` - the parts were edited to different sizes
    pub fn to_rgba(&self) -> MattingResult<Image<Rgba<u8>>> {
        to_rgba(&self.image, &self.alpha)
    }
}

/// Output size and background of a passport photo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassportOptions {
    pub width: u32,
    pub height: u32,
    pub background: Rgb<u8>,
}

impl PassportOptions {
    /// White background at the given size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: Rgb([255, 255, 255]),
        }
    }

    #[must_use]
    pub fn with_background(mut self, background: Rgb<u8>) -> Self {
        self.background = background;
        self
    }

    /// # Errors
    ///
    /// * `MattingError::InvalidParameter` - a side lies outside [`PASSPORT_SIDE_RANGE`]
    pub fn validate(&self) -> MattingResult<()> {
        for (name, side) in [("width", self.width), ("height", self.height)] {
            if !PASSPORT_SIDE_RANGE.contains(&side) {
                return Err(MattingError::invalid_parameter(format!(
                    "passport {name} must lie in {}..={}, got {side}",
                    PASSPORT_SIDE_RANGE.start(),
                    PASSPORT_SIDE_RANGE.end()
                )));
            }
        }
        Ok(())
    }
}

impl Default for PassportOptions {
    /// 600x600 on white
    fn default() -> Self {
        Self::new(600, 600)
    }
}

/// Finished passport photo with the source rectangle it was cut from
#[derive(Debug, Clone, PartialEq)]
pub struct PassportPhoto {
    pub image: Image<Rgb<u8>>,
    pub crop: CropRegion,
}

/// Portrait matting pipeline
///
/// Owns the injected segmentation model and optional face detector. Both are
/// only read after construction, so one pipeline can serve concurrent
/// requests when `M` is `Sync`.
pub struct MattingPipeline<M> {
    model: M,
    face_detector: Option<Box<dyn FaceDetector>>,
    config: MattingConfig,
}

impl<M: SegmentationModel> MattingPipeline<M> {
    /// # Errors
    ///
    /// * `MattingError::InvalidParameter` - the configuration fails validation
    pub fn new(model: M, config: MattingConfig) -> MattingResult<Self> {
        config.validate()?;
        Ok(Self {
            model,
            face_detector: None,
            config,
        })
    }

    #[must_use]
    pub fn with_face_detector<D: FaceDetector + 'static>(mut self, detector: D) -> Self {
        self.face_detector = Some(Box::new(detector));
        self
    }

    pub const fn config(&self) -> &MattingConfig {
        &self.config
    }

    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Decodes `bytes` and returns the RGBA cutout
    ///
    /// # Errors
    ///
    /// * `MattingError::Decode` - the bytes are not an image; the model is not invoked
    /// * `MattingError::ModelUnavailable` - the model is not ready
    /// * `MattingError::Inference` - the model broke its output contract
    /// * `MattingError::DegenerateMask` - strict mode and no confident foreground
    pub fn matte(&self, bytes: &[u8]) -> MattingResult<Image<Rgba<u8>>> {
        self.matte_parts(bytes)?.to_rgba()
    }

    /// Like [`Self::matte`], keeping the float alpha separate
    ///
    /// # Errors
    ///
    /// See [`Self::matte`].
    #[instrument(skip_all, fields(bytes = bytes.len()))]
    pub fn matte_parts(&self, bytes: &[u8]) -> MattingResult<MatteParts> {
        let image = decode(bytes)?;
        self.matte_image(&image)
    }

    /// Runs normalisation through decontamination on a decoded image
    ///
    /// # Errors
    ///
    /// See [`Self::matte`]; `MattingError::EmptyImage` for a zero-sized image.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn matte_image(&self, image: &Image<Rgb<u8>>) -> MattingResult<MatteParts> {
        validate_non_empty_image(image.width(), image.height())?;
        let config = &self.config;

        let mut soft_mask = normalize(image, &self.model, &config.normalizer)?;
        debug!(mean_alpha = mean_alpha(&soft_mask), "soft mask ready");

        let mut trimap = build_trimap(&soft_mask, &config.trimap);
        if trimap.is_degenerate() {
            if config.reject_degenerate_mask {
                return Err(MattingError::DegenerateMask);
            }
            warn!("segmentation found no confident foreground; matte will be transparent");
            soft_mask = ImageBuffer::new(image.width(), image.height());
            trimap = build_trimap(&soft_mask, &config.trimap);
        }
        debug!(
            unknown_percent = trimap.unknown_fraction() * 100.0,
            foreground = trimap.count(TrimapLabel::Foreground),
            "trimap built"
        );

        let mut alpha = refine(image, &trimap, &soft_mask, &config.refiner)?;

        if config.hair_refinement {
            alpha = recover(image, &alpha, &config.hair)?;
            debug!(mean_alpha = mean_alpha(&alpha), "hair edges recovered");
        }

        alpha = cleanup(&alpha, &config.cleanup);
        if let Some(strength) = config.soft_contrast {
            alpha = soft_contrast(&alpha, strength);
        }

        let clean_image = decontaminate(image, &alpha, &config.decontamination)?;
        info!(mean_alpha = mean_alpha(&alpha), "matte complete");

        Ok(MatteParts {
            image: clean_image,
            alpha,
        })
    }

    /// Full pipeline to a fixed-size photo on the configured background
    ///
    /// # Errors
    ///
    /// See [`Self::passport_photo_with`].
    pub fn passport_photo(
        &self,
        bytes: &[u8],
        output_size: (u32, u32),
    ) -> MattingResult<Image<Rgb<u8>>> {
        let options = PassportOptions::new(output_size.0, output_size.1)
            .with_background(Rgb(self.config.composite.background));
        self.passport_photo_with(bytes, &options).map(|photo| photo.image)
    }

    /// # Errors
    ///
    /// * `MattingError::InvalidParameter` - the output size is out of range;
    ///   checked before decoding
    /// * any error of [`Self::matte`]
    #[instrument(skip_all, fields(width = options.width, height = options.height))]
    pub fn passport_photo_with(
        &self,
        bytes: &[u8],
        options: &PassportOptions,
    ) -> MattingResult<PassportPhoto> {
        options.validate()?;
        let parts = self.matte_parts(bytes)?;

        let composed = composite(
            &parts.image,
            &parts.alpha,
            options.background,
            &self.config.composite,
        )?;

        let faces = self
            .face_detector
            .as_ref()
            .map(|detector| detector.detect(&composed))
            .unwrap_or_default();
        debug!(faces = faces.len(), "faces detected");

        let (cropped, crop) = center_on_face(
            &composed,
            &faces,
            (options.width, options.height),
            &self.config.composite,
        )?;
        let image = enhance(&cropped, &self.config.enhance);
        info!(?crop, "passport photo complete");

        Ok(PassportPhoto { image, crop })
    }
}

fn decode(bytes: &[u8]) -> MattingResult<Image<Rgb<u8>>> {
    let image = image::load_from_memory(bytes)?.to_rgb8();
    validate_non_empty_image(image.width(), image.height())?;
    Ok(image)
}
