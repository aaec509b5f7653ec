//! Portrait alpha matting and passport-photo compositing.
//!
//! A soft mask from an injected [`SegmentationModel`] is turned into a
//! trimap, refined with a guided filter, extended into cut-off hair,
//! cleaned, and used to strip background colour from the subject's edges.
//! [`MattingPipeline::passport_photo`] then composites the cutout onto a flat
//! background, crops around the largest detected face and applies a light
//! cosmetic finish.
//!
//! ```no_run
//! use ndarray::Array4;
//! use portrait_matte::{MattingConfig, MattingPipeline, MattingResult, SegmentationModel};
//!
//! struct Network;
//!
//! impl SegmentationModel for Network {
//!     fn infer(&self, input: &Array4<f32>) -> MattingResult<Array4<f32>> {
//!         let (_, _, h, w) = input.dim();
//!         Ok(Array4::from_elem((1, 1, h, w), 1.0))
//!     }
//! }
//!
//! # fn main() -> MattingResult<()> {
//! let pipeline = MattingPipeline::new(Network, MattingConfig::default())?;
//! let bytes = std::fs::read("portrait.jpg").unwrap_or_default();
//! let _photo = pipeline.passport_photo(&bytes, (413, 531))?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod matting;
mod pipeline;
#[cfg(test)]
mod test_utils;
mod utils;

use image::{ImageBuffer, Pixel};

pub use config::{
    CleanupConfig, CompositeConfig, DecontaminationConfig, EnhanceConfig, HairConfig,
    MattingConfig, NormalizerConfig, RefinerConfig, TrimapConfig,
};
pub use error::{FilterError, MattingError, MattingResult};
pub use matting::box_filter::BoxFilter;
pub use matting::face::{largest_face, CropRegion, FaceBox, FaceDetector};
pub use matting::guided_filter::{GuidedFilter, GuidedFilterExt};
pub use matting::normalizer::SegmentationModel;
pub use matting::trimap::{Trimap, TrimapLabel};
pub use pipeline::{
    MatteParts, MattingPipeline, PassportOptions, PassportPhoto, PASSPORT_SIDE_RANGE,
};

pub type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;
