use crate::config::TrimapConfig;
use crate::utils::{alpha_mask, dilate_disc, erode_disc, MASK_ON};
use crate::Image;
use image::Luma;

/// Label of a trimap pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrimapLabel {
    Background,
    Unknown,
    Foreground,
}

impl TrimapLabel {
    /// Conventional 8-bit encoding: 0, 128, 255
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Background => 0,
            Self::Unknown => 128,
            Self::Foreground => 255,
        }
    }
}

/// Three-region map constraining alpha refinement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trimap {
    width: u32,
    height: u32,
    labels: Vec<TrimapLabel>,
}

impl Trimap {
    /// Builds a trimap from explicit labels in row-major order
    ///
    /// Returns `None` if the label count does not match the dimensions.
    #[must_use]
    pub fn from_labels(width: u32, height: u32, labels: Vec<TrimapLabel>) -> Option<Self> {
        (labels.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            labels,
        })
    }

    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> TrimapLabel {
        self.labels[y as usize * self.width as usize + x as usize]
    }

    #[must_use]
    pub fn labels(&self) -> &[TrimapLabel] {
        &self.labels
    }

    #[must_use]
    pub fn count(&self, label: TrimapLabel) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// Fraction of pixels labelled unknown
    #[must_use]
    pub fn unknown_fraction(&self) -> f32 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.count(TrimapLabel::Unknown) as f32 / self.labels.len() as f32
    }

    /// True when nothing passed the foreground threshold
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.labels.iter().all(|&l| l == TrimapLabel::Background)
    }

    /// 8-bit rendering for inspection
    #[must_use]
    pub fn to_image(&self) -> Image<Luma<u8>> {
        Image::from_fn(self.width, self.height, |x, y| Luma([self.get(x, y).to_u8()]))
    }
}

/// Derives a trimap from a soft alpha map
///
/// Pixels above the foreground threshold form a binary mask. Eroding it
/// yields sure foreground; dilating it bounds the unknown band; everything
/// outside the dilation is background. A mask with no confident pixel gives
/// an all-background trimap.
pub fn build_trimap(alpha: &Image<Luma<f32>>, config: &TrimapConfig) -> Trimap {
    let (width, height) = alpha.dimensions();
    let threshold = config.foreground_threshold;
    let foreground = alpha_mask(alpha, |a| a > threshold);

    let sure_foreground = erode_disc(&foreground, config.erosion_radius);
    let expanded = dilate_disc(&foreground, config.dilation_radius);

    let labels = sure_foreground
        .pixels()
        .zip(expanded.pixels())
        .map(|(sure, grown)| {
            if sure[0] == MASK_ON {
                TrimapLabel::Foreground
            } else if grown[0] == MASK_ON {
                TrimapLabel::Unknown
            } else {
                TrimapLabel::Background
            }
        })
        .collect();

    Trimap {
        width,
        height,
        labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    fn disc_alpha(size: u32, radius: f32) -> Image<Luma<f32>> {
        let centre = size as f32 / 2.0;
        ImageBuffer::from_fn(size, size, |x, y| {
            let d = (x as f32 - centre).hypot(y as f32 - centre);
            Luma([if d < radius { 1.0 } else { 0.0 }])
        })
    }

    #[test]
    fn disc_produces_three_regions() {
        let trimap = build_trimap(&disc_alpha(60, 15.0), &TrimapConfig::default());
        assert_eq!(trimap.get(30, 30), TrimapLabel::Foreground);
        assert_eq!(trimap.get(30, 30 - 14), TrimapLabel::Unknown);
        assert_eq!(trimap.get(30, 30 - 20), TrimapLabel::Unknown);
        assert_eq!(trimap.get(0, 0), TrimapLabel::Background);
    }

    #[test]
    fn unknown_band_ends_at_dilation_radius() {
        // single confident pixel at (20, 20)
        let alpha = ImageBuffer::from_fn(41, 41, |x, y| {
            Luma([if (x, y) == (20, 20) { 1.0 } else { 0.0 }])
        });
        let config = TrimapConfig::default();
        let trimap = build_trimap(&alpha, &config);
        let r = config.dilation_radius;

        assert_eq!(trimap.get(20 + r, 20), TrimapLabel::Unknown);
        assert_eq!(trimap.get(20 + r + 1, 20), TrimapLabel::Background);
        assert_eq!(trimap.get(20, 20 - r), TrimapLabel::Unknown);
        assert_eq!(trimap.get(20, 20 - r - 1), TrimapLabel::Background);
        // (r, r) is r * sqrt(2) away
        assert_eq!(trimap.get(20 + r, 20 + r), TrimapLabel::Background);
    }

    #[test]
    fn foreground_is_subset_of_thresholded_alpha() {
        let alpha = disc_alpha(40, 10.0);
        let config = TrimapConfig::default();
        let trimap = build_trimap(&alpha, &config);
        for (x, y, a) in alpha.enumerate_pixels() {
            if trimap.get(x, y) == TrimapLabel::Foreground {
                assert!(a[0] > config.foreground_threshold);
            }
        }
    }

    #[test]
    fn empty_mask_is_all_background() {
        let alpha: Image<Luma<f32>> = ImageBuffer::from_pixel(20, 20, Luma([0.5]));
        let trimap = build_trimap(&alpha, &TrimapConfig::default());
        assert!(trimap.is_degenerate());
        assert_eq!(trimap.unknown_fraction(), 0.0);
    }

    #[test]
    fn to_image_uses_conventional_levels() {
        let trimap = Trimap::from_labels(
            3,
            1,
            vec![
                TrimapLabel::Background,
                TrimapLabel::Unknown,
                TrimapLabel::Foreground,
            ],
        )
        .unwrap();
        let image = trimap.to_image();
        assert_eq!(image.as_raw(), &vec![0, 128, 255]);
    }

    #[test]
    fn from_labels_rejects_wrong_length() {
        assert!(Trimap::from_labels(2, 2, vec![TrimapLabel::Unknown; 3]).is_none());
    }
}
