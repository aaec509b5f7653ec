//! Tunable parameters for every pipeline stage.
//!
//! Defaults reproduce the behaviour of the production passport-photo
//! service. All structs deserialize with `#[serde(default)]`, so a partial
//! document only overrides the fields it names.

use crate::error::{MattingError, MattingResult};
use serde::{Deserialize, Serialize};

fn ensure(condition: bool, message: impl FnOnce() -> String) -> MattingResult<()> {
    if condition {
        Ok(())
    } else {
        Err(MattingError::InvalidParameter(message()))
    }
}

fn ensure_unit(name: &str, value: f32) -> MattingResult<()> {
    ensure((0.0..=1.0).contains(&value), || {
        format!("{name} must lie in [0, 1], got {value}")
    })
}

fn ensure_positive(name: &str, value: f32) -> MattingResult<()> {
    ensure(value.is_finite() && value > 0.0, || {
        format!("{name} must be positive, got {value}")
    })
}

/// Network input sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Length of the longer side fed to the network
    pub reference_size: u32,
    /// Both network input sides are rounded down to a multiple of this
    pub size_multiple: u32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            reference_size: 512,
            size_multiple: 32,
        }
    }
}

/// Trimap construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimapConfig {
    /// Alpha above which a pixel counts as confident foreground
    pub foreground_threshold: f32,
    pub erosion_radius: u32,
    pub dilation_radius: u32,
}

impl Default for TrimapConfig {
    fn default() -> Self {
        Self {
            foreground_threshold: 240.0 / 255.0,
            erosion_radius: 4,
            dilation_radius: 12,
        }
    }
}

/// Guided-filter refinement of the unknown region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinerConfig {
    pub radius: u32,
    pub epsilon: f32,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            radius: 4,
            epsilon: 1e-6,
        }
    }
}

/// Hair edge recovery heuristics
///
/// Lightness values are perceptual L* scaled to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HairConfig {
    /// Below this lightness a pixel is dark hair
    pub dark_lightness: f32,
    /// Medium-dark band `[min, max)` also counts as hair
    pub medium_lightness_min: f32,
    pub medium_lightness_max: f32,
    /// Alpha above which a pixel is solid foreground
    pub solid_alpha: f32,
    /// Alpha above which a pixel seeds the search zone
    pub seed_alpha: f32,
    pub search_radius: u32,
    /// Hair-coloured pixels below this alpha are cut-off candidates
    pub candidate_alpha: f32,
    /// Distance from solid foreground at which the boost reaches zero
    pub max_extension: f32,
    pub extension_strength: f32,
    pub falloff_exponent: f32,
    /// Lightness at which the darkness bonus vanishes
    pub darkness_ceiling: f32,
    pub darkness_range: f32,
    pub weak_alpha_min: f32,
    pub weak_alpha_max: f32,
    pub weak_gain: f32,
    pub weak_offset: f32,
    pub smoothing_radius: u32,
    pub smoothing_epsilon: f32,
    /// Noise removal only applies this far from solid foreground
    pub noise_distance: f32,
    pub noise_alpha: f32,
    pub noise_lightness: f32,
    pub solidify_threshold: f32,
}

impl Default for HairConfig {
    fn default() -> Self {
        Self {
            dark_lightness: 0.55,
            medium_lightness_min: 0.35,
            medium_lightness_max: 0.7,
            solid_alpha: 0.7,
            seed_alpha: 0.05,
            search_radius: 25,
            candidate_alpha: 0.3,
            max_extension: 40.0,
            extension_strength: 0.7,
            falloff_exponent: 2.0,
            darkness_ceiling: 0.7,
            darkness_range: 0.5,
            weak_alpha_min: 0.02,
            weak_alpha_max: 0.5,
            weak_gain: 1.5,
            weak_offset: 0.15,
            smoothing_radius: 8,
            smoothing_epsilon: 0.01,
            noise_distance: 50.0,
            noise_alpha: 0.01,
            noise_lightness: 0.8,
            solidify_threshold: 0.95,
        }
    }
}

/// Edge-aware alpha denoising
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Sobel magnitude above which a pixel is an alpha edge
    pub gradient_threshold: f32,
    pub edge_protection_radius: u32,
    pub noise_threshold: f32,
    pub solidify_threshold: f32,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            gradient_threshold: 0.005,
            edge_protection_radius: 5,
            noise_threshold: 0.015,
            solidify_threshold: 0.99,
        }
    }
}

/// Foreground colour decontamination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecontaminationConfig {
    /// Pixels above this alpha are never recoloured
    pub solid_alpha: f32,
    pub edge_alpha_min: f32,
    /// Fixed number of colour propagation passes
    pub iterations: u32,
    pub propagation_sigma: f32,
    /// Smoothed known-mask weight at which a pixel becomes known
    pub known_threshold: f32,
    pub max_blend: f32,
    pub blend_sigma: f32,
    /// Mean absolute channel deviation below which a pixel is grey
    pub grey_deviation: f32,
    pub grey_alpha_max: f32,
    pub grey_strength: f32,
    /// Solid pixels within this distance of the edge are sampled for the median
    pub sample_radius: u32,
    pub min_samples: usize,
    pub smoothing_strength: f32,
    pub smoothing_sigma: f32,
    pub bilateral_radius: u32,
    pub bilateral_sigma_color: f32,
    pub bilateral_sigma_space: f32,
}

impl Default for DecontaminationConfig {
    fn default() -> Self {
        Self {
            solid_alpha: 0.85,
            edge_alpha_min: 0.03,
            iterations: 30,
            propagation_sigma: 1.5,
            known_threshold: 0.1,
            max_blend: 0.95,
            blend_sigma: 2.0,
            grey_deviation: 15.0,
            grey_alpha_max: 0.6,
            grey_strength: 0.6,
            sample_radius: 7,
            min_samples: 100,
            smoothing_strength: 0.3,
            smoothing_sigma: 1.5,
            bilateral_radius: 2,
            bilateral_sigma_color: 20.0,
            bilateral_sigma_space: 20.0,
        }
    }
}

/// Compositing and face-centred cropping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    pub background: [u8; 3],
    pub noise_alpha: f32,
    /// Alpha above which a pixel anchors the "near foreground" zone
    pub foreground_alpha: f32,
    pub near_radius: u32,
    pub noise_lightness: f32,
    /// Crop side as a multiple of the larger face side
    pub crop_scale: f32,
    /// Upward crop shift as a fraction of face height
    pub upward_shift: f32,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            background: [255, 255, 255],
            noise_alpha: 0.003,
            foreground_alpha: 0.3,
            near_radius: 22,
            noise_lightness: 0.85,
            crop_scale: 2.2,
            upward_shift: 0.25,
        }
    }
}

/// Cosmetic finishing pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    pub enabled: bool,
    /// Lift added to L* (0-100 scale)
    pub lightness_lift: f32,
    /// Weight of each of the eight neighbours in the sharpening kernel
    pub sharpen_amount: f32,
    pub bilateral_radius: u32,
    pub bilateral_sigma_color: f32,
    pub bilateral_sigma_space: f32,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lightness_lift: 5.0 * 100.0 / 255.0,
            sharpen_amount: 0.1,
            bilateral_radius: 2,
            bilateral_sigma_color: 15.0,
            bilateral_sigma_space: 15.0,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MattingConfig {
    pub normalizer: NormalizerConfig,
    pub trimap: TrimapConfig,
    pub refiner: RefinerConfig,
    pub hair: HairConfig,
    pub cleanup: CleanupConfig,
    pub decontamination: DecontaminationConfig,
    pub composite: CompositeConfig,
    pub enhance: EnhanceConfig,
    /// Run hair edge recovery
    pub hair_refinement: bool,
    /// S-curve strength applied to the clean alpha, if any
    pub soft_contrast: Option<f32>,
    /// Fail with `DegenerateMask` instead of returning a transparent matte
    pub reject_degenerate_mask: bool,
}

impl Default for MattingConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            trimap: TrimapConfig::default(),
            refiner: RefinerConfig::default(),
            hair: HairConfig::default(),
            cleanup: CleanupConfig::default(),
            decontamination: DecontaminationConfig::default(),
            composite: CompositeConfig::default(),
            enhance: EnhanceConfig::default(),
            hair_refinement: true,
            soft_contrast: None,
            reject_degenerate_mask: false,
        }
    }
}

impl MattingConfig {
    /// Checks every field for values the stages cannot work with
    ///
    /// # Errors
    ///
    /// * `MattingError::InvalidParameter` naming the first offending field
    pub fn validate(&self) -> MattingResult<()> {
        let n = &self.normalizer;
        ensure(n.size_multiple > 0, || "size_multiple must be positive".into())?;
        ensure(n.reference_size >= n.size_multiple, || {
            format!(
                "reference_size {} is smaller than size_multiple {}",
                n.reference_size, n.size_multiple
            )
        })?;

        ensure_unit("trimap.foreground_threshold", self.trimap.foreground_threshold)?;

        ensure(self.refiner.radius > 0, || "refiner.radius must be positive".into())?;
        ensure_positive("refiner.epsilon", self.refiner.epsilon)?;

        let h = &self.hair;
        ensure(h.medium_lightness_min <= h.medium_lightness_max, || {
            "hair.medium_lightness_min exceeds medium_lightness_max".into()
        })?;
        ensure(h.weak_alpha_min <= h.weak_alpha_max, || {
            "hair.weak_alpha_min exceeds weak_alpha_max".into()
        })?;
        ensure_unit("hair.solid_alpha", h.solid_alpha)?;
        ensure_unit("hair.seed_alpha", h.seed_alpha)?;
        ensure_positive("hair.max_extension", h.max_extension)?;
        ensure_positive("hair.darkness_range", h.darkness_range)?;
        ensure(h.smoothing_radius > 0, || "hair.smoothing_radius must be positive".into())?;
        ensure_positive("hair.smoothing_epsilon", h.smoothing_epsilon)?;

        ensure_unit("cleanup.noise_threshold", self.cleanup.noise_threshold)?;
        ensure_unit("cleanup.solidify_threshold", self.cleanup.solidify_threshold)?;

        let d = &self.decontamination;
        ensure(d.edge_alpha_min < d.solid_alpha, || {
            "decontamination.edge_alpha_min must be below solid_alpha".into()
        })?;
        ensure_unit("decontamination.solid_alpha", d.solid_alpha)?;
        ensure_unit("decontamination.max_blend", d.max_blend)?;
        ensure_positive("decontamination.propagation_sigma", d.propagation_sigma)?;
        ensure_positive("decontamination.known_threshold", d.known_threshold)?;
        ensure_positive("decontamination.blend_sigma", d.blend_sigma)?;
        ensure_positive("decontamination.smoothing_sigma", d.smoothing_sigma)?;
        ensure_positive("decontamination.bilateral_sigma_color", d.bilateral_sigma_color)?;
        ensure_positive("decontamination.bilateral_sigma_space", d.bilateral_sigma_space)?;

        let c = &self.composite;
        ensure_positive("composite.crop_scale", c.crop_scale)?;
        ensure(c.upward_shift >= 0.0, || "composite.upward_shift must not be negative".into())?;
        ensure_unit("composite.noise_alpha", c.noise_alpha)?;

        let e = &self.enhance;
        ensure_positive("enhance.bilateral_sigma_color", e.bilateral_sigma_color)?;
        ensure_positive("enhance.bilateral_sigma_space", e.bilateral_sigma_space)?;

        if let Some(strength) = self.soft_contrast {
            ensure((0.0..=1.0).contains(&strength), || {
                format!("soft_contrast must lie in [0, 1], got {strength}")
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MattingConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.hair_refinement);
        assert!(config.soft_contrast.is_none());
    }

    #[test]
    fn zero_refiner_radius_is_rejected() {
        let mut config = MattingConfig::default();
        config.refiner.radius = 0;
        assert!(matches!(
            config.validate(),
            Err(MattingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn inverted_decontamination_band_is_rejected() {
        let mut config = MattingConfig::default();
        config.decontamination.edge_alpha_min = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_soft_contrast_is_rejected() {
        let config = MattingConfig {
            soft_contrast: Some(1.5),
            ..MattingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
