use thiserror::Error;

/// Result type used throughout the matting pipeline
pub type MattingResult<T> = Result<T, MattingError>;

/// Error type for the matting and compositing pipeline
///
/// Every variant is fatal for the request that produced it. The pipeline
/// never retries internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MattingError {
    /// The input bytes are not a decodable image
    ///
    /// Raised before the segmentation model is invoked.
    #[error("Failed to decode input image: {0}")]
    Decode(String),

    /// The segmentation model cannot be invoked
    ///
    /// The pipeline never substitutes a default mask when this happens.
    #[error("Segmentation model unavailable: {0}")]
    ModelUnavailable(String),

    /// The segmentation model returned something that violates its contract
    #[error("Inference error: {0}")]
    Inference(String),

    /// The soft mask has no pixel above the foreground threshold
    ///
    /// Only returned when strict mode is enabled in the configuration;
    /// otherwise the pipeline produces a fully transparent matte.
    #[error("Segmentation mask contains no confident foreground")]
    DegenerateMask,

    /// Two inputs that must share a size do not
    #[error("Dimensions do not match: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },

    /// Invalid parameter provided to an operation
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An operation received an image with a zero dimension
    #[error("Image dimensions must be non-zero")]
    EmptyImage,
}

impl MattingError {
    /// Create a new invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a new model unavailable error
    pub fn model_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }
}

impl From<image::ImageError> for MattingError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Error type for box and guided filter operations
///
/// This error type represents invalid filter parameters and
/// mismatched guide/input planes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// The filter was applied to an image with a zero dimension
    #[error("Cannot filter an empty image")]
    EmptyImage,

    /// The window radius is zero
    #[error("Invalid radius: {radius}. Radius must be greater than 0")]
    InvalidRadius { radius: u32 },

    /// The regularisation term is not strictly positive
    #[error("Invalid epsilon: {epsilon}. Epsilon must be greater than 0")]
    InvalidEpsilon { epsilon: f32 },

    /// Guide and input planes have different sizes
    #[error("Guide dimensions {guide_dims:?} do not match input dimensions {input_dims:?}")]
    DimensionMismatch {
        guide_dims: (u32, u32),
        input_dims: (u32, u32),
    },
}

impl From<FilterError> for MattingError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::EmptyImage => Self::EmptyImage,
            FilterError::DimensionMismatch {
                guide_dims,
                input_dims,
            } => Self::DimensionMismatch {
                expected: guide_dims,
                actual: input_dims,
            },
            other => Self::InvalidParameter(other.to_string()),
        }
    }
}
