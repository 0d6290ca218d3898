use thiserror::Error;

/// Errors raised while picking or cropping an image.
///
/// Carries strings instead of source errors so it can travel inside
/// UI messages, which must be `Clone`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CaptureError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("{0} is not a supported image")]
    UnsupportedFormat(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode cropped image: {0}")]
    Encode(String),

    #[error("no image selected")]
    NoImage,

    #[error("finish or cancel cropping before choosing another image")]
    Busy,

    #[error("not cropping")]
    NotCropping,

    #[error("displayed image has no area")]
    InvalidDisplay,
}
