//! Camera and overlay error types.

use thiserror::Error;

/// Errors that can occur while configuring the camera or decoding scene images.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Camera parameters that cannot describe a pinhole camera.
    #[error("invalid camera: {0}")]
    InvalidCamera(String),

    /// Configured field of view disagrees with the pixel intrinsics.
    #[error(
        "{axis} field of view {configured:.4} rad does not match {derived:.4} rad derived from intrinsics"
    )]
    InconsistentFov {
        axis: &'static str,
        configured: f32,
        derived: f32,
    },

    /// The camera image is not a base64 `data:image/...` URL.
    #[error("invalid image data URL: {0}")]
    InvalidDataUrl(String),

    /// Base64 payload could not be decoded.
    #[error("base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Image payload could not be decoded.
    #[error("image decoding failed: {0}")]
    Image(#[from] image::ImageError),

    /// Decoded image size differs from the declared size.
    #[error("image is {actual_width}x{actual_height}, expected {width}x{height}")]
    ImageSizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// A specialized Result type for camera and overlay operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
