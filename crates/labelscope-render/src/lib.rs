//! Camera model and projection overlay for labelscope.
//!
//! This crate provides:
//! - The pinhole camera: frustum geometry, point and box projection
//! - The projection overlay computed for an external display surface
//! - Decoding of camera images embedded in scene responses

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod camera_image;
pub mod error;
pub mod overlay;

pub use camera::{
    CameraParams, CameraPosition, Canvas, Frustum, FrustumParams, PixelIntrinsics, PixelRect,
    Projection, FOV_TOLERANCE, NEAR_CLIP_EPSILON,
};
pub use camera_image::{decode_camera_image, encode_png_data_url, parse_data_url};
pub use error::{RenderError, RenderResult};
pub use overlay::{
    BoxOutline, HeightTier, MarkerInstance, OverlayMarker, OverlaySurface, ProjectionOverlay,
};
