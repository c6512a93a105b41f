//! labelscope: geometry and correspondence core for annotating lidar point
//! clouds with a paired camera image.
//!
//! The crate keeps the 3D view and the 2D image view geometrically
//! consistent: it converts between the vehicle frame (x forward, y left,
//! z up) and the render frame (x right, y up, z forward), projects points
//! and boxes through a pinhole camera, maintains the zoom/pan transform of
//! the image panel, and owns the 3D and 2D annotations.
//!
//! Rendering, picking and networking are left to the host. The host forwards
//! events (pointer, wheel, drag gestures), implements [`SceneService`] to
//! deliver scenes, and implements [`OverlaySurface`] to draw the projection
//! overlay.
//!
//! # Quick Start
//!
//! ```no_run
//! use labelscope::*;
//!
//! fn main() -> Result<()> {
//!     init(SessionConfig::default())?;
//!
//!     // A drag over the image panel, in screen pixels.
//!     begin_box_2d(DVec2::new(100.0, 80.0));
//!     if let Some(sign) = finish_box_2d(DVec2::new(220.0, 160.0)) {
//!         sign.set_label("traffic_sign")?;
//!     }
//!
//!     println!("{}", export_annotations().to_json_pretty()?);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`labelscope_core`] - frames, annotations, viewport, scene data, options
//! - [`labelscope_render`] - camera model and projection overlay
//! - this crate - [`Session`], the global context, and the handle API

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

mod annotations;
mod config;
mod init;
mod scene;
mod session;
pub mod state;
mod view;

pub use labelscope_core::{
    error::{LabelscopeError, Result},
    frame, AnnotationExport, AnnotationStore, Box2d, Box2dId, Box3d, Box3dId, BoxEdit, BoxSize,
    CameraImage, DVec2, EditHandles, HandleAxis, HandleMode, LidarPoint, NormalizedPoint,
    NormalizedRect, Options, PointCloud, PointerButton, RenderPoint, RenderPose, SceneResponse,
    ScenePreset, SceneSnapshot, Vec2, Vec3, VehiclePoint, ViewportTransform, ZoomDirection,
};
pub use labelscope_render::{
    decode_camera_image, encode_png_data_url, BoxOutline, CameraParams, CameraPosition, Canvas,
    Frustum, FrustumParams, HeightTier, MarkerInstance, OverlayMarker, OverlaySurface,
    PixelIntrinsics, PixelRect, Projection, RenderError,
};

pub use annotations::*;
pub use config::SessionConfig;
pub use init::*;
pub use scene::*;
pub use session::{fetch_scene, Gesture, SceneService, Session};
pub use state::{try_with_session, try_with_session_mut, with_session, with_session_mut};
pub use view::*;

/// Wraps a camera or overlay error.
pub(crate) fn render_error(err: RenderError) -> LabelscopeError {
    LabelscopeError::Render(err.to_string())
}
