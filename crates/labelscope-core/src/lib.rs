//! Core abstractions for labelscope.
//!
//! This crate holds the geometry and bookkeeping that does not depend on any
//! rendering backend:
//! - [`frame`] converts between the vehicle frame (ISO 8855) and the render frame
//! - [`AnnotationStore`] owns 3D and 2D boxes, selection, edit handles and links
//! - [`Viewport`] implements the zoom/pan transform of the image panel
//! - Scene data model, annotation export, and configuration options

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod annotation;
pub mod error;
pub mod export;
pub mod frame;
pub mod handles;
pub mod options;
pub mod scene;
pub mod store;
pub mod viewport;

pub use annotation::{Box2d, Box2dId, Box3d, Box3dId, BoxSize, NormalizedPoint, NormalizedRect};
pub use error::{LabelscopeError, Result};
pub use export::{AnnotationExport, Box2dRecord, Box3dRecord, ExportMetadata};
pub use frame::{box_to_render_pose, RenderPoint, RenderPose, VehiclePoint};
pub use handles::{EditHandles, HandleAxis, HandleMode};
pub use options::{Box2dOptions, Box3dOptions, Options, OverlayOptions, ViewportOptions};
pub use scene::{
    CameraImage, LidarPoint, PointCloud, PointCloudBounds, SceneResponse, ScenePreset,
    SceneSnapshot,
};
pub use store::{AnnotationStore, BoxEdit};
pub use viewport::{PanState, PointerButton, Viewport, ViewportTransform, ZoomDirection};

// Re-export glam types for convenience
pub use glam::{DVec2, Vec2, Vec3};
