//! Pinhole camera model: frustum geometry and point projection.
//!
//! The camera looks along render +z with render +y up. Points are converted to
//! the render frame once, at the start of projection.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use labelscope_core::{Box3d, RenderPoint, VehiclePoint};

use crate::error::{RenderError, RenderResult};

/// Points closer to the camera plane than this depth are not projected.
pub const NEAR_CLIP_EPSILON: f32 = 0.1;

/// Largest accepted difference, in radians, between a configured field of
/// view and the one derived from the pixel intrinsics.
pub const FOV_TOLERANCE: f32 = 1e-3;

/// Camera position, tagged with the frame it is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraPosition {
    Vehicle(VehiclePoint),
    Render(RenderPoint),
}

impl CameraPosition {
    /// Returns the position in the render frame.
    pub fn to_render(self) -> RenderPoint {
        match self {
            CameraPosition::Vehicle(p) => p.to_render(),
            CameraPosition::Render(p) => p,
        }
    }
}

impl Default for CameraPosition {
    fn default() -> Self {
        CameraPosition::Vehicle(VehiclePoint::default())
    }
}

/// Frustum geometry. Angles are in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrustumParams {
    pub fov_h: f32,
    pub fov_v: f32,
    pub near: f32,
    pub far: f32,
}

/// Pixel intrinsics used for projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    pub width: u32,
    pub height: u32,
}

impl PixelIntrinsics {
    /// Returns the horizontal and vertical field of view implied by the focal
    /// lengths and image size.
    pub fn fov(&self) -> (f32, f32) {
        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (self.width as f32, self.height as f32);
        (
            2.0 * (w / (2.0 * self.fx)).atan(),
            2.0 * (h / (2.0 * self.fy)).atan(),
        )
    }
}

/// Size of the drawing surface the overlay is rendered to, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns whether a pixel lies in `[0, width) x [0, height)`.
    pub fn contains(&self, pixel: Vec2) -> bool {
        pixel.x >= 0.0 && pixel.x < self.width && pixel.y >= 0.0 && pixel.y < self.height
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(800.0, 400.0)
    }
}

/// Outcome of projecting a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// The point lands on the canvas.
    Visible {
        /// Canvas pixel.
        pixel: Vec2,
        /// Camera-relative depth along render z.
        depth: f32,
        /// Euclidean camera-relative distance.
        distance: f32,
    },
    /// The point is behind, at, or too close to the camera plane.
    BehindCamera,
    /// The point projects outside the canvas.
    OutOfBounds,
}

impl Projection {
    pub fn is_visible(&self) -> bool {
        matches!(self, Projection::Visible { .. })
    }

    pub fn pixel(&self) -> Option<Vec2> {
        match self {
            Projection::Visible { pixel, .. } => Some(*pixel),
            _ => None,
        }
    }
}

/// An axis-aligned pixel rectangle on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl PixelRect {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Frustum corners in the render frame.
///
/// Corners are ordered bottom-left, bottom-right, top-right, top-left as seen
/// from the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub near: [Vec3; 4],
    pub far: [Vec3; 4],
}

impl Frustum {
    /// Returns the 12 wireframe edges: 4 on the near plane, 4 on the far
    /// plane, and 4 connecting them.
    pub fn edges(&self) -> [(Vec3, Vec3); 12] {
        let n = self.near;
        let f = self.far;
        [
            (n[0], n[1]),
            (n[1], n[2]),
            (n[2], n[3]),
            (n[3], n[0]),
            (f[0], f[1]),
            (f[1], f[2]),
            (f[2], f[3]),
            (f[3], f[0]),
            (n[0], f[0]),
            (n[1], f[1]),
            (n[2], f[2]),
            (n[3], f[3]),
        ]
    }
}

/// A pinhole camera.
///
/// The frustum angles and the pixel intrinsics are stored separately; use
/// [`CameraParams::validate`] to check that they agree, or
/// [`CameraParams::from_intrinsics`] to derive the angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    pub position: CameraPosition,
    pub frustum: FrustumParams,
    pub intrinsics: PixelIntrinsics,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self::automotive_front()
    }
}

impl CameraParams {
    /// Creates a camera whose field of view is derived from its intrinsics.
    pub fn from_intrinsics(
        position: CameraPosition,
        intrinsics: PixelIntrinsics,
        near: f32,
        far: f32,
    ) -> Self {
        let (fov_h, fov_v) = intrinsics.fov();
        Self {
            position,
            frustum: FrustumParams {
                fov_h,
                fov_v,
                near,
                far,
            },
            intrinsics,
        }
    }

    /// Forward-facing automotive camera mounted 2 m ahead of the vehicle
    /// origin at 2 m height, 3840x1920 pixels.
    pub fn automotive_front() -> Self {
        Self::from_intrinsics(
            CameraPosition::Vehicle(VehiclePoint::new(2.0, 0.0, 2.0)),
            PixelIntrinsics {
                fx: 1920.0,
                fy: 1920.0,
                cx: 1920.0,
                cy: 960.0,
                width: 3840,
                height: 1920,
            },
            1.0,
            50.0,
        )
    }

    /// Field of view derived from the intrinsics, `(horizontal, vertical)`.
    pub fn derived_fov(&self) -> (f32, f32) {
        self.intrinsics.fov()
    }

    /// Checks that the parameters describe a usable camera and that the
    /// configured field of view agrees with the intrinsics.
    pub fn validate(&self) -> RenderResult<()> {
        let i = &self.intrinsics;
        if !(i.fx.is_finite() && i.fy.is_finite() && i.fx > 0.0 && i.fy > 0.0) {
            return Err(RenderError::InvalidCamera(format!(
                "focal lengths must be positive (fx={}, fy={})",
                i.fx, i.fy
            )));
        }
        if i.width == 0 || i.height == 0 {
            return Err(RenderError::InvalidCamera(format!(
                "image size must be non-zero ({}x{})",
                i.width, i.height
            )));
        }
        let f = &self.frustum;
        if !(f.near > 0.0 && f.near < f.far) {
            return Err(RenderError::InvalidCamera(format!(
                "clip distances must satisfy 0 < near < far (near={}, far={})",
                f.near, f.far
            )));
        }

        let (fov_h, fov_v) = self.derived_fov();
        for (axis, configured, derived) in [
            ("horizontal", f.fov_h, fov_h),
            ("vertical", f.fov_v, fov_v),
        ] {
            let error = (configured - derived).abs();
            if error.is_nan() || error > FOV_TOLERANCE {
                return Err(RenderError::InconsistentFov {
                    axis,
                    configured,
                    derived,
                });
            }
        }
        Ok(())
    }

    /// Returns the frustum corners in the render frame.
    pub fn frustum(&self) -> Frustum {
        let origin = self.position.to_render().0;
        let tan_h = (self.frustum.fov_h * 0.5).tan();
        let tan_v = (self.frustum.fov_v * 0.5).tan();
        let plane = |d: f32| {
            let hw = tan_h * d;
            let hh = tan_v * d;
            [
                origin + Vec3::new(-hw, -hh, d),
                origin + Vec3::new(hw, -hh, d),
                origin + Vec3::new(hw, hh, d),
                origin + Vec3::new(-hw, hh, d),
            ]
        };
        Frustum {
            near: plane(self.frustum.near),
            far: plane(self.frustum.far),
        }
    }

    /// Projects a vehicle-frame point to a canvas pixel.
    pub fn project_point(&self, point: VehiclePoint, canvas: Canvas) -> Projection {
        let Some((pixel, d)) = self.project_unclipped(point, canvas) else {
            return Projection::BehindCamera;
        };
        if !canvas.contains(pixel) {
            return Projection::OutOfBounds;
        }
        Projection::Visible {
            pixel,
            depth: d.z,
            distance: d.length(),
        }
    }

    /// Projects the eight corners of a box and returns their bounding
    /// rectangle clipped to the canvas.
    ///
    /// Returns `None` if any corner is behind the near-clip epsilon or the
    /// rectangle lies entirely off the canvas.
    pub fn project_box(&self, b: &Box3d, canvas: Canvas) -> Option<PixelRect> {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for corner in b.corners() {
            let (pixel, _) = self.project_unclipped(corner, canvas)?;
            min = min.min(pixel);
            max = max.max(pixel);
        }
        let bounds = Vec2::new(canvas.width, canvas.height);
        let min = min.clamp(Vec2::ZERO, bounds);
        let max = max.clamp(Vec2::ZERO, bounds);
        if min.x >= max.x || min.y >= max.y {
            return None;
        }
        Some(PixelRect { min, max })
    }

    /// Canvas pixel and camera-relative displacement, or `None` when the
    /// point is within the near-clip epsilon.
    fn project_unclipped(&self, point: VehiclePoint, canvas: Canvas) -> Option<(Vec2, Vec3)> {
        let d = point.to_render().0 - self.position.to_render().0;
        if d.z <= NEAR_CLIP_EPSILON {
            return None;
        }
        let i = &self.intrinsics;
        let image_px = Vec2::new(i.fx * d.x / d.z + i.cx, i.fy * -d.y / d.z + i.cy);
        #[allow(clippy::cast_precision_loss)]
        let scale = Vec2::new(canvas.width / i.width as f32, canvas.height / i.height as f32);
        Some((image_px * scale, d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelscope_core::{Box3dId, BoxSize};
    use proptest::prelude::*;

    fn centered_camera() -> CameraParams {
        CameraParams::from_intrinsics(
            CameraPosition::Vehicle(VehiclePoint::new(0.0, 0.0, 0.0)),
            PixelIntrinsics {
                fx: 400.0,
                fy: 400.0,
                cx: 400.0,
                cy: 200.0,
                width: 800,
                height: 400,
            },
            0.5,
            30.0,
        )
    }

    fn canvas() -> Canvas {
        Canvas::new(800.0, 400.0)
    }

    #[test]
    fn test_point_on_axis_projects_to_principal_point() {
        let projection = centered_camera().project_point(VehiclePoint::new(5.0, 0.0, 0.0), canvas());
        let Projection::Visible {
            pixel,
            depth,
            distance,
        } = projection
        else {
            panic!("expected visible projection, got {projection:?}");
        };
        assert!((pixel - Vec2::new(400.0, 200.0)).length() < 1e-4);
        assert!((depth - 5.0).abs() < 1e-6);
        assert!((distance - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_left_and_up_map_to_left_and_up_on_image() {
        let cam = centered_camera();
        let left = cam.project_point(VehiclePoint::new(5.0, 1.0, 0.0), canvas());
        let up = cam.project_point(VehiclePoint::new(5.0, 0.0, 1.0), canvas());
        assert!(left.pixel().unwrap().x < 400.0);
        assert!(up.pixel().unwrap().y < 200.0);
    }

    #[test]
    fn test_near_points_are_behind_camera() {
        let cam = centered_camera();
        assert_eq!(
            cam.project_point(VehiclePoint::new(0.05, 0.0, 0.0), canvas()),
            Projection::BehindCamera
        );
        assert_eq!(
            cam.project_point(VehiclePoint::new(-3.0, 0.0, 0.0), canvas()),
            Projection::BehindCamera
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let cam = centered_camera();
        let p = cam.project_point(VehiclePoint::new(1.0, -10.0, 0.0), canvas());
        assert_eq!(p, Projection::OutOfBounds);
    }

    #[test]
    fn test_canvas_scaling() {
        let cam = centered_camera();
        let half = Canvas::new(400.0, 200.0);
        let p = cam.project_point(VehiclePoint::new(5.0, 0.0, 0.0), half);
        assert!((p.pixel().unwrap() - Vec2::new(200.0, 100.0)).length() < 1e-4);
    }

    #[test]
    fn test_frustum_corners() {
        let cam = centered_camera();
        let frustum = cam.frustum();
        let (tan_h, tan_v) = (
            (cam.frustum.fov_h * 0.5).tan(),
            (cam.frustum.fov_v * 0.5).tan(),
        );
        assert!((frustum.near[2] - Vec3::new(tan_h * 0.5, tan_v * 0.5, 0.5)).length() < 1e-5);
        assert!((frustum.far[0] - Vec3::new(-tan_h * 30.0, -tan_v * 30.0, 30.0)).length() < 1e-3);
        assert_eq!(frustum.edges().len(), 12);
    }

    #[test]
    fn test_frustum_offset_by_render_position() {
        let mut cam = centered_camera();
        cam.position = CameraPosition::Vehicle(VehiclePoint::new(2.0, 0.0, 2.0));
        let frustum = cam.frustum();
        let center = frustum.near.iter().copied().sum::<Vec3>() / 4.0;
        assert!((center - Vec3::new(0.0, 2.0, 2.5)).length() < 1e-5);
    }

    #[test]
    fn test_automotive_front_is_consistent() {
        let cam = CameraParams::automotive_front();
        assert!(cam.validate().is_ok());
        assert!((cam.frustum.fov_h - 90.0_f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn test_inconsistent_fov_rejected() {
        let mut cam = CameraParams::automotive_front();
        cam.frustum.fov_h = 115.0_f32.to_radians();
        assert!(matches!(
            cam.validate(),
            Err(RenderError::InconsistentFov {
                axis: "horizontal",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_camera_rejected() {
        let mut cam = centered_camera();
        cam.frustum.near = 40.0;
        assert!(matches!(cam.validate(), Err(RenderError::InvalidCamera(_))));
    }

    #[test]
    fn test_project_box() {
        let cam = centered_camera();
        let b = Box3d {
            id: Box3dId(0),
            label: "car".to_string(),
            center: VehiclePoint::new(10.0, 0.0, 0.0),
            size: BoxSize::new(2.0, 2.0, 2.0),
            yaw: 0.0,
            created_at: chrono::Utc::now(),
            linked_2d: None,
        };
        let rect = cam.project_box(&b, canvas()).unwrap();
        // Nearest face at depth 9 spans +-1 m: 400 * 1 / 9 pixels each side.
        assert!((rect.min.x - (400.0 - 400.0 / 9.0)).abs() < 1e-3);
        assert!((rect.max.y - (200.0 + 400.0 / 9.0)).abs() < 1e-3);

        let mut behind = b.clone();
        behind.center = VehiclePoint::new(0.5, 0.0, 0.0);
        assert!(cam.project_box(&behind, canvas()).is_none());
    }

    #[test]
    fn test_camera_position_json() {
        let json = r#"{ "vehicle": [2.0, 0.0, 2.0] }"#;
        let position: CameraPosition = serde_json::from_str(json).unwrap();
        assert_eq!(position.to_render(), RenderPoint::new(0.0, 2.0, 2.0));
    }

    proptest! {
        #[test]
        fn prop_near_points_never_visible(
            depth in -10.0f32..0.1,
            y in -5.0f32..5.0,
            z in -5.0f32..5.0,
        ) {
            let p = VehiclePoint::new(depth, y, z);
            prop_assert_eq!(centered_camera().project_point(p, canvas()), Projection::BehindCamera);
        }
    }
}
