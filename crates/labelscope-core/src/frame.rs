//! Conversion between the vehicle frame and the render frame.
//!
//! The vehicle frame follows ISO 8855: x forward, y left, z up. The render
//! frame used by the display surface is x right, y up, z forward. The mapping
//! is a fixed permutation with one sign flip:
//!
//! ```text
//! render.x = -vehicle.y
//! render.y =  vehicle.z
//! render.z =  vehicle.x
//! ```
//!
//! Every position, direction, box extent, or yaw that crosses the boundary
//! goes through this module exactly once. Call sites never remap axes inline.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::annotation::{Box3d, BoxSize};

/// A position expressed in the vehicle frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehiclePoint(pub Vec3);

/// A position expressed in the render frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderPoint(pub Vec3);

impl VehiclePoint {
    /// Creates a vehicle-frame point from forward, left, and up components.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }

    /// Converts this point into the render frame.
    pub fn to_render(self) -> RenderPoint {
        to_render_frame(self)
    }
}

impl RenderPoint {
    /// Creates a render-frame point from right, up, and forward components.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }

    /// Converts this point into the vehicle frame.
    pub fn to_vehicle(self) -> VehiclePoint {
        from_render_frame(self)
    }
}

/// Maps a vehicle-frame point into the render frame.
pub fn to_render_frame(p: VehiclePoint) -> RenderPoint {
    RenderPoint(vector_to_render_frame(p.0))
}

/// Maps a render-frame point back into the vehicle frame.
pub fn from_render_frame(p: RenderPoint) -> VehiclePoint {
    VehiclePoint(vector_from_render_frame(p.0))
}

/// Maps a vehicle-frame direction into the render frame.
///
/// Directions use the same permutation as positions; there is no translation
/// between the frames.
pub fn vector_to_render_frame(v: Vec3) -> Vec3 {
    Vec3::new(-v.y, v.z, v.x)
}

/// Maps a render-frame direction back into the vehicle frame.
pub fn vector_from_render_frame(v: Vec3) -> Vec3 {
    Vec3::new(v.z, -v.x, v.y)
}

/// Returns the box extents along the render x, y, and z axes.
///
/// Width spans vehicle x (render z), depth spans vehicle y (render x), and
/// height spans vehicle z (render y). Extents are unsigned, so the sign flip
/// on render x does not apply.
pub fn size_to_render_extents(size: BoxSize) -> Vec3 {
    Vec3::new(size.depth, size.height, size.width)
}

/// Inverse of [`size_to_render_extents`].
pub fn size_from_render_extents(extents: Vec3) -> BoxSize {
    BoxSize {
        width: extents.z,
        height: extents.y,
        depth: extents.x,
    }
}

/// Maps a yaw about vehicle z into a rotation about render y.
///
/// A counter-clockwise turn seen from above (x toward y) in the vehicle frame
/// turns render z toward -render x, which is a negative rotation about +y in
/// the right-handed render frame.
pub fn yaw_to_render_frame(yaw: f32) -> f32 {
    -yaw
}

/// Inverse of [`yaw_to_render_frame`].
pub fn yaw_from_render_frame(yaw: f32) -> f32 {
    -yaw
}

/// Placement of a [`Box3d`] in the render frame, for drawing it in the 3D view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPose {
    pub center: RenderPoint,
    /// Extents along render x, y, z before rotation.
    pub extents: Vec3,
    /// Rotation about render y, in radians.
    pub yaw: f32,
}

/// Converts a box's center, size, and yaw into the render frame.
pub fn box_to_render_pose(b: &Box3d) -> RenderPose {
    RenderPose {
        center: b.center.to_render(),
        extents: size_to_render_extents(b.size),
        yaw: yaw_to_render_frame(b.yaw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use proptest::prelude::*;

    #[test]
    fn test_axis_mapping() {
        assert_eq!(to_render_frame(VehiclePoint(Vec3::X)).0, Vec3::Z);
        assert_eq!(to_render_frame(VehiclePoint(Vec3::Y)).0, Vec3::NEG_X);
        assert_eq!(to_render_frame(VehiclePoint(Vec3::Z)).0, Vec3::Y);
    }

    #[test]
    fn test_point_ahead_is_forward_in_render_frame() {
        let p = VehiclePoint::new(5.0, 0.0, 0.0).to_render();
        assert_eq!(p, RenderPoint::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_size_extents_follow_axis_permutation() {
        let size = BoxSize::new(4.5, 1.4, 1.8);
        let extents = size_to_render_extents(size);
        // Length along vehicle x shows up along render z.
        assert_eq!(extents, Vec3::new(1.8, 1.4, 4.5));
        assert_eq!(size_from_render_extents(extents), size);
    }

    #[test]
    fn test_yaw_matches_rotated_axis() {
        let yaw = 0.7_f32;
        // Vehicle forward axis rotated about vehicle z.
        let vehicle_dir = Quat::from_rotation_z(yaw) * Vec3::X;
        // Render forward axis rotated about render y.
        let render_dir = Quat::from_rotation_y(yaw_to_render_frame(yaw)) * Vec3::Z;
        assert!((vector_to_render_frame(vehicle_dir) - render_dir).length() < 1e-6);
    }

    #[test]
    fn test_render_pose_corners_match_vehicle_corners() {
        let b = Box3d {
            id: crate::annotation::Box3dId(0),
            label: "car".to_string(),
            center: VehiclePoint::new(10.0, 2.0, 0.9),
            size: BoxSize::new(4.5, 1.4, 1.8),
            yaw: 0.4,
            created_at: chrono::Utc::now(),
            linked_2d: None,
        };
        let pose = box_to_render_pose(&b);
        let rotation = Quat::from_rotation_y(pose.yaw);
        // Corner 6 is (+x, +y, +z) in the box's own vehicle axes, which is
        // (-x, +y, +z) in render axes.
        let local = Vec3::new(-pose.extents.x, pose.extents.y, pose.extents.z) * 0.5;
        let render_corner = pose.center.0 + rotation * local;
        assert!((render_corner - b.corners()[6].to_render().0).length() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_round_trip(x in -1.0e4f32..1.0e4, y in -1.0e4f32..1.0e4, z in -1.0e4f32..1.0e4) {
            let p = VehiclePoint::new(x, y, z);
            prop_assert_eq!(from_render_frame(to_render_frame(p)), p);
        }

        #[test]
        fn prop_reverse_round_trip(x in -1.0e4f32..1.0e4, y in -1.0e4f32..1.0e4, z in -1.0e4f32..1.0e4) {
            let p = RenderPoint::new(x, y, z);
            prop_assert_eq!(to_render_frame(from_render_frame(p)), p);
        }
    }
}
