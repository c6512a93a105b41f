//! Annotation entities: 3D boxes in the vehicle frame and 2D boxes in
//! normalized image space.

use std::fmt;

use chrono::{DateTime, Utc};
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::frame::VehiclePoint;

/// Identifier of a [`Box3d`], unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Box3dId(pub u32);

/// Identifier of a [`Box2d`], unique within a session.
///
/// The number is the creation order index of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Box2dId(pub u32);

impl fmt::Display for Box3dId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "box3d_{}", self.0)
    }
}

impl fmt::Display for Box2dId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "box2d_{}", self.0)
    }
}

/// Dimensions of a 3D box.
///
/// In the vehicle frame, `width` spans x (forward), `depth` spans y (left),
/// and `height` spans z (up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSize {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl BoxSize {
    /// Creates a new size.
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Returns the size as `[width, height, depth]`.
    pub fn to_array(self) -> [f32; 3] {
        [self.width, self.height, self.depth]
    }

    /// Returns whether every dimension is finite and strictly positive.
    pub fn is_valid(self) -> bool {
        self.to_array().iter().all(|d| d.is_finite() && *d > 0.0)
    }

    /// Half extents along vehicle x, y, z.
    pub fn half_extents(self) -> Vec3 {
        Vec3::new(self.width, self.depth, self.height) * 0.5
    }
}

/// A 3D bounding box annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Box3d {
    pub id: Box3dId,
    pub label: String,
    /// Box center in the vehicle frame.
    pub center: VehiclePoint,
    pub size: BoxSize,
    /// Rotation about the vehicle up axis, in radians.
    pub yaw: f32,
    pub created_at: DateTime<Utc>,
    /// Optional user-recorded link to the matching 2D box.
    pub linked_2d: Option<Box2dId>,
}

impl Box3d {
    /// Returns the eight corners in the vehicle frame.
    ///
    /// The first four corners lie on the bottom face, the last four on the top
    /// face, both in counter-clockwise order seen from above.
    pub fn corners(&self) -> [VehiclePoint; 8] {
        let half = self.size.half_extents();
        let rotation = Quat::from_rotation_z(self.yaw);
        let signs = [
            (-1.0, -1.0, -1.0),
            (1.0, -1.0, -1.0),
            (1.0, 1.0, -1.0),
            (-1.0, 1.0, -1.0),
            (-1.0, -1.0, 1.0),
            (1.0, -1.0, 1.0),
            (1.0, 1.0, 1.0),
            (-1.0, 1.0, 1.0),
        ];
        signs.map(|(sx, sy, sz)| {
            let local = Vec3::new(sx * half.x, sy * half.y, sz * half.z);
            VehiclePoint(self.center.0 + rotation * local)
        })
    }

    /// Returns whether a vehicle-frame point lies inside the box.
    pub fn contains(&self, p: VehiclePoint) -> bool {
        let local = Quat::from_rotation_z(-self.yaw) * (p.0 - self.center.0);
        let half = self.size.half_extents();
        local.x.abs() <= half.x && local.y.abs() <= half.y && local.z.abs() <= half.z
    }
}

/// A point in normalized image space; both coordinates are fractions of the
/// image extent with the origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamps both coordinates into `[0, 1]`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }
}

impl From<Vec2> for NormalizedPoint {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// An axis-aligned rectangle in normalized image space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle spanning two corner points in any order.
    pub fn from_corners(a: NormalizedPoint, b: NormalizedPoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Check if a point is inside the rectangle.
    pub fn contains(&self, p: NormalizedPoint) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Converts to pixel coordinates for an image of the given size.
    pub fn to_pixels(&self, width: f32, height: f32) -> (Vec2, Vec2) {
        (
            Vec2::new(self.x * width, self.y * height),
            Vec2::new(self.width * width, self.height * height),
        )
    }
}

/// A 2D bounding box annotation on the camera image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Box2d {
    pub id: Box2dId,
    pub label: String,
    pub rect: NormalizedRect,
    /// Optional user-recorded link to the matching 3D box.
    pub linked_3d: Option<Box3dId>,
}
