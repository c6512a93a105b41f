//! Scene data delivered by the external scene service.
//!
//! A [`SceneResponse`] is the raw wire form. It becomes a [`SceneSnapshot`]
//! only after validation, so the rest of the session never sees a partially
//! valid scene.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{LabelscopeError, Result};
use crate::frame::VehiclePoint;

/// A single lidar return in the vehicle frame.
///
/// Serialized as `[x, y, z, intensity]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct LidarPoint {
    pub position: VehiclePoint,
    pub intensity: f32,
}

impl LidarPoint {
    pub fn new(x: f32, y: f32, z: f32, intensity: f32) -> Self {
        Self {
            position: VehiclePoint::new(x, y, z),
            intensity,
        }
    }

    fn is_finite(&self) -> bool {
        self.position.0.is_finite() && self.intensity.is_finite()
    }
}

impl From<[f32; 4]> for LidarPoint {
    fn from([x, y, z, intensity]: [f32; 4]) -> Self {
        Self::new(x, y, z, intensity)
    }
}

impl From<LidarPoint> for [f32; 4] {
    fn from(p: LidarPoint) -> Self {
        let v = p.position.0;
        [v.x, v.y, v.z, p.intensity]
    }
}

/// Axis-aligned extent of a point cloud in the vehicle frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointCloudBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl PointCloudBounds {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// An immutable set of lidar points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<LidarPoint>,
}

impl PointCloud {
    pub fn new(points: Vec<LidarPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the bounding box of all points, or `None` for an empty cloud.
    pub fn bounds(&self) -> Option<PointCloudBounds> {
        let first = self.points.first()?.position.0;
        let (min, max) = self
            .points
            .iter()
            .fold((first, first), |(min, max), p| {
                (min.min(p.position.0), max.max(p.position.0))
            });
        Some(PointCloudBounds { min, max })
    }
}

/// Camera image embedded in a scene response as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraImage {
    /// `data:image/png;base64,...` or `data:image/jpeg;base64,...`.
    pub image_data: String,
    pub width: u32,
    pub height: u32,
}

/// Sample scenes offered by the scene service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenePreset {
    #[default]
    TrafficScene,
    UrbanStreet,
    ParkingLot,
}

impl ScenePreset {
    pub const ALL: [ScenePreset; 3] = [
        ScenePreset::TrafficScene,
        ScenePreset::UrbanStreet,
        ScenePreset::ParkingLot,
    ];

    /// Identifier used on the wire.
    pub fn id(self) -> &'static str {
        match self {
            ScenePreset::TrafficScene => "traffic_scene",
            ScenePreset::UrbanStreet => "urban_street",
            ScenePreset::ParkingLot => "parking_lot",
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            ScenePreset::TrafficScene => "Traffic Intersection",
            ScenePreset::UrbanStreet => "Urban Street",
            ScenePreset::ParkingLot => "Parking Lot",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ScenePreset::TrafficScene => "Realistic intersection with traffic lights and cars",
            ScenePreset::UrbanStreet => "City street scene with buildings and pedestrians",
            ScenePreset::ParkingLot => "Shopping mall parking with multiple vehicles",
        }
    }
}

impl fmt::Display for ScenePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ScenePreset {
    type Err = LabelscopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| LabelscopeError::SceneUnavailable(format!("unknown preset '{s}'")))
    }
}

/// The scene service's response: point cloud plus paired camera image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneResponse {
    pub point_cloud: PointCloud,
    pub camera_image: CameraImage,
    #[serde(default)]
    pub preset: ScenePreset,
}

/// A validated scene, replaced atomically when a new scene loads.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    preset: ScenePreset,
    cloud: PointCloud,
    image: CameraImage,
    bounds: Option<PointCloudBounds>,
}

impl SceneSnapshot {
    /// Validates a response.
    ///
    /// Fails with [`LabelscopeError::SceneUnavailable`] when a point has a
    /// non-finite coordinate or intensity, or when the image has zero size.
    pub fn from_response(response: SceneResponse) -> Result<Self> {
        let SceneResponse {
            point_cloud,
            camera_image,
            preset,
        } = response;

        if let Some(index) = point_cloud.points.iter().position(|p| !p.is_finite()) {
            return Err(LabelscopeError::SceneUnavailable(format!(
                "point {index} has a non-finite value"
            )));
        }
        if camera_image.width == 0 || camera_image.height == 0 {
            return Err(LabelscopeError::SceneUnavailable(format!(
                "camera image has zero size ({}x{})",
                camera_image.width, camera_image.height
            )));
        }

        let bounds = point_cloud.bounds();
        Ok(Self {
            preset,
            cloud: point_cloud,
            image: camera_image,
            bounds,
        })
    }

    pub fn preset(&self) -> ScenePreset {
        self.preset
    }

    pub fn point_cloud(&self) -> &PointCloud {
        &self.cloud
    }

    pub fn camera_image(&self) -> &CameraImage {
        &self.image
    }

    pub fn bounds(&self) -> Option<PointCloudBounds> {
        self.bounds
    }
}
