//! Annotation export document and the KITTI label text format.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::annotation::{Box2d, Box3d};
use crate::error::Result;

/// Version string written into every export.
pub const EXPORT_VERSION: &str = "1.0";

/// A 3D box as written to the export document. Geometry is in the vehicle
/// frame; `size` is `[width, height, depth]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Box3dRecord {
    pub id: String,
    pub label: String,
    pub center: [f32; 3],
    pub size: [f32; 3],
    /// Yaw in radians.
    pub rotation: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_2d: Option<String>,
}

impl From<&Box3d> for Box3dRecord {
    fn from(b: &Box3d) -> Self {
        Self {
            id: b.id.to_string(),
            label: b.label.clone(),
            center: b.center.0.to_array(),
            size: b.size.to_array(),
            rotation: b.yaw,
            linked_2d: b.linked_2d.map(|id| id.to_string()),
        }
    }
}

/// A 2D box as written to the export document, in normalized image
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Box2dRecord {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_3d: Option<String>,
}

impl From<&Box2d> for Box2dRecord {
    fn from(b: &Box2d) -> Self {
        Self {
            id: b.id.to_string(),
            label: b.label.clone(),
            x: b.rect.x,
            y: b.rect.y,
            width: b.rect.width,
            height: b.rect.height,
            linked_3d: b.linked_3d.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub saved_at: DateTime<Utc>,
    pub version: String,
    /// Number of 3D and 2D boxes together.
    pub total_boxes: usize,
}

/// Everything a session has annotated, ready for external persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationExport {
    pub boxes_3d: Vec<Box3dRecord>,
    pub boxes_2d: Vec<Box2dRecord>,
    pub metadata: ExportMetadata,
}

impl AnnotationExport {
    /// Builds an export from boxes in creation order.
    pub fn from_boxes<'a>(
        boxes_3d: impl IntoIterator<Item = &'a Box3d>,
        boxes_2d: impl IntoIterator<Item = &'a Box2d>,
    ) -> Self {
        let boxes_3d: Vec<Box3dRecord> = boxes_3d.into_iter().map(Box3dRecord::from).collect();
        let boxes_2d: Vec<Box2dRecord> = boxes_2d.into_iter().map(Box2dRecord::from).collect();
        let total_boxes = boxes_3d.len() + boxes_2d.len();
        Self {
            boxes_3d,
            boxes_2d,
            metadata: ExportMetadata {
                saved_at: Utc::now(),
                version: EXPORT_VERSION.to_string(),
                total_boxes,
            },
        }
    }

    /// Serializes to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a previously written export.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Renders the 3D boxes as KITTI label lines.
    ///
    /// Truncation, occlusion, alpha and the 2D bbox columns are written as
    /// zeros; dimensions and location follow in export order.
    pub fn to_kitti(&self) -> String {
        let mut out = String::new();
        for (i, b) in self.boxes_3d.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let [w, h, d] = b.size;
            let [cx, cy, cz] = b.center;
            let _ = write!(
                out,
                "{} 0 0 0 0 0 0 0 {w} {h} {d} {cx} {cy} {cz} {}",
                b.label, b.rotation
            );
        }
        out
    }
}
